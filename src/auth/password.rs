/// Password Hashing and Verification
///
/// bcrypt with a fixed cost; length policy lives in `validators`.

use bcrypt::{hash, verify};

use crate::error::AppError;

const HASH_COST: u32 = 10;

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self { cost: HASH_COST }
    }
}

impl PasswordHasher {
    /// Hash a password with a fresh random salt
    ///
    /// # Errors
    /// Only if bcrypt itself fails, which does not happen for valid UTF-8 input
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        hash(password, self.cost)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// `true` iff `password` matches `hashed`; a malformed hash is a mismatch
    pub fn compare(&self, password: &str, hashed: &str) -> bool {
        match verify(password, hashed) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash is malformed");
                false
            }
        }
    }
}
