/// Admin registration and login flows
///
/// Validated credentials come in; a stored hash or a `TokenSet` comes out.
/// bcrypt work runs on the blocking pool.

use std::sync::Arc;

use actix_web::web;

use crate::auth::jwt::{TokenAuthority, TokenSet};
use crate::auth::password::PasswordHasher;
use crate::error::{AppError, AuthError};
use crate::repositories::AdminDirectory;
use crate::validators::AdminCredentials;

#[derive(Clone)]
pub struct AuthService {
    directory: Arc<dyn AdminDirectory>,
    tokens: Arc<dyn TokenAuthority>,
    hasher: PasswordHasher,
}

impl AuthService {
    pub fn new(
        directory: Arc<dyn AdminDirectory>,
        tokens: Arc<dyn TokenAuthority>,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            directory,
            tokens,
            hasher,
        }
    }

    pub fn tokens(&self) -> Arc<dyn TokenAuthority> {
        self.tokens.clone()
    }

    /// Hash and store a new admin
    ///
    /// # Errors
    /// `DatabaseError::UniqueConstraintViolation` if the username is taken
    pub async fn register(&self, credentials: &AdminCredentials) -> Result<(), AppError> {
        let hasher = self.hasher;
        let password = credentials.password.clone();
        let password_hash = web::block(move || hasher.hash(&password)).await??;

        self.directory
            .insert(&credentials.username, &password_hash)
            .await?;

        tracing::info!(username = %credentials.username, "Admin registered");
        Ok(())
    }

    /// Check credentials and issue a fresh token pair
    ///
    /// Unknown usernames and wrong passwords fail with the same
    /// `AuthError::InvalidCredentials`.
    pub async fn login(&self, credentials: &AdminCredentials) -> Result<TokenSet, AppError> {
        let stored_hash = self.directory.find_by_username(&credentials.username).await?;

        let hasher = self.hasher;
        let password = credentials.password.clone();
        let matches = web::block(move || hasher.compare(&password, &stored_hash)).await?;
        if !matches {
            tracing::debug!(username = %credentials.username, "Password mismatch");
            return Err(AuthError::InvalidCredentials.into());
        }

        let token_set = self.tokens.issue(&credentials.username)?;

        tracing::info!(username = %credentials.username, "Admin logged in");
        Ok(token_set)
    }
}
