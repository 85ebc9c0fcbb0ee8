/// Authentication module
///
/// Password hashing, JWT issuance/verification and the admin
/// register/login flows built on them.

mod claims;
mod jwt;
mod password;
mod service;

pub use claims::{TokenClaims, TokenSubject};
pub use jwt::{JwtAuthority, KeyPair, TokenAuthority, TokenError, TokenPolicy, TokenSet};
pub use password::PasswordHasher;
pub use service::AuthService;
