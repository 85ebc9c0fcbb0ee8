/// JWT claims carried by access and refresh tokens
///
/// Both token kinds share one payload shape; `sub` tells them apart and is
/// checked on every decode so neither kind can stand in for the other.

use serde::{Deserialize, Serialize};

/// Token kind, stored in the standard `sub` claim
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenSubject {
    Access,
    Refresh,
}

impl TokenSubject {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenSubject::Access => "access",
            TokenSubject::Refresh => "refresh",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TokenClaims {
    pub sub: TokenSubject,
    /// Admin the token was issued to
    pub username: String,
    pub iss: String,
    pub aud: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Not before (Unix timestamp)
    pub nbf: i64,
}

impl TokenClaims {
    /// Claims valid from now for `lifetime_seconds`
    pub fn new(
        sub: TokenSubject,
        username: &str,
        issuer: &str,
        audience: &str,
        lifetime_seconds: i64,
    ) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub,
            username: username.to_string(),
            iss: issuer.to_string(),
            aud: audience.to_string(),
            iat: now,
            exp: now + lifetime_seconds,
            nbf: now,
        }
    }
}
