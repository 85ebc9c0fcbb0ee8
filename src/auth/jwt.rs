/// JWT issuance and verification
///
/// `JwtAuthority` signs access/refresh token pairs with the private half of a
/// `KeyPair` and verifies them with the public half only.

use std::fmt;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::claims::{TokenClaims, TokenSubject};
use crate::error::{AppError, AuthError};

/// Failures of the token issuer/verifier
#[derive(Debug, Clone, PartialEq)]
pub enum TokenError {
    /// A required token argument was empty; no cryptographic work was done
    EmptyArgument(&'static str),
    /// The private key is missing or rejected by the signer
    Signing(String),
    /// Signature, issuer, audience, subject, expiry or not-before check failed
    Invalid(String),
    /// PEM input could not be parsed
    KeyMaterial(String),
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::EmptyArgument(name) => write!(f, "{} cannot be empty", name),
            TokenError::Signing(msg) => write!(f, "Token signing failed: {}", msg),
            TokenError::Invalid(msg) => write!(f, "Token rejected: {}", msg),
            TokenError::KeyMaterial(msg) => write!(f, "Invalid key material: {}", msg),
        }
    }
}

impl std::error::Error for TokenError {}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::EmptyArgument(_) => AppError::EmptyArgument(err.to_string()),
            TokenError::Invalid(_) => AppError::Auth(AuthError::TokenInvalid),
            TokenError::Signing(_) | TokenError::KeyMaterial(_) => AppError::Internal(err.to_string()),
        }
    }
}

/// Process-wide key material, immutable once loaded
#[derive(Clone)]
pub struct KeyPair {
    algorithm: Algorithm,
    encoding: Option<EncodingKey>,
    decoding: DecodingKey,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("algorithm", &self.algorithm)
            .field("can_sign", &self.can_sign())
            .finish()
    }
}

impl KeyPair {
    /// RS256 key pair; pass `None` for a verify-only deployment
    pub fn from_rsa_pem(public_pem: &[u8], private_pem: Option<&[u8]>) -> Result<Self, TokenError> {
        let decoding = DecodingKey::from_rsa_pem(public_pem)
            .map_err(|e| TokenError::KeyMaterial(format!("public key: {}", e)))?;
        let encoding = private_pem
            .map(EncodingKey::from_rsa_pem)
            .transpose()
            .map_err(|e| TokenError::KeyMaterial(format!("private key: {}", e)))?;

        Ok(Self {
            algorithm: Algorithm::RS256,
            encoding,
            decoding,
        })
    }

    /// HS256 fallback when no RSA keys are configured
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            algorithm: Algorithm::HS256,
            encoding: Some(EncodingKey::from_secret(secret)),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn can_sign(&self) -> bool {
        self.encoding.is_some()
    }
}

/// Fixed claim strings and lifetimes applied to every token
#[derive(Debug, Clone)]
pub struct TokenPolicy {
    pub issuer: String,
    pub audience: String,
    pub access_token_expiry: i64,   // seconds
    pub refresh_token_expiry: i64,  // seconds
    /// Clock skew tolerated on exp/nbf, in seconds; 0 means a token is
    /// rejected as soon as `exp` has passed
    pub leeway: u64,
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            issuer: "userdesk".to_string(),
            audience: "userdesk-clients".to_string(),
            access_token_expiry: 2 * 60 * 60,
            refresh_token_expiry: 48 * 60 * 60,
            leeway: 0,
        }
    }
}

/// Token pair returned by a successful login
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Capability interface for issuing and checking tokens
pub trait TokenAuthority: Send + Sync {
    fn issue(&self, username: &str) -> Result<TokenSet, TokenError>;

    fn decode_access_token(&self, token: &str) -> Result<TokenClaims, TokenError>;

    fn decode_refresh_token(&self, token: &str) -> Result<TokenClaims, TokenError>;

    fn validate_access_token(&self, token: &str) -> bool {
        self.decode_access_token(token).is_ok()
    }

    fn validate_refresh_token(&self, token: &str) -> bool {
        self.decode_refresh_token(token).is_ok()
    }
}

#[derive(Debug, Clone)]
pub struct JwtAuthority {
    keys: KeyPair,
    policy: TokenPolicy,
}

impl JwtAuthority {
    pub fn new(keys: KeyPair, policy: TokenPolicy) -> Self {
        Self { keys, policy }
    }

    fn sign(&self, subject: TokenSubject, username: &str, lifetime: i64) -> Result<String, TokenError> {
        let key = self
            .keys
            .encoding
            .as_ref()
            .ok_or_else(|| TokenError::Signing("no private key configured".to_string()))?;

        let claims = TokenClaims::new(
            subject,
            username,
            &self.policy.issuer,
            &self.policy.audience,
            lifetime,
        );

        encode(&Header::new(self.keys.algorithm), &claims, key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn validation(&self, subject: TokenSubject) -> Validation {
        let mut validation = Validation::new(self.keys.algorithm);
        validation.leeway = self.policy.leeway;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_issuer(&[&self.policy.issuer]);
        validation.set_audience(&[&self.policy.audience]);
        validation.sub = Some(subject.as_str().to_string());
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "aud", "sub"]);
        validation
    }

    fn decode_as(
        &self,
        token: &str,
        subject: TokenSubject,
        argument: &'static str,
    ) -> Result<TokenClaims, TokenError> {
        if token.trim().is_empty() {
            return Err(TokenError::EmptyArgument(argument));
        }

        decode::<TokenClaims>(token, &self.keys.decoding, &self.validation(subject))
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(subject = subject.as_str(), error = %e, "JWT validation failed");
                TokenError::Invalid(e.to_string())
            })
    }
}

impl TokenAuthority for JwtAuthority {
    fn issue(&self, username: &str) -> Result<TokenSet, TokenError> {
        let access_token = self.sign(TokenSubject::Access, username, self.policy.access_token_expiry)?;
        let refresh_token =
            self.sign(TokenSubject::Refresh, username, self.policy.refresh_token_expiry)?;

        Ok(TokenSet {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.policy.access_token_expiry,
        })
    }

    fn decode_access_token(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.decode_as(token, TokenSubject::Access, "accessToken")
    }

    fn decode_refresh_token(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.decode_as(token, TokenSubject::Refresh, "refreshToken")
    }
}
