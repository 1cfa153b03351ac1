//! Token issuing and password checks for the mock backend
//!
//! Tokens are HS256 JWTs whose `scope` claim carries the account's role,
//! matching what the real backend hands to the admin console.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JWT claims embedded in issued tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (account email)
    pub sub: String,
    /// Role name (`ADMIN`, `USER`)
    pub scope: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Token handling failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Invalid credentials")]
    InvalidCredentials,
}

/// JWT issuer and verifier
pub struct JwtIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: u64, // seconds
}

impl JwtIssuer {
    /// Create new issuer
    ///
    /// # Arguments
    /// * `secret` - HMAC secret for signing tokens (should be >= 32 bytes)
    /// * `ttl` - Token lifetime in seconds
    pub fn new(secret: &[u8], ttl: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Issue a token for an account
    pub fn issue(&self, subject: &str, scope: &str) -> Result<String, AuthError> {
        let now = unix_now();
        let claims = Claims {
            sub: subject.to_string(),
            scope: scope.to_string(),
            iat: now,
            exp: now + self.ttl,
        };
        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    /// Verify signature and expiry, returning the claims
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())?;
        Ok(data.claims)
    }

    pub fn ttl(&self) -> u64 {
        self.ttl
    }
}

/// Hash a password with Argon2id and a random salt
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

/// Check a password against a stored PHC hash string
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|e| AuthError::Hash(e.to_string()))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Generate a secure random secret for JWT signing
pub fn generate_secret() -> [u8; 32] {
    use rand::Rng;
    rand::thread_rng().r#gen()
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let issuer = JwtIssuer::new(&generate_secret(), 60);
        let token = issuer.issue("admin@pap.com", "ADMIN").unwrap();

        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.sub, "admin@pap.com");
        assert_eq!(claims.scope, "ADMIN");
        assert_eq!(claims.exp - claims.iat, issuer.ttl());
    }

    #[test]
    fn test_scope_readable_by_console_decoder() {
        let issuer = JwtIssuer::new(&generate_secret(), 60);
        let token = issuer.issue("user@pap.com", "USER").unwrap();
        assert_eq!(papshop_core::auth::decode_role(&token), "USER");
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let issuer = JwtIssuer::new(&generate_secret(), 60);
        let other = JwtIssuer::new(&generate_secret(), 60);
        let token = other.issue("admin@pap.com", "ADMIN").unwrap();

        assert!(matches!(issuer.verify(&token), Err(AuthError::Jwt(_))));
    }

    #[test]
    fn test_password_hashing() {
        let hash = hash_password("admin123").unwrap();
        assert!(verify_password("admin123", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
