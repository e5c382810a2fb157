//! Session token issuance and verification.
//!
//! Tokens are self-contained bearer credentials: signed HS256, carrying
//! the user id and email, expiring one hour after issuance. They are
//! never persisted; verification reconstructs the identity from the
//! token alone. Verification fails closed and does not distinguish
//! between malformed, forged, and expired tokens.

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

pub const TOKEN_TTL_SECS: i64 = 3600;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenKeys {
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        let mut validation = Validation::default();
        // A token is valid strictly until its expiry instant.
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation,
        }
    }

    /// Mint a token for an authenticated user.
    ///
    /// # Errors
    ///
    /// Returns an error if claim serialization or signing fails.
    pub fn issue(&self, user_id: Uuid, email: &str) -> Result<String, jsonwebtoken::errors::Error> {
        self.issue_at(user_id, email, Utc::now().timestamp())
    }

    fn issue_at(
        &self,
        user_id: Uuid,
        email: &str,
        issued_at: i64,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            iat: issued_at,
            exp: issued_at + TOKEN_TTL_SECS,
        };
        encode(&Header::default(), &claims, &self.encoding)
    }

    /// Verify a token and recover its claims. Any failure collapses to
    /// `None` so callers surface a uniform unauthorized outcome.
    #[must_use]
    pub fn verify(&self, token: &str) -> Option<Claims> {
        match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => Some(data.claims),
            Err(err) => {
                debug!("Token verification failed: {err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> TokenKeys {
        TokenKeys::new(&SecretString::from("test-secret".to_string()))
    }

    #[test]
    fn issue_then_verify_recovers_identity() {
        let keys = keys();
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id, "ali@x.com").unwrap();

        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "ali@x.com");
        assert_eq!(claims.exp, claims.iat + TOKEN_TTL_SECS);
    }

    #[test]
    fn expired_token_rejected() {
        let keys = keys();
        let issued_at = Utc::now().timestamp() - TOKEN_TTL_SECS - 60;
        let token = keys
            .issue_at(Uuid::new_v4(), "ali@x.com", issued_at)
            .unwrap();
        assert!(keys.verify(&token).is_none());
    }

    #[test]
    fn tampered_token_rejected() {
        let keys = keys();
        let token = keys.issue(Uuid::new_v4(), "ali@x.com").unwrap();
        let mut tampered = token.clone();
        tampered.pop();
        assert!(keys.verify(&tampered).is_none());
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = keys().issue(Uuid::new_v4(), "ali@x.com").unwrap();
        let other = TokenKeys::new(&SecretString::from("other-secret".to_string()));
        assert!(other.verify(&token).is_none());
    }

    #[test]
    fn garbage_token_rejected() {
        assert!(keys().verify("not-a-token").is_none());
        assert!(keys().verify("").is_none());
    }
}
