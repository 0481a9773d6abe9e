/// Identity tokens issued by the auth layer
///
/// The auth layer signs HS256 JWTs with a secret shared with this service.
/// Only validation happens in production; `issue_token` exists for tooling
/// and tests.
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

/// JWT claims consumed by posts-service
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Username
    pub username: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Authenticated identity attached to a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
    #[error("malformed subject: {0}")]
    Subject(#[from] uuid::Error),
}

/// Signing and verification keys derived from the shared secret
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtKeys {
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn validate(&self, token: &str) -> Result<CurrentUser, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::new(JWT_ALGORITHM))?;
        let id = Uuid::parse_str(&data.claims.sub)?;
        Ok(CurrentUser {
            id,
            username: data.claims.username,
        })
    }

    pub fn issue_token(&self, user: &CurrentUser, ttl: Duration) -> Result<String, TokenError> {
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            exp: (Utc::now() + ttl).timestamp(),
        };
        Ok(encode(&Header::new(JWT_ALGORITHM), &claims, &self.encoding)?)
    }
}
