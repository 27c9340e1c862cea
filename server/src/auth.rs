use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use shared::UserId;
use thiserror::Error;

/// Verified identity, bound to a connection for its whole life. The rating
/// is the value at authentication time; it is never re-fetched here.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: UserId,
    pub username: String,
    pub rating: i32,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no credential provided")]
    MissingCredential,
    #[error("invalid credential")]
    InvalidCredential,
}

/// Validates a bearer credential once per connection. Token issuance is the
/// identity service's job; this side only verifies.
#[async_trait]
pub trait IdentityGate: Send + Sync {
    async fn verify(&self, credential: &str) -> Result<Identity, AuthError>;
}

/// Claims carried by the access tokens the identity service signs.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    #[serde(default = "default_rating")]
    pub rating: i32,
    pub exp: usize,
}

fn default_rating() -> i32 {
    1200
}

/// HS256 gate sharing a secret with the identity service.
pub struct JwtGate {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtGate {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

#[async_trait]
impl IdentityGate for JwtGate {
    async fn verify(&self, credential: &str) -> Result<Identity, AuthError> {
        let data = decode::<Claims>(credential, &self.decoding_key, &self.validation)
            .map_err(|_| AuthError::InvalidCredential)?;
        Ok(Identity {
            user_id: UserId(data.claims.sub),
            username: data.claims.username,
            rating: data.claims.rating,
        })
    }
}
