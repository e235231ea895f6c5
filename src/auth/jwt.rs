use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::AuthError;
use crate::{config::JwtSettings, db::models::UserRole};

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Username of the token holder.
    pub sub: String,
    pub role: UserRole,
    pub iss: String,
    pub aud: String,
    pub iat: usize,
    pub exp: usize,
}

/// Issues and verifies HS256 bearer tokens. Cheap to clone.
#[derive(Clone)]
pub struct JwtManager {
    inner: Arc<Inner>,
}

struct Inner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl JwtManager {
    pub fn new(settings: &JwtSettings) -> Self {
        Self {
            inner: Arc::new(Inner {
                encoding_key: EncodingKey::from_secret(settings.secret.as_bytes()),
                decoding_key: DecodingKey::from_secret(settings.secret.as_bytes()),
                issuer: settings.issuer.clone(),
                audience: settings.audience.clone(),
                ttl: Duration::hours(settings.ttl_hours),
            }),
        }
    }

    pub fn issue(&self, username: &str, role: UserRole) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: username.to_owned(),
            role,
            iss: self.inner.issuer.clone(),
            aud: self.inner.audience.clone(),
            iat: now.timestamp() as usize,
            exp: (now + self.inner.ttl).timestamp() as usize,
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.inner.encoding_key)
            .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.set_issuer(&[&self.inner.issuer]);
        validation.set_audience(&[&self.inner.audience]);

        decode::<Claims>(token, &self.inner.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}
