pub mod jwt;
pub mod password;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use thiserror::Error;

pub use self::jwt::{Claims, JwtManager};
use crate::{api::errors::AppError, db::models::UserRole};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing or malformed bearer token")]
    MissingToken,
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("Failed to generate token: {0}")]
    TokenCreation(String),
    #[error("Insufficient permissions")]
    Forbidden,
}

/// Caller identity taken from a verified `Authorization: Bearer <jwt>` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
    pub role: UserRole,
}

impl<S> FromRequestParts<S> for AuthUser
where
    JwtManager: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let claims = JwtManager::from_ref(state).verify(token)?;
        Ok(Self {
            username: claims.sub,
            role: claims.role,
        })
    }
}

/// An [`AuthUser`] whose token carries the `Admin` role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl<S> FromRequestParts<S> for AdminUser
where
    JwtManager: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != UserRole::Admin {
            return Err(AuthError::Forbidden.into());
        }
        Ok(Self(user))
    }
}
