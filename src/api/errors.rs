use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::{auth::AuthError, error::ServiceError};

#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self(ServiceError::NotFound(message.into()).into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self(ServiceError::InvalidInput(message.into()).into())
    }

    fn status(&self) -> StatusCode {
        if let Some(e) = self.0.downcast_ref::<ServiceError>() {
            return match e {
                ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
                ServiceError::InvalidInput(_) | ServiceError::InvalidOperation(_) => {
                    StatusCode::BAD_REQUEST
                }
                ServiceError::Database(_)
                | ServiceError::PasswordHash(_)
                | ServiceError::Serialization(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
        }
        if let Some(e) = self.0.downcast_ref::<AuthError>() {
            return match e {
                AuthError::Forbidden => StatusCode::FORBIDDEN,
                AuthError::TokenCreation(_) => StatusCode::INTERNAL_SERVER_ERROR,
                AuthError::MissingToken | AuthError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            };
        }
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }
        let body = Json(json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(e: E) -> Self {
        Self(e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_client_statuses() {
        assert_eq!(AppError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::bad_request("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::from(ServiceError::InvalidOperation("x".into())).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn auth_errors_map_to_401_and_403() {
        assert_eq!(
            AppError::from(AuthError::MissingToken).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(AuthError::Forbidden).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn encoding_and_hashing_failures_are_internal() {
        let encode = serde_json::from_str::<u8>("x").unwrap_err();
        assert_eq!(
            AppError::from(ServiceError::from(encode)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(ServiceError::from(bcrypt::BcryptError::CostNotAllowed(3))).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn unknown_errors_are_internal() {
        let err = AppError::from(anyhow::anyhow!("boom"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
