use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::db::services::SettingsError;
use crate::process_lookup::LookupError;
use crate::services::encryption_service::EncryptionError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Password hashing failed: {0}")]
    PasswordHashingError(String),
    #[error("JWT creation failed: {0}")]
    TokenCreationError(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Encryption error: {0}")]
    EncryptionError(String),
    #[error("Internal server error: {0}")]
    InternalServerError(String),
    #[error("Lookup failed: {0}")]
    Lookup(#[from] LookupError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Credenciais inválidas.".to_string()),
            AppError::Lookup(err) => {
                if let LookupError::Unexpected(detail) = &err {
                    error!(error = %detail, "Unexpected error during process lookup.");
                }
                (err.status_code(), err.client_message())
            }
            internal @ (AppError::PasswordHashingError(_)
            | AppError::TokenCreationError(_)
            | AppError::DatabaseError(_)
            | AppError::EncryptionError(_)
            | AppError::InternalServerError(_)) => {
                error!(error = %internal, "Request failed with an internal error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Erro interno do servidor.".to_string(),
                )
            }
        };
        (status, Json(serde_json::json!({ "message": message }))).into_response()
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<EncryptionError> for AppError {
    fn from(err: EncryptionError) -> Self {
        AppError::EncryptionError(err.to_string())
    }
}

impl From<SettingsError> for AppError {
    fn from(err: SettingsError) -> Self {
        match err {
            SettingsError::InvalidPort(port) => {
                AppError::InvalidInput(format!("Porta inválida: {port}. Use um valor entre 1 e 65535."))
            }
            SettingsError::Database(e) => e.into(),
            SettingsError::Encryption(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_lookup_error_uses_its_status_and_message() {
        let (status, json) = body_json(AppError::Lookup(LookupError::ProcessNotFound)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json["message"].as_str().unwrap().contains("não encontrado"));
    }

    #[tokio::test]
    async fn test_internal_errors_do_not_leak_details() {
        let (status, json) = body_json(AppError::DatabaseError("relation users does not exist".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["message"], "Erro interno do servidor.");
    }

    #[tokio::test]
    async fn test_invalid_port_maps_to_bad_request() {
        let (status, _) = body_json(SettingsError::InvalidPort(0x1_0000).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
