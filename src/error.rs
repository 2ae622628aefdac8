use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Handler-level error type. Every variant renders as a JSON envelope so
/// API callers always receive a body; downstream detail is only logged.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("Error interno del servidor")]
    Database(#[from] sqlx::Error),
    #[error("Error al conectar con n8n")]
    Upstream(#[from] reqwest::Error),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Database(_) | ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::Database(err) => {
                log::error!("database error: {err}");
                json!({ "error": self.to_string() })
            }
            ApiError::Upstream(err) => {
                log::error!("n8n proxy error: {err}");
                json!({ "error": self.to_string(), "message": err.to_string() })
            }
            _ => json!({ "error": self.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
