use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use parkade_core::ParkingError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    AuthenticationError(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    NotFoundError(String),
    #[error("{0}")]
    ConflictError(String),
    #[error("{0}")]
    InternalServerError(String),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            },
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            },
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<ParkingError> for AppError {
    fn from(err: ParkingError) -> Self {
        match err {
            ParkingError::InvalidVehicle(_) => AppError::ValidationError(err.to_string()),
            ParkingError::TicketNotFound(_) => AppError::NotFoundError(err.to_string()),
            ParkingError::AlreadyAllocated { .. }
            | ParkingError::NoCapacity(_)
            | ParkingError::SlotAlreadyExists(_) => AppError::ConflictError(err.to_string()),
            other => AppError::Anyhow(anyhow::Error::new(other)),
        }
    }
}
