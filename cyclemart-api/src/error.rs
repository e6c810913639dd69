use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cyclemart_domain::HoldError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    Hold(HoldError),
    Internal(anyhow::Error),
}

impl From<HoldError> for AppError {
    fn from(err: HoldError) -> Self {
        Self::Hold(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Hold(HoldError::AlreadyHeld) => {
                (StatusCode::CONFLICT, "cycle is already on hold".to_string())
            }
            AppError::Hold(HoldError::Validation(msg)) => (StatusCode::BAD_REQUEST, msg),
            AppError::Hold(HoldError::NotFound(what)) => {
                (StatusCode::NOT_FOUND, format!("{what} not found"))
            }
            AppError::Hold(HoldError::StoreUnavailable(msg)) => {
                tracing::error!("store unavailable: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, "store unavailable, retry shortly".to_string())
            }
            AppError::Internal(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
