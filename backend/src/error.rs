use axum::{Json, http::StatusCode};
use shared::ApiError;
use thiserror::Error;

/// Failure body returned by every handler.
pub type ApiFailure = (StatusCode, Json<ApiError>);

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to build GPX document: {0}")]
    Gpx(#[from] gpx::errors::GpxError),
}

/// Errors that know which HTTP status they surface as.
pub trait HttpStatus: std::fmt::Display {
    fn status(&self) -> StatusCode;

    /// Message shown to the user. Defaults to the `Display` text.
    fn user_message(&self) -> String {
        self.to_string()
    }
}

impl HttpStatus for ExportError {
    fn status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

pub fn api_failure<E: HttpStatus>(err: E) -> ApiFailure {
    let status = err.status();
    if status.is_server_error() {
        tracing::error!("request failed with {status}: {err}");
    } else {
        tracing::warn!("request rejected with {status}: {err}");
    }
    (
        status,
        Json(ApiError {
            message: err.user_message(),
        }),
    )
}
