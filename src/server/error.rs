//! Error-to-HTTP response conversion.
//!
//! Route handlers return `Result<T, AppError>`; the body of every error
//! response is `{"error": message, "code": machine_code}`.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use localflix_common::Error;
use serde_json::json;

use crate::streaming::{RangeError, StreamError};

/// Wrapper so we can implement `IntoResponse` for the domain error.
#[derive(Debug)]
pub enum AppError {
    Domain(Error),
    RangeNotSatisfiable { reason: RangeError, size: u64 },
}

impl From<Error> for AppError {
    fn from(e: Error) -> Self {
        Self::Domain(e)
    }
}

impl From<StreamError> for AppError {
    fn from(e: StreamError) -> Self {
        match e {
            StreamError::NotFound(path) => {
                Self::Domain(Error::not_found("file", path.display()))
            }
            StreamError::Range { source, size } => Self::RangeNotSatisfiable {
                reason: source,
                size,
            },
            StreamError::Io(e) => Self::Domain(Error::Io(e)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Domain(inner) => {
                let status = StatusCode::from_u16(inner.http_status())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

                if status.is_server_error() {
                    tracing::error!(
                        status = %status,
                        error = %inner,
                        "Server error in API handler"
                    );
                }

                let body = json!({
                    "error": inner.to_string(),
                    "code": inner.code(),
                });

                (status, axum::Json(body)).into_response()
            }
            AppError::RangeNotSatisfiable { reason, size } => {
                tracing::debug!(size, reason = %reason, "Unsatisfiable range request");

                let body = json!({
                    "error": reason.to_string(),
                    "code": "range_not_satisfiable",
                });

                (
                    StatusCode::RANGE_NOT_SATISFIABLE,
                    [(header::CONTENT_RANGE, format!("bytes */{size}"))],
                    axum::Json(body),
                )
                    .into_response()
            }
        }
    }
}
