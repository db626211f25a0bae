//! HTTP helpers shared by all functions.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

use crate::Error;

/// JSON envelope every function answers with.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Create a JSON response with the given status code and data.
pub fn json_response<T: Serialize>(status: StatusCode, data: T) -> Response {
    (status, Json(data)).into_response()
}

/// Create an error response with the given status code and message.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    json_response(
        status,
        ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(message.into()),
        },
    )
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        error_response(status, self.to_string())
    }
}

/// Cross-origin policy wrapping every function: any origin, method and header.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
