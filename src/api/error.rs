//! JSON error envelope shared by every failing response.
//!
//! Handler errors render themselves through [`ApiError`]. Everything the
//! framework produces on its own (unknown route, wrong method, oversized
//! body) passes through [`render_envelope`], and panics through
//! [`panic_response`], so clients always see
//! `{"error": ..., "message": ..., "status": ...}`.

use std::any::Any;

use axum::body::{to_bytes, Body};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::error::StoreError;
use crate::lookup::Rejection;

/// Largest framework error body read back when re-rendering it.
const MAX_ERROR_BODY: usize = 64 * 1024;

/// Marks a response that must reach the client exactly as built.
#[derive(Debug, Clone, Copy)]
pub struct Passthrough;

/// Error envelope body.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    /// Reason phrase of the status code.
    pub error: String,
    /// Human-readable description.
    pub message: String,
    /// Numeric status code.
    pub status: u16,
}

impl ErrorEnvelope {
    /// Build an envelope for `status` carrying `message`.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            error: status.canonical_reason().unwrap_or("Unknown Error").to_string(),
            message: message.into(),
            status: status.as_u16(),
        }
    }

    /// Render as a JSON response with the envelope's status.
    pub fn into_response_with(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

/// Errors returned by API handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Client input rejected (400).
    #[error("{0}")]
    BadRequest(String),

    /// Nothing to return (404).
    #[error("{0}")]
    NotFound(String),

    /// Unexpected failure (500).
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Rejection> for ApiError {
    fn from(rejection: Rejection) -> Self {
        ApiError::BadRequest(rejection.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        error!(error = %err, "Store failure");
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        ErrorEnvelope::new(status, self.to_string()).into_response_with(status)
    }
}

/// Default description for framework-generated errors.
pub fn default_description(status: StatusCode) -> String {
    let description = match status {
        StatusCode::BAD_REQUEST => {
            "The browser (or proxy) sent a request that this server could not understand."
        }
        StatusCode::NOT_FOUND => {
            "The requested URL was not found on the server. If you entered the URL manually please check your spelling and try again."
        }
        StatusCode::METHOD_NOT_ALLOWED => "The method is not allowed for the requested URL.",
        StatusCode::PAYLOAD_TOO_LARGE => "The data value transmitted exceeds the capacity limit.",
        StatusCode::UNSUPPORTED_MEDIA_TYPE => {
            "The server does not support the media type transmitted in the request."
        }
        StatusCode::INTERNAL_SERVER_ERROR => {
            "The server encountered an internal error and was unable to complete your request. Either the server is overloaded or there is an error in the application."
        }
        other => other.canonical_reason().unwrap_or("Unknown Error"),
    };
    description.to_string()
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}

/// Response mapper that wraps non-JSON error responses in the envelope.
pub async fn render_envelope(response: Response) -> Response {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error())
        || is_json(&response)
        || response.extensions().get::<Passthrough>().is_some()
    {
        return response;
    }

    let (parts, body) = response.into_parts();
    let text = to_bytes(body, MAX_ERROR_BODY)
        .await
        .ok()
        .and_then(|bytes| String::from_utf8(bytes.to_vec()).ok())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| default_description(status));

    let mut rendered = ErrorEnvelope::new(status, text).into_response_with(status);
    for (name, value) in parts.headers.iter() {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            rendered.headers_mut().append(name.clone(), value.clone());
        }
    }
    rendered
}

/// Panic handler for the catch-panic layer: a 500 envelope with the panic text.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let message = if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else if let Some(text) = payload.downcast_ref::<&str>() {
        text.to_string()
    } else {
        default_description(StatusCode::INTERNAL_SERVER_ERROR)
    };
    error!(panic = %message, "Handler panicked");

    ErrorEnvelope::new(StatusCode::INTERNAL_SERVER_ERROR, message)
        .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
}
