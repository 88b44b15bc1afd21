//! JSON response envelope shared by the API routes.
//!
//! Every field is optional and omitted when absent, so a success body is
//! `{"data": ...}` and a failure body is `{"error": ..., "details": ...}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Default for Envelope<T> {
    fn default() -> Self {
        Self { data: None, error: None, details: None, message: None }
    }
}

impl<T: Serialize> Envelope<T> {
    #[must_use]
    pub fn data(data: T) -> Self {
        Self { data: Some(data), ..Self::default() }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// `200` with `data`.
pub fn ok<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(Envelope::data(data))).into_response()
}

/// `201` with `data`.
pub fn created<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(Envelope::data(data))).into_response()
}

/// `500` with a generic error and optional details.
pub fn server_error(details: Option<String>) -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", details)
}

/// Arbitrary status with `error` and optional `details`.
pub fn error_response(status: StatusCode, error: impl Into<String>, details: Option<String>) -> Response {
    let body: Envelope<()> = Envelope { error: Some(error.into()), details, ..Envelope::default() };
    (status, Json(body)).into_response()
}
