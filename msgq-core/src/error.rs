//! API error types and JSON response envelopes
//!
//! Every response body has the shape `{"status_code": u16, "data": ...}`.
//! Errors put an [`ApiErrorData`] in `data`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

use crate::request_id::RequestId;

/// Error codes reported to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Request validation
    MissingParameter,
    InvalidParameter,
    InvalidQueueName,
    PayloadTooLarge,

    // Lookups
    NoMessage,
    QueueNotFound,

    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingParameter => "MissingParameter",
            Self::InvalidParameter => "InvalidParameter",
            Self::InvalidQueueName => "InvalidQueueName",
            Self::PayloadTooLarge => "PayloadTooLarge",
            Self::NoMessage => "NoMessage",
            Self::QueueNotFound => "QueueNotFound",
            Self::InternalError => "InternalError",
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::MissingParameter | Self::InvalidParameter => StatusCode::BAD_REQUEST,
            Self::InvalidQueueName => StatusCode::UNPROCESSABLE_ENTITY,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NoMessage | Self::QueueNotFound => StatusCode::NOT_FOUND,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned from HTTP handlers
#[derive(Debug, Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    pub request_id: RequestId,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            request_id: RequestId::new(),
        }
    }

    pub fn internal(cause: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, cause.to_string())
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.code.http_status()
    }

    /// Body sent to the client. Internal causes stay in the logs.
    pub fn body(&self) -> ApiResponseBody<ApiErrorData> {
        let message = match self.code {
            ErrorCode::InternalError => "Internal server error".to_string(),
            _ => self.message.clone(),
        };
        ApiResponseBody::new(
            self.status(),
            ApiErrorData {
                message,
                code: self.code.as_str(),
                request_id: self.request_id.to_string(),
            },
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.code == ErrorCode::InternalError {
            error!(request_id = %self.request_id, error = %self.message, "Request failed");
        } else {
            warn!(request_id = %self.request_id, code = %self.code, message = %self.message, "Request rejected");
        }
        (self.status(), Json(self.body())).into_response()
    }
}

/// Envelope wrapping every response payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponseBody<T: Serialize> {
    pub status_code: u16,
    pub data: T,
}

impl<T: Serialize> ApiResponseBody<T> {
    pub fn new(status_code: StatusCode, data: T) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorData {
    pub message: String,
    pub code: &'static str,
    pub request_id: String,
}

/// Successful handler result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSuccess<T: Serialize>(StatusCode, ApiResponseBody<T>);

impl<T: Serialize> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        Self(status, ApiResponseBody::new(status, data))
    }

    pub fn ok(data: T) -> Self {
        Self::new(StatusCode::OK, data)
    }

    pub fn status(&self) -> StatusCode {
        self.0
    }

    pub fn data(&self) -> &T {
        &self.1.data
    }
}

impl<T: Serialize> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, Json(self.1)).into_response()
    }
}
