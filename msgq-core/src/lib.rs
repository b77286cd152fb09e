//! Core types for msgq
//!
//! This crate provides the error type and JSON envelopes shared by the
//! queue handlers and the server binary.

pub mod error;
pub mod request_id;

pub use error::{ApiError, ApiErrorData, ApiResponseBody, ApiSuccess, ErrorCode};
pub use request_id::RequestId;
