//! Error types for a single request.
//!
//! # Design
//! `RequestError` is what the returned future rejects with. `ErrorInfo` is
//! the lighter value handed to the caller's `on_error` observer; it carries
//! the raw status and body (or the raw transport failure) without implying
//! the outcome of the call.

use crate::http::TransportFailure;

/// Why a request did not resolve with a decoded JSON value.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// The transport completed with a status other than the success status.
    #[error("HTTP {status}: {response}")]
    RequestFailed { status: u16, response: String },

    /// The response body was not valid JSON, or did not fit the requested type.
    #[error("failed to decode response body: {0}")]
    DecodeFailed(#[source] serde_json::Error),

    /// The abort token was invoked while the request was in flight.
    #[error("aborted request to {url}")]
    Aborted { url: String },

    /// The transport failed before any status was available.
    #[error("transport error: {message}")]
    TransportError { message: String },
}

impl RequestError {
    pub fn is_aborted(&self) -> bool {
        matches!(self, RequestError::Aborted { .. })
    }

    /// HTTP status for `RequestFailed`, `None` otherwise.
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for RequestError {
    fn from(err: serde_json::Error) -> Self {
        RequestError::DecodeFailed(err)
    }
}

impl From<TransportFailure> for RequestError {
    fn from(failure: TransportFailure) -> Self {
        RequestError::TransportError {
            message: failure.message,
        }
    }
}

/// Passed to the `on_error` observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorInfo {
    /// Non-success status with the raw response text.
    Status { status: u16, response: String },
    /// Network-level failure reported by the transport.
    Transport(TransportFailure),
}
