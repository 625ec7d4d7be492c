//! One-shot, future-returning HTTP request helper over a host transport.
//!
//! # Overview
//! `RequestController::execute` drives a single host-provided `Transport`:
//! it opens it, applies credentials and headers, installs a cancellation
//! function on the caller's `AbortToken`, wires progress / load / error
//! events to one `ResponseFuture`, and sends the payload. The future resolves
//! with the JSON-decoded response body or rejects with a `RequestError`.
//!
//! # Design
//! - The controller never performs I/O. Transports come from an injected
//!   `TransportFactory`, one per call, so tests substitute a scripted mock.
//! - Settlement happens exactly once. Load, transport error and abort race
//!   for the same settle slot; the losers are no-ops.
//! - Observer callbacks (`on_progress`, `on_complete`, `on_error`) are
//!   telemetry only; the future is the source of truth.

pub mod abort;
pub mod config;
pub mod controller;
pub mod error;
pub mod http;
pub mod transport;

pub use abort::AbortToken;
pub use config::{ControllerOptions, RequestConfig, DEFAULT_SUCCESS_STATUS};
pub use controller::{RequestController, RequestState, ResponseFuture};
pub use error::{ErrorInfo, RequestError};
pub use http::{HttpMethod, LoadEvent, Payload, ProgressEvent, TransportFailure};
pub use transport::{EventSink, Transport, TransportFactory};
