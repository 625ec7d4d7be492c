//! The host transport seam.
//!
//! # Design
//! A `Transport` models one host-provided request object: it is opened,
//! configured, given an `EventSink`, and sent exactly once. Methods take
//! `&self` because the same instance is reachable from the controller and
//! from the caller's `AbortToken`; implementations keep their own interior
//! state. A `TransportFactory` hands out a fresh transport per call so
//! nothing is shared between requests and tests can substitute a mock.
//!
//! Events may be emitted from any thread, including synchronously from inside
//! `send` or `abort`.

use std::fmt;
use std::sync::Arc;

use crate::http::{HttpMethod, LoadEvent, Payload, ProgressEvent, TransportFailure};

/// One host request object, used for exactly one exchange.
pub trait Transport: Send + Sync {
    fn open(&self, method: HttpMethod, url: &str);

    /// Whether ambient credentials (cookies, auth) accompany the request.
    fn set_with_credentials(&self, with_credentials: bool);

    fn set_request_header(&self, name: &str, value: &str);

    /// Register the receiver of progress, load and error events.
    fn attach(&self, events: EventSink);

    fn send(&self, payload: Payload);

    /// Cancel the in-flight exchange. Must be harmless once it has finished.
    fn abort(&self);
}

/// Produces a fresh `Transport` for each request.
pub trait TransportFactory: Send + Sync {
    fn create(&self) -> Arc<dyn Transport>;
}

impl<F> TransportFactory for F
where
    F: Fn() -> Arc<dyn Transport> + Send + Sync,
{
    fn create(&self) -> Arc<dyn Transport> {
        self()
    }
}

/// Receiver side of the event stream, implemented by the controller.
pub(crate) trait TransportEvents: Send + Sync {
    fn upload_progress(&self, event: ProgressEvent);
    fn load(&self, event: LoadEvent);
    fn error(&self, failure: TransportFailure);
}

/// Handle a transport uses to report what happened to its request.
#[derive(Clone)]
pub struct EventSink {
    inner: Arc<dyn TransportEvents>,
}

impl EventSink {
    pub(crate) fn new(inner: Arc<dyn TransportEvents>) -> Self {
        Self { inner }
    }

    /// Some bytes of the request body have been uploaded.
    pub fn upload_progress(&self, event: ProgressEvent) {
        self.inner.upload_progress(event);
    }

    /// The exchange finished with a status, successful or not.
    pub fn load(&self, event: LoadEvent) {
        self.inner.load(event);
    }

    /// The exchange failed at the network level.
    pub fn error(&self, failure: TransportFailure) {
        self.inner.error(failure);
    }
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink").finish_non_exhaustive()
    }
}
