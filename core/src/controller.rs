//! Drives one transport through one request and settles one result.
//!
//! # Design
//! `execute` configures a fresh transport, installs the abort function on the
//! caller's token, attaches an `EventSink`, sends, and returns a
//! `ResponseFuture` immediately. Every terminal path (load, transport error,
//! abort) goes through `Shared::claim`, which takes the result sender out of
//! its `Option` under the lifecycle lock. Whoever takes it settles the
//! request; everyone after that finds `None` and does nothing.
//!
//! `ResponseFuture` holds only the receiver and a shared state cell. The
//! sender lives in `Shared`, which is kept alive by the `EventSink` clones
//! the transport holds. When the last of those goes away without a
//! settlement, `Shared`'s `Drop` rejects with `TransportError`.
//!
//! Observer callbacks run with no lock held, so they may call back into the
//! abort token. `on_error` runs after the settle slot is claimed, so the
//! error it reports is always the one the future rejects with.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::abort::AbortToken;
use crate::config::{
    CompleteCallback, ControllerOptions, ErrorCallback, ProgressCallback, RequestConfig,
};
use crate::error::{ErrorInfo, RequestError};
use crate::http::{LoadEvent, ProgressEvent, TransportFailure};
use crate::transport::{EventSink, Transport, TransportEvents, TransportFactory};

type Outcome = Result<Value, RequestError>;

/// Where a single request is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Sent,
    CompletedSuccess,
    CompletedFailure,
    Aborted,
}

impl RequestState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestState::CompletedSuccess | RequestState::CompletedFailure | RequestState::Aborted
        )
    }
}

/// Issues one-shot requests over transports produced by a factory.
#[derive(Clone)]
pub struct RequestController {
    factory: Arc<dyn TransportFactory>,
    options: ControllerOptions,
}

impl RequestController {
    pub fn new<F>(factory: F) -> Self
    where
        F: TransportFactory + 'static,
    {
        Self::with_options(factory, ControllerOptions::default())
    }

    pub fn with_options<F>(factory: F, options: ControllerOptions) -> Self
    where
        F: TransportFactory + 'static,
    {
        Self {
            factory: Arc::new(factory),
            options,
        }
    }

    /// Start a request and return the future of its decoded JSON body.
    ///
    /// The abort function is installed on `config.abort_token` before the
    /// payload is sent.
    pub fn execute(&self, config: RequestConfig) -> ResponseFuture {
        let RequestConfig {
            url,
            method,
            headers,
            data,
            with_credentials,
            on_progress,
            on_complete,
            on_error,
            abort_token,
        } = config;

        let transport = self.factory.create();
        let (tx, rx) = oneshot::channel();
        let state = Arc::new(Mutex::new(RequestState::Idle));
        let shared = Arc::new(Shared {
            url: url.clone(),
            success_status: self.options.success_status,
            on_progress,
            on_complete,
            on_error,
            state: state.clone(),
            lifecycle: Mutex::new(Lifecycle {
                tx: Some(tx),
                transport: Some(transport.clone()),
                last_percent: None,
                complete_notified: false,
            }),
        });

        tracing::debug!(target: "xhr_core::controller", %method, %url, "opening request");
        transport.open(method, &url);
        transport.set_with_credentials(with_credentials);
        for (name, value) in &headers {
            transport.set_request_header(name, value);
        }

        let weak = Arc::downgrade(&shared);
        abort_token.install(move || weak.upgrade().is_some_and(|shared| shared.abort()));

        transport.attach(EventSink::new(shared.clone()));

        let sent = shared.mark_sent();
        // From here on only the transport's sinks keep the request alive.
        drop(shared);
        if sent {
            tracing::debug!(target: "xhr_core::controller", %url, "sending request");
            transport.send(data);
        } else {
            tracing::debug!(target: "xhr_core::controller", %url, "aborted before send");
        }

        ResponseFuture {
            rx,
            state,
            url,
            abort_token,
        }
    }
}

impl std::fmt::Debug for RequestController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestController")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

struct Lifecycle {
    tx: Option<oneshot::Sender<Outcome>>,
    transport: Option<Arc<dyn Transport>>,
    last_percent: Option<u8>,
    complete_notified: bool,
}

struct Shared {
    url: String,
    success_status: u16,
    on_progress: Option<ProgressCallback>,
    on_complete: Option<CompleteCallback>,
    on_error: Option<ErrorCallback>,
    /// Locked only while `lifecycle` is held, or on its own.
    state: Arc<Mutex<RequestState>>,
    lifecycle: Mutex<Lifecycle>,
}

struct Claim {
    tx: oneshot::Sender<Outcome>,
    transport: Option<Arc<dyn Transport>>,
}

impl Shared {
    /// Move `Idle -> Sent`. False if the request was aborted during setup.
    fn mark_sent(&self) -> bool {
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.tx.is_none() {
            return false;
        }
        *self.state.lock() = RequestState::Sent;
        true
    }

    /// Take the right to settle. Only the first caller gets `Some`.
    ///
    /// The transport is released here as well, which breaks the
    /// transport -> sink -> shared cycle.
    fn claim(&self, state: RequestState) -> Option<Claim> {
        let mut lifecycle = self.lifecycle.lock();
        let tx = lifecycle.tx.take()?;
        *self.state.lock() = state;
        Some(Claim {
            tx,
            transport: lifecycle.transport.take(),
        })
    }

    fn settle(&self, state: RequestState, outcome: Outcome) -> bool {
        let Some(claim) = self.claim(state) else {
            tracing::debug!(target: "xhr_core::controller", url = %self.url, ?state, "request already settled");
            return false;
        };
        tracing::debug!(target: "xhr_core::controller", url = %self.url, ?state, "request settled");
        drop(claim.transport);
        // The caller may have dropped the future; nothing left to notify.
        let _ = claim.tx.send(outcome);
        true
    }

    fn abort(&self) -> bool {
        let Some(claim) = self.claim(RequestState::Aborted) else {
            tracing::debug!(target: "xhr_core::controller", url = %self.url, "abort after settlement ignored");
            return false;
        };
        tracing::debug!(target: "xhr_core::controller", url = %self.url, "aborting request");
        if let Some(transport) = claim.transport {
            transport.abort();
        }
        let _ = claim.tx.send(Err(RequestError::Aborted {
            url: self.url.clone(),
        }));
        true
    }

    /// Claim the slot, tell the observer, then reject.
    fn fail(&self, info: ErrorInfo, error: RequestError) -> bool {
        let Some(claim) = self.claim(RequestState::CompletedFailure) else {
            tracing::debug!(target: "xhr_core::controller", url = %self.url, "failure after settlement ignored");
            return false;
        };
        tracing::debug!(target: "xhr_core::controller", url = %self.url, %error, "request failed");
        drop(claim.transport);
        if let Some(on_error) = &self.on_error {
            on_error(&info);
        }
        let _ = claim.tx.send(Err(error));
        true
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        let Some(tx) = self.lifecycle.get_mut().tx.take() else {
            return;
        };
        tracing::warn!(target: "xhr_core::controller", url = %self.url, "transport released the request without completing it");
        *self.state.lock() = RequestState::CompletedFailure;
        let _ = tx.send(Err(RequestError::TransportError {
            message: "transport released the request without completing it".to_string(),
        }));
    }
}

impl TransportEvents for Shared {
    fn upload_progress(&self, event: ProgressEvent) {
        let Some(percent) = event.percent() else {
            tracing::trace!(target: "xhr_core::controller", url = %self.url, "progress without a known total");
            return;
        };

        let fire_complete = {
            let mut lifecycle = self.lifecycle.lock();
            if lifecycle.tx.is_none() {
                return;
            }
            if lifecycle.last_percent.is_some_and(|last| percent < last) {
                return;
            }
            lifecycle.last_percent = Some(percent);
            let fire = percent >= 100 && !lifecycle.complete_notified;
            if fire {
                lifecycle.complete_notified = true;
            }
            fire
        };

        tracing::trace!(target: "xhr_core::controller", url = %self.url, percent, "upload progress");
        if let Some(on_progress) = &self.on_progress {
            on_progress(percent, &event);
        }
        if fire_complete {
            if let Some(on_complete) = &self.on_complete {
                on_complete();
            }
        }
    }

    fn load(&self, event: LoadEvent) {
        if event.status != self.success_status {
            self.fail(
                ErrorInfo::Status {
                    status: event.status,
                    response: event.response_text.clone(),
                },
                RequestError::RequestFailed {
                    status: event.status,
                    response: event.response_text,
                },
            );
            return;
        }

        match serde_json::from_str::<Value>(&event.response_text) {
            Ok(value) => self.settle(RequestState::CompletedSuccess, Ok(value)),
            Err(err) => self.settle(RequestState::CompletedFailure, Err(err.into())),
        };
    }

    fn error(&self, failure: TransportFailure) {
        tracing::warn!(target: "xhr_core::controller", url = %self.url, error = %failure, "transport error");
        self.fail(ErrorInfo::Transport(failure.clone()), failure.into());
    }
}

/// The pending result of one `execute` call.
///
/// Resolves with the decoded JSON body or rejects with a `RequestError`,
/// exactly once.
pub struct ResponseFuture {
    rx: oneshot::Receiver<Outcome>,
    state: Arc<Mutex<RequestState>>,
    url: String,
    abort_token: AbortToken,
}

impl ResponseFuture {
    pub fn state(&self) -> RequestState {
        *self.state.lock()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// The token the abort function was installed on.
    pub fn abort_token(&self) -> &AbortToken {
        &self.abort_token
    }

    /// Await the result and deserialize it into `T`.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T, RequestError> {
        let value = self.await?;
        Ok(serde_json::from_value(value)?)
    }
}

impl Future for ResponseFuture {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(_)) => Poll::Ready(Err(RequestError::TransportError {
                message: "transport dropped the request without completing it".to_string(),
            })),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl std::fmt::Debug for ResponseFuture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseFuture")
            .field("url", &self.url)
            .field("state", &self.state())
            .finish()
    }
}
