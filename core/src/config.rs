//! Per-call request configuration and controller-wide options.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::abort::AbortToken;
use crate::error::ErrorInfo;
use crate::http::{HttpMethod, Payload, ProgressEvent};

/// Status treated as success when none is configured.
pub const DEFAULT_SUCCESS_STATUS: u16 = 200;

pub type ProgressCallback = Arc<dyn Fn(u8, &ProgressEvent) + Send + Sync>;
pub type CompleteCallback = Arc<dyn Fn() + Send + Sync>;
pub type ErrorCallback = Arc<dyn Fn(&ErrorInfo) + Send + Sync>;

/// Everything one call to `RequestController::execute` needs.
///
/// Observer callbacks are optional; the returned future is the only source
/// of truth for the outcome.
#[derive(Clone)]
pub struct RequestConfig {
    pub url: String,
    pub method: HttpMethod,
    pub headers: BTreeMap<String, String>,
    pub data: Payload,
    pub with_credentials: bool,
    pub on_progress: Option<ProgressCallback>,
    pub on_complete: Option<CompleteCallback>,
    pub on_error: Option<ErrorCallback>,
    pub abort_token: AbortToken,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            method: HttpMethod::default(),
            headers: BTreeMap::new(),
            data: Payload::Empty,
            with_credentials: true,
            on_progress: None,
            on_complete: None,
            on_error: None,
            abort_token: AbortToken::new(),
        }
    }
}

impl RequestConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// Add a request header. A later value for the same name replaces the earlier one.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn data(mut self, data: impl Into<Payload>) -> Self {
        self.data = data.into();
        self
    }

    pub fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.with_credentials = with_credentials;
        self
    }

    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(u8, &ProgressEvent) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_complete = Some(Arc::new(callback));
        self
    }

    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ErrorInfo) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(callback));
        self
    }

    pub fn abort_token(mut self, token: AbortToken) -> Self {
        self.abort_token = token;
        self
    }
}

impl fmt::Debug for RequestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestConfig")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("headers", &self.headers)
            .field("data", &self.data)
            .field("with_credentials", &self.with_credentials)
            .field("on_progress", &self.on_progress.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("abort_token", &self.abort_token)
            .finish()
    }
}

/// Settings shared by every request a controller issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    /// The one status code treated as success; anything else is a failure.
    pub success_status: u16,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            success_status: DEFAULT_SUCCESS_STATUS,
        }
    }
}
