//! Plain-data types exchanged with the transport.
//!
//! # Design
//! The controller never touches the network itself. It hands a `Payload` to
//! the transport verbatim and receives `ProgressEvent` / `LoadEvent` /
//! `TransportFailure` values back through an `EventSink`. All fields use owned
//! types so events can be emitted from whatever thread the host runs its I/O
//! on.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::{Map, Value};

/// HTTP method for a request. Defaults to `Post`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HttpMethod {
    Get,
    #[default]
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a verb outside the supported set is parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported HTTP method: {0}")]
pub struct UnknownMethod(pub String);

impl FromStr for HttpMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            _ => Err(UnknownMethod(s.to_string())),
        }
    }
}

/// Request body handed to `Transport::send` without re-serialization.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Payload {
    #[default]
    Empty,
    Text(String),
    Object(Map<String, Value>),
    Sequence(Vec<Value>),
}

impl Payload {
    pub fn is_empty(&self) -> bool {
        matches!(self, Payload::Empty)
    }

    /// Render the payload as body text for transports that send strings.
    ///
    /// `Text` is returned as-is; structured variants are JSON-encoded.
    pub fn to_body_string(&self) -> Option<String> {
        match self {
            Payload::Empty => None,
            Payload::Text(text) => Some(text.clone()),
            Payload::Object(map) => Some(Value::Object(map.clone()).to_string()),
            Payload::Sequence(items) => Some(Value::Array(items.clone()).to_string()),
        }
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Payload::Object(map)
    }
}

impl From<Vec<Value>> for Payload {
    fn from(items: Vec<Value>) -> Self {
        Payload::Sequence(items)
    }
}

/// Upload progress reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ProgressEvent {
    pub loaded: u64,
    pub total: u64,
}

impl ProgressEvent {
    /// Percentage uploaded, rounded up and clamped to `0..=100`.
    ///
    /// Returns `None` when `total` is zero (length not computable).
    pub fn percent(&self) -> Option<u8> {
        if self.total == 0 {
            return None;
        }
        let scaled = u128::from(self.loaded) * 100;
        let total = u128::from(self.total);
        let percent = scaled.div_ceil(total).min(100);
        Some(percent as u8)
    }
}

/// The transport finished the exchange and has a status and body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoadEvent {
    pub status: u16,
    pub response_text: String,
}

/// Network-level failure with no HTTP status available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure {
    pub message: String,
}

impl TransportFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
