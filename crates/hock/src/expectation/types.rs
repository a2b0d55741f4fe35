//! Type definitions for expectations.
//!
//! This module contains the inputs used to declare an expectation, the shape of
//! an incoming request as seen by the matcher, the serializable snapshot, and
//! the error types raised while matching or delivering.

use serde::{Deserialize, Serialize, Serializer};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Body marker that matches any incoming body.
pub const WILDCARD_BODY: &str = "*";

/// Multiplicity value meaning "no upper bound".
pub const UNBOUNDED: usize = usize::MAX;

// ============================================================================
// Declaration Types
// ============================================================================

/// Expected request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectedBody {
    /// Matches any incoming body (declared as `*`).
    Wildcard,
    /// Canonical body text. Structured bodies are stored as their JSON text.
    Literal(String),
}

impl ExpectedBody {
    pub fn as_str(&self) -> &str {
        match self {
            ExpectedBody::Wildcard => WILDCARD_BODY,
            ExpectedBody::Literal(text) => text,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, ExpectedBody::Wildcard)
    }
}

impl Default for ExpectedBody {
    fn default() -> Self {
        ExpectedBody::Literal(String::new())
    }
}

impl From<String> for ExpectedBody {
    fn from(text: String) -> Self {
        if text == WILDCARD_BODY {
            ExpectedBody::Wildcard
        } else {
            ExpectedBody::Literal(text)
        }
    }
}

impl From<&str> for ExpectedBody {
    fn from(text: &str) -> Self {
        ExpectedBody::from(text.to_string())
    }
}

impl From<serde_json::Value> for ExpectedBody {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(text) => ExpectedBody::from(text),
            other => ExpectedBody::Literal(other.to_string()),
        }
    }
}

impl Serialize for ExpectedBody {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Options used to construct an [`Expectation`](super::Expectation).
#[derive(Debug, Clone, Default)]
pub struct ExpectationOptions {
    /// HTTP method, GET when absent.
    pub method: Option<String>,
    pub url: String,
    /// Expected body, empty text when absent.
    pub body: Option<ExpectedBody>,
    /// Expected headers. Keys are lower-cased on construction.
    pub headers: HashMap<String, String>,
}

impl ExpectationOptions {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: Some(method.into()),
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_body(mut self, body: impl Into<ExpectedBody>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Arguments for [`Expectation::many`](super::Expectation::many).
///
/// A field left as `None` leaves the corresponding bound untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Many {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl Many {
    pub fn new(min: usize, max: usize) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn min(min: usize) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    pub fn max(max: usize) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }
}

// ============================================================================
// Incoming Request Types
// ============================================================================

/// Body of an incoming request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Raw body text as received on the wire.
    Text(String),
    /// Already structured body (in-process callers).
    Json(serde_json::Value),
}

impl RequestBody {
    /// Body as text; structured bodies are serialized.
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            RequestBody::Text(text) => Cow::Borrowed(text),
            RequestBody::Json(value) => Cow::Owned(value.to_string()),
        }
    }
}

impl Default for RequestBody {
    fn default() -> Self {
        RequestBody::Text(String::new())
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        RequestBody::Text(text)
    }
}

impl From<&str> for RequestBody {
    fn from(text: &str) -> Self {
        RequestBody::Text(text.to_string())
    }
}

impl From<serde_json::Value> for RequestBody {
    fn from(value: serde_json::Value) -> Self {
        RequestBody::Json(value)
    }
}

/// A request as seen by the matcher.
///
/// Header keys are compared exactly as they appear here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncomingRequest {
    pub method: String,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: RequestBody,
}

impl IncomingRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = body.into();
        self
    }
}

// ============================================================================
// Request Filters
// ============================================================================

/// Rewrites the incoming url before matching.
pub type PathFilter = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Rewrites the incoming body text before matching.
pub type BodyFilter = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Hooks a registrar applies to incoming requests at match time.
#[derive(Clone, Default)]
pub struct RequestFilters {
    pub path: Option<PathFilter>,
    pub body: Option<BodyFilter>,
}

impl fmt::Debug for RequestFilters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestFilters")
            .field("path", &self.path.is_some())
            .field("body", &self.body.is_some())
            .finish()
    }
}

// ============================================================================
// Snapshot Types
// ============================================================================

/// Point-in-time view of an expectation, used for reporting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpectationSnapshot {
    pub method: String,
    pub url: String,
    pub body: String,
    pub headers: HashMap<String, String>,
    pub stats: ExpectationStats,
}

/// Live counters of an expectation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExpectationStats {
    pub count: usize,
    pub min: usize,
    /// `None` when unbounded
    pub max: Option<usize>,
    pub is_done: bool,
    pub should_prune: bool,
}

impl fmt::Display for ExpectationSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{} {}", self.method, self.url),
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Which side of a body comparison failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodySide {
    Expected,
    Incoming,
}

impl fmt::Display for BodySide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodySide::Expected => f.write_str("expected"),
            BodySide::Incoming => f.write_str("incoming"),
        }
    }
}

/// Fault raised while comparing a request against an expectation.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error("{side} body is not valid JSON: {source}")]
    InvalidJson {
        side: BodySide,
        #[source]
        source: serde_json::Error,
    },
}

/// Fault raised while writing a reply.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Failed to open reply file {path}: {source}")]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read reply body: {0}")]
    Read(#[from] std::io::Error),
    #[error("Failed to encode reply body: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Response head already written")]
    HeadAlreadyWritten,
    #[error("Response already ended")]
    Ended,
    #[error("Response channel closed")]
    Closed,
}
