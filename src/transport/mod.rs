//! Transport boundary for the trigger client.
//!
//! The client never talks HTTP directly. It hands a [`Request`] to a
//! [`Transport`] and interprets the returned [`Response`]. This enables:
//! - An in-memory emulation of the remote API for tests and embedded use
//! - A blocking HTTP transport for the real API (`http` feature)
//! - Caller-provided transports with their own retry/auth policies

use std::borrow::Cow;
use std::fmt;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

use crate::error::TransportError;

#[cfg(feature = "http")]
pub mod http;
pub mod memory;

#[cfg(feature = "http")]
pub use http::HttpTransport;
pub use memory::InMemoryTransport;

/// HTTP verbs used by the trigger API.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// Returns the verb as it appears on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP status: numeric code plus reason phrase.
///
/// Renders as a status line, e.g. `422 Unprocessable Entity`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Status {
    code: u16,
    reason: Cow<'static, str>,
}

#[allow(missing_docs)]
impl Status {
    pub const OK: Self = Self::from_static(200, "OK");
    pub const CREATED: Self = Self::from_static(201, "Created");
    pub const NO_CONTENT: Self = Self::from_static(204, "No Content");
    pub const BAD_REQUEST: Self = Self::from_static(400, "Bad Request");
    pub const UNAUTHORIZED: Self = Self::from_static(401, "Unauthorized");
    pub const NOT_FOUND: Self = Self::from_static(404, "Not Found");
    pub const METHOD_NOT_ALLOWED: Self = Self::from_static(405, "Method Not Allowed");
    pub const UNPROCESSABLE_ENTITY: Self = Self::from_static(422, "Unprocessable Entity");

    const fn from_static(code: u16, reason: &'static str) -> Self {
        Self {
            code,
            reason: Cow::Borrowed(reason),
        }
    }

    /// Creates a status from a code and reason phrase.
    #[must_use]
    pub fn new(code: u16, reason: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    /// Returns the numeric status code.
    #[must_use]
    pub const fn code(&self) -> u16 {
        self.code
    }

    /// Returns the reason phrase.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Returns true for 2xx codes.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code >= 200 && self.code < 300
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reason.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{} {}", self.code, self.reason)
        }
    }
}

/// Bytes escaped in a path segment: the URL path set plus the segment
/// separator and `%` itself.
const SEGMENT_ESCAPE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Percent-encodes `raw` for use as a single path segment.
#[must_use]
pub fn encode_segment(raw: &str) -> String {
    utf8_percent_encode(raw, SEGMENT_ESCAPE_SET).to_string()
}

/// Decodes a percent-encoded path segment. Returns `None` if the decoded
/// bytes are not UTF-8.
#[must_use]
pub fn decode_segment(segment: &str) -> Option<String> {
    percent_decode_str(segment)
        .decode_utf8()
        .ok()
        .map(Cow::into_owned)
}

/// A request against a dataset-scoped API path.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// HTTP verb.
    pub method: Method,
    /// Path relative to the API root, e.g. `/1/triggers/my-dataset`.
    /// Segments are percent-encoded.
    pub path: String,
    /// JSON payload, for create and update.
    pub body: Option<serde_json::Value>,
}

impl Request {
    /// A request without a body.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    /// Attaches a JSON body.
    #[must_use]
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A response: status plus the parsed JSON body, if there was one.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Status line.
    pub status: Status,
    /// Parsed body; `None` when the response had none.
    pub body: Option<serde_json::Value>,
}

impl Response {
    /// A response with `status` and `body`.
    #[must_use]
    pub fn new(status: Status, body: Option<serde_json::Value>) -> Self {
        Self { status, body }
    }

    /// Builds an error response in the API's `{"error": "..."}` shape.
    #[must_use]
    pub fn error(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            body: Some(serde_json::json!({ "error": message.into() })),
        }
    }

    /// Extracts the server's error message: the `error` field when the body
    /// has one, otherwise the body rendered as text.
    #[must_use]
    pub fn error_message(&self) -> String {
        match &self.body {
            Some(serde_json::Value::Object(map)) => match map.get("error") {
                Some(serde_json::Value::String(s)) => s.clone(),
                _ => serde_json::Value::Object(map.clone()).to_string(),
            },
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }
}

/// Contract for anything that can carry a request to the trigger API.
///
/// Implementations own connection handling, authentication, timeouts
/// and retries. A non-2xx status is a successful transport exchange and
/// must be returned as a [`Response`], not as an error.
pub trait Transport: Send + Sync {
    /// Sends a request and waits for the response.
    fn send(&self, request: Request) -> Result<Response, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: Request) -> Result<Response, TransportError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn send(&self, request: Request) -> Result<Response, TransportError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, request: Request) -> Result<Response, TransportError> {
        (**self).send(request)
    }
}
