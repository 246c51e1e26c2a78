//! Error types for the trigger client.
//!
//! All errors are strongly typed using thiserror, one enum per layer:
//! local validation, the transport boundary, the remote API, and
//! configuration. Callers branch on variants (most importantly
//! [`ClientError::NotFound`]) rather than on message text, except for
//! server rejections whose wording is part of the remote contract.

use thiserror::Error;

use crate::transport::Status;

/// Pre-flight validation errors raised before any request is sent.
///
/// Each variant renders to the fixed message of one trigger-subset rule.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("a trigger query should contain exactly one calculation")]
    ExactlyOneCalculation,

    #[error("a trigger query may not contain a HEATMAP calculation")]
    HeatmapCalculation,

    #[error("limit is not allowed in a trigger query")]
    LimitNotAllowed,

    #[error("orders is not allowed in a trigger query")]
    OrdersNotAllowed,
}

/// Errors rendering or parsing a query specification locally.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("failed to serialize query: {message}")]
    Serialize {
        message: String,
    },

    #[error("invalid query JSON: {message}")]
    Parse {
        message: String,
    },
}

/// Transport errors for client-server communication.
///
/// These are produced by a [`Transport`](crate::transport::Transport)
/// implementation and passed through the client unchanged.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Connection failed: {message}")]
    ConnectionFailed {
        message: String,
    },

    #[error("Failed to serialize request: {message}")]
    SerializationFailed {
        message: String,
    },

    #[error("Failed to deserialize response: {message}")]
    DeserializationFailed {
        message: String,
    },
}

/// Errors returned by [`TriggerClient`](crate::client::TriggerClient).
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    /// The dataset or trigger does not exist (HTTP 404).
    #[error("404 Not Found")]
    NotFound,

    /// The server rejected the request. `status` is the status line
    /// (e.g. `422 Unprocessable Entity`) and `message` the server's own wording.
    #[error("{status}: {message}")]
    Rejected {
        status: Status,
        message: String,
    },

    /// An operation that addresses an existing trigger was given one without an ID.
    #[error("{operation} requires a trigger ID")]
    MissingId {
        operation: &'static str,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ClientError {
    /// Returns true if this is the distinguished not-found signal.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Returns the HTTP status code of a server rejection, if any.
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::NotFound => Some(404),
            Self::Rejected { status, .. } => Some(status.code()),
            _ => None,
        }
    }
}

/// Configuration errors.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("an API key is required (set HONEYCOMBIO_APIKEY or HONEYCOMB_API_KEY)")]
    MissingApiKey,

    #[error("invalid API URL {url:?}: {reason}")]
    InvalidUrl {
        url: String,
        reason: String,
    },

    #[error("invalid value for header {name}: {reason}")]
    InvalidHeader {
        name: String,
        reason: String,
    },

    #[error("failed to build HTTP client: {reason}")]
    HttpClient {
        reason: String,
    },

    #[error("failed to read config file {path}: {reason}")]
    Read {
        path: String,
        reason: String,
    },
}

/// Top-level error type.
///
/// This enum encompasses all errors the client and the reconciliation
/// driver can return.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        Self::Client(ClientError::Transport(err))
    }
}

impl Error {
    /// Returns true if this is a local validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if the remote trigger or dataset does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Client(ClientError::NotFound))
    }

    /// Returns true if this is a transport error.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Client(ClientError::Transport(_)))
    }

    /// Returns true if resending the same request could succeed.
    ///
    /// Nothing in this crate retries; this only classifies.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Validation(_) | Self::Query(_) | Self::Config(_) => false, // won't change on retry
            Self::Client(e) => match e {
                ClientError::Transport(TransportError::ConnectionFailed { .. }) => true,
                ClientError::Rejected { status, .. } => status.code() >= 500,
                _ => false,
            },
        }
    }
}

/// Result type alias for trigger operations.
pub type Result<T> = std::result::Result<T, Error>;
