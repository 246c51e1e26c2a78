//! Blocking HTTP transport for the trigger API.
//!
//! Joins request paths onto the configured endpoint, injects the API key
//! and user agent headers, and returns the status line and JSON body as a
//! [`Response`]. Non-2xx statuses are returned, not turned into errors.

use std::io::Read;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};

use crate::config::ClientConfig;
use crate::error::{ConfigError, TransportError};
use crate::transport::{Method, Request, Response, Status, Transport};

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-honeycomb-team";

/// Default cap on the size of a response body.
pub const DEFAULT_MAX_RESPONSE_BYTES: u64 = 4 * 1024 * 1024; // 4 MiB

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// [`Transport`] over HTTPS using a blocking reqwest client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: ClientConfig,
    max_response_bytes: u64,
}

fn header_value(name: &'static str, value: &str) -> Result<HeaderValue, ConfigError> {
    HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidHeader {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

impl HttpTransport {
    /// Builds a transport for `config`.
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        Self::with_timeout(config, DEFAULT_TIMEOUT)
    }

    /// Builds a transport whose requests time out after `timeout`.
    pub fn with_timeout(config: ClientConfig, timeout: Duration) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut api_key = header_value(API_KEY_HEADER, &config.api_key)?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, api_key);
        headers.insert(USER_AGENT, header_value("User-Agent", &config.user_agent)?);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient {
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            config,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        })
    }

    /// Caps the size of response bodies; larger bodies fail with
    /// [`TransportError::DeserializationFailed`] without being buffered.
    #[must_use]
    pub fn with_max_response_bytes(mut self, limit: u64) -> Self {
        self.max_response_bytes = limit;
        self
    }

    /// Returns the configuration this transport was built from.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: Request) -> Result<Response, TransportError> {
        let url = self
            .config
            .api_url
            .join(request.path.trim_start_matches('/'))
            .map_err(|e| TransportError::SerializationFailed {
                message: format!("invalid request path {:?}: {e}", request.path),
            })?;

        let mut builder = self.client.request(to_reqwest(request.method), url);
        if let Some(body) = &request.body {
            let bytes = serde_json::to_vec(body).map_err(|e| TransportError::SerializationFailed {
                message: e.to_string(),
            })?;
            builder = builder.header(CONTENT_TYPE, "application/json").body(bytes);
        }

        let response = builder.send().map_err(|e| TransportError::ConnectionFailed {
            message: e.to_string(),
        })?;

        let code = response.status();
        let status = Status::new(code.as_u16(), code.canonical_reason().unwrap_or(""));

        let limit = self.max_response_bytes;
        let too_large = || TransportError::DeserializationFailed {
            message: format!("response body exceeds {limit} bytes"),
        };
        if response.content_length().is_some_and(|len| len > limit) {
            return Err(too_large());
        }
        // Bodies without a declared length are read one byte past the cap.
        let mut bytes = Vec::new();
        response
            .take(limit.saturating_add(1))
            .read_to_end(&mut bytes)
            .map_err(|e| TransportError::ConnectionFailed {
                message: format!("failed to read response body: {e}"),
            })?;
        if u64::try_from(bytes.len()).unwrap_or(u64::MAX) > limit {
            return Err(too_large());
        }

        let body = if bytes.is_empty() {
            None
        } else {
            match serde_json::from_slice(&bytes) {
                Ok(value) => Some(value),
                // Error pages are not always JSON; keep the text for the message.
                Err(_) if !status.is_success() => {
                    Some(serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned()))
                }
                Err(e) => {
                    return Err(TransportError::DeserializationFailed {
                        message: e.to_string(),
                    })
                }
            }
        };

        Ok(Response::new(status, body))
    }
}
