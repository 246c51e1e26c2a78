//! Client configuration.
//!
//! Configuration is resolved from the environment (the variables the
//! Terraform provider reads) or from a JSON file. Lookups go through a
//! function so resolution can be tested without touching process state.

use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

/// Environment variables holding the API key, in order of precedence.
pub const API_KEY_VARS: [&str; 2] = ["HONEYCOMBIO_APIKEY", "HONEYCOMB_API_KEY"];

/// Environment variable overriding the API endpoint.
pub const API_URL_VAR: &str = "HONEYCOMB_API_ENDPOINT";

/// Default API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.honeycomb.io/";

fn default_api_url() -> Url {
    Url::parse(DEFAULT_API_URL).expect("default API URL is valid")
}

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

fn parse_url(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl {
            url: raw.to_string(),
            reason: "not a base URL".to_string(),
        });
    }
    // Request paths are joined onto the endpoint; keep any path prefix.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Settings for talking to the trigger API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API key sent with every request.
    pub api_key: String,

    /// API root that request paths are joined onto.
    #[serde(default = "default_api_url")]
    pub api_url: Url,

    /// Sent as `User-Agent`; defaults to this crate's name and version.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: default_api_url(),
            user_agent: default_user_agent(),
        }
    }
}

impl ClientConfig {
    /// Creates a configuration for the default endpoint.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Overrides the API endpoint.
    pub fn with_api_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.api_url = parse_url(raw)?;
        Ok(self)
    }

    /// Resolves configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves configuration through `lookup`, which maps a variable name
    /// to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = API_KEY_VARS
            .iter()
            .find_map(|name| lookup(*name).filter(|v| !v.trim().is_empty()))
            .ok_or(ConfigError::MissingApiKey)?;

        let mut config = Self::new(api_key);
        if let Some(raw) = lookup(API_URL_VAR).filter(|v| !v.trim().is_empty()) {
            config = config.with_api_url(raw.trim())?;
        }
        Ok(config)
    }

    /// Loads configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let read_err = |reason: String| ConfigError::Read {
            path: path.display().to_string(),
            reason,
        };

        let contents = std::fs::read_to_string(path).map_err(|e| read_err(e.to_string()))?;
        let mut config: Self = serde_json::from_str(&contents).map_err(|e| read_err(e.to_string()))?;
        config.api_url = parse_url(config.api_url.as_str())?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(())
    }
}
