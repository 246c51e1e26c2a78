//! Addresses of managed triggers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::trigger::TriggerId;

/// Error parsing a [`ResourceAddress`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid trigger address {input:?}: expected <dataset>/<trigger ID>")]
pub struct ParseAddressError {
    input: String,
}

/// Where a managed trigger lives: its dataset and its server-assigned ID.
///
/// Renders as, and parses from, `<dataset>/<trigger ID>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceAddress {
    /// Dataset the trigger belongs to.
    pub dataset: String,
    /// Server-assigned trigger ID.
    pub id: TriggerId,
}

impl ResourceAddress {
    /// The address of trigger `id` in `dataset`.
    #[must_use]
    pub fn new(dataset: impl Into<String>, id: impl Into<TriggerId>) -> Self {
        Self {
            dataset: dataset.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for ResourceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.dataset, self.id)
    }
}

impl FromStr for ResourceAddress {
    type Err = ParseAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseAddressError {
            input: s.to_string(),
        };
        // Trigger IDs never contain a slash.
        let (dataset, id) = s.trim().rsplit_once('/').ok_or_else(err)?;
        if dataset.is_empty() || id.is_empty() {
            return Err(err());
        }
        Ok(Self::new(dataset, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dataset_and_id() {
        let address: ResourceAddress = "production/aBcD123".parse().unwrap();
        assert_eq!(address, ResourceAddress::new("production", "aBcD123"));
        assert_eq!(address.to_string(), "production/aBcD123");
    }

    #[test]
    fn rejects_malformed() {
        for input in ["", "production", "/aBcD123", "production/", "  "] {
            let err = input.parse::<ResourceAddress>().unwrap_err();
            assert!(err.to_string().contains("expected <dataset>/<trigger ID>"), "{input:?}");
        }
    }
}
