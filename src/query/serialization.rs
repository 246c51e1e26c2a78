//! Query specification JSON helpers.
//!
//! Serde already provides the encoding. These helpers render a query as
//! the platform's JSON query specification with stable formatting.

use crate::error::QueryError;
use crate::query::spec::QuerySpec;

/// Serialize a query specification to pretty JSON.
pub fn to_json_pretty(query: &QuerySpec) -> Result<String, QueryError> {
    serde_json::to_string_pretty(query).map_err(|e| QueryError::Serialize {
        message: e.to_string(),
    })
}

/// Deserialize a query specification from JSON.
///
/// Callers that intend to use the query in a trigger should then invoke
/// [`QuerySpec::validate_trigger_subset`].
pub fn from_json(s: &str) -> Result<QuerySpec, QueryError> {
    serde_json::from_str::<QuerySpec>(s).map_err(|e| QueryError::Parse {
        message: e.to_string(),
    })
}
