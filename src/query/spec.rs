//! Query specification types.
//!
//! These mirror the platform's JSON query specification. Only the shape is
//! modelled here; queries are never executed by this crate.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An analytics query specification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    /// Columns to group by.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub breakdowns: Vec<String>,

    /// Aggregates to compute. A trigger query has exactly one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub calculations: Vec<CalculationSpec>,

    /// Predicates restricting the events considered.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<FilterSpec>,

    /// How `filters` combine; the platform assumes `AND` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_combination: Option<FilterCombination>,

    /// Maximum number of result rows. Not allowed in a trigger query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,

    /// Result ordering. Not allowed in a trigger query.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub orders: Vec<OrderSpec>,

    /// Relative time range in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_range: Option<u64>,

    /// Absolute start, as unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,

    /// Absolute end, as unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,

    /// Bucket width in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granularity: Option<u64>,
}

impl QuerySpec {
    /// A query with a single calculation and nothing else.
    #[must_use]
    pub fn single(calculation: CalculationSpec) -> Self {
        Self {
            calculations: vec![calculation],
            ..Self::default()
        }
    }

    /// Appends a filter.
    #[must_use]
    pub fn filter(mut self, filter: FilterSpec) -> Self {
        self.filters.push(filter);
        self
    }

    /// Appends a breakdown column.
    #[must_use]
    pub fn breakdown(mut self, column: impl Into<String>) -> Self {
        self.breakdowns.push(column.into());
        self
    }

    /// Sets how filters are combined.
    #[must_use]
    pub fn combine_filters(mut self, combination: FilterCombination) -> Self {
        self.filter_combination = Some(combination);
        self
    }
}

/// Aggregation operators.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalculationOp {
    Count,
    Concurrency,
    Sum,
    Avg,
    CountDistinct,
    Max,
    Min,
    P001,
    P01,
    P05,
    P10,
    P25,
    P50,
    P75,
    P90,
    P95,
    P99,
    P999,
    Heatmap,
    RateAvg,
    RateSum,
    RateMax,
}

impl CalculationOp {
    /// Returns true if the operator aggregates a column value.
    ///
    /// `COUNT` and `CONCURRENCY` operate on events and take no column.
    #[must_use]
    pub const fn requires_column(self) -> bool {
        !matches!(self, Self::Count | Self::Concurrency)
    }

    /// Returns the operator as it appears on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Concurrency => "CONCURRENCY",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::CountDistinct => "COUNT_DISTINCT",
            Self::Max => "MAX",
            Self::Min => "MIN",
            Self::P001 => "P001",
            Self::P01 => "P01",
            Self::P05 => "P05",
            Self::P10 => "P10",
            Self::P25 => "P25",
            Self::P50 => "P50",
            Self::P75 => "P75",
            Self::P90 => "P90",
            Self::P95 => "P95",
            Self::P99 => "P99",
            Self::P999 => "P999",
            Self::Heatmap => "HEATMAP",
            Self::RateAvg => "RATE_AVG",
            Self::RateSum => "RATE_SUM",
            Self::RateMax => "RATE_MAX",
        }
    }
}

impl fmt::Display for CalculationOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One aggregate of a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationSpec {
    /// Aggregation applied.
    pub op: CalculationOp,
    /// Column aggregated; absent for `COUNT` and `CONCURRENCY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
}

impl CalculationSpec {
    /// `COUNT` of events.
    #[must_use]
    pub const fn count() -> Self {
        Self {
            op: CalculationOp::Count,
            column: None,
        }
    }

    /// An operator applied to a column.
    #[must_use]
    pub fn of(op: CalculationOp, column: impl Into<String>) -> Self {
        Self {
            op,
            column: Some(column.into()),
        }
    }
}

/// Filter operators.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterOp {
    #[serde(rename = "=")]
    Equals,
    #[serde(rename = "!=")]
    DoesNotEqual,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterThanOrEqual,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessThanOrEqual,
    #[serde(rename = "starts-with")]
    StartsWith,
    #[serde(rename = "does-not-start-with")]
    DoesNotStartWith,
    #[serde(rename = "exists")]
    Exists,
    #[serde(rename = "does-not-exist")]
    DoesNotExist,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "does-not-contain")]
    DoesNotContain,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "not-in")]
    NotIn,
}

impl FilterOp {
    /// Returns true if the operator is unary and takes no value.
    #[must_use]
    pub const fn is_unary(self) -> bool {
        matches!(self, Self::Exists | Self::DoesNotExist)
    }
}

/// A predicate over a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Column tested.
    pub column: String,
    /// Comparison applied.
    pub op: FilterOp,
    /// Operand; a JSON array for `in`/`not-in`, absent for unary operators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl FilterSpec {
    /// A filter with an operand.
    #[must_use]
    pub fn new(column: impl Into<String>, op: FilterOp, value: impl Into<serde_json::Value>) -> Self {
        Self {
            column: column.into(),
            op,
            value: Some(value.into()),
        }
    }

    /// A unary filter such as `exists`.
    #[must_use]
    pub fn unary(column: impl Into<String>, op: FilterOp) -> Self {
        Self {
            column: column.into(),
            op,
            value: None,
        }
    }
}

/// How multiple filters are combined.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FilterCombination {
    And,
    Or,
}

/// Sort direction.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Result ordering, by column or by calculation.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<CalculationOp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<SortOrder>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn calculation_ops_use_wire_names() {
        for op in [
            CalculationOp::Count,
            CalculationOp::CountDistinct,
            CalculationOp::P001,
            CalculationOp::P999,
            CalculationOp::Heatmap,
            CalculationOp::RateMax,
        ] {
            let encoded = serde_json::to_value(op).unwrap();
            assert_eq!(encoded, json!(op.as_str()));
        }
    }

    #[test]
    fn empty_fields_are_omitted() {
        let query = QuerySpec::single(CalculationSpec::count());
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({"calculations": [{"op": "COUNT"}]})
        );
    }

    #[test]
    fn decodes_platform_query() {
        let query: QuerySpec = serde_json::from_value(json!({
            "calculations": [{"op": "P99", "column": "duration_ms"}],
            "filters": [
                {"column": "column_1", "op": "exists"},
                {"column": "column_2", "op": "contains", "value": "foobar"},
                {"column": "status", "op": "in", "value": [500, 503]}
            ],
            "filter_combination": "OR",
            "orders": [{"op": "P99", "column": "duration_ms", "order": "descending"}],
            "limit": 100,
            "time_range": 7200
        }))
        .unwrap();

        assert_eq!(query.calculations, vec![CalculationSpec::of(CalculationOp::P99, "duration_ms")]);
        assert_eq!(query.filters[0], FilterSpec::unary("column_1", FilterOp::Exists));
        assert_eq!(query.filters[1], FilterSpec::new("column_2", FilterOp::Contains, "foobar"));
        assert_eq!(query.filters[2].value, Some(json!([500, 503])));
        assert_eq!(query.filter_combination, Some(FilterCombination::Or));
        assert_eq!(query.orders[0].order, Some(SortOrder::Descending));
        assert_eq!(query.limit, Some(100));
        assert_eq!(query.time_range, Some(7200));
    }

    #[test]
    fn column_requirements() {
        assert!(!CalculationOp::Count.requires_column());
        assert!(!CalculationOp::Concurrency.requires_column());
        assert!(CalculationOp::Avg.requires_column());
        assert!(FilterOp::Exists.is_unary());
        assert!(!FilterOp::In.is_unary());
    }
}
