//! Trigger-subset validation.
//!
//! Triggers evaluate a narrow dialect of the query language: a single
//! scalar aggregate compared against a threshold. This module checks that
//! a general [`QuerySpec`] stays within that dialect, so that violations
//! are reported before any request is sent. The server enforces the same
//! rules and remains the authority.

use crate::error::ValidationError;
use crate::query::spec::{CalculationOp, QuerySpec};

/// Checks whether `query` may be used as a trigger condition.
///
/// Rules are evaluated in order and the first violation is returned:
/// exactly one calculation, which is not `HEATMAP`, no `limit`, no `orders`.
///
/// # Examples
///
/// ```
/// use honeycomb_triggers::query::{matches_trigger_subset, CalculationSpec, QuerySpec};
///
/// let query = QuerySpec::single(CalculationSpec::count());
/// assert!(matches_trigger_subset(&query).is_ok());
/// ```
pub fn matches_trigger_subset(query: &QuerySpec) -> Result<(), ValidationError> {
    let [calculation] = query.calculations.as_slice() else {
        return Err(ValidationError::ExactlyOneCalculation);
    };
    if calculation.op == CalculationOp::Heatmap {
        return Err(ValidationError::HeatmapCalculation);
    }
    if query.limit.is_some() {
        return Err(ValidationError::LimitNotAllowed);
    }
    if !query.orders.is_empty() {
        return Err(ValidationError::OrdersNotAllowed);
    }
    Ok(())
}

impl QuerySpec {
    /// Validates this query against the trigger subset.
    ///
    /// See [`matches_trigger_subset`].
    pub fn validate_trigger_subset(&self) -> Result<(), ValidationError> {
        matches_trigger_subset(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::spec::{CalculationSpec, FilterOp, FilterSpec, OrderSpec, SortOrder};

    fn count_query() -> QuerySpec {
        QuerySpec::single(CalculationSpec::count())
    }

    #[test]
    fn single_count_is_accepted() {
        assert_eq!(matches_trigger_subset(&count_query()), Ok(()));
    }

    #[test]
    fn filters_and_breakdowns_are_allowed() {
        let query = QuerySpec::single(CalculationSpec::of(CalculationOp::P99, "duration_ms"))
            .filter(FilterSpec::unary("column_1", FilterOp::Exists))
            .breakdown("service");
        assert!(query.validate_trigger_subset().is_ok());
    }

    #[test]
    fn zero_calculations_rejected() {
        let query = QuerySpec::default();
        assert_eq!(
            matches_trigger_subset(&query),
            Err(ValidationError::ExactlyOneCalculation)
        );
    }

    #[test]
    fn two_calculations_rejected() {
        let mut query = count_query();
        query
            .calculations
            .push(CalculationSpec::of(CalculationOp::Avg, "duration_ms"));
        assert_eq!(
            matches_trigger_subset(&query),
            Err(ValidationError::ExactlyOneCalculation)
        );
    }

    #[test]
    fn heatmap_rejected() {
        let query = QuerySpec::single(CalculationSpec::of(CalculationOp::Heatmap, "duration_ms"));
        assert_eq!(
            matches_trigger_subset(&query),
            Err(ValidationError::HeatmapCalculation)
        );
    }

    #[test]
    fn limit_rejected() {
        let mut query = count_query();
        query.limit = Some(100);
        assert_eq!(matches_trigger_subset(&query), Err(ValidationError::LimitNotAllowed));
    }

    #[test]
    fn orders_rejected() {
        let mut query = count_query();
        query.orders.push(OrderSpec {
            column: Some("duration_ms".to_string()),
            ..OrderSpec::default()
        });
        assert_eq!(matches_trigger_subset(&query), Err(ValidationError::OrdersNotAllowed));
    }

    #[test]
    fn first_violation_wins() {
        // Every rule is broken; only the calculation count is reported.
        let mut query = QuerySpec::default();
        query.limit = Some(10);
        query.orders.push(OrderSpec {
            order: Some(SortOrder::Ascending),
            ..OrderSpec::default()
        });
        assert_eq!(
            matches_trigger_subset(&query),
            Err(ValidationError::ExactlyOneCalculation)
        );

        // Heatmap is reported ahead of limit and orders.
        query.calculations.push(CalculationSpec::of(CalculationOp::Heatmap, "d"));
        assert_eq!(matches_trigger_subset(&query), Err(ValidationError::HeatmapCalculation));

        // Limit is reported ahead of orders.
        query.calculations[0] = CalculationSpec::count();
        assert_eq!(matches_trigger_subset(&query), Err(ValidationError::LimitNotAllowed));
    }
}
