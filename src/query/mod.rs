//! Query specifications and the trigger-subset rules.

mod serialization;
mod spec;
mod validation;

pub use serialization::{from_json, to_json_pretty};
pub use spec::{
    CalculationOp, CalculationSpec, FilterCombination, FilterOp, FilterSpec, OrderSpec, QuerySpec,
    SortOrder,
};
pub use validation::matches_trigger_subset;
