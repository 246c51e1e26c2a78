//! # honeycomb-triggers
//!
//! Client-side model of Honeycomb triggers: the query subset a trigger may
//! use, a CRUD client scoped by dataset, and a reconciliation driver that
//! keeps declared triggers in line with the server.
//!
//! ## Core Concepts
//!
//! - **Trigger**: a named query with a single calculation, a threshold, an
//!   evaluation frequency and recipients to notify
//! - **Trigger subset**: the restrictions a query must meet to back a
//!   trigger (exactly one non-heatmap calculation, no limit, no orders)
//! - **Transport**: the injected request/response boundary the client
//!   sends everything through
//! - **Reconciler**: plans and applies desired triggers against recorded state
//!
//! ## Usage
//!
//! ```rust
//! use honeycomb_triggers::query::{CalculationOp, CalculationSpec, QuerySpec};
//! use honeycomb_triggers::transport::InMemoryTransport;
//! use honeycomb_triggers::{
//!     Action, Reconciler, ThresholdOp, Trigger, TriggerClient, TriggerRecipient, TriggerThreshold,
//! };
//!
//! let query = QuerySpec::single(CalculationSpec::of(CalculationOp::P99, "duration_ms"));
//! query.validate_trigger_subset()?;
//!
//! let desired = Trigger::new("slow requests", query, TriggerThreshold::new(ThresholdOp::GreaterThan, 100.0))
//!     .with_recipient(TriggerRecipient::email("hello@example.com"));
//!
//! let reconciler = Reconciler::new(TriggerClient::new(InMemoryTransport::new().with_dataset("api")));
//! let created = reconciler.apply("api", &desired, None)?;
//! assert_eq!(created.action, Action::Create);
//!
//! let again = reconciler.apply("api", &desired, Some(&created.state))?;
//! assert_eq!(again.action, Action::Noop);
//! # Ok::<(), honeycomb_triggers::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;
pub mod query;
pub mod reconcile;
pub mod transport;
pub mod trigger;

// Re-export primary types at crate root for convenience
pub use client::TriggerClient;
pub use config::ClientConfig;
pub use error::{
    ClientError, ConfigError, Error, QueryError, Result, TransportError, ValidationError,
};
pub use query::{matches_trigger_subset, QuerySpec};
pub use reconcile::{Action, Outcome, Plan, Reconciler, Refresh, ResourceAddress, ResourceState};
pub use transport::{InMemoryTransport, Transport};
pub use trigger::{
    RecipientId, RecipientType, ThresholdOp, Trigger, TriggerId, TriggerRecipient,
    TriggerThreshold,
};

#[cfg(feature = "http")]
pub use transport::HttpTransport;
