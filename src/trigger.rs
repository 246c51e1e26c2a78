//! Trigger entity model.
//!
//! A [`Trigger`] is the aggregate root: it owns its query, threshold and
//! recipients by value. Equality is field-for-field, including the ordered
//! recipient list, and is what the reconciliation driver diffs on.
//!
//! Identity is assigned by the server. A trigger is built without an ID,
//! and the IDs returned by create are copied back with
//! [`Trigger::with_identities_from`], which returns a new value instead of
//! mutating shared state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::query::QuerySpec;

/// Server-assigned trigger identifier.
///
/// # Examples
///
/// ```
/// use honeycomb_triggers::TriggerId;
///
/// let id = TriggerId::from("fS4WfA82ACt");
/// assert_eq!(id.as_str(), "fS4WfA82ACt");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TriggerId(String);

impl TriggerId {
    /// Wraps an identifier issued by the server.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TriggerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TriggerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TriggerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Server-assigned recipient identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipientId(String);

impl RecipientId {
    /// Wraps an identifier issued by the server.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecipientId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Comparison applied between the query result and the threshold value.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThresholdOp {
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterThanOrEqual,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessThanOrEqual,
}

/// Threshold condition of a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriggerThreshold {
    /// How the query result is compared.
    pub op: ThresholdOp,
    /// Value the result is compared against.
    pub value: f64,
}

impl TriggerThreshold {
    /// The condition `result <op> value`.
    #[must_use]
    pub const fn new(op: ThresholdOp, value: f64) -> Self {
        Self { op, value }
    }
}

/// Kinds of notification target.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientType {
    Email,
    Marker,
    #[serde(rename = "pagerduty")]
    PagerDuty,
    Slack,
    Webhook,
}

impl fmt::Display for RecipientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email => write!(f, "email"),
            Self::Marker => write!(f, "marker"),
            Self::PagerDuty => write!(f, "pagerduty"),
            Self::Slack => write!(f, "slack"),
            Self::Webhook => write!(f, "webhook"),
        }
    }
}

/// A notification target attached to a trigger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriggerRecipient {
    /// Present once the server has assigned one, or when referencing an
    /// existing recipient.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecipientId>,
    /// Notification channel.
    #[serde(rename = "type")]
    pub kind: RecipientType,
    /// Address, channel, service key or marker text, depending on `kind`.
    pub target: String,
}

impl TriggerRecipient {
    /// An inline recipient; the server assigns its ID on create.
    #[must_use]
    pub fn new(kind: RecipientType, target: impl Into<String>) -> Self {
        Self {
            id: None,
            kind,
            target: target.into(),
        }
    }

    /// An email recipient.
    #[must_use]
    pub fn email(address: impl Into<String>) -> Self {
        Self::new(RecipientType::Email, address)
    }

    /// A marker recipient; `text` labels the marker.
    #[must_use]
    pub fn marker(text: impl Into<String>) -> Self {
        Self::new(RecipientType::Marker, text)
    }

    /// A Slack channel recipient.
    #[must_use]
    pub fn slack(channel: impl Into<String>) -> Self {
        Self::new(RecipientType::Slack, channel)
    }

    /// Returns true if both describe the same notification target,
    /// regardless of identity.
    #[must_use]
    pub fn same_target(&self, other: &Self) -> bool {
        self.kind == other.kind && self.target == other.target
    }
}

/// An alerting rule evaluated on a schedule against a dataset.
///
/// # Examples
///
/// ```
/// use honeycomb_triggers::query::{CalculationSpec, QuerySpec};
/// use honeycomb_triggers::{ThresholdOp, Trigger, TriggerRecipient, TriggerThreshold};
///
/// let trigger = Trigger::new(
///     "Too many requests",
///     QuerySpec::single(CalculationSpec::count()),
///     TriggerThreshold::new(ThresholdOp::GreaterThan, 100.0),
/// )
/// .with_recipient(TriggerRecipient::email("hello@example.com"));
///
/// assert!(trigger.id.is_none());
/// assert_eq!(trigger.frequency, Trigger::DEFAULT_FREQUENCY);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    /// Assigned by the server on create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TriggerId>,

    /// Display name; must not be blank.
    pub name: String,

    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// A disabled trigger is kept but not evaluated.
    #[serde(default)]
    pub disabled: bool,

    /// Query evaluated on each run; must satisfy the trigger subset.
    pub query: QuerySpec,

    /// Evaluation interval in seconds.
    #[serde(default = "default_frequency")]
    pub frequency: u32,

    /// Condition that fires the trigger.
    pub threshold: TriggerThreshold,

    /// Notified when the trigger fires, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recipients: Vec<TriggerRecipient>,
}

fn default_frequency() -> u32 {
    Trigger::DEFAULT_FREQUENCY
}

impl Trigger {
    /// Evaluation interval the platform applies when none is given.
    pub const DEFAULT_FREQUENCY: u32 = 900;

    /// Creates an enabled trigger without identity or recipients.
    #[must_use]
    pub fn new(name: impl Into<String>, query: QuerySpec, threshold: TriggerThreshold) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            disabled: false,
            query,
            frequency: Self::DEFAULT_FREQUENCY,
            threshold,
            recipients: Vec::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the evaluation interval in seconds.
    #[must_use]
    pub fn with_frequency(mut self, seconds: u32) -> Self {
        self.frequency = seconds;
        self
    }

    /// Enables or disables evaluation.
    #[must_use]
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Appends a recipient.
    #[must_use]
    pub fn with_recipient(mut self, recipient: TriggerRecipient) -> Self {
        self.recipients.push(recipient);
        self
    }

    /// Returns true if the server has assigned this trigger an ID.
    #[must_use]
    pub fn is_identified(&self) -> bool {
        self.id.is_some() && self.recipients.iter().all(|r| r.id.is_some())
    }

    /// Returns a copy carrying the identities of `created`.
    ///
    /// The trigger ID is taken from `created`, and recipient IDs are copied
    /// by position from the server's response, which preserves the order of
    /// the submitted recipients. IDs already present are kept.
    #[must_use]
    pub fn with_identities_from(&self, created: &Self) -> Self {
        let mut out = self.clone();
        out.id = created.id.clone().or_else(|| self.id.clone());
        for (recipient, assigned) in out.recipients.iter_mut().zip(&created.recipients) {
            if recipient.id.is_none() {
                recipient.id = assigned.id.clone();
            }
        }
        out
    }

    /// Returns a copy carrying the identities recorded in `applied`.
    ///
    /// Unlike [`Trigger::with_identities_from`], recipients only adopt an ID
    /// from a recorded recipient with the same type and target, first at the
    /// same position, then anywhere among the recorded recipients not yet
    /// claimed. A declared recipient that matches nothing stays without ID.
    #[must_use]
    pub fn with_known_identities(&self, applied: &Self) -> Self {
        let mut out = self.clone();
        if out.id.is_none() {
            out.id = applied.id.clone();
        }

        // Explicit references claim first, then positional matches.
        let mut claimed: Vec<bool> = applied
            .recipients
            .iter()
            .map(|a| a.id.is_some() && out.recipients.iter().any(|r| r.id.is_some() && r.id == a.id))
            .collect();
        for (i, recipient) in out.recipients.iter_mut().enumerate() {
            if recipient.id.is_some() {
                continue;
            }
            if let Some(a) = applied.recipients.get(i) {
                if !claimed[i] && a.id.is_some() && a.same_target(recipient) {
                    claimed[i] = true;
                    recipient.id = a.id.clone();
                }
            }
        }

        for recipient in out.recipients.iter_mut().filter(|r| r.id.is_none()) {
            let found = applied
                .recipients
                .iter()
                .enumerate()
                .find(|(j, a)| !claimed[*j] && a.id.is_some() && a.same_target(recipient));
            if let Some((j, a)) = found {
                claimed[j] = true;
                recipient.id = a.id.clone();
            }
        }
        out
    }
}
