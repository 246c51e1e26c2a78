//! Planning: comparing a desired trigger against recorded state.
//!
//! Planning is pure. It never talks to the server; freshness of the
//! recorded state is the job of [`Reconciler::refresh`](super::Reconciler::refresh).

use std::fmt;

use crate::reconcile::ResourceState;
use crate::trigger::Trigger;

/// What reconciliation will do, or did, to a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// No state is recorded; the trigger is created.
    Create,
    /// The trigger exists and differs; it is replaced in place.
    Update,
    /// The trigger moved to another dataset; the old one is deleted and a
    /// new one created.
    Replace,
    /// The trigger was deleted out of band and is created again.
    Recreate,
    /// Recorded state already matches.
    Noop,
}

impl Action {
    /// Lowercase name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Replace => "replace",
            Self::Recreate => "recreate",
            Self::Noop => "no-op",
        }
    }

    /// Returns true if carrying out the action sends a mutating request.
    #[must_use]
    pub const fn is_change(self) -> bool {
        !matches!(self, Self::Noop)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of planning one trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    /// What apply will do.
    pub action: Action,

    /// Top-level fields that differ from the recorded state. Empty unless
    /// the action is [`Action::Update`].
    pub changes: Vec<&'static str>,

    /// The definition to send: the desired trigger with every identity
    /// already known from the recorded state.
    pub desired: Trigger,
}

/// Names the top-level fields in which `desired` and `applied` differ.
///
/// Recipients compare as an ordered list.
#[must_use]
pub fn changed_fields(desired: &Trigger, applied: &Trigger) -> Vec<&'static str> {
    let mut changes = Vec::new();
    if desired.id != applied.id {
        changes.push("id");
    }
    if desired.name != applied.name {
        changes.push("name");
    }
    if desired.description != applied.description {
        changes.push("description");
    }
    if desired.disabled != applied.disabled {
        changes.push("disabled");
    }
    if desired.query != applied.query {
        changes.push("query");
    }
    if desired.frequency != applied.frequency {
        changes.push("frequency");
    }
    if desired.threshold != applied.threshold {
        changes.push("threshold");
    }
    if desired.recipients != applied.recipients {
        changes.push("recipients");
    }
    changes
}

/// Decides how to bring the trigger recorded in `state` to `desired` in
/// `dataset`.
#[must_use]
pub fn plan(dataset: &str, desired: &Trigger, state: Option<&ResourceState>) -> Plan {
    let Some(state) = state else {
        let mut desired = desired.clone();
        desired.id = None;
        return Plan {
            action: Action::Create,
            changes: Vec::new(),
            desired,
        };
    };

    if state.address.dataset != dataset {
        let mut desired = desired.clone();
        desired.id = None;
        return Plan {
            action: Action::Replace,
            changes: Vec::new(),
            desired,
        };
    }

    let mut merged = desired.with_known_identities(&state.applied);
    merged.id = Some(state.address.id.clone());

    let changes = changed_fields(&merged, &state.applied);
    let action = if changes.is_empty() {
        Action::Noop
    } else {
        Action::Update
    };
    Plan {
        action,
        changes,
        desired: merged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{CalculationOp, CalculationSpec, QuerySpec};
    use crate::reconcile::ResourceAddress;
    use crate::trigger::{RecipientId, ThresholdOp, TriggerId, TriggerRecipient, TriggerThreshold};
    use chrono::Utc;

    fn desired() -> Trigger {
        Trigger::new(
            "p99 latency",
            QuerySpec::single(CalculationSpec::of(CalculationOp::P99, "duration_ms")),
            TriggerThreshold::new(ThresholdOp::GreaterThan, 10_000.0),
        )
        .with_recipient(TriggerRecipient::email("hello@example.com"))
    }

    fn state() -> ResourceState {
        let mut applied = desired();
        applied.id = Some(TriggerId::from("t1"));
        applied.recipients[0].id = Some(RecipientId::from("r1"));
        ResourceState {
            address: ResourceAddress::new("ds", "t1"),
            applied,
            applied_at: Utc::now(),
        }
    }

    #[test]
    fn without_state_creates() {
        let plan = plan("ds", &desired(), None);
        assert_eq!(plan.action, Action::Create);
        assert!(plan.desired.id.is_none());
    }

    #[test]
    fn unchanged_is_noop() {
        let plan = plan("ds", &desired(), Some(&state()));
        assert_eq!(plan.action, Action::Noop);
        assert!(plan.changes.is_empty());
        assert_eq!(plan.desired, state().applied);
    }

    #[test]
    fn changed_fields_are_named() {
        let desired = desired().with_disabled(true).with_frequency(300);
        let plan = plan("ds", &desired, Some(&state()));
        assert_eq!(plan.action, Action::Update);
        assert_eq!(plan.changes, vec!["disabled", "frequency"]);
        assert_eq!(plan.desired.id, Some(TriggerId::from("t1")));
        assert_eq!(plan.desired.recipients[0].id, Some(RecipientId::from("r1")));
    }

    #[test]
    fn reordered_recipients_are_an_update() {
        let mut state = state();
        state.applied.recipients.push(TriggerRecipient {
            id: Some(RecipientId::from("r2")),
            ..TriggerRecipient::slack("#ops")
        });
        let desired = Trigger {
            recipients: vec![
                TriggerRecipient::slack("#ops"),
                TriggerRecipient::email("hello@example.com"),
            ],
            ..desired()
        };

        let plan = plan("ds", &desired, Some(&state));
        assert_eq!(plan.action, Action::Update);
        assert_eq!(plan.changes, vec!["recipients"]);
        // Identities follow the target, not the position.
        assert_eq!(plan.desired.recipients[0].id, Some(RecipientId::from("r2")));
        assert_eq!(plan.desired.recipients[1].id, Some(RecipientId::from("r1")));
    }

    #[test]
    fn dataset_change_replaces() {
        let plan = plan("other", &desired(), Some(&state()));
        assert_eq!(plan.action, Action::Replace);
        assert!(plan.desired.id.is_none());
    }
}
