//! Declarative reconciliation of triggers.
//!
//! A [`Reconciler`] drives a [`TriggerClient`] the way an
//! infrastructure-as-code tool drives a resource: the caller keeps a
//! [`ResourceState`] per managed trigger, plans against it, applies the
//! plan, refreshes it to detect drift, and destroys it when the trigger is
//! no longer wanted.
//!
//! ```text
//! desired + state ──plan──▶ Create | Update | Replace | Noop ──apply──▶ state'
//! state ──refresh──▶ Present { state', drifted } | Gone
//! ```
//!
//! Triggers are validated against the trigger subset before any create or
//! update is sent, so a bad definition fails without a round trip.

mod address;
mod plan;

pub use address::{ParseAddressError, ResourceAddress};
pub use plan::{changed_fields, plan, Action, Plan};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::TriggerClient;
use crate::error::{ClientError, Result, TransportError};
use crate::query::matches_trigger_subset;
use crate::transport::Transport;
use crate::trigger::Trigger;

/// What is recorded about a managed trigger between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    /// Where the trigger lives.
    pub address: ResourceAddress,

    /// The server's copy as of the last apply, refresh or import.
    pub applied: Trigger,

    /// When `applied` was last read from or written to the server.
    pub applied_at: DateTime<Utc>,
}

impl ResourceState {
    /// Records `applied` at `address`, stamped with the current time.
    #[must_use]
    pub fn new(address: ResourceAddress, applied: Trigger) -> Self {
        Self {
            address,
            applied,
            applied_at: Utc::now(),
        }
    }
}

/// Result of [`Reconciler::refresh`].
#[derive(Debug, Clone, PartialEq)]
pub enum Refresh {
    /// The trigger still exists.
    Present {
        /// State carrying the server's current copy.
        state: ResourceState,
        /// True if the server's copy differs from the recorded one.
        drifted: bool,
    },

    /// The trigger was deleted out of band; the state should be dropped
    /// and the trigger created again.
    Gone,
}

/// Result of [`Reconciler::apply`].
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// What was done.
    pub action: Action,

    /// Fields sent in an update. Empty for other actions.
    pub changes: Vec<&'static str>,

    /// State to record for the next run.
    pub state: ResourceState,
}

/// Reconciles desired triggers against the server.
#[derive(Debug, Clone)]
pub struct Reconciler<T> {
    client: TriggerClient<T>,
}

impl<T: Transport> Reconciler<T> {
    /// Creates a driver that sends requests through `client`.
    #[must_use]
    pub fn new(client: TriggerClient<T>) -> Self {
        Self { client }
    }

    /// Returns the client requests are sent through.
    pub fn client(&self) -> &TriggerClient<T> {
        &self.client
    }

    /// Plans `desired` in `dataset` against `state`. No request is sent.
    #[must_use]
    pub fn plan(&self, dataset: &str, desired: &Trigger, state: Option<&ResourceState>) -> Plan {
        plan(dataset, desired, state)
    }

    /// Brings the server in line with `desired` and returns the state to record.
    ///
    /// A no-op sends nothing. `state` is taken as current; call
    /// [`Reconciler::refresh`] first, or use [`Reconciler::reconcile`], to
    /// account for changes made outside this driver.
    pub fn apply(
        &self,
        dataset: &str,
        desired: &Trigger,
        state: Option<&ResourceState>,
    ) -> Result<Outcome> {
        let Plan {
            action,
            changes,
            desired,
        } = plan(dataset, desired, state);

        let state = match (action, state) {
            (Action::Noop, Some(state)) => {
                tracing::debug!(address = %state.address, "trigger up to date");
                state.clone()
            }
            (Action::Update, Some(state)) => {
                matches_trigger_subset(&desired.query)?;
                let updated = self.client.update(dataset, &desired)?;
                tracing::info!(address = %state.address, ?changes, "trigger updated");
                ResourceState::new(state.address.clone(), updated)
            }
            (Action::Replace, Some(state)) => {
                matches_trigger_subset(&desired.query)?;
                self.destroy(state)?;
                let created = self.create(dataset, &desired)?;
                tracing::info!(from = %state.address, to = %created.address, "trigger replaced");
                created
            }
            _ => {
                matches_trigger_subset(&desired.query)?;
                let created = self.create(dataset, &desired)?;
                tracing::info!(address = %created.address, "trigger created");
                created
            }
        };

        Ok(Outcome {
            action,
            changes,
            state,
        })
    }

    fn create(&self, dataset: &str, desired: &Trigger) -> Result<ResourceState> {
        let created = self.client.create(dataset, desired)?;
        let Some(id) = created.id.clone() else {
            return Err(TransportError::DeserializationFailed {
                message: "created trigger carries no ID".to_string(),
            }
            .into());
        };

        let identified = desired.with_identities_from(&created);
        if identified != created {
            tracing::warn!(
                %dataset,
                %id,
                changes = ?changed_fields(&identified, &created),
                "server normalized the trigger definition"
            );
        }
        Ok(ResourceState::new(ResourceAddress::new(dataset, id), created))
    }

    /// Re-reads the trigger recorded in `state`.
    pub fn refresh(&self, state: ResourceState) -> Result<Refresh> {
        let address = &state.address;
        match self.client.get(&address.dataset, &address.id) {
            Ok(remote) => {
                let drifted = remote != state.applied;
                if drifted {
                    tracing::warn!(
                        %address,
                        changes = ?changed_fields(&remote, &state.applied),
                        "trigger changed outside reconciliation"
                    );
                }
                Ok(Refresh::Present {
                    state: ResourceState::new(state.address, remote),
                    drifted,
                })
            }
            Err(ClientError::NotFound) => {
                tracing::warn!(%address, "trigger deleted outside reconciliation");
                Ok(Refresh::Gone)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Refreshes `state`, then applies `desired`. A trigger deleted out of
    /// band is created again and reported as [`Action::Recreate`].
    pub fn reconcile(
        &self,
        dataset: &str,
        desired: &Trigger,
        state: Option<ResourceState>,
    ) -> Result<Outcome> {
        let (current, gone) = match state {
            None => (None, false),
            Some(state) => match self.refresh(state)? {
                Refresh::Present { state, .. } => (Some(state), false),
                Refresh::Gone => (None, true),
            },
        };

        let mut outcome = self.apply(dataset, desired, current.as_ref())?;
        if gone && outcome.action == Action::Create {
            outcome.action = Action::Recreate;
        }
        Ok(outcome)
    }

    /// Deletes the trigger recorded in `state`. A trigger that is already
    /// gone counts as deleted.
    pub fn destroy(&self, state: &ResourceState) -> Result<()> {
        let address = &state.address;
        match self.client.delete(&address.dataset, &address.id) {
            Ok(()) => {
                tracing::info!(%address, "trigger deleted");
                Ok(())
            }
            Err(ClientError::NotFound) => {
                tracing::debug!(%address, "trigger already absent");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Adopts an existing trigger into management.
    pub fn import(&self, address: &ResourceAddress) -> Result<ResourceState> {
        let applied = self.client.get(&address.dataset, &address.id)?;
        tracing::info!(%address, "trigger imported");
        Ok(ResourceState::new(address.clone(), applied))
    }
}
