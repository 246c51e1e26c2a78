//! In-memory emulation of the trigger API.
//!
//! This module provides a thread-safe [`Transport`] that answers requests the
//! way the remote API does: it assigns identifiers, enforces the trigger
//! subset with the server's own wording, deduplicates recipients per dataset
//! and returns 404 for unknown datasets and triggers. It is intended for
//! tests and embedded usage, and as a reference for transport authors.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use uuid::Uuid;

use crate::error::{TransportError, ValidationError};
use crate::query::matches_trigger_subset;
use crate::transport::{decode_segment, Method, Request, Response, Status, Transport};
use crate::trigger::{RecipientId, Trigger, TriggerId, TriggerRecipient};

fn lock_err(context: &'static str) -> TransportError {
    TransportError::ConnectionFailed {
        message: format!("poisoned lock: {context}"),
    }
}

fn new_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(11);
    id
}

/// Server wording for the trigger-subset rules.
fn rejection_message(err: &ValidationError) -> &'static str {
    match err {
        ValidationError::ExactlyOneCalculation => "trigger query requires exactly one calculation",
        ValidationError::HeatmapCalculation => "trigger query may not contain a HEATMAP calculation",
        ValidationError::LimitNotAllowed => "trigger query may not specify a limit",
        ValidationError::OrdersNotAllowed => "trigger query may not specify orders",
    }
}

/// A request as seen by the emulated server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// HTTP verb.
    pub method: Method,
    /// Path as sent, still percent-encoded.
    pub path: String,
}

#[derive(Debug, Default)]
struct DatasetState {
    triggers: BTreeMap<TriggerId, Trigger>,
    recipients: Vec<TriggerRecipient>,
}

impl DatasetState {
    /// Resolves submitted recipients against the dataset's registry.
    ///
    /// References by ID must exist and agree with the registered type and
    /// target; inline recipients reuse the ID of a
    /// registered recipient with the same type and target, or get a new one.
    fn resolve_recipients(
        &mut self,
        submitted: Vec<TriggerRecipient>,
    ) -> Result<Vec<TriggerRecipient>, Response> {
        let mut out = Vec::with_capacity(submitted.len());
        for recipient in submitted {
            if let Some(id) = &recipient.id {
                let known = self
                    .recipients
                    .iter()
                    .find(|r| r.id.as_ref() == Some(id))
                    .ok_or_else(|| {
                        Response::error(
                            Status::UNPROCESSABLE_ENTITY,
                            format!("unknown recipient ID {id}"),
                        )
                    })?;
                if !known.same_target(&recipient) {
                    return Err(Response::error(
                        Status::UNPROCESSABLE_ENTITY,
                        format!("recipient ID {id} does not match the given type and target"),
                    ));
                }
                out.push(known.clone());
                continue;
            }
            if let Some(known) = self.recipients.iter().find(|r| r.same_target(&recipient)) {
                out.push(known.clone());
                continue;
            }
            let registered = TriggerRecipient {
                id: Some(RecipientId::new(new_id())),
                ..recipient
            };
            self.recipients.push(registered.clone());
            out.push(registered);
        }
        Ok(out)
    }
}

#[derive(Debug, Default)]
struct ServerState {
    datasets: HashMap<String, DatasetState>,
    requests: Vec<RecordedRequest>,
    pending_failure: Option<TransportError>,
}

/// Thread-safe in-memory trigger API.
///
/// Datasets must be registered with [`InMemoryTransport::with_dataset`] or
/// [`InMemoryTransport::add_dataset`]; requests against any other dataset
/// return 404.
#[derive(Debug, Default)]
pub struct InMemoryTransport {
    state: RwLock<ServerState>,
}

impl InMemoryTransport {
    /// Create a new server with no datasets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`InMemoryTransport::add_dataset`].
    #[must_use]
    pub fn with_dataset(self, dataset: impl Into<String>) -> Self {
        // A fresh lock cannot be poisoned.
        if let Ok(mut state) = self.state.write() {
            state.datasets.entry(dataset.into()).or_default();
        }
        self
    }

    /// Registers a dataset. Registering an existing dataset is a no-op.
    pub fn add_dataset(&self, dataset: impl Into<String>) -> Result<(), TransportError> {
        let mut state = self.state.write().map_err(|_| lock_err("add_dataset"))?;
        state.datasets.entry(dataset.into()).or_default();
        Ok(())
    }

    /// Makes the next [`Transport::send`] fail with `err` before reaching the server.
    pub fn fail_next(&self, err: TransportError) -> Result<(), TransportError> {
        let mut state = self.state.write().map_err(|_| lock_err("fail_next"))?;
        state.pending_failure = Some(err);
        Ok(())
    }

    /// Returns every request received so far, in order.
    pub fn requests(&self) -> Result<Vec<RecordedRequest>, TransportError> {
        let state = self.state.read().map_err(|_| lock_err("requests"))?;
        Ok(state.requests.clone())
    }

    /// Returns the number of triggers stored for `dataset`.
    pub fn trigger_count(&self, dataset: &str) -> Result<usize, TransportError> {
        let state = self.state.read().map_err(|_| lock_err("trigger_count"))?;
        Ok(state.datasets.get(dataset).map_or(0, |d| d.triggers.len()))
    }

    fn handle(state: &mut ServerState, request: Request) -> Result<Response, TransportError> {
        let segments: Vec<&str> = request.path.trim_matches('/').split('/').collect();
        let (raw_dataset, raw_id) = match segments.as_slice() {
            ["1", "triggers", dataset] => (*dataset, None),
            ["1", "triggers", dataset, id] => (*dataset, Some(*id)),
            _ => return Ok(Response::error(Status::NOT_FOUND, "not found")),
        };

        let Some(dataset) = decode_segment(raw_dataset) else {
            return Ok(Response::error(Status::BAD_REQUEST, "invalid path encoding"));
        };
        let id = match raw_id.map(decode_segment) {
            None => None,
            Some(Some(id)) => Some(TriggerId::from(id)),
            Some(None) => {
                return Ok(Response::error(Status::BAD_REQUEST, "invalid path encoding"));
            }
        };

        let Some(ds) = state.datasets.get_mut(&dataset) else {
            return Ok(Response::error(Status::NOT_FOUND, "Dataset not found"));
        };

        match (request.method, id) {
            (Method::Get, None) => {
                let triggers: Vec<&Trigger> = ds.triggers.values().collect();
                Ok(Response::new(Status::OK, Some(encode(&triggers)?)))
            }
            (Method::Post, None) => {
                let submitted = match decode(request.body) {
                    Ok(t) => t,
                    Err(resp) => return Ok(resp),
                };
                let mut trigger = match admit(ds, submitted) {
                    Ok(t) => t,
                    Err(resp) => return Ok(resp),
                };
                let id = TriggerId::new(new_id());
                trigger.id = Some(id.clone());
                ds.triggers.insert(id, trigger.clone());
                Ok(Response::new(Status::CREATED, Some(encode(&trigger)?)))
            }
            (Method::Get, Some(id)) => match ds.triggers.get(&id) {
                Some(trigger) => Ok(Response::new(Status::OK, Some(encode(trigger)?))),
                None => Ok(Response::error(Status::NOT_FOUND, "Trigger not found")),
            },
            (Method::Put, Some(id)) => {
                if !ds.triggers.contains_key(&id) {
                    return Ok(Response::error(Status::NOT_FOUND, "Trigger not found"));
                }
                let submitted = match decode(request.body) {
                    Ok(t) => t,
                    Err(resp) => return Ok(resp),
                };
                let mut trigger = match admit(ds, submitted) {
                    Ok(t) => t,
                    Err(resp) => return Ok(resp),
                };
                // Replace semantics: the stored trigger is exactly what was sent.
                trigger.id = Some(id.clone());
                ds.triggers.insert(id, trigger.clone());
                Ok(Response::new(Status::OK, Some(encode(&trigger)?)))
            }
            (Method::Delete, Some(id)) => match ds.triggers.remove(&id) {
                Some(_) => Ok(Response::new(Status::NO_CONTENT, None)),
                None => Ok(Response::error(Status::NOT_FOUND, "Trigger not found")),
            },
            _ => Ok(Response::error(Status::METHOD_NOT_ALLOWED, "method not allowed")),
        }
    }
}

fn encode<T: serde::Serialize + ?Sized>(value: &T) -> Result<serde_json::Value, TransportError> {
    serde_json::to_value(value).map_err(|e| TransportError::SerializationFailed {
        message: e.to_string(),
    })
}

fn decode(body: Option<serde_json::Value>) -> Result<Trigger, Response> {
    let Some(body) = body else {
        return Err(Response::error(Status::BAD_REQUEST, "request body is required"));
    };
    serde_json::from_value(body)
        .map_err(|e| Response::error(Status::BAD_REQUEST, format!("invalid trigger: {e}")))
}

/// Server-side checks shared by create and update.
fn admit(ds: &mut DatasetState, mut trigger: Trigger) -> Result<Trigger, Response> {
    if trigger.name.trim().is_empty() {
        return Err(Response::error(
            Status::UNPROCESSABLE_ENTITY,
            "trigger name cannot be blank",
        ));
    }
    if let Err(err) = matches_trigger_subset(&trigger.query) {
        return Err(Response::error(
            Status::UNPROCESSABLE_ENTITY,
            rejection_message(&err),
        ));
    }
    trigger.recipients = ds.resolve_recipients(std::mem::take(&mut trigger.recipients))?;
    Ok(trigger)
}

impl Transport for InMemoryTransport {
    fn send(&self, request: Request) -> Result<Response, TransportError> {
        let mut state = self.state.write().map_err(|_| lock_err("send"))?;
        state.requests.push(RecordedRequest {
            method: request.method,
            path: request.path.clone(),
        });
        if let Some(err) = state.pending_failure.take() {
            return Err(err);
        }
        Self::handle(&mut state, request)
    }
}
