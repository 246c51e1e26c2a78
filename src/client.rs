//! CRUD client for dataset-scoped triggers.
//!
//! [`TriggerClient`] turns trigger entities into [`Request`]s, hands them
//! to the injected [`Transport`], and maps responses back. It performs no
//! local validation and no retries: server rejections are surfaced with
//! the server's own status line and message.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ClientError, TransportError};
use crate::transport::{encode_segment, Method, Request, Response, Transport};
use crate::trigger::{RecipientType, Trigger, TriggerId, TriggerRecipient};

/// Client for the trigger API.
///
/// # Examples
///
/// ```
/// use honeycomb_triggers::query::{CalculationSpec, QuerySpec};
/// use honeycomb_triggers::transport::InMemoryTransport;
/// use honeycomb_triggers::{ThresholdOp, Trigger, TriggerClient, TriggerThreshold};
///
/// let client = TriggerClient::new(InMemoryTransport::new().with_dataset("api"));
/// let trigger = Trigger::new(
///     "Too many requests",
///     QuerySpec::single(CalculationSpec::count()),
///     TriggerThreshold::new(ThresholdOp::GreaterThan, 100.0),
/// );
///
/// let created = client.create("api", &trigger).unwrap();
/// let id = created.id.clone().unwrap();
/// assert_eq!(client.get("api", &id).unwrap(), created);
/// ```
#[derive(Debug, Clone)]
pub struct TriggerClient<T> {
    transport: T,
}

fn collection_path(dataset: &str) -> String {
    format!("/1/triggers/{}", encode_segment(dataset))
}

fn item_path(dataset: &str, id: &TriggerId) -> String {
    format!(
        "/1/triggers/{}/{}",
        encode_segment(dataset),
        encode_segment(id.as_str())
    )
}

fn encode<B: Serialize>(body: &B) -> Result<serde_json::Value, ClientError> {
    serde_json::to_value(body).map_err(|e| {
        ClientError::Transport(TransportError::SerializationFailed {
            message: e.to_string(),
        })
    })
}

impl<T: Transport> TriggerClient<T> {
    /// Creates a client that sends every request through `transport`.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Returns the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends a request and interprets the status.
    ///
    /// 404 becomes [`ClientError::NotFound`]; any other non-2xx status becomes
    /// [`ClientError::Rejected`] carrying the status line and server message.
    fn execute(&self, request: Request) -> Result<Response, ClientError> {
        let method = request.method;
        tracing::debug!(%method, path = %request.path, "sending request");

        let response = self.transport.send(request)?;
        let status = &response.status;

        if status.is_success() {
            Ok(response)
        } else if status.code() == 404 {
            Err(ClientError::NotFound)
        } else {
            let message = response.error_message();
            tracing::debug!(%status, %message, "request rejected");
            Err(ClientError::Rejected {
                status: response.status,
                message,
            })
        }
    }

    fn execute_json<R: DeserializeOwned>(&self, request: Request) -> Result<R, ClientError> {
        let response = self.execute(request)?;
        let body = response.body.unwrap_or(serde_json::Value::Null);
        serde_json::from_value(body).map_err(|e| {
            ClientError::Transport(TransportError::DeserializationFailed {
                message: e.to_string(),
            })
        })
    }

    /// Creates `trigger` in `dataset` and returns the server's copy, which
    /// carries the trigger ID and an ID for every recipient.
    #[tracing::instrument(level = "debug", skip(self, trigger), fields(name = %trigger.name), err)]
    pub fn create(&self, dataset: &str, trigger: &Trigger) -> Result<Trigger, ClientError> {
        let request = Request::new(Method::Post, collection_path(dataset)).with_body(encode(trigger)?);
        self.execute_json(request)
    }

    /// Fetches a trigger. Fails with [`ClientError::NotFound`] if it does not exist.
    #[tracing::instrument(level = "debug", skip(self), err)]
    pub fn get(&self, dataset: &str, id: &TriggerId) -> Result<Trigger, ClientError> {
        self.execute_json(Request::new(Method::Get, item_path(dataset, id)))
    }

    /// Lists every trigger of `dataset`, in the server's order.
    #[tracing::instrument(level = "debug", skip(self), err)]
    pub fn list(&self, dataset: &str) -> Result<Vec<Trigger>, ClientError> {
        self.execute_json(Request::new(Method::Get, collection_path(dataset)))
    }

    /// Replaces the trigger identified by `trigger.id` with `trigger`.
    ///
    /// The full definition is sent; fields left empty are cleared on the
    /// server rather than left untouched.
    #[tracing::instrument(level = "debug", skip(self, trigger), fields(id = ?trigger.id), err)]
    pub fn update(&self, dataset: &str, trigger: &Trigger) -> Result<Trigger, ClientError> {
        let id = trigger
            .id
            .as_ref()
            .ok_or(ClientError::MissingId { operation: "update" })?;
        let request = Request::new(Method::Put, item_path(dataset, id)).with_body(encode(trigger)?);
        self.execute_json(request)
    }

    /// Deletes a trigger. Deleting an absent trigger fails with
    /// [`ClientError::NotFound`].
    #[tracing::instrument(level = "debug", skip(self), err)]
    pub fn delete(&self, dataset: &str, id: &TriggerId) -> Result<(), ClientError> {
        self.execute(Request::new(Method::Delete, item_path(dataset, id)))?;
        Ok(())
    }

    /// Lists the distinct recipients attached to any trigger of `dataset`,
    /// in order of first appearance.
    pub fn list_recipients(&self, dataset: &str) -> Result<Vec<TriggerRecipient>, ClientError> {
        let mut recipients: Vec<TriggerRecipient> = Vec::new();
        for trigger in self.list(dataset)? {
            for recipient in trigger.recipients {
                if !recipients.contains(&recipient) {
                    recipients.push(recipient);
                }
            }
        }
        Ok(recipients)
    }

    /// Finds an existing recipient of `dataset` by type and target, so a
    /// trigger can reference it by ID. Fails with [`ClientError::NotFound`]
    /// if no trigger of the dataset uses it.
    pub fn find_recipient(
        &self,
        dataset: &str,
        kind: RecipientType,
        target: &str,
    ) -> Result<TriggerRecipient, ClientError> {
        self.list_recipients(dataset)?
            .into_iter()
            .find(|r| r.kind == kind && r.target == target)
            .ok_or(ClientError::NotFound)
    }
}
