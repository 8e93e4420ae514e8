//! Typed CRUD endpoints for the CRM records.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use super::client::{take_field, CrmClient};
use super::error::ApiError;
use crate::domain::{Agent, Lead, Property, Transaction};

/// Where a record type lives on the backend and how it is enveloped.
pub trait Resource: DeserializeOwned + Send + Sync + 'static {
    /// Envelope key for a single record, e.g. `property`.
    const SINGULAR: &'static str;
    /// Envelope key for a listing, e.g. `properties`.
    const PLURAL: &'static str;
    const CREATE_PATH: &'static str;
    const LIST_PATH: &'static str;
    const GET_PATH: &'static str;
    const UPDATE_PATH: &'static str;
    const DELETE_PATH: &'static str;

    fn record_id(&self) -> Option<&str>;
}

impl Resource for Property {
    const SINGULAR: &'static str = "property";
    const PLURAL: &'static str = "properties";
    const CREATE_PATH: &'static str = "/create-property";
    const LIST_PATH: &'static str = "/get-property";
    const GET_PATH: &'static str = "/get-single-property";
    const UPDATE_PATH: &'static str = "/edit-property";
    const DELETE_PATH: &'static str = "/delete-property";

    fn record_id(&self) -> Option<&str> {
        Some(&self.id)
    }
}

impl Resource for Agent {
    const SINGULAR: &'static str = "agent";
    const PLURAL: &'static str = "agents";
    const CREATE_PATH: &'static str = "/create-agent";
    const LIST_PATH: &'static str = "/get-agents";
    const GET_PATH: &'static str = "/get-agent";
    const UPDATE_PATH: &'static str = "/update-agent";
    const DELETE_PATH: &'static str = "/delete-agent";

    fn record_id(&self) -> Option<&str> {
        Some(&self.id)
    }
}

impl Resource for Lead {
    const SINGULAR: &'static str = "lead";
    const PLURAL: &'static str = "leads";
    const CREATE_PATH: &'static str = "/create-lead";
    const LIST_PATH: &'static str = "/get-leads";
    const GET_PATH: &'static str = "/get-lead";
    const UPDATE_PATH: &'static str = "/update-lead";
    const DELETE_PATH: &'static str = "/delete-lead";

    fn record_id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl Resource for Transaction {
    const SINGULAR: &'static str = "transaction";
    const PLURAL: &'static str = "transactions";
    const CREATE_PATH: &'static str = "/create-transaction";
    const LIST_PATH: &'static str = "/get-transactions";
    const GET_PATH: &'static str = "/get-transaction";
    const UPDATE_PATH: &'static str = "/update-transaction";
    const DELETE_PATH: &'static str = "/delete-transaction";

    fn record_id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

/// CRUD calls for one record type.
pub struct ResourceApi<'a, R> {
    client: &'a CrmClient,
    _marker: PhantomData<fn() -> R>,
}

impl<'a, R: Resource> ResourceApi<'a, R> {
    pub fn new(client: &'a CrmClient) -> Self {
        Self {
            client,
            _marker: PhantomData,
        }
    }

    /// A listing without the expected key is treated as empty.
    pub async fn list(&self) -> Result<Vec<R>, ApiError> {
        let envelope: Value = self.client.get(R::LIST_PATH).await?;
        if envelope.get(R::PLURAL).map_or(true, Value::is_null) {
            return Ok(Vec::new());
        }
        take_field(envelope, R::PLURAL)
    }

    pub async fn get(&self, id: &str) -> Result<R, ApiError> {
        let envelope: Value = self.client.get(&record_path(R::GET_PATH, id)?).await?;
        take_field(envelope, R::SINGULAR)
    }

    pub async fn create<B: Serialize + Sync>(&self, payload: &B) -> Result<R, ApiError> {
        let envelope: Value = self.client.post(R::CREATE_PATH, payload).await?;
        take_field(envelope, R::SINGULAR)
    }

    pub async fn update<B: Serialize + Sync>(&self, id: &str, changes: &B) -> Result<R, ApiError> {
        let envelope: Value = self
            .client
            .patch(&record_path(R::UPDATE_PATH, id)?, changes)
            .await?;
        take_field(envelope, R::SINGULAR)
    }

    /// Returns the backend's confirmation message.
    pub async fn delete(&self, id: &str) -> Result<String, ApiError> {
        let envelope: Value = self.client.delete(&record_path(R::DELETE_PATH, id)?).await?;
        Ok(envelope
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Deleted")
            .to_string())
    }
}

/// Appends `id` as a single percent-encoded path segment.
fn record_path(prefix: &str, id: &str) -> Result<String, ApiError> {
    let mut scratch = Url::parse("http://records.invalid/")?;
    if let Ok(mut segments) = scratch.path_segments_mut() {
        segments.clear().push(id);
    }
    Ok(format!("{}{}", prefix, scratch.path()))
}

impl CrmClient {
    pub fn properties(&self) -> ResourceApi<'_, Property> {
        ResourceApi::new(self)
    }

    pub fn agents(&self) -> ResourceApi<'_, Agent> {
        ResourceApi::new(self)
    }

    pub fn leads(&self) -> ResourceApi<'_, Lead> {
        ResourceApi::new(self)
    }

    pub fn transactions(&self) -> ResourceApi<'_, Transaction> {
        ResourceApi::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_path_escapes_ids() {
        assert_eq!(record_path("/get-lead", "abc123").unwrap(), "/get-lead/abc123");
        assert_eq!(
            record_path("/get-lead", "a/b c").unwrap(),
            "/get-lead/a%2Fb%20c"
        );
        assert_eq!(
            record_path("/delete-agent", "x+y?z#1").unwrap(),
            "/delete-agent/x+y%3Fz%231"
        );
    }
}
