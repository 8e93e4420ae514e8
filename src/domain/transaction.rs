//! Sale/rental transactions between a client and an agent.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RecordId;
use crate::auth::Identity;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Complete,
    #[default]
    Pending,
    Closed,
    #[serde(other)]
    Unknown,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Complete => "complete",
            TransactionStatus::Pending => "pending",
            TransactionStatus::Closed => "closed",
            TransactionStatus::Unknown => "unknown",
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "complete" => Ok(TransactionStatus::Complete),
            "pending" => Ok(TransactionStatus::Pending),
            "closed" => Ok(TransactionStatus::Closed),
            other => Err(format!("unknown transaction status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub client: String,
    pub agent: String,
    pub property_ref: String,
    pub price: f64,
    pub status: TransactionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub client: String,
    pub agent: String,
    pub property_ref: String,
    pub price: f64,
    pub status: TransactionStatus,
}

impl NewTransaction {
    /// Form defaults: the signed-in visitor is the client, status pending.
    pub fn for_client(identity: Option<&Identity>) -> Self {
        Self {
            client: identity.map(|i| i.user_id.clone()).unwrap_or_default(),
            agent: String::new(),
            property_ref: String::new(),
            price: 0.0,
            status: TransactionStatus::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TransactionStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    #[test]
    fn test_form_defaults_from_identity() {
        let identity = Identity {
            first_name: "Ada".into(),
            last_name: "Obi".into(),
            email: "ada@example.com".into(),
            user_id: "user-9".into(),
            role: Some(Role::User),
            exp: None,
        };

        let form = NewTransaction::for_client(Some(&identity));
        assert_eq!(form.client, "user-9");
        assert_eq!(form.status, TransactionStatus::Pending);

        assert_eq!(NewTransaction::for_client(None).client, "");
    }

    #[test]
    fn test_transaction_wire_format() {
        let tx: Transaction = serde_json::from_str(
            r#"{"_id":"t1","client":"u1","agent":"a1","propertyRef":"p1","price":1200.5,"status":"closed","createdAt":"2025-03-04T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(tx.status, TransactionStatus::Closed);
        assert_eq!(tx.property_ref, "p1");
        assert!(tx.created_at.is_some());
        assert!(tx.updated_at.is_none());
    }

    #[test]
    fn test_unrecognised_status_keeps_the_transaction() {
        let tx: Transaction = serde_json::from_str(
            r#"{"client":"u1","agent":"a1","propertyRef":"p1","price":10,"status":"refunded"}"#,
        )
        .unwrap();
        assert_eq!(tx.status, TransactionStatus::Unknown);
        assert_eq!(tx.status.as_str(), "unknown");
        assert!("unknown".parse::<TransactionStatus>().is_err());
    }
}
