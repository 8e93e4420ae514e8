//! CRM records as the backend serves them.

pub mod agent;
pub mod lead;
pub mod property;
pub mod transaction;

pub use agent::{Agent, AgentUpdate, NewAgent};
pub use lead::{Lead, LeadFilter, LeadStatus, LeadStatusCounts, LeadUpdate, NewLead, StatusFilter};
pub use property::{ListingStatus, NewProperty, Property, PropertyUpdate};
pub use transaction::{NewTransaction, Transaction, TransactionStatus, TransactionUpdate};

/// Backend identifier (a Mongo-style `_id`).
pub type RecordId = String;
