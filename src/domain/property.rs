use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::RecordId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Pending,
    Approved,
    Rejected,
    #[serde(other)]
    Unknown,
}

impl FromStr for ListingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ListingStatus::Pending),
            "approved" => Ok(ListingStatus::Approved),
            "rejected" => Ok(ListingStatus::Rejected),
            other => Err(format!("unknown listing status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub title: String,
    pub price: f64,
    pub city: String,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default, rename = "imageURL")]
    pub image_url: String,
    /// Agent id the listing is assigned to.
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ListingStatus>,
}

impl Property {
    /// True when no agent holds the listing yet.
    pub fn is_unassigned(&self) -> bool {
        self.assigned_to
            .as_deref()
            .map_or(true, |agent| agent.trim().is_empty())
    }
}

/// Properties still available for assignment to a new agent.
pub fn unassigned(properties: &[Property]) -> Vec<&Property> {
    properties.iter().filter(|p| p.is_unassigned()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProperty {
    pub title: String,
    pub price: f64,
    pub city: String,
    pub created_by: String,
    pub desc: String,
    #[serde(rename = "imageURL")]
    pub image_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(rename = "imageURL", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ListingStatus>,
}

impl PropertyUpdate {
    pub fn is_empty(&self) -> bool {
        self == &PropertyUpdate::default()
    }
}
