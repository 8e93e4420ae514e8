use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RecordId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Converted,
    /// Anything the backend sends that this client does not know.
    #[serde(other)]
    Unknown,
}

impl LeadStatus {
    /// Statuses a lead can be set to.
    pub const ALL: [LeadStatus; 4] = [
        LeadStatus::New,
        LeadStatus::Contacted,
        LeadStatus::Qualified,
        LeadStatus::Converted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Qualified => "qualified",
            LeadStatus::Converted => "converted",
            LeadStatus::Unknown => "unknown",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LeadStatus::New => "New",
            LeadStatus::Contacted => "Contacted",
            LeadStatus::Qualified => "Qualified",
            LeadStatus::Converted => "Converted",
            LeadStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LeadStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown lead status '{}'", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub property_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<LeadStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Lead {
    /// A lead the backend has not classified yet counts as new.
    pub fn effective_status(&self) -> LeadStatus {
        self.status.unwrap_or(LeadStatus::New)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLead {
    pub name: String,
    pub email: String,
    pub message: String,
    pub property_ref: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<LeadStatus>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(LeadStatus),
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            Ok(StatusFilter::All)
        } else {
            s.parse().map(StatusFilter::Only)
        }
    }
}

/// Free-text search plus status filter for the lead table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadFilter {
    pub search: String,
    pub status: StatusFilter,
}

impl LeadFilter {
    /// Case-insensitive substring match on name, email or property reference.
    pub fn matches(&self, lead: &Lead) -> bool {
        let needle = self.search.to_lowercase();
        let matches_search = [&lead.name, &lead.email, &lead.property_ref]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle));

        let matches_status = match self.status {
            StatusFilter::All => true,
            StatusFilter::Only(status) => lead.status == Some(status),
        };

        matches_search && matches_status
    }

    pub fn apply<'a>(&self, leads: &'a [Lead]) -> Vec<&'a Lead> {
        leads.iter().filter(|lead| self.matches(lead)).collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LeadStatusCounts {
    pub new: usize,
    pub contacted: usize,
    pub qualified: usize,
    pub converted: usize,
    pub unknown: usize,
}

impl LeadStatusCounts {
    pub fn tally(leads: &[Lead]) -> Self {
        leads.iter().fold(Self::default(), |mut counts, lead| {
            match lead.effective_status() {
                LeadStatus::New => counts.new += 1,
                LeadStatus::Contacted => counts.contacted += 1,
                LeadStatus::Qualified => counts.qualified += 1,
                LeadStatus::Converted => counts.converted += 1,
                LeadStatus::Unknown => counts.unknown += 1,
            }
            counts
        })
    }

    pub fn get(&self, status: LeadStatus) -> usize {
        match status {
            LeadStatus::New => self.new,
            LeadStatus::Contacted => self.contacted,
            LeadStatus::Qualified => self.qualified,
            LeadStatus::Converted => self.converted,
            LeadStatus::Unknown => self.unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead(name: &str, email: &str, property_ref: &str, status: Option<LeadStatus>) -> Lead {
        Lead {
            id: None,
            name: name.to_string(),
            email: email.to_string(),
            message: String::new(),
            property_ref: property_ref.to_string(),
            status,
            created_at: None,
        }
    }

    fn sample() -> Vec<Lead> {
        vec![
            lead("Ana Silva", "ana@example.com", "LOFT-1", None),
            lead("Ben Okoro", "ben@example.com", "VILLA-2", Some(LeadStatus::Qualified)),
            lead("Cara Ng", "cara@homes.io", "loft-3", Some(LeadStatus::Converted)),
        ]
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let leads = sample();
        let filter = LeadFilter {
            search: "LoFt".to_string(),
            status: StatusFilter::All,
        };
        let names: Vec<_> = filter.apply(&leads).iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Ana Silva", "Cara Ng"]);
    }

    #[test]
    fn test_search_matches_email() {
        let leads = sample();
        let filter = LeadFilter {
            search: "homes.io".to_string(),
            ..Default::default()
        };
        assert_eq!(filter.apply(&leads).len(), 1);
    }

    #[test]
    fn test_status_filter() {
        let leads = sample();
        let filter = LeadFilter {
            search: String::new(),
            status: "qualified".parse().unwrap(),
        };
        let matched = filter.apply(&leads);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].name, "Ben Okoro");

        // unclassified leads are not matched by an explicit "new" filter
        let filter = LeadFilter {
            search: String::new(),
            status: StatusFilter::Only(LeadStatus::New),
        };
        assert!(filter.apply(&leads).is_empty());
    }

    #[test]
    fn test_status_filter_parse() {
        assert_eq!("all".parse::<StatusFilter>(), Ok(StatusFilter::All));
        assert!("archived".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn test_status_counts_treat_missing_as_new() {
        let counts = LeadStatusCounts::tally(&sample());
        assert_eq!(counts.new, 1);
        assert_eq!(counts.qualified, 1);
        assert_eq!(counts.converted, 1);
        assert_eq!(counts.get(LeadStatus::Contacted), 0);
    }

    #[test]
    fn test_unrecognised_status_keeps_the_lead() {
        let leads: Vec<Lead> = serde_json::from_str(
            r#"[{"name":"Ana","email":"ana@example.com","status":"new"},
                {"name":"Ben","email":"ben@example.com","status":"lost"}]"#,
        )
        .unwrap();

        assert_eq!(leads.len(), 2);
        assert_eq!(leads[1].status, Some(LeadStatus::Unknown));
        assert_eq!(leads[1].effective_status().label(), "Unknown");

        let counts = LeadStatusCounts::tally(&leads);
        assert_eq!(counts.new, 1);
        assert_eq!(counts.unknown, 1);
        assert!("unknown".parse::<LeadStatus>().is_err());
    }
}
