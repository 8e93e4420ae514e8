//! Administrator dashboard figures.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::Serialize;

use crate::api::{ApiError, CrmClient};
use crate::domain::{Agent, Lead, LeadStatus, LeadStatusCounts, Property, Transaction};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EntityCounts {
    pub properties: usize,
    pub leads: usize,
    pub agents: usize,
    pub transactions: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSlice {
    pub name: String,
    pub value: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyCount {
    /// e.g. "Mar 2025"
    pub month: String,
    pub transactions: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub counts: EntityCounts,
    pub lead_statuses: Vec<StatusSlice>,
    pub transaction_trend: Vec<MonthlyCount>,
}

impl DashboardStats {
    /// `now` dates transactions that carry no `createdAt`.
    pub fn summarize(
        properties: &[Property],
        leads: &[Lead],
        agents: &[Agent],
        transactions: &[Transaction],
        now: DateTime<Utc>,
    ) -> Self {
        let counts = EntityCounts {
            properties: properties.len(),
            leads: leads.len(),
            agents: agents.len(),
            transactions: transactions.len(),
        };

        let tally = LeadStatusCounts::tally(leads);
        let lead_statuses = LeadStatus::ALL
            .into_iter()
            .chain([LeadStatus::Unknown])
            .map(|status| StatusSlice {
                name: status.label().to_string(),
                value: tally.get(status),
            })
            .filter(|slice| slice.value > 0)
            .collect();

        let mut months: BTreeMap<(i32, u32), usize> = BTreeMap::new();
        for transaction in transactions {
            let created = transaction.created_at.unwrap_or(now);
            *months.entry((created.year(), created.month())).or_default() += 1;
        }
        let transaction_trend = months
            .into_iter()
            .map(|((year, month), count)| MonthlyCount {
                month: month_label(year, month),
                transactions: count,
            })
            .collect();

        Self {
            counts,
            lead_statuses,
            transaction_trend,
        }
    }
}

fn month_label(year: i32, month: u32) -> String {
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .map(|date| date.format("%b %Y").to_string())
        .unwrap_or_else(|| format!("{:02} {}", month, year))
}

pub struct DashboardService<'a> {
    client: &'a CrmClient,
}

impl<'a> DashboardService<'a> {
    pub fn new(client: &'a CrmClient) -> Self {
        Self { client }
    }

    /// Fetch all four listings concurrently. A failed listing counts as empty.
    pub async fn load(&self) -> DashboardStats {
        let properties = self.client.properties();
        let leads = self.client.leads();
        let agents = self.client.agents();
        let transactions = self.client.transactions();

        let (properties, leads, agents, transactions) = tokio::join!(
            properties.list(),
            leads.list(),
            agents.list(),
            transactions.list(),
        );

        DashboardStats::summarize(
            &or_empty("properties", properties),
            &or_empty("leads", leads),
            &or_empty("agents", agents),
            &or_empty("transactions", transactions),
            Utc::now(),
        )
    }
}

fn or_empty<T>(what: &str, result: Result<Vec<T>, ApiError>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        tracing::warn!("Failed to fetch {} for dashboard: {}", what, e);
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TransactionStatus;

    fn transaction(created_at: Option<&str>) -> Transaction {
        Transaction {
            id: None,
            client: "u1".into(),
            agent: "a1".into(),
            property_ref: "p1".into(),
            price: 100.0,
            status: TransactionStatus::Pending,
            created_at: created_at.map(|s| s.parse().unwrap()),
            updated_at: None,
        }
    }

    fn lead(status: Option<LeadStatus>) -> Lead {
        Lead {
            id: None,
            name: "N".into(),
            email: "n@example.com".into(),
            message: String::new(),
            property_ref: String::new(),
            status,
            created_at: None,
        }
    }

    #[test]
    fn test_trend_is_chronological() {
        let now: DateTime<Utc> = "2025-06-15T00:00:00Z".parse().unwrap();
        let transactions = vec![
            transaction(Some("2025-02-10T00:00:00Z")),
            transaction(Some("2024-12-01T00:00:00Z")),
            transaction(Some("2025-02-20T00:00:00Z")),
            transaction(None),
        ];

        let stats = DashboardStats::summarize(&[], &[], &[], &transactions, now);

        let trend: Vec<(&str, usize)> = stats
            .transaction_trend
            .iter()
            .map(|m| (m.month.as_str(), m.transactions))
            .collect();
        assert_eq!(
            trend,
            vec![("Dec 2024", 1), ("Feb 2025", 2), ("Jun 2025", 1)]
        );
        assert_eq!(stats.counts.transactions, 4);
    }

    #[test]
    fn test_lead_status_breakdown() {
        let leads = vec![
            lead(None),
            lead(Some(LeadStatus::New)),
            lead(Some(LeadStatus::Converted)),
            lead(Some(LeadStatus::Unknown)),
        ];

        let stats = DashboardStats::summarize(&[], &leads, &[], &[], Utc::now());

        assert_eq!(
            stats.lead_statuses,
            vec![
                StatusSlice {
                    name: "New".into(),
                    value: 2
                },
                StatusSlice {
                    name: "Converted".into(),
                    value: 1
                },
                StatusSlice {
                    name: "Unknown".into(),
                    value: 1
                },
            ]
        );
        assert_eq!(stats.counts.leads, 4);
    }

    #[test]
    fn test_empty_dashboard() {
        let stats = DashboardStats::summarize(&[], &[], &[], &[], Utc::now());
        assert_eq!(stats, DashboardStats::default());
    }
}
