use crate::domain::analytics::AnalyticsSnapshot;
use crate::domain::catalog::{PendingChange, Product};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One complete fetch cycle. Replaced wholesale on the next successful cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub cycle: u64,
    pub fetched_at: DateTime<Utc>,
    pub products: Vec<Product>,
    pub analytics: AnalyticsSnapshot,
    pub pending_changes: Vec<PendingChange>,
}

impl DashboardSnapshot {
    /// Same upstream data, ignoring cycle bookkeeping.
    pub fn same_data(&self, other: &DashboardSnapshot) -> bool {
        self.products == other.products
            && self.analytics == other.analytics
            && self.pending_changes == other.pending_changes
    }
}
