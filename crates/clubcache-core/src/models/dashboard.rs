use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate counters shown on the club dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub category_id: Option<i64>,
    pub total_players: u64,
    pub active_players: u64,
    pub total_staff: u64,
    pub total_categories: u64,
    pub upcoming_events: u64,
    pub open_injuries: u64,
    pub sessions_last_30_days: u64,
    /// Average attendance over the same 30 days, percent with one decimal.
    pub average_attendance_rate: f64,
    pub generated_at: DateTime<Utc>,
}

impl DashboardStats {
    pub fn inactive_players(&self) -> u64 {
        self.total_players.saturating_sub(self.active_players)
    }
}
