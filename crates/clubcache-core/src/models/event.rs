use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CategoryRef;

/// `events` row with its category embedded.
#[derive(Debug, Clone, Deserialize)]
pub struct EventRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub event_type: Option<String>,
    pub category_id: Option<i64>,
    pub category: Option<CategoryRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClubEvent {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub event_type: Option<String>,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
}

impl From<EventRow> for ClubEvent {
    fn from(row: EventRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            start_date: row.start_date,
            end_date: row.end_date,
            location: row.location,
            event_type: row.event_type,
            category_id: row.category_id.or(row.category.as_ref().map(|c| c.id)),
            category_name: row.category.map(|c| c.name),
        }
    }
}
