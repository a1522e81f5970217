use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::CategoryRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttendanceStatus::Present => write!(f, "Present"),
            AttendanceStatus::Absent => write!(f, "Absent"),
            AttendanceStatus::Late => write!(f, "Late"),
            AttendanceStatus::Excused => write!(f, "Excused"),
            AttendanceStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

/// One roll entry embedded under a session.
#[derive(Debug, Clone, Deserialize)]
pub struct AttendanceRow {
    pub player_id: Option<i64>,
    pub status: AttendanceStatus,
}

/// Attendance counts for one session, or for a whole period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendanceStats {
    pub present: usize,
    pub absent: usize,
    pub late: usize,
    pub excused: usize,
    /// Every roll entry, including ones with an unrecognised status.
    pub total: usize,
    /// Percentage of the roll that showed up (present or late), one decimal.
    pub attendance_rate: f64,
}

impl AttendanceStats {
    pub fn from_statuses<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = AttendanceStatus>,
    {
        let mut stats = Self::default();
        for status in statuses {
            stats.total += 1;
            match status {
                AttendanceStatus::Present => stats.present += 1,
                AttendanceStatus::Absent => stats.absent += 1,
                AttendanceStatus::Late => stats.late += 1,
                AttendanceStatus::Excused => stats.excused += 1,
                AttendanceStatus::Unknown => {}
            }
        }
        stats.attendance_rate = attendance_rate(stats.present + stats.late, stats.total);
        stats
    }
}

/// `attended / total` as a percentage rounded to one decimal; 0 for an empty roll.
pub fn attendance_rate(attended: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let pct = attended as f64 / total as f64 * 100.0;
    (pct * 10.0).round() / 10.0
}

/// `sessions` row with its category and roll embedded.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionRow {
    pub id: i64,
    pub date: NaiveDate,
    pub start_time: Option<String>,
    pub session_type: Option<String>,
    pub location: Option<String>,
    pub category_id: Option<i64>,
    pub category: Option<CategoryRef>,
    #[serde(default)]
    pub attendance: Vec<AttendanceRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionWithStats {
    pub id: i64,
    pub date: NaiveDate,
    pub start_time: Option<String>,
    pub session_type: Option<String>,
    pub location: Option<String>,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub stats: AttendanceStats,
}

impl From<SessionRow> for SessionWithStats {
    fn from(row: SessionRow) -> Self {
        let stats = AttendanceStats::from_statuses(row.attendance.iter().map(|a| a.status));
        Self {
            id: row.id,
            date: row.date,
            start_time: row.start_time,
            session_type: row.session_type,
            location: row.location,
            category_id: row.category_id.or(row.category.as_ref().map(|c| c.id)),
            category_name: row.category.map(|c| c.name),
            stats,
        }
    }
}
