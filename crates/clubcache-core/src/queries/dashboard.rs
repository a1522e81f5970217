use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::cache::{CacheOptions, QueryShape};
use crate::entity::Entity;
use crate::error::QueryResult;
use crate::models::{AttendanceRow, AttendanceStats, DashboardStats};
use crate::remote::{FilterOp, RemoteStore, SelectRequest};

use super::events::upcoming_cutoff;
use super::{decode_rows, ClubQueries};

/// Recent-activity window for session and attendance figures.
const ACTIVITY_WINDOW_DAYS: i64 = 30;

/// Injury status that no longer counts as open.
const RECOVERED_STATUS: &str = "recovered";

/// Options for [`ClubQueries::get_dashboard_stats`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardQuery {
    /// Scope every figure except the category total to one category.
    /// Default: whole club.
    pub category_id: Option<i64>,
}

/// Every request the dashboard needs for one refresh.
struct DashboardRequests {
    players: SelectRequest,
    active_players: SelectRequest,
    staff: SelectRequest,
    categories: SelectRequest,
    upcoming_events: SelectRequest,
    open_injuries: SelectRequest,
    recent_sessions: SelectRequest,
    recent_attendance: SelectRequest,
}

impl DashboardQuery {
    fn shape(&self) -> QueryShape {
        QueryShape::new().filter_opt("category_id", self.category_id.as_ref())
    }

    fn requests(&self, now: DateTime<Utc>) -> DashboardRequests {
        let category = self.category_id;
        let today = now.date_naive();
        let since = (today - chrono::Duration::days(ACTIVITY_WINDOW_DAYS)).to_string();
        let today = today.to_string();

        let players = SelectRequest::new("players")
            .columns("id")
            .eq_opt("category_id", category);
        let active_players = players.clone().eq("active", true);

        let staff = match category {
            Some(id) => SelectRequest::new("staff")
                .columns("id,staff_categories!inner(category_id)")
                .eq("staff_categories.category_id", id),
            None => SelectRequest::new("staff").columns("id"),
        };

        let open_injuries = match category {
            Some(id) => SelectRequest::new("injuries")
                .columns("id,player:players!inner(category_id)")
                .eq("player.category_id", id),
            None => SelectRequest::new("injuries").columns("id"),
        }
        .filter("status", FilterOp::Neq, RECOVERED_STATUS);

        DashboardRequests {
            players,
            active_players,
            staff,
            categories: SelectRequest::new("categories").columns("id"),
            upcoming_events: SelectRequest::new("events")
                .columns("id")
                .eq_opt("category_id", category)
                .filter("start_date", FilterOp::Gte, upcoming_cutoff(now).to_rfc3339()),
            open_injuries,
            recent_sessions: SelectRequest::new("sessions")
                .columns("id")
                .eq_opt("category_id", category)
                .filter("date", FilterOp::Gte, since.clone())
                .filter("date", FilterOp::Lte, today.clone()),
            recent_attendance: SelectRequest::new("attendance")
                .columns("status,session:sessions!inner(date,category_id)")
                .eq_opt("session.category_id", category)
                .filter("session.date", FilterOp::Gte, since)
                .filter("session.date", FilterOp::Lte, today),
        }
    }
}

impl<R: RemoteStore> ClubQueries<R> {
    /// Aggregate counters for the dashboard.
    ///
    /// All figures of one refresh are requested concurrently; if any of them
    /// fails the whole refresh fails and nothing is cached.
    pub async fn get_dashboard_stats(
        &self,
        query: &DashboardQuery,
        options: CacheOptions,
    ) -> QueryResult<Arc<DashboardStats>> {
        self.cached(Entity::DashboardStats, query.shape(), options, || async {
            let now = self.store.now();
            let r = query.requests(now);
            let remote = &*self.remote;

            let (
                total_players,
                active_players,
                total_staff,
                total_categories,
                upcoming_events,
                open_injuries,
                sessions_last_30_days,
                roll,
            ) = futures::try_join!(
                remote.count(&r.players),
                remote.count(&r.active_players),
                remote.count(&r.staff),
                remote.count(&r.categories),
                remote.count(&r.upcoming_events),
                remote.count(&r.open_injuries),
                remote.count(&r.recent_sessions),
                remote.select(&r.recent_attendance),
            )?;

            let roll: Vec<AttendanceRow> = decode_rows(&r.recent_attendance.table, roll)?;
            let attendance = AttendanceStats::from_statuses(roll.iter().map(|a| a.status));

            Ok(DashboardStats {
                category_id: query.category_id,
                total_players,
                active_players,
                total_staff,
                total_categories,
                upcoming_events,
                open_injuries,
                sessions_last_30_days,
                average_attendance_rate: attendance.attendance_rate,
                generated_at: now,
            })
        })
        .await
    }
}
