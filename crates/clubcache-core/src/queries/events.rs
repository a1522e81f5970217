use std::sync::Arc;

use chrono::{DateTime, NaiveTime, TimeZone, Utc};

use crate::cache::{CacheOptions, OrderBy, QueryShape};
use crate::entity::Entity;
use crate::error::QueryResult;
use crate::models::{ClubEvent, EventRow};
use crate::remote::{FilterOp, RemoteStore, SelectRequest};

use super::ClubQueries;

const EVENT_COLUMNS: &str =
    "id,name,description,start_date,end_date,location,event_type,category_id,category:categories(id,name)";

/// Options for [`ClubQueries::get_events`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    /// Default: all categories.
    pub category_id: Option<i64>,
    /// Only events starting today (UTC) or later. Default: false.
    pub upcoming_only: bool,
    /// Default: start date ascending.
    pub order: OrderBy,
    /// Default: 100.
    pub limit: u64,
    /// Default: 0.
    pub offset: u64,
}

impl Default for EventQuery {
    fn default() -> Self {
        Self {
            category_id: None,
            upcoming_only: false,
            order: OrderBy::asc("start_date"),
            limit: 100,
            offset: 0,
        }
    }
}

/// Midnight UTC of `now`'s day. "Upcoming" keeps events that started
/// earlier today.
pub(crate) fn upcoming_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&now.date_naive().and_time(NaiveTime::MIN))
}

impl EventQuery {
    // The key carries the `upcoming_only` flag, not the cutoff;
    // otherwise every new day would need a new key.
    fn shape(&self) -> QueryShape {
        QueryShape::new()
            .filter_opt("category_id", self.category_id.as_ref())
            .filter("upcoming_only", &self.upcoming_only)
            .order_by(self.order.clone())
            .limit(self.limit)
            .offset(self.offset)
    }

    fn request(&self, now: DateTime<Utc>) -> SelectRequest {
        let request = SelectRequest::new("events")
            .columns(EVENT_COLUMNS)
            .eq_opt("category_id", self.category_id)
            .order(self.order.clone())
            .limit(self.limit)
            .offset(self.offset);
        if self.upcoming_only {
            request.filter("start_date", FilterOp::Gte, upcoming_cutoff(now).to_rfc3339())
        } else {
            request
        }
    }
}

impl<R: RemoteStore> ClubQueries<R> {
    /// Calendar events with their category name.
    pub async fn get_events(
        &self,
        query: &EventQuery,
        options: CacheOptions,
    ) -> QueryResult<Arc<Vec<ClubEvent>>> {
        self.cached(Entity::Events, query.shape(), options, || async {
            let request = query.request(self.store.now());
            let rows: Vec<EventRow> = self.select_rows(&request).await?;
            Ok(rows.into_iter().map(ClubEvent::from).collect())
        })
        .await
    }
}
