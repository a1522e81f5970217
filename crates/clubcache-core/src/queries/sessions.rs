use std::sync::Arc;

use chrono::NaiveDate;

use crate::cache::{CacheOptions, OrderBy, QueryShape};
use crate::entity::Entity;
use crate::error::QueryResult;
use crate::models::{SessionRow, SessionWithStats};
use crate::remote::{FilterOp, RemoteStore, SelectRequest};

use super::ClubQueries;

const SESSION_COLUMNS: &str = "id,date,start_time,session_type,location,category_id,\
category:categories(id,name),attendance(player_id,status)";

/// Options for [`ClubQueries::get_sessions_with_stats`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionQuery {
    /// Default: all categories.
    pub category_id: Option<i64>,
    /// Inclusive lower date bound. Default: none.
    pub from: Option<NaiveDate>,
    /// Inclusive upper date bound. Default: none.
    pub to: Option<NaiveDate>,
    /// Default: date descending (most recent first).
    pub order: OrderBy,
    /// Default: 50.
    pub limit: u64,
    /// Default: 0.
    pub offset: u64,
}

impl Default for SessionQuery {
    fn default() -> Self {
        Self {
            category_id: None,
            from: None,
            to: None,
            order: OrderBy::desc("date"),
            limit: 50,
            offset: 0,
        }
    }
}

impl SessionQuery {
    fn shape(&self) -> QueryShape {
        QueryShape::new()
            .filter_opt("category_id", self.category_id.as_ref())
            .filter_opt("from", self.from.as_ref())
            .filter_opt("to", self.to.as_ref())
            .order_by(self.order.clone())
            .limit(self.limit)
            .offset(self.offset)
    }

    fn request(&self) -> SelectRequest {
        let mut request = SelectRequest::new("sessions")
            .columns(SESSION_COLUMNS)
            .eq_opt("category_id", self.category_id)
            .order(self.order.clone())
            .limit(self.limit)
            .offset(self.offset);
        if let Some(from) = self.from {
            request = request.filter("date", FilterOp::Gte, from.to_string());
        }
        if let Some(to) = self.to {
            request = request.filter("date", FilterOp::Lte, to.to_string());
        }
        request
    }
}

impl<R: RemoteStore> ClubQueries<R> {
    /// Sessions with per-session attendance counts and rate.
    pub async fn get_sessions_with_stats(
        &self,
        query: &SessionQuery,
        options: CacheOptions,
    ) -> QueryResult<Arc<Vec<SessionWithStats>>> {
        self.cached(Entity::Sessions, query.shape(), options, || async {
            let rows: Vec<SessionRow> = self.select_rows(&query.request()).await?;
            Ok(rows.into_iter().map(SessionWithStats::from).collect())
        })
        .await
    }
}
