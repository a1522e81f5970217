use std::sync::Arc;

use crate::cache::{CacheOptions, OrderBy, QueryShape};
use crate::entity::Entity;
use crate::error::QueryResult;
use crate::models::{PlayerRow, PlayerWithCategory};
use crate::remote::{RemoteStore, SelectRequest};

use super::ClubQueries;

const PLAYER_COLUMNS: &str =
    "id,first_name,last_name,birth_date,position,jersey_number,active,category_id,category:categories(id,name)";

/// Options for [`ClubQueries::get_players_with_categories`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerQuery {
    /// Restrict to one category. Default: all.
    pub category_id: Option<i64>,
    /// Skip inactive players. Default: true.
    pub active_only: bool,
    /// Default: last name ascending.
    pub order: OrderBy,
    /// Default: no limit.
    pub limit: Option<u64>,
    /// Default: 0.
    pub offset: u64,
}

impl Default for PlayerQuery {
    fn default() -> Self {
        Self {
            category_id: None,
            active_only: true,
            order: OrderBy::asc("last_name"),
            limit: None,
            offset: 0,
        }
    }
}

impl PlayerQuery {
    fn shape(&self) -> QueryShape {
        let shape = QueryShape::new()
            .filter_opt("category_id", self.category_id.as_ref())
            .filter("active_only", &self.active_only)
            .order_by(self.order.clone())
            .offset(self.offset);
        match self.limit {
            Some(limit) => shape.limit(limit),
            None => shape,
        }
    }

    fn request(&self) -> SelectRequest {
        let mut request = SelectRequest::new("players")
            .columns(PLAYER_COLUMNS)
            .eq_opt("category_id", self.category_id)
            .order(self.order.clone())
            .offset(self.offset);
        if self.active_only {
            request = request.eq("active", true);
        }
        if let Some(limit) = self.limit {
            request = request.limit(limit);
        }
        request
    }
}

impl<R: RemoteStore> ClubQueries<R> {
    /// Roster with each player's category name and current age.
    pub async fn get_players_with_categories(
        &self,
        query: &PlayerQuery,
        options: CacheOptions,
    ) -> QueryResult<Arc<Vec<PlayerWithCategory>>> {
        self.cached(Entity::Players, query.shape(), options, || async {
            let rows: Vec<PlayerRow> = self.select_rows(&query.request()).await?;
            let today = self.store.now().date_naive();
            Ok(rows.into_iter().map(|row| row.into_shaped(today)).collect())
        })
        .await
    }
}
