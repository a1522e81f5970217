use std::sync::Arc;

use crate::cache::{CacheOptions, OrderBy, QueryShape};
use crate::entity::Entity;
use crate::error::QueryResult;
use crate::models::{CategoryRow, CategoryWithCount};
use crate::remote::{RemoteStore, SelectRequest};

use super::ClubQueries;

const CATEGORY_COLUMNS: &str = "id,name,description,active,players(id,active)";

/// Options for [`ClubQueries::get_categories_with_counts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryQuery {
    /// Only active categories. Default: false.
    pub active_only: bool,
    /// Default: name ascending.
    pub order: OrderBy,
}

impl Default for CategoryQuery {
    fn default() -> Self {
        Self {
            active_only: false,
            order: OrderBy::asc("name"),
        }
    }
}

impl CategoryQuery {
    fn shape(&self) -> QueryShape {
        QueryShape::new()
            .filter("active_only", &self.active_only)
            .order_by(self.order.clone())
    }

    fn request(&self) -> SelectRequest {
        let request = SelectRequest::new("categories")
            .columns(CATEGORY_COLUMNS)
            .order(self.order.clone());
        if self.active_only {
            request.eq("active", true)
        } else {
            request
        }
    }
}

impl<R: RemoteStore> ClubQueries<R> {
    /// Categories with their player counts.
    pub async fn get_categories_with_counts(
        &self,
        query: &CategoryQuery,
        options: CacheOptions,
    ) -> QueryResult<Arc<Vec<CategoryWithCount>>> {
        self.cached(Entity::Categories, query.shape(), options, || async {
            let rows: Vec<CategoryRow> = self.select_rows(&query.request()).await?;
            Ok(rows.into_iter().map(CategoryWithCount::from).collect())
        })
        .await
    }
}
