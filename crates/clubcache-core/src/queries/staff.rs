use std::sync::Arc;

use crate::cache::{CacheOptions, OrderBy, QueryShape};
use crate::entity::Entity;
use crate::error::QueryResult;
use crate::models::{StaffRow, StaffWithCategories};
use crate::remote::{RemoteStore, SelectRequest};

use super::ClubQueries;

const STAFF_COLUMNS: &str =
    "id,first_name,last_name,role,email,phone,active,staff_categories(category:categories(id,name))";

/// Options for [`ClubQueries::get_staff_with_categories`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffQuery {
    /// Restrict to one role (e.g. `coach`). Default: all roles.
    pub role: Option<String>,
    /// Default: last name ascending.
    pub order: OrderBy,
    /// Default: 0.
    pub offset: u64,
    /// Default: 100.
    pub limit: u64,
}

impl Default for StaffQuery {
    fn default() -> Self {
        Self {
            role: None,
            order: OrderBy::asc("last_name"),
            offset: 0,
            limit: 100,
        }
    }
}

impl StaffQuery {
    fn shape(&self) -> QueryShape {
        QueryShape::new()
            .filter_opt("role", self.role.as_ref())
            .order_by(self.order.clone())
            .offset(self.offset)
            .limit(self.limit)
    }

    fn request(&self) -> SelectRequest {
        SelectRequest::new("staff")
            .columns(STAFF_COLUMNS)
            .eq_opt("role", self.role.clone())
            .order(self.order.clone())
            .offset(self.offset)
            .limit(self.limit)
    }
}

impl<R: RemoteStore> ClubQueries<R> {
    /// Staff members with the categories each one is assigned to.
    pub async fn get_staff_with_categories(
        &self,
        query: &StaffQuery,
        options: CacheOptions,
    ) -> QueryResult<Arc<Vec<StaffWithCategories>>> {
        self.cached(Entity::Staff, query.shape(), options, || async {
            let rows: Vec<StaffRow> = self.select_rows(&query.request()).await?;
            Ok(rows.into_iter().map(StaffWithCategories::from).collect())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::queries::test_support::harness;
    use crate::remote::fake::FakeRemote;

    fn staff() -> FakeRemote {
        FakeRemote::new().with_rows(
            "staff",
            vec![json!({"id": 1, "first_name": "Marta", "last_name": "Reis", "role": "coach",
                        "email": null, "phone": null, "active": true,
                        "staff_categories": [{"category": {"id": 4, "name": "U12"}}]})],
        )
    }

    #[tokio::test]
    async fn test_pages_use_distinct_keys() {
        let h = harness(staff());
        let first = StaffQuery {
            offset: 0,
            limit: 100,
            ..StaffQuery::default()
        };
        let second = StaffQuery {
            offset: 100,
            limit: 100,
            ..StaffQuery::default()
        };

        h.queries.get_staff_with_categories(&first, CacheOptions::default()).await.unwrap();
        h.queries.get_staff_with_categories(&second, CacheOptions::default()).await.unwrap();
        assert_eq!(h.remote.select_calls(), 2);

        let stats = h.queries.get_stats();
        assert_eq!(stats.size, 2);
        assert_ne!(stats.keys[0], stats.keys[1]);

        // Each page is served from its own entry afterwards
        h.queries.get_staff_with_categories(&first, CacheOptions::default()).await.unwrap();
        h.queries.get_staff_with_categories(&second, CacheOptions::default()).await.unwrap();
        assert_eq!(h.remote.select_calls(), 2);

        let offsets: Vec<Option<u64>> = h.remote.requests().iter().map(|r| r.offset).collect();
        assert_eq!(offsets, vec![Some(0), Some(100)]);
    }

    #[tokio::test]
    async fn test_joins_categories() {
        let h = harness(staff());
        let query = StaffQuery {
            role: Some("coach".to_string()),
            ..StaffQuery::default()
        };
        let result = h
            .queries
            .get_staff_with_categories(&query, CacheOptions::default())
            .await
            .unwrap();
        assert_eq!(result[0].categories[0].name, "U12");
        assert_eq!(result[0].categories.len(), 1);

        let request = h.remote.last_request().unwrap();
        assert_eq!(request.find_filter("role").unwrap().value, json!("coach"));
    }
}
