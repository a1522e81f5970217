//! Cache-aware domain queries.
//!
//! [`ClubQueries`] owns a handle to the shared [`CacheStore`] and to the
//! remote data store. Each wrapper derives a key from its options, serves a
//! valid entry when there is one, and otherwise performs one remote fetch,
//! shapes the rows and stores the result.
//!
//! Concurrent misses on the same key are not coalesced: both callers fetch
//! and the later write wins.

pub mod categories;
pub mod dashboard;
pub mod events;
pub mod players;
pub mod sessions;
pub mod staff;

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use crate::cache::{is_valid_at, CacheOptions, CacheStats, CacheStore, QueryShape, TtlPolicy};
use crate::entity::Entity;
use crate::error::QueryResult;
use crate::remote::{RemoteError, RemoteStore, SelectRequest};

pub use categories::CategoryQuery;
pub use dashboard::DashboardQuery;
pub use events::EventQuery;
pub use players::PlayerQuery;
pub use sessions::SessionQuery;
pub use staff::StaffQuery;

pub struct ClubQueries<R> {
    store: Arc<CacheStore>,
    remote: Arc<R>,
    ttl: TtlPolicy,
}

impl<R> Clone for ClubQueries<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            remote: Arc::clone(&self.remote),
            ttl: self.ttl.clone(),
        }
    }
}

impl<R> ClubQueries<R> {
    pub fn new(store: Arc<CacheStore>, remote: Arc<R>) -> Self {
        Self {
            store,
            remote,
            ttl: TtlPolicy::default(),
        }
    }

    pub fn with_ttl_policy(mut self, ttl: TtlPolicy) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    pub fn remote(&self) -> &Arc<R> {
        &self.remote
    }

    pub fn ttl_policy(&self) -> &TtlPolicy {
        &self.ttl
    }

    // ===== Invalidation / Stats =====

    /// Drop every cached result of `entity`. Other entities are untouched.
    ///
    /// Call after a create/update/delete on the entity; the cache cannot
    /// observe writes by itself.
    pub fn invalidate_entity(&self, entity: Entity) -> usize {
        let removed = self.store.invalidate(&entity.key_prefix());
        info!(entity = %entity, removed, "Invalidated entity");
        removed
    }

    /// Drop `entity` and every entity whose cached results aggregate it.
    pub fn invalidate_after_write(&self, entity: Entity) -> usize {
        let mut removed = self.store.invalidate(&entity.key_prefix());
        for dependent in entity.dependents() {
            removed += self.store.invalidate(&dependent.key_prefix());
        }
        info!(entity = %entity, removed, "Invalidated entity and dependents");
        removed
    }

    pub fn clear_all(&self) -> usize {
        self.store.clear()
    }

    pub fn get_stats(&self) -> CacheStats {
        self.store.stats()
    }
}

impl<R: RemoteStore> ClubQueries<R> {
    /// Serve `shape` from the store or run `fetch` and store its result.
    ///
    /// The key is derived before anything else so a malformed shape fails
    /// without touching the remote. Failed fetches are never stored.
    pub(crate) async fn cached<T, F, Fut>(
        &self,
        entity: Entity,
        shape: QueryShape,
        options: CacheOptions,
        fetch: F,
    ) -> QueryResult<Arc<T>>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = QueryResult<T>>,
    {
        let key = shape.build_key(entity)?;
        let ttl = self.ttl.resolve(entity, &options);

        if options.bypasses_store(ttl) {
            debug!(entity = %entity, key = %key, "Cache bypassed");
            return fetch().await.map(Arc::new);
        }

        if let Some(entry) = self.store.get::<T>(&key) {
            if is_valid_at(&entry, ttl, self.store.now()) {
                debug!(entity = %entity, key = %key, "Cache hit");
                return Ok(entry.data);
            }
            debug!(entity = %entity, key = %key, "Cache entry stale");
        } else {
            debug!(entity = %entity, key = %key, "Cache miss");
        }

        let data = Arc::new(fetch().await?);
        self.store.set(key, Arc::clone(&data), ttl);
        Ok(data)
    }

    /// Fetch and decode the rows of one request.
    pub(crate) async fn select_rows<T: DeserializeOwned>(
        &self,
        request: &SelectRequest,
    ) -> QueryResult<Vec<T>> {
        let rows = self.remote.select(request).await?;
        Ok(decode_rows(&request.table, rows)?)
    }
}

/// A row that does not match the expected shape is a bad response from the
/// remote, not a cache problem.
fn decode_rows<T: DeserializeOwned>(table: &str, rows: Vec<Value>) -> Result<Vec<T>, RemoteError> {
    rows.into_iter()
        .enumerate()
        .map(|(i, row)| {
            serde_json::from_value(row)
                .map_err(|e| RemoteError::InvalidResponse(format!("{} row {}: {}", table, i, e)))
        })
        .collect()
}
