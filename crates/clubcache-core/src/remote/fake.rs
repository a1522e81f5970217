//! In-memory remote for tests: canned rows per table, call counters and a
//! switch to make every request fail.
//!
//! Every call yields once before answering, so calls joined on one task
//! overlap the way real network requests do.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use serde_json::Value;

use super::{RemoteError, RemoteStore, SelectRequest};

#[derive(Debug, Default)]
pub(crate) struct FakeRemote {
    rows: Mutex<HashMap<String, Vec<Value>>>,
    // (table, filter column that must be present, count)
    counts: Mutex<Vec<(String, Option<String>, u64)>>,
    requests: Mutex<Vec<SelectRequest>>,
    select_calls: AtomicUsize,
    count_calls: AtomicUsize,
    failing: AtomicBool,
}

impl FakeRemote {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_rows(self, table: &str, rows: Vec<Value>) -> Self {
        self.set_rows(table, rows);
        self
    }

    pub(crate) fn with_count(self, table: &str, count: u64) -> Self {
        self.counts.lock().unwrap().push((table.to_string(), None, count));
        self
    }

    /// Count returned only when the request filters on `column`. Takes
    /// precedence over the plain table count.
    pub(crate) fn with_count_where(self, table: &str, column: &str, count: u64) -> Self {
        self.counts
            .lock()
            .unwrap()
            .push((table.to_string(), Some(column.to_string()), count));
        self
    }

    pub(crate) fn set_rows(&self, table: &str, rows: Vec<Value>) {
        self.rows.lock().unwrap().insert(table.to_string(), rows);
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn select_calls(&self) -> usize {
        self.select_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn count_calls(&self) -> usize {
        self.count_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Vec<SelectRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn last_request(&self) -> Option<SelectRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    fn record(&self, request: &SelectRequest) -> Result<(), RemoteError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.failing.load(Ordering::SeqCst) {
            Err(RemoteError::ServerError("simulated outage".into()))
        } else {
            Ok(())
        }
    }
}

impl RemoteStore for FakeRemote {
    fn select(
        &self,
        request: &SelectRequest,
    ) -> impl Future<Output = Result<Vec<Value>, RemoteError>> + Send {
        self.select_calls.fetch_add(1, Ordering::SeqCst);
        let result = self.record(request).map(|_| {
            self.rows
                .lock()
                .unwrap()
                .get(&request.table)
                .cloned()
                .unwrap_or_default()
        });
        async move {
            tokio::task::yield_now().await;
            result
        }
    }

    fn count(&self, request: &SelectRequest) -> impl Future<Output = Result<u64, RemoteError>> + Send {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        let result = self.record(request).map(|_| {
            let counts = self.counts.lock().unwrap();
            let for_table = || counts.iter().filter(|(table, _, _)| *table == request.table);
            for_table()
                .find(|(_, column, _)| {
                    column.as_deref().is_some_and(|c| request.find_filter(c).is_some())
                })
                .or_else(|| for_table().find(|(_, column, _)| column.is_none()))
                .map(|(_, _, count)| *count)
                .unwrap_or(0)
        });
        async move {
            tokio::task::yield_now().await;
            result
        }
    }
}
