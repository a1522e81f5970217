use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

// Every critical section in this crate is a plain map or timestamp update,
// so a panic elsewhere cannot leave the guarded value half-written.

pub(crate) fn rw_read<'a, T>(lock: &'a RwLock<T>, op: &'static str) -> RwLockReadGuard<'a, T> {
    lock.read().unwrap_or_else(|poisoned| {
        warn!(op, lock_kind = "rwlock.read", "Recovered from poisoned cache lock");
        poisoned.into_inner()
    })
}

pub(crate) fn rw_write<'a, T>(lock: &'a RwLock<T>, op: &'static str) -> RwLockWriteGuard<'a, T> {
    lock.write().unwrap_or_else(|poisoned| {
        warn!(op, lock_kind = "rwlock.write", "Recovered from poisoned cache lock");
        poisoned.into_inner()
    })
}

pub(crate) fn mutex_lock<'a, T>(lock: &'a Mutex<T>, op: &'static str) -> MutexGuard<'a, T> {
    lock.lock().unwrap_or_else(|poisoned| {
        warn!(op, lock_kind = "mutex.lock", "Recovered from poisoned cache lock");
        poisoned.into_inner()
    })
}
