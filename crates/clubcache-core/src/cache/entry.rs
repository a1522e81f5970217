use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// One cached result together with when it was captured and how long it
/// may be trusted.
///
/// The payload is shared, never mutated: a refill replaces the whole entry.
pub struct CacheEntry<T> {
    pub data: Arc<T>,
    pub captured_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl<T> Clone for CacheEntry<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            captured_at: self.captured_at,
            ttl: self.ttl,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for CacheEntry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("data", &self.data)
            .field("captured_at", &self.captured_at)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl<T> CacheEntry<T> {
    pub fn new(data: Arc<T>, captured_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            data,
            captured_at,
            ttl,
        }
    }

    /// Age of the entry at `now`. Clock skew never yields a negative age.
    pub fn age_at(&self, now: DateTime<Utc>) -> chrono::Duration {
        age_since(self.captured_at, now)
    }

    /// Validity against the TTL the entry was written with.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        is_valid_at(self, self.ttl, now)
    }
}

/// `now - captured_at < ttl`, using the wall clock.
pub fn is_valid<T>(entry: &CacheEntry<T>, ttl: Duration) -> bool {
    is_valid_at(entry, ttl, Utc::now())
}

pub fn is_valid_at<T>(entry: &CacheEntry<T>, ttl: Duration, now: DateTime<Utc>) -> bool {
    within_ttl(entry.captured_at, ttl, now)
}

pub(crate) fn within_ttl(captured_at: DateTime<Utc>, ttl: Duration, now: DateTime<Utc>) -> bool {
    match chrono::Duration::from_std(ttl) {
        Ok(ttl) => age_since(captured_at, now) < ttl,
        // Longer than chrono can represent: never expires in practice
        Err(_) => true,
    }
}

pub(crate) fn age_since(captured_at: DateTime<Utc>, now: DateTime<Utc>) -> chrono::Duration {
    let age = now - captured_at;
    if age < chrono::Duration::zero() {
        chrono::Duration::zero()
    } else {
        age
    }
}

/// Human readable age ("just now", "42s ago", "5m ago", "2h ago", "3d ago").
pub fn format_age(age: chrono::Duration) -> String {
    let seconds = age.num_seconds();
    let minutes = age.num_minutes();
    if seconds < 1 {
        "just now".to_string()
    } else if minutes < 1 {
        format!("{}s ago", seconds)
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        let hours = minutes / 60;
        if minutes % 60 >= 30 {
            format!("{}h ago", hours + 1)
        } else {
            format!("{}h ago", hours)
        }
    } else {
        let days = minutes / 1440;
        if (minutes % 1440) / 60 >= 12 {
            format!("{}d ago", days + 1)
        } else {
            format!("{}d ago", days)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_at(captured_at: DateTime<Utc>, ttl_secs: u64) -> CacheEntry<Vec<i32>> {
        CacheEntry::new(Arc::new(vec![1, 2, 3]), captured_at, Duration::from_secs(ttl_secs))
    }

    #[test]
    fn test_valid_just_before_ttl() {
        let t0 = Utc::now();
        let entry = entry_at(t0, 30);
        let almost = t0 + chrono::Duration::seconds(30) - chrono::Duration::milliseconds(1);
        assert!(is_valid_at(&entry, entry.ttl, almost));
    }

    #[test]
    fn test_invalid_at_and_after_ttl() {
        let t0 = Utc::now();
        let entry = entry_at(t0, 30);
        let exactly = t0 + chrono::Duration::seconds(30);
        let after = exactly + chrono::Duration::milliseconds(1);
        assert!(!is_valid_at(&entry, entry.ttl, exactly));
        assert!(!is_valid_at(&entry, entry.ttl, after));
    }

    #[test]
    fn test_zero_ttl_is_never_valid() {
        let t0 = Utc::now();
        let entry = entry_at(t0, 0);
        assert!(!is_valid_at(&entry, Duration::ZERO, t0));
    }

    #[test]
    fn test_caller_ttl_overrides_entry_ttl() {
        let t0 = Utc::now();
        let entry = entry_at(t0, 300);
        let later = t0 + chrono::Duration::seconds(60);
        assert!(entry.is_valid_at(later));
        assert!(!is_valid_at(&entry, Duration::from_secs(10), later));
    }

    #[test]
    fn test_clock_skew_counts_as_fresh() {
        let t0 = Utc::now();
        let entry = entry_at(t0, 30);
        let earlier = t0 - chrono::Duration::minutes(5);
        assert_eq!(entry.age_at(earlier), chrono::Duration::zero());
        assert!(entry.is_valid_at(earlier));
    }

    #[test]
    fn test_is_valid_wall_clock() {
        let fresh = entry_at(Utc::now(), 60);
        assert!(is_valid(&fresh, fresh.ttl));

        let old = entry_at(Utc::now() - chrono::Duration::minutes(61), 60 * 60);
        assert!(!is_valid(&old, old.ttl));
    }

    #[test]
    fn test_format_age() {
        let m = chrono::Duration::minutes;
        assert_eq!(format_age(chrono::Duration::seconds(-3)), "just now");
        assert_eq!(format_age(chrono::Duration::milliseconds(400)), "just now");
        assert_eq!(format_age(chrono::Duration::seconds(42)), "42s ago");
        assert_eq!(format_age(m(5)), "5m ago");
        assert_eq!(format_age(m(89)), "1h ago");
        assert_eq!(format_age(m(90)), "2h ago");
        assert_eq!(format_age(m(1440 + 11 * 60)), "1d ago");
        assert_eq!(format_age(m(1440 + 12 * 60)), "2d ago");
    }
}
