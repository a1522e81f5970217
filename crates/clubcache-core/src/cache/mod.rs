//! In-process read cache.
//!
//! Entries live in a single [`CacheStore`] shared by every query wrapper.
//! Validity is purely time based: an entry is trusted while its age is
//! below its TTL and is otherwise left in place until the next refill or
//! an explicit invalidation.

pub mod clock;
pub mod entry;
pub mod key;
mod lock;
pub mod store;
pub mod ttl;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{format_age, is_valid, is_valid_at, CacheEntry};
pub use key::{build_key, OrderBy, QueryShape, KEY_SEPARATOR};
pub use store::{CacheStats, CacheStore};
pub use ttl::{CacheOptions, TtlPolicy};
