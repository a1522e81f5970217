//! TTL policy and per-call cache options.

use std::collections::HashMap;
use std::time::Duration;

use crate::entity::Entity;

/// Static TTL lookup by entity, with optional configured overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TtlPolicy {
    overrides: HashMap<Entity, Duration>,
}

impl TtlPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_override(mut self, entity: Entity, ttl: Duration) -> Self {
        self.overrides.insert(entity, ttl);
        self
    }

    pub fn ttl_for(&self, entity: Entity) -> Duration {
        self.overrides
            .get(&entity)
            .copied()
            .unwrap_or_else(|| entity.default_ttl())
    }

    /// The TTL a call will use: the per-call override when given, otherwise
    /// the policy value for the entity.
    pub fn resolve(&self, entity: Entity, options: &CacheOptions) -> Duration {
        options.ttl.unwrap_or_else(|| self.ttl_for(entity))
    }
}

/// Per-call cache behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
    /// When false the store is neither read nor written.
    pub use_cache: bool,
    /// Replaces the entity's TTL for this call. Zero also bypasses the store.
    pub ttl: Option<Duration>,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            ttl: None,
        }
    }
}

impl CacheOptions {
    pub fn no_cache() -> Self {
        Self {
            use_cache: false,
            ttl: None,
        }
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            use_cache: true,
            ttl: Some(ttl),
        }
    }

    pub(crate) fn bypasses_store(&self, resolved_ttl: Duration) -> bool {
        !self.use_cache || resolved_ttl.is_zero()
    }
}
