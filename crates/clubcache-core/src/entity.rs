//! Cached entity classes.
//!
//! Every cache key starts with the name of the entity it belongs to, which is
//! what makes per-entity invalidation a simple prefix match.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::KEY_SEPARATOR;

/// Reference data, changes a few times a season.
const CATEGORIES_TTL_SECS: u64 = 5 * 60;

/// Rosters change occasionally during the week.
const ROSTER_TTL_SECS: u64 = 2 * 60;

const EVENTS_TTL_SECS: u64 = 60;

/// Session rolls are taken live at the field.
const SESSIONS_TTL_SECS: u64 = 30;

/// Dashboard counters aggregate everything else.
const DASHBOARD_TTL_SECS: u64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Players,
    Sessions,
    Events,
    Staff,
    Categories,
    DashboardStats,
}

impl Entity {
    pub const ALL: [Entity; 6] = [
        Entity::Players,
        Entity::Sessions,
        Entity::Events,
        Entity::Staff,
        Entity::Categories,
        Entity::DashboardStats,
    ];

    /// Stable name used as the cache key prefix.
    pub fn name(&self) -> &'static str {
        match self {
            Entity::Players => "players",
            Entity::Sessions => "sessions",
            Entity::Events => "events",
            Entity::Staff => "staff",
            Entity::Categories => "categories",
            Entity::DashboardStats => "dashboard_stats",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.name() == name)
    }

    /// Prefix shared by every key of this entity, separator included so that
    /// `players` never matches keys of a hypothetical `players_archive`.
    pub fn key_prefix(&self) -> String {
        format!("{}{}", self.name(), KEY_SEPARATOR)
    }

    pub fn default_ttl(&self) -> Duration {
        let secs = match self {
            Entity::Categories => CATEGORIES_TTL_SECS,
            Entity::Players | Entity::Staff => ROSTER_TTL_SECS,
            Entity::Events => EVENTS_TTL_SECS,
            Entity::Sessions => SESSIONS_TTL_SECS,
            Entity::DashboardStats => DASHBOARD_TTL_SECS,
        };
        Duration::from_secs(secs)
    }

    /// Entities whose cached results are derived from this one and go stale
    /// when it is written.
    pub fn dependents(&self) -> &'static [Entity] {
        match self {
            Entity::Players => &[Entity::Categories, Entity::DashboardStats],
            Entity::Sessions
            | Entity::Events
            | Entity::Staff
            | Entity::Categories => &[Entity::DashboardStats],
            Entity::DashboardStats => &[],
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
