//! Core library for clubcache.
//!
//! A single-process, TTL-based read cache sitting between the club
//! management application's list/dashboard views and the hosted relational
//! data service.
//!
//! - [`cache`]: entries, key derivation, TTL policy and the shared store
//! - [`remote`]: the remote data store boundary and its REST client
//! - [`models`]: raw row shapes and the shaped results the cache holds
//! - [`queries`]: cache-aware domain query wrappers plus the
//!   invalidation/stats surface
//! - [`config`]: on-disk and environment configuration

pub mod cache;
pub mod config;
pub mod entity;
pub mod error;
pub mod models;
pub mod queries;
pub mod remote;

pub use cache::{CacheEntry, CacheOptions, CacheStats, CacheStore, OrderBy, QueryShape, TtlPolicy};
pub use config::Config;
pub use entity::Entity;
pub use error::{QueryError, QueryResult};
pub use queries::ClubQueries;
pub use remote::{RemoteError, RemoteStore, RestRemote, SelectRequest};
