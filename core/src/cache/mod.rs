//! Caches for interned grammar values.
//!
//! - [`HashGenCacheMap`] / [`HashGenCacheSet`]: lock-free, hashed caches
//!   with four generations per bucket and an LRFU replacement policy. Safe
//!   to share between threads parsing different streams.
//! - [`BoundedLruCache`]: an exact LRU cache behind a single mutex, for
//!   small memo tables off the hot path.

mod generational;
mod lru;

pub use generational::{HashGenCacheMap, HashGenCacheSet};
pub use lru::BoundedLruCache;
