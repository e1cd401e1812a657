//! Cache module for memoizing parsed zdb output
//!
//! This module provides a time-bounded in-memory cache keyed by pool identity,
//! so repeated lookups of the same pool within the TTL do not re-run zdb.
//! Each client owns its own cache; nothing here is a process-wide global.

mod manager;

pub use manager::{cache_key, CachedData, TtlCache};
