//! In-process caching.

mod ttl_cache;

pub use ttl_cache::TtlCache;
