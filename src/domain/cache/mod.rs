//! Cache domain: content-addressed keys and the response cache contract.

pub mod key;
pub mod store;

pub use key::cache_key;
pub use store::{CacheError, CachedGeneration, ResponseCache};
