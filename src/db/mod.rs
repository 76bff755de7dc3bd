pub mod cache;
pub mod sqlite;

pub use cache::{CacheEntry, CacheKey, CacheStore, SqliteCache, StoreRead, StoreWrite};
pub use sqlite::create_pool;
