use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::SqlitePool;
use std::fmt::Display;
use std::sync::Arc;

use crate::clock::Clock;
use crate::models::{Genre, MovieQuery, MovieRecord};

/// Timestamp layout stored in the `timestamp` column (UTC, sub-second precision)
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Whole-second layout of rows written before fractional seconds were stored
const LEGACY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Identifies one cached result set
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Recommendations for a genre
    Genre(Genre),
    /// Results of a trimmed free-text search
    Search(String),
}

impl CacheKey {
    fn table(&self) -> &'static str {
        match self {
            CacheKey::Genre(_) => "movie_cache",
            CacheKey::Search(_) => "search_cache",
        }
    }

    fn key_column(&self) -> &'static str {
        match self {
            CacheKey::Genre(_) => "genre",
            CacheKey::Search(_) => "search_query",
        }
    }

    fn payload_column(&self) -> &'static str {
        match self {
            CacheKey::Genre(_) => "movies",
            CacheKey::Search(_) => "results",
        }
    }

    /// Value stored in the key column
    pub fn value(&self) -> &str {
        match self {
            CacheKey::Genre(genre) => genre.as_str(),
            CacheKey::Search(query) => query,
        }
    }

    /// Provider query that produces the data cached under this key
    pub fn provider_query(&self) -> MovieQuery {
        match self {
            CacheKey::Genre(genre) => MovieQuery::TopRatedByGenre(*genre),
            CacheKey::Search(query) => MovieQuery::TitleAutocomplete(query.clone()),
        }
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Genre(genre) => write!(f, "genre:{}", genre),
            CacheKey::Search(query) => write!(f, "search:{}", query),
        }
    }
}

/// A stored result set and when it was written
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub movies: Vec<MovieRecord>,
    pub written_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Fresh iff strictly younger than `max_age` at `now`
    pub fn is_fresh(&self, now: DateTime<Utc>, max_age: chrono::Duration) -> bool {
        now - self.written_at < max_age
    }
}

/// Outcome of a cache read
#[derive(Debug, Clone, PartialEq)]
pub enum StoreRead {
    Found(CacheEntry),
    Missing,
    /// Storage failed; callers treat this as a miss
    Fault(String),
}

/// Outcome of a cache write
#[derive(Debug, Clone, PartialEq)]
pub enum StoreWrite {
    Written,
    Fault(String),
}

/// Durable key to result-set storage with write timestamps
///
/// Implementations never return errors: faults are logged and reported in the
/// typed outcome so a broken cache degrades to misses instead of failed requests.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &CacheKey) -> StoreRead;

    /// Replaces any existing row for `key`
    async fn put(&self, key: &CacheKey, movies: &[MovieRecord]) -> StoreWrite;
}

/// Cache tables in SQLite
#[derive(Clone)]
pub struct SqliteCache {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl SqliteCache {
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    fn decode(payload: &str, timestamp: &str) -> Result<CacheEntry, String> {
        let movies: Vec<MovieRecord> = serde_json::from_str(payload)
            .map_err(|e| format!("Cache deserialization error: {}", e))?;
        let written_at = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(timestamp, LEGACY_TIMESTAMP_FORMAT))
            .map_err(|e| format!("Invalid cache timestamp {:?}: {}", timestamp, e))?
            .and_utc();

        Ok(CacheEntry { movies, written_at })
    }
}

#[async_trait]
impl CacheStore for SqliteCache {
    async fn get(&self, key: &CacheKey) -> StoreRead {
        let sql = format!(
            "SELECT {}, timestamp FROM {} WHERE {} = ?",
            key.payload_column(),
            key.table(),
            key.key_column()
        );

        let row: Option<(String, String)> = match sqlx::query_as(&sql)
            .bind(key.value())
            .fetch_optional(&self.pool)
            .await
        {
            Ok(row) => row,
            Err(e) => {
                tracing::error!(error = %e, key = %key, "Failed to read from cache");
                return StoreRead::Fault(e.to_string());
            }
        };

        match row {
            Some((payload, timestamp)) => match Self::decode(&payload, &timestamp) {
                Ok(entry) => StoreRead::Found(entry),
                Err(reason) => {
                    tracing::error!(error = %reason, key = %key, "Unreadable cache entry");
                    StoreRead::Fault(reason)
                }
            },
            None => StoreRead::Missing,
        }
    }

    async fn put(&self, key: &CacheKey, movies: &[MovieRecord]) -> StoreWrite {
        let payload = match serde_json::to_string(movies) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, key = %key, "Cache serialization error");
                return StoreWrite::Fault(e.to_string());
            }
        };
        let timestamp = self.clock.now().format(TIMESTAMP_FORMAT).to_string();

        let sql = format!(
            "INSERT OR REPLACE INTO {} ({}, {}, timestamp) VALUES (?, ?, ?)",
            key.table(),
            key.key_column(),
            key.payload_column()
        );

        match sqlx::query(&sql)
            .bind(key.value())
            .bind(payload)
            .bind(timestamp)
            .execute(&self.pool)
            .await
        {
            Ok(_) => {
                tracing::debug!(key = %key, count = movies.len(), "Cache entry written");
                StoreWrite::Written
            }
            Err(e) => {
                tracing::error!(error = %e, key = %key, "Failed to write to cache");
                StoreWrite::Fault(e.to_string())
            }
        }
    }
}
