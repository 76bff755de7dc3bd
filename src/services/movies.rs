use std::sync::Arc;

use crate::{
    clock::Clock,
    db::{CacheKey, CacheStore, StoreRead, StoreWrite},
    models::{normalize_movies, Genre, MovieRecord},
    services::providers::MovieProvider,
};

const CACHE_TTL_SECS: i64 = 3600; // 1 hour

/// Age after which a cached result set is fetched again
pub fn cache_max_age() -> chrono::Duration {
    chrono::Duration::seconds(CACHE_TTL_SECS)
}

/// Where the movies of a resolution came from
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionSource {
    /// Served from a fresh cache entry
    CacheHit,
    /// Fetched from the provider and written through to the cache
    Fetched,
    /// Provider failed; the result is empty and nothing was cached
    Degraded(String),
    /// Nothing to look up (blank search)
    Skipped,
}

/// Movies for a cache key plus how they were obtained
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub movies: Vec<MovieRecord>,
    pub source: ResolutionSource,
}

/// Fetch-or-populate orchestrator over the cache and the movie provider
#[derive(Clone)]
pub struct MovieCatalog {
    store: Arc<dyn CacheStore>,
    provider: Arc<dyn MovieProvider>,
    clock: Arc<dyn Clock>,
}

impl MovieCatalog {
    pub fn new(
        store: Arc<dyn CacheStore>,
        provider: Arc<dyn MovieProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            provider,
            clock,
        }
    }

    /// Returns fresh cached movies for `key`, or fetches, stores and returns them
    ///
    /// An empty fresh entry is a hit. A provider failure yields an empty result and
    /// leaves the cache untouched.
    pub async fn resolve(&self, key: &CacheKey) -> Resolution {
        match self.store.get(key).await {
            StoreRead::Found(entry) if entry.is_fresh(self.clock.now(), cache_max_age()) => {
                tracing::debug!(key = %key, count = entry.movies.len(), "Cache hit");
                return Resolution {
                    movies: entry.movies,
                    source: ResolutionSource::CacheHit,
                };
            }
            StoreRead::Found(entry) => {
                tracing::debug!(key = %key, written_at = %entry.written_at, "Cache entry stale");
            }
            StoreRead::Missing => {
                tracing::debug!(key = %key, "Cache miss");
            }
            StoreRead::Fault(reason) => {
                tracing::warn!(key = %key, reason = %reason, "Cache unavailable, treating as miss");
            }
        }

        let query = key.provider_query();
        let raw = match self.provider.fetch(&query).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    key = %key,
                    provider = self.provider.name(),
                    "Movie provider failed, returning no results"
                );
                return Resolution {
                    movies: Vec::new(),
                    source: ResolutionSource::Degraded(e.to_string()),
                };
            }
        };

        let raw_count = raw.len();
        let movies = normalize_movies(raw);

        if let StoreWrite::Fault(reason) = self.store.put(key, &movies).await {
            tracing::warn!(key = %key, reason = %reason, "Could not cache movie results");
        }

        tracing::info!(
            key = %key,
            fetched = raw_count,
            kept = movies.len(),
            "Movies fetched from provider"
        );

        Resolution {
            movies,
            source: ResolutionSource::Fetched,
        }
    }

    /// Genre-matched recommendations for an emotion label
    pub async fn recommend_for_emotion(&self, emotion: &str) -> (Genre, Resolution) {
        let genre = Genre::for_emotion_label(emotion);
        let resolution = self.resolve(&CacheKey::Genre(genre)).await;
        (genre, resolution)
    }

    /// Free-text title search; blank queries return nothing without any lookups
    pub async fn search(&self, query: &str) -> Resolution {
        let query = query.trim();
        if query.is_empty() {
            return Resolution {
                movies: Vec::new(),
                source: ResolutionSource::Skipped,
            };
        }

        self.resolve(&CacheKey::Search(query.to_string())).await
    }
}
