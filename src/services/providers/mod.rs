//! Movie data provider abstraction
//!
//! The catalog only needs one operation from a provider: run a query and hand back
//! the raw movie entries in provider order. Normalization and caching happen in
//! `services::movies`, so providers stay thin HTTP adapters.

use crate::{
    error::AppResult,
    models::{ApiMovie, MovieQuery},
};

pub mod rapidapi;

pub use rapidapi::RapidApiImdbProvider;

/// Trait for movie search providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MovieProvider: Send + Sync {
    /// Runs the query against the upstream API
    ///
    /// Any transport failure, non-2xx status or unparseable body is an error; an
    /// empty page is a successful empty result.
    async fn fetch(&self, query: &MovieQuery) -> AppResult<Vec<ApiMovie>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
