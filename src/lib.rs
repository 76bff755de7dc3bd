use std::sync::Arc;
use std::time::Duration;

pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use clock::{Clock, SystemClock};
use config::Config;
use db::{create_pool, SqliteCache};
use error::AppResult;
use routes::AppState;
use services::{
    EmotionDetector, HttpEmotionDetector, IdentityProvider, MovieCatalog, NeutralEmotionDetector,
    RapidApiImdbProvider, SupabaseIdentity,
};

/// Wires the production dependencies described by `config`
pub async fn build_state(config: &Config) -> AppResult<AppState> {
    let timeout = Duration::from_secs(config.provider_timeout_secs);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let pool = create_pool(&config.database_url).await?;
    let store = Arc::new(SqliteCache::new(pool, clock.clone()));

    let provider = RapidApiImdbProvider::new(
        config.movie_api_url.clone(),
        config.rapidapi_credentials(),
        timeout,
        config.recommendation_country.clone(),
        config.recommendation_language.clone(),
    )?
    .with_clock(clock.clone());
    let movie_api_configured = provider.is_configured();

    let emotion_detector: Arc<dyn EmotionDetector> = match &config.emotion_service_url {
        Some(url) if !url.trim().is_empty() => {
            Arc::new(HttpEmotionDetector::new(url.trim().to_string(), timeout)?)
        }
        _ => Arc::new(NeutralEmotionDetector),
    };

    let identity = match config.supabase_credentials() {
        Some((url, key)) => {
            Some(Arc::new(SupabaseIdentity::new(url, key, timeout)?) as Arc<dyn IdentityProvider>)
        }
        None => None,
    };

    tracing::info!(
        movie_api_configured = movie_api_configured,
        emotion_detector = emotion_detector.name(),
        auth_configured = identity.is_some(),
        "Application state initialized"
    );

    Ok(AppState {
        catalog: MovieCatalog::new(store, Arc::new(provider), clock),
        emotion_detector,
        identity,
        movie_api_configured,
    })
}
