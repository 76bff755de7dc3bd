use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};

use crate::{
    error::{AppError, AppResult},
    middleware::{make_span_with_request_id, no_cache_headers, request_id_middleware},
    services::{EmotionDetector, IdentityProvider, MovieCatalog},
};

pub mod auth;
pub mod emotion;
pub mod movies;

/// Uploaded photos may be larger than axum's 2 MB default
const MAX_IMAGE_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Shared dependencies handed to every handler
pub struct AppState {
    pub catalog: MovieCatalog,
    pub emotion_detector: Arc<dyn EmotionDetector>,
    /// `None` when no identity provider is configured
    pub identity: Option<Arc<dyn IdentityProvider>>,
    pub movie_api_configured: bool,
}

impl AppState {
    /// Identity provider, or a 503 when authentication is disabled
    pub fn identity(&self) -> AppResult<Arc<dyn IdentityProvider>> {
        self.identity.clone().ok_or_else(|| {
            AppError::Unavailable(
                "Authentication service is not available. Check SUPABASE_URL and SUPABASE_KEY."
                    .to_string(),
            )
        })
    }
}

/// Creates the application router with all routes and middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::hours(12)));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(session_layer)
        .layer(middleware::from_fn(no_cache_headers))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/emotion/detect",
            post(emotion::detect).layer(DefaultBodyLimit::max(MAX_IMAGE_UPLOAD_BYTES)),
        )
        .route("/movies/recommendations", get(movies::recommendations))
        .route("/movies/search", get(movies::search))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/resend-confirmation", post(auth::resend_confirmation))
        .route("/auth/me", get(auth::me))
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "movie_api_configured": state.movie_api_configured,
            "emotion_detector": state.emotion_detector.name(),
            "auth_configured": state.identity.is_some(),
        })),
    )
}
