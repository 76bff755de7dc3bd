use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    middleware::RequestId,
    models::{Genre, MovieRecord},
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    #[serde(default = "default_emotion")]
    emotion: String,
}

fn default_emotion() -> String {
    "happy".to_string()
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    query: String,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub emotion: String,
    pub genre: Genre,
    pub movies: Vec<MovieRecord>,
}

#[derive(Debug, Serialize)]
pub struct MoviesResponse {
    pub movies: Vec<MovieRecord>,
}

/// Genre-matched recommendations for an emotion label
///
/// Always succeeds; upstream trouble shows up as an empty list and in the logs.
pub async fn recommendations(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<RecommendationQuery>,
) -> Json<RecommendationResponse> {
    let (genre, resolution) = state.catalog.recommend_for_emotion(&params.emotion).await;

    tracing::info!(
        request_id = %request_id,
        emotion = %params.emotion,
        genre = %genre,
        source = ?resolution.source,
        results = resolution.movies.len(),
        "Recommendations served"
    );

    Json(RecommendationResponse {
        emotion: params.emotion,
        genre,
        movies: resolution.movies,
    })
}

/// Free-text movie search
pub async fn search(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<SearchQuery>,
) -> Json<MoviesResponse> {
    let resolution = state.catalog.search(&params.query).await;

    tracing::info!(
        request_id = %request_id,
        query = %params.query.trim(),
        source = ?resolution.source,
        results = resolution.movies.len(),
        "Search served"
    );

    Json(MoviesResponse {
        movies: resolution.movies,
    })
}
