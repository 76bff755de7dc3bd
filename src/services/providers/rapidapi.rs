/// IMDb search API provider (via RapidAPI)
///
/// A single search endpoint serves both use cases; only the query parameters differ:
/// 1. Genre recommendations: top-rated movies of one genre, newest first
/// 2. Title search: autocomplete on the primary title
use crate::{
    clock::{Clock, SystemClock},
    error::{AppError, AppResult},
    models::{ApiMovie, ApiSearchResponse, Genre, MovieQuery},
    services::providers::MovieProvider,
};
use chrono::Datelike;
use reqwest::Client as HttpClient;
use std::sync::Arc;
use std::time::Duration;

const SEARCH_PATH: &str = "/api/imdb/search";
const GENRE_ROWS: &str = "100";
const AUTOCOMPLETE_ROWS: &str = "25";
const EARLIEST_RELEASE_YEAR: &str = "1970";

#[derive(Clone)]
pub struct RapidApiImdbProvider {
    http_client: HttpClient,
    api_url: String,
    /// (api key, api host); `None` when the provider is not configured
    credentials: Option<(String, String)>,
    country: String,
    language: String,
    /// Supplies the current year for the release-year filter
    clock: Arc<dyn Clock>,
}

impl RapidApiImdbProvider {
    pub fn new(
        api_url: String,
        credentials: Option<(String, String)>,
        timeout: Duration,
        country: String,
        language: String,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
            credentials,
            country,
            language,
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    /// Query string for a provider query
    fn query_params(&self, query: &MovieQuery) -> Vec<(&'static str, String)> {
        match query {
            MovieQuery::TopRatedByGenre(genre) => self.genre_params(*genre),
            MovieQuery::TitleAutocomplete(text) => vec![
                ("primaryTitleAutocomplete", text.clone()),
                ("type", "movie".to_string()),
                ("rows", AUTOCOMPLETE_ROWS.to_string()),
                ("sortOrder", "ASC".to_string()),
                ("sortField", "id".to_string()),
            ],
        }
    }

    fn genre_params(&self, genre: Genre) -> Vec<(&'static str, String)> {
        let current_year = self.clock.now().year();

        vec![
            ("type", "movie".to_string()),
            ("genre", genre.to_string()),
            ("rows", GENRE_ROWS.to_string()),
            ("sortField", "startYear".to_string()),
            ("sortOrder", "DESC".to_string()),
            ("countriesOfOrigin", self.country.clone()),
            ("spokenLanguages", self.language.clone()),
            ("averageRatingFrom", "7".to_string()),
            ("averageRatingTo", "10".to_string()),
            ("numVotesFrom", "1000".to_string()),
            ("numVotesTo", "1000000".to_string()),
            ("startYearFrom", EARLIEST_RELEASE_YEAR.to_string()),
            ("startYearTo", current_year.to_string()),
        ]
    }
}

#[async_trait::async_trait]
impl MovieProvider for RapidApiImdbProvider {
    async fn fetch(&self, query: &MovieQuery) -> AppResult<Vec<ApiMovie>> {
        let (api_key, api_host) = self.credentials.as_ref().ok_or_else(|| {
            AppError::ExternalApi("RAPIDAPI_KEY or RAPIDAPI_HOST not configured".to_string())
        })?;

        let url = format!("{}{}", self.api_url, SEARCH_PATH);
        let response = self
            .http_client
            .get(&url)
            .header("x-rapidapi-key", api_key)
            .header("x-rapidapi-host", api_host)
            .query(&self.query_params(query))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Movie API returned status {}: {}",
                status, body
            )));
        }

        let response_text = response.text().await?;
        let page: ApiSearchResponse = serde_json::from_str(&response_text).map_err(|e| {
            tracing::debug!(response = %response_text, "Raw movie API response");
            AppError::ExternalApi(format!("Failed to parse movie API response: {}", e))
        })?;
        let movies = page.into_movies();

        tracing::info!(
            query = %query,
            results = movies.len(),
            provider = self.name(),
            "Movie search completed"
        );

        Ok(movies)
    }

    fn name(&self) -> &'static str {
        "rapidapi_imdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{HeaderMap, StatusCode},
        routing::get,
        Json, Router,
    };
    use crate::clock::ManualClock;
    use chrono::{TimeZone, Utc};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    fn create_test_provider(api_url: &str, configured: bool) -> RapidApiImdbProvider {
        let credentials =
            configured.then(|| ("test_key".to_string(), "imdb236.p.rapidapi.com".to_string()));
        RapidApiImdbProvider::new(
            api_url.to_string(),
            credentials,
            Duration::from_secs(2),
            "IN".to_string(),
            "hi".to_string(),
        )
        .unwrap()
    }

    /// Serves `router` on an ephemeral port and returns its base URL
    async fn spawn_upstream(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn param<'a>(params: &'a [(&'static str, String)], name: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_genre_query_params() {
        let provider = create_test_provider("http://test.local", true);
        let params = provider.query_params(&MovieQuery::TopRatedByGenre(Genre::Horror));

        assert_eq!(param(&params, "genre"), Some("Horror"));
        assert_eq!(param(&params, "rows"), Some("100"));
        assert_eq!(param(&params, "sortField"), Some("startYear"));
        assert_eq!(param(&params, "sortOrder"), Some("DESC"));
        assert_eq!(param(&params, "countriesOfOrigin"), Some("IN"));
        assert_eq!(param(&params, "spokenLanguages"), Some("hi"));
        assert_eq!(param(&params, "averageRatingFrom"), Some("7"));
        assert_eq!(param(&params, "primaryTitleAutocomplete"), None);
    }

    #[test]
    fn test_release_year_range_follows_clock() {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2031, 3, 15, 8, 0, 0).unwrap(),
        ));
        let provider = create_test_provider("http://test.local", true).with_clock(clock);
        let params = provider.query_params(&MovieQuery::TopRatedByGenre(Genre::Drama));

        assert_eq!(param(&params, "startYearFrom"), Some("1970"));
        assert_eq!(param(&params, "startYearTo"), Some("2031"));
    }

    #[test]
    fn test_autocomplete_query_params() {
        let provider = create_test_provider("http://test.local", true);
        let params =
            provider.query_params(&MovieQuery::TitleAutocomplete("3 Idiots".to_string()));

        assert_eq!(param(&params, "primaryTitleAutocomplete"), Some("3 Idiots"));
        assert_eq!(param(&params, "rows"), Some("25"));
        assert_eq!(param(&params, "sortOrder"), Some("ASC"));
        assert_eq!(param(&params, "sortField"), Some("id"));
        assert_eq!(param(&params, "genre"), None);
    }

    #[tokio::test]
    async fn test_unconfigured_provider_fails() {
        let provider = create_test_provider("http://test.local", false);
        assert!(!provider.is_configured());

        let result = provider
            .fetch(&MovieQuery::TopRatedByGenre(Genre::Comedy))
            .await;
        assert!(matches!(result, Err(AppError::ExternalApi(_))));
    }

    #[tokio::test]
    async fn test_fetch_sends_credentials_and_parses_results() {
        let router = Router::new().route(
            SEARCH_PATH,
            get(
                |headers: HeaderMap,
                 axum::extract::Query(params): axum::extract::Query<HashMap<String, String>>| async move {
                    assert_eq!(headers["x-rapidapi-key"], "test_key");
                    assert_eq!(headers["x-rapidapi-host"], "imdb236.p.rapidapi.com");
                    let title = params
                        .get("primaryTitleAutocomplete")
                        .cloned()
                        .unwrap_or_default();
                    Json(json!({
                        "results": [
                            {"primaryTitle": title, "primaryImage": "https://img/1.jpg"},
                            "not a movie",
                            {"primaryTitle": "Second", "description": null}
                        ]
                    }))
                },
            ),
        );
        let base_url = spawn_upstream(router).await;
        let provider = create_test_provider(&base_url, true);

        let movies = provider
            .fetch(&MovieQuery::TitleAutocomplete("Swades".to_string()))
            .await
            .unwrap();

        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0].primary_title.as_deref(), Some("Swades"));
        assert_eq!(movies[1].primary_image, None);
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let router = Router::new().route(
            SEARCH_PATH,
            get(|| async { (StatusCode::TOO_MANY_REQUESTS, "quota exceeded") }),
        );
        let base_url = spawn_upstream(router).await;
        let provider = create_test_provider(&base_url, true);

        let result = provider
            .fetch(&MovieQuery::TopRatedByGenre(Genre::Drama))
            .await;
        assert!(matches!(result, Err(AppError::ExternalApi(msg)) if msg.contains("429")));
    }

    #[tokio::test]
    async fn test_malformed_body_is_an_error() {
        let router = Router::new().route(SEARCH_PATH, get(|| async { "<html>oops</html>" }));
        let base_url = spawn_upstream(router).await;
        let provider = create_test_provider(&base_url, true);

        let result = provider
            .fetch(&MovieQuery::TopRatedByGenre(Genre::Drama))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_empty_results_are_ok() {
        let router = Router::new().route(
            SEARCH_PATH,
            get(|| async { Json::<Value>(json!({ "results": [] })) }),
        );
        let base_url = spawn_upstream(router).await;
        let provider = create_test_provider(&base_url, true);

        let movies = provider
            .fetch(&MovieQuery::TopRatedByGenre(Genre::Action))
            .await
            .unwrap();
        assert!(movies.is_empty());
    }
}
