use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod emotion;
pub mod user;

pub use emotion::{Emotion, Genre};
pub use user::{AuthenticatedUser, Credentials, SignUpOutcome};

/// Longest description returned to clients, in characters
pub const MAX_DESCRIPTION_CHARS: usize = 100;

const ELLIPSIS: &str = "...";
const MISSING_DESCRIPTION: &str = "No description available.";
const TRAILER_SEARCH_URL: &str = "https://www.youtube.com/results?search_query=";

/// What to ask the movie provider for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovieQuery {
    /// Highly rated movies of one genre, newest first
    TopRatedByGenre(Genre),
    /// Title autocomplete for a free-text query
    TitleAutocomplete(String),
}

impl Display for MovieQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MovieQuery::TopRatedByGenre(genre) => write!(f, "genre={}", genre),
            MovieQuery::TitleAutocomplete(query) => write!(f, "autocomplete={}", query),
        }
    }
}

/// A movie ready to be shown to the client and stored in the cache
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MovieRecord {
    pub primary_title: String,
    pub description: String,
    pub primary_image: String,
    pub trailer_url: String,
}

// ============================================================================
// Movie API Types
// ============================================================================

/// Raw search response from the movie API
///
/// `results` is kept as loose JSON so one malformed entry does not reject the page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiSearchResponse {
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
}

impl ApiSearchResponse {
    /// Entries that parse as movie objects, in provider order
    pub fn into_movies(self) -> Vec<ApiMovie> {
        self.results
            .into_iter()
            .filter_map(|value| serde_json::from_value::<ApiMovie>(value).ok())
            .collect()
    }
}

/// Raw movie entry from the movie API
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiMovie {
    #[serde(default)]
    pub primary_title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub primary_image: Option<String>,
    #[serde(default)]
    pub trailer_url: Option<String>,
}

impl ApiMovie {
    /// Converts the raw entry into a display-ready record
    ///
    /// Returns `None` when the title or poster image is missing.
    pub fn into_record(self) -> Option<MovieRecord> {
        let primary_title = present(self.primary_title)?;
        let primary_image = present(self.primary_image)?;

        let description = present(self.description)
            .map(|d| truncate_description(&d))
            .unwrap_or_else(|| MISSING_DESCRIPTION.to_string());

        let trailer_url =
            present(self.trailer_url).unwrap_or_else(|| trailer_search_url(&primary_title));

        Some(MovieRecord {
            primary_title,
            description,
            primary_image,
            trailer_url,
        })
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Shortens descriptions over the limit to 97 characters plus an ellipsis
pub fn truncate_description(description: &str) -> String {
    if description.chars().count() <= MAX_DESCRIPTION_CHARS {
        return description.to_string();
    }

    let keep = MAX_DESCRIPTION_CHARS - ELLIPSIS.len();
    let mut truncated: String = description.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

/// Video search link used when the provider has no trailer for a title
pub fn trailer_search_url(title: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(title.as_bytes()).collect();
    format!("{}{}+trailer", TRAILER_SEARCH_URL, encoded)
}

/// Normalizes a provider page, keeping provider order and duplicates
pub fn normalize_movies(movies: Vec<ApiMovie>) -> Vec<MovieRecord> {
    movies.into_iter().filter_map(ApiMovie::into_record).collect()
}
