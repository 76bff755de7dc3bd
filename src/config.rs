use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// SQLite connection URL for the response cache
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Movie search API base URL
    #[serde(default = "default_movie_api_url")]
    pub movie_api_url: String,

    /// RapidAPI key for the movie search API
    #[serde(default)]
    pub rapidapi_key: Option<String>,

    /// RapidAPI host header for the movie search API
    #[serde(default)]
    pub rapidapi_host: Option<String>,

    /// Upstream movie API request timeout in seconds
    #[serde(default = "default_provider_timeout_secs")]
    pub provider_timeout_secs: u64,

    /// Country of origin filter for genre recommendations
    #[serde(default = "default_recommendation_country")]
    pub recommendation_country: String,

    /// Spoken language filter for genre recommendations
    #[serde(default = "default_recommendation_language")]
    pub recommendation_language: String,

    /// Face/emotion classifier endpoint
    #[serde(default)]
    pub emotion_service_url: Option<String>,

    /// Supabase project URL
    #[serde(default)]
    pub supabase_url: Option<String>,

    /// Supabase anon key
    #[serde(default)]
    pub supabase_key: Option<String>,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_database_url() -> String {
    "sqlite://movie_cache.db".to_string()
}

fn default_movie_api_url() -> String {
    "https://imdb236.p.rapidapi.com".to_string()
}

fn default_provider_timeout_secs() -> u64 {
    10
}

fn default_recommendation_country() -> String {
    "IN".to_string()
}

fn default_recommendation_language() -> String {
    "hi".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_environment() -> String {
    "production".to_string()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// RapidAPI credentials, if both halves are set and non-empty
    pub fn rapidapi_credentials(&self) -> Option<(String, String)> {
        let key = non_empty(self.rapidapi_key.as_deref())?;
        let host = non_empty(self.rapidapi_host.as_deref())?;
        Some((key, host))
    }

    /// Supabase URL and key, if both halves are set and non-empty
    pub fn supabase_credentials(&self) -> Option<(String, String)> {
        let url = non_empty(self.supabase_url.as_deref())?;
        let key = non_empty(self.supabase_key.as_deref())?;
        Some((url, key))
    }

    /// Human-readable problems with the configuration that do not prevent startup
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.rapidapi_credentials().is_none() {
            warnings.push(
                "RAPIDAPI_KEY or RAPIDAPI_HOST not set, movie recommendations will be empty"
                    .to_string(),
            );
        }

        match self.supabase_credentials() {
            None => warnings.push(
                "SUPABASE_URL or SUPABASE_KEY not set, authentication is disabled".to_string(),
            ),
            Some((_, key)) if !key.starts_with("eyJ") => warnings.push(
                "SUPABASE_KEY does not look like a JWT, use the project's anon public key"
                    .to_string(),
            ),
            Some((_, key)) if key.len() > 500 => warnings.push(
                "SUPABASE_KEY looks like a service_role key, use the anon public key instead"
                    .to_string(),
            ),
            Some(_) => {}
        }

        warnings
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        envy::from_iter::<_, Config>(Vec::<(String, String)>::new()).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = base_config();
        assert_eq!(config.database_url, "sqlite://movie_cache.db");
        assert_eq!(config.provider_timeout_secs, 10);
        assert_eq!(config.port, 5000);
        assert!(!config.is_development());
        assert!(config.rapidapi_credentials().is_none());
    }

    #[test]
    fn test_blank_credentials_are_ignored() {
        let config = envy::from_iter::<_, Config>(vec![
            ("RAPIDAPI_KEY".to_string(), "  ".to_string()),
            ("RAPIDAPI_HOST".to_string(), "imdb236.p.rapidapi.com".to_string()),
        ])
        .unwrap();
        assert!(config.rapidapi_credentials().is_none());
    }

    #[test]
    fn test_warns_about_non_jwt_supabase_key() {
        let config = envy::from_iter::<_, Config>(vec![
            ("SUPABASE_URL".to_string(), "https://x.supabase.co".to_string()),
            ("SUPABASE_KEY".to_string(), "sb_secret_123".to_string()),
        ])
        .unwrap();
        let warnings = config.warnings();
        assert!(warnings.iter().any(|w| w.contains("JWT")));
    }
}
