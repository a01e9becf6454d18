use anyhow::{Context, Result};
use std::time::Duration;

/// Quiet period before a search/sort change triggers a re-fetch
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 500;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    // Phrase API
    pub api_url: String,
    pub request_timeout: Duration,

    // List view
    pub search_debounce: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api_url: std::env::var("PHRASE_API_URL")
                .context("PHRASE_API_URL not set")?
                .trim_end_matches('/')
                .to_string(),
            request_timeout: Duration::from_secs(
                std::env::var("REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            search_debounce: Duration::from_millis(
                std::env::var("SEARCH_DEBOUNCE_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_SEARCH_DEBOUNCE_MS),
            ),
        })
    }

    /// Config pointing at the given API with default timings
    pub fn for_api(api_url: &str) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        std::env::remove_var("PHRASE_API_URL");
        std::env::remove_var("REQUEST_TIMEOUT_SECS");
        std::env::remove_var("SEARCH_DEBOUNCE_MS");
    }

    #[test]
    #[serial]
    fn test_from_env_requires_api_url() {
        clear_env();

        let result = Config::from_env();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("PHRASE_API_URL"));
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        std::env::set_var("PHRASE_API_URL", "http://localhost:3000/api/");

        let config = Config::from_env().expect("Should load");
        assert_eq!(config.api_url, "http://localhost:3000/api");
        assert_eq!(config.search_debounce, Duration::from_millis(500));
        assert_eq!(config.request_timeout, Duration::from_secs(30));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        std::env::set_var("PHRASE_API_URL", "http://api.example.com");
        std::env::set_var("SEARCH_DEBOUNCE_MS", "250");
        std::env::set_var("REQUEST_TIMEOUT_SECS", "5");

        let config = Config::from_env().expect("Should load");
        assert_eq!(config.search_debounce, Duration::from_millis(250));
        assert_eq!(config.request_timeout, Duration::from_secs(5));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_ignores_unparseable_numbers() {
        clear_env();
        std::env::set_var("PHRASE_API_URL", "http://api.example.com");
        std::env::set_var("SEARCH_DEBOUNCE_MS", "soon");

        let config = Config::from_env().expect("Should load");
        assert_eq!(config.search_debounce, Duration::from_millis(500));

        clear_env();
    }

    #[test]
    fn test_for_api_strips_trailing_slash() {
        let config = Config::for_api("http://127.0.0.1:9999/");
        assert_eq!(config.api_url, "http://127.0.0.1:9999");
    }
}
