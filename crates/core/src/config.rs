//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Services never read environment variables while handling a
//! search or a detail request; binaries read the environment, parse it with the
//! `*_from_env_value` helpers below, and build one `ClientConfig`.

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_SUGGEST_DEBOUNCE_MS, DEFAULT_THRESHOLD, DETAIL_CACHE_CAPACITY,
    DETAIL_CACHE_TTL_SECS, DETAIL_MAX_PAGES, DETAIL_PAGE_SIZE, DISPLAY_PAGE_SIZE, MAX_SUGGEST_DEBOUNCE_MS, MIN_SUGGEST_DEBOUNCE_MS,
    RECOMMENDATION_COUNT, SEARCH_PAGE_SIZE, SUGGESTION_LIMIT, SUGGESTION_PAGE_SIZE,
};
use crate::{TerminologyError, TerminologyResult};
use std::time::Duration;

/// Client configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    api_base_url: String,
    search_page_size: u32,
    detail_page_size: u32,
    detail_max_pages: u32,
    suggestion_page_size: u32,
    suggestion_limit: usize,
    recommendation_count: usize,
    suggest_debounce: Duration,
    display_page_size: usize,
    default_threshold: f64,
    request_timeout: Option<Duration>,
    cache_capacity: u64,
    cache_ttl: Duration,
}

impl ClientConfig {
    /// Create a new `ClientConfig` for the given API base URL with default tuning.
    ///
    /// The URL must be absolute `http` or `https`. A trailing slash is removed so endpoint
    /// paths can be appended uniformly.
    pub fn new(api_base_url: &str) -> TerminologyResult<Self> {
        let trimmed = api_base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(TerminologyError::InvalidBaseUrl(
                "api_base_url cannot be empty".into(),
            ));
        }

        let parsed = reqwest::Url::parse(trimmed)
            .map_err(|e| TerminologyError::InvalidBaseUrl(format!("{trimmed}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(TerminologyError::InvalidBaseUrl(format!(
                "{trimmed}: scheme must be http or https"
            )));
        }

        Ok(Self {
            api_base_url: trimmed.to_string(),
            ..Self::default()
        })
    }

    pub fn with_suggest_debounce(mut self, debounce: Duration) -> Self {
        self.suggest_debounce = clamp_debounce(debounce);
        self
    }

    pub fn with_detail_max_pages(mut self, max_pages: u32) -> Self {
        self.detail_max_pages = max_pages.max(1);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_cache_bounds(mut self, capacity: u64, ttl: Duration) -> Self {
        self.cache_capacity = capacity.max(1);
        self.cache_ttl = ttl;
        self
    }

    pub fn with_display_page_size(mut self, page_size: usize) -> Self {
        self.display_page_size = page_size.max(1);
        self
    }

    pub fn with_search_page_size(mut self, page_size: u32) -> Self {
        self.search_page_size = page_size.max(1);
        self
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn search_page_size(&self) -> u32 {
        self.search_page_size
    }

    pub fn detail_page_size(&self) -> u32 {
        self.detail_page_size
    }

    pub fn detail_max_pages(&self) -> u32 {
        self.detail_max_pages
    }

    pub fn suggestion_page_size(&self) -> u32 {
        self.suggestion_page_size
    }

    pub fn suggestion_limit(&self) -> usize {
        self.suggestion_limit
    }

    pub fn recommendation_count(&self) -> usize {
        self.recommendation_count
    }

    pub fn suggest_debounce(&self) -> Duration {
        self.suggest_debounce
    }

    pub fn display_page_size(&self) -> usize {
        self.display_page_size
    }

    pub fn default_threshold(&self) -> f64 {
        self.default_threshold
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    pub fn cache_capacity(&self) -> u64 {
        self.cache_capacity
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            search_page_size: SEARCH_PAGE_SIZE,
            detail_page_size: DETAIL_PAGE_SIZE,
            detail_max_pages: DETAIL_MAX_PAGES,
            suggestion_page_size: SUGGESTION_PAGE_SIZE,
            suggestion_limit: SUGGESTION_LIMIT,
            recommendation_count: RECOMMENDATION_COUNT,
            suggest_debounce: Duration::from_millis(DEFAULT_SUGGEST_DEBOUNCE_MS),
            display_page_size: DISPLAY_PAGE_SIZE,
            default_threshold: DEFAULT_THRESHOLD,
            request_timeout: None,
            cache_capacity: DETAIL_CACHE_CAPACITY,
            cache_ttl: Duration::from_secs(DETAIL_CACHE_TTL_SECS),
        }
    }
}

fn clamp_debounce(debounce: Duration) -> Duration {
    debounce.clamp(
        Duration::from_millis(MIN_SUGGEST_DEBOUNCE_MS),
        Duration::from_millis(MAX_SUGGEST_DEBOUNCE_MS),
    )
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the suggestion debounce from an optional millisecond string.
///
/// If `value` is `None` or empty/whitespace, returns the default. Parsed values are
/// clamped to the supported 150–400 ms window.
pub fn debounce_from_env_value(value: Option<String>) -> TerminologyResult<Duration> {
    match non_blank(value) {
        None => Ok(Duration::from_millis(DEFAULT_SUGGEST_DEBOUNCE_MS)),
        Some(v) => {
            let ms = v.parse::<u64>().map_err(|_| {
                TerminologyError::InvalidInput(format!("debounce must be milliseconds, got {v}"))
            })?;
            Ok(clamp_debounce(Duration::from_millis(ms)))
        }
    }
}

/// Parse the detail aggregator's page bound from an optional string.
pub fn max_pages_from_env_value(value: Option<String>) -> TerminologyResult<u32> {
    match non_blank(value) {
        None => Ok(DETAIL_MAX_PAGES),
        Some(v) => match v.parse::<u32>() {
            Ok(0) | Err(_) => Err(TerminologyError::InvalidInput(format!(
                "detail max pages must be a positive integer, got {v}"
            ))),
            Ok(n) => Ok(n),
        },
    }
}

/// Parse an optional request timeout in seconds. Absent means no timeout.
pub fn timeout_from_env_value(value: Option<String>) -> TerminologyResult<Option<Duration>> {
    non_blank(value)
        .map(|v| {
            v.parse::<u64>().map(Duration::from_secs).map_err(|_| {
                TerminologyError::InvalidInput(format!("timeout must be seconds, got {v}"))
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_strips_trailing_slash() {
        let cfg = ClientConfig::new("https://api.example.org/v1/").unwrap();
        assert_eq!(cfg.api_base_url(), "https://api.example.org/v1");
    }

    #[test]
    fn new_rejects_empty_and_non_http_urls() {
        assert!(matches!(
            ClientConfig::new("  "),
            Err(TerminologyError::InvalidBaseUrl(_))
        ));
        assert!(matches!(
            ClientConfig::new("ftp://example.org"),
            Err(TerminologyError::InvalidBaseUrl(_))
        ));
        assert!(matches!(
            ClientConfig::new("not a url"),
            Err(TerminologyError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn debounce_defaults_and_clamps() {
        assert_eq!(
            debounce_from_env_value(None).unwrap(),
            Duration::from_millis(300)
        );
        assert_eq!(
            debounce_from_env_value(Some("50".into())).unwrap(),
            Duration::from_millis(150)
        );
        assert_eq!(
            debounce_from_env_value(Some("1000".into())).unwrap(),
            Duration::from_millis(400)
        );
        assert_eq!(
            debounce_from_env_value(Some(" 200 ".into())).unwrap(),
            Duration::from_millis(200)
        );
        assert!(debounce_from_env_value(Some("soon".into())).is_err());
    }

    #[test]
    fn max_pages_rejects_zero() {
        assert_eq!(max_pages_from_env_value(None).unwrap(), DETAIL_MAX_PAGES);
        assert_eq!(max_pages_from_env_value(Some("5".into())).unwrap(), 5);
        assert!(max_pages_from_env_value(Some("0".into())).is_err());
    }

    #[test]
    fn timeout_is_optional() {
        assert_eq!(timeout_from_env_value(None).unwrap(), None);
        assert_eq!(
            timeout_from_env_value(Some("30".into())).unwrap(),
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn cache_bounds_default_and_override() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.cache_capacity(), DETAIL_CACHE_CAPACITY);
        assert_eq!(cfg.cache_ttl(), Duration::from_secs(DETAIL_CACHE_TTL_SECS));

        let cfg = cfg.with_cache_bounds(0, Duration::from_secs(5));
        assert_eq!(cfg.cache_capacity(), 1);
        assert_eq!(cfg.cache_ttl(), Duration::from_secs(5));
    }

    #[test]
    fn builder_clamps_debounce() {
        let cfg = ClientConfig::default().with_suggest_debounce(Duration::from_millis(10));
        assert_eq!(cfg.suggest_debounce(), Duration::from_millis(150));
    }
}
