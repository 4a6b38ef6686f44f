//! Backend location and client timings.
//!
//! The only externally supplied setting is the API base URL, read from
//! `TRANSCODE_API_BASE_URL`. Everything else uses fixed defaults.

use std::sync::OnceLock;
use std::time::Duration;

pub const BASE_URL_ENV: &str = "TRANSCODE_API_BASE_URL";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

static CONFIG: OnceLock<ApiConfig> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Whole-request limit for the JSON endpoints
    pub request_timeout: Duration,
    /// Whole-request limit for the storage PUT, `None` for no limit
    pub upload_timeout: Option<Duration>,
    pub poll_interval: Duration,
    pub poll_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            upload_timeout: None,
            poll_interval: Duration::from_secs(5),
            poll_timeout: Duration::from_secs(5 * 60),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let raw = std::env::var(BASE_URL_ENV).ok();
        Self::with_base_url(raw.as_deref())
    }

    pub fn with_base_url(raw: Option<&str>) -> Self {
        Self {
            base_url: normalize_base(raw),
            ..Default::default()
        }
    }
}

/// Turn a user supplied host into a usable base URL.
///
/// Blank input falls back to the local development server, a bare host is
/// assumed to be served over https, and one trailing slash is dropped.
pub fn normalize_base(raw: Option<&str>) -> String {
    let trimmed = match raw.map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => return DEFAULT_BASE_URL.to_string(),
    };

    let lower = trimmed.to_ascii_lowercase();
    let with_scheme = if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    match with_scheme.strip_suffix('/') {
        Some(stripped) => stripped.to_string(),
        None => with_scheme,
    }
}

pub fn get_config() -> ApiConfig {
    CONFIG.get_or_init(ApiConfig::from_env).clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_base_falls_back_to_localhost() {
        assert_eq!(normalize_base(None), "http://localhost:8080");
        assert_eq!(normalize_base(Some("   ")), "http://localhost:8080");
    }

    #[test]
    fn test_bare_host_gets_https() {
        assert_eq!(normalize_base(Some("api.example.com")), "https://api.example.com");
        assert_eq!(normalize_base(Some(" api.example.com/ ")), "https://api.example.com");
    }

    #[test]
    fn test_existing_scheme_is_kept() {
        assert_eq!(normalize_base(Some("http://10.0.0.2:8080/")), "http://10.0.0.2:8080");
        assert_eq!(normalize_base(Some("HTTPS://Api.Example.com")), "HTTPS://Api.Example.com");
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::with_base_url(Some("example.com"));
        assert_eq!(config.base_url, "https://example.com");
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.poll_timeout, Duration::from_secs(300));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.upload_timeout.is_none());
    }
}
