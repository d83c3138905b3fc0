use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use store_client::HttpOptions;

pub(crate) const DEFAULT_STORE_API_URL: &str = "http://127.0.0.1:8080";
const DEFAULT_NEWS_API_URL: &str = "https://openapi.naver.com";
const DEFAULT_BUSINESS_API_URL: &str = "https://api.odcloud.kr";
const DEFAULT_SESSION_FILE: &str = ".store_session.json";

#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub(crate) store_api_url: String,
    pub(crate) news_api_url: String,
    pub(crate) news_client_id: Option<String>,
    pub(crate) news_client_secret: Option<String>,
    pub(crate) business_api_url: String,
    pub(crate) business_service_key: Option<String>,
    pub(crate) session_file: String,
    pub(crate) http_timeout_secs: u64,
    pub(crate) http_connect_timeout_secs: u64,
    pub(crate) log_level: String,
}

impl Settings {
    pub(crate) fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get_or = |key: &str, default: &str| {
            get_optional(&lookup, key).unwrap_or_else(|| default.to_string())
        };

        let store_api_url = normalize_server(get_or("STORE_API_URL", DEFAULT_STORE_API_URL));
        let news_api_url = get_or("NEWS_API_URL", DEFAULT_NEWS_API_URL);
        let news_client_id = get_optional(&lookup, "NEWS_CLIENT_ID");
        let news_client_secret = get_optional(&lookup, "NEWS_CLIENT_SECRET");
        let business_api_url = get_or("BUSINESS_API_URL", DEFAULT_BUSINESS_API_URL);
        let business_service_key = get_optional(&lookup, "BUSINESS_SERVICE_KEY");
        let session_file = get_or("SESSION_FILE", DEFAULT_SESSION_FILE);
        let http_timeout_secs = parse_u64(&lookup, "HTTP_TIMEOUT_SECS", 15)?;
        let http_connect_timeout_secs = parse_u64(&lookup, "HTTP_CONNECT_TIMEOUT_SECS", 5)?;
        let log_level = get_optional(&lookup, "LOG_LEVEL")
            .or_else(|| get_optional(&lookup, "RUST_LOG"))
            .unwrap_or_else(|| "warn".to_string());

        Ok(Self {
            store_api_url,
            news_api_url,
            news_client_id,
            news_client_secret,
            business_api_url,
            business_service_key,
            session_file,
            http_timeout_secs,
            http_connect_timeout_secs,
            log_level,
        })
    }

    pub(crate) fn http_options(&self) -> HttpOptions {
        HttpOptions {
            connect_timeout: Duration::from_secs(self.http_connect_timeout_secs),
            timeout: Duration::from_secs(self.http_timeout_secs),
        }
    }
}

pub(crate) fn normalize_server(server: String) -> String {
    if server.starts_with("http://") || server.starts_with("https://") {
        return server;
    }

    format!("http://{server}")
}

fn get_optional(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<u64> {
    let value = match get_optional(lookup, key) {
        Some(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("Failed to parse {key}, expecting positive integer"))?,
        None => default,
    };

    if value == 0 {
        return Err(anyhow!("{key} must be > 0"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_env_is_empty() {
        let s = settings(&[]).expect("defaults are valid");
        assert_eq!(s.store_api_url, DEFAULT_STORE_API_URL);
        assert_eq!(s.session_file, DEFAULT_SESSION_FILE);
        assert_eq!(s.http_timeout_secs, 15);
        assert_eq!(s.log_level, "warn");
        assert!(s.news_client_id.is_none());
    }

    #[test]
    fn store_url_gets_scheme() {
        let s = settings(&[("STORE_API_URL", "10.0.2.2/app")]).expect("valid");
        assert_eq!(s.store_api_url, "http://10.0.2.2/app");
    }

    #[test]
    fn blank_keys_count_as_unset() {
        let s = settings(&[("BUSINESS_SERVICE_KEY", "   ")]).expect("valid");
        assert!(s.business_service_key.is_none());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(settings(&[("HTTP_TIMEOUT_SECS", "0")]).is_err());
        assert!(settings(&[("HTTP_CONNECT_TIMEOUT_SECS", "abc")]).is_err());
    }

    #[test]
    fn log_level_falls_back_to_rust_log() {
        let s = settings(&[("RUST_LOG", "debug")]).expect("valid");
        assert_eq!(s.log_level, "debug");
    }

    #[test]
    fn normalize_server_keeps_scheme() {
        let s = normalize_server("https://example.com:8080".to_string());
        assert_eq!(s, "https://example.com:8080");
    }
}
