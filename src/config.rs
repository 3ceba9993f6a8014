//! Runtime configuration loaded from the environment.

use crate::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.thucchien.ai";
pub const DEFAULT_API_KEY_HEADER: &str = "x-goog-api-key";
pub const DEFAULT_DOWNLOAD_SOURCE_PREFIX: &str = "https://generativelanguage.googleapis.com/";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 300;

const API_KEY_VAR: &str = "AITHUCCHIEN_API_KEY";

/// Settings the gateway client needs for every request.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub api_key: String,
    pub base_url: String,
    /// Header carrying the key for the Gemini-style endpoints (speech, video).
    pub api_key_header: String,
    pub timeout: Duration,
}

impl GatewayConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key_header: DEFAULT_API_KEY_HEADER.to_string(),
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Fails when no usable credential is present.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::Configuration(format!("{} not set", API_KEY_VAR)));
        }
        Ok(())
    }

    /// Client-side endpoint that replaces the gateway-origin prefix of video URIs.
    pub fn download_prefix(&self) -> String {
        format!("{}/gemini/download/", self.base_url)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub download_source_prefix: String,
    pub poll_interval: Duration,
    pub max_polls: Option<u32>,
    pub poll_timeout: Option<Duration>,
    pub output_dir: PathBuf,
    pub prompt_log: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Audit log location, resolved without requiring a credential.
    pub fn prompt_log_from_env() -> PathBuf {
        dotenvy::dotenv().ok();
        prompt_log_path(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::Configuration(format!("{} not set", API_KEY_VAR)))?;

        let mut gateway = GatewayConfig::new(api_key).with_base_url(
            lookup("GATEWAY_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        );
        if let Some(header) = lookup("GATEWAY_API_KEY_HEADER") {
            gateway.api_key_header = header;
        }
        gateway.timeout = Duration::from_secs(
            parse_var(&lookup, "HTTP_TIMEOUT_SECS")?.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
        );

        Ok(Self {
            gateway,
            download_source_prefix: lookup("VIDEO_DOWNLOAD_SOURCE_PREFIX")
                .unwrap_or_else(|| DEFAULT_DOWNLOAD_SOURCE_PREFIX.to_string()),
            poll_interval: Duration::from_secs(
                parse_var(&lookup, "VIDEO_POLL_INTERVAL_SECS")?
                    .unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
            ),
            max_polls: parse_var(&lookup, "VIDEO_MAX_POLLS")?,
            poll_timeout: parse_var(&lookup, "VIDEO_POLL_TIMEOUT_SECS")?.map(Duration::from_secs),
            output_dir: PathBuf::from(lookup("OUTPUT_DIR").unwrap_or_else(|| "output".to_string())),
            prompt_log: prompt_log_path(&lookup),
        })
    }
}

pub fn prompt_log_path<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    PathBuf::from(lookup("PROMPT_LOG").unwrap_or_else(|| "prompt.log".to_string()))
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Configuration(format!("{} is not a valid number: {}", key, raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_only_api_key() {
        let config = Config::from_lookup(lookup_from(&[("AITHUCCHIEN_API_KEY", "secret")])).unwrap();

        assert_eq!(config.gateway.api_key, "secret");
        assert_eq!(config.gateway.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.gateway.api_key_header, "x-goog-api-key");
        assert_eq!(config.poll_interval, Duration::from_secs(10));
        assert_eq!(config.max_polls, None);
        assert_eq!(config.poll_timeout, None);
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert_eq!(config.prompt_log, PathBuf::from("prompt.log"));
        assert_eq!(
            config.gateway.download_prefix(),
            "https://api.thucchien.ai/gemini/download/"
        );
    }

    #[test]
    fn test_missing_api_key_is_configuration_error() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));

        let err = Config::from_lookup(lookup_from(&[("AITHUCCHIEN_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = Config::from_lookup(lookup_from(&[
            ("AITHUCCHIEN_API_KEY", "secret"),
            ("GATEWAY_BASE_URL", "http://localhost:9000/"),
            ("VIDEO_POLL_INTERVAL_SECS", "2"),
            ("VIDEO_MAX_POLLS", "30"),
            ("VIDEO_POLL_TIMEOUT_SECS", "600"),
            ("OUTPUT_DIR", "/tmp/out"),
        ]))
        .unwrap();

        assert_eq!(config.gateway.base_url, "http://localhost:9000");
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.max_polls, Some(30));
        assert_eq!(config.poll_timeout, Some(Duration::from_secs(600)));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            ("AITHUCCHIEN_API_KEY", "secret"),
            ("VIDEO_MAX_POLLS", "lots"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_prompt_log_resolves_without_api_key() {
        assert_eq!(
            prompt_log_path(lookup_from(&[("PROMPT_LOG", "/tmp/audit.jsonl")])),
            PathBuf::from("/tmp/audit.jsonl")
        );
        assert_eq!(prompt_log_path(lookup_from(&[])), PathBuf::from("prompt.log"));
    }
}
