//! Browser configuration types

use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::storage::StorageError;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Connection settings for the grabarr API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Base URL of the grabarr backend (without the `/api` prefix)
    pub api_base_url: String,
    /// Sent as `x-api-key`
    pub api_key: Option<String>,
    /// Sent as `Authorization: Bearer`, only when no API key is set
    pub bearer_token: Option<String>,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: None,
            bearer_token: None,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

impl BrowserConfig {
    /// Apply `GRABARR_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("GRABARR_API_URL").filter(|v| !v.is_empty()) {
            self.api_base_url = url;
        }
        if let Some(key) = lookup("GRABARR_API_KEY").filter(|v| !v.is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(token) = lookup("GRABARR_API_TOKEN").filter(|v| !v.is_empty()) {
            self.bearer_token = Some(token);
        }
        if let Some(timeout) = lookup("GRABARR_REQUEST_TIMEOUT") {
            match timeout.parse::<u64>() {
                Ok(secs) if secs > 0 => self.request_timeout_secs = secs,
                _ => tracing::warn!("Ignoring invalid GRABARR_REQUEST_TIMEOUT: {:?}", timeout),
            }
        }
    }

    /// The base URL must parse as an absolute `http(s)` URL with a host.
    pub fn validate(&self) -> Result<(), StorageError> {
        let invalid = || StorageError::InvalidUrl(self.api_base_url.clone());
        let url = Url::parse(self.api_base_url.trim()).map_err(|_| invalid())?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(invalid());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("GRABARR_API_URL", "https://grabarr.example.net"),
            ("GRABARR_API_KEY", "secret"),
            ("GRABARR_REQUEST_TIMEOUT", "5"),
        ]
        .into_iter()
        .collect();

        let mut config = BrowserConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.api_base_url, "https://grabarr.example.net");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.bearer_token, None);
        assert_eq!(config.request_timeout_secs, 5);
    }

    #[test]
    fn test_invalid_timeout_override_is_ignored() {
        let mut config = BrowserConfig::default();
        config.apply_overrides(|k| (k == "GRABARR_REQUEST_TIMEOUT").then(|| "0".to_string()));
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_validate() {
        assert!(BrowserConfig::default().validate().is_ok());

        let config = BrowserConfig {
            api_base_url: "localhost:8000".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(StorageError::InvalidUrl(_))));

        for bad in ["http://exa mple.com", "http://", "ftp://grabarr.local", "https://[::1"] {
            let config = BrowserConfig {
                api_base_url: bad.to_string(),
                ..Default::default()
            };
            assert!(
                matches!(config.validate(), Err(StorageError::InvalidUrl(_))),
                "{} accepted",
                bad
            );
        }

        let config = BrowserConfig {
            api_base_url: "https://grabarr.example.net/prefix/".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: BrowserConfig = serde_json::from_str(r#"{"api_key":"abc"}"#).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.api_key.as_deref(), Some("abc"));
        assert_eq!(config.connect_timeout_secs, 10);
    }
}
