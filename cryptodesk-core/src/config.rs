// SPDX-License-Identifier: MIT
//
// CryptoDesk: Validated Client for a Remote Cryptographic Service
// Copyright (c) 2025 CryptoDesk Contributors

//! Configuration management for the CryptoDesk client

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Base URL of the cryptographic service; `/api/...` paths are resolved against it
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables (`CRYPTODESK_BASE_URL`, ...)
    pub fn from_env() -> Result<Self> {
        let config: Self = envy::prefixed("CRYPTODESK_")
            .from_env()
            .map_err(|e| Error::Config(format!("Failed to parse environment variables: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&text).map_err(|e| {
            Error::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.base_url()?;

        if self.timeout_ms == 0 || self.timeout_ms > crate::MAX_TIMEOUT_MS {
            return Err(Error::Config(format!(
                "timeout_ms must be between 1 and {}",
                crate::MAX_TIMEOUT_MS
            )));
        }

        if self.user_agent.trim().is_empty() {
            return Err(Error::Config("user_agent cannot be empty".to_string()));
        }

        Ok(())
    }

    /// Parsed base URL; only http and https are accepted
    pub fn base_url(&self) -> Result<Url> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("Invalid base_url '{}': {}", self.base_url, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(Error::Config(format!(
                "base_url must use http or https, got '{}'",
                other
            ))),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// Default value functions
fn default_base_url() -> String {
    crate::DEFAULT_BASE_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    crate::DEFAULT_TIMEOUT_MS
}

fn default_user_agent() -> String {
    format!("cryptodesk/{}", crate::VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_config_validation() {
        let config = ClientConfig {
            base_url: "ftp://example.com".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = ClientConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ClientConfig {
            timeout_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_yaml_defaults() {
        let config: ClientConfig = serde_yaml::from_str("base_url: https://crypto.example.com/\n").unwrap();
        assert_eq!(config.base_url, "https://crypto.example.com/");
        assert_eq!(config.timeout_ms, crate::DEFAULT_TIMEOUT_MS);
        assert!(config.user_agent.starts_with("cryptodesk/"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("cryptodesk-config-{}.yaml", std::process::id()));
        std::fs::write(&path, "base_url: http://127.0.0.1:9000\ntimeout_ms: 5000\n").unwrap();
        let config = ClientConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(config.timeout(), Duration::from_secs(5));

        assert!(matches!(
            ClientConfig::from_file("/nonexistent/cryptodesk.yaml"),
            Err(Error::Io(_))
        ));
    }
}
