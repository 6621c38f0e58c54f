use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::palette::ColorPolicy;

pub const ENDPOINT_ENV: &str = "SOCKPAIR_ENDPOINT";
pub const DEFAULT_CONFIG_FILE: &str = "sockpair.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Analysis proxy URL.
    pub endpoint: String,
    pub timeout_secs: u64,
    pub color_policy: ColorPolicy,
    /// Width the photo is laid out at; the natural width when unset.
    pub display_width: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: sockpair_vision::DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 60,
            color_policy: ColorPolicy::default(),
            display_width: None,
        }
    }
}

impl Config {
    /// Reads a JSON config file, falling back to defaults when it does not
    /// exist, then applies the endpoint environment override.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config {}", path.display()))?
        } else {
            debug!("no config at {}, using defaults", path.display());
            Config::default()
        };
        config.apply_env(std::env::var(ENDPOINT_ENV).ok());
        Ok(config)
    }

    fn apply_env(&mut self, endpoint: Option<String>) {
        if let Some(endpoint) = endpoint.filter(|e| !e.trim().is_empty()) {
            self.endpoint = endpoint;
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.color_policy, ColorPolicy::Service);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"color_policy": "deterministic", "display_width": 480}}"#).unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.color_policy, ColorPolicy::Deterministic);
        assert_eq!(config.display_width, Some(480));
        assert_eq!(config.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_env_override() {
        let mut config = Config::default();
        config.apply_env(Some("https://socks.example/api".into()));
        assert_eq!(config.endpoint, "https://socks.example/api");
        config.apply_env(Some("  ".into()));
        assert_eq!(config.endpoint, "https://socks.example/api");
        config.apply_env(None);
        assert_eq!(config.endpoint, "https://socks.example/api");
    }
}
