//! Configuration management for Docuchat
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files and environment variables.

use crate::error::{DocuchatError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for Docuchat
///
/// Holds everything needed to talk to the remote model gateway and to
/// shape the interactive chat session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Remote model gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Interactive chat configuration
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Remote model gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the remote API host
    ///
    /// Overridable so tests can point the gateway at a mock server.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Model identifier used for chat turns and token counting
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature for generation (kept low for document analysis)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum output tokens per response
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Timeout for individual HTTP requests (seconds)
    ///
    /// Uploads and streamed responses can be long-lived; this bounds each
    /// request, not the whole turn.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_output_tokens() -> u32 {
    8192
}

fn default_timeout() -> u64 {
    300
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            model: default_model(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Interactive chat configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Show per-turn token counts after each response
    #[serde(default = "default_show_token_counts")]
    pub show_token_counts: bool,
}

fn default_show_token_counts() -> bool {
    true
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            show_token_counts: default_show_token_counts(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| DocuchatError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| DocuchatError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(api_base) = std::env::var("DOCUCHAT_API_BASE") {
            self.gateway.api_base = api_base;
        }

        if let Ok(model) = std::env::var("DOCUCHAT_MODEL") {
            self.gateway.model = model;
        }

        if let Ok(timeout) = std::env::var("DOCUCHAT_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.gateway.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid DOCUCHAT_TIMEOUT_SECONDS: {}", timeout);
            }
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any field is out of range or malformed
    pub fn validate(&self) -> Result<()> {
        if self.gateway.model.trim().is_empty() {
            return Err(DocuchatError::Config("gateway.model must not be empty".to_string()).into());
        }

        if url::Url::parse(&self.gateway.api_base).is_err() {
            return Err(DocuchatError::Config(format!(
                "gateway.api_base is not a valid URL: {}",
                self.gateway.api_base
            ))
            .into());
        }

        if !(0.0..=2.0).contains(&self.gateway.temperature) {
            return Err(DocuchatError::Config(format!(
                "gateway.temperature must be between 0.0 and 2.0, got {}",
                self.gateway.temperature
            ))
            .into());
        }

        if self.gateway.max_output_tokens == 0 {
            return Err(
                DocuchatError::Config("gateway.max_output_tokens must be positive".to_string())
                    .into(),
            );
        }

        if self.gateway.timeout_seconds == 0 {
            return Err(
                DocuchatError::Config("gateway.timeout_seconds must be positive".to_string())
                    .into(),
            );
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_gateway_values() {
        let config = Config::default();
        assert_eq!(
            config.gateway.api_base,
            "https://generativelanguage.googleapis.com"
        );
        assert_eq!(config.gateway.model, "gemini-2.0-flash");
        assert!((config.gateway.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.gateway.max_output_tokens, 8192);
        assert_eq!(config.gateway.timeout_seconds, 300);
        assert!(config.chat.show_token_counts);
    }

    #[test]
    fn test_parse_yaml_config() {
        let yaml = r#"
gateway:
  api_base: "http://localhost:9001"
  model: "test-model"
  temperature: 0.5
  max_output_tokens: 1024
chat:
  show_token_counts: false
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.gateway.api_base, "http://localhost:9001");
        assert_eq!(config.gateway.model, "test-model");
        assert_eq!(config.gateway.max_output_tokens, 1024);
        assert!(!config.chat.show_token_counts);
        // Unspecified fields fall back to defaults
        assert_eq!(config.gateway.timeout_seconds, 300);
    }

    #[test]
    fn test_parse_partial_yaml_uses_defaults() {
        let yaml = r#"
gateway:
  model: "other-model"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.gateway.model, "other-model");
        assert_eq!(
            config.gateway.api_base,
            "https://generativelanguage.googleapis.com"
        );
    }

    #[test]
    fn test_validate_rejects_empty_model() {
        let mut config = Config::default();
        config.gateway.model = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_api_base() {
        let mut config = Config::default();
        config.gateway.api_base = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_temperature() {
        let mut config = Config::default();
        config.gateway.temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_max_output_tokens() {
        let mut config = Config::default();
        config.gateway.max_output_tokens = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_falls_back_to_defaults() {
        let config = Config::load("/nonexistent/docuchat-config.yaml").unwrap();
        assert_eq!(config.gateway.model, "gemini-2.0-flash");
    }
}
