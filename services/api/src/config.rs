//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub openai_api_key: Option<String>,
    /// Any OpenAI-compatible endpoint, e.g. a Gemini or local gateway.
    pub openai_base_url: Option<String>,
    pub summary_model: String,
    pub flashcard_model: String,
    pub chat_model: String,
    pub cors_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server Settings ---
        let bind_address_str =
            lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin =
            lookup("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());

        // --- Provider Settings ---
        let openai_api_key = lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty());
        let openai_base_url = lookup("OPENAI_BASE_URL").filter(|u| !u.trim().is_empty());

        let summary_model = lookup("SUMMARY_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let flashcard_model =
            lookup("FLASHCARD_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let chat_model = lookup("CHAT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Self {
            bind_address,
            log_level,
            openai_api_key,
            openai_base_url,
            summary_model,
            flashcard_model,
            chat_model,
            cors_origin,
        })
    }

    /// The API key is only required when the real adapters are built.
    pub fn require_openai_api_key(&self) -> Result<&str, ConfigError> {
        self.openai_api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingVar("OPENAI_API_KEY".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.bind_address.port(), 3000);
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.chat_model, "gpt-4o-mini");
        assert!(config.openai_base_url.is_none());
        assert!(matches!(
            config.require_openai_api_key(),
            Err(ConfigError::MissingVar(_))
        ));
    }

    #[test]
    fn test_invalid_bind_address() {
        let result = Config::from_lookup(lookup_from(&[("BIND_ADDRESS", "not-an-addr")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue(var, _)) if var == "BIND_ADDRESS"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:8080/v1"),
            ("FLASHCARD_MODEL", "gemini-2.5-flash"),
            ("RUST_LOG", "debug"),
        ]))
        .unwrap();
        assert_eq!(config.require_openai_api_key().unwrap(), "sk-test");
        assert_eq!(config.flashcard_model, "gemini-2.5-flash");
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(
            config.openai_base_url.as_deref(),
            Some("http://localhost:8080/v1")
        );
    }
}
