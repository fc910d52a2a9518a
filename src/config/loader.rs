//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::StaticConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<StaticConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<StaticConfig, ConfigError> {
    let config: StaticConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogFormat;

    #[test]
    fn test_empty_file_yields_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.aggregator.channel_capacity, 1);
        assert!(config.providers.internal.enabled);
        assert!(config.providers.file.is_none());
        assert!(config.providers.http.is_empty());
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_full_config() {
        let config = parse_config(
            r#"
            [aggregator]
            channel_capacity = 8

            [observability]
            log_level = "debug"
            log_format = "json"

            [providers.internal]
            [[providers.internal.routes]]
            name = "ping"
            path_prefix = "/ping"
            backend_group = "internal"

            [[providers.internal.backends]]
            name = "ping-1"
            group = "internal"
            address = "127.0.0.1:8082"

            [providers.file]
            path = "/etc/aggregator/dynamic.toml"

            [[providers.http]]
            name = "catalog"
            endpoint = "http://catalog.local/config"
            poll_interval_secs = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.aggregator.channel_capacity, 8);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.providers.internal.routes[0].name, "ping");
        assert_eq!(config.providers.internal.backends[0].weight, 1);
        let file = config.providers.file.unwrap();
        assert!(file.watch);
        let http = &config.providers.http[0];
        assert_eq!(http.name, "catalog");
        assert_eq!(http.poll_interval_secs, 10);
        assert_eq!(http.poll_timeout_secs, 5);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let err = parse_config("[aggregator]\nchannel_capacity = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("channel_capacity"));
    }

    #[test]
    fn test_syntax_error_is_parse_error() {
        let err = parse_config("[aggregator\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
