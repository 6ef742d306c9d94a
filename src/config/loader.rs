//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::RelayConfig;

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid environment override for {name}: {value}")]
    Env { name: &'static str, value: String },
}

/// Load configuration from an optional TOML file, then apply environment
/// overrides. A missing path yields the built-in defaults.
pub fn load_config(path: Option<&Path>) -> Result<RelayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => RelayConfig::default(),
    };

    apply_env_overrides(&mut config)?;

    Ok(config)
}

/// Apply environment overrides. `PORT` replaces the listener port while
/// keeping the configured interface.
fn apply_env_overrides(config: &mut RelayConfig) -> Result<(), ConfigError> {
    if let Ok(port) = std::env::var("PORT") {
        let port: u16 = port.parse().map_err(|_| ConfigError::Env {
            name: "PORT",
            value: port.clone(),
        })?;
        config.listener.bind_address = with_port(&config.listener.bind_address, port);
    }
    Ok(())
}

/// Replace the port of a `host:port` bind address.
fn with_port(bind_address: &str, port: u16) -> String {
    let host = bind_address
        .rsplit_once(':')
        .map(|(host, _)| host)
        .unwrap_or(bind_address);
    format!("{}:{}", host, port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let config: RelayConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:9000"
            "#,
        )
        .unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.forward.timeout_secs, 10);
        assert_eq!(config.limits.request_secs, 30);
    }

    #[test]
    fn test_with_port_keeps_interface() {
        assert_eq!(with_port("0.0.0.0:5000", 8080), "0.0.0.0:8080");
        assert_eq!(with_port("127.0.0.1:1234", 80), "127.0.0.1:80");
    }
}
