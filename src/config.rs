use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_APP_NAME: &str = "Housing Alerts";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub app_name: String,
    pub auth: AuthConfig,
    /// JSON snapshot of all records; in-memory only when absent.
    pub data_file: Option<PathBuf>,
    pub fanout_queue_capacity: usize,
    pub retention_sweep_interval: std::time::Duration,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub key: String,
    pub token_ttl: time::Duration,
}

/// Optional TOML file layered under command-line flags and environment
/// variables.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub bind: Option<SocketAddr>,
    pub app_name: Option<String>,
    pub auth_key: Option<String>,
    pub auth_token_ttl: Option<String>,
    pub data_file: Option<PathBuf>,
    pub fanout_queue_capacity: Option<usize>,
    pub retention_sweep_interval: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }
}

#[cfg(test)]
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 0)),
            app_name: DEFAULT_APP_NAME.to_string(),
            auth: AuthConfig {
                key: "dGVzdC1zZWNyZXQ".to_string(),
                token_ttl: time::Duration::days(1),
            },
            data_file: None,
            fanout_queue_capacity: crate::alerts::worker::DEFAULT_QUEUE_CAPACITY,
            retention_sweep_interval: crate::notifications::retention::DEFAULT_SWEEP_INTERVAL,
        }
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;

    #[test]
    fn parse__should_read_known_keys() {
        // Given
        let contents = r#"
bind = "0.0.0.0:5000"
auth_key = "c2VjcmV0"
auth_token_ttl = "7d"
data_file = "/var/lib/housing/records.json"
fanout_queue_capacity = 16
"#;

        // When
        let config = FileConfig::parse(contents).expect("parse config");

        // Then
        assert_eq!(config.bind, Some(SocketAddr::from(([0, 0, 0, 0], 5000))));
        assert_eq!(config.auth_key.as_deref(), Some("c2VjcmV0"));
        assert_eq!(config.auth_token_ttl.as_deref(), Some("7d"));
        assert_eq!(
            config.data_file,
            Some(PathBuf::from("/var/lib/housing/records.json"))
        );
        assert_eq!(config.fanout_queue_capacity, Some(16));
        assert_eq!(config.retention_sweep_interval, None);
    }

    #[test]
    fn parse__should_reject_unknown_keys() {
        assert!(FileConfig::parse("port = 5000").is_err());
    }
}
