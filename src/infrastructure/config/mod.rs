use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::error::{AppError, Result};

/// Service configuration, merged from defaults, `wellbase.toml`, and
/// `WELLBASE_*` environment variables (env wins).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub bind_address: String,
    pub port: u16,
    /// Optional external structured LIS/DLIS parser command. When
    /// unset, log previews rely on the heuristic extractor alone.
    pub log_parser_cmd: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data/wellbase.db"),
            bind_address: "127.0.0.1".to_string(),
            port: 3001,
            log_parser_cmd: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file("wellbase.toml"))
            .merge(Env::prefixed("WELLBASE_"))
            .extract()
            .map_err(|e| AppError::ValidationError(format!("Invalid configuration: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.port, 3001);
        assert!(config.log_parser_cmd.is_none());
    }
}
