use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse TOML from config file at {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("Failed to load config from environment: {0}")]
    Env(#[from] envy::Error),
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

#[derive(Deserialize, Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Prefix of every generated structure collection name.
    pub collection_prefix: String,
    pub parser_server_url: String,
    pub notify_timeout_secs: u64,
    pub max_upload_bytes: usize,
    pub log_dir: String,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
pub struct PartialServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database_url: Option<String>,
    #[serde(alias = "collection_name")]
    pub collection_prefix: Option<String>,
    pub parser_server_url: Option<String>,
    pub notify_timeout_secs: Option<u64>,
    pub max_upload_bytes: Option<usize>,
    pub log_dir: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const DEFAULT_PORT: u16 = 8000;

fn default_database_url() -> String {
    "sqlite://structures.db?mode=rwc".to_string()
}

fn default_collection_prefix() -> String {
    "CCSDS_Structure".to_string()
}

fn default_parser_server_url() -> String {
    "192.168.0.102:5000".to_string()
}

const DEFAULT_NOTIFY_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

fn default_log_dir() -> String {
    "logs".to_string()
}

impl PartialServerConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Reads the settings from the environment. The prefix is read from
    /// `COLLECTION_NAME`, the variable existing deployments already set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(envy::from_env::<PartialServerConfig>()?)
    }
}

impl ServerConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        // 1. Load from file (optional)
        let file_config = match config_path {
            Some(path_str) => PartialServerConfig::from_file(Path::new(path_str))?,
            None => PartialServerConfig::default(),
        };

        // 2. Load from environment variables
        let env_config = PartialServerConfig::from_env()?;

        // 3. Merge: environment overrides file
        Self::merge(env_config, file_config)
    }

    pub fn merge(
        env_config: PartialServerConfig,
        file_config: PartialServerConfig,
    ) -> Result<Self, ConfigError> {
        let config = ServerConfig {
            host: env_config.host.or(file_config.host).unwrap_or_else(default_host),
            port: env_config.port.or(file_config.port).unwrap_or(DEFAULT_PORT),
            database_url: env_config
                .database_url
                .or(file_config.database_url)
                .unwrap_or_else(default_database_url),
            collection_prefix: env_config
                .collection_prefix
                .or(file_config.collection_prefix)
                .unwrap_or_else(default_collection_prefix),
            parser_server_url: env_config
                .parser_server_url
                .or(file_config.parser_server_url)
                .unwrap_or_else(default_parser_server_url),
            notify_timeout_secs: env_config
                .notify_timeout_secs
                .or(file_config.notify_timeout_secs)
                .unwrap_or(DEFAULT_NOTIFY_TIMEOUT_SECS),
            max_upload_bytes: env_config
                .max_upload_bytes
                .or(file_config.max_upload_bytes)
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            log_dir: env_config.log_dir.or(file_config.log_dir).unwrap_or_else(default_log_dir),
        };

        if config.database_url.trim().is_empty() {
            return Err(ConfigError::Empty("DATABASE_URL"));
        }

        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config =
            ServerConfig::merge(PartialServerConfig::default(), PartialServerConfig::default())
                .unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.collection_prefix, "CCSDS_Structure");
        assert_eq!(config.parser_server_url, "192.168.0.102:5000");
        assert_eq!(config.notify_timeout_secs, 10);
        assert_eq!(config.max_upload_bytes, 20 * 1024 * 1024);
        assert_eq!(config.log_dir, "logs");
    }

    #[test]
    fn test_env_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "port = 9000\ncollection_prefix = \"FromFile\"\nparser_server_url = \"http://parser:5000\""
        )
        .unwrap();

        let file_config = PartialServerConfig::from_file(file.path()).unwrap();
        let env_config = PartialServerConfig {
            port: Some(8100),
            ..Default::default()
        };
        let config = ServerConfig::merge(env_config, file_config).unwrap();

        assert_eq!(config.port, 8100);
        assert_eq!(config.collection_prefix, "FromFile");
        assert_eq!(config.parser_server_url, "http://parser:5000");
    }

    #[test]
    fn test_collection_name_alias_in_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "collection_name = \"Legacy\"").unwrap();

        let file_config = PartialServerConfig::from_file(file.path()).unwrap();
        assert_eq!(file_config.collection_prefix.as_deref(), Some("Legacy"));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let partial = PartialServerConfig::from_file(&dir.path().join("absent.toml")).unwrap();
        assert!(partial.port.is_none());
    }

    #[test]
    fn test_malformed_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = \"not a number\"").unwrap();

        let result = PartialServerConfig::from_file(file.path());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_empty_database_url_is_rejected() {
        let env_config = PartialServerConfig {
            database_url: Some("  ".to_string()),
            ..Default::default()
        };
        let result = ServerConfig::merge(env_config, PartialServerConfig::default());
        assert!(matches!(result, Err(ConfigError::Empty("DATABASE_URL"))));
    }
}
