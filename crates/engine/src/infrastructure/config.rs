//! Engine configuration read from the environment.
//!
//! Variables (defaults in parentheses):
//! - `SERVER_HOST` (`0.0.0.0`), `SERVER_PORT` or `PORT` (`3000`)
//! - `MAX_DICE_POOL` (`8`), `MAX_NUM_ROLLS` (`100`)
//! - `MAX_INJURY_TALLY` (`4096`)
//! - `RESULT_CACHE_TTL_SECONDS` (`300`, `0` disables caching)
//! - `RESULT_CACHE_MAX_ENTRIES` (`1024`)
//! - `INJURY_TABLE_PATH` (unset: built-in Trench Crusade table)
//! - `CORS_ALLOWED_ORIGINS` (unset: no CORS layer)

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use trenchodds_domain::{DomainError, EngineLimits, InjuryTable};

const DEFAULT_SERVER_HOST: &str = "0.0.0.0";
const DEFAULT_SERVER_PORT: u16 = 3000;
const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;
const DEFAULT_CACHE_MAX_ENTRIES: usize = 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got '{value}'")]
    InvalidValue {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("Invalid engine limits: {0}")]
    Limits(#[source] DomainError),
    #[error("Failed to read injury table {path}: {source}")]
    InjuryTableIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Injury table {path} is not valid JSON: {source}")]
    InjuryTableFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Injury table {path} is invalid: {source}")]
    InjuryTableInvalid {
        path: PathBuf,
        #[source]
        source: DomainError,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub server_host: String,
    pub server_port: u16,
    pub limits: EngineLimits,
    /// `None` when result caching is disabled
    pub cache_ttl: Option<Duration>,
    pub cache_max_entries: usize,
    pub injury_table: InjuryTable,
    pub cors_allowed_origins: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            server_host: DEFAULT_SERVER_HOST.to_string(),
            server_port: DEFAULT_SERVER_PORT,
            limits: EngineLimits::default(),
            cache_ttl: Some(Duration::from_secs(DEFAULT_CACHE_TTL_SECONDS)),
            cache_max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            injury_table: InjuryTable::default(),
            cors_allowed_origins: None,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = EngineLimits::default();

        let server_host = var("SERVER_HOST").unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string());
        let server_port = match var("SERVER_PORT").or_else(|| var("PORT")) {
            Some(value) => parse_value("SERVER_PORT", value, "a port number")?,
            None => DEFAULT_SERVER_PORT,
        };

        let max_pool_size = match var("MAX_DICE_POOL") {
            Some(value) => parse_value("MAX_DICE_POOL", value, "a positive integer")?,
            None => defaults.max_pool_size,
        };
        let max_num_rolls = match var("MAX_NUM_ROLLS") {
            Some(value) => parse_value("MAX_NUM_ROLLS", value, "a positive integer")?,
            None => defaults.max_num_rolls,
        };
        let max_injury_tally = match var("MAX_INJURY_TALLY") {
            Some(value) => parse_value("MAX_INJURY_TALLY", value, "a positive integer")?,
            None => defaults.max_injury_tally,
        };
        let limits = EngineLimits::new(max_pool_size, max_num_rolls)
            .and_then(|limits| limits.with_max_injury_tally(max_injury_tally))
            .map_err(ConfigError::Limits)?;

        let ttl_seconds: u64 = match var("RESULT_CACHE_TTL_SECONDS") {
            Some(value) => parse_value("RESULT_CACHE_TTL_SECONDS", value, "a number of seconds")?,
            None => DEFAULT_CACHE_TTL_SECONDS,
        };
        let cache_ttl = (ttl_seconds > 0).then_some(Duration::from_secs(ttl_seconds));
        let cache_max_entries: usize = match var("RESULT_CACHE_MAX_ENTRIES") {
            Some(value) => parse_value("RESULT_CACHE_MAX_ENTRIES", value, "a positive integer")?,
            None => DEFAULT_CACHE_MAX_ENTRIES,
        };
        if cache_max_entries == 0 {
            return Err(ConfigError::InvalidValue {
                var: "RESULT_CACHE_MAX_ENTRIES",
                value: "0".to_string(),
                expected: "a positive integer",
            });
        }

        let injury_table = match var("INJURY_TABLE_PATH") {
            Some(path) => load_injury_table(Path::new(&path))?,
            None => InjuryTable::default(),
        };

        Ok(Self {
            server_host,
            server_port,
            limits,
            cache_ttl,
            cache_max_entries,
            injury_table,
            cors_allowed_origins: var("CORS_ALLOWED_ORIGINS"),
        })
    }
}

fn parse_value<T: FromStr>(
    var: &'static str,
    value: String,
    expected: &'static str,
) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            var,
            value,
            expected,
        })
}

/// Read and validate a JSON injury table.
pub fn load_injury_table(path: &Path) -> Result<InjuryTable, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::InjuryTableIo {
        path: path.to_path_buf(),
        source,
    })?;
    let table: InjuryTable =
        serde_json::from_str(&raw).map_err(|source| ConfigError::InjuryTableFormat {
            path: path.to_path_buf(),
            source,
        })?;
    table
        .validate()
        .map_err(|source| ConfigError::InjuryTableInvalid {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<EngineConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EngineConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_empty_environment_uses_defaults() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.limits.max_pool_size, 8);
        assert_eq!(config.cache_ttl, Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_port_falls_back_to_port_variable() {
        let config = from_pairs(&[("PORT", "8080")]).unwrap();
        assert_eq!(config.server_port, 8080);

        let config = from_pairs(&[("SERVER_PORT", "9000"), ("PORT", "8080")]).unwrap();
        assert_eq!(config.server_port, 9000);
    }

    #[test]
    fn test_invalid_values_are_errors() {
        let err = from_pairs(&[("SERVER_PORT", "not-a-port")]).unwrap_err();
        assert!(err.to_string().contains("SERVER_PORT"));

        let err = from_pairs(&[("MAX_DICE_POOL", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Limits(_)));

        let err = from_pairs(&[("MAX_NUM_ROLLS", "-5")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = from_pairs(&[("MAX_INJURY_TALLY", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Limits(_)));
    }

    #[test]
    fn test_injury_tally_cap_from_environment() {
        let config = from_pairs(&[("MAX_INJURY_TALLY", "500")]).unwrap();
        assert_eq!(config.limits.max_injury_tally, 500);
        assert_eq!(from_pairs(&[]).unwrap().limits.max_injury_tally, 4096);
    }

    #[test]
    fn test_zero_ttl_disables_cache() {
        let config = from_pairs(&[("RESULT_CACHE_TTL_SECONDS", "0")]).unwrap();
        assert_eq!(config.cache_ttl, None);
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let config = from_pairs(&[("CORS_ALLOWED_ORIGINS", "  "), ("SERVER_HOST", "")]).unwrap();
        assert_eq!(config.cors_allowed_origins, None);
        assert_eq!(config.server_host, "0.0.0.0");
    }

    #[test]
    fn test_injury_table_loaded_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "name": "gritty",
                "version": 2,
                "bands": [
                    {{"min_total": -50, "effect": {{"type": "blood_markers", "markers": 1}}}},
                    {{"min_total": 8, "effect": {{"type": "out_of_action"}}}}
                ]
            }}"#
        )
        .unwrap();
        let path = file.path().to_string_lossy().to_string();

        let config = from_pairs(&[("INJURY_TABLE_PATH", path.as_str())]).unwrap();
        assert_eq!(config.injury_table.name, "gritty");
        assert_eq!(config.injury_table.version, 2);
    }

    #[test]
    fn test_injury_table_errors() {
        let err = load_injury_table(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ConfigError::InjuryTableIo { .. }));

        let mut garbage = tempfile::NamedTempFile::new().unwrap();
        write!(garbage, "not json").unwrap();
        let err = load_injury_table(garbage.path()).unwrap_err();
        assert!(matches!(err, ConfigError::InjuryTableFormat { .. }));

        let mut empty = tempfile::NamedTempFile::new().unwrap();
        write!(empty, r#"{{"name": "empty", "version": 1, "bands": []}}"#).unwrap();
        let err = load_injury_table(empty.path()).unwrap_err();
        assert!(matches!(err, ConfigError::InjuryTableInvalid { .. }));
    }
}
