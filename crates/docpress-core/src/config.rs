//! Configuration module
//!
//! Environment-driven configuration with sane defaults for every knob, so
//! the services can be constructed without any environment at all (tests do
//! exactly that via `Config::default()`).

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_STORAGE_ROOT: &str = "./data";
const DEFAULT_MAX_UPLOAD_SIZE_BYTES: usize = 50 * 1024 * 1024;
const DEFAULT_TASK_RETENTION_SECS: u64 = 30 * 60;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 5 * 60;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Root directory for task-scoped artifact storage.
    pub storage_root: PathBuf,
    /// Maximum accepted upload size in bytes. Defaults to 50MB; deployments
    /// may raise it via `DOCPRESS_MAX_UPLOAD_SIZE_BYTES`.
    pub max_upload_size_bytes: usize,
    /// Retention window after which unclaimed tasks are swept.
    pub task_retention_secs: u64,
    /// Interval between background sweep runs.
    pub sweep_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from(DEFAULT_STORAGE_ROOT),
            max_upload_size_bytes: DEFAULT_MAX_UPLOAD_SIZE_BYTES,
            task_retention_secs: DEFAULT_TASK_RETENTION_SECS,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Ok(Self {
            storage_root: env::var("DOCPRESS_STORAGE_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_STORAGE_ROOT)),
            max_upload_size_bytes: parse_env(
                "DOCPRESS_MAX_UPLOAD_SIZE_BYTES",
                DEFAULT_MAX_UPLOAD_SIZE_BYTES,
            )?,
            task_retention_secs: parse_env(
                "DOCPRESS_TASK_RETENTION_SECS",
                DEFAULT_TASK_RETENTION_SECS,
            )?,
            sweep_interval_secs: parse_env(
                "DOCPRESS_SWEEP_INTERVAL_SECS",
                DEFAULT_SWEEP_INTERVAL_SECS,
            )?,
        })
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T, anyhow::Error>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.max_upload_size_bytes, 50 * 1024 * 1024);
        assert_eq!(config.task_retention_secs, 1800);
        assert_eq!(config.sweep_interval_secs, 300);
        assert_eq!(config.storage_root, PathBuf::from("./data"));
    }

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let value: usize = parse_env("DOCPRESS_DOES_NOT_EXIST", 42).unwrap();
        assert_eq!(value, 42);
    }
}
