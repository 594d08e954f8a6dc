//! Runtime configuration for embedding callers (CLI, web handlers).
//!
//! # Responsibility
//! - Provide defaults for database location, logging and feed paging.
//! - Apply `QANDA_*` environment overrides.
//!
//! # Invariants
//! - `page_size` is always within `1..=PAGE_LIMIT_MAX`.
//! - `log_dir`, when set, is absolute.

use crate::logging::default_log_level;
use crate::repo::{DEFAULT_PAGE_LIMIT, PAGE_LIMIT_MAX};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DEFAULT_DB_FILE_NAME: &str = "qanda.sqlite3";

pub const ENV_DB_PATH: &str = "QANDA_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "QANDA_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "QANDA_LOG_DIR";
pub const ENV_PAGE_SIZE: &str = "QANDA_PAGE_SIZE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidPageSize(String),
    RelativeLogDir(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPageSize(value) => write!(
                f,
                "{ENV_PAGE_SIZE} must be an integer in 1..={PAGE_LIMIT_MAX}, got `{value}`"
            ),
            Self::RelativeLogDir(path) => write!(
                f,
                "{ENV_LOG_DIR} must be an absolute path, got `{}`",
                path.display()
            ),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// File logging stays off when `None`.
    pub log_dir: Option<PathBuf>,
    pub page_size: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
            page_size: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl CoreConfig {
    /// Defaults overridden by `QANDA_*` process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by values from `lookup`; blank values are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(path) = get(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = get(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        if let Some(dir) = get(ENV_LOG_DIR) {
            let dir = PathBuf::from(dir);
            if !dir.is_absolute() {
                return Err(ConfigError::RelativeLogDir(dir));
            }
            config.log_dir = Some(dir);
        }
        if let Some(raw) = get(ENV_PAGE_SIZE) {
            config.page_size = match raw.parse::<u32>() {
                Ok(value) if (1..=PAGE_LIMIT_MAX).contains(&value) => value,
                _ => return Err(ConfigError::InvalidPageSize(raw)),
            };
        }

        Ok(config)
    }
}
