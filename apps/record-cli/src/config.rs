//! Centralized configuration for record-cli.
//!
//! All environment variables are loaded and validated at startup to fail fast
//! on misconfiguration rather than on the first repository call.

use std::env;
use std::fmt;

/// Storage backend provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageProvider {
    /// In-memory storage (data lost when the process exits)
    Memory,
    /// MongoDB document storage
    Mongo,
}

impl StorageProvider {
    fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("mongo") || s.eq_ignore_ascii_case("mongodb") {
            Self::Mongo
        } else {
            Self::Memory
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Configuration error.
#[derive(Debug)]
pub struct ConfigError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration error for {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// CLI configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Storage provider (default: mongo when MONGODB_URI is set, else memory)
    pub storage_provider: StorageProvider,
    /// MongoDB connection string (required for mongo storage)
    pub mongodb_uri: Option<String>,
    /// MongoDB database name (default: test)
    pub mongodb_database: String,
    /// Log format
    pub log_format: LogFormat,
}

impl Config {
    /// Load and validate configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self, ConfigError> {
        let mongodb_uri = lookup("MONGODB_URI").filter(|s| !s.is_empty());

        // Without an explicit provider, a configured MongoDB wins: every
        // command is its own process, so memory storage never sees old saves.
        let storage_provider = match lookup("STORAGE_PROVIDER").filter(|s| !s.is_empty()) {
            Some(s) => StorageProvider::from_str(&s),
            None if mongodb_uri.is_some() => StorageProvider::Mongo,
            None => StorageProvider::Memory,
        };
        if storage_provider == StorageProvider::Mongo && mongodb_uri.is_none() {
            return Err(ConfigError {
                field: "MONGODB_URI",
                message: "Required when STORAGE_PROVIDER=mongo".into(),
            });
        }

        let mongodb_database = lookup("MONGODB_DATABASE")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "test".into());

        let log_format =
            LogFormat::from_str(&lookup("LOG_FORMAT").unwrap_or_else(|| "pretty".into()));

        Ok(Self {
            storage_provider,
            mongodb_uri,
            mongodb_database,
            log_format,
        })
    }

    /// Log warnings about configuration that is easy to misread.
    pub fn warn_if_ephemeral(&self) {
        if self.storage_provider == StorageProvider::Memory {
            tracing::warn!(
                "STORAGE_PROVIDER=memory: records are kept in this process only and are \
                 gone once the command exits."
            );
        }
    }
}
