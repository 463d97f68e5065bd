//! Shared error type for the lead revival services

use thiserror::Error;

/// Result alias used across the shared library and service crates
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can cross crate boundaries
#[derive(Error, Debug)]
pub enum Error {
    /// SQLite access failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Filesystem access failed (root folder, config file)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML config file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration value is missing or out of range
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
