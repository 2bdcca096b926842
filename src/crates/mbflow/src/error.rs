//! Error types for the MBFlow service
//!
//! Provides a unified error type for persistence, configuration, and CLI
//! operations. Engine errors pass through unchanged.

use mbflow_core::EngineError;
use std::fmt;

/// Result type alias for service operations
pub type Result<T> = std::result::Result<T, MbflowError>;

/// Main error type for service operations
#[derive(Debug)]
pub enum MbflowError {
    /// Configuration error
    Config(String),

    /// Database error
    Database(String),

    /// Engine error
    Engine(EngineError),

    /// IO error
    Io(std::io::Error),

    /// Serialization/deserialization error
    Serde(serde_json::Error),

    /// TOML parsing error
    Toml(toml::de::Error),

    /// SQL error
    Sqlx(sqlx::Error),

    /// Generic error with message
    Other(String),
}

impl fmt::Display for MbflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Database(msg) => write!(f, "Database error: {}", msg),
            Self::Engine(err) => write!(f, "Engine error: {}", err),
            Self::Io(err) => write!(f, "IO error: {}", err),
            Self::Serde(err) => write!(f, "Serialization error: {}", err),
            Self::Toml(err) => write!(f, "Config parse error: {}", err),
            Self::Sqlx(err) => write!(f, "SQL error: {}", err),
            Self::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for MbflowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Engine(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Serde(err) => Some(err),
            Self::Toml(err) => Some(err),
            Self::Sqlx(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EngineError> for MbflowError {
    fn from(err: EngineError) -> Self {
        Self::Engine(err)
    }
}

impl From<std::io::Error> for MbflowError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for MbflowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err)
    }
}

impl From<toml::de::Error> for MbflowError {
    fn from(err: toml::de::Error) -> Self {
        Self::Toml(err)
    }
}

impl From<sqlx::Error> for MbflowError {
    fn from(err: sqlx::Error) -> Self {
        Self::Sqlx(err)
    }
}

impl From<anyhow::Error> for MbflowError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
