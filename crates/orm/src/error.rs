//! Error types for the relation engine
//!
//! Provides the error taxonomy for relation resolution: configuration
//! problems surfaced at first resolution, immutability violations,
//! explicit not-found failures and executor errors.

use std::fmt;

use crate::config::ConfigError;

/// Result type alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// ORM error type alias
pub type OrmError = ModelError;

/// ORM result type alias
pub type OrmResult<T> = ModelResult<T>;

/// Error types for ORM operations
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Database connection or query execution error
    Database(String),
    /// Record not found (raised only by `*_or_fail` accessors)
    NotFound(String),
    /// A relation or model is misconfigured
    Configuration(String),
    /// A mutation was attempted on an immutable record, collection or pivot
    Immutable(String),
    /// An eager-load name is not declared on any model in the parent set
    RelationNotFound { model: String, relation: String },
    /// Query building error
    Query(String),
    /// Serialization/deserialization error
    Serialization(String),
    /// Attribute cast failed
    Cast(String),
}

impl ModelError {
    /// Returns true for errors raised by the immutability gate
    pub fn is_violation(&self) -> bool {
        matches!(self, ModelError::Immutable(_))
    }

    /// Returns true for configuration errors
    pub fn is_configuration(&self) -> bool {
        matches!(self, ModelError::Configuration(_))
    }

    /// Returns true for explicit not-found errors
    pub fn is_not_found(&self) -> bool {
        matches!(self, ModelError::NotFound(_))
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Database(msg) => write!(f, "Database error: {}", msg),
            ModelError::NotFound(msg) => write!(f, "Record not found: {}", msg),
            ModelError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            ModelError::Immutable(msg) => write!(f, "Immutability violation: {}", msg),
            ModelError::RelationNotFound { model, relation } => {
                write!(f, "Call to undefined relationship '{}' on model '{}'", relation, model)
            }
            ModelError::Query(msg) => write!(f, "Query error: {}", msg),
            ModelError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            ModelError::Cast(msg) => write!(f, "Cast error: {}", msg),
        }
    }
}

impl std::error::Error for ModelError {}

// Convert from sqlx errors
impl From<sqlx::Error> for ModelError {
    fn from(err: sqlx::Error) -> Self {
        ModelError::Database(err.to_string())
    }
}

// Convert from serde_json errors
impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serialization(err.to_string())
    }
}

impl From<ConfigError> for ModelError {
    fn from(err: ConfigError) -> Self {
        ModelError::Configuration(err.to_string())
    }
}
