//! Configuration for relation resolution and the Postgres executor
//!
//! `OrmConfig` can be built programmatically or loaded from `ORM_*`
//! environment variables.

use std::env;
use std::str::FromStr;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {field}: '{value}', expected {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },

    #[error("Validation failed for {field}: {reason}")]
    ValidationFailed { field: String, reason: String },
}

/// Relation engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct OrmConfig {
    /// Alias prefix for pivot columns selected alongside related records
    pub pivot_prefix: String,
    /// Default accessor name under which pivot values are attached
    pub pivot_accessor: String,
    /// Alias for the first-hop key selected by through relations
    pub through_key_alias: String,
    /// Maximum number of segments in a dotted eager-load path
    pub max_eager_depth: usize,
    /// Emit generated SQL for every relation query at debug level
    pub log_queries: bool,
}

impl Default for OrmConfig {
    fn default() -> Self {
        Self {
            pivot_prefix: "pivot_".to_string(),
            pivot_accessor: "pivot".to_string(),
            through_key_alias: "through_key".to_string(),
            max_eager_depth: 10,
            log_queries: true,
        }
    }
}

impl OrmConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            pivot_prefix: env::var("ORM_PIVOT_PREFIX").unwrap_or(defaults.pivot_prefix),
            pivot_accessor: env::var("ORM_PIVOT_ACCESSOR").unwrap_or(defaults.pivot_accessor),
            through_key_alias: env::var("ORM_THROUGH_KEY_ALIAS")
                .unwrap_or(defaults.through_key_alias),
            max_eager_depth: parse_env("ORM_MAX_EAGER_DEPTH", defaults.max_eager_depth, "a positive integer")?,
            log_queries: parse_env("ORM_LOG_QUERIES", defaults.log_queries, "true or false")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pivot_prefix.trim().is_empty() {
            return Err(ConfigError::ValidationFailed {
                field: "pivot_prefix".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }

        if self.pivot_accessor.trim().is_empty() {
            return Err(ConfigError::ValidationFailed {
                field: "pivot_accessor".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }

        if self.through_key_alias.trim().is_empty() {
            return Err(ConfigError::ValidationFailed {
                field: "through_key_alias".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }

        if self.through_key_alias.starts_with(&self.pivot_prefix) {
            return Err(ConfigError::ValidationFailed {
                field: "through_key_alias".to_string(),
                reason: format!("must not start with the pivot prefix '{}'", self.pivot_prefix),
            });
        }

        if self.max_eager_depth == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "max_eager_depth".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    pub fn with_pivot_prefix(mut self, prefix: &str) -> Self {
        self.pivot_prefix = prefix.to_string();
        self
    }

    pub fn with_pivot_accessor(mut self, accessor: &str) -> Self {
        self.pivot_accessor = accessor.to_string();
        self
    }

    pub fn with_through_key_alias(mut self, alias: &str) -> Self {
        self.through_key_alias = alias.to_string();
        self
    }

    pub fn with_max_eager_depth(mut self, depth: usize) -> Self {
        self.max_eager_depth = depth;
        self
    }

    pub fn with_query_logging(mut self, enabled: bool) -> Self {
        self.log_queries = enabled;
        self
    }
}

/// Connection pool configuration for the Postgres executor
#[derive(Debug, Clone, PartialEq)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: u64,
    pub idle_timeout: Option<u64>,
    pub test_before_acquire: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: 30,
            idle_timeout: Some(600), // 10 minutes
            test_before_acquire: true,
        }
    }
}

fn parse_env<T: FromStr>(var: &str, default: T, expected: &str) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
            field: var.to_string(),
            value: raw,
            expected: expected.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clean_test_env() {
        env::remove_var("ORM_PIVOT_PREFIX");
        env::remove_var("ORM_PIVOT_ACCESSOR");
        env::remove_var("ORM_THROUGH_KEY_ALIAS");
        env::remove_var("ORM_MAX_EAGER_DEPTH");
        env::remove_var("ORM_LOG_QUERIES");
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = OrmConfig::default();
        assert_eq!(config.pivot_prefix, "pivot_");
        assert_eq!(config.pivot_accessor, "pivot");
        assert_eq!(config.max_eager_depth, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clean_test_env();
        env::set_var("ORM_PIVOT_ACCESSOR", "membership");
        env::set_var("ORM_MAX_EAGER_DEPTH", "4");
        env::set_var("ORM_LOG_QUERIES", "false");

        let config = OrmConfig::from_env().unwrap();
        assert_eq!(config.pivot_accessor, "membership");
        assert_eq!(config.max_eager_depth, 4);
        assert!(!config.log_queries);
        assert_eq!(config.pivot_prefix, "pivot_");

        clean_test_env();
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_garbage() {
        clean_test_env();
        env::set_var("ORM_MAX_EAGER_DEPTH", "deep");

        let err = OrmConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        env::set_var("ORM_MAX_EAGER_DEPTH", "0");
        let err = OrmConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::ValidationFailed { .. }));

        clean_test_env();
    }

    #[test]
    fn test_alias_must_not_collide_with_pivot_prefix() {
        let config = OrmConfig::default().with_through_key_alias("pivot_through");
        assert!(config.validate().is_err());
    }
}
