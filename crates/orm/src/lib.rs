//! # linkage-orm: Relation resolution and eager loading
//!
//! Resolves associations between immutable records and loads them in
//! batches: one query per relation (and per record type for polymorphic
//! relations) per nesting depth, however many parents are involved.
//!
//! The crate provides the `Model` trait and `Schema` registry, a small
//! select `QueryBuilder`, the ten association variants, the eager-load
//! planner and executors for Postgres and an in-memory database.

pub mod backends;
pub mod casts;
pub mod config;
pub mod error;
pub mod model;
pub mod query;
pub mod record;
pub mod relationships;
pub mod session;

pub(crate) mod immutable;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-export core traits and types
pub use backends::{MemoryDatabase, PostgresExecutor, QueryExecutor, RawRow};
pub use casts::{cast, CastType};
pub use config::{ConfigError, OrmConfig, PoolConfig};
pub use error::{ModelError, ModelResult, OrmError, OrmResult};
pub use model::{Model, ModelMeta, Schema};
pub use query::{ModelQuery, QueryBuilder};
pub use record::{Collection, Pivot, PlainCollection, Record, RelationValue};
pub use relationships::{
    EagerLoader, Relation, RelationBuilder, RelationQuery, RelationRegistry, RelationType,
    RelationshipConstraint, RelationshipConstraintBuilder,
};
pub use session::Session;
