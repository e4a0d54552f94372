//! Query Executors
//!
//! The relation engine consumes rows through the `QueryExecutor` trait. A
//! PostgreSQL executor over sqlx and an in-memory executor are provided.

pub mod core;
pub mod memory;
pub mod postgres;

pub use self::core::{loose_eq, QueryExecutor, RawRow};
pub use memory::MemoryDatabase;
pub use postgres::PostgresExecutor;
