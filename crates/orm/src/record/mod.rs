//! Records, collections and pivot values produced by hydration

pub mod collection;
pub mod core;
pub mod pivot;

pub use collection::{Collection, PlainCollection};
pub use self::core::{Record, RelationValue};
pub use pivot::Pivot;
