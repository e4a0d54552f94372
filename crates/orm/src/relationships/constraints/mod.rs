//! Relationship constraint system for eager loading and relation queries
//!
//! Constraints are applied once to the batched relation query, after the
//! key filter, never per parent.

pub mod builder;
pub mod implementations;
pub mod types;

pub use builder::RelationshipConstraintBuilder;
pub use implementations::FnConstraint;
pub use types::{ConstraintType, RelationshipConstraint};
