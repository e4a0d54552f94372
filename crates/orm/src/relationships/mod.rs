//! Relationships Module - Relation metadata, batch resolution and eager loading

pub mod batch;
pub mod builder;
pub mod constraints;
pub mod dictionary;
pub mod eager_loading;
pub mod metadata;
pub mod query;
pub mod registry;


// Re-export main types
pub use batch::load_relation;
pub use builder::RelationBuilder;
pub use constraints::{ConstraintType, FnConstraint, RelationshipConstraint, RelationshipConstraintBuilder};
pub use dictionary::{Dictionary, JoinKey, KeySet};
pub use eager_loading::{EagerLoadSpec, EagerLoader};
pub use metadata::{PivotConfig, PolymorphicConfig, Relation, RelationType, ThroughConfig};
pub use query::RelationQuery;
pub use registry::{RelationFactory, RelationRegistry};
