//! Query Builder Module - Select query facade consumed by the relation resolvers

pub mod builder;
pub mod joins;
pub mod ordering;
pub mod select;
pub mod sql_generation;
pub mod types;
pub mod where_clause;
pub mod with;

pub use builder::QueryBuilder;
pub use types::{JoinClause, JoinType, OrderDirection, QueryOperator, WhereCondition};
pub use with::ModelQuery;
