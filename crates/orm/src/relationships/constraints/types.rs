//! Constraint types and trait definitions for relationship queries

use crate::error::ModelResult;
use crate::query::QueryBuilder;

/// Constraint types for relationship queries
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstraintType {
    Where,
    Order,
    Limit,
    Offset,
    Custom,
}

/// A constraint applied once to a relation query, after the key filter
pub trait RelationshipConstraint: Send + Sync + std::fmt::Debug {
    /// Apply constraint to the query builder
    fn apply(&self, query: QueryBuilder) -> ModelResult<QueryBuilder>;

    /// Get the type of constraint
    fn constraint_type(&self) -> ConstraintType;

    /// Get a description of the constraint for debugging
    fn description(&self) -> String;

    /// Validate the constraint before applying
    fn validate(&self) -> ModelResult<()> {
        Ok(())
    }
}
