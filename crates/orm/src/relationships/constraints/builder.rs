//! Constraint builder for eager-load and relation query constraints

use std::collections::HashSet;

use serde_json::Value;

use super::implementations::*;
use super::types::{ConstraintType, RelationshipConstraint};
use crate::error::ModelResult;
use crate::query::{OrderDirection, QueryBuilder, QueryOperator};

/// Builder for relationship constraints with validation
#[derive(Debug, Default)]
pub struct RelationshipConstraintBuilder {
    constraints: Vec<Box<dyn RelationshipConstraint>>,
    /// Track constraint types to prevent conflicts
    applied_types: HashSet<ConstraintType>,
}

impl RelationshipConstraintBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply all constraints to the query builder
    pub fn apply_all(&self, mut query: QueryBuilder) -> ModelResult<QueryBuilder> {
        for constraint in &self.constraints {
            constraint.validate()?;
            query = constraint.apply(query)?;
        }
        Ok(query)
    }

    /// Get all constraints
    pub fn constraints(&self) -> &[Box<dyn RelationshipConstraint>] {
        &self.constraints
    }

    /// Check if a constraint type has been applied
    pub fn has_constraint_type(&self, constraint_type: &ConstraintType) -> bool {
        self.applied_types.contains(constraint_type)
    }

    /// Add a constraint and track its type
    pub fn add_constraint(mut self, constraint: Box<dyn RelationshipConstraint>) -> Self {
        self.applied_types.insert(constraint.constraint_type());
        self.constraints.push(constraint);
        self
    }

    fn add_where(self, field: &str, operator: QueryOperator, value: Value) -> Self {
        self.add_constraint(Box::new(WhereConstraint {
            field: field.to_string(),
            operator,
            value,
        }))
    }

    /// Add WHERE equals constraint
    pub fn where_eq<V: Into<Value>>(self, field: &str, value: V) -> Self {
        self.add_where(field, QueryOperator::Equal, value.into())
    }

    /// Add WHERE not equals constraint
    pub fn where_ne<V: Into<Value>>(self, field: &str, value: V) -> Self {
        self.add_where(field, QueryOperator::NotEqual, value.into())
    }

    /// Add WHERE greater than constraint
    pub fn where_gt<V: Into<Value>>(self, field: &str, value: V) -> Self {
        self.add_where(field, QueryOperator::GreaterThan, value.into())
    }

    /// Add WHERE greater than or equal constraint
    pub fn where_gte<V: Into<Value>>(self, field: &str, value: V) -> Self {
        self.add_where(field, QueryOperator::GreaterThanOrEqual, value.into())
    }

    /// Add WHERE less than constraint
    pub fn where_lt<V: Into<Value>>(self, field: &str, value: V) -> Self {
        self.add_where(field, QueryOperator::LessThan, value.into())
    }

    /// Add WHERE less than or equal constraint
    pub fn where_lte<V: Into<Value>>(self, field: &str, value: V) -> Self {
        self.add_where(field, QueryOperator::LessThanOrEqual, value.into())
    }

    /// Add WHERE LIKE constraint
    pub fn where_like(self, field: &str, pattern: &str) -> Self {
        self.add_where(field, QueryOperator::Like, Value::String(pattern.to_string()))
    }

    /// Add WHERE IS NULL constraint
    pub fn where_null(self, field: &str) -> Self {
        self.add_where(field, QueryOperator::IsNull, Value::Null)
    }

    /// Add WHERE IS NOT NULL constraint
    pub fn where_not_null(self, field: &str) -> Self {
        self.add_where(field, QueryOperator::IsNotNull, Value::Null)
    }

    /// Add WHERE IN constraint
    pub fn where_in<V: Into<Value>>(self, field: &str, values: Vec<V>) -> Self {
        self.add_constraint(Box::new(WhereInConstraint {
            field: field.to_string(),
            values: values.into_iter().map(Into::into).collect(),
            negated: false,
        }))
    }

    /// Add WHERE NOT IN constraint
    pub fn where_not_in<V: Into<Value>>(self, field: &str, values: Vec<V>) -> Self {
        self.add_constraint(Box::new(WhereInConstraint {
            field: field.to_string(),
            values: values.into_iter().map(Into::into).collect(),
            negated: true,
        }))
    }

    /// Add ORDER BY constraint
    pub fn order_by(self, field: &str) -> Self {
        self.add_constraint(Box::new(OrderConstraint {
            field: field.to_string(),
            direction: OrderDirection::Asc,
        }))
    }

    /// Add ORDER BY DESC constraint
    pub fn order_by_desc(self, field: &str) -> Self {
        self.add_constraint(Box::new(OrderConstraint {
            field: field.to_string(),
            direction: OrderDirection::Desc,
        }))
    }

    /// Add LIMIT constraint
    pub fn limit(self, count: i64) -> Self {
        self.add_constraint(Box::new(LimitConstraint { count }))
    }

    /// Add OFFSET constraint
    pub fn offset(self, count: i64) -> Self {
        self.add_constraint(Box::new(OffsetConstraint { count }))
    }

    /// Add a closure over the query builder
    pub fn custom<F>(self, apply: F) -> Self
    where
        F: Fn(QueryBuilder) -> QueryBuilder + Send + Sync + 'static,
    {
        self.add_constraint(Box::new(FnConstraint::new(apply)))
    }
}

impl RelationshipConstraint for RelationshipConstraintBuilder {
    fn apply(&self, query: QueryBuilder) -> ModelResult<QueryBuilder> {
        self.apply_all(query)
    }

    fn constraint_type(&self) -> ConstraintType {
        ConstraintType::Custom
    }

    fn description(&self) -> String {
        self.constraints
            .iter()
            .map(|c| c.description())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_constraints_apply_in_order() {
        let constraints = RelationshipConstraintBuilder::new()
            .where_eq("posts.published", true)
            .where_gt("posts.views", 10)
            .order_by_desc("posts.created_at")
            .limit(5);

        assert!(constraints.has_constraint_type(&ConstraintType::Where));
        assert!(constraints.has_constraint_type(&ConstraintType::Limit));
        assert!(!constraints.has_constraint_type(&ConstraintType::Offset));

        let query = constraints.apply_all(QueryBuilder::table("posts")).unwrap();
        assert_eq!(query.where_conditions().len(), 2);
        assert_eq!(query.where_conditions()[0].value, Some(json!(true)));
        assert_eq!(query.order_clauses()[0].1, OrderDirection::Desc);
        assert_eq!(query.limit_value(), Some(5));
    }

    #[test]
    fn test_invalid_constraint_is_rejected() {
        let constraints = RelationshipConstraintBuilder::new().limit(-1);
        assert!(constraints.apply_all(QueryBuilder::table("posts")).is_err());

        let constraints = RelationshipConstraintBuilder::new().where_eq(" ", 1);
        assert!(constraints.apply_all(QueryBuilder::table("posts")).is_err());
    }

    #[test]
    fn test_custom_constraint() {
        let constraints = RelationshipConstraintBuilder::new()
            .custom(|q| q.where_null("posts.archived_at"));
        let query = constraints.apply(QueryBuilder::table("posts")).unwrap();
        assert_eq!(query.where_conditions()[0].operator, QueryOperator::IsNull);
        assert_eq!(constraints.description(), "custom constraint");
    }
}
