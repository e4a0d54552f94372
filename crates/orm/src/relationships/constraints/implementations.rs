//! Constraint implementations for relationship queries

use std::fmt;

use super::types::{ConstraintType, RelationshipConstraint};
use crate::error::{ModelError, ModelResult};
use crate::query::{OrderDirection, QueryBuilder, QueryOperator};

/// WHERE constraint implementation
#[derive(Debug, Clone)]
pub(crate) struct WhereConstraint {
    pub field: String,
    pub operator: QueryOperator,
    pub value: serde_json::Value,
}

impl RelationshipConstraint for WhereConstraint {
    fn apply(&self, query: QueryBuilder) -> ModelResult<QueryBuilder> {
        let query = match self.operator {
            QueryOperator::Equal => query.where_eq(&self.field, self.value.clone()),
            QueryOperator::NotEqual => query.where_ne(&self.field, self.value.clone()),
            QueryOperator::GreaterThan => query.where_gt(&self.field, self.value.clone()),
            QueryOperator::GreaterThanOrEqual => query.where_gte(&self.field, self.value.clone()),
            QueryOperator::LessThan => query.where_lt(&self.field, self.value.clone()),
            QueryOperator::LessThanOrEqual => query.where_lte(&self.field, self.value.clone()),
            QueryOperator::Like | QueryOperator::NotLike => {
                let pattern = self.value.as_str().ok_or_else(|| {
                    ModelError::Query(format!("{} operator requires string value", self.operator))
                })?;
                if self.operator == QueryOperator::Like {
                    query.where_like(&self.field, pattern)
                } else {
                    query.where_not_like(&self.field, pattern)
                }
            }
            QueryOperator::IsNull => query.where_null(&self.field),
            QueryOperator::IsNotNull => query.where_not_null(&self.field),
            QueryOperator::In | QueryOperator::NotIn => {
                return Err(ModelError::Query(format!(
                    "Unsupported operator {} for WHERE constraint",
                    self.operator
                )));
            }
        };
        Ok(query)
    }

    fn constraint_type(&self) -> ConstraintType {
        ConstraintType::Where
    }

    fn description(&self) -> String {
        format!("WHERE {} {} {}", self.field, self.operator, self.value)
    }

    fn validate(&self) -> ModelResult<()> {
        if self.field.trim().is_empty() {
            return Err(ModelError::Query("WHERE constraint field cannot be empty".to_string()));
        }
        Ok(())
    }
}

/// WHERE IN / NOT IN constraint implementation
#[derive(Debug, Clone)]
pub(crate) struct WhereInConstraint {
    pub field: String,
    pub values: Vec<serde_json::Value>,
    pub negated: bool,
}

impl RelationshipConstraint for WhereInConstraint {
    fn apply(&self, query: QueryBuilder) -> ModelResult<QueryBuilder> {
        Ok(if self.negated {
            query.where_not_in(&self.field, self.values.clone())
        } else {
            query.where_in(&self.field, self.values.clone())
        })
    }

    fn constraint_type(&self) -> ConstraintType {
        ConstraintType::Where
    }

    fn description(&self) -> String {
        let op = if self.negated { "NOT IN" } else { "IN" };
        format!("WHERE {} {} ({} values)", self.field, op, self.values.len())
    }

    fn validate(&self) -> ModelResult<()> {
        if self.field.trim().is_empty() {
            return Err(ModelError::Query("WHERE IN constraint field cannot be empty".to_string()));
        }
        Ok(())
    }
}

/// ORDER BY constraint implementation
#[derive(Debug, Clone)]
pub(crate) struct OrderConstraint {
    pub field: String,
    pub direction: OrderDirection,
}

impl RelationshipConstraint for OrderConstraint {
    fn apply(&self, query: QueryBuilder) -> ModelResult<QueryBuilder> {
        Ok(match self.direction {
            OrderDirection::Desc => query.order_by_desc(&self.field),
            OrderDirection::Asc => query.order_by(&self.field),
        })
    }

    fn constraint_type(&self) -> ConstraintType {
        ConstraintType::Order
    }

    fn description(&self) -> String {
        format!("ORDER BY {} {}", self.field, self.direction)
    }

    fn validate(&self) -> ModelResult<()> {
        if self.field.trim().is_empty() {
            return Err(ModelError::Query("ORDER BY constraint field cannot be empty".to_string()));
        }
        Ok(())
    }
}

/// LIMIT constraint implementation
#[derive(Debug, Clone)]
pub(crate) struct LimitConstraint {
    pub count: i64,
}

impl RelationshipConstraint for LimitConstraint {
    fn apply(&self, query: QueryBuilder) -> ModelResult<QueryBuilder> {
        Ok(query.limit(self.count))
    }

    fn constraint_type(&self) -> ConstraintType {
        ConstraintType::Limit
    }

    fn description(&self) -> String {
        format!("LIMIT {}", self.count)
    }

    fn validate(&self) -> ModelResult<()> {
        if self.count < 0 {
            return Err(ModelError::Query("LIMIT count must be non-negative".to_string()));
        }
        Ok(())
    }
}

/// OFFSET constraint implementation
#[derive(Debug, Clone)]
pub(crate) struct OffsetConstraint {
    pub count: i64,
}

impl RelationshipConstraint for OffsetConstraint {
    fn apply(&self, query: QueryBuilder) -> ModelResult<QueryBuilder> {
        Ok(query.offset(self.count))
    }

    fn constraint_type(&self) -> ConstraintType {
        ConstraintType::Offset
    }

    fn description(&self) -> String {
        format!("OFFSET {}", self.count)
    }

    fn validate(&self) -> ModelResult<()> {
        if self.count < 0 {
            return Err(ModelError::Query("OFFSET count must be non-negative".to_string()));
        }
        Ok(())
    }
}

/// Constraint backed by a closure over the query builder
pub struct FnConstraint<F> {
    apply: F,
}

impl<F> FnConstraint<F>
where
    F: Fn(QueryBuilder) -> QueryBuilder + Send + Sync,
{
    pub fn new(apply: F) -> Self {
        Self { apply }
    }
}

impl<F> fmt::Debug for FnConstraint<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnConstraint")
    }
}

impl<F> RelationshipConstraint for FnConstraint<F>
where
    F: Fn(QueryBuilder) -> QueryBuilder + Send + Sync,
{
    fn apply(&self, query: QueryBuilder) -> ModelResult<QueryBuilder> {
        Ok((self.apply)(query))
    }

    fn constraint_type(&self) -> ConstraintType {
        ConstraintType::Custom
    }

    fn description(&self) -> String {
        "custom constraint".to_string()
    }
}
