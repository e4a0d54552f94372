//! Query Builder - Core builder implementation

use super::types::*;

/// Select-only query builder consumed by the relation resolvers and executors
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryBuilder {
    pub(crate) select_fields: Vec<String>,
    pub(crate) from_tables: Vec<String>,
    pub(crate) where_conditions: Vec<WhereCondition>,
    pub(crate) joins: Vec<JoinClause>,
    pub(crate) order_by: Vec<(String, OrderDirection)>,
    pub(crate) limit_count: Option<i64>,
    pub(crate) offset_value: Option<i64>,
    pub(crate) distinct: bool,
}

impl QueryBuilder {
    /// Create a new query builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a query builder selecting from `table`
    pub fn table(table: &str) -> Self {
        Self::new().from(table)
    }

    /// The base table of the query, if one was set
    pub fn base_table(&self) -> Option<&str> {
        self.from_tables.first().map(String::as_str)
    }

    pub fn select_fields(&self) -> &[String] {
        &self.select_fields
    }

    pub fn where_conditions(&self) -> &[WhereCondition] {
        &self.where_conditions
    }

    pub fn joins(&self) -> &[JoinClause] {
        &self.joins
    }

    pub fn order_clauses(&self) -> &[(String, OrderDirection)] {
        &self.order_by
    }

    pub fn limit_value(&self) -> Option<i64> {
        self.limit_count
    }

    pub fn offset_value(&self) -> Option<i64> {
        self.offset_value
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }
}

/// Prefix `column` with `table` unless it is already qualified
pub(crate) fn qualify_column(table: &str, column: &str) -> String {
    if column.contains('.') {
        column.to_string()
    } else {
        format!("{}.{}", table, column)
    }
}
