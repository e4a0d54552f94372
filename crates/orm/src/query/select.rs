//! Query Builder SELECT operations

use super::builder::QueryBuilder;

impl QueryBuilder {
    /// Replace the SELECT list; accepts a comma separated list of expressions
    pub fn select(mut self, fields: &str) -> Self {
        self.select_fields.clear();
        self.add_select(fields)
    }

    /// Append expressions to the SELECT list
    pub fn add_select(mut self, fields: &str) -> Self {
        self.select_fields.extend(
            fields
                .split(',')
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty()),
        );
        self
    }

    /// Select `column` under `alias`
    pub fn add_select_as(mut self, column: &str, alias: &str) -> Self {
        self.select_fields.push(format!("{} AS {}", column, alias));
        self
    }

    /// Add SELECT DISTINCT to the query
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Set the FROM table
    pub fn from(mut self, table: &str) -> Self {
        self.from_tables = vec![table.to_string()];
        self
    }
}
