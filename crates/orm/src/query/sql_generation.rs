//! Query Builder SQL generation

use serde_json::Value;
use super::builder::QueryBuilder;
use super::types::*;

impl QueryBuilder {
    /// Generate SQL with `$n` placeholders and return the bound parameters
    pub fn to_sql_with_params(&self) -> (String, Vec<Value>) {
        let mut sql = String::new();
        let mut params = Vec::new();

        // SELECT clause
        if self.distinct {
            sql.push_str("SELECT DISTINCT ");
        } else {
            sql.push_str("SELECT ");
        }

        if self.select_fields.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.select_fields.join(", "));
        }

        // FROM clause
        if !self.from_tables.is_empty() {
            sql.push_str(" FROM ");
            sql.push_str(&self.from_tables.join(", "));
        }

        // JOIN clauses
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.join_type.to_string());
            sql.push(' ');
            sql.push_str(&join.table);
            sql.push_str(" ON ");
            for (i, (left, right)) in join.on_conditions.iter().enumerate() {
                if i > 0 {
                    sql.push_str(" AND ");
                }
                sql.push_str(&format!("{} = {}", left, right));
            }
        }

        self.build_where_clause(&mut sql, &mut params);
        self.build_order_limit_clause(&mut sql);

        (sql, params)
    }

    /// Convert the query to SQL string
    pub fn to_sql(&self) -> String {
        self.to_sql_with_params().0
    }

    fn build_where_clause(&self, sql: &mut String, params: &mut Vec<Value>) {
        if self.where_conditions.is_empty() {
            return;
        }

        let fragments: Vec<String> = self
            .where_conditions
            .iter()
            .map(|condition| Self::condition_sql(condition, params))
            .collect();

        sql.push_str(" WHERE ");
        sql.push_str(&fragments.join(" AND "));
    }

    fn condition_sql(condition: &WhereCondition, params: &mut Vec<Value>) -> String {
        match condition.operator {
            QueryOperator::In | QueryOperator::NotIn => {
                // IN () never matches, NOT IN () always does
                if condition.values.is_empty() {
                    return if condition.operator == QueryOperator::In {
                        "1 = 0".to_string()
                    } else {
                        "1 = 1".to_string()
                    };
                }
                let placeholders: Vec<String> = condition
                    .values
                    .iter()
                    .map(|value| {
                        params.push(value.clone());
                        format!("${}", params.len())
                    })
                    .collect();
                format!("{} {} ({})", condition.column, condition.operator, placeholders.join(", "))
            }
            QueryOperator::IsNull | QueryOperator::IsNotNull => {
                format!("{} {}", condition.column, condition.operator)
            }
            _ => match condition.value {
                Some(Value::Null) | None => format!("{} {} NULL", condition.column, condition.operator),
                Some(ref value) => {
                    params.push(value.clone());
                    format!("{} {} ${}", condition.column, condition.operator, params.len())
                }
            },
        }
    }

    fn build_order_limit_clause(&self, sql: &mut String) {
        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            for (i, (column, direction)) in self.order_by.iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                sql.push_str(&format!("{} {}", column, direction));
            }
        }

        if let Some(limit) = self.limit_count {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        if let Some(offset) = self.offset_value {
            sql.push_str(&format!(" OFFSET {}", offset));
        }
    }
}
