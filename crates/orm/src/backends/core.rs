//! Core Query Executor Trait
//!
//! The relation engine never talks to a driver directly. It hands a finished
//! `QueryBuilder` to a `QueryExecutor` and receives raw rows back as JSON
//! objects keyed by column name (or alias).

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::OrmResult;
use crate::query::QueryBuilder;

/// A raw result row: column name (or alias) to value
pub type RawRow = serde_json::Map<String, JsonValue>;

/// Executes select queries on behalf of the relation resolvers
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Execute the query and return every result row in order
    async fn fetch_all(&self, query: &QueryBuilder) -> OrmResult<Vec<RawRow>>;

    /// Execute the query with `LIMIT 1` and return the first row, if any
    async fn fetch_optional(&self, query: &QueryBuilder) -> OrmResult<Option<RawRow>> {
        let limited = query.clone().limit(1);
        let rows = self.fetch_all(&limited).await?;
        Ok(rows.into_iter().next())
    }

    /// Short backend name used in log output
    fn backend_name(&self) -> &'static str;
}

/// Compare two raw values the way a loosely typed SQL comparison would:
/// numbers and numeric strings compare by value, everything else by text.
pub fn loose_eq(left: &JsonValue, right: &JsonValue) -> bool {
    match (left, right) {
        (JsonValue::Null, _) | (_, JsonValue::Null) => false,
        (JsonValue::Number(a), JsonValue::Number(b)) => a.as_f64() == b.as_f64(),
        _ => match (as_number(left), as_number(right)) {
            (Some(a), Some(b)) => a == b,
            _ => as_text(left) == as_text(right),
        },
    }
}

fn as_number(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

pub(crate) fn as_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_loose_eq() {
        assert!(loose_eq(&json!(1), &json!("1")));
        assert!(loose_eq(&json!(2), &json!(2.0)));
        assert!(loose_eq(&json!("Post"), &json!("Post")));
        assert!(!loose_eq(&json!("Post"), &json!("Video")));
        assert!(!loose_eq(&JsonValue::Null, &JsonValue::Null));
        assert!(loose_eq(&json!(true), &json!(true)));
    }
}
