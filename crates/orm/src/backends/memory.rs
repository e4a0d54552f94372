//! In-Memory Query Executor
//!
//! Evaluates `QueryBuilder` selects against tables held in memory. Every
//! executed statement is recorded so callers can assert on query counts.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use super::core::{as_text, loose_eq, QueryExecutor, RawRow};
use crate::error::{OrmError, OrmResult};
use crate::query::{JoinType, OrderDirection, QueryBuilder, QueryOperator, WhereCondition};

/// One row of a (possibly joined) intermediate result: each segment is the
/// row contributed by one table. A left join without a match contributes an
/// empty row.
type JoinedRow = Vec<(String, RawRow)>;

/// In-memory database used as a `QueryExecutor`
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    tables: HashMap<String, Vec<RawRow>>,
    failing_tables: HashSet<String>,
    log: Mutex<Vec<String>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a table. Rows that are not JSON objects are ignored.
    pub fn table(mut self, name: &str, rows: Vec<JsonValue>) -> Self {
        let rows = rows
            .into_iter()
            .filter_map(|row| match row {
                JsonValue::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        self.tables.insert(name.to_string(), rows);
        self
    }

    /// Make every query whose base table is `name` fail with a database error
    pub fn fail_on_table(mut self, name: &str) -> Self {
        self.failing_tables.insert(name.to_string());
        self
    }

    /// Every statement executed so far, in order
    pub fn query_log(&self) -> Vec<String> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    /// Number of statements executed so far
    pub fn query_count(&self) -> usize {
        self.log.lock().map(|log| log.len()).unwrap_or(0)
    }

    /// Forget the recorded statements
    pub fn reset_log(&self) {
        if let Ok(mut log) = self.log.lock() {
            log.clear();
        }
    }

    fn record(&self, sql: String) {
        if let Ok(mut log) = self.log.lock() {
            log.push(sql);
        }
    }

    fn rows_of(&self, table: &str) -> OrmResult<&Vec<RawRow>> {
        self.tables
            .get(table)
            .ok_or_else(|| OrmError::Database(format!("relation \"{}\" does not exist", table)))
    }

    fn evaluate(&self, query: &QueryBuilder) -> OrmResult<Vec<RawRow>> {
        let base = query
            .base_table()
            .ok_or_else(|| OrmError::Query("Query has no FROM table".to_string()))?;

        if self.failing_tables.contains(base) {
            return Err(OrmError::Database(format!("simulated failure on table '{}'", base)));
        }

        let mut rows: Vec<JoinedRow> = self
            .rows_of(base)?
            .iter()
            .map(|row| vec![(base.to_string(), row.clone())])
            .collect();

        for join in query.joins() {
            let join_rows = self.rows_of(&join.table)?;
            let mut joined = Vec::new();

            for row in rows {
                let mut matched = false;
                for candidate in join_rows {
                    let mut combined = row.clone();
                    combined.push((join.table.clone(), candidate.clone()));
                    let on = join
                        .on_conditions
                        .iter()
                        .all(|(left, right)| loose_eq(&resolve(&combined, left), &resolve(&combined, right)));
                    if on {
                        matched = true;
                        joined.push(combined);
                    }
                }

                if !matched && join.join_type == JoinType::Left {
                    let mut combined = row;
                    combined.push((join.table.clone(), RawRow::new()));
                    joined.push(combined);
                }
            }

            rows = joined;
        }

        rows.retain(|row| query.where_conditions().iter().all(|c| matches_condition(row, c)));

        if !query.order_clauses().is_empty() {
            rows.sort_by(|a, b| {
                for (column, direction) in query.order_clauses() {
                    let ordering = compare_for_order(&resolve(a, column), &resolve(b, column), direction);
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                }
                Ordering::Equal
            });
        }

        let mut projected: Vec<RawRow> = rows.iter().map(|row| project(row, query.select_fields())).collect();

        if query.is_distinct() {
            let mut seen = HashSet::new();
            projected.retain(|row| seen.insert(JsonValue::Object(row.clone()).to_string()));
        }

        let offset = query.offset_value().unwrap_or(0).max(0) as usize;
        let projected = projected.into_iter().skip(offset);
        let result = match query.limit_value() {
            Some(limit) => projected.take(limit.max(0) as usize).collect(),
            None => projected.collect(),
        };

        Ok(result)
    }
}

#[async_trait]
impl QueryExecutor for MemoryDatabase {
    async fn fetch_all(&self, query: &QueryBuilder) -> OrmResult<Vec<RawRow>> {
        self.record(query.to_sql());
        self.evaluate(query)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Resolve a plain or `table.column` reference against a joined row
fn resolve(row: &JoinedRow, column: &str) -> JsonValue {
    match column.split_once('.') {
        Some((table, name)) => row
            .iter()
            .rev()
            .find(|(segment, _)| segment == table)
            .and_then(|(_, values)| values.get(name))
            .cloned()
            .unwrap_or(JsonValue::Null),
        None => row
            .iter()
            .find_map(|(_, values)| values.get(column))
            .cloned()
            .unwrap_or(JsonValue::Null),
    }
}

fn matches_condition(row: &JoinedRow, condition: &WhereCondition) -> bool {
    let actual = resolve(row, &condition.column);
    let expected = condition.value.clone().unwrap_or(JsonValue::Null);

    match condition.operator {
        QueryOperator::Equal => loose_eq(&actual, &expected),
        QueryOperator::NotEqual => !actual.is_null() && !expected.is_null() && !loose_eq(&actual, &expected),
        QueryOperator::GreaterThan => compare(&actual, &expected) == Some(Ordering::Greater),
        QueryOperator::GreaterThanOrEqual => {
            matches!(compare(&actual, &expected), Some(Ordering::Greater | Ordering::Equal))
        }
        QueryOperator::LessThan => compare(&actual, &expected) == Some(Ordering::Less),
        QueryOperator::LessThanOrEqual => {
            matches!(compare(&actual, &expected), Some(Ordering::Less | Ordering::Equal))
        }
        QueryOperator::Like => !actual.is_null() && like(&as_text(&actual), &as_text(&expected)),
        QueryOperator::NotLike => !actual.is_null() && !like(&as_text(&actual), &as_text(&expected)),
        QueryOperator::In => condition.values.iter().any(|v| loose_eq(&actual, v)),
        QueryOperator::NotIn => !actual.is_null() && !condition.values.iter().any(|v| loose_eq(&actual, v)),
        QueryOperator::IsNull => actual.is_null(),
        QueryOperator::IsNotNull => !actual.is_null(),
    }
}

fn compare(left: &JsonValue, right: &JsonValue) -> Option<Ordering> {
    if left.is_null() || right.is_null() {
        return None;
    }
    match (numeric(left), numeric(right)) {
        (Some(a), Some(b)) => a.partial_cmp(&b),
        _ => Some(as_text(left).cmp(&as_text(right))),
    }
}

fn numeric(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

// Postgres ordering: NULLS LAST ascending, NULLS FIRST descending
fn compare_for_order(left: &JsonValue, right: &JsonValue, direction: &OrderDirection) -> Ordering {
    let ordering = match (left.is_null(), right.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => compare(left, right).unwrap_or(Ordering::Equal),
    };
    match direction {
        OrderDirection::Asc => ordering,
        OrderDirection::Desc => ordering.reverse(),
    }
}

/// SQL LIKE with `%` and `_` wildcards
fn like(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    like_at(&text, &pattern)
}

fn like_at(text: &[char], pattern: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some(('%', rest)) => (0..=text.len()).any(|skip| like_at(&text[skip..], rest)),
        Some(('_', rest)) => !text.is_empty() && like_at(&text[1..], rest),
        Some((c, rest)) => text.first() == Some(c) && like_at(&text[1..], rest),
    }
}

fn project(row: &JoinedRow, fields: &[String]) -> RawRow {
    let mut out = RawRow::new();

    if fields.is_empty() {
        for (_, values) in row {
            for (key, value) in values {
                out.insert(key.clone(), value.clone());
            }
        }
        return out;
    }

    for field in fields {
        if field == "*" {
            for (_, values) in row {
                for (key, value) in values {
                    out.insert(key.clone(), value.clone());
                }
            }
        } else if let Some(table) = field.strip_suffix(".*") {
            if let Some((_, values)) = row.iter().find(|(segment, _)| segment == table) {
                for (key, value) in values {
                    out.insert(key.clone(), value.clone());
                }
            }
        } else if let Some((expr, alias)) = split_alias(field) {
            out.insert(alias.to_string(), resolve(row, expr));
        } else {
            let name = field.rsplit('.').next().unwrap_or(field);
            out.insert(name.to_string(), resolve(row, field));
        }
    }

    out
}

/// `expr AS alias` in any keyword case. ASCII folding keeps byte offsets
/// aligned with `field`.
fn split_alias(field: &str) -> Option<(&str, &str)> {
    field
        .to_ascii_lowercase()
        .find(" as ")
        .map(|at| (field[..at].trim(), field[at + 4..].trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn database() -> MemoryDatabase {
        MemoryDatabase::new()
            .table(
                "users",
                vec![
                    json!({"id": 1, "name": "Ada", "deleted_at": null}),
                    json!({"id": 2, "name": "Grace", "deleted_at": "2024-01-01T00:00:00+00:00"}),
                    json!({"id": 3, "name": "Linus", "deleted_at": null}),
                ],
            )
            .table(
                "posts",
                vec![
                    json!({"id": 10, "user_id": 1, "title": "Engines"}),
                    json!({"id": 11, "user_id": 1, "title": "Notes"}),
                    json!({"id": 12, "user_id": 3, "title": "Kernels"}),
                ],
            )
    }

    #[test]
    fn test_split_alias_with_non_ascii_identifiers() {
        assert_eq!(split_alias("İl.ad AS şehir"), Some(("İl.ad", "şehir")));
        assert_eq!(split_alias("İİİ.x as y"), Some(("İİİ.x", "y")));
        assert_eq!(split_alias("roles.name As label"), Some(("roles.name", "label")));
        assert_eq!(split_alias("İl.ad"), None);
    }

    #[tokio::test]
    async fn test_where_in_and_order() {
        let db = database();
        let query = QueryBuilder::table("posts")
            .where_in("user_id", vec![1, 3])
            .order_by_desc("id");
        let rows = db.fetch_all(&query).await.unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!(12), json!(11), json!(10)]);
        assert_eq!(db.query_count(), 1);
    }

    #[tokio::test]
    async fn test_join_with_alias_projection() {
        let db = database();
        let query = QueryBuilder::table("posts")
            .select("posts.*")
            .add_select_as("users.name", "author")
            .join("users", "users.id", "posts.user_id")
            .where_null("users.deleted_at");
        let rows = db.fetch_all(&query).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["author"], json!("Ada"));
        assert_eq!(rows[2]["title"], json!("Kernels"));
        assert!(!rows[0].contains_key("name"));
    }

    #[tokio::test]
    async fn test_left_join_keeps_unmatched_rows() {
        let db = database();
        let query = QueryBuilder::table("users")
            .select("users.id")
            .add_select_as("posts.id", "post_id")
            .left_join("posts", "posts.user_id", "users.id")
            .where_eq("users.id", 2);
        let rows = db.fetch_all(&query).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["post_id"], JsonValue::Null);
    }

    #[tokio::test]
    async fn test_like_limit_offset() {
        let db = database();
        let query = QueryBuilder::table("posts").where_like("title", "%e%").order_by("id").offset(1).limit(1);
        let rows = db.fetch_all(&query).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], json!(11));
    }

    #[tokio::test]
    async fn test_missing_and_failing_tables() {
        let db = database().fail_on_table("users");
        let err = db.fetch_all(&QueryBuilder::table("comments")).await.unwrap_err();
        assert!(matches!(err, OrmError::Database(_)));
        let err = db.fetch_all(&QueryBuilder::table("users")).await.unwrap_err();
        assert!(matches!(err, OrmError::Database(_)));
        assert_eq!(db.query_count(), 2);
    }

    #[tokio::test]
    async fn test_fetch_optional_limits_to_one() {
        let db = database();
        let row = db.fetch_optional(&QueryBuilder::table("users").order_by("id")).await.unwrap();
        assert_eq!(row.unwrap()["name"], json!("Ada"));
        assert!(db.query_log()[0].ends_with("LIMIT 1"));
    }

    #[test]
    fn test_like_patterns() {
        assert!(like("Engines", "Eng%"));
        assert!(like("Engines", "%ines"));
        assert!(like("cat", "c_t"));
        assert!(!like("cart", "c_t"));
    }
}
