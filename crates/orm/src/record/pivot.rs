//! Pivot values attached to records resolved through many-to-many relations

use serde_json::Value as JsonValue;

use crate::backends::RawRow;
use crate::error::ModelResult;
use crate::immutable;

/// Read-only bag of junction-table columns: both join keys plus the declared
/// extra columns. Never cast, never holds relations.
#[derive(Debug, Clone, PartialEq)]
pub struct Pivot {
    table: String,
    accessor: String,
    attributes: RawRow,
}

impl Pivot {
    pub(crate) fn new(table: &str, accessor: &str, attributes: RawRow) -> Self {
        Self {
            table: table.to_string(),
            accessor: accessor.to_string(),
            attributes,
        }
    }

    pub fn get(&self, column: &str) -> Option<&JsonValue> {
        self.attributes.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.attributes.contains_key(column)
    }

    pub fn attributes(&self) -> &RawRow {
        &self.attributes
    }

    /// Junction table the values came from
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Accessor name the pivot is attached under
    pub fn accessor(&self) -> &str {
        &self.accessor
    }

    pub fn set(&mut self, column: &str, _value: JsonValue) -> ModelResult<()> {
        immutable::deny(&format!("pivot {}", self.table), &format!("set column '{}'", column))
    }

    pub fn save(&self) -> ModelResult<()> {
        immutable::deny(&format!("pivot {}", self.table), "save")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pivot_is_read_only() {
        let mut attributes = RawRow::new();
        attributes.insert("user_id".to_string(), json!(1));
        attributes.insert("level".to_string(), json!("admin"));
        let mut pivot = Pivot::new("role_user", "membership", attributes);

        assert_eq!(pivot.get("level"), Some(&json!("admin")));
        assert_eq!(pivot.accessor(), "membership");
        assert!(pivot.set("level", json!("guest")).unwrap_err().is_violation());
        assert!(pivot.save().unwrap_err().is_violation());
        assert_eq!(pivot.get("level"), Some(&json!("admin")));
    }
}
