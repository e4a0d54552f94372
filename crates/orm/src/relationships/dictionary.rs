//! Dictionary Builder - Groups resolved records by correlation key

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::record::{Collection, Record};

/// Normalized join-key value. `1`, `1.0` and `"1"` correlate with each other;
/// null never correlates with anything.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JoinKey(String);

impl JoinKey {
    pub fn from_value(value: &JsonValue) -> Option<Self> {
        let normalized = match value {
            JsonValue::Null => return None,
            JsonValue::String(s) => normalize_numeric(s).unwrap_or_else(|| s.clone()),
            JsonValue::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => i.to_string(),
                (None, Some(f)) if f.fract() == 0.0 && f.abs() < 9.0e15 => (f as i64).to_string(),
                _ => n.to_string(),
            },
            other => other.to_string(),
        };
        Some(JoinKey(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn normalize_numeric(text: &str) -> Option<String> {
    if let Ok(i) = text.parse::<i64>() {
        return Some(i.to_string());
    }
    match text.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 && text.contains('.') => {
            Some((f as i64).to_string())
        }
        _ => None,
    }
}

/// Distinct non-null key values in first-appearance order
#[derive(Debug, Default)]
pub struct KeySet {
    seen: std::collections::HashSet<JoinKey>,
    values: Vec<JsonValue>,
}

impl KeySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a raw value; null and duplicates are dropped
    pub fn insert(&mut self, value: &JsonValue) -> bool {
        let key = match JoinKey::from_value(value) {
            Some(key) => key,
            None => return false,
        };
        if !self.seen.insert(key) {
            return false;
        }
        self.values.push(value.clone());
        true
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn into_values(self) -> Vec<JsonValue> {
        self.values
    }
}

/// Map from join key to matched records, preserving query result order
#[derive(Debug, Default)]
pub struct Dictionary {
    entries: HashMap<JoinKey, Vec<Arc<Record>>>,
}

impl Dictionary {
    /// Group `records` by the key each one carries; records without a key are dropped
    pub fn build<I>(records: I) -> Self
    where
        I: IntoIterator<Item = (Option<JoinKey>, Arc<Record>)>,
    {
        let mut entries: HashMap<JoinKey, Vec<Arc<Record>>> = HashMap::new();
        for (key, record) in records {
            if let Some(key) = key {
                entries.entry(key).or_default().push(record);
            }
        }
        Self { entries }
    }

    /// First match for a one-to-one relation
    pub fn one(&self, key: Option<&JoinKey>) -> Option<Arc<Record>> {
        key.and_then(|k| self.entries.get(k)).and_then(|records| records.first().cloned())
    }

    /// Every match for a one-to-many relation, in result order
    pub fn many(&self, key: Option<&JoinKey>) -> Collection {
        key.and_then(|k| self.entries.get(k))
            .map(|records| Collection::new(records.clone()))
            .unwrap_or_default()
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_join_key_normalization() {
        assert_eq!(JoinKey::from_value(&json!(1)), JoinKey::from_value(&json!("1")));
        assert_eq!(JoinKey::from_value(&json!(1.0)), JoinKey::from_value(&json!(1)));
        assert_eq!(JoinKey::from_value(&json!("1.0")), JoinKey::from_value(&json!(1)));
        assert_ne!(JoinKey::from_value(&json!("a")), JoinKey::from_value(&json!("b")));
        assert_eq!(JoinKey::from_value(&JsonValue::Null), None);
        assert_eq!(JoinKey::from_value(&json!("abc")).unwrap().as_str(), "abc");
    }

    #[test]
    fn test_key_set_dedupes_and_skips_null() {
        let mut keys = KeySet::new();
        assert!(keys.insert(&json!(1)));
        assert!(!keys.insert(&json!("1")));
        assert!(!keys.insert(&JsonValue::Null));
        assert!(keys.insert(&json!(2)));
        assert_eq!(keys.into_values(), vec![json!(1), json!(2)]);
    }
}
