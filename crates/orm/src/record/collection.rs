//! Collections of records
//!
//! `Collection` keeps the immutability guarantee: same-type transformations
//! return a new collection and every mutator is refused. Transformations that
//! may change the element type return a `PlainCollection`.

use std::cmp::Ordering;
use std::ops::Index;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use super::core::Record;
use crate::backends::loose_eq;
use crate::error::ModelResult;
use crate::immutable;
use crate::relationships::EagerLoader;

/// Ordered, immutable sequence of records
#[derive(Debug, Clone, Default)]
pub struct Collection {
    records: Vec<Arc<Record>>,
}

impl Collection {
    pub fn new(records: Vec<Arc<Record>>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<Record>> {
        self.records.iter()
    }

    pub fn records(&self) -> &[Arc<Record>] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Record>> {
        self.records.get(index)
    }

    pub fn first(&self) -> Option<&Arc<Record>> {
        self.records.first()
    }

    pub fn last(&self) -> Option<&Arc<Record>> {
        self.records.last()
    }

    /// Record whose primary key equals `key`
    pub fn find<K: Into<JsonValue>>(&self, key: K) -> Option<&Arc<Record>> {
        let key = key.into();
        self.records
            .iter()
            .find(|record| record.key().map(|k| loose_eq(k, &key)).unwrap_or(false))
    }

    pub fn contains_key<K: Into<JsonValue>>(&self, key: K) -> bool {
        self.find(key).is_some()
    }

    /// Primary keys of every record, in order
    pub fn model_keys(&self) -> Vec<JsonValue> {
        self.records.iter().filter_map(|r| r.key().cloned()).collect()
    }

    pub fn filter<F>(&self, predicate: F) -> Collection
    where
        F: Fn(&Record) -> bool,
    {
        Collection::new(self.records.iter().filter(|r| predicate(r)).cloned().collect())
    }

    /// Stable sort with a caller-supplied comparison
    pub fn sort_by<F>(&self, mut compare: F) -> Collection
    where
        F: FnMut(&Record, &Record) -> Ordering,
    {
        let mut records = self.records.clone();
        records.sort_by(|a, b| compare(a, b));
        Collection::new(records)
    }

    /// Stable ascending sort on a raw attribute; nulls sort last
    pub fn sort_by_attribute(&self, key: &str) -> Collection {
        self.sort_by(|a, b| compare_raw(a.get_raw(key), b.get_raw(key)))
    }

    /// Records in `start..end`, clamped to the collection bounds
    pub fn slice(&self, start: usize, end: usize) -> Collection {
        let end = end.min(self.records.len());
        let start = start.min(end);
        Collection::new(self.records[start..end].to_vec())
    }

    pub fn take(&self, count: usize) -> Collection {
        self.slice(0, count)
    }

    pub fn skip(&self, count: usize) -> Collection {
        self.slice(count, self.records.len())
    }

    pub fn reverse(&self) -> Collection {
        Collection::new(self.records.iter().rev().cloned().collect())
    }

    /// Drop later records repeating an earlier primary key
    pub fn unique_by_key(&self) -> Collection {
        let mut seen: Vec<&JsonValue> = Vec::new();
        let mut records = Vec::with_capacity(self.records.len());
        for record in &self.records {
            if let Some(key) = record.key() {
                if seen.iter().any(|s| loose_eq(s, key)) {
                    continue;
                }
                seen.push(key);
            }
            records.push(record.clone());
        }
        Collection::new(records)
    }

    pub fn map<T, F>(&self, f: F) -> PlainCollection<T>
    where
        F: FnMut(&Arc<Record>) -> T,
    {
        self.records.iter().map(f).collect()
    }

    /// Raw values of `key` (null when missing)
    pub fn pluck(&self, key: &str) -> PlainCollection<JsonValue> {
        self.map(|record| record.get_raw(key).cloned().unwrap_or(JsonValue::Null))
    }

    /// Group by the raw value of `key`, groups in first-appearance order
    pub fn group_by(&self, key: &str) -> PlainCollection<(JsonValue, Collection)> {
        let mut groups: Vec<(JsonValue, Vec<Arc<Record>>)> = Vec::new();
        for record in &self.records {
            let value = record.get_raw(key).cloned().unwrap_or(JsonValue::Null);
            let existing = groups
                .iter_mut()
                .find(|(group, _)| group == &value || loose_eq(group, &value));
            match existing {
                Some((_, members)) => members.push(record.clone()),
                None => groups.push((value, vec![record.clone()])),
            }
        }
        groups
            .into_iter()
            .map(|(value, members)| (value, Collection::new(members)))
            .collect()
    }

    /// Eager-load `paths` onto every record in the collection; records that
    /// already hold a requested relation make the whole call a violation
    pub async fn load(&self, paths: &[&str]) -> ModelResult<()> {
        // an empty collection has nothing to load onto
        let session = match self.records.first() {
            Some(record) => record.session().clone(),
            None => return Ok(()),
        };
        let parents: Vec<&Record> = self.records.iter().map(|r| r.as_ref()).collect();
        EagerLoader::from_paths(paths).load(&session, &parents).await
    }

    /// Eager-load the relations in `paths` that are not loaded yet
    pub async fn load_missing(&self, paths: &[&str]) -> ModelResult<()> {
        // an empty collection has nothing to load onto
        let session = match self.records.first() {
            Some(record) => record.session().clone(),
            None => return Ok(()),
        };
        let parents: Vec<&Record> = self.records.iter().map(|r| r.as_ref()).collect();
        EagerLoader::from_paths(paths).load_missing(&session, &parents).await
    }

    pub fn push(&mut self, _record: Arc<Record>) -> ModelResult<()> {
        immutable::deny("collection", "push")
    }

    pub fn insert(&mut self, index: usize, _record: Arc<Record>) -> ModelResult<()> {
        immutable::deny("collection", &format!("insert at {}", index))
    }

    pub fn remove(&mut self, index: usize) -> ModelResult<Arc<Record>> {
        immutable::deny("collection", &format!("remove at {}", index))
    }

    pub fn replace(&mut self, index: usize, _record: Arc<Record>) -> ModelResult<()> {
        immutable::deny("collection", &format!("replace at {}", index))
    }

    pub fn clear(&mut self) -> ModelResult<()> {
        immutable::deny("collection", "clear")
    }

    pub fn pop(&mut self) -> ModelResult<Arc<Record>> {
        immutable::deny("collection", "pop")
    }
}

impl Index<usize> for Collection {
    type Output = Arc<Record>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.records[index]
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Arc<Record>;
    type IntoIter = std::slice::Iter<'a, Arc<Record>>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn compare_raw(left: Option<&JsonValue>, right: Option<&JsonValue>) -> Ordering {
    let left = left.filter(|v| !v.is_null());
    let right = right.filter(|v| !v.is_null());
    match (left, right) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(JsonValue::Number(a)), Some(JsonValue::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(JsonValue::String(a)), Some(JsonValue::String(b))) => a.cmp(b),
        (Some(a), Some(b)) => a.to_string().cmp(&b.to_string()),
    }
}

/// Ordinary growable sequence returned by type-changing transformations
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlainCollection<T> {
    items: Vec<T>,
}

impl<T> PlainCollection<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T> FromIterator<T> for PlainCollection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T> IntoIterator for PlainCollection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
