//! Record Store - A hydrated row plus its resolved relations
//!
//! Records are created once by hydration and never change afterwards from the
//! caller's point of view. The relation map is filled through the crate-only
//! `set_resolved_relation` channel by the resolvers; every public mutator is
//! routed to the immutability gate.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value as JsonValue;

use super::collection::Collection;
use super::pivot::Pivot;
use crate::backends::RawRow;
use crate::casts;
use crate::error::{ModelError, ModelResult};
use crate::immutable;
use crate::model::ModelMeta;
use crate::relationships::{batch, EagerLoader, Relation, RelationQuery};
use crate::session::Session;

/// A resolved relation: a single optional record or an ordered collection
#[derive(Debug, Clone)]
pub enum RelationValue {
    One(Option<Arc<Record>>),
    Many(Collection),
}

impl RelationValue {
    /// The empty default for `relation`: null for one-to-one, empty collection otherwise
    pub fn empty_for(relation: &Relation) -> Self {
        if relation.is_collection() {
            RelationValue::Many(Collection::default())
        } else {
            RelationValue::One(None)
        }
    }

    pub fn as_one(&self) -> Option<&Arc<Record>> {
        match self {
            RelationValue::One(record) => record.as_ref(),
            RelationValue::Many(_) => None,
        }
    }

    pub fn as_many(&self) -> Option<&Collection> {
        match self {
            RelationValue::Many(collection) => Some(collection),
            RelationValue::One(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RelationValue::One(record) => record.is_none(),
            RelationValue::Many(collection) => collection.is_empty(),
        }
    }

    /// Every record held, flattening collections
    pub fn records(&self) -> Vec<Arc<Record>> {
        match self {
            RelationValue::One(record) => record.iter().cloned().collect(),
            RelationValue::Many(collection) => collection.iter().cloned().collect(),
        }
    }
}

/// A hydrated record
pub struct Record {
    meta: Arc<ModelMeta>,
    attributes: RawRow,
    pivot: Option<Pivot>,
    relations: DashMap<String, RelationValue>,
    session: Session,
}

impl Record {
    pub(crate) fn hydrate(
        meta: Arc<ModelMeta>,
        attributes: RawRow,
        pivot: Option<Pivot>,
        session: Session,
    ) -> Self {
        Self {
            meta,
            attributes,
            pivot,
            relations: DashMap::new(),
            session,
        }
    }

    pub fn model_name(&self) -> &str {
        self.meta.name()
    }

    pub fn meta(&self) -> &Arc<ModelMeta> {
        &self.meta
    }

    /// Raw attribute value, uncast
    pub fn get_raw(&self, key: &str) -> Option<&JsonValue> {
        self.attributes.get(key)
    }

    /// Attribute value with the model's cast applied; missing attributes read as null
    pub fn get(&self, key: &str) -> ModelResult<JsonValue> {
        let raw = self.attributes.get(key).cloned().unwrap_or(JsonValue::Null);
        match self.meta.cast_for(key) {
            Some(spec) => casts::cast(key, &raw, spec),
            None => Ok(raw),
        }
    }

    pub fn attributes(&self) -> &RawRow {
        &self.attributes
    }

    /// Raw primary key value; `None` when missing or null
    pub fn key(&self) -> Option<&JsonValue> {
        self.attributes
            .get(self.meta.primary_key())
            .filter(|value| !value.is_null())
    }

    /// Session that hydrated this record
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn relation_loaded(&self, name: &str) -> bool {
        self.relations.contains_key(name)
    }

    /// The already-resolved value of `name`, without issuing queries
    pub fn loaded_relation(&self, name: &str) -> Option<RelationValue> {
        self.relations.get(name).map(|value| value.value().clone())
    }

    /// Names of every resolved relation
    pub fn loaded_relations(&self) -> Vec<String> {
        let mut names: Vec<String> = self.relations.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    /// Resolve `name` on first access and return the cached value afterwards.
    /// Runs the batch resolver over a single-record parent set.
    pub async fn relation(&self, name: &str) -> ModelResult<RelationValue> {
        if let Some(value) = self.loaded_relation(name) {
            return Ok(value);
        }

        let session = &self.session;
        if !session.schema().declares(self.model_name(), name) {
            return Err(ModelError::RelationNotFound {
                model: self.model_name().to_string(),
                relation: name.to_string(),
            });
        }

        batch::load_relation(session, &[self], name, None).await?;

        self.loaded_relation(name).ok_or_else(|| {
            ModelError::Query(format!("Relation '{}' on {} was not assigned", name, self.model_name()))
        })
    }

    /// Like `relation`, but an empty result is a not-found error
    pub async fn relation_or_fail(&self, name: &str) -> ModelResult<RelationValue> {
        let value = self.relation(name).await?;
        if value.is_empty() {
            return Err(ModelError::NotFound(format!(
                "No related records for '{}' on {} {}",
                name,
                self.model_name(),
                self.key().map(|k| k.to_string()).unwrap_or_default()
            )));
        }
        Ok(value)
    }

    /// Query over this record's related records, for filtering before materialization
    pub fn relation_query(&self, name: &str) -> ModelResult<RelationQuery> {
        let session = &self.session;
        let relation = session
            .schema()
            .relation(self.model_name(), name)?
            .ok_or_else(|| ModelError::RelationNotFound {
                model: self.model_name().to_string(),
                relation: name.to_string(),
            })?;
        RelationQuery::for_parent(session.clone(), relation, self)
    }

    /// Pivot values, when this record was resolved through a many-to-many relation
    pub fn pivot(&self) -> Option<&Pivot> {
        self.pivot.as_ref()
    }

    /// Pivot values attached under `accessor`
    pub fn pivot_as(&self, accessor: &str) -> Option<&Pivot> {
        self.pivot.as_ref().filter(|pivot| pivot.accessor() == accessor)
    }

    /// Eager-load `paths` onto this record. Relations already present are
    /// refused with an immutability violation.
    pub async fn load(&self, paths: &[&str]) -> ModelResult<()> {
        EagerLoader::from_paths(paths).load(&self.session, &[self]).await
    }

    /// Eager-load only the relations in `paths` not loaded yet
    pub async fn load_missing(&self, paths: &[&str]) -> ModelResult<()> {
        EagerLoader::from_paths(paths).load_missing(&self.session, &[self]).await
    }

    /// Internal channel used by the resolvers; bypasses the immutability gate
    pub(crate) fn set_resolved_relation(&self, name: &str, value: RelationValue) {
        self.relations.insert(name.to_string(), value);
    }

    pub fn set_attribute<V: Into<JsonValue>>(&self, key: &str, _value: V) -> ModelResult<()> {
        immutable::deny(self.model_name(), &format!("set attribute '{}'", key))
    }

    pub fn fill(&self, _attributes: RawRow) -> ModelResult<()> {
        immutable::deny(self.model_name(), "fill attributes")
    }

    pub fn set_relation(&self, name: &str, _value: RelationValue) -> ModelResult<()> {
        immutable::deny(self.model_name(), &format!("set relation '{}'", name))
    }

    pub fn unset_relation(&self, name: &str) -> ModelResult<()> {
        immutable::deny(self.model_name(), &format!("unset relation '{}'", name))
    }

    pub fn save(&self) -> ModelResult<()> {
        immutable::deny(self.model_name(), "save")
    }

    pub fn update(&self, _attributes: RawRow) -> ModelResult<()> {
        immutable::deny(self.model_name(), "update")
    }

    pub fn delete(&self) -> ModelResult<()> {
        immutable::deny(self.model_name(), "delete")
    }

    pub fn touch(&self) -> ModelResult<()> {
        immutable::deny(self.model_name(), "touch")
    }

    pub fn push(&self) -> ModelResult<()> {
        immutable::deny(self.model_name(), "push")
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("model", &self.meta.name())
            .field("attributes", &self.attributes)
            .field("pivot", &self.pivot)
            .field("relations", &self.loaded_relations())
            .finish()
    }
}
