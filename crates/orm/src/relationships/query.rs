//! Relation queries
//!
//! Builds the single query a relation needs for a set of join keys and
//! turns its rows back into records carrying their correlation key. Both
//! the batch resolver and the per-record `RelationQuery` go through here.

use std::sync::Arc;

use serde_json::Value as JsonValue;

use super::dictionary::JoinKey;
use super::metadata::{Relation, RelationType};
use crate::backends::core::as_text;
use crate::backends::RawRow;
use crate::error::{ModelError, ModelResult};
use crate::model::ModelMeta;
use crate::query::builder::qualify_column;
use crate::query::QueryBuilder;
use crate::record::{Collection, Pivot, Record};
use crate::session::Session;

/// Column on the related type matched against the parent's join key
/// (belongs-to / morph-to only)
fn owner_key<'a>(relation: &'a Relation, related: &'a ModelMeta) -> &'a str {
    relation.owner_key.as_deref().unwrap_or_else(|| related.primary_key())
}

/// Query for every record related to any of `keys`
pub(crate) fn relation_query_for_keys(
    session: &Session,
    relation: &Relation,
    related: &ModelMeta,
    keys: Vec<JsonValue>,
) -> ModelResult<QueryBuilder> {
    let table = related.table();
    let mut query = QueryBuilder::table(table).select(&format!("{}.*", table));

    match relation.relation_type {
        RelationType::BelongsTo | RelationType::MorphTo => {
            query = query.where_in(&related.qualified(owner_key(relation, related)), keys);
        }
        RelationType::HasOne | RelationType::HasMany | RelationType::MorphOne | RelationType::MorphMany => {
            query = query.where_in(&related.qualified(&relation.foreign_key), keys);
            if let Some(ref morph) = relation.morph {
                let class = morph.morph_class.clone().unwrap_or_default();
                query = query.where_eq(&related.qualified(&morph.type_column), class);
            }
        }
        RelationType::HasOneThrough | RelationType::HasManyThrough => {
            let through = relation.through.as_ref().ok_or_else(|| missing(relation, "intermediate model"))?;
            let through_meta = session.schema().model(&through.through_model)?;

            query = query
                .add_select_as(
                    &through_meta.qualified(&relation.foreign_key),
                    &session.config().through_key_alias,
                )
                .join(
                    through_meta.table(),
                    &through_meta.qualified(&through.second_local_key),
                    &related.qualified(&through.second_key),
                )
                .where_in(&through_meta.qualified(&relation.foreign_key), keys);

            if !through.with_trashed_parents {
                if let Some(column) = through_meta.soft_delete_column() {
                    query = query.where_null(&column);
                }
            }
        }
        RelationType::BelongsToMany | RelationType::MorphToMany => {
            let pivot = relation.pivot.as_ref().ok_or_else(|| missing(relation, "pivot table"))?;
            let prefix = &session.config().pivot_prefix;

            for column in pivot.selected_columns(&relation.foreign_key) {
                query = query.add_select_as(
                    &format!("{}.{}", pivot.table, column),
                    &format!("{}{}", prefix, column),
                );
            }

            query = query
                .join(
                    &pivot.table,
                    &related.qualified(&pivot.related_key),
                    &format!("{}.{}", pivot.table, pivot.related_pivot_key),
                )
                .where_in(&format!("{}.{}", pivot.table, relation.foreign_key), keys);

            if let Some(ref morph) = relation.morph {
                let class = morph.morph_class.clone().unwrap_or_default();
                query = query.where_eq(&format!("{}.{}", pivot.table, morph.type_column), class);
            }
        }
    }

    if !relation.with_trashed {
        if let Some(column) = related.soft_delete_column() {
            query = query.where_null(&column);
        }
    }

    Ok(query)
}

fn missing(relation: &Relation, what: &str) -> ModelError {
    ModelError::Configuration(format!(
        "Relation '{}' on model '{}' has no {}",
        relation.name, relation.parent_model, what
    ))
}

/// Hydrate relation rows, pairing each record with the key it correlates on.
/// Through aliases and pivot-prefixed columns never reach the record's attributes.
pub(crate) fn hydrate_related(
    session: &Session,
    relation: &Relation,
    related: &Arc<ModelMeta>,
    rows: Vec<RawRow>,
) -> Vec<(Option<JoinKey>, Arc<Record>)> {
    let config = session.config();

    rows.into_iter()
        .map(|mut row| match relation.relation_type {
            RelationType::BelongsTo | RelationType::MorphTo => {
                let key = row.get(owner_key(relation, related)).and_then(JoinKey::from_value);
                (key, session.hydrate_record(related, row, None))
            }
            RelationType::HasOne | RelationType::HasMany | RelationType::MorphOne | RelationType::MorphMany => {
                let key = row.get(&relation.foreign_key).and_then(JoinKey::from_value);
                (key, session.hydrate_record(related, row, None))
            }
            RelationType::HasOneThrough | RelationType::HasManyThrough => {
                let key = row
                    .remove(&config.through_key_alias)
                    .and_then(|value| JoinKey::from_value(&value));
                (key, session.hydrate_record(related, row, None))
            }
            RelationType::BelongsToMany | RelationType::MorphToMany => {
                let columns = relation
                    .pivot
                    .as_ref()
                    .map(|pivot| pivot.selected_columns(&relation.foreign_key))
                    .unwrap_or_default();
                let (attributes, pivot_values) = split_pivot(row, &config.pivot_prefix, &columns);
                let key = pivot_values.get(&relation.foreign_key).and_then(JoinKey::from_value);
                let pivot = relation.pivot.as_ref().map(|pivot| {
                    let accessor = pivot.accessor.as_deref().unwrap_or(&config.pivot_accessor);
                    Pivot::new(&pivot.table, accessor, pivot_values)
                });
                (key, session.hydrate_record(related, attributes, pivot))
            }
        })
        .collect()
}

/// Move the aliased pivot columns out of a row, keyed by their pivot name.
/// Related columns that merely share the alias prefix stay on the record.
fn split_pivot(mut row: RawRow, prefix: &str, columns: &[String]) -> (RawRow, RawRow) {
    let mut pivot = RawRow::new();
    for column in columns {
        if let Some(value) = row.remove(&format!("{}{}", prefix, column)) {
            pivot.insert(column.clone(), value);
        }
    }
    (row, pivot)
}

/// Query over one record's related records, open for extra filtering
#[derive(Debug, Clone)]
pub struct RelationQuery {
    session: Session,
    relation: Arc<Relation>,
    /// `None` when the parent's join key (or morph tag) is null: no query runs
    related: Option<Arc<ModelMeta>>,
    builder: QueryBuilder,
}

impl RelationQuery {
    pub(crate) fn for_parent(session: Session, relation: Arc<Relation>, parent: &Record) -> ModelResult<Self> {
        let key = parent
            .get_raw(relation.parent_key_column())
            .filter(|value| !value.is_null())
            .cloned();

        let related = match relation.relation_type {
            RelationType::MorphTo => {
                let morph = relation.morph.as_ref().ok_or_else(|| missing(&relation, "morph type column"))?;
                match parent.get_raw(&morph.type_column).filter(|tag| !tag.is_null()) {
                    Some(tag) => Some(session.schema().resolve_morph(&as_text(tag))?),
                    None => None,
                }
            }
            _ => {
                let name = relation
                    .related_model
                    .as_deref()
                    .ok_or_else(|| missing(&relation, "related model"))?;
                Some(session.schema().model(name)?)
            }
        };

        let (related, builder) = match (related, key) {
            (Some(related), Some(key)) => {
                let builder = relation_query_for_keys(&session, &relation, &related, vec![key])?;
                (Some(related), builder)
            }
            _ => (None, QueryBuilder::new()),
        };

        Ok(Self {
            session,
            relation,
            related,
            builder,
        })
    }

    fn qualify(&self, column: &str) -> String {
        match self.related {
            Some(ref related) => qualify_column(related.table(), column),
            None => column.to_string(),
        }
    }

    pub fn relation(&self) -> &Relation {
        &self.relation
    }

    /// The query that `get` would run; `None` when no query will run
    pub fn to_query(&self) -> Option<&QueryBuilder> {
        self.related.as_ref().map(|_| &self.builder)
    }

    pub fn where_eq<V: Into<JsonValue>>(mut self, column: &str, value: V) -> Self {
        let column = self.qualify(column);
        self.builder = self.builder.where_eq(&column, value);
        self
    }

    pub fn where_ne<V: Into<JsonValue>>(mut self, column: &str, value: V) -> Self {
        let column = self.qualify(column);
        self.builder = self.builder.where_ne(&column, value);
        self
    }

    pub fn where_gt<V: Into<JsonValue>>(mut self, column: &str, value: V) -> Self {
        let column = self.qualify(column);
        self.builder = self.builder.where_gt(&column, value);
        self
    }

    pub fn where_lt<V: Into<JsonValue>>(mut self, column: &str, value: V) -> Self {
        let column = self.qualify(column);
        self.builder = self.builder.where_lt(&column, value);
        self
    }

    pub fn where_like(mut self, column: &str, pattern: &str) -> Self {
        let column = self.qualify(column);
        self.builder = self.builder.where_like(&column, pattern);
        self
    }

    pub fn where_in<V: Into<JsonValue>>(mut self, column: &str, values: Vec<V>) -> Self {
        let column = self.qualify(column);
        self.builder = self.builder.where_in(&column, values);
        self
    }

    pub fn where_null(mut self, column: &str) -> Self {
        let column = self.qualify(column);
        self.builder = self.builder.where_null(&column);
        self
    }

    pub fn where_not_null(mut self, column: &str) -> Self {
        let column = self.qualify(column);
        self.builder = self.builder.where_not_null(&column);
        self
    }

    pub fn order_by(mut self, column: &str) -> Self {
        let column = self.qualify(column);
        self.builder = self.builder.order_by(&column);
        self
    }

    pub fn order_by_desc(mut self, column: &str) -> Self {
        let column = self.qualify(column);
        self.builder = self.builder.order_by_desc(&column);
        self
    }

    pub fn limit(mut self, count: i64) -> Self {
        self.builder = self.builder.limit(count);
        self
    }

    pub fn offset(mut self, count: i64) -> Self {
        self.builder = self.builder.offset(count);
        self
    }

    /// Apply an arbitrary transformation to the underlying query
    pub fn constrain<F>(mut self, apply: F) -> Self
    where
        F: FnOnce(QueryBuilder) -> QueryBuilder,
    {
        self.builder = apply(self.builder);
        self
    }

    /// Run the query and return every related record
    pub async fn get(self) -> ModelResult<Collection> {
        let related = match self.related {
            Some(ref related) => related.clone(),
            None => return Ok(Collection::default()),
        };

        let context = format!("relation query {}.{}", self.relation.parent_model, self.relation.name);
        let rows = self.session.fetch(&self.builder, &context).await?;
        let records = hydrate_related(&self.session, &self.relation, &related, rows)
            .into_iter()
            .map(|(_, record)| record)
            .collect();
        Ok(Collection::new(records))
    }

    /// Run the query with `LIMIT 1`
    pub async fn first(mut self) -> ModelResult<Option<Arc<Record>>> {
        self.builder = self.builder.limit(1);
        let records = self.get().await?;
        Ok(records.first().cloned())
    }

    pub async fn first_or_fail(self) -> ModelResult<Arc<Record>> {
        let name = self.relation.name.clone();
        let model = self.relation.parent_model.clone();
        self.first().await?.ok_or_else(|| {
            ModelError::NotFound(format!("No related record for '{}' on {}", name, model))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_pivot_keeps_related_columns_sharing_the_prefix() {
        let row: RawRow = json!({
            "id": 7,
            "pivot_weight": 3,
            "pivot_user_id": 1,
            "pivot_role_id": 7,
        })
        .as_object()
        .cloned()
        .unwrap();
        let columns = vec!["user_id".to_string(), "role_id".to_string()];

        let (attributes, pivot) = split_pivot(row, "pivot_", &columns);

        assert_eq!(attributes.get("pivot_weight"), Some(&json!(3)));
        assert_eq!(attributes.get("id"), Some(&json!(7)));
        assert!(!attributes.contains_key("pivot_user_id"));
        assert_eq!(pivot.get("user_id"), Some(&json!(1)));
        assert_eq!(pivot.get("role_id"), Some(&json!(7)));
        assert_eq!(pivot.len(), 2);
    }
}
