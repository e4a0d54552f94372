//! Model Query - Top-level select with eager loading
//!
//! `ModelQuery` is what `Session::query` hands out: a select over one model's
//! table that hydrates its rows into records and then eager-loads every
//! requested relation path in batches.

use std::sync::Arc;

use serde_json::Value;

use super::builder::{qualify_column, QueryBuilder};
use crate::error::{ModelError, ModelResult};
use crate::record::{Collection, Record};
use crate::relationships::constraints::RelationshipConstraintBuilder;
use crate::relationships::eager_loading::EagerLoader;
use crate::session::Session;

/// Select over a model, enhanced with eager loading capabilities
#[derive(Debug, Clone)]
pub struct ModelQuery {
    session: Session,
    model: String,
    table: String,
    /// The base query builder
    builder: QueryBuilder,
    /// The eager loader for managing relationships
    eager_loader: EagerLoader,
    with_trashed: bool,
}

impl ModelQuery {
    pub(crate) fn new(session: Session, model: &str, table: &str) -> Self {
        Self {
            session,
            model: model.to_string(),
            table: table.to_string(),
            builder: QueryBuilder::table(table).select(&format!("{}.*", table)),
            eager_loader: EagerLoader::new(),
            with_trashed: false,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn qualify(&self, column: &str) -> String {
        qualify_column(&self.table, column)
    }

    pub fn where_eq<V: Into<Value>>(mut self, column: &str, value: V) -> Self {
        let column = self.qualify(column);
        self.builder = self.builder.where_eq(&column, value);
        self
    }

    pub fn where_ne<V: Into<Value>>(mut self, column: &str, value: V) -> Self {
        let column = self.qualify(column);
        self.builder = self.builder.where_ne(&column, value);
        self
    }

    pub fn where_gt<V: Into<Value>>(mut self, column: &str, value: V) -> Self {
        let column = self.qualify(column);
        self.builder = self.builder.where_gt(&column, value);
        self
    }

    pub fn where_lt<V: Into<Value>>(mut self, column: &str, value: V) -> Self {
        let column = self.qualify(column);
        self.builder = self.builder.where_lt(&column, value);
        self
    }

    pub fn where_like(mut self, column: &str, pattern: &str) -> Self {
        let column = self.qualify(column);
        self.builder = self.builder.where_like(&column, pattern);
        self
    }

    pub fn where_in<V: Into<Value>>(mut self, column: &str, values: Vec<V>) -> Self {
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

    /// Add a condition by operator string (`"="`, `">="`, `"LIKE"`, `"IN"`, ...)
    pub fn where_condition<V: Into<Value>>(mut self, column: &str, operator: &str, value: V) -> Self {
        let column = self.qualify(column);
        self.builder = self.builder.where_condition(&column, operator, value);
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

    /// Add a relationship path to eagerly load
    pub fn with(mut self, relation: &str) -> Self {
        self.eager_loader = self.eager_loader.with(relation);
        self
    }

    /// Add several relationship paths at once
    pub fn with_many(mut self, relations: &[&str]) -> Self {
        for relation in relations {
            self.eager_loader = self.eager_loader.with(relation);
        }
        self
    }

    /// Add a relationship path with constraints on its last segment
    pub fn with_where<F>(mut self, relation: &str, constraint: F) -> Self
    where
        F: FnOnce(RelationshipConstraintBuilder) -> RelationshipConstraintBuilder,
    {
        self.eager_loader = self.eager_loader.with_constraint(relation, constraint);
        self
    }

    /// Add conditional eager loading
    pub fn with_when(self, condition: bool, relation: &str) -> Self {
        if condition {
            self.with(relation)
        } else {
            self
        }
    }

    /// Include soft-deleted rows of this model
    pub fn with_trashed(mut self) -> Self {
        self.with_trashed = true;
        self
    }

    pub fn eager_loader(&self) -> &EagerLoader {
        &self.eager_loader
    }

    /// The select that `get` would run, soft-delete scope included
    pub fn to_query(&self) -> ModelResult<QueryBuilder> {
        let meta = self.session.schema().model(&self.model)?;
        let mut builder = self.builder.clone();
        if !self.with_trashed {
            if let Some(column) = meta.soft_delete_column() {
                builder = builder.where_null(&column);
            }
        }
        Ok(builder)
    }

    pub fn to_sql(&self) -> ModelResult<String> {
        Ok(self.to_query()?.to_sql())
    }

    /// Execute the select, hydrate the rows and eager-load every requested path
    pub async fn get(self) -> ModelResult<Collection> {
        let query = self.to_query()?;
        let rows = self
            .session
            .fetch(&query, &format!("select {}", self.model))
            .await?;
        let records = self.session.hydrate(&self.model, rows)?;

        if !self.eager_loader.is_empty() && !records.is_empty() {
            let parents: Vec<&Record> = records.iter().map(|r| r.as_ref()).collect();
            self.eager_loader.load(&self.session, &parents).await?;
        }

        Ok(records)
    }

    /// Execute with `LIMIT 1`
    pub async fn first(mut self) -> ModelResult<Option<Arc<Record>>> {
        self.builder = self.builder.limit(1);
        let records = self.get().await?;
        Ok(records.first().cloned())
    }

    pub async fn first_or_fail(self) -> ModelResult<Arc<Record>> {
        let model = self.model.clone();
        self.first()
            .await?
            .ok_or_else(|| ModelError::NotFound(format!("No {} matches the query", model)))
    }

    /// Find a record by primary key
    pub async fn find<V: Into<Value>>(self, key: V) -> ModelResult<Option<Arc<Record>>> {
        let meta = self.session.schema().model(&self.model)?;
        let primary_key = meta.primary_key().to_string();
        self.where_eq(&primary_key, key).first().await
    }

    pub async fn find_or_fail<V: Into<Value>>(self, key: V) -> ModelResult<Arc<Record>> {
        let key: Value = key.into();
        let model = self.model.clone();
        let display = key.to_string();
        self.find(key)
            .await?
            .ok_or_else(|| ModelError::NotFound(format!("{} with key {}", model, display)))
    }
}
