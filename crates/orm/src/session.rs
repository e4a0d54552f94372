//! Session - Schema, executor and configuration shared by every record it hydrates

use std::fmt;
use std::sync::Arc;

use crate::backends::{QueryExecutor, RawRow};
use crate::config::OrmConfig;
use crate::error::ModelResult;
use crate::model::{Model, ModelMeta, Schema};
use crate::query::{ModelQuery, QueryBuilder};
use crate::record::{Collection, Pivot, Record};

struct SessionInner {
    schema: Schema,
    executor: Arc<dyn QueryExecutor>,
    config: OrmConfig,
}

/// Entry point for queries; cheap to clone
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Create a session with the default configuration
    pub fn new(schema: Schema, executor: Arc<dyn QueryExecutor>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                schema,
                executor,
                config: OrmConfig::default(),
            }),
        }
    }

    /// Create a session with a validated configuration
    pub fn with_config(schema: Schema, executor: Arc<dyn QueryExecutor>, config: OrmConfig) -> ModelResult<Self> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(SessionInner { schema, executor, config }),
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.inner.schema
    }

    pub fn executor(&self) -> &Arc<dyn QueryExecutor> {
        &self.inner.executor
    }

    pub fn config(&self) -> &OrmConfig {
        &self.inner.config
    }

    /// Start a query over model `M`
    pub fn query<M: Model>(&self) -> ModelQuery {
        ModelQuery::new(self.clone(), M::model_name(), M::table_name())
    }

    /// Start a query over a model registered under `name`
    pub fn query_model(&self, name: &str) -> ModelResult<ModelQuery> {
        let meta = self.schema().model(name)?;
        Ok(ModelQuery::new(self.clone(), meta.name(), meta.table()))
    }

    /// Hydrate raw rows into records of `model`
    pub fn hydrate(&self, model: &str, rows: Vec<RawRow>) -> ModelResult<Collection> {
        let meta = self.schema().model(model)?;
        Ok(Collection::new(
            rows.into_iter().map(|row| self.hydrate_record(&meta, row, None)).collect(),
        ))
    }

    pub(crate) fn hydrate_record(&self, meta: &Arc<ModelMeta>, row: RawRow, pivot: Option<Pivot>) -> Arc<Record> {
        Arc::new(Record::hydrate(meta.clone(), row, pivot, self.clone()))
    }

    /// Run a select through the executor, logging it when query logging is on
    pub(crate) async fn fetch(&self, query: &QueryBuilder, context: &str) -> ModelResult<Vec<RawRow>> {
        if self.config().log_queries {
            tracing::debug!("{} [{}]: {}", context, self.executor().backend_name(), query.to_sql());
        }
        self.executor().fetch_all(query).await
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("backend", &self.inner.executor.backend_name())
            .field("config", &self.inner.config)
            .finish()
    }
}
