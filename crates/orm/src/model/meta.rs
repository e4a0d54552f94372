//! Type-erased model description held by records and the schema

use std::collections::HashMap;

use super::core_trait::Model;
use crate::casts::CastType;
use crate::relationships::RelationRegistry;

/// Runtime copy of everything a `Model` implementation declares
#[derive(Debug, Clone)]
pub struct ModelMeta {
    name: String,
    table: String,
    primary_key: String,
    soft_deletes: bool,
    deleted_at_column: String,
    casts: HashMap<String, CastType>,
    relations: RelationRegistry,
}

impl ModelMeta {
    /// Capture the description of `M`, running its relation declarations
    pub fn of<M: Model>() -> Self {
        let mut relations = RelationRegistry::new();
        M::relations(&mut relations);

        Self {
            name: M::model_name().to_string(),
            table: M::table_name().to_string(),
            primary_key: M::primary_key_name().to_string(),
            soft_deletes: M::uses_soft_deletes(),
            deleted_at_column: M::deleted_at_column().to_string(),
            casts: M::casts()
                .into_iter()
                .map(|(key, cast)| (key.to_string(), cast))
                .collect(),
            relations,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    pub fn uses_soft_deletes(&self) -> bool {
        self.soft_deletes
    }

    pub fn deleted_at_column(&self) -> &str {
        &self.deleted_at_column
    }

    pub fn cast_for(&self, key: &str) -> Option<&CastType> {
        self.casts.get(key)
    }

    pub fn relations(&self) -> &RelationRegistry {
        &self.relations
    }

    /// `table.column`
    pub fn qualified(&self, column: &str) -> String {
        format!("{}.{}", self.table, column)
    }

    /// `table.deleted_at` when the model soft deletes
    pub fn soft_delete_column(&self) -> Option<String> {
        if self.soft_deletes {
            Some(self.qualified(&self.deleted_at_column))
        } else {
            None
        }
    }
}
