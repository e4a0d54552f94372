//! Relation Descriptors - Data-only description of one association
//!
//! A `Relation` is built by a model's relation-declaring function. Building
//! it performs no I/O and no validation; `validate` runs at first resolution.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// The ten association shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationType {
    /// Many-to-one: the parent holds the foreign key
    BelongsTo,
    /// One-to-one: the related record holds the foreign key
    HasOne,
    /// One-to-many: the related records hold the foreign key
    HasMany,
    /// One related record reached through an intermediate type
    HasOneThrough,
    /// Many related records reached through an intermediate type
    HasManyThrough,
    /// Inverse polymorphic: the parent holds a type tag and an id
    MorphTo,
    /// Polymorphic one-to-one
    MorphOne,
    /// Polymorphic one-to-many
    MorphMany,
    /// Many-to-many through a pivot table
    BelongsToMany,
    /// Polymorphic many-to-many through a pivot table carrying a type column
    MorphToMany,
}

impl RelationType {
    /// Returns true if this relation resolves to a collection
    pub fn is_collection(self) -> bool {
        matches!(
            self,
            Self::HasMany | Self::HasManyThrough | Self::MorphMany | Self::BelongsToMany | Self::MorphToMany
        )
    }

    /// Returns true if this relation stores a type tag
    pub fn is_polymorphic(self) -> bool {
        matches!(self, Self::MorphTo | Self::MorphOne | Self::MorphMany | Self::MorphToMany)
    }

    /// Returns true if this relation requires a pivot table
    pub fn requires_pivot(self) -> bool {
        matches!(self, Self::BelongsToMany | Self::MorphToMany)
    }

    /// Returns true if this relation joins an intermediate type
    pub fn is_through(self) -> bool {
        matches!(self, Self::HasOneThrough | Self::HasManyThrough)
    }

    /// Returns true if the parent holds the join key pointing at the related record
    pub fn parent_holds_foreign_key(self) -> bool {
        matches!(self, Self::BelongsTo | Self::MorphTo)
    }
}

/// Intermediate-type configuration for through relations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThroughConfig {
    /// Model name of the intermediate type
    pub through_model: String,
    /// Column on the related type referencing the intermediate type
    pub second_key: String,
    /// Column on the intermediate type referenced by `second_key`
    pub second_local_key: String,
    /// Include intermediate rows carrying a soft-delete marker
    pub with_trashed_parents: bool,
}

/// Pivot table configuration for many-to-many relations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotConfig {
    /// The pivot table name
    pub table: String,
    /// Pivot column referencing the related type
    pub related_pivot_key: String,
    /// Column on the related type referenced by `related_pivot_key`
    pub related_key: String,
    /// Extra pivot columns exposed on the Pivot value
    pub columns: Vec<String>,
    /// Expose `created_at`/`updated_at` from the pivot table
    pub with_timestamps: bool,
    /// Custom accessor name for the Pivot value
    pub accessor: Option<String>,
}

impl PivotConfig {
    /// Every pivot column selected alongside the related record, join keys first
    pub fn selected_columns(&self, foreign_pivot_key: &str) -> Vec<String> {
        let mut columns = vec![foreign_pivot_key.to_string(), self.related_pivot_key.clone()];
        let timestamps = ["created_at", "updated_at"];
        let extra = self
            .columns
            .iter()
            .map(String::as_str)
            .chain(timestamps.iter().copied().filter(|_| self.with_timestamps));
        for column in extra {
            if !columns.iter().any(|c| c == column) {
                columns.push(column.to_string());
            }
        }
        columns
    }

    /// Validate the pivot configuration
    pub fn validate(&self) -> ModelResult<()> {
        if self.table.is_empty() {
            return Err(ModelError::Configuration("Pivot table name cannot be empty".to_string()));
        }

        if self.related_pivot_key.is_empty() || self.related_key.is_empty() {
            return Err(ModelError::Configuration(format!(
                "Pivot table '{}' is missing its related key columns",
                self.table
            )));
        }

        Ok(())
    }
}

/// Polymorphic configuration: where the type tag lives and which tag to match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolymorphicConfig {
    /// Column holding the type tag
    pub type_column: String,
    /// Tag to filter on; `None` for morph-to, where the tag is read per parent
    pub morph_class: Option<String>,
}

/// Descriptor for one association
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    /// Name the relation is declared and resolved under
    pub name: String,
    pub relation_type: RelationType,
    /// Model declaring the relation
    pub parent_model: String,
    /// Related model; `None` for morph-to, which resolves it from the type tag
    pub related_model: Option<String>,
    /// Belongs-to/morph-to: column on the parent. Has-*/morph-one/many: column
    /// on the related type. Through: column on the intermediate type.
    /// Many-to-many: pivot column referencing the parent.
    pub foreign_key: String,
    /// Parent column holding the join key (unused by belongs-to/morph-to)
    pub local_key: String,
    /// Related column referenced by belongs-to/morph-to; `None` means the
    /// related primary key
    pub owner_key: Option<String>,
    pub morph: Option<PolymorphicConfig>,
    pub through: Option<ThroughConfig>,
    pub pivot: Option<PivotConfig>,
    /// Include related records carrying a soft-delete marker
    pub with_trashed: bool,
}

impl Relation {
    /// Create a bare descriptor; the declarator fills in conventions
    pub fn new(name: &str, relation_type: RelationType, parent_model: &str) -> Self {
        Self {
            name: name.to_string(),
            relation_type,
            parent_model: parent_model.to_string(),
            related_model: None,
            foreign_key: String::new(),
            local_key: String::new(),
            owner_key: None,
            morph: None,
            through: None,
            pivot: None,
            with_trashed: false,
        }
    }

    /// Parent column whose value correlates the parent with related records
    pub fn parent_key_column(&self) -> &str {
        if self.relation_type.parent_holds_foreign_key() {
            &self.foreign_key
        } else {
            &self.local_key
        }
    }

    /// Whether this relation resolves to a collection
    pub fn is_collection(&self) -> bool {
        self.relation_type.is_collection()
    }

    pub fn foreign_key(mut self, column: &str) -> Self {
        self.foreign_key = column.to_string();
        self
    }

    pub fn local_key(mut self, column: &str) -> Self {
        self.local_key = column.to_string();
        self
    }

    pub fn owner_key(mut self, column: &str) -> Self {
        self.owner_key = Some(column.to_string());
        self
    }

    /// Override the column on the related type referencing the intermediate type
    pub fn second_key(mut self, column: &str) -> Self {
        if let Some(ref mut through) = self.through {
            through.second_key = column.to_string();
        }
        self
    }

    /// Override the intermediate column referenced by the second key
    pub fn second_local_key(mut self, column: &str) -> Self {
        if let Some(ref mut through) = self.through {
            through.second_local_key = column.to_string();
        }
        self
    }

    /// Include intermediate rows that are soft deleted
    pub fn with_trashed_parents(mut self) -> Self {
        if let Some(ref mut through) = self.through {
            through.with_trashed_parents = true;
        }
        self
    }

    /// Include related records that are soft deleted
    pub fn with_trashed(mut self) -> Self {
        self.with_trashed = true;
        self
    }

    /// Override the morph type column
    pub fn morph_type(mut self, column: &str) -> Self {
        if let Some(ref mut morph) = self.morph {
            morph.type_column = column.to_string();
        }
        self
    }

    pub fn pivot_table(mut self, table: &str) -> Self {
        if let Some(ref mut pivot) = self.pivot {
            pivot.table = table.to_string();
        }
        self
    }

    pub fn related_pivot_key(mut self, column: &str) -> Self {
        if let Some(ref mut pivot) = self.pivot {
            pivot.related_pivot_key = column.to_string();
        }
        self
    }

    /// Expose extra pivot columns on the Pivot value
    pub fn with_pivot(mut self, columns: &[&str]) -> Self {
        if let Some(ref mut pivot) = self.pivot {
            for column in columns {
                if !pivot.columns.iter().any(|c| c == column) {
                    pivot.columns.push(column.to_string());
                }
            }
        }
        self
    }

    /// Expose pivot `created_at`/`updated_at`
    pub fn with_timestamps(mut self) -> Self {
        if let Some(ref mut pivot) = self.pivot {
            pivot.with_timestamps = true;
        }
        self
    }

    /// Attach the Pivot value under a custom accessor name
    pub fn as_accessor(mut self, accessor: &str) -> Self {
        if let Some(ref mut pivot) = self.pivot {
            pivot.accessor = Some(accessor.to_string());
        }
        self
    }

    /// Validate the descriptor for consistency
    pub fn validate(&self) -> ModelResult<()> {
        let fail = |reason: &str| {
            Err(ModelError::Configuration(format!(
                "Relation '{}' on model '{}' {}",
                self.name, self.parent_model, reason
            )))
        };

        if self.name.is_empty() {
            return fail("has no name");
        }

        if self.foreign_key.is_empty() {
            return fail("has no foreign key");
        }

        if !self.relation_type.parent_holds_foreign_key() && self.local_key.is_empty() {
            return fail("has no local key");
        }

        if self.relation_type != RelationType::MorphTo && self.related_model.is_none() {
            return fail("does not name a related model");
        }

        if self.relation_type.is_polymorphic() {
            match self.morph {
                None => return fail("requires polymorphic configuration"),
                Some(ref morph) if morph.type_column.is_empty() => return fail("has no morph type column"),
                Some(ref morph) if self.relation_type != RelationType::MorphTo && morph.morph_class.is_none() => {
                    return fail("has no morph class to match");
                }
                _ => {}
            }
        }

        if self.relation_type.requires_pivot() {
            match self.pivot {
                None => return fail("requires pivot configuration"),
                Some(ref pivot) => pivot.validate()?,
            }
        }

        if self.relation_type.is_through() {
            match self.through {
                None => return fail("requires an intermediate model"),
                Some(ref through) if through.second_key.is_empty() || through.second_local_key.is_empty() => {
                    return fail("has incomplete intermediate keys");
                }
                _ => {}
            }
        }

        Ok(())
    }
}
