//! Relation Builder - Declares descriptors, applying naming conventions
//! for every key the caller leaves out.

use std::collections::HashMap;

use super::metadata::{PivotConfig, PolymorphicConfig, Relation, RelationType, ThroughConfig};
use crate::model::naming::{foreign_key_for, pivot_table_name, pluralize, snake_case};
use crate::model::Model;

/// Handed to a relation factory; knows the declaring model and relation name
#[derive(Debug, Clone)]
pub struct RelationBuilder {
    relation_name: String,
    parent_model: String,
    parent_primary_key: String,
    parent_morph_class: String,
    morph_map: HashMap<String, String>,
}

impl RelationBuilder {
    /// `morph_map` maps model name to morph tag
    pub(crate) fn new(
        relation_name: &str,
        parent_model: &str,
        parent_primary_key: &str,
        morph_map: HashMap<String, String>,
    ) -> Self {
        let parent_morph_class = morph_map
            .get(parent_model)
            .cloned()
            .unwrap_or_else(|| parent_model.to_string());

        Self {
            relation_name: relation_name.to_string(),
            parent_model: parent_model.to_string(),
            parent_primary_key: parent_primary_key.to_string(),
            parent_morph_class,
            morph_map,
        }
    }

    pub fn relation_name(&self) -> &str {
        &self.relation_name
    }

    pub fn parent_model(&self) -> &str {
        &self.parent_model
    }

    /// Tag stored in type columns for the declaring model
    pub fn parent_morph_class(&self) -> &str {
        &self.parent_morph_class
    }

    fn morph_class_of(&self, model: &str) -> String {
        self.morph_map.get(model).cloned().unwrap_or_else(|| model.to_string())
    }

    fn relation(&self, relation_type: RelationType, related: Option<&str>) -> Relation {
        let mut relation = Relation::new(&self.relation_name, relation_type, &self.parent_model);
        relation.related_model = related.map(str::to_string);
        relation.local_key = self.parent_primary_key.clone();
        relation
    }

    /// Parent holds `{relation}_{ownerKey}` pointing at `M`
    pub fn belongs_to<M: Model>(&self) -> Relation {
        let mut relation = self.relation(RelationType::BelongsTo, Some(M::model_name()));
        relation.foreign_key = format!("{}_{}", snake_case(&self.relation_name), M::primary_key_name());
        relation.owner_key = Some(M::primary_key_name().to_string());
        relation
    }

    /// One `M` holds `{parent}_id`
    pub fn has_one<M: Model>(&self) -> Relation {
        let mut relation = self.relation(RelationType::HasOne, Some(M::model_name()));
        relation.foreign_key = foreign_key_for(&self.parent_model);
        relation
    }

    /// Many `M` hold `{parent}_id`
    pub fn has_many<M: Model>(&self) -> Relation {
        let mut relation = self.relation(RelationType::HasMany, Some(M::model_name()));
        relation.foreign_key = foreign_key_for(&self.parent_model);
        relation
    }

    fn through<R: Model, T: Model>(&self, relation_type: RelationType) -> Relation {
        let mut relation = self.relation(relation_type, Some(R::model_name()));
        relation.foreign_key = foreign_key_for(&self.parent_model);
        relation.through = Some(ThroughConfig {
            through_model: T::model_name().to_string(),
            second_key: foreign_key_for(T::model_name()),
            second_local_key: T::primary_key_name().to_string(),
            with_trashed_parents: false,
        });
        relation
    }

    /// One `R` reached through `T`
    pub fn has_one_through<R: Model, T: Model>(&self) -> Relation {
        self.through::<R, T>(RelationType::HasOneThrough)
    }

    /// Many `R` reached through `T`
    pub fn has_many_through<R: Model, T: Model>(&self) -> Relation {
        self.through::<R, T>(RelationType::HasManyThrough)
    }

    /// Parent holds `{relation}_type` and `{relation}_id`
    pub fn morph_to(&self) -> Relation {
        let name = snake_case(&self.relation_name);
        let mut relation = self.relation(RelationType::MorphTo, None);
        relation.foreign_key = format!("{}_id", name);
        relation.morph = Some(PolymorphicConfig {
            type_column: format!("{}_type", name),
            morph_class: None,
        });
        relation
    }

    fn morph_owner<M: Model>(&self, relation_type: RelationType, name: &str) -> Relation {
        let mut relation = self.relation(relation_type, Some(M::model_name()));
        relation.foreign_key = format!("{}_id", name);
        relation.morph = Some(PolymorphicConfig {
            type_column: format!("{}_type", name),
            morph_class: Some(self.parent_morph_class.clone()),
        });
        relation
    }

    /// One `M` holds `{name}_type` = parent tag and `{name}_id`
    pub fn morph_one<M: Model>(&self, name: &str) -> Relation {
        self.morph_owner::<M>(RelationType::MorphOne, name)
    }

    /// Many `M` hold `{name}_type` = parent tag and `{name}_id`
    pub fn morph_many<M: Model>(&self, name: &str) -> Relation {
        self.morph_owner::<M>(RelationType::MorphMany, name)
    }

    /// Many `M` joined through the `{parent}_{m}` pivot table (names sorted)
    pub fn belongs_to_many<M: Model>(&self) -> Relation {
        let mut relation = self.relation(RelationType::BelongsToMany, Some(M::model_name()));
        relation.foreign_key = foreign_key_for(&self.parent_model);
        relation.pivot = Some(PivotConfig {
            table: pivot_table_name(&self.parent_model, M::model_name()),
            related_pivot_key: foreign_key_for(M::model_name()),
            related_key: M::primary_key_name().to_string(),
            columns: Vec::new(),
            with_timestamps: false,
            accessor: None,
        });
        relation
    }

    /// Many `M` joined through the `plural(name)` pivot table, whose
    /// `{name}_type` column holds the parent tag
    pub fn morph_to_many<M: Model>(&self, name: &str) -> Relation {
        let mut relation = self.relation(RelationType::MorphToMany, Some(M::model_name()));
        relation.foreign_key = format!("{}_id", name);
        relation.morph = Some(PolymorphicConfig {
            type_column: format!("{}_type", name),
            morph_class: Some(self.parent_morph_class.clone()),
        });
        relation.pivot = Some(PivotConfig {
            table: pluralize(name),
            related_pivot_key: foreign_key_for(M::model_name()),
            related_key: M::primary_key_name().to_string(),
            columns: Vec::new(),
            with_timestamps: false,
            accessor: None,
        });
        relation
    }

    /// Inverse of `morph_to_many`: many `M` whose pivot rows carry `M`'s tag
    pub fn morphed_by_many<M: Model>(&self, name: &str) -> Relation {
        let mut relation = self.relation(RelationType::MorphToMany, Some(M::model_name()));
        relation.foreign_key = foreign_key_for(&self.parent_model);
        relation.morph = Some(PolymorphicConfig {
            type_column: format!("{}_type", name),
            morph_class: Some(self.morph_class_of(M::model_name())),
        });
        relation.pivot = Some(PivotConfig {
            table: pluralize(name),
            related_pivot_key: format!("{}_id", name),
            related_key: M::primary_key_name().to_string(),
            columns: Vec::new(),
            with_timestamps: false,
            accessor: None,
        });
        relation
    }
}
