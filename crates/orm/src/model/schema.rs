//! Schema - Registry of models and polymorphic type tags
//!
//! Models are registered by type. Relation descriptors are built from each
//! model's registry on first use, validated, and cached.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;

use super::core_trait::Model;
use super::meta::ModelMeta;
use crate::error::{ModelError, ModelResult};
use crate::relationships::{Relation, RelationBuilder};

/// Registered models, the morph map and resolved relation descriptors
#[derive(Debug, Default)]
pub struct Schema {
    models: HashMap<String, Arc<ModelMeta>>,
    /// morph tag -> model name
    morph_map: HashMap<String, String>,
    /// model name -> the first tag registered for it
    morph_classes: HashMap<String, String>,
    relations: DashMap<(String, String), Arc<Relation>>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register model `M`
    pub fn register<M: Model>(mut self) -> Self {
        let meta = ModelMeta::of::<M>();
        tracing::debug!("Registered model {} ({} relations)", meta.name(), meta.relations().len());
        self.models.insert(meta.name().to_string(), Arc::new(meta));
        self
    }

    /// Store `model` under `tag` in polymorphic type columns.
    ///
    /// A tag keeps the model it was first mapped to. A model mapped under
    /// several tags resolves from all of them but writes the first one.
    pub fn morph_map(mut self, tag: &str, model: &str) -> Self {
        if let Some(existing) = self.morph_map.get(tag) {
            if existing != model {
                tracing::warn!("Morph tag '{}' already maps to {}; ignoring {}", tag, existing, model);
            }
            return self;
        }
        self.morph_map.insert(tag.to_string(), model.to_string());
        self.morph_classes
            .entry(model.to_string())
            .or_insert_with(|| tag.to_string());
        self
    }

    /// Tag stored in type columns for `model`: its morph-map tag, else its name
    pub fn morph_class_of(&self, model: &str) -> String {
        self.morph_classes
            .get(model)
            .cloned()
            .unwrap_or_else(|| model.to_string())
    }

    pub fn model(&self, name: &str) -> ModelResult<Arc<ModelMeta>> {
        self.models
            .get(name)
            .cloned()
            .ok_or_else(|| ModelError::Configuration(format!("Model '{}' is not registered", name)))
    }

    pub fn has_model(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// Resolve a stored type tag: morph map first, then registered model names
    pub fn resolve_morph(&self, tag: &str) -> ModelResult<Arc<ModelMeta>> {
        if let Some(model) = self.morph_map.get(tag) {
            return self.model(model);
        }
        self.models.get(tag).cloned().ok_or_else(|| {
            ModelError::Configuration(format!("Unknown morph type '{}': not in the morph map or a registered model", tag))
        })
    }

    /// Whether `model` declares a relation called `name`
    pub fn declares(&self, model: &str, name: &str) -> bool {
        self.models
            .get(model)
            .map(|meta| meta.relations().contains(name))
            .unwrap_or(false)
    }

    /// Build (once) and validate the descriptor for `model.name`.
    /// Returns `Ok(None)` when the model does not declare `name`.
    pub fn relation(&self, model: &str, name: &str) -> ModelResult<Option<Arc<Relation>>> {
        let cache_key = (model.to_string(), name.to_string());
        if let Some(relation) = self.relations.get(&cache_key) {
            return Ok(Some(relation.clone()));
        }

        let meta = self.model(model)?;
        let factory = match meta.relations().get(name) {
            Some(factory) => factory,
            None => return Ok(None),
        };

        let builder = RelationBuilder::new(name, meta.name(), meta.primary_key(), self.morph_classes.clone());
        let relation = factory(&builder);

        relation.validate()?;
        if let Some(ref related) = relation.related_model {
            self.model(related).map_err(|_| {
                ModelError::Configuration(format!(
                    "Relation '{}' on model '{}' references unregistered model '{}'",
                    name, model, related
                ))
            })?;
        }
        if let Some(ref through) = relation.through {
            self.model(&through.through_model).map_err(|_| {
                ModelError::Configuration(format!(
                    "Relation '{}' on model '{}' goes through unregistered model '{}'",
                    name, model, through.through_model
                ))
            })?;
        }

        let relation = Arc::new(relation);
        self.relations.insert(cache_key, relation.clone());
        Ok(Some(relation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relationships::RelationRegistry;

    struct User;
    impl Model for User {
        fn model_name() -> &'static str {
            "User"
        }
        fn table_name() -> &'static str {
            "users"
        }
        fn relations(registry: &mut RelationRegistry) {
            registry
                .define("posts", |r| r.has_many::<Post>())
                .define("ghosts", |r| r.has_many::<Ghost>());
        }
    }

    struct Post;
    impl Model for Post {
        fn model_name() -> &'static str {
            "Post"
        }
        fn table_name() -> &'static str {
            "posts"
        }
        fn uses_soft_deletes() -> bool {
            true
        }
    }

    struct Ghost;
    impl Model for Ghost {
        fn model_name() -> &'static str {
            "Ghost"
        }
        fn table_name() -> &'static str {
            "ghosts"
        }
    }

    fn schema() -> Schema {
        Schema::new()
            .register::<User>()
            .register::<Post>()
            .morph_map("post", "Post")
    }

    #[test]
    fn test_models_and_morph_map() {
        let schema = schema();
        assert_eq!(schema.model("Post").unwrap().table(), "posts");
        assert_eq!(
            schema.model("Post").unwrap().soft_delete_column().as_deref(),
            Some("posts.deleted_at")
        );
        assert_eq!(schema.morph_class_of("Post"), "post");
        assert_eq!(schema.morph_class_of("User"), "User");
        assert_eq!(schema.resolve_morph("post").unwrap().name(), "Post");
        assert_eq!(schema.resolve_morph("User").unwrap().name(), "User");
        assert!(schema.resolve_morph("video").unwrap_err().is_configuration());
    }

    #[test]
    fn test_first_registered_morph_tag_wins() {
        let schema = Schema::new()
            .register::<User>()
            .register::<Post>()
            .morph_map("post", "Post")
            .morph_map("article", "Post")
            .morph_map("entry", "Post")
            .morph_map("post", "User");

        for _ in 0..8 {
            assert_eq!(schema.morph_class_of("Post"), "post");
        }
        assert_eq!(schema.resolve_morph("article").unwrap().name(), "Post");
        assert_eq!(schema.resolve_morph("post").unwrap().name(), "Post");
        assert_eq!(schema.morph_class_of("User"), "User");
    }

    #[test]
    fn test_relation_lookup_is_lazy_and_cached() {
        let schema = schema();
        assert!(schema.declares("User", "posts"));
        assert!(schema.relation("User", "missing").unwrap().is_none());

        let first = schema.relation("User", "posts").unwrap().unwrap();
        let second = schema.relation("User", "posts").unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.foreign_key, "user_id");
    }

    #[test]
    fn test_unregistered_related_model_fails_at_resolution() {
        let schema = schema();
        // Declaring is fine; resolving surfaces the configuration error
        assert!(schema.declares("User", "ghosts"));
        let err = schema.relation("User", "ghosts").unwrap_err();
        assert!(err.is_configuration());
    }
}
