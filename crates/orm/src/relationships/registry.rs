//! Relation Registry - Static map from relation name to descriptor factory
//!
//! Each model fills its registry once, when it is registered with a
//! `Schema`. Resolution looks names up here; nothing is found by reflection.

use super::builder::RelationBuilder;
use super::metadata::Relation;

/// Descriptor-constructing function for one relation
pub type RelationFactory = fn(&RelationBuilder) -> Relation;

/// Relation names declared by one model, in declaration order
#[derive(Debug, Clone, Default)]
pub struct RelationRegistry {
    factories: Vec<(String, RelationFactory)>,
}

impl RelationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a relation. Declaring the same name twice replaces the factory.
    pub fn define(&mut self, name: &str, factory: RelationFactory) -> &mut Self {
        match self.factories.iter_mut().find(|(existing, _)| existing == name) {
            Some(entry) => entry.1 = factory,
            None => self.factories.push((name.to_string(), factory)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<RelationFactory> {
        self.factories
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, factory)| *factory)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Declared relation names, in declaration order
    pub fn names(&self) -> Vec<&str> {
        self.factories.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relationships::metadata::RelationType;

    fn posts(builder: &RelationBuilder) -> Relation {
        Relation::new(builder.relation_name(), RelationType::HasMany, builder.parent_model())
    }

    #[test]
    fn test_define_and_lookup() {
        let mut registry = RelationRegistry::new();
        registry
            .define("posts", posts)
            .define("country", |r| Relation::new(r.relation_name(), RelationType::BelongsTo, r.parent_model()));

        assert_eq!(registry.names(), vec!["posts", "country"]);
        assert!(registry.contains("posts"));
        assert!(!registry.contains("psots"));

        registry.define("posts", posts);
        assert_eq!(registry.len(), 2);
    }
}
