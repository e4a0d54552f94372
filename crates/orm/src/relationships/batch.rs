//! Batch Resolver - Resolves one relation for a whole parent set
//!
//! Collect the distinct join keys, run one query for all of them, group the
//! results in a `Dictionary` and hand every parent its match. Morph-to runs
//! this once per distinct type tag.

use std::sync::Arc;

use super::constraints::RelationshipConstraint;
use super::dictionary::{Dictionary, JoinKey, KeySet};
use super::metadata::{Relation, RelationType};
use super::query::{hydrate_related, relation_query_for_keys};
use crate::backends::core::as_text;
use crate::error::{ModelError, ModelResult};
use crate::model::ModelMeta;
use crate::record::{Record, RelationValue};
use crate::session::Session;

/// Resolve relation `name` for every record in `parents` and store the result
/// in each record's relation map.
///
/// All parents must be of the same model. A constraint is applied once to the
/// batched query, after the key filter.
pub async fn load_relation(
    session: &Session,
    parents: &[&Record],
    name: &str,
    constraint: Option<&dyn RelationshipConstraint>,
) -> ModelResult<()> {
    let model = match parents.first() {
        Some(parent) => parent.model_name(),
        None => return Ok(()),
    };

    let relation = session
        .schema()
        .relation(model, name)?
        .ok_or_else(|| ModelError::RelationNotFound {
            model: model.to_string(),
            relation: name.to_string(),
        })?;

    if relation.relation_type == RelationType::MorphTo {
        return load_morph_to(session, parents, &relation, constraint).await;
    }

    let related_name = relation.related_model.as_deref().ok_or_else(|| {
        ModelError::Configuration(format!("Relation '{}' on model '{}' has no related model", name, model))
    })?;
    let related = session.schema().model(related_name)?;

    load_group(session, parents, &relation, &related, constraint).await
}

/// Group parents by type tag in first-appearance order and resolve each group
/// against its concrete model. A failure leaves earlier groups assigned.
async fn load_morph_to(
    session: &Session,
    parents: &[&Record],
    relation: &Relation,
    constraint: Option<&dyn RelationshipConstraint>,
) -> ModelResult<()> {
    let morph = relation.morph.as_ref().ok_or_else(|| {
        ModelError::Configuration(format!(
            "Relation '{}' on model '{}' has no morph type column",
            relation.name, relation.parent_model
        ))
    })?;

    let mut groups: Vec<(String, Vec<&Record>)> = Vec::new();
    for parent in parents {
        match parent.get_raw(&morph.type_column).filter(|tag| !tag.is_null()) {
            Some(tag) => {
                let tag = as_text(tag);
                match groups.iter_mut().find(|(existing, _)| *existing == tag) {
                    Some((_, members)) => members.push(*parent),
                    None => groups.push((tag, vec![*parent])),
                }
            }
            None => parent.set_resolved_relation(&relation.name, RelationValue::One(None)),
        }
    }

    tracing::debug!(
        "Resolving morph-to '{}' on {} across {} type(s)",
        relation.name,
        relation.parent_model,
        groups.len()
    );

    for (tag, members) in groups {
        let related = session.schema().resolve_morph(&tag)?;
        load_group(session, &members, relation, &related, constraint).await?;
    }

    Ok(())
}

async fn load_group(
    session: &Session,
    parents: &[&Record],
    relation: &Relation,
    related: &Arc<ModelMeta>,
    constraint: Option<&dyn RelationshipConstraint>,
) -> ModelResult<()> {
    let key_column = relation.parent_key_column();

    let mut keys = KeySet::new();
    for parent in parents {
        if let Some(value) = parent.get_raw(key_column) {
            keys.insert(value);
        }
    }

    if keys.is_empty() {
        tracing::debug!(
            "No join keys for '{}' across {} {} record(s), skipping query",
            relation.name,
            parents.len(),
            relation.parent_model
        );
        let empty = RelationValue::empty_for(relation);
        for parent in parents {
            parent.set_resolved_relation(&relation.name, empty.clone());
        }
        return Ok(());
    }

    let key_count = keys.len();
    let mut query = relation_query_for_keys(session, relation, related, keys.into_values())?;
    if let Some(constraint) = constraint {
        constraint.validate()?;
        query = constraint.apply(query)?;
    }

    tracing::debug!(
        "Eager loading '{}' ({}) for {} {} record(s), {} distinct key(s)",
        relation.name,
        related.name(),
        parents.len(),
        relation.parent_model,
        key_count
    );

    let context = format!("eager load {}.{}", relation.parent_model, relation.name);
    let rows = session.fetch(&query, &context).await?;
    let dictionary = Dictionary::build(hydrate_related(session, relation, related, rows));

    tracing::trace!("Dictionary for '{}' holds {} key(s)", relation.name, dictionary.len());

    for parent in parents {
        let key = parent.get_raw(key_column).and_then(JoinKey::from_value);
        let value = if relation.is_collection() {
            RelationValue::Many(dictionary.many(key.as_ref()))
        } else {
            RelationValue::One(dictionary.one(key.as_ref()))
        };
        parent.set_resolved_relation(&relation.name, value);
    }

    Ok(())
}
