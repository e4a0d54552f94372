//! Eager Loading Planner - Turns relation paths into batched loads
//!
//! Paths such as `"posts.comments.author"` are merged into a tree. Each depth
//! of the tree is resolved breadth-first: every relation at depth N runs (one
//! batch per relation and record type) before depth N+1 starts, using the
//! records resolved at depth N as its parents.

use std::collections::HashSet;
use std::sync::Arc;

use super::batch;
use super::constraints::{RelationshipConstraint, RelationshipConstraintBuilder};
use crate::error::{ModelError, ModelResult};
use crate::immutable;
use crate::record::Record;
use crate::session::Session;

/// Represents a relationship path to be eagerly loaded
#[derive(Debug, Clone)]
pub struct EagerLoadSpec {
    /// Relationship path (e.g., "posts" or "posts.comments")
    pub relation: String,
    /// Optional constraint applied to the last segment of the path
    pub constraint: Option<Arc<dyn RelationshipConstraint>>,
}

/// One relation in the merged load tree
#[derive(Debug, Clone)]
struct LoadNode {
    name: String,
    constraint: Option<Arc<dyn RelationshipConstraint>>,
    children: Vec<LoadNode>,
}

impl LoadNode {
    fn depth(&self) -> usize {
        1 + self.children.iter().map(LoadNode::depth).max().unwrap_or(0)
    }
}

type PendingLevel<'a> = Vec<(Vec<Arc<Record>>, &'a [LoadNode])>;

/// Eager loader managing relation paths and their constraints
#[derive(Debug, Clone, Default)]
pub struct EagerLoader {
    specs: Vec<EagerLoadSpec>,
}

impl EagerLoader {
    /// Create a new eager loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader for plain relation paths
    pub fn from_paths(paths: &[&str]) -> Self {
        paths.iter().fold(Self::new(), |loader, path| loader.with(path))
    }

    /// Add a relationship path to eagerly load
    pub fn with(mut self, relation: &str) -> Self {
        self.specs.push(EagerLoadSpec {
            relation: relation.to_string(),
            constraint: None,
        });
        self
    }

    /// Add a relationship path whose last segment is constrained
    pub fn with_constraint<F>(mut self, relation: &str, constraint_fn: F) -> Self
    where
        F: FnOnce(RelationshipConstraintBuilder) -> RelationshipConstraintBuilder,
    {
        let constraints = constraint_fn(RelationshipConstraintBuilder::new());
        self.specs.push(EagerLoadSpec {
            relation: relation.to_string(),
            constraint: Some(Arc::new(constraints)),
        });
        self
    }

    /// Add a relationship path with a prebuilt constraint
    pub fn with_constraint_object(mut self, relation: &str, constraint: Arc<dyn RelationshipConstraint>) -> Self {
        self.specs.push(EagerLoadSpec {
            relation: relation.to_string(),
            constraint: Some(constraint),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn specs(&self) -> &[EagerLoadSpec] {
        &self.specs
    }

    /// Every relation path the loader will resolve, prefixes included, in
    /// breadth-first order
    pub fn planned_paths(&self) -> ModelResult<Vec<String>> {
        let tree = self.build_tree()?;
        let mut paths = Vec::new();
        let mut level: Vec<(String, &LoadNode)> = tree.iter().map(|n| (n.name.clone(), n)).collect();
        while !level.is_empty() {
            let mut next = Vec::new();
            for (path, node) in level {
                for child in &node.children {
                    next.push((format!("{}.{}", path, child.name), child));
                }
                paths.push(path);
            }
            level = next;
        }
        Ok(paths)
    }

    /// Merge every path into a tree. A path implies its prefixes; constraints
    /// attach to the last segment of the path they were given with.
    fn build_tree(&self) -> ModelResult<Vec<LoadNode>> {
        let mut roots: Vec<LoadNode> = Vec::new();

        for spec in &self.specs {
            let segments: Vec<&str> = spec.relation.split('.').map(str::trim).collect();
            if segments.iter().any(|segment| segment.is_empty()) {
                return Err(ModelError::Configuration(format!(
                    "Invalid eager-load path '{}'",
                    spec.relation
                )));
            }

            let mut level = &mut roots;
            let last = segments.len() - 1;
            for (index, segment) in segments.iter().enumerate() {
                let position = match level.iter().position(|node| node.name == *segment) {
                    Some(position) => position,
                    None => {
                        level.push(LoadNode {
                            name: segment.to_string(),
                            constraint: None,
                            children: Vec::new(),
                        });
                        level.len() - 1
                    }
                };
                if index == last && spec.constraint.is_some() {
                    level[position].constraint = spec.constraint.clone();
                }
                level = &mut level[position].children;
            }
        }

        Ok(roots)
    }

    fn validate_tree(&self, session: &Session, tree: &[LoadNode], parents: &[&Record]) -> ModelResult<()> {
        let max_depth = session.config().max_eager_depth;
        if let Some(deepest) = tree.iter().map(LoadNode::depth).max() {
            if deepest > max_depth {
                return Err(ModelError::Configuration(format!(
                    "Eager-load path depth {} exceeds the maximum of {}",
                    deepest, max_depth
                )));
            }
        }

        let models: Vec<&str> = distinct_models(parents);
        for node in tree {
            if !models.iter().any(|model| session.schema().declares(model, &node.name)) {
                return Err(ModelError::RelationNotFound {
                    model: models.first().copied().unwrap_or_default().to_string(),
                    relation: node.name.clone(),
                });
            }
        }

        Ok(())
    }

    /// Resolve every path for `parents`. A parent that already holds a
    /// requested relation is refused before any query runs; `load_missing`
    /// fills the gaps instead.
    pub async fn load(&self, session: &Session, parents: &[&Record]) -> ModelResult<()> {
        self.run(session, parents, false).await
    }

    /// Resolve every path for `parents`, skipping records that already hold
    /// the relation (their existing results still feed deeper segments)
    pub async fn load_missing(&self, session: &Session, parents: &[&Record]) -> ModelResult<()> {
        self.run(session, parents, true).await
    }

    async fn run(&self, session: &Session, parents: &[&Record], missing_only: bool) -> ModelResult<()> {
        if self.specs.is_empty() || parents.is_empty() {
            return Ok(());
        }

        let tree = self.build_tree()?;
        self.validate_tree(session, &tree, parents)?;

        let mut level = resolve_level(session, parents, &tree, missing_only).await?;
        while !level.is_empty() {
            let mut next = Vec::new();
            for (records, nodes) in &level {
                let refs: Vec<&Record> = records.iter().map(|r| r.as_ref()).collect();
                next.extend(resolve_level(session, &refs, nodes, missing_only).await?);
            }
            level = next;
        }

        Ok(())
    }
}

/// Resolve `nodes` against `parents` and collect the next depth's parent sets
async fn resolve_level<'a>(
    session: &Session,
    parents: &[&Record],
    nodes: &'a [LoadNode],
    missing_only: bool,
) -> ModelResult<PendingLevel<'a>> {
    if !missing_only {
        refuse_reload(parents, nodes)?;
    }

    let groups = group_by_model(parents);
    let mut next = Vec::new();

    for node in nodes {
        let mut children: Vec<Arc<Record>> = Vec::new();

        for (model, group) in &groups {
            if !session.schema().declares(model, &node.name) {
                tracing::debug!("Skipping eager load of '{}': not declared on {}", node.name, model);
                continue;
            }

            let pending: Vec<&Record> = group
                .iter()
                .copied()
                .filter(|record| !missing_only || !record.relation_loaded(&node.name))
                .collect();

            if !pending.is_empty() {
                batch::load_relation(session, &pending, &node.name, node.constraint.as_deref()).await?;
            }

            if !node.children.is_empty() {
                for record in group {
                    if let Some(value) = record.loaded_relation(&node.name) {
                        children.extend(value.records());
                    }
                }
            }
        }

        if !children.is_empty() {
            next.push((children, node.children.as_slice()));
        }
    }

    Ok(next)
}

/// Resolved relations are never replaced through the public loaders
fn refuse_reload(parents: &[&Record], nodes: &[LoadNode]) -> ModelResult<()> {
    for node in nodes {
        if let Some(record) = parents.iter().find(|record| record.relation_loaded(&node.name)) {
            return immutable::deny(record.model_name(), &format!("reload relation '{}'", node.name));
        }
    }
    Ok(())
}

/// De-duplicate by identity and group by model, in first-appearance order
fn group_by_model<'r>(records: &[&'r Record]) -> Vec<(String, Vec<&'r Record>)> {
    let mut seen: HashSet<*const Record> = HashSet::new();
    let mut groups: Vec<(String, Vec<&'r Record>)> = Vec::new();

    for record in records {
        if !seen.insert(*record as *const Record) {
            continue;
        }
        match groups.iter_mut().find(|(model, _)| model == record.model_name()) {
            Some((_, members)) => members.push(*record),
            None => groups.push((record.model_name().to_string(), vec![*record])),
        }
    }

    groups
}

fn distinct_models<'r>(records: &[&'r Record]) -> Vec<&'r str> {
    let mut models: Vec<&'r str> = Vec::new();
    for record in records {
        let model = record.model_name();
        if !models.contains(&model) {
            models.push(model);
        }
    }
    models
}
