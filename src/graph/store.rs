//! The immutable, queryable target graph.

use std::collections::{BTreeMap, BTreeSet};

use miette::Diagnostic;
use thiserror::Error;

use crate::target::TargetId;

use super::node::TargetNode;

/// Error raised while constructing or rewriting a target graph.
#[derive(Debug, Diagnostic, Error)]
pub enum GraphError {
    /// A declared dependency names an identifier absent from the node set.
    #[error("target {node} depends on {dependency}, which is not in the graph")]
    #[diagnostic(code(girder::graph::dangling))]
    DanglingDependency {
        /// The node declaring the edge.
        node: Box<TargetId>,
        /// The missing identifier.
        dependency: Box<TargetId>,
    },
}

/// Immutable directed graph of build targets.
///
/// Forward edges are the declared dependencies of each node; reverse
/// adjacency (dependents) is derived at construction and cached. Every
/// edge endpoint is guaranteed to exist in the node set.
#[derive(Clone, Debug, Default)]
pub struct TargetGraph {
    nodes: BTreeMap<TargetId, TargetNode>,
    dependents: BTreeMap<TargetId, BTreeSet<TargetId>>,
}

impl TargetGraph {
    /// Build a graph from a node set, verifying referential integrity.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DanglingDependency`] when any declared
    /// dependency names an identifier absent from `nodes`.
    pub fn new(nodes: impl IntoIterator<Item = TargetNode>) -> Result<Self, GraphError> {
        let by_id: BTreeMap<TargetId, TargetNode> = nodes
            .into_iter()
            .map(|node| (node.id().clone(), node))
            .collect();

        let mut dependents: BTreeMap<TargetId, BTreeSet<TargetId>> = BTreeMap::new();
        for node in by_id.values() {
            for dep in node.deps() {
                if !by_id.contains_key(dep) {
                    return Err(GraphError::DanglingDependency {
                        node: Box::new(node.id().clone()),
                        dependency: Box::new(dep.clone()),
                    });
                }
                dependents
                    .entry(dep.clone())
                    .or_default()
                    .insert(node.id().clone());
            }
        }

        Ok(Self {
            nodes: by_id,
            dependents,
        })
    }

    /// Look up a node by identifier.
    #[must_use]
    pub fn get(&self, id: &TargetId) -> Option<&TargetNode> {
        self.nodes.get(id)
    }

    /// Whether the graph contains `id`.
    #[must_use]
    pub fn contains(&self, id: &TargetId) -> bool {
        self.nodes.contains_key(id)
    }

    /// All nodes, in identifier order.
    pub fn nodes(&self) -> impl Iterator<Item = &TargetNode> {
        self.nodes.values()
    }

    /// Declared dependencies of `id`, empty when the node is unknown.
    #[must_use]
    pub fn deps_of(&self, id: &TargetId) -> &[TargetId] {
        self.nodes.get(id).map_or(&[], TargetNode::deps)
    }

    /// Nodes with a declared dependency on `id`, in identifier order.
    #[must_use]
    pub fn dependents_of(&self, id: &TargetId) -> &BTreeSet<TargetId> {
        static EMPTY: BTreeSet<TargetId> = BTreeSet::new();
        self.dependents.get(id).unwrap_or(&EMPTY)
    }

    /// Number of nodes in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
