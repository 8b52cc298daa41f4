//! Graph rewriting: excise model nodes, attach merged nodes.

use std::collections::{HashSet, VecDeque};

use crate::graph::{GraphError, ModelTarget, OpaqueTarget, TargetGraph, TargetNode};
use crate::target::TargetId;

use super::engine::MergedModels;
use super::MergeError;

/// Produce a graph in which model nodes are replaced by merged nodes.
///
/// Every non-model node of the source graph is carried over; its edges to
/// model nodes are redirected to the merged node servicing it, or stop
/// short when the dependent has no merged mapping. Original model nodes
/// are absent from the result. Each distinct merged node is attached with
/// the union of its constituents' non-model dependencies.
///
/// # Errors
///
/// Returns [`MergeError::Graph`] when a merged node's dependency names an
/// identifier absent from the source graph; this is an internal
/// invariant violation, and no partially rewritten graph is returned.
pub fn rewrite_graph(
    graph: &TargetGraph,
    merged: &MergedModels,
) -> Result<TargetGraph, MergeError> {
    let mut nodes: Vec<TargetNode> = Vec::new();

    // Breadth-first expansion over the source graph; each node visited
    // once, model nodes excised.
    let mut visited: HashSet<TargetId> = HashSet::new();
    let mut queue: VecDeque<TargetId> = graph.nodes().map(|node| node.id().clone()).collect();
    while let Some(current) = queue.pop_front() {
        if !visited.insert(current.clone()) {
            continue;
        }
        let Some(node) = graph.get(&current) else {
            continue;
        };
        if node.is_model() {
            continue;
        }
        queue.extend(node.deps().iter().cloned());
        nodes.push(rewrite_node(graph, merged, node));
    }

    for merged_node in merged.distinct() {
        let mut deps: Vec<TargetId> = Vec::new();
        for dep in merged_node.deps() {
            let Some(dep_node) = graph.get(dep) else {
                return Err(GraphError::DanglingDependency {
                    node: Box::new(merged_node.id().clone()),
                    dependency: Box::new(dep.clone()),
                }
                .into());
            };
            // Constituent edges into other models vanish with the models.
            if !dep_node.is_model() {
                deps.push(dep.clone());
            }
        }
        nodes.push(TargetNode::Model(ModelTarget::new(
            merged_node.id().clone(),
            deps,
            merged_node.args().clone(),
        )));
    }

    Ok(TargetGraph::new(nodes)?)
}

/// Copy a node, redirecting its model edges to the merged node.
fn rewrite_node(graph: &TargetGraph, merged: &MergedModels, node: &TargetNode) -> TargetNode {
    let deps = rewrite_deps(graph, merged, node);
    match node {
        TargetNode::Native(native) => {
            let mut copy = native.clone();
            copy.deps = deps;
            TargetNode::Native(copy)
        }
        TargetNode::Opaque(opaque) => {
            TargetNode::Opaque(OpaqueTarget::new(opaque.id.clone(), deps))
        }
        TargetNode::Model(model) => {
            // Models are excised before this point; keep the copy total.
            TargetNode::Model(ModelTarget::new(
                model.id().clone(),
                deps,
                model.args().clone(),
            ))
        }
    }
}

fn rewrite_deps(
    graph: &TargetGraph,
    merged: &MergedModels,
    node: &TargetNode,
) -> Vec<TargetId> {
    let mut seen: HashSet<TargetId> = HashSet::new();
    let mut deps: Vec<TargetId> = Vec::new();
    for dep in node.deps() {
        let target = if graph.get(dep).is_some_and(TargetNode::is_model) {
            match merged.merged_for(node.id()) {
                Some(replacement) => replacement.id().clone(),
                None => {
                    // The dependent has no merged mapping; the edge stops
                    // short and the merged node reattaches elsewhere.
                    tracing::debug!(
                        dependent = %node.id(),
                        model = %dep,
                        "dropping model edge without merged mapping",
                    );
                    continue;
                }
            }
        } else {
            dep.clone()
        };
        if seen.insert(target.clone()) {
            deps.push(target);
        }
    }
    deps
}
