//! Consumer-to-model reachability index.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use crate::graph::{TargetGraph, TargetNode};
use crate::target::TargetId;

/// Map every native consumer to the model nodes it transitively depends on.
///
/// For each model, a breadth-first walk over incoming edges visits every
/// dependent at most once. Only native-compilable nodes are recorded
/// against the model; nodes of other kinds are expanded through without
/// being recorded, since they may still relay reachability upward.
#[must_use]
pub fn consumer_model_index(
    graph: &TargetGraph,
) -> BTreeMap<TargetId, BTreeSet<TargetId>> {
    let mut index: BTreeMap<TargetId, BTreeSet<TargetId>> = BTreeMap::new();

    for node in graph.nodes() {
        let Some(model) = node.as_model() else {
            continue;
        };
        let mut visited: HashSet<TargetId> = HashSet::new();
        let mut queue: VecDeque<TargetId> =
            graph.dependents_of(model.id()).iter().cloned().collect();
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current.clone()) {
                continue;
            }
            if graph.get(&current).is_some_and(TargetNode::is_native) {
                index
                    .entry(current.clone())
                    .or_default()
                    .insert(model.id().clone());
            }
            queue.extend(graph.dependents_of(&current).iter().cloned());
        }
        tracing::debug!(
            model = %model.id(),
            consumers = visited.len(),
            "indexed transitive dependents of model",
        );
    }

    index
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, reason = "tests assert on index contents")]
    use super::*;
    use crate::graph::{ModelArgs, ModelTarget, NativeTarget, OpaqueTarget};

    fn id(name: &str) -> TargetId {
        TargetId::new("//test", name)
    }

    fn model(name: &str) -> TargetNode {
        TargetNode::Model(ModelTarget::new(id(name), [], ModelArgs::default()))
    }

    fn native(name: &str, deps: &[&str]) -> TargetNode {
        TargetNode::Native(NativeTarget::new(id(name), deps.iter().map(|dep| id(dep))))
    }

    fn opaque(name: &str, deps: &[&str]) -> TargetNode {
        TargetNode::Opaque(OpaqueTarget::new(id(name), deps.iter().map(|dep| id(dep))))
    }

    #[test]
    fn relay_nodes_are_walked_through_but_not_recorded() {
        let graph = TargetGraph::new(vec![
            model("m"),
            opaque("relay", &["m"]),
            native("app", &["relay"]),
        ])
        .expect("graph");
        let index = consumer_model_index(&graph);
        assert_eq!(index.len(), 1);
        let expected: BTreeSet<TargetId> = [id("m")].into_iter().collect();
        assert_eq!(index.get(&id("app")), Some(&expected));
        assert!(!index.contains_key(&id("relay")));
    }

    #[test]
    fn diamond_dependents_are_visited_once() {
        let graph = TargetGraph::new(vec![
            model("m"),
            native("left", &["m"]),
            native("right", &["m"]),
            native("top", &["left", "right"]),
        ])
        .expect("graph");
        let index = consumer_model_index(&graph);
        assert_eq!(index.len(), 3);
        let expected: BTreeSet<TargetId> = [id("m")].into_iter().collect();
        for consumer in ["left", "right", "top"] {
            assert_eq!(index.get(&id(consumer)), Some(&expected));
        }
    }
}
