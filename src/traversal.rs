//! Acyclic depth-first post-order traversal over native targets.
//!
//! The walker visits the native-compilable closure of a set of start
//! nodes: children are the declared dependencies filtered to native nodes
//! before descent, each node is visited at most once, and the visit hook
//! runs in post-order so a node observes its children's contributions
//! first. Cycles among native nodes are detected structurally by an
//! on-path marker and surfaced as a typed error, never by panicking or by
//! exception-style control flow.

use std::collections::HashMap;

use miette::Diagnostic;
use thiserror::Error;

use crate::graph::{NativeTarget, TargetGraph};
use crate::rules::FactoryError;
use crate::target::TargetId;

/// Tracks the visitation state of a node during traversal.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum VisitState {
    Visiting,
    Visited,
}

/// Error raised by the post-order traversal.
#[derive(Debug, Diagnostic, Error)]
pub enum TraversalError {
    /// The native-compilable subgraph contains a dependency cycle.
    #[error("dependency cycle among native targets: {}", format_cycle(.cycle))]
    #[diagnostic(code(girder::traversal::cycle))]
    Cycle {
        /// The cycle path; the first identifier is repeated at the end.
        cycle: Vec<TargetId>,
    },
    /// A visit hook's factory invocation failed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Factory(#[from] FactoryError),
}

fn format_cycle(cycle: &[TargetId]) -> String {
    cycle
        .iter()
        .map(TargetId::qualified_name)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// One explicit stack frame: a node and its remaining native children.
struct Frame {
    id: TargetId,
    children: Vec<TargetId>,
    next: usize,
}

/// Visit the native closure of `start` in depth-first post-order.
///
/// Start identifiers that do not name native nodes are skipped. Each
/// visited node's hook runs exactly once, after all of its native
/// children's hooks.
///
/// # Errors
///
/// Returns [`TraversalError::Cycle`] when the induced native subgraph is
/// cyclic, or propagates the first error returned by `visit`.
pub fn traverse_native_post_order<F>(
    graph: &TargetGraph,
    start: impl IntoIterator<Item = TargetId>,
    mut visit: F,
) -> Result<(), TraversalError>
where
    F: FnMut(&NativeTarget) -> Result<(), TraversalError>,
{
    let mut states: HashMap<TargetId, VisitState> = HashMap::new();
    let mut stack: Vec<Frame> = Vec::new();

    for root in start {
        if graph.get(&root).is_none_or(|node| !node.is_native()) {
            tracing::debug!(target_id = %root, "skipping non-native start node");
            continue;
        }
        if states.contains_key(&root) {
            continue;
        }
        states.insert(root.clone(), VisitState::Visiting);
        stack.push(frame_for(graph, root));

        while let Some(frame) = stack.last_mut() {
            if let Some(child) = frame.children.get(frame.next).cloned() {
                frame.next += 1;
                match states.get(&child) {
                    Some(VisitState::Visited) => {}
                    Some(VisitState::Visiting) => {
                        return Err(TraversalError::Cycle {
                            cycle: cycle_path(&stack, &child),
                        });
                    }
                    None => {
                        states.insert(child.clone(), VisitState::Visiting);
                        stack.push(frame_for(graph, child));
                    }
                }
            } else if let Some(done) = stack.pop() {
                states.insert(done.id.clone(), VisitState::Visited);
                if let Some(native) = graph.get(&done.id).and_then(|node| node.as_native()) {
                    visit(native)?;
                }
            }
        }
    }

    Ok(())
}

/// Build a frame whose children are the node's native dependencies.
///
/// Non-native dependencies are filtered out before descent rather than
/// skipped at visit time.
fn frame_for(graph: &TargetGraph, id: TargetId) -> Frame {
    let children: Vec<TargetId> = graph
        .deps_of(&id)
        .iter()
        .filter(|dep| graph.get(dep).is_some_and(|node| node.is_native()))
        .cloned()
        .collect();
    Frame {
        id,
        children,
        next: 0,
    }
}

/// Slice the explicit stack into the offending cycle path.
fn cycle_path(stack: &[Frame], revisited: &TargetId) -> Vec<TargetId> {
    let start = stack
        .iter()
        .position(|frame| &frame.id == revisited)
        .unwrap_or(0);
    let mut cycle: Vec<TargetId> = stack
        .iter()
        .skip(start)
        .map(|frame| frame.id.clone())
        .collect();
    cycle.push(revisited.clone());
    cycle
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::expect_used,
        reason = "traversal tests assert on walk outcomes"
    )]
    use super::*;
    use crate::graph::{OpaqueTarget, TargetNode};

    fn id(name: &str) -> TargetId {
        TargetId::new("//test", name)
    }

    fn native(name: &str, deps: &[&str]) -> TargetNode {
        TargetNode::Native(NativeTarget::new(id(name), deps.iter().map(|dep| id(dep))))
    }

    fn visit_order(graph: &TargetGraph, start: &[&str]) -> Vec<TargetId> {
        let mut order = Vec::new();
        traverse_native_post_order(
            graph,
            start.iter().map(|name| id(name)),
            |node| {
                order.push(node.id.clone());
                Ok(())
            },
        )
        .expect("acyclic traversal");
        order
    }

    #[test]
    fn children_are_visited_before_parents() {
        let graph = TargetGraph::new(vec![
            native("leaf", &[]),
            native("mid", &["leaf"]),
            native("root", &["mid", "leaf"]),
        ])
        .expect("graph");
        assert_eq!(
            visit_order(&graph, &["root"]),
            vec![id("leaf"), id("mid"), id("root")],
        );
    }

    #[test]
    fn diamond_visits_each_node_once() {
        let graph = TargetGraph::new(vec![
            native("base", &[]),
            native("left", &["base"]),
            native("right", &["base"]),
            native("top", &["left", "right"]),
        ])
        .expect("graph");
        let order = visit_order(&graph, &["top"]);
        assert_eq!(order.len(), 4);
        assert_eq!(order.first(), Some(&id("base")));
        assert_eq!(order.last(), Some(&id("top")));
    }

    #[test]
    fn non_native_dependencies_are_filtered_before_descent() {
        let graph = TargetGraph::new(vec![
            TargetNode::Opaque(OpaqueTarget::new(id("asset"), [])),
            native("leaf", &[]),
            native("root", &["asset", "leaf"]),
        ])
        .expect("graph");
        assert_eq!(visit_order(&graph, &["root"]), vec![id("leaf"), id("root")]);
    }

    #[test]
    fn self_edge_is_reported_as_cycle() {
        let graph = TargetGraph::new(vec![native("a", &["a"])]).expect("graph");
        let err = traverse_native_post_order(&graph, [id("a")], |_| Ok(()))
            .expect_err("cycle");
        let TraversalError::Cycle { cycle } = err else {
            panic!("expected cycle error");
        };
        assert_eq!(cycle, vec![id("a"), id("a")]);
    }

    #[test]
    fn two_node_cycle_is_reported_with_path() {
        let graph =
            TargetGraph::new(vec![native("a", &["b"]), native("b", &["a"])]).expect("graph");
        let err = traverse_native_post_order(&graph, [id("a")], |_| Ok(()))
            .expect_err("cycle");
        let TraversalError::Cycle { cycle } = err else {
            panic!("expected cycle error");
        };
        assert_eq!(cycle, vec![id("a"), id("b"), id("a")]);
    }

    #[test]
    fn hook_errors_abort_the_walk() {
        let graph = TargetGraph::new(vec![native("leaf", &[]), native("root", &["leaf"])])
            .expect("graph");
        let mut visits = 0;
        let err = traverse_native_post_order(&graph, [id("root")], |node| {
            visits += 1;
            Err(TraversalError::Factory(FactoryError::Materialise {
                target: node.id.clone(),
                source: "boom".into(),
            }))
        })
        .expect_err("hook failure");
        assert!(matches!(err, TraversalError::Factory(_)));
        assert_eq!(visits, 1);
    }
}
