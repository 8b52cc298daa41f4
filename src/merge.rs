//! Model-node merging: consumer index, merge engine and graph rewriter.
//!
//! Runs as a batch transformation over a whole [`crate::graph::TargetGraph`]:
//! first every model node is indexed against the consumers that
//! transitively depend on it, then consumers with identical model sets are
//! grouped and each group's models are folded into one synthesized node,
//! and finally the graph is rewritten so consumers point at the merged
//! nodes and the original models are gone. Either the whole rewrite
//! succeeds or none of it is considered valid.

mod engine;
mod index;
mod rewrite;

use miette::Diagnostic;
use thiserror::Error;

use crate::graph::GraphError;
use crate::target::TargetId;

pub use engine::{MergedModels, merge_models};
pub use index::consumer_model_index;
pub use rewrite::rewrite_graph;

use crate::graph::TargetGraph;

/// Run the whole batch transformation: index, merge, rewrite.
///
/// # Errors
///
/// Returns [`MergeError`] when two models in one equivalence class are
/// incompatible or when the rewrite violates graph integrity; no partial
/// result is produced.
pub fn merge_model_graph(
    graph: &TargetGraph,
) -> Result<(TargetGraph, MergedModels), MergeError> {
    let index = consumer_model_index(graph);
    let merged = merge_models(graph, &index)?;
    let rewritten = rewrite_graph(graph, &merged)?;
    Ok((rewritten, merged))
}

/// Error raised by the merge engine or the graph rewriter.
#[derive(Debug, Diagnostic, Error)]
pub enum MergeError {
    /// Two models in one consumer-derived class have conflicting payloads.
    ///
    /// This is an operator-facing configuration conflict; the offending
    /// identifiers are reported so it can be resolved manually.
    #[error("model {model} cannot be merged with {}", join_ids(.merged))]
    #[diagnostic(code(girder::merge::incompatible))]
    IncompatibleModels {
        /// Models already folded into the running payload.
        merged: Vec<TargetId>,
        /// The model whose payload conflicts with the accumulated result.
        model: TargetId,
    },
    /// The consumer index names a model absent from the graph.
    #[error("consumer index references unknown model {model}")]
    #[diagnostic(code(girder::merge::unknown_model))]
    UnknownModel {
        /// The missing model identifier.
        model: TargetId,
    },
    /// A rewritten edge references an identifier absent from the source
    /// graph; an internal invariant violation.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),
}

fn join_ids(ids: &[TargetId]) -> String {
    ids.iter()
        .map(TargetId::qualified_name)
        .collect::<Vec<_>>()
        .join(", ")
}
