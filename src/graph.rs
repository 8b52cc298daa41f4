//! Target-graph structures.
//!
//! This module defines the immutable directed graph of build targets that
//! the transformation layer operates on. Nodes are a closed tagged union
//! over the kinds the core cares about: native-compilable targets, model
//! targets carrying a mergeable configuration payload, and opaque targets
//! that participate in graph shape only. All cross-references are by
//! [`crate::target::TargetId`]; the graph owns the nodes and resolves
//! identifiers to them.
//!
//! # Examples
//!
//! ```
//! use girder::graph::{OpaqueTarget, TargetGraph, TargetNode};
//! use girder::target::TargetId;
//!
//! let leaf = TargetId::new("//lib", "leaf");
//! let app = TargetId::new("//app", "app");
//! let graph = TargetGraph::new(vec![
//!     TargetNode::Opaque(OpaqueTarget::new(leaf.clone(), [])),
//!     TargetNode::Opaque(OpaqueTarget::new(app.clone(), [leaf.clone()])),
//! ])?;
//! assert!(graph.dependents_of(&leaf).contains(&app));
//! # Ok::<(), girder::graph::GraphError>(())
//! ```

mod model;
mod node;
mod store;

pub use model::{ModelArgs, ModelTarget};
pub use node::{NativeTarget, OpaqueTarget, TargetNode};
pub use store::{GraphError, TargetGraph};
