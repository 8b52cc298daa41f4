//! Girder core library.
//!
//! The dependency-graph transformation layer of a multi-language build
//! tool: flavored derived-rule construction over an immutable target
//! graph, and batch merging of model nodes into synthesized equivalents.

pub mod flavor;
pub mod graph;
pub mod merge;
pub mod rules;
pub mod target;
pub mod traversal;
