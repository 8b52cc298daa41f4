//! Flavored derived-rule construction.
//!
//! A flavored identifier asks the build tool for a specialised rule
//! derived from an existing native target: a symlink tree of its public
//! headers, or an aggregated compilation database for its transitive
//! native closure. The dispatcher honours exactly one flavor per request
//! in fixed priority order; unflavored requests fall through to normal
//! rule construction.

mod compilation_db;
mod dispatch;
mod headers;

use miette::Diagnostic;
use thiserror::Error;

use crate::graph::TargetGraph;
use crate::rules::{FactoryError, RuleFactory, RuleIndex};
use crate::traversal::TraversalError;

pub use compilation_db::build_compilation_database_rule;
pub use dispatch::try_create_flavored_rule;
pub use headers::build_headers_rule;

/// Error raised while building a flavored rule.
#[derive(Debug, Diagnostic, Error)]
pub enum FlavorError {
    /// The compilation-database traversal failed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Traversal(#[from] TraversalError),
    /// An external factory invocation failed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Factory(#[from] FactoryError),
}

/// Everything a flavored-rule builder needs, threaded explicitly.
///
/// The rule index is the only shared mutable resource; graph and factory
/// are read-only collaborators.
#[derive(Clone, Copy)]
pub struct RuleContext<'a> {
    /// The graph the request is resolved against.
    pub graph: &'a TargetGraph,
    /// Shared memoisation index for derived rules.
    pub index: &'a RuleIndex,
    /// External factory for concrete rule kinds.
    pub factory: &'a dyn RuleFactory,
}
