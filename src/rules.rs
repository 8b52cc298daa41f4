//! Derived-rule boundary: handles, factories and the shared rule index.
//!
//! The transformation layer never executes build rules. It asks an
//! external [`RuleFactory`] to materialise them, holds on to the opaque
//! [`RuleHandle`]s it gets back, and memoises them in a shared
//! [`RuleIndex`] so that repeated requests for the same identifier are
//! idempotent. The only capability the core ever inspects on a handle is
//! [`DerivedRule::symlink_root`].

use std::fmt;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use indexmap::IndexMap;
use miette::Diagnostic;
use thiserror::Error;

use crate::target::TargetId;

/// Error raised when an external factory fails to materialise a rule.
#[derive(Debug, Diagnostic, Error)]
pub enum FactoryError {
    /// The factory reported a failure for the given identifier.
    #[error("failed to materialise rule for {target}")]
    #[diagnostic(code(girder::rules::materialise))]
    Materialise {
        /// Identifier of the rule being materialised.
        target: TargetId,
        /// Underlying failure reported by the factory.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Opaque handle to a materialised build rule.
pub trait DerivedRule: Send + Sync {
    /// Identifier of the rule.
    fn target(&self) -> &TargetId;

    /// Root directory of generated symlinks, when the rule produced any.
    fn symlink_root(&self) -> Option<&Utf8Path> {
        None
    }
}

impl fmt::Debug for dyn DerivedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedRule")
            .field("target", self.target())
            .finish()
    }
}

/// Shared reference to a materialised rule.
pub type RuleHandle = Arc<dyn DerivedRule>;

/// A materialised symlink-tree rule.
///
/// Maps destination-relative paths to source files. The symlink root is
/// only exposed when the tree is non-empty; an empty tree is a no-op
/// placeholder that contributes nothing to include paths.
#[derive(Clone, Debug)]
pub struct SymlinkTreeRule {
    target: TargetId,
    root: Utf8PathBuf,
    links: IndexMap<Utf8PathBuf, Utf8PathBuf>,
    extra_deps: Vec<TargetId>,
}

impl SymlinkTreeRule {
    /// Create a symlink-tree rule from its spec.
    #[must_use]
    pub fn new(spec: SymlinkTreeSpec) -> Self {
        Self {
            target: spec.target,
            root: spec.root,
            links: spec.links,
            extra_deps: spec.extra_deps,
        }
    }

    /// The destination map, in insertion order.
    #[must_use]
    pub const fn links(&self) -> &IndexMap<Utf8PathBuf, Utf8PathBuf> {
        &self.links
    }

    /// Extra runtime dependencies inherited from the originating target.
    #[must_use]
    pub fn extra_deps(&self) -> &[TargetId] {
        &self.extra_deps
    }
}

impl DerivedRule for SymlinkTreeRule {
    fn target(&self) -> &TargetId {
        &self.target
    }

    fn symlink_root(&self) -> Option<&Utf8Path> {
        if self.links.is_empty() {
            None
        } else {
            Some(&self.root)
        }
    }
}

/// Arguments for materialising a symlink-tree rule.
///
/// Symlink-tree rules never declare build dependencies of their own; only
/// the extra runtime dependencies of the originating target carry over.
#[derive(Clone, Debug)]
pub struct SymlinkTreeSpec {
    /// Identifier of the derived rule.
    pub target: TargetId,
    /// Root directory the links are generated under.
    pub root: Utf8PathBuf,
    /// Destination-relative path to source file.
    pub links: IndexMap<Utf8PathBuf, Utf8PathBuf>,
    /// Extra runtime dependencies inherited from the originating target.
    pub extra_deps: Vec<TargetId>,
}

/// Arguments for materialising a compilation-database rule.
#[derive(Clone)]
pub struct CompilationDatabaseSpec {
    /// Identifier of the derived rule.
    pub target: TargetId,
    /// Include paths aggregated over the transitive native closure.
    pub include_paths: Vec<Utf8PathBuf>,
    /// Derived rules the database depends on, in identifier order.
    pub deps: Vec<RuleHandle>,
    /// Extra runtime dependencies inherited from the originating target.
    pub extra_deps: Vec<TargetId>,
}

impl fmt::Debug for CompilationDatabaseSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompilationDatabaseSpec")
            .field("target", &self.target)
            .field("include_paths", &self.include_paths)
            .field(
                "deps",
                &self.deps.iter().map(|dep| dep.target()).collect::<Vec<_>>(),
            )
            .field("extra_deps", &self.extra_deps)
            .finish()
    }
}

/// External factory for the concrete derived-rule kinds.
///
/// Invocations are fallible but synchronous; the core wraps failures in
/// [`FactoryError`] and never retries.
pub trait RuleFactory: Send + Sync {
    /// Materialise a symlink-tree rule.
    ///
    /// # Errors
    ///
    /// Returns [`FactoryError`] when the external construction fails.
    fn symlink_tree(&self, spec: SymlinkTreeSpec) -> Result<RuleHandle, FactoryError>;

    /// Materialise a compilation-database rule.
    ///
    /// # Errors
    ///
    /// Returns [`FactoryError`] when the external construction fails.
    fn compilation_database(
        &self,
        spec: CompilationDatabaseSpec,
    ) -> Result<RuleHandle, FactoryError>;
}

/// Shared, memoising index of materialised rules.
///
/// Backed by a sharded concurrent map: insert-if-absent is atomic per key,
/// so concurrent materialisation requests for the same identifier invoke
/// the factory at most once while requests for distinct identifiers
/// proceed independently.
#[derive(Default)]
pub struct RuleIndex {
    rules: DashMap<TargetId, RuleHandle>,
}

impl RuleIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a previously materialised rule.
    #[must_use]
    pub fn get(&self, id: &TargetId) -> Option<RuleHandle> {
        self.rules.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Register a materialised rule under `id`.
    pub fn put(&self, id: TargetId, handle: RuleHandle) {
        self.rules.insert(id, handle);
    }

    /// Return the rule for `id`, materialising it on first request.
    ///
    /// The factory closure runs while the key's shard is held, so a second
    /// request for the same identifier observes the memoised handle rather
    /// than invoking the factory again.
    ///
    /// # Errors
    ///
    /// Propagates the closure's [`FactoryError`]; nothing is inserted on
    /// failure.
    pub fn get_or_materialise(
        &self,
        id: TargetId,
        materialise: impl FnOnce() -> Result<RuleHandle, FactoryError>,
    ) -> Result<RuleHandle, FactoryError> {
        match self.rules.entry(id) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let handle = materialise()?;
                entry.insert(Arc::clone(&handle));
                Ok(handle)
            }
        }
    }

    /// Number of memoised rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Debug for RuleIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleIndex")
            .field("len", &self.rules.len())
            .finish()
    }
}

/// Root directory for a target's generated public-header symlinks.
///
/// Computed against the unflavored identifier so that flavored requests
/// share one location.
#[must_use]
pub fn headers_symlink_root(id: &TargetId) -> Utf8PathBuf {
    let base = id.unflavored();
    Utf8PathBuf::from(format!(
        "girder-out/bin/{}/__{}_public_headers__",
        base.base_path().trim_start_matches('/'),
        base.short_name(),
    ))
}

/// Location of a target's externally generated public header map.
#[must_use]
pub fn public_header_map_path(id: &TargetId) -> Utf8PathBuf {
    let base = id.unflavored();
    Utf8PathBuf::from(format!(
        "girder-out/gen/{}/{}-public-headers.hmap",
        base.base_path().trim_start_matches('/'),
        base.short_name(),
    ))
}
