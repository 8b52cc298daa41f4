//! Node kinds of the target graph.

use camino::Utf8PathBuf;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::target::TargetId;

use super::model::ModelTarget;

/// A node in the target graph.
///
/// The set of kinds relevant to the transformation layer is closed, so the
/// node is a tagged union rather than an open trait hierarchy.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum TargetNode {
    /// A unit with sources, headers and per-file annotations, eligible for
    /// compilation-database participation.
    Native(NativeTarget),
    /// A structured, mergeable configuration payload.
    Model(ModelTarget),
    /// An opaque node carried for graph-shape purposes only.
    Opaque(OpaqueTarget),
}

impl TargetNode {
    /// The node's identifier.
    #[must_use]
    pub const fn id(&self) -> &TargetId {
        match self {
            Self::Native(native) => &native.id,
            Self::Model(model) => model.id(),
            Self::Opaque(opaque) => &opaque.id,
        }
    }

    /// The node's declared dependencies.
    #[must_use]
    pub fn deps(&self) -> &[TargetId] {
        match self {
            Self::Native(native) => &native.deps,
            Self::Model(model) => model.deps(),
            Self::Opaque(opaque) => &opaque.deps,
        }
    }

    /// Whether this node is native-compilable.
    #[must_use]
    pub const fn is_native(&self) -> bool {
        matches!(self, Self::Native(_))
    }

    /// Whether this node is a model.
    #[must_use]
    pub const fn is_model(&self) -> bool {
        matches!(self, Self::Model(_))
    }

    /// The native payload, if this node is native-compilable.
    #[must_use]
    pub const fn as_native(&self) -> Option<&NativeTarget> {
        match self {
            Self::Native(native) => Some(native),
            Self::Model(_) | Self::Opaque(_) => None,
        }
    }

    /// The model payload, if this node is a model.
    #[must_use]
    pub const fn as_model(&self) -> Option<&ModelTarget> {
        match self {
            Self::Model(model) => Some(model),
            Self::Native(_) | Self::Opaque(_) => None,
        }
    }
}

/// A native-compilable target.
///
/// Per-file flags map each source file to a space-separated annotation
/// string; files annotated with the token `public` are exported by the
/// headers flavor. Targets that opt into externally generated header maps
/// skip symlink trees entirely.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct NativeTarget {
    /// Unflavored identifier of the target.
    pub id: TargetId,
    /// Declared build dependencies.
    pub deps: Vec<TargetId>,
    /// Extra runtime dependencies, inherited by derived rules.
    #[serde(default)]
    pub extra_deps: Vec<TargetId>,
    /// Source file to annotation string, in declaration order.
    #[serde(default)]
    pub per_file_flags: IndexMap<Utf8PathBuf, String>,
    /// Use externally generated header maps instead of symlink trees.
    #[serde(default)]
    pub use_header_maps: bool,
    /// Override for the destination prefix of exported headers.
    #[serde(default)]
    pub header_path_prefix: Option<String>,
    /// Prefix header injected into every compilation, carried opaquely.
    #[serde(default)]
    pub prefix_header: Option<Utf8PathBuf>,
}

impl NativeTarget {
    /// Create a native target with empty sources and default switches.
    #[must_use]
    pub fn new(id: TargetId, deps: impl IntoIterator<Item = TargetId>) -> Self {
        Self {
            id,
            deps: deps.into_iter().collect(),
            extra_deps: Vec::new(),
            per_file_flags: IndexMap::new(),
            use_header_maps: false,
            header_path_prefix: None,
            prefix_header: None,
        }
    }

    /// The destination prefix for exported headers.
    ///
    /// Defaults to the last component of the target's base path unless the
    /// target overrides it.
    #[must_use]
    pub fn header_prefix(&self) -> &str {
        self.header_path_prefix
            .as_deref()
            .unwrap_or_else(|| self.id.base_dir_name())
    }
}

/// A node the transformation layer treats as opaque.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct OpaqueTarget {
    /// Identifier of the target.
    pub id: TargetId,
    /// Declared dependencies.
    pub deps: Vec<TargetId>,
}

impl OpaqueTarget {
    /// Create an opaque target.
    #[must_use]
    pub fn new(id: TargetId, deps: impl IntoIterator<Item = TargetId>) -> Self {
        Self {
            id,
            deps: deps.into_iter().collect(),
        }
    }
}
