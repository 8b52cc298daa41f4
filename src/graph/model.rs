//! Model targets and their mergeable configuration payload.

use std::collections::{BTreeMap, BTreeSet};

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::target::TargetId;

/// A model node: a structured configuration payload with dependencies.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ModelTarget {
    id: TargetId,
    deps: Vec<TargetId>,
    args: ModelArgs,
}

impl ModelTarget {
    /// Create a model target.
    #[must_use]
    pub fn new(id: TargetId, deps: impl IntoIterator<Item = TargetId>, args: ModelArgs) -> Self {
        Self {
            id,
            deps: deps.into_iter().collect(),
            args,
        }
    }

    /// The model's identifier.
    #[must_use]
    pub const fn id(&self) -> &TargetId {
        &self.id
    }

    /// The model's declared dependencies.
    #[must_use]
    pub fn deps(&self) -> &[TargetId] {
        &self.deps
    }

    /// The configuration payload.
    #[must_use]
    pub const fn args(&self) -> &ModelArgs {
        &self.args
    }
}

/// Configuration payload of a model node.
///
/// The merge engine only relies on [`ModelArgs::is_mergeable_with`],
/// [`ModelArgs::merge_with`] and `Clone` (the deep copy); everything else
/// is opaque to it.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ModelArgs {
    /// Schema definition file shared by every model in a merge class.
    #[serde(default)]
    pub schema: Option<Utf8PathBuf>,
    /// Query definition files.
    #[serde(default)]
    pub queries: BTreeSet<Utf8PathBuf>,
    /// Mutation definition files.
    #[serde(default)]
    pub mutations: BTreeSet<Utf8PathBuf>,
    /// Free-form configuration entries.
    #[serde(default)]
    pub configs: BTreeMap<String, String>,
    /// Tags grouping models for tooling.
    #[serde(default)]
    pub model_tags: BTreeSet<String>,
    /// Suppression file for known consistency issues.
    #[serde(default)]
    pub known_issues_file: Option<Utf8PathBuf>,
    /// Whether generated identifiers are persisted across builds.
    #[serde(default)]
    pub persist_ids: bool,
    /// Consistency-checker configuration file.
    #[serde(default)]
    pub consistency_config: Option<Utf8PathBuf>,
    /// Client schema configuration file.
    #[serde(default)]
    pub client_schema_config: Option<Utf8PathBuf>,
}

impl ModelArgs {
    /// Whether `other` can be folded into this payload.
    ///
    /// The scalar configuration fields must agree; the set-valued fields
    /// merge by union and never conflict.
    #[must_use]
    pub fn is_mergeable_with(&self, other: &Self) -> bool {
        self.persist_ids == other.persist_ids
            && self.schema == other.schema
            && self.consistency_config == other.consistency_config
            && self.client_schema_config == other.client_schema_config
            && self.known_issues_file == other.known_issues_file
    }

    /// Fold `other` into this payload, returning the combined payload.
    ///
    /// Callers must check [`Self::is_mergeable_with`] first; merging
    /// unions the set-valued fields and keeps the shared scalar fields.
    #[must_use]
    pub fn merge_with(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        merged.queries.extend(other.queries.iter().cloned());
        merged.mutations.extend(other.mutations.iter().cloned());
        merged
            .model_tags
            .extend(other.model_tags.iter().cloned());
        for (key, value) in &other.configs {
            merged.configs.insert(key.clone(), value.clone());
        }
        merged
    }
}
