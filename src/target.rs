//! Build-target identifiers and flavor qualifiers.
//!
//! A [`TargetId`] names one node in the target graph. It pairs an
//! unflavored base identity (`//base/path:short_name`) with an ordered set
//! of [`Flavor`] qualifiers that request specialised derived rules.
//! Identifiers are totally ordered so that sets of them iterate
//! deterministically and synthesized names are stable across runs.
//!
//! # Examples
//!
//! ```
//! use girder::target::{Flavor, TargetId};
//!
//! let lib = TargetId::new("//apps/mail", "mailbox");
//! let headers = lib.with_flavor(Flavor::headers());
//! assert!(headers.is_flavored());
//! assert_eq!(headers.qualified_name(), "//apps/mail:mailbox#headers");
//! assert_eq!(headers.unflavored(), lib);
//! ```

use std::collections::BTreeSet;
use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Namespace reserved for nodes synthesized by the model merge engine.
pub const MERGED_NAMESPACE: &str = "//girder/synthesized/models";

/// A string tag on a target identifier selecting a derived-rule variant.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Flavor(String);

impl Flavor {
    /// Create a flavor from an arbitrary tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The flavor requesting a symlink tree of a target's public headers.
    #[must_use]
    pub fn headers() -> Self {
        Self("headers".into())
    }

    /// The flavor requesting an aggregated compilation database.
    #[must_use]
    pub fn compilation_database() -> Self {
        Self("compilation-database".into())
    }

    /// The tag as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier of a node in the target graph.
///
/// The base identity is `//base/path:short_name`; zero or more flavors are
/// layered on top and rendered as `#flavor1,flavor2` in the qualified name.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct TargetId {
    base_path: String,
    short_name: String,
    flavors: BTreeSet<Flavor>,
}

impl TargetId {
    /// Create an unflavored identifier.
    #[must_use]
    pub fn new(base_path: impl Into<String>, short_name: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            short_name: short_name.into(),
            flavors: BTreeSet::new(),
        }
    }

    /// Return a copy of this identifier with `flavor` added.
    #[must_use]
    pub fn with_flavor(&self, flavor: Flavor) -> Self {
        let mut flavors = self.flavors.clone();
        flavors.insert(flavor);
        Self {
            base_path: self.base_path.clone(),
            short_name: self.short_name.clone(),
            flavors,
        }
    }

    /// Whether any flavors are attached.
    #[must_use]
    pub fn is_flavored(&self) -> bool {
        !self.flavors.is_empty()
    }

    /// Whether `flavor` is among the attached flavors.
    #[must_use]
    pub fn has_flavor(&self, flavor: &Flavor) -> bool {
        self.flavors.contains(flavor)
    }

    /// The unflavored base identity.
    #[must_use]
    pub fn unflavored(&self) -> Self {
        Self {
            base_path: self.base_path.clone(),
            short_name: self.short_name.clone(),
            flavors: BTreeSet::new(),
        }
    }

    /// The `//base/path` portion of the identifier.
    #[must_use]
    pub const fn base_path(&self) -> &str {
        self.base_path.as_str()
    }

    /// The short name following the colon.
    #[must_use]
    pub const fn short_name(&self) -> &str {
        self.short_name.as_str()
    }

    /// Last component of the base path.
    ///
    /// Used as the default header-path prefix for targets that do not
    /// override it.
    #[must_use]
    pub fn base_dir_name(&self) -> &str {
        self.base_path
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or(&self.base_path)
    }

    /// The fully qualified name, including flavors.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        let mut name = format!("{}:{}", self.base_path, self.short_name);
        if !self.flavors.is_empty() {
            name.push('#');
            name.push_str(&self.flavors.iter().map(Flavor::as_str).join(","));
        }
        name
    }

    /// Synthesize the deterministic identifier for a merged model node.
    ///
    /// Constituent identifiers are sorted by qualified name, sanitised and
    /// joined with hyphens, and placed under [`MERGED_NAMESPACE`] with no
    /// flavors. The same constituents always yield the same identifier.
    #[must_use]
    pub fn merged_from<'a>(ids: impl IntoIterator<Item = &'a Self>) -> Self {
        let joined = ids
            .into_iter()
            .map(Self::qualified_name)
            .sorted()
            .map(|name| sanitize(&name))
            .join("-");
        Self::new(MERGED_NAMESPACE, joined)
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}

/// Replace the characters that are unsafe in a synthesized short name.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '.' | '+' | ' ' | ':' => '-',
            other => other,
        })
        .collect()
}
