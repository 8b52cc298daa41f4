//! Compilation-database rule construction.

use std::collections::{BTreeMap, BTreeSet};
use std::iter;
use std::sync::Arc;

use camino::Utf8PathBuf;

use crate::graph::NativeTarget;
use crate::rules::{CompilationDatabaseSpec, RuleHandle, public_header_map_path};
use crate::target::{Flavor, TargetId};
use crate::traversal::traverse_native_post_order;

use super::{FlavorError, RuleContext, build_headers_rule};

/// Build the compilation-database rule for `node`.
///
/// Walks the native closure of the node and its declared dependencies in
/// post-order, accumulating one include path per visited node: targets
/// using external header maps contribute the location of their public
/// header map, all others contribute the symlink root of their
/// (memoised) headers rule, which also becomes a dependency of the
/// database. Nodes without public headers contribute nothing.
///
/// # Errors
///
/// Returns [`FlavorError::Traversal`] when the native closure is cyclic
/// and [`FlavorError::Factory`] when a rule materialisation fails.
pub fn build_compilation_database_rule(
    ctx: RuleContext<'_>,
    node: &NativeTarget,
    requested: &TargetId,
) -> Result<RuleHandle, FlavorError> {
    let mut include_paths: BTreeSet<Utf8PathBuf> = BTreeSet::new();
    let mut deps: BTreeMap<TargetId, RuleHandle> = BTreeMap::new();

    let start = node
        .deps
        .iter()
        .cloned()
        .chain(iter::once(node.id.clone()));

    traverse_native_post_order(ctx.graph, start, |visited| {
        if visited.use_header_maps {
            // Header maps supply the indirection; no headers rule needed.
            include_paths.insert(public_header_map_path(&visited.id));
            return Ok(());
        }
        if visited.id.is_flavored() {
            // A flavored node cannot safely be asked for its own headers
            // flavor.
            tracing::debug!(target_id = %visited.id, "skipping flavored node in database traversal");
            return Ok(());
        }
        let headers_id = visited.id.with_flavor(Flavor::headers());
        let handle = ctx
            .index
            .get_or_materialise(headers_id, || build_headers_rule(ctx.factory, visited))?;
        if let Some(root) = handle.symlink_root() {
            include_paths.insert(root.to_owned());
            deps.insert(handle.target().clone(), Arc::clone(&handle));
        }
        Ok(())
    })?;

    let spec = CompilationDatabaseSpec {
        target: requested.clone(),
        include_paths: include_paths.into_iter().collect(),
        deps: deps.into_values().collect(),
        extra_deps: node.extra_deps.clone(),
    };
    Ok(ctx.factory.compilation_database(spec)?)
}
