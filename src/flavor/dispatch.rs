//! Priority dispatch over the flavors of a requested identifier.

use crate::graph::NativeTarget;
use crate::rules::RuleHandle;
use crate::target::{Flavor, TargetId};

use super::{FlavorError, RuleContext, build_compilation_database_rule, build_headers_rule};

/// Try to build a derived rule for the flavors on `requested`.
///
/// Flavors are tested in fixed priority order: compilation database
/// first, headers second. The first match wins and only one flavor is
/// honoured per call, even when several are present. `Ok(None)` means no
/// known flavor applies and the caller should construct the normal rule.
///
/// # Errors
///
/// Returns [`FlavorError`] when the matched builder's traversal or
/// factory invocation fails.
pub fn try_create_flavored_rule(
    ctx: RuleContext<'_>,
    node: &NativeTarget,
    requested: &TargetId,
) -> Result<Option<RuleHandle>, FlavorError> {
    if requested.has_flavor(&Flavor::compilation_database()) {
        let rule = build_compilation_database_rule(ctx, node, requested)?;
        Ok(Some(rule))
    } else if requested.has_flavor(&Flavor::headers()) {
        let rule = build_headers_rule(ctx.factory, node)?;
        Ok(Some(rule))
    } else {
        Ok(None)
    }
}
