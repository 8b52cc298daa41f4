//! Headers-flavor rule construction.

use camino::Utf8PathBuf;
use indexmap::IndexMap;

use crate::graph::NativeTarget;
use crate::rules::{
    FactoryError, RuleFactory, RuleHandle, SymlinkTreeSpec, headers_symlink_root,
};
use crate::target::Flavor;

/// The per-file annotation token marking a header as public.
const PUBLIC_FLAG: &str = "public";

/// Build the symlink-tree rule exporting a target's public headers.
///
/// The rule's identifier is the node's unflavored base tagged with the
/// headers flavor. Headers rules declare no build dependencies of their
/// own; the node's extra runtime dependencies carry over. Targets that
/// opt into external header maps get an empty tree, since the header map
/// supplies the indirection instead.
///
/// # Errors
///
/// Returns [`FactoryError`] when the external symlink-tree construction
/// fails.
pub fn build_headers_rule(
    factory: &dyn RuleFactory,
    node: &NativeTarget,
) -> Result<RuleHandle, FactoryError> {
    let headers_id = node.id.unflavored().with_flavor(Flavor::headers());
    let links = if node.use_header_maps {
        IndexMap::new()
    } else {
        select_public_headers(node)
    };
    factory.symlink_tree(SymlinkTreeSpec {
        root: headers_symlink_root(&headers_id),
        target: headers_id,
        links,
        extra_deps: node.extra_deps.clone(),
    })
}

/// Map each `public`-annotated source to its destination link path.
///
/// Annotation strings split on whitespace; a file is selected when any
/// token equals `public` exactly. The destination is the header prefix
/// joined with the source file's base name. Two sources with the same
/// base name collide; the later entry wins.
fn select_public_headers(node: &NativeTarget) -> IndexMap<Utf8PathBuf, Utf8PathBuf> {
    let prefix = Utf8PathBuf::from(node.header_prefix());
    let mut links = IndexMap::new();
    for (source, flags) in &node.per_file_flags {
        if !flags.split_whitespace().any(|token| token == PUBLIC_FLAG) {
            continue;
        }
        let Some(file_name) = source.file_name() else {
            tracing::debug!(source = %source, "skipping source without a file name");
            continue;
        };
        links.insert(prefix.join(file_name), source.clone());
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::TargetId;

    fn node_with_flags(flags: &[(&str, &str)]) -> NativeTarget {
        let mut node = NativeTarget::new(TargetId::new("//apps/mail", "mailbox"), []);
        for (source, annotation) in flags {
            node.per_file_flags
                .insert(Utf8PathBuf::from(*source), (*annotation).into());
        }
        node
    }

    #[test]
    fn only_exact_public_tokens_select_headers() {
        let node = node_with_flags(&[
            ("inbox.h", "public"),
            ("draft.h", "public extra"),
            ("secret.h", "publicly"),
            ("util.h", ""),
        ]);
        let links = select_public_headers(&node);
        assert_eq!(links.len(), 2);
        assert!(links.contains_key(&Utf8PathBuf::from("mail/inbox.h")));
        assert!(links.contains_key(&Utf8PathBuf::from("mail/draft.h")));
    }

    #[test]
    fn header_prefix_override_is_respected() {
        let mut node = node_with_flags(&[("inbox.h", "public")]);
        node.header_path_prefix = Some("Mail".into());
        let links = select_public_headers(&node);
        assert!(links.contains_key(&Utf8PathBuf::from("Mail/inbox.h")));
    }

    #[test]
    fn colliding_destinations_keep_the_later_source() {
        let node = node_with_flags(&[
            ("a/inbox.h", "public"),
            ("b/inbox.h", "public"),
        ]);
        let links = select_public_headers(&node);
        assert_eq!(links.len(), 1);
        assert_eq!(
            links.get(&Utf8PathBuf::from("mail/inbox.h")),
            Some(&Utf8PathBuf::from("b/inbox.h")),
        );
    }
}
