//! Node predicates shared by the analyzer and the emitter.

use crate::comments::Comments;
use crate::tree::{CollectionStyle, NodeId, NodeKind, ScalarStyle, Tree};

/// Whether `id` fits after `key:` on the key's line.
///
/// True for scalars and aliases without leading or trailing comments and for
/// empty collections without comments (they render as `{}`/`[]`).
pub fn is_single_line(tree: &Tree, comments: &Comments, id: NodeId) -> bool {
    let uncommented = comments.leading(id).is_empty() && comments.trailing(id).is_empty();
    match tree.kind(id) {
        NodeKind::Scalar(_) | NodeKind::Alias(_) => uncommented,
        NodeKind::Mapping(c) | NodeKind::Sequence(c) => c.is_empty() && uncommented,
        NodeKind::Document(_) | NodeKind::Stream(_) => false,
    }
}

/// Whether `id` is a non-empty block sequence, whose items start with `- `.
pub fn has_bullet_marker(tree: &Tree, id: NodeId) -> bool {
    matches!(
        tree.kind(id),
        NodeKind::Sequence(c) if !c.is_empty() && c.style == CollectionStyle::Block
    )
}

/// Whether `id` carries an `&anchor`.
pub fn has_anchor(tree: &Tree, id: NodeId) -> bool {
    tree.kind(id).anchor().is_some()
}

/// Whether a collection renders inline.
///
/// Everything inside a flow collection is flow; empty collections are always
/// `{}`/`[]`. Non-collections are never flow.
pub fn renders_in_flow(tree: &Tree, id: NodeId, in_flow: bool) -> bool {
    match tree.kind(id) {
        NodeKind::Mapping(c) | NodeKind::Sequence(c) => {
            in_flow || c.style == CollectionStyle::Flow || c.is_empty()
        }
        _ => false,
    }
}

/// Whether a block container's first line can begin right after a `- `
/// bullet, so the comments of its first child belong before the bullet.
pub(crate) fn continues_on_bullet_line(tree: &Tree, id: NodeId) -> bool {
    !has_anchor(tree, id)
        && tree.kind(id).tag().is_none()
        && !renders_in_flow(tree, id, false)
        && tree.kind(id).collection().is_some()
}

/// Whether a collection's source text opens with `{` or `[`.
pub(crate) fn opens_with_delimiter(text: &str) -> bool {
    text.starts_with(['{', '['])
}

/// Whether a mapping key needs a space before `:` (`*a : b`).
pub(crate) fn needs_space_before_colon(tree: &Tree, id: NodeId) -> bool {
    matches!(tree.kind(id), NodeKind::Alias(_))
}

/// Whether a mapping key has to use the explicit `? key` form.
pub(crate) fn needs_explicit_key(tree: &Tree, comments: &Comments, id: NodeId) -> bool {
    let multi_line = match tree.kind(id) {
        // An empty implicit key cannot start a line.
        NodeKind::Scalar(s) => {
            s.style.is_block() || (s.value.is_empty() && s.style == ScalarStyle::Plain)
        }
        NodeKind::Mapping(_) | NodeKind::Sequence(_) => !renders_in_flow(tree, id, false),
        NodeKind::Alias(_) | NodeKind::Document(_) | NodeKind::Stream(_) => false,
    };
    multi_line || !comments.trailing(id).is_empty() || comments.line_end(id).is_some()
}

/// Characters allowed in an anchor or alias name: anything but whitespace and
/// flow indicators.
pub(crate) fn is_anchor_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '[' | ']' | '{' | '}' | ',')
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tree::{Collection, Scalar};

    fn tree_with(kinds: Vec<NodeKind>) -> (Tree, Vec<NodeId>) {
        let mut tree = Tree::new();
        let ids = kinds.into_iter().map(|k| tree.push(k).unwrap()).collect();
        (tree, ids)
    }

    #[test]
    fn scalars_are_single_line_until_commented() {
        let (tree, ids) = tree_with(vec![NodeKind::Scalar(Scalar::plain("a"))]);
        let mut comments = Comments::for_tree(&tree);
        assert!(is_single_line(&tree, &comments, ids[0]));
        comments.get_mut(ids[0]).leading.push("# c".into());
        assert!(!is_single_line(&tree, &comments, ids[0]));
    }

    #[test]
    fn empty_collections_are_single_line() {
        let (tree, ids) = tree_with(vec![
            NodeKind::Mapping(Collection::block(vec![])),
            NodeKind::Sequence(Collection::flow(vec![])),
        ]);
        let comments = Comments::for_tree(&tree);
        assert!(is_single_line(&tree, &comments, ids[0]));
        assert!(is_single_line(&tree, &comments, ids[1]));
        assert!(renders_in_flow(&tree, ids[0], false));
    }

    #[test]
    fn only_non_empty_block_sequences_have_bullets() {
        let (tree, ids) = tree_with(vec![
            NodeKind::Scalar(Scalar::plain("a")),
            NodeKind::Sequence(Collection::block(vec![])),
            NodeKind::Sequence(Collection::flow(vec![NodeId::from_index(0)])),
            NodeKind::Sequence(Collection::block(vec![NodeId::from_index(0)])),
        ]);
        assert!(!has_bullet_marker(&tree, ids[0]));
        assert!(!has_bullet_marker(&tree, ids[1]));
        assert!(!has_bullet_marker(&tree, ids[2]));
        assert!(has_bullet_marker(&tree, ids[3]));
    }

    #[test]
    fn anchors() {
        let (tree, ids) = tree_with(vec![
            NodeKind::Scalar(Scalar::plain("a").with_anchor("x")),
            NodeKind::Alias("x".into()),
        ]);
        assert!(has_anchor(&tree, ids[0]));
        assert!(!has_anchor(&tree, ids[1]));
        assert!(needs_space_before_colon(&tree, ids[1]));
    }

    fn node0() -> NodeId {
        NodeId::from_index(0)
    }

    #[test]
    fn keys_that_need_the_explicit_form() {
        let (tree, ids) = tree_with(vec![
            NodeKind::Scalar(Scalar::plain("a")),
            NodeKind::Scalar(Scalar::new("a\n", ScalarStyle::Literal)),
            NodeKind::Scalar(Scalar::plain("")),
            NodeKind::Mapping(Collection::block(vec![node0(), node0()])),
            NodeKind::Mapping(Collection::flow(vec![node0(), node0()])),
        ]);
        let mut comments = Comments::for_tree(&tree);
        assert!(!needs_explicit_key(&tree, &comments, ids[0]));
        assert!(needs_explicit_key(&tree, &comments, ids[1]));
        assert!(needs_explicit_key(&tree, &comments, ids[2]));
        assert!(needs_explicit_key(&tree, &comments, ids[3]));
        assert!(!needs_explicit_key(&tree, &comments, ids[4]));
        comments.get_mut(ids[0]).trailing.push("# t".into());
        assert!(needs_explicit_key(&tree, &comments, ids[0]));
    }

    #[test]
    fn delimiters() {
        assert!(opens_with_delimiter("[a]"));
        assert!(opens_with_delimiter("{a: 1}"));
        assert!(!opens_with_delimiter("- a"));
    }
}
