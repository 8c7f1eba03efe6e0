use crate::classify::{continues_on_bullet_line, has_bullet_marker, renders_in_flow};
use crate::comments::Comments;
use crate::tree::{NodeId, NodeKind, Tree};

/// Leading comments that move in front of a block sequence bullet.
///
/// `- # c\n  key: v` cannot be written back with the comment after the
/// `- `, so the comments of every node that starts on a bullet's line are
/// written before the bullet instead. A claimed node skips its own leading
/// comments when it is rendered.
#[derive(Debug, Default)]
pub(super) struct BulletClaims {
    claimed: Vec<bool>,
    /// Per sequence item, the claimed nodes that have leading comments.
    hoisted: Vec<Vec<NodeId>>,
}

impl BulletClaims {
    pub fn collect(tree: &Tree, comments: &Comments) -> Self {
        let mut claims = Self {
            claimed: vec![false; tree.len()],
            hoisted: vec![Vec::new(); tree.len()],
        };
        if let Some(root) = tree.root() {
            claims.visit(tree, comments, root, false);
        }
        claims
    }

    pub fn is_claimed(&self, id: NodeId) -> bool {
        self.claimed.get(id.index()).copied().unwrap_or(false)
    }

    /// Nodes whose leading comments go before the bullet of `item`.
    pub fn hoisted(&self, item: NodeId) -> &[NodeId] {
        self.hoisted
            .get(item.index())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn visit(&mut self, tree: &Tree, comments: &Comments, id: NodeId, in_flow: bool) {
        let in_flow = renders_in_flow(tree, id, in_flow) || in_flow;
        let kind = tree.kind(id);
        if !in_flow && has_bullet_marker(tree, id) {
            for &item in kind.children() {
                self.claim_spine(tree, comments, item);
            }
        }
        for &child in kind.children() {
            self.visit(tree, comments, child, in_flow);
        }
    }

    /// Claim `item` and the first nodes nested inside it that share the
    /// bullet's line.
    fn claim_spine(&mut self, tree: &Tree, comments: &Comments, item: NodeId) {
        let mut hoisted = Vec::new();
        let mut current = item;
        loop {
            if self.is_claimed(current) {
                break;
            }
            self.claimed[current.index()] = true;
            if !comments.leading(current).is_empty() {
                hoisted.push(current);
            }
            if !continues_on_bullet_line(tree, current) {
                break;
            }
            let kind = tree.kind(current);
            let Some(&first) = kind.children().first() else {
                break;
            };
            if matches!(kind, NodeKind::Mapping(_)) {
                // A key is followed by `:` on the same line; nothing inside
                // it starts the line.
                if !self.is_claimed(first) {
                    self.claimed[first.index()] = true;
                    if !comments.leading(first).is_empty() {
                        hoisted.push(first);
                    }
                }
                break;
            }
            current = first;
        }
        tracing::trace!(item = %item, hoisted = hoisted.len(), "claimed bullet line");
        self.hoisted[item.index()] = hoisted;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tree::{Collection, Scalar};

    #[test]
    fn first_key_of_an_item_mapping_is_hoisted() {
        let mut tree = Tree::new();
        let key = tree.push(NodeKind::Scalar(Scalar::plain("a"))).unwrap();
        let value = tree.push(NodeKind::Scalar(Scalar::plain("1"))).unwrap();
        let item = tree
            .push(NodeKind::Mapping(Collection::block(vec![key, value])))
            .unwrap();
        let seq = tree
            .push(NodeKind::Sequence(Collection::block(vec![item])))
            .unwrap();
        let mut comments = Comments::for_tree(&tree);
        comments.get_mut(key).leading.push("# c".into());

        let claims = BulletClaims::collect(&tree, &comments);
        assert!(claims.is_claimed(item));
        assert!(claims.is_claimed(key));
        assert!(!claims.is_claimed(value));
        assert!(!claims.is_claimed(seq));
        assert_eq!(claims.hoisted(item), [key]);
    }

    #[test]
    fn anchored_item_keeps_inner_comments() {
        let mut tree = Tree::new();
        let key = tree.push(NodeKind::Scalar(Scalar::plain("a"))).unwrap();
        let value = tree.push(NodeKind::Scalar(Scalar::plain("1"))).unwrap();
        let item = tree
            .push(NodeKind::Mapping(
                Collection::block(vec![key, value]).with_anchor("m"),
            ))
            .unwrap();
        tree.push(NodeKind::Sequence(Collection::block(vec![item])))
            .unwrap();
        let comments = Comments::for_tree(&tree);

        let claims = BulletClaims::collect(&tree, &comments);
        assert!(claims.is_claimed(item));
        assert!(!claims.is_claimed(key));
    }

    #[test]
    fn flow_sequences_claim_nothing() {
        let mut tree = Tree::new();
        let item = tree.push(NodeKind::Scalar(Scalar::plain("a"))).unwrap();
        tree.push(NodeKind::Sequence(Collection::flow(vec![item])))
            .unwrap();
        let claims = BulletClaims::collect(&tree, &Comments::for_tree(&tree));
        assert!(!claims.is_claimed(item));
    }
}
