use crate::tree::{NodeId, Tree};

/// Comments owned by one node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentAttachment {
    /// Comments immediately before the node, in source order.
    pub leading: Vec<String>,
    /// Comments after the node's content that still belong to it.
    pub trailing: Vec<String>,
    /// Comment on the same line as the node's closing token.
    pub line_end: Option<String>,
}

impl CommentAttachment {
    pub fn is_empty(&self) -> bool {
        self.leading.is_empty() && self.trailing.is_empty() && self.line_end.is_none()
    }
}

static EMPTY: CommentAttachment = CommentAttachment {
    leading: Vec::new(),
    trailing: Vec::new(),
    line_end: None,
};

/// Side table of [`CommentAttachment`]s indexed by [`NodeId`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comments {
    slots: Vec<CommentAttachment>,
}

impl Comments {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty attachment slot for every node of `tree`.
    pub fn for_tree(tree: &Tree) -> Self {
        Self {
            slots: vec![CommentAttachment::default(); tree.len()],
        }
    }

    pub fn get(&self, id: NodeId) -> &CommentAttachment {
        self.slots.get(id.index()).unwrap_or(&EMPTY)
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut CommentAttachment {
        if self.slots.len() <= id.index() {
            self.slots
                .resize_with(id.index() + 1, CommentAttachment::default);
        }
        &mut self.slots[id.index()]
    }

    pub fn leading(&self, id: NodeId) -> &[String] {
        &self.get(id).leading
    }

    pub fn trailing(&self, id: NodeId) -> &[String] {
        &self.get(id).trailing
    }

    pub fn line_end(&self, id: NodeId) -> Option<&str> {
        self.get(id).line_end.as_deref()
    }

    pub fn has_any(&self, id: NodeId) -> bool {
        !self.get(id).is_empty()
    }

    /// Non-empty attachments in arena order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &CommentAttachment)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| !slot.is_empty())
            .map(|(i, slot)| (NodeId::from_index(i), slot))
    }

    /// Every stored comment string, node by node.
    pub fn all(&self) -> Vec<&str> {
        self.slots
            .iter()
            .flat_map(|slot| {
                slot.leading
                    .iter()
                    .chain(slot.line_end.iter())
                    .chain(slot.trailing.iter())
                    .map(String::as_str)
            })
            .collect()
    }
}

/// A tree paired with the comments attributed to its nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotatedTree {
    pub tree: Tree,
    pub comments: Comments,
}

impl AnnotatedTree {
    pub fn new(tree: Tree, comments: Comments) -> Self {
        Self { tree, comments }
    }

    /// A tree without any comments.
    pub fn bare(tree: Tree) -> Self {
        let comments = Comments::for_tree(&tree);
        Self { tree, comments }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{NodeKind, Scalar};

    #[test]
    fn missing_slots_read_as_empty() -> Result<(), crate::Error> {
        let mut tree = Tree::new();
        let id = tree.push(NodeKind::Scalar(Scalar::plain("a")))?;
        let comments = Comments::new();
        assert!(comments.leading(id).is_empty());
        assert!(comments.trailing(id).is_empty());
        assert_eq!(comments.line_end(id), None);
        Ok(())
    }

    #[test]
    fn all_lists_leading_line_end_then_trailing() -> Result<(), crate::Error> {
        let mut tree = Tree::new();
        let a = tree.push(NodeKind::Scalar(Scalar::plain("a")))?;
        let b = tree.push(NodeKind::Scalar(Scalar::plain("b")))?;
        let mut comments = Comments::for_tree(&tree);
        comments.get_mut(b).leading.push("# b".into());
        let slot = comments.get_mut(a);
        slot.trailing.push("# after".into());
        slot.line_end = Some("# eol".into());
        slot.leading.push("# before".into());
        assert_eq!(comments.all(), vec!["# before", "# eol", "# after", "# b"]);
        assert_eq!(comments.iter().count(), 2);
        Ok(())
    }
}
