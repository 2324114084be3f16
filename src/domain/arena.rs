//! Arena-based canonical tree.
//!
//! Uses a generational arena so every node carries a stable numeric identity
//! that survives edits and moves, and an index freed by a delete can never be
//! confused with a later node reusing the slot.

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::node::NestedNode;

/// Stable identity of a canonical node.
pub type NodeId = Index;

/// Destination of a re-parenting move, relative to an existing target node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePosition {
    /// Sibling immediately before the target, under the target's parent.
    Before(NodeId),
    /// Sibling immediately after the target, under the target's parent.
    After(NodeId),
    /// First child of the target.
    FirstChild(NodeId),
}

impl MovePosition {
    pub fn target(&self) -> NodeId {
        match *self {
            MovePosition::Before(t) | MovePosition::After(t) | MovePosition::FirstChild(t) => t,
        }
    }
}

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct OutlineNode {
    pub text: String,
    /// Index of the parent node, None only for the synthetic root.
    pub parent: Option<NodeId>,
    /// Indices of child nodes, in display order.
    pub children: Vec<NodeId>,
    /// A container keeps its (possibly empty) child sequence; a leaf has none.
    pub container: bool,
}

/// The canonical nested tree, strictly hierarchical: each node is owned by
/// exactly one parent, no sharing, no cycles.
///
/// A synthetic root holds the top-level items; it is never displayed,
/// serialized, moved, or deleted.
#[derive(Debug)]
pub struct OutlineTree {
    arena: Arena<OutlineNode>,
    root: NodeId,
}

impl Default for OutlineTree {
    fn default() -> Self {
        Self::new()
    }
}

impl OutlineTree {
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(OutlineNode {
            text: String::new(),
            parent: None,
            children: Vec::new(),
            container: true,
        });
        Self { arena, root }
    }

    /// Build the canonical tree from its nested form (seed literal or a
    /// deserialized blob).
    pub fn from_nested(top_level: &[NestedNode]) -> Self {
        let mut tree = Self::new();
        for item in top_level {
            tree.attach_nested(tree.root, item);
        }
        tree
    }

    fn attach_nested(&mut self, parent: NodeId, nested: &NestedNode) {
        let id = self.arena.insert(OutlineNode {
            text: nested.text.clone(),
            parent: Some(parent),
            children: Vec::new(),
            container: nested.is_container(),
        });
        if let Some(p) = self.arena.get_mut(parent) {
            p.children.push(id);
        }
        for child in nested.children.iter().flatten() {
            self.attach_nested(id, child);
        }
    }

    /// Export the tree back to its nested form (top-level items only, the
    /// synthetic root is implicit).
    pub fn to_nested(&self) -> Vec<NestedNode> {
        self.children_of(self.root)
            .iter()
            .map(|&c| self.export_nested(c))
            .collect()
    }

    fn export_nested(&self, id: NodeId) -> NestedNode {
        let node = &self.arena[id];
        NestedNode {
            text: node.text.clone(),
            children: if node.container {
                Some(node.children.iter().map(|&c| self.export_nested(c)).collect())
            } else {
                None
            },
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&OutlineNode> {
        self.arena.get(id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains(id)
    }

    /// Number of nodes, the synthetic root excluded.
    pub fn len(&self) -> usize {
        self.arena.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.arena
            .get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Append a new leaf with the given text as the last child of `parent`.
    /// Returns None without touching the tree when `parent` is gone.
    #[instrument(level = "trace", skip(self))]
    pub fn insert(&mut self, parent: NodeId, text: &str) -> Option<NodeId> {
        if !self.arena.contains(parent) {
            return None;
        }
        let id = self.arena.insert(OutlineNode {
            text: text.to_string(),
            parent: Some(parent),
            children: Vec::new(),
            container: false,
        });
        let p = &mut self.arena[parent];
        p.children.push(id);
        p.container = true;
        Some(id)
    }

    /// Set a node's text in place. Returns false when the node is gone.
    #[instrument(level = "trace", skip(self, text))]
    pub fn update(&mut self, id: NodeId, text: &str) -> bool {
        match self.arena.get_mut(id) {
            Some(node) => {
                node.text = text.to_string();
                true
            }
            None => false,
        }
    }

    /// Remove a node and its entire subtree. Returns false when the node is
    /// gone already; the synthetic root cannot be deleted.
    #[instrument(level = "trace", skip(self))]
    pub fn delete(&mut self, id: NodeId) -> bool {
        if id == self.root || !self.arena.contains(id) {
            return false;
        }
        if let Some(parent) = self.arena[id].parent {
            if let Some(p) = self.arena.get_mut(parent) {
                p.children.retain(|&c| c != id);
            }
        }
        for victim in self.subtree_ids(id) {
            self.arena.remove(victim);
        }
        true
    }

    /// Atomically detach `node` from its parent and reattach it at `dest`.
    ///
    /// Rejects moves that would make the tree cyclic: the target must not be
    /// the node itself or any of its descendants.
    #[instrument(level = "trace", skip(self))]
    pub fn move_node(&mut self, node: NodeId, dest: MovePosition) -> DomainResult<()> {
        if node == self.root {
            return Err(DomainError::RootImmutable);
        }
        if !self.arena.contains(node) {
            return Err(DomainError::NodeMissing);
        }
        let target = dest.target();
        if !self.arena.contains(target) || target == self.root {
            return Err(DomainError::NodeMissing);
        }
        if target == node || self.is_descendant(target, node) {
            return Err(DomainError::WouldCycle);
        }

        let old_parent = self.arena[node].parent.ok_or(DomainError::RootImmutable)?;
        if let Some(p) = self.arena.get_mut(old_parent) {
            p.children.retain(|&c| c != node);
        }

        let (new_parent, position) = match dest {
            MovePosition::Before(t) | MovePosition::After(t) => {
                let parent = self.arena[t].parent.ok_or(DomainError::NodeMissing)?;
                let anchor = self
                    .children_of(parent)
                    .iter()
                    .position(|&c| c == t)
                    .ok_or(DomainError::NodeMissing)?;
                let position = match dest {
                    MovePosition::After(_) => anchor + 1,
                    _ => anchor,
                };
                (parent, position)
            }
            MovePosition::FirstChild(t) => (t, 0),
        };

        let p = &mut self.arena[new_parent];
        p.children.insert(position, node);
        p.container = true;
        self.arena[node].parent = Some(new_parent);
        Ok(())
    }

    /// Whether `candidate` sits somewhere below `ancestor`.
    pub fn is_descendant(&self, candidate: NodeId, ancestor: NodeId) -> bool {
        let mut cursor = self.arena.get(candidate).and_then(|n| n.parent);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.arena.get(id).and_then(|n| n.parent);
        }
        false
    }

    /// Pre-order ids of the subtree rooted at `id`, `id` included.
    pub fn subtree_ids(&self, id: NodeId) -> Vec<NodeId> {
        let mut ids = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !self.arena.contains(current) {
                continue;
            }
            ids.push(current);
            for &child in self.children_of(current).iter().rev() {
                stack.push(child);
            }
        }
        ids
    }

    /// Depth-first pre-order traversal of the displayed nodes: top-level
    /// items at depth 0, the synthetic root skipped.
    pub fn iter(&self) -> PreorderIter<'_> {
        PreorderIter::new(self)
    }

    /// Render the tree for terminal display.
    pub fn render(&self) -> termtree::Tree<String> {
        self.render_from(self.root)
    }

    fn render_from(&self, id: NodeId) -> termtree::Tree<String> {
        let node = &self.arena[id];
        let label = if id == self.root {
            ".".to_string()
        } else {
            node.text.clone()
        };
        let leaves: Vec<_> = node.children.iter().map(|&c| self.render_from(c)).collect();
        termtree::Tree::new(label).with_leaves(leaves)
    }
}

pub struct PreorderIter<'a> {
    tree: &'a OutlineTree,
    stack: Vec<(NodeId, usize)>,
}

impl<'a> PreorderIter<'a> {
    fn new(tree: &'a OutlineTree) -> Self {
        let mut stack = Vec::new();
        for &child in tree.children_of(tree.root()).iter().rev() {
            stack.push((child, 0));
        }
        Self { tree, stack }
    }
}

impl<'a> Iterator for PreorderIter<'a> {
    type Item = (NodeId, usize, &'a OutlineNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((id, depth)) = self.stack.pop() {
            if let Some(node) = self.tree.get(id) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push((child, depth + 1));
                }
                return Some((id, depth, node));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // groceries
    // ├── milk
    // └── bread
    // chores
    fn sample() -> OutlineTree {
        OutlineTree::from_nested(&[
            NestedNode::branch(
                "groceries",
                vec![NestedNode::leaf("milk"), NestedNode::leaf("bread")],
            ),
            NestedNode::leaf("chores"),
        ])
    }

    fn id_of(tree: &OutlineTree, text: &str) -> NodeId {
        tree.iter()
            .find(|(_, _, n)| n.text == text)
            .map(|(id, _, _)| id)
            .unwrap()
    }

    #[test]
    fn test_from_nested_preserves_shape() {
        let tree = sample();
        assert_eq!(tree.len(), 4);
        let order: Vec<_> = tree.iter().map(|(_, d, n)| (n.text.clone(), d)).collect();
        assert_eq!(
            order,
            vec![
                ("groceries".to_string(), 0),
                ("milk".to_string(), 1),
                ("bread".to_string(), 1),
                ("chores".to_string(), 0),
            ]
        );
    }

    #[test]
    fn test_round_trip_is_structurally_equal() {
        let seed = vec![
            NestedNode::branch(
                "groceries",
                vec![NestedNode::leaf("milk"), NestedNode::branch("empty", vec![])],
            ),
            NestedNode::leaf("chores"),
        ];
        let tree = OutlineTree::from_nested(&seed);
        assert_eq!(tree.to_nested(), seed);
    }

    #[test]
    fn test_insert_marks_parent_as_container() {
        let mut tree = sample();
        let chores = id_of(&tree, "chores");
        assert!(!tree.get(chores).unwrap().container);
        let laundry = tree.insert(chores, "laundry").unwrap();
        assert!(tree.get(chores).unwrap().container);
        assert_eq!(tree.get(laundry).unwrap().parent, Some(chores));
    }

    #[test]
    fn test_insert_under_missing_parent_is_noop() {
        let mut tree = sample();
        let chores = id_of(&tree, "chores");
        tree.delete(chores);
        assert_eq!(tree.insert(chores, "laundry"), None);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_delete_removes_whole_subtree() {
        let mut tree = sample();
        let groceries = id_of(&tree, "groceries");
        assert!(tree.delete(groceries));
        assert_eq!(tree.len(), 1);
        assert!(!tree.contains(groceries));
    }

    #[test]
    fn test_move_before_keeps_node_count() {
        let mut tree = sample();
        let chores = id_of(&tree, "chores");
        let milk = id_of(&tree, "milk");
        tree.move_node(chores, MovePosition::Before(milk)).unwrap();
        assert_eq!(tree.len(), 4);
        let order: Vec<_> = tree.iter().map(|(_, _, n)| n.text.clone()).collect();
        assert_eq!(order, vec!["groceries", "chores", "milk", "bread"]);
    }

    #[test]
    fn test_move_into_own_subtree_is_rejected() {
        let mut tree = sample();
        let groceries = id_of(&tree, "groceries");
        let milk = id_of(&tree, "milk");
        let err = tree
            .move_node(groceries, MovePosition::FirstChild(milk))
            .unwrap_err();
        assert_eq!(err, DomainError::WouldCycle);
        // Tree unchanged
        let order: Vec<_> = tree.iter().map(|(_, _, n)| n.text.clone()).collect();
        assert_eq!(order, vec!["groceries", "milk", "bread", "chores"]);
    }

    #[test]
    fn test_move_after_within_same_parent() {
        let mut tree = sample();
        let milk = id_of(&tree, "milk");
        let bread = id_of(&tree, "bread");
        tree.move_node(milk, MovePosition::After(bread)).unwrap();
        let order: Vec<_> = tree.iter().map(|(_, _, n)| n.text.clone()).collect();
        assert_eq!(order, vec!["groceries", "bread", "milk", "chores"]);
    }
}
