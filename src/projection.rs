//! Flat projection of the canonical tree.
//!
//! Re-built in full on every store broadcast: a pre-order pass over the
//! canonical tree that reuses the existing flat row for any node whose text
//! is unchanged, so row identity (and with it selection and expansion state
//! in the rendering layer) survives republishes. Cost is O(node count) per
//! mutation, which is fine at interactive editing scale.

use std::collections::{HashMap, HashSet};

use crate::domain::{NodeId, OutlineTree};
use crate::store::TreeObserver;

/// Identity token of a flat row. A row keeps its id across re-flattens as
/// long as the underlying node's text is unchanged; a text edit allocates a
/// fresh one.
pub type FlatId = u64;

/// One displayable row of the flattened tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatNode {
    pub flat_id: FlatId,
    pub node_id: NodeId,
    pub text: String,
    /// 0-indexed ancestor count from a top-level item.
    pub depth: usize,
    /// True iff the canonical node is a container.
    pub expandable: bool,
}

/// Bidirectional index between canonical nodes and flat rows, plus the
/// visual expansion state. Both maps are pruned on every flatten pass so
/// they never hold entries for nodes no longer in the canonical tree.
#[derive(Debug, Default)]
pub struct Projection {
    order: Vec<NodeId>,
    by_node: HashMap<NodeId, FlatNode>,
    by_flat: HashMap<FlatId, NodeId>,
    expanded: HashSet<NodeId>,
    next_flat_id: FlatId,
}

impl Projection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full flatten pass: pre-order traversal, identity-preserving reuse,
    /// then pruning of entries for nodes absent from this traversal.
    pub fn refresh(&mut self, tree: &OutlineTree) {
        let mut order = Vec::with_capacity(tree.len());
        let mut seen = HashSet::with_capacity(tree.len());

        for (node_id, depth, node) in tree.iter() {
            seen.insert(node_id);
            order.push(node_id);

            match self.by_node.get_mut(&node_id) {
                Some(row) if row.text == node.text => {
                    row.depth = depth;
                    row.expandable = node.container;
                }
                _ => {
                    if let Some(old) = self.by_node.remove(&node_id) {
                        self.by_flat.remove(&old.flat_id);
                    }
                    let flat_id = self.next_flat_id;
                    self.next_flat_id += 1;
                    self.by_flat.insert(flat_id, node_id);
                    self.by_node.insert(
                        node_id,
                        FlatNode {
                            flat_id,
                            node_id,
                            text: node.text.clone(),
                            depth,
                            expandable: node.container,
                        },
                    );
                }
            }
        }

        let stale: Vec<NodeId> = self
            .by_node
            .keys()
            .filter(|id| !seen.contains(*id))
            .copied()
            .collect();
        for node_id in stale {
            if let Some(row) = self.by_node.remove(&node_id) {
                self.by_flat.remove(&row.flat_id);
            }
        }
        self.expanded.retain(|id| seen.contains(id));

        self.order = order;
    }

    /// All rows in pre-order, expansion state ignored.
    pub fn rows(&self) -> impl Iterator<Item = &FlatNode> {
        self.order.iter().filter_map(|id| self.by_node.get(id))
    }

    /// Rows whose ancestors are all expanded, in display order.
    pub fn visible_rows(&self) -> Vec<&FlatNode> {
        let mut visible = Vec::new();
        let mut hidden_below: Option<usize> = None;
        for row in self.rows() {
            if let Some(depth) = hidden_below {
                if row.depth > depth {
                    continue;
                }
                hidden_below = None;
            }
            visible.push(row);
            if row.expandable && !self.expanded.contains(&row.node_id) {
                hidden_below = Some(row.depth);
            }
        }
        visible
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn row(&self, flat_id: FlatId) -> Option<&FlatNode> {
        self.by_flat.get(&flat_id).and_then(|id| self.by_node.get(id))
    }

    pub fn node_of(&self, flat_id: FlatId) -> Option<NodeId> {
        self.by_flat.get(&flat_id).copied()
    }

    pub fn flat_of(&self, node_id: NodeId) -> Option<&FlatNode> {
        self.by_node.get(&node_id)
    }

    pub fn is_expanded(&self, node_id: NodeId) -> bool {
        self.expanded.contains(&node_id)
    }

    pub fn expand(&mut self, node_id: NodeId) {
        self.expanded.insert(node_id);
    }

    pub fn collapse(&mut self, node_id: NodeId) {
        self.expanded.remove(&node_id);
    }

    /// Expand a node and every descendant, e.g. after a drop relocated the
    /// whole subtree.
    pub fn expand_subtree(&mut self, tree: &OutlineTree, node_id: NodeId) {
        for id in tree.subtree_ids(node_id) {
            self.expanded.insert(id);
        }
    }
}

impl TreeObserver for Projection {
    fn tree_changed(&mut self, tree: &OutlineTree) {
        self.refresh(tree);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NestedNode;

    fn sample_tree() -> OutlineTree {
        OutlineTree::from_nested(&[
            NestedNode::branch(
                "groceries",
                vec![NestedNode::leaf("milk"), NestedNode::leaf("bread")],
            ),
            NestedNode::leaf("chores"),
        ])
    }

    #[test]
    fn test_flatten_is_preorder_with_depths() {
        let tree = sample_tree();
        let mut projection = Projection::new();
        projection.refresh(&tree);

        let rows: Vec<_> = projection
            .rows()
            .map(|r| (r.text.as_str(), r.depth, r.expandable))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("groceries", 0, true),
                ("milk", 1, false),
                ("bread", 1, false),
                ("chores", 0, false),
            ]
        );
    }

    #[test]
    fn test_reflatten_without_mutation_keeps_identity() {
        let tree = sample_tree();
        let mut projection = Projection::new();
        projection.refresh(&tree);
        let before: Vec<FlatId> = projection.rows().map(|r| r.flat_id).collect();
        projection.refresh(&tree);
        let after: Vec<FlatId> = projection.rows().map(|r| r.flat_id).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_text_change_reallocates_only_that_row() {
        let mut tree = sample_tree();
        let mut projection = Projection::new();
        projection.refresh(&tree);
        let before: Vec<FlatId> = projection.rows().map(|r| r.flat_id).collect();

        let milk = tree
            .iter()
            .find(|(_, _, n)| n.text == "milk")
            .map(|(id, _, _)| id)
            .unwrap();
        tree.update(milk, "oat milk");
        projection.refresh(&tree);
        let after: Vec<FlatId> = projection.rows().map(|r| r.flat_id).collect();

        assert_ne!(before[1], after[1]);
        assert_eq!(before[0], after[0]);
        assert_eq!(before[2], after[2]);
        assert_eq!(before[3], after[3]);
    }

    #[test]
    fn test_prune_evicts_rows_of_deleted_nodes() {
        let mut tree = sample_tree();
        let mut projection = Projection::new();
        projection.refresh(&tree);
        let groceries = tree
            .iter()
            .find(|(_, _, n)| n.text == "groceries")
            .map(|(id, _, _)| id)
            .unwrap();
        let groceries_flat = projection.flat_of(groceries).unwrap().flat_id;

        tree.delete(groceries);
        projection.refresh(&tree);

        assert_eq!(projection.len(), 1);
        assert!(projection.row(groceries_flat).is_none());
        assert!(projection.flat_of(groceries).is_none());
    }

    #[test]
    fn test_visible_rows_respect_collapsed_ancestors() {
        let tree = sample_tree();
        let mut projection = Projection::new();
        projection.refresh(&tree);

        // Everything starts collapsed: children of "groceries" are hidden.
        let visible: Vec<_> = projection.visible_rows().iter().map(|r| r.text.as_str()).collect();
        assert_eq!(visible, vec!["groceries", "chores"]);

        let groceries = projection.rows().next().unwrap().node_id;
        projection.expand(groceries);
        let visible: Vec<_> = projection.visible_rows().iter().map(|r| r.text.as_str()).collect();
        assert_eq!(visible, vec!["groceries", "milk", "bread", "chores"]);
    }
}
