//! Nested node shape: the canonical tree in its serialized form.

use serde::{Deserialize, Serialize};

/// One node of the canonical tree in nested form, as mirrored to the blob
/// store.
///
/// `children: None` marks a leaf. `Some(..)` marks a container, even when the
/// sequence is empty: an item that once held children stays expandable after
/// the last child is removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedNode {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<NestedNode>>,
}

impl NestedNode {
    pub fn leaf(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            children: None,
        }
    }

    pub fn branch(text: impl Into<String>, children: Vec<NestedNode>) -> Self {
        Self {
            text: text.into(),
            children: Some(children),
        }
    }

    pub fn is_container(&self) -> bool {
        self.children.is_some()
    }

    /// Number of nodes in this subtree, itself included.
    pub fn count(&self) -> usize {
        1 + self
            .children
            .iter()
            .flatten()
            .map(NestedNode::count)
            .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_serializes_without_children_key() {
        let json = serde_json::to_string(&NestedNode::leaf("milk")).unwrap();
        assert_eq!(json, r#"{"text":"milk"}"#);
    }

    #[test]
    fn test_empty_branch_keeps_children_key() {
        let json = serde_json::to_string(&NestedNode::branch("groceries", vec![])).unwrap();
        assert_eq!(json, r#"{"text":"groceries","children":[]}"#);
    }

    #[test]
    fn test_count_includes_all_descendants() {
        let tree = NestedNode::branch(
            "root",
            vec![
                NestedNode::branch("a", vec![NestedNode::leaf("a1")]),
                NestedNode::leaf("b"),
            ],
        );
        assert_eq!(tree.count(), 4);
    }
}
