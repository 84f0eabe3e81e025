//! Nesting of flat hierarchy lists into trees

use crate::entity::{EntityId, HierarchyNode};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// A hierarchy node with its nested children
#[derive(Debug, Clone, Serialize)]
pub struct TreeNode<T> {
    #[serde(flatten)]
    pub node: T,
    pub children: Vec<TreeNode<T>>,
}

impl<T: HierarchyNode> TreeNode<T> {
    /// Number of nodes in this subtree, including self
    #[must_use]
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(TreeNode::len).sum::<usize>()
    }

    /// A tree node is never empty; provided for clippy's `len_without_is_empty`
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Ids in depth-first pre-order
    #[must_use]
    pub fn preorder_ids(&self) -> Vec<EntityId> {
        let mut ids = Vec::with_capacity(self.len());
        collect_ids(self, &mut ids);
        ids
    }
}

fn collect_ids<T: HierarchyNode>(node: &TreeNode<T>, out: &mut Vec<EntityId>) {
    out.push(node.node.id().clone());
    for child in &node.children {
        collect_ids(child, out);
    }
}

/// Group a flat node list by parent and nest it
///
/// Roots are nodes without a parent, plus nodes whose parent is absent from
/// the input. Sibling order follows input order.
pub fn build_tree<T>(nodes: &[T]) -> Vec<TreeNode<T>>
where
    T: HierarchyNode + Clone,
{
    let present: HashSet<&EntityId> = nodes.iter().map(HierarchyNode::id).collect();
    let mut by_parent: HashMap<Option<&EntityId>, Vec<&T>> = HashMap::new();

    for node in nodes {
        let key = node.parent().filter(|p| present.contains(p));
        by_parent.entry(key).or_default().push(node);
    }

    build_level(None, &by_parent)
}

fn build_level<'a, T>(
    parent: Option<&'a EntityId>,
    by_parent: &HashMap<Option<&'a EntityId>, Vec<&'a T>>,
) -> Vec<TreeNode<T>>
where
    T: HierarchyNode + Clone,
{
    by_parent
        .get(&parent)
        .map(|children| {
            children
                .iter()
                .map(|&child| TreeNode {
                    node: child.clone(),
                    children: build_level(Some(child.id()), by_parent),
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Category;

    fn sample() -> Vec<Category> {
        vec![
            Category::new("a", "a", "A"),
            Category::new("b", "b", "B").with_parent("a"),
            Category::new("c", "c", "C").with_parent("b"),
            Category::new("d", "d", "D").with_parent("a"),
            Category::new("e", "e", "E"),
        ]
    }

    #[test]
    fn test_build_tree_nests_by_parent() {
        let tree = build_tree(&sample());

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].node.code, "a");
        assert_eq!(tree[0].children.len(), 2);
        assert_eq!(tree[0].children[0].children[0].node.code, "c");
        assert_eq!(tree[1].node.code, "e");
    }

    #[test]
    fn test_preorder_ids() {
        let tree = build_tree(&sample());
        let ids: Vec<String> = tree[0]
            .preorder_ids()
            .iter()
            .map(|id| id.as_str().to_string())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
        assert_eq!(tree[0].len(), 4);
    }

    #[test]
    fn test_orphans_become_roots() {
        let nodes = vec![
            Category::new("x", "x", "X").with_parent("missing"),
            Category::new("y", "y", "Y").with_parent("x"),
        ];
        let tree = build_tree(&nodes);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].node.code, "x");
        assert_eq!(tree[0].children[0].node.code, "y");
    }

    #[test]
    fn test_tree_serializes_flattened() {
        let tree = build_tree(&sample()[..2]);
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json[0]["code"], "a");
        assert_eq!(json[0]["children"][0]["code"], "b");
    }

    #[test]
    fn test_empty_input() {
        let tree: Vec<TreeNode<Category>> = build_tree(&[]);
        assert!(tree.is_empty());
    }
}
