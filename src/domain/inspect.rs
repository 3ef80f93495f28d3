//! Read-only queries over composed trees.
//!
//! All walks use explicit stacks; no recursion over tree height.

use serde::Serialize;

use crate::domain::composer::GroupReport;
use crate::domain::entities::TreeNode;

impl<I, G, P> TreeNode<I, G, P> {
    /// Number of levels, a leaf has depth 1.
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(self, 1)];
        while let Some((node, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            stack.extend(node.children.iter().map(|c| (c, depth + 1)));
        }
        max_depth
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn size(&self) -> usize {
        self.iter().count()
    }

    /// Leaf nodes, left to right.
    pub fn leaves(&self) -> Vec<&TreeNode<I, G, P>> {
        self.iter().filter(|n| n.children.is_empty()).collect()
    }

    /// Pre-order traversal, left to right.
    pub fn iter(&self) -> TreeIter<'_, I, G, P> {
        TreeIter { stack: vec![self] }
    }

    pub fn find(&self, id: &I) -> Option<&TreeNode<I, G, P>>
    where
        I: PartialEq,
    {
        self.iter().find(|n| &n.node.id == id)
    }
}

pub struct TreeIter<'a, I, G, P> {
    stack: Vec<&'a TreeNode<I, G, P>>,
}

impl<'a, I, G, P> Iterator for TreeIter<'a, I, G, P> {
    type Item = &'a TreeNode<I, G, P>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        // Push children in reverse order for left-to-right traversal
        self.stack.extend(current.children.iter().rev());
        Some(current)
    }
}

/// Shape summary of one group's forest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ForestStats {
    pub roots: usize,
    pub nodes: usize,
    pub max_depth: usize,
    /// Roots that were promoted because their parent did not resolve
    pub orphans: usize,
}

impl ForestStats {
    pub fn of<I, G, P>(forest: &[TreeNode<I, G, P>]) -> Self {
        Self {
            roots: forest.len(),
            nodes: forest.iter().map(TreeNode::size).sum(),
            max_depth: forest.iter().map(TreeNode::depth).max().unwrap_or(0),
            orphans: 0,
        }
    }

    pub fn from_report<I, G, P>(report: &GroupReport<I, G, P>) -> Self {
        Self {
            orphans: report.orphans.len(),
            ..Self::of(&report.forest)
        }
    }
}
