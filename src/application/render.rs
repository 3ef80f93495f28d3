//! Text rendering of composed forests as ASCII trees

use std::fmt::Display;

use termtree::Tree;

use crate::domain::{Node, TreeNode};

/// Convert one composed tree into a `termtree::Tree`, labelling each node with `label`.
pub fn to_tree_string<I, G, P, F>(tree: &TreeNode<I, G, P>, label: &F) -> Tree<String>
where
    F: Fn(&Node<I, G, P>) -> String,
{
    let leaves: Vec<_> = tree
        .children
        .iter()
        .map(|c| to_tree_string(c, label))
        .collect();
    Tree::new(label(&tree.node)).with_leaves(leaves)
}

/// Render a group's forest below a header line naming the group key.
pub fn render_forest<I, G, P, F>(group: &G, forest: &[TreeNode<I, G, P>], label: &F) -> String
where
    G: Display,
    F: Fn(&Node<I, G, P>) -> String,
{
    let root = Tree::new(group.to_string()).with_leaves(forest.iter().map(|t| to_tree_string(t, label)));
    root.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_forest_lists_every_node_under_group() {
        let forest = vec![
            TreeNode {
                node: Node::new(1, "menu".to_string(), "Home"),
                children: vec![TreeNode::leaf(Node::new(2, "menu".to_string(), "About").with_parent(1))],
            },
            TreeNode::leaf(Node::new(3, "menu".to_string(), "Contact")),
        ];
        let text = render_forest(&"menu".to_string(), &forest, &|n: &Node<i32, String, &str>| {
            format!("{} {}", n.id, n.payload)
        });

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "menu");
        assert_eq!(lines.len(), 4);
        assert!(lines[1].ends_with("1 Home"));
        assert!(lines[2].ends_with("2 About"));
        assert!(lines[3].ends_with("3 Contact"));
    }
}
