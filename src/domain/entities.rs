//! Domain entities: flat input records, nested output nodes and composition options

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier of a node. Unique across the whole input set.
pub trait NodeId: Ord + Hash + Clone + Debug + Send + Sync {}

impl<T> NodeId for T where T: Ord + Hash + Clone + Debug + Send + Sync {}

/// Partition discriminator. Nodes with different keys never share a tree.
pub trait GroupKey: Ord + Hash + Clone + Debug + Send + Sync {}

impl<T> GroupKey for T where T: Ord + Hash + Clone + Debug + Send + Sync {}

/// Opaque data carried through composition unchanged.
pub trait Payload: Clone + Send + Sync {}

impl<T> Payload for T where T: Clone + Send + Sync {}

/// One flat record of the hierarchy, pointing at its parent by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node<I, G, P> {
    pub id: I,
    /// Parent identifier, `None` for a declared root
    #[serde(default)]
    pub parent_id: Option<I>,
    pub group_key: G,
    /// Sibling ordering value, not unique
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub payload: P,
}

impl<I, G, P> Node<I, G, P> {
    pub fn new(id: I, group_key: G, payload: P) -> Self {
        Self {
            id,
            parent_id: None,
            group_key,
            order: None,
            payload,
        }
    }

    pub fn with_parent(mut self, parent_id: I) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }
}

/// A node with its ordered children attached. Leaves carry an empty vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "I: Deserialize<'de> + Default, G: Deserialize<'de>, P: Deserialize<'de> + Default"))]
pub struct TreeNode<I, G, P> {
    #[serde(flatten)]
    pub node: Node<I, G, P>,
    pub children: Vec<TreeNode<I, G, P>>,
}

impl<I, G, P> TreeNode<I, G, P> {
    pub fn leaf(node: Node<I, G, P>) -> Self {
        Self {
            node,
            children: Vec::new(),
        }
    }
}

/// Ordered sequence of independent trees.
pub type Forest<I, G, P> = Vec<TreeNode<I, G, P>>;

/// Composition result: one forest per group key, iterated in key order.
pub type ForestMap<I, G, P> = BTreeMap<G, Forest<I, G, P>>;

/// Placement of siblings that carry no `order` value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingOrder {
    /// Before every sibling with an order value
    First,
    /// After every sibling with an order value
    #[default]
    Last,
}

impl FromStr for MissingOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" => Ok(Self::First),
            "last" => Ok(Self::Last),
            other => Err(format!("invalid missing-order '{other}', expected first|last")),
        }
    }
}

/// Handling of a parent id that exists in the input but under another group key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossGroupPolicy {
    /// Treat like an unknown parent: the child becomes a root of its own group
    #[default]
    Promote,
    /// Fail the whole composition with `CrossGroupParent`
    Reject,
}

impl FromStr for CrossGroupPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "promote" => Ok(Self::Promote),
            "reject" => Ok(Self::Reject),
            other => Err(format!("invalid cross-group policy '{other}', expected promote|reject")),
        }
    }
}

/// Knobs for a composition run. The composer keeps no other state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComposeOptions {
    pub missing_order: MissingOrder,
    pub cross_group: CrossGroupPolicy,
    /// Compose independent groups on the rayon pool
    pub parallel: bool,
}

/// Sibling comparison: `order` ascending, then `id` ascending.
pub fn sibling_cmp<I: Ord, G, P>(
    a: &Node<I, G, P>,
    b: &Node<I, G, P>,
    missing: MissingOrder,
) -> Ordering {
    let by_order = match (a.order, b.order) {
        (Some(x), Some(y)) => x.cmp(&y),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => match missing {
            MissingOrder::First => Ordering::Less,
            MissingOrder::Last => Ordering::Greater,
        },
        (Some(_), None) => match missing {
            MissingOrder::First => Ordering::Greater,
            MissingOrder::Last => Ordering::Less,
        },
    };
    by_order.then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn node(id: u32, order: Option<i64>) -> Node<u32, &'static str, ()> {
        Node {
            id,
            parent_id: None,
            group_key: "g",
            order,
            payload: (),
        }
    }

    #[rstest]
    #[case(node(1, Some(1)), node(2, Some(2)), Ordering::Less)]
    #[case(node(2, Some(1)), node(1, Some(1)), Ordering::Greater)]
    #[case(node(1, None), node(2, Some(9)), Ordering::Greater)]
    #[case(node(5, None), node(3, None), Ordering::Greater)]
    #[case(node(4, Some(-3)), node(4, Some(-3)), Ordering::Equal)]
    fn test_sibling_cmp_missing_last(
        #[case] a: Node<u32, &'static str, ()>,
        #[case] b: Node<u32, &'static str, ()>,
        #[case] expected: Ordering,
    ) {
        assert_eq!(sibling_cmp(&a, &b, MissingOrder::Last), expected);
    }

    #[test]
    fn test_sibling_cmp_missing_first() {
        assert_eq!(
            sibling_cmp(&node(9, None), &node(1, Some(0)), MissingOrder::First),
            Ordering::Less
        );
    }

    #[rstest]
    #[case("first", MissingOrder::First)]
    #[case(" LAST ", MissingOrder::Last)]
    fn test_missing_order_from_str(#[case] input: &str, #[case] expected: MissingOrder) {
        assert_eq!(input.parse::<MissingOrder>().unwrap(), expected);
    }

    #[test]
    fn test_cross_group_policy_rejects_unknown_value() {
        let err = "drop".parse::<CrossGroupPolicy>().unwrap_err();
        assert!(err.contains("promote|reject"));
    }

    #[test]
    fn test_node_deserializes_camel_case_with_defaults() {
        let json = r#"{"id": 7, "parentId": 1, "groupKey": "menu"}"#;
        let node: Node<i64, String, Option<String>> = serde_json::from_str(json).unwrap();
        assert_eq!(node.parent_id, Some(1));
        assert_eq!(node.group_key, "menu");
        assert_eq!(node.order, None);
        assert_eq!(node.payload, None);
    }

    #[test]
    fn test_tree_node_serializes_flat_fields_and_children() {
        let tree = TreeNode {
            node: Node::new(1_i64, "g".to_string(), 0_u8).with_order(2),
            children: vec![TreeNode::leaf(
                Node::new(2_i64, "g".to_string(), 0_u8).with_parent(1),
            )],
        };
        let value = serde_json::to_value(&tree).unwrap();
        assert_eq!(value["id"], 1);
        assert_eq!(value["order"], 2);
        assert_eq!(value["children"][0]["parentId"], 1);
        assert_eq!(value["children"][0]["children"], serde_json::json!([]));
    }

    #[test]
    fn test_tree_node_deserializes_nested_children() {
        let json = r#"{"id": 1, "groupKey": "g", "order": 3, "payload": "root",
            "children": [{"id": 2, "parentId": 1, "groupKey": "g", "children": []}]}"#;
        let tree: TreeNode<i64, String, String> = serde_json::from_str(json).unwrap();
        assert_eq!(tree.node.order, Some(3));
        assert_eq!(tree.node.payload, "root");
        assert_eq!(tree.children[0].node.parent_id, Some(1));
        assert_eq!(tree.children[0].node.payload, "");
        assert!(tree.children[0].children.is_empty());
    }
}
