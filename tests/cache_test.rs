//! Tests for ForestCache memoization

use flatree::application::ForestCache;
use flatree::application::ApplicationError;
use flatree::domain::{
    compose, ComposeErrorKind, ComposeOptions, CrossGroupPolicy, MissingOrder, Node, TreeComposer,
};

type N = Node<u32, String, String>;

fn n(id: u32, parent: Option<u32>, group: &str, payload: &str) -> N {
    Node {
        id,
        parent_id: parent,
        group_key: group.to_string(),
        order: None,
        payload: payload.to_string(),
    }
}

fn snapshot() -> Vec<N> {
    vec![
        n(1, None, "menu", "Home"),
        n(2, Some(1), "menu", "News"),
        n(3, None, "footer", "Imprint"),
    ]
}

#[test]
fn given_same_snapshot_when_requested_twice_then_second_is_hit() {
    // Arrange
    let mut cache = ForestCache::new(TreeComposer::default(), 8);
    let nodes = snapshot();
    let key = "menu".to_string();

    // Act
    let first = cache.get_or_compose(&nodes, &key).unwrap();
    let mut reordered = nodes.clone();
    reordered.reverse();
    let second = cache.get_or_compose(&reordered, &key).unwrap();

    // Assert
    assert_eq!(first, second);
    assert_eq!(first, compose(&nodes).unwrap()["menu"]);
    let stats = cache.stats();
    assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
}

#[test]
fn given_changed_group_when_requested_then_recomposed() {
    let mut cache = ForestCache::new(TreeComposer::default(), 8);
    let mut nodes = snapshot();
    let key = "menu".to_string();
    cache.get_or_compose(&nodes, &key).unwrap();

    nodes[1].payload = "Press".to_string();
    let forest = cache.get_or_compose(&nodes, &key).unwrap();

    assert_eq!(forest[0].children[0].node.payload, "Press");
    assert_eq!(cache.stats().misses, 2);
}

#[test]
fn given_change_in_other_group_when_requested_then_recomposed() {
    let mut cache = ForestCache::new(TreeComposer::default(), 8);
    let mut nodes = snapshot();
    let key = "menu".to_string();
    cache.get_or_compose(&nodes, &key).unwrap();

    nodes[2].payload = "Legal".to_string();
    cache.get_or_compose(&nodes, &key).unwrap();

    assert_eq!(cache.stats().hits, 0);
    assert_eq!(cache.stats().misses, 2);
}

#[test]
fn given_duplicate_added_in_other_group_when_requested_then_rejected_like_compose() {
    let mut cache = ForestCache::new(TreeComposer::default(), 8);
    let mut nodes = vec![n(1, None, "menu", "Home"), n(2, Some(1), "menu", "News")];
    let key = "menu".to_string();
    cache.get_or_compose(&nodes, &key).unwrap();

    nodes.push(n(1, None, "footer", "Imprint"));
    let result = cache.get_or_compose(&nodes, &key);

    assert!(compose(&nodes).is_err());
    assert!(matches!(
        result,
        Err(ApplicationError::Compose {
            kind: ComposeErrorKind::DuplicateIdentifier,
            ..
        })
    ));
    assert_eq!(cache.stats().hits, 0);
}

#[test]
fn given_cross_group_parent_added_under_reject_when_requested_then_rejected() {
    let composer = TreeComposer::new(ComposeOptions {
        cross_group: CrossGroupPolicy::Reject,
        ..ComposeOptions::default()
    });
    let mut cache = ForestCache::new(composer, 8);
    let mut nodes = snapshot();
    let key = "menu".to_string();
    cache.get_or_compose(&nodes, &key).unwrap();

    nodes.push(n(4, Some(1), "footer", "Contact"));
    let result = cache.get_or_compose(&nodes, &key);

    assert!(matches!(
        result,
        Err(ApplicationError::Compose {
            kind: ComposeErrorKind::CrossGroupParent,
            ..
        })
    ));
}

#[test]
fn given_unknown_group_when_requested_then_error_not_cached() {
    let mut cache = ForestCache::new(TreeComposer::default(), 8);

    let result = cache.get_or_compose(&snapshot(), &"sidebar".to_string());

    assert!(result.is_err());
    assert_eq!(cache.stats().entries, 0);
}

#[test]
fn given_cache_bound_to_options_when_composing_then_options_applied() {
    let composer = TreeComposer::new(ComposeOptions {
        missing_order: MissingOrder::First,
        ..ComposeOptions::default()
    });
    let mut cache = ForestCache::new(composer, 8);
    let mut nodes = snapshot();
    nodes.push(n(4, None, "menu", "Blog"));
    nodes[0].order = Some(0);

    let forest = cache.get_or_compose(&nodes, &"menu".to_string()).unwrap();

    let roots: Vec<u32> = forest.iter().map(|t| t.node.id).collect();
    assert_eq!(roots, vec![4, 1]);
}

#[test]
fn given_cleared_cache_when_requested_then_miss() {
    let mut cache = ForestCache::new(TreeComposer::default(), 8);
    let nodes = snapshot();
    let key = "footer".to_string();
    cache.get_or_compose(&nodes, &key).unwrap();

    cache.clear();
    cache.get_or_compose(&nodes, &key).unwrap();

    assert_eq!(cache.stats().misses, 2);
    assert_eq!(cache.stats().hits, 0);
}
