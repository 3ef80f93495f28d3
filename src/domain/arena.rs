use std::collections::HashMap;

use generational_arena::{Arena, Index};
use tracing::{instrument, trace, warn};

use crate::domain::entities::{sibling_cmp, GroupKey, MissingOrder, Node, NodeId};

/// Arena slot: a borrowed input record plus resolved links.
#[derive(Debug)]
pub struct Slot<'a, I, G, P> {
    /// Input record, never mutated
    pub node: &'a Node<I, G, P>,
    /// Index of the resolved parent, None for roots and promoted orphans
    pub parent: Option<Index>,
    /// Indices of direct children, sorted by `(order, id)` once linked
    pub children: Vec<Index>,
}

/// Working structure for one group key.
///
/// Nodes live in a generational arena and refer to each other by `Index` only;
/// there are no back-references between owned nodes. Built once per group and
/// dropped after the forest is materialized.
#[derive(Debug)]
pub struct GroupArena<'a, I, G, P> {
    arena: Arena<Slot<'a, I, G, P>>,
    by_id: HashMap<&'a I, Index>,
    roots: Vec<Index>,
    orphans: Vec<Index>,
}

impl<'a, I: NodeId, G: GroupKey, P> GroupArena<'a, I, G, P> {
    /// Index the bucket by id, resolve parents and sort every sibling list.
    ///
    /// Ids must already be known unique; the composer checks this across the
    /// whole input before any arena is built.
    #[instrument(level = "trace", skip(bucket), fields(len = bucket.len()))]
    pub fn build(bucket: &[&'a Node<I, G, P>], missing: MissingOrder) -> Self {
        let mut arena = Arena::with_capacity(bucket.len());
        let mut by_id = HashMap::with_capacity(bucket.len());

        for &node in bucket {
            let idx = arena.insert(Slot {
                node,
                parent: None,
                children: Vec::new(),
            });
            by_id.insert(&node.id, idx);
        }

        let mut group = Self {
            arena,
            by_id,
            roots: Vec::new(),
            orphans: Vec::new(),
        };
        group.link(bucket);
        group.sort_siblings(missing);
        group
    }

    fn link(&mut self, bucket: &[&'a Node<I, G, P>]) {
        for &node in bucket {
            let Some(&idx) = self.by_id.get(&node.id) else {
                continue;
            };
            let parent_idx = node
                .parent_id
                .as_ref()
                .and_then(|pid| self.by_id.get(pid).copied());

            match (node.parent_id.as_ref(), parent_idx) {
                (None, _) => self.roots.push(idx),
                (Some(_), Some(pidx)) => {
                    if let Some(slot) = self.arena.get_mut(idx) {
                        slot.parent = Some(pidx);
                    }
                    if let Some(parent) = self.arena.get_mut(pidx) {
                        parent.children.push(idx);
                    }
                    trace!(id = ?node.id, "attached to parent");
                }
                (Some(pid), None) => {
                    warn!(id = ?node.id, parent_id = ?pid, group = ?node.group_key, "parent not in group, promoting to root");
                    self.roots.push(idx);
                    self.orphans.push(idx);
                }
            }
        }
    }

    fn sort_siblings(&mut self, missing: MissingOrder) {
        let arena = &self.arena;
        let cmp = |a: &Index, b: &Index| match (arena.get(*a), arena.get(*b)) {
            (Some(x), Some(y)) => sibling_cmp(x.node, y.node, missing),
            _ => a.cmp(b),
        };

        let mut sorted: Vec<(Index, Vec<Index>)> = Vec::new();
        for (idx, slot) in self.arena.iter() {
            if slot.children.len() > 1 {
                let mut children = slot.children.clone();
                children.sort_by(cmp);
                sorted.push((idx, children));
            }
        }
        self.roots.sort_by(cmp);
        self.orphans.sort_by(cmp);

        for (idx, children) in sorted {
            if let Some(slot) = self.arena.get_mut(idx) {
                slot.children = children;
            }
        }
    }

    pub fn get(&self, idx: Index) -> Option<&Slot<'a, I, G, P>> {
        self.arena.get(idx)
    }

    /// Roots in `(order, id)` order, promoted orphans included.
    pub fn roots(&self) -> &[Index] {
        &self.roots
    }

    /// Nodes whose declared parent did not resolve within the group.
    pub fn orphans(&self) -> impl Iterator<Item = &'a I> + '_ {
        self.orphans
            .iter()
            .filter_map(|&idx| self.arena.get(idx))
            .map(|slot| {
                let node: &'a Node<I, G, P> = slot.node;
                &node.id
            })
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// All slots, in no particular order.
    pub fn slots(&self) -> impl Iterator<Item = (Index, &Slot<'a, I, G, P>)> {
        self.arena.iter()
    }

    /// Pre-order walk from the roots, left to right.
    pub fn iter(&self) -> ArenaIterator<'_, 'a, I, G, P> {
        ArenaIterator::new(self)
    }
}

/// Depth-first pre-order traversal with an explicit stack; yields `(index, depth)`, roots at depth 1.
pub struct ArenaIterator<'g, 'a, I, G, P> {
    group: &'g GroupArena<'a, I, G, P>,
    stack: Vec<(Index, usize)>,
}

impl<'g, 'a, I: NodeId, G: GroupKey, P> ArenaIterator<'g, 'a, I, G, P> {
    fn new(group: &'g GroupArena<'a, I, G, P>) -> Self {
        let stack = group.roots.iter().rev().map(|&idx| (idx, 1)).collect();
        Self { group, stack }
    }
}

impl<'g, 'a, I: NodeId, G: GroupKey, P> Iterator for ArenaIterator<'g, 'a, I, G, P> {
    type Item = (Index, usize);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current, depth)) = self.stack.pop() {
            if let Some(slot) = self.group.get(current) {
                // Push children in reverse order for left-to-right traversal
                for &child in slot.children.iter().rev() {
                    self.stack.push((child, depth + 1));
                }
                return Some((current, depth));
            }
        }
        None
    }
}
