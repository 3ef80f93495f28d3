//! Flat-to-tree composition.
//!
//! Input is a flat slice of [`Node`] records pointing at their parents by id.
//! Output is one ordered forest per group key. The composer is stateless: every
//! call builds its own per-group arenas and drops them before returning.
//!
//! Policies:
//! - a parent id that does not resolve within the node's group promotes the node
//!   to a root (orphan-becomes-root), it is never dropped
//! - a parent id that resolves in another group is promoted the same way, or
//!   rejected with [`ComposeError::CrossGroupParent`] under [`CrossGroupPolicy::Reject`]
//! - siblings and roots are ordered by `(order, id)`
//! - any failure aborts the whole call

use std::collections::{BTreeMap, HashMap, HashSet};

use generational_arena::Index;
use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::domain::arena::GroupArena;
use crate::domain::entities::{
    ComposeOptions, CrossGroupPolicy, Forest, ForestMap, GroupKey, Node, NodeId, Payload,
    TreeNode,
};
use crate::domain::error::{ComposeError, ComposeResult};

/// Forest of one group plus the ids that were promoted to roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupReport<I, G, P> {
    pub forest: Forest<I, G, P>,
    /// Promoted orphans in `(order, id)` order
    pub orphans: Vec<I>,
}

/// Materialization strategy applied to every group arena.
#[derive(Debug, Clone, Copy)]
enum Depth {
    Unbounded,
    AtMost(usize),
}

type Buckets<'a, I, G, P> = BTreeMap<&'a G, Vec<&'a Node<I, G, P>>>;

/// Composes flat parent-pointer records into grouped, ordered forests.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeComposer {
    options: ComposeOptions,
}

impl TreeComposer {
    pub fn new(options: ComposeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> ComposeOptions {
        self.options
    }

    /// Compose every group present in `nodes`, to arbitrary depth.
    ///
    /// # Errors
    /// * `DuplicateIdentifier` if two nodes share an id anywhere in the input
    /// * `CrossGroupParent` under the reject policy
    /// * `CycleDetected` if a group's parent links contain a cycle
    #[instrument(level = "debug", skip(self, nodes), fields(nodes = nodes.len()))]
    pub fn compose<I, G, P>(&self, nodes: &[Node<I, G, P>]) -> ComposeResult<ForestMap<I, G, P>, I, G>
    where
        I: NodeId,
        G: GroupKey,
        P: Payload,
    {
        Ok(strip_reports(self.run(nodes, Depth::Unbounded)?))
    }

    /// Compose the whole input, then keep only the requested groups.
    ///
    /// Validation still covers every group. A requested key absent from the
    /// input fails with `UnknownGroupKeyRequested` instead of yielding an empty forest.
    #[instrument(level = "debug", skip(self, nodes), fields(nodes = nodes.len()))]
    pub fn compose_groups<I, G, P>(
        &self,
        nodes: &[Node<I, G, P>],
        keys: &[G],
    ) -> ComposeResult<ForestMap<I, G, P>, I, G>
    where
        I: NodeId,
        G: GroupKey,
        P: Payload,
    {
        select_groups(self.compose(nodes)?, keys)
    }

    /// Shortcut for data known to be shallow: materializes at most `max_depth`
    /// levels (1 = roots only, 3 = children of children) without an
    /// unbounded traversal.
    ///
    /// Data is never truncated: any node below the limit fails the call with
    /// `DepthExceeded` naming the smallest such id. Within the limit the result equals [`Self::compose`].
    #[instrument(level = "debug", skip(self, nodes), fields(nodes = nodes.len()))]
    pub fn compose_bounded<I, G, P>(
        &self,
        nodes: &[Node<I, G, P>],
        max_depth: usize,
    ) -> ComposeResult<ForestMap<I, G, P>, I, G>
    where
        I: NodeId,
        G: GroupKey,
        P: Payload,
    {
        Ok(strip_reports(self.run(nodes, Depth::AtMost(max_depth))?))
    }

    /// Like [`Self::compose`], also reporting promoted orphans per group.
    #[instrument(level = "debug", skip(self, nodes), fields(nodes = nodes.len()))]
    pub fn compose_report<I, G, P>(
        &self,
        nodes: &[Node<I, G, P>],
    ) -> ComposeResult<BTreeMap<G, GroupReport<I, G, P>>, I, G>
    where
        I: NodeId,
        G: GroupKey,
        P: Payload,
    {
        self.run(nodes, Depth::Unbounded)
    }

    fn run<I, G, P>(
        &self,
        nodes: &[Node<I, G, P>],
        depth: Depth,
    ) -> ComposeResult<BTreeMap<G, GroupReport<I, G, P>>, I, G>
    where
        I: NodeId,
        G: GroupKey,
        P: Payload,
    {
        let buckets = self.partition(nodes)?;
        debug!(groups = buckets.len(), "partitioned input");

        let options = self.options;
        let work: Vec<(&G, Vec<&Node<I, G, P>>)> = buckets.into_iter().collect();

        let composed: Vec<(&G, ComposeResult<GroupReport<I, G, P>, I, G>)> = if options.parallel {
            work.into_par_iter()
                .map(|(key, bucket)| (key, compose_bucket(&bucket, options, depth)))
                .collect()
        } else {
            work.into_iter()
                .map(|(key, bucket)| (key, compose_bucket(&bucket, options, depth)))
                .collect()
        };

        let mut out = BTreeMap::new();
        for (key, result) in composed {
            out.insert(key.clone(), result?);
        }
        Ok(out)
    }

    /// Group by key while checking id uniqueness across the whole input.
    fn partition<'a, I, G, P>(&self, nodes: &'a [Node<I, G, P>]) -> ComposeResult<Buckets<'a, I, G, P>, I, G>
    where
        I: NodeId,
        G: GroupKey,
    {
        let mut group_of: HashMap<&'a I, &'a G> = HashMap::with_capacity(nodes.len());
        let mut buckets: Buckets<'a, I, G, P> = BTreeMap::new();

        for node in nodes {
            if group_of.insert(&node.id, &node.group_key).is_some() {
                return Err(ComposeError::DuplicateIdentifier(node.id.clone()));
            }
            buckets.entry(&node.group_key).or_default().push(node);
        }

        for node in nodes {
            let Some(parent_id) = node.parent_id.as_ref() else {
                continue;
            };
            match group_of.get(parent_id) {
                Some(&group) if group != &node.group_key => match self.options.cross_group {
                    CrossGroupPolicy::Reject => {
                        return Err(ComposeError::CrossGroupParent {
                            id: node.id.clone(),
                            parent_id: parent_id.clone(),
                        });
                    }
                    CrossGroupPolicy::Promote => {
                        debug!(id = ?node.id, parent_id = ?parent_id, "cross-group parent, promoting");
                    }
                },
                _ => {}
            }
        }

        Ok(buckets)
    }
}

/// Keep only `keys` from a composed map, failing on the first key that is absent.
pub fn select_groups<I, G, P>(mut all: ForestMap<I, G, P>, keys: &[G]) -> ComposeResult<ForestMap<I, G, P>, I, G>
where
    I: NodeId,
    G: GroupKey,
{
    let mut selected = BTreeMap::new();
    for key in keys {
        match all.remove(key) {
            Some(forest) => {
                selected.insert(key.clone(), forest);
            }
            None if selected.contains_key(key) => {}
            None => return Err(ComposeError::UnknownGroupKeyRequested(key.clone())),
        }
    }
    Ok(selected)
}

fn strip_reports<I, G: Ord, P>(reports: BTreeMap<G, GroupReport<I, G, P>>) -> ForestMap<I, G, P> {
    reports
        .into_iter()
        .map(|(key, report)| (key, report.forest))
        .collect()
}

fn compose_bucket<I, G, P>(
    bucket: &[&Node<I, G, P>],
    options: ComposeOptions,
    depth: Depth,
) -> ComposeResult<GroupReport<I, G, P>, I, G>
where
    I: NodeId,
    G: GroupKey,
    P: Payload,
{
    let group = GroupArena::build(bucket, options.missing_order);
    let forest = match depth {
        Depth::Unbounded => materialize(&group)?,
        Depth::AtMost(max_depth) => materialize_bounded(&group, max_depth)?,
    };
    let orphans = group.orphans().cloned().collect();
    Ok(GroupReport { forest, orphans })
}

struct Frame<I, G, P> {
    idx: Index,
    next_child: usize,
    built: Vec<TreeNode<I, G, P>>,
}

impl<I, G, P> Frame<I, G, P> {
    fn new(idx: Index) -> Self {
        Self {
            idx,
            next_child: 0,
            built: Vec::new(),
        }
    }
}

/// Depth-agnostic materialization.
///
/// Post-order with an explicit stack so tree height is limited by memory, not
/// by the call stack. `on_path` holds the ancestors of the frame on top.
fn materialize<I, G, P>(group: &GroupArena<'_, I, G, P>) -> ComposeResult<Forest<I, G, P>, I, G>
where
    I: NodeId,
    G: GroupKey,
    P: Payload,
{
    let mut forest = Vec::with_capacity(group.roots().len());
    let mut visited: HashSet<Index> = HashSet::with_capacity(group.len());

    for &root in group.roots() {
        let mut on_path: HashSet<Index> = HashSet::new();
        on_path.insert(root);
        let mut stack = vec![Frame::new(root)];

        while let Some(top) = stack.last_mut() {
            let Some(slot) = group.get(top.idx) else {
                stack.pop();
                continue;
            };

            if let Some(&child) = slot.children.get(top.next_child) {
                top.next_child += 1;
                if !on_path.insert(child) {
                    let id = group
                        .get(child)
                        .map(|s| s.node.id.clone())
                        .unwrap_or_else(|| slot.node.id.clone());
                    return Err(ComposeError::CycleDetected(id));
                }
                stack.push(Frame::new(child));
                continue;
            }

            let Some(frame) = stack.pop() else { break };
            on_path.remove(&frame.idx);
            visited.insert(frame.idx);
            let tree = TreeNode {
                node: slot.node.clone(),
                children: frame.built,
            };
            match stack.last_mut() {
                Some(parent) => parent.built.push(tree),
                None => forest.push(tree),
            }
        }
    }

    if visited.len() < group.len() {
        if let Some(id) = cycle_member(group, &visited) {
            return Err(ComposeError::CycleDetected(id));
        }
    }
    Ok(forest)
}

/// Level-by-level materialization for at most `max_depth` levels.
fn materialize_bounded<I, G, P>(
    group: &GroupArena<'_, I, G, P>,
    max_depth: usize,
) -> ComposeResult<Forest<I, G, P>, I, G>
where
    I: NodeId,
    G: GroupKey,
    P: Payload,
{
    // levels[d] holds the indices first seen at depth d + 1
    let mut levels: Vec<Vec<Index>> = vec![group.roots().to_vec()];
    let mut visited: HashSet<Index> = group.roots().iter().copied().collect();

    while let Some(current) = levels.last().filter(|level| !level.is_empty()) {
        if levels.len() > max_depth {
            if let Some(id) = smallest_below(group, max_depth) {
                return Err(ComposeError::DepthExceeded { id, max_depth });
            }
        }
        let next: Vec<Index> = current
            .iter()
            .filter_map(|&idx| group.get(idx))
            .flat_map(|slot| slot.children.iter().copied())
            .collect();
        if next.is_empty() {
            break;
        }
        visited.extend(next.iter().copied());
        levels.push(next);
    }

    if visited.len() < group.len() {
        if let Some(id) = cycle_member(group, &visited) {
            return Err(ComposeError::CycleDetected(id));
        }
    }

    // Assemble bottom-up: every level's trees are attached to the level above.
    let mut built: HashMap<Index, TreeNode<I, G, P>> = HashMap::with_capacity(visited.len());
    for level in levels.iter().rev() {
        for &idx in level {
            let Some(slot) = group.get(idx) else { continue };
            let children = slot
                .children
                .iter()
                .filter_map(|child| built.remove(child))
                .collect();
            built.insert(
                idx,
                TreeNode {
                    node: slot.node.clone(),
                    children,
                },
            );
        }
    }

    Ok(group
        .roots()
        .iter()
        .filter_map(|root| built.remove(root))
        .collect())
}

/// Smallest id deeper than `max_depth`, over every level reachable from the roots.
///
/// Nodes reachable from a root never lie on a cycle, so the walk terminates.
fn smallest_below<I, G, P>(group: &GroupArena<'_, I, G, P>, max_depth: usize) -> Option<I>
where
    I: NodeId,
    G: GroupKey,
{
    group
        .iter()
        .filter(|&(_, depth)| depth > max_depth)
        .filter_map(|(idx, _)| group.get(idx).map(|slot| &slot.node.id))
        .min()
        .cloned()
}

/// Pick a node that lies on a cycle among the unreached nodes.
///
/// Starts at the smallest unreached id and follows parent links until a node
/// repeats. Unreached nodes always have a resolved parent, so the walk ends on
/// the cycle.
fn cycle_member<I, G, P>(group: &GroupArena<'_, I, G, P>, visited: &HashSet<Index>) -> Option<I>
where
    I: NodeId,
    G: GroupKey,
{
    let (mut current, _) = group
        .slots()
        .filter(|(idx, _)| !visited.contains(idx))
        .min_by(|(_, a), (_, b)| a.node.id.cmp(&b.node.id))?;

    let mut seen = HashSet::new();
    while seen.insert(current) {
        match group.get(current).and_then(|slot| slot.parent) {
            Some(parent) => current = parent,
            None => break,
        }
    }
    group.get(current).map(|slot| slot.node.id.clone())
}

/// Compose with default options: missing orders last, cross-group parents promoted, sequential.
pub fn compose<I, G, P>(nodes: &[Node<I, G, P>]) -> ComposeResult<ForestMap<I, G, P>, I, G>
where
    I: NodeId,
    G: GroupKey,
    P: Payload,
{
    TreeComposer::default().compose(nodes)
}
