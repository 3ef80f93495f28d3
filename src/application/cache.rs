//! Optional memoization of composed forests
//!
//! Entries are keyed by group key plus a SHA-256 fingerprint of the whole input
//! snapshot, so a changed snapshot never serves a stale forest, nor one for input
//! that the composer would reject. The
//! composer itself stays stateless; this layer sits beside it.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

use crate::application::ApplicationResult;
use crate::domain::{Forest, GroupKey, Node, NodeId, Payload, TreeComposer};

/// Hex-encoded SHA-256 over a record snapshot, canonicalized by `(id, group)` order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fingerprint every record in `nodes`. Input order does not matter.
pub fn fingerprint<I, G, P>(nodes: &[Node<I, G, P>]) -> ApplicationResult<Fingerprint>
where
    I: NodeId + Serialize,
    G: GroupKey + Serialize,
    P: Serialize,
{
    let mut records: Vec<&Node<I, G, P>> = nodes.iter().collect();
    records.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| a.group_key.cmp(&b.group_key)));

    let mut hasher = Sha256::new();
    for record in records {
        hasher.update(serde_json::to_vec(record)?);
        hasher.update(b"\n");
    }
    Ok(Fingerprint(hex::encode(hasher.finalize())))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Capacity-bounded forest cache bound to one composer configuration.
///
/// Eviction drops the oldest inserted entry. Failed compositions are never stored.
/// A hit requires the identical snapshot, which already composed cleanly; a miss
/// runs the composer over the whole record set.
#[derive(Debug)]
pub struct ForestCache<I, G, P> {
    composer: TreeComposer,
    capacity: usize,
    entries: HashMap<(G, Fingerprint), Forest<I, G, P>>,
    insertion: VecDeque<(G, Fingerprint)>,
    hits: u64,
    misses: u64,
}

impl<I, G, P> ForestCache<I, G, P>
where
    I: NodeId + Serialize,
    G: GroupKey + Serialize,
    P: Payload + Serialize,
{
    pub fn new(composer: TreeComposer, capacity: usize) -> Self {
        Self {
            composer,
            capacity,
            entries: HashMap::new(),
            insertion: VecDeque::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Return the forest of `key`, composing `nodes` only when the fingerprint is new.
    #[instrument(level = "debug", skip(self, nodes), fields(nodes = nodes.len()))]
    pub fn get_or_compose(&mut self, nodes: &[Node<I, G, P>], key: &G) -> ApplicationResult<Forest<I, G, P>> {
        let entry_key = (key.clone(), fingerprint(nodes)?);
        if let Some(forest) = self.entries.get(&entry_key) {
            self.hits += 1;
            debug!(fingerprint = %entry_key.1, "cache hit");
            return Ok(forest.clone());
        }

        self.misses += 1;
        let mut composed = self.composer.compose_groups(nodes, std::slice::from_ref(key))?;
        let forest = composed.remove(key).unwrap_or_default();
        self.insert(entry_key, forest.clone());
        Ok(forest)
    }

    fn insert(&mut self, entry_key: (G, Fingerprint), forest: Forest<I, G, P>) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            let Some(oldest) = self.insertion.pop_front() else {
                break;
            };
            debug!(group = ?oldest.0, "evicting cached forest");
            self.entries.remove(&oldest);
        }
        self.insertion.push_back(entry_key.clone());
        self.entries.insert(entry_key, forest);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.insertion.clear();
    }
}
