// crates/folio-core/src/rebind/rescan.rs
// Pending structural changes, reduced to a minimal set of subtree roots

use crate::host::PageHost;

/// Nodes added since the last flush
pub struct RescanQueue<N> {
    pending: Vec<N>,
}

impl<N: Clone> Default for RescanQueue<N> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
        }
    }
}

impl<N: Clone> RescanQueue<N> {
    /// Queue added nodes. True when the queue went from empty to non-empty,
    /// meaning the caller should schedule a flush.
    pub fn push(&mut self, nodes: impl IntoIterator<Item = N>) -> bool {
        let was_empty = self.pending.is_empty();
        self.pending.extend(nodes);
        was_empty && !self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Take the queue, dropping duplicates, detached nodes and nodes inside
    /// another queued root.
    pub fn drain_roots<H: PageHost<Node = N>>(&mut self, host: &H) -> Vec<N> {
        let mut seen = std::collections::HashSet::new();
        let candidates: Vec<N> = std::mem::take(&mut self.pending)
            .into_iter()
            .filter(|n| host.is_connected(n) && seen.insert(host.key(n)))
            .collect();

        candidates
            .iter()
            .enumerate()
            .filter(|(i, node)| {
                !candidates
                    .iter()
                    .enumerate()
                    .any(|(j, other)| *i != j && host.contains(other, node))
            })
            .map(|(_, node)| node.clone())
            .collect()
    }
}
