//! Tree store mapping canonical boards to node statistics.
//!
//! The store is the single owner of all statistic mutation: workers call
//! [`TreeStore::apply_visit`] on the way down and [`TreeStore::apply_backup`]
//! on the way back up, always under the engine's global lock. Keys are
//! inserted once and never mutated; only the per-edge statistics change in
//! place. There is no eviction: the tree grows until [`TreeStore::clear`].

use std::collections::HashMap;

use mcts_core::Game;

use crate::node::{ActionStats, NodeInfo};

/// Map from canonical board to per-node search statistics.
///
/// Hashing and equality are delegated entirely to the game's board type.
pub struct TreeStore<G: Game> {
    nodes: HashMap<G::Board, NodeInfo>,
}

impl<G: Game> std::fmt::Debug for TreeStore<G>
where
    G::Board: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeStore").field("nodes", &self.nodes).finish()
    }
}

impl<G: Game> TreeStore<G> {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
        }
    }

    /// Number of nodes in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn contains(&self, board: &G::Board) -> bool {
        self.nodes.contains_key(board)
    }

    #[inline]
    pub fn get(&self, board: &G::Board) -> Option<&NodeInfo> {
        self.nodes.get(board)
    }

    /// Insert a freshly evaluated node.
    ///
    /// A board is inserted at most once; a caller that raced another worker
    /// to the same position must re-check [`contains`](TreeStore::contains)
    /// and drop its own evaluation instead of calling this.
    pub fn insert(&mut self, board: G::Board, info: NodeInfo) {
        let previous = self.nodes.insert(board, info);
        debug_assert!(previous.is_none(), "node inserted twice");
    }

    /// Record that a worker is descending through `(board, action)`:
    /// increments both the visit count and the in-flight counter.
    pub fn apply_visit(&mut self, board: &G::Board, action: usize) {
        let stats = self.edge_mut(board, action);
        stats.visits += 1;
        stats.in_flight += 1;
    }

    /// Credit `reward` to `(board, action)` and release the in-flight
    /// marker taken by the matching [`apply_visit`](TreeStore::apply_visit).
    pub fn apply_backup(&mut self, board: &G::Board, action: usize, reward: f64) {
        let stats = self.edge_mut(board, action);
        stats.total_reward += reward;
        stats.in_flight = stats
            .in_flight
            .checked_sub(1)
            .expect("backup without a matching visit");
    }

    /// Drop every node and release the backing storage.
    pub fn clear(&mut self) {
        self.nodes = HashMap::new();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&G::Board, &NodeInfo)> {
        self.nodes.iter()
    }

    /// Analytical per-node memory estimate: canonical board key, node
    /// record, per-action statistics, and the map's bucket overhead. Meant
    /// for capacity planning, not enforcement.
    pub fn memory_footprint_per_node() -> usize {
        G::board_memsize()
            + std::mem::size_of::<NodeInfo>()
            + G::num_actions() * std::mem::size_of::<ActionStats>()
            + 2 * std::mem::size_of::<usize>()
    }

    fn edge_mut(&mut self, board: &G::Board, action: usize) -> &mut ActionStats {
        let info = self
            .nodes
            .get_mut(board)
            .expect("statistics update for a board that is not in the tree");
        &mut info.stats[action]
    }
}

impl<G: Game> Default for TreeStore<G> {
    fn default() -> Self {
        Self::new()
    }
}
