//! Per-node search statistics and the PUCT selection rule.
//!
//! A node holds one [`ActionStats`] per legal action, indexed in the order
//! the game first reported them. Statistics are written by the tree store
//! under the engine's global lock; selection only reads.

/// Statistics for one edge (node, action).
#[derive(Debug, Clone)]
pub struct ActionStats {
    /// Prior probability from the oracle.
    pub prior: f32,

    /// Accumulated reward, from the perspective of the side to move at the
    /// parent node. Kept in 64-bit floating point so long searches do not
    /// lose low-order visit contributions.
    pub total_reward: f64,

    /// Number of descents that selected this edge.
    pub visits: u32,

    /// Number of workers currently descending through this edge. Subtracted
    /// from the mean value during selection (virtual loss) so concurrent
    /// workers spread out instead of piling onto one line.
    pub in_flight: u32,
}

impl ActionStats {
    fn new(prior: f32) -> Self {
        Self {
            prior,
            total_reward: 0.0,
            visits: 0,
            in_flight: 0,
        }
    }

    /// Mean action value with the virtual-loss penalty applied.
    ///
    /// `(W - in_flight) / max(N, 1)`: each in-flight descent is priced as a
    /// pending loss, which biases other workers away without blocking them.
    #[inline]
    pub fn q(&self) -> f64 {
        (self.total_reward - f64::from(self.in_flight)) / f64::from(self.visits.max(1))
    }
}

/// Dirichlet noise mixed into the root prior for one exploration call.
///
/// Sampled once per call and shared read-only by every worker; the stored
/// priors are never modified.
#[derive(Debug, Clone)]
pub struct RootNoise {
    /// Mixing fraction: the effective prior is `(1 - ε)·P + ε·η`.
    pub epsilon: f64,

    /// One Dirichlet sample per legal root action.
    pub eta: Vec<f64>,
}

/// Search statistics for one tree node.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    /// One entry per legal action, in first-visit order.
    pub stats: Vec<ActionStats>,

    /// The oracle's value estimate at node creation, from the perspective
    /// of the side to move. Used as the bootstrapped return when a worker
    /// expands this node as a fresh leaf.
    pub value_est: f32,
}

impl NodeInfo {
    /// Build a node from an oracle prior vector and value estimate.
    pub fn new(priors: Vec<f32>, value_est: f32) -> Self {
        Self {
            stats: priors.into_iter().map(ActionStats::new).collect(),
            value_est,
        }
    }

    /// Total visits across all edges of this node.
    pub fn total_visits(&self) -> u64 {
        self.stats.iter().map(|s| u64::from(s.visits)).sum()
    }

    /// Total in-flight workers across all edges of this node.
    pub fn total_in_flight(&self) -> u64 {
        self.stats.iter().map(|s| u64::from(s.in_flight)).sum()
    }

    /// Pick the next action by maximum PUCT score.
    ///
    /// `U(i) = Q(i) + c_puct · P̃(i) · √Ntot / (N(i) + 1)`, where `P̃` is the
    /// stored prior, optionally mixed with `noise` at the root. Ties go to
    /// the lowest action index.
    pub fn select_action(&self, c_puct: f64, noise: Option<&RootNoise>) -> usize {
        debug_assert!(!self.stats.is_empty(), "selection on a node without actions");

        let sqrt_total = (self.total_visits() as f64).sqrt();
        let mut best = 0;
        let mut best_score = f64::NEG_INFINITY;

        for (i, stats) in self.stats.iter().enumerate() {
            let prior = match noise {
                Some(noise) => {
                    (1.0 - noise.epsilon) * f64::from(stats.prior) + noise.epsilon * noise.eta[i]
                }
                None => f64::from(stats.prior),
            };
            let exploration = c_puct * prior * sqrt_total / f64::from(stats.visits + 1);
            let score = stats.q() + exploration;
            if score > best_score {
                best_score = score;
                best = i;
            }
        }

        best
    }

    /// Read-only copy of this node's statistics.
    pub fn snapshot(&self) -> NodeStats {
        NodeStats {
            priors: self.stats.iter().map(|s| s.prior).collect(),
            rewards: self.stats.iter().map(|s| s.total_reward).collect(),
            visits: self.stats.iter().map(|s| s.visits).collect(),
            in_flight: self.stats.iter().map(|s| s.in_flight).collect(),
            value_est: self.value_est,
        }
    }
}

/// Detached copy of a node's statistics, for inspection and tests.
#[derive(Debug, Clone)]
pub struct NodeStats {
    pub priors: Vec<f32>,
    pub rewards: Vec<f64>,
    pub visits: Vec<u32>,
    pub in_flight: Vec<u32>,
    pub value_est: f32,
}
