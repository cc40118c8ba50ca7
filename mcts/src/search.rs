//! The search engine: exploration driver, policy extraction, diagnostics.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use mcts_core::Game;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rand_distr::{Distribution, Gamma};
use thiserror::Error;
use tracing::debug;

use crate::config::MctsConfig;
use crate::node::{NodeStats, RootNoise};
use crate::oracle::{Oracle, OracleError};
use crate::server::{channel_pair, serve};
use crate::tree::TreeStore;
use crate::worker::{InlineClient, Worker};

/// Errors that can occur during search.
#[derive(Debug, Error)]
pub enum SearchError {
    /// `policy` was called for a state whose root is not in the tree.
    #[error("state has not been explored yet; run explore first")]
    ExploreFirst,

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error("game error: {0}")]
    Game(String),

    #[error("inference server shut down before responding")]
    ServerDisconnected,
}

/// Cumulative traversal counters, updated under the global lock.
#[derive(Debug, Default)]
pub(crate) struct SearchTotals {
    /// Completed or started descents.
    pub iterations: u64,
    /// Non-terminal, non-leaf steps across all descents.
    pub nodes_traversed: u64,
}

/// Everything the global lock protects: the tree, the per-call
/// remaining-simulations counter, and the traversal totals.
pub(crate) struct SearchState<G: Game> {
    pub tree: TreeStore<G>,
    pub remaining: u32,
    pub totals: SearchTotals,
}

impl<G: Game> std::fmt::Debug for SearchState<G>
where
    G::Board: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchState")
            .field("tree", &self.tree)
            .field("remaining", &self.remaining)
            .field("totals", &self.totals)
            .finish()
    }
}

pub(crate) type SearchLock<G> = Mutex<SearchState<G>>;

/// An asynchronous PUCT Monte Carlo Tree Search engine.
///
/// Generic over the game state type and the oracle supplying priors and
/// value estimates. The tree persists across [`explore`](Mcts::explore)
/// calls until [`reset`](Mcts::reset).
///
/// With `num_workers == 1` simulations run back to back on the calling
/// thread. With more workers, [`explore`](Mcts::explore) spawns one scoped
/// thread per worker plus a batching inference server; all tree access goes
/// through a single lock that is never held across oracle calls.
pub struct Mcts<G: Game, O: Oracle<G>> {
    config: MctsConfig,
    oracle: O,
    search: SearchLock<G>,
    rng: ChaCha20Rng,
    total_time: Duration,
    inference_time: Duration,
}

impl<G: Game, O: Oracle<G>> Mcts<G, O> {
    pub fn new(oracle: O, config: MctsConfig) -> Self {
        let rng = ChaCha20Rng::seed_from_u64(config.seed);
        Self {
            config,
            oracle,
            search: Mutex::new(SearchState {
                tree: TreeStore::new(),
                remaining: 0,
                totals: SearchTotals::default(),
            }),
            rng,
            total_time: Duration::ZERO,
            inference_time: Duration::ZERO,
        }
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn into_oracle(self) -> O {
        self.oracle
    }

    /// Run `nsims` simulations from `state`, growing the shared tree.
    ///
    /// The caller's state is never modified; each descent works on a clone.
    /// Root Dirichlet noise, if configured, is sampled once per call and
    /// shared by all of the call's simulations.
    pub fn explore(&mut self, state: &G, nsims: u32) -> Result<(), SearchError> {
        let started = Instant::now();
        debug!(
            simulations = nsims,
            workers = self.config.num_workers,
            "exploring"
        );

        let noise = self.sample_root_noise(state);
        self.search
            .get_mut()
            .expect("search lock poisoned")
            .remaining = nsims;

        let result = if self.config.num_workers <= 1 {
            self.explore_synchronous(state, noise.as_ref())
        } else {
            self.explore_parallel(state, noise.as_ref())
        };

        self.total_time += started.elapsed();
        result
    }

    fn sample_root_noise(&mut self, state: &G) -> Option<RootNoise> {
        if self.config.noise_epsilon <= 0.0 {
            return None;
        }
        let arms = state.available_actions().len();
        Some(RootNoise {
            epsilon: self.config.noise_epsilon,
            eta: dirichlet(self.config.noise_alpha, arms, &mut self.rng),
        })
    }

    fn explore_synchronous(
        &mut self,
        state: &G,
        noise: Option<&RootNoise>,
    ) -> Result<(), SearchError> {
        let mut client = InlineClient::new(&mut self.oracle);
        let mut worker = Worker::new(0);
        let result = worker.run(&self.search, state, &self.config, noise, &mut client);
        self.inference_time += client.inference_time;
        result
    }

    fn explore_parallel(
        &mut self,
        state: &G,
        noise: Option<&RootNoise>,
    ) -> Result<(), SearchError> {
        let num_workers = self.config.num_workers;
        let mut clients = Vec::with_capacity(num_workers);
        let mut server_channels = Vec::with_capacity(num_workers);
        for _ in 0..num_workers {
            let (client, server_channel) = channel_pair::<G>();
            clients.push(client);
            server_channels.push(server_channel);
        }

        let search = &self.search;
        let config = &self.config;
        let oracle = &mut self.oracle;
        let fill_batches = config.fill_batches;

        let (worker_results, server_result) = std::thread::scope(|scope| {
            let server = scope.spawn(move || serve(oracle, server_channels, fill_batches));

            let handles: Vec<_> = clients
                .into_iter()
                .enumerate()
                .map(|(id, mut client)| {
                    scope.spawn(move || {
                        let mut worker = Worker::new(id);
                        worker.run(search, state, config, noise, &mut client)
                    })
                })
                .collect();

            let worker_results: Vec<Result<(), SearchError>> = handles
                .into_iter()
                .map(|handle| handle.join().expect("search worker panicked"))
                .collect();
            let server_result = server.join().expect("inference server panicked");
            (worker_results, server_result)
        });

        if let Ok(elapsed) = &server_result {
            self.inference_time += *elapsed;
        }
        // An oracle failure is the root cause of any secondary worker
        // disconnections, so report it first.
        server_result.map_err(SearchError::from)?;
        for result in worker_results {
            result?;
        }
        Ok(())
    }

    /// Visit-count policy over the root's legal actions.
    ///
    /// `temperature == 0` puts all mass on the most-visited action (lowest
    /// index on ties); otherwise probabilities are proportional to
    /// `N^(1/temperature)`. The root must already be in the tree.
    pub fn policy(
        &self,
        state: &G,
        temperature: f64,
    ) -> Result<(Vec<G::Action>, Vec<f64>), SearchError> {
        let actions = state.available_actions();
        let board = state.canonical_board();

        let visits: Vec<u32> = {
            let guard = self.search.lock().expect("search lock poisoned");
            let node = guard.tree.get(&board).ok_or(SearchError::ExploreFirst)?;
            debug_assert_eq!(
                node.stats.len(),
                actions.len(),
                "action count changed for a canonical board"
            );
            node.stats.iter().map(|s| s.visits).collect()
        };

        Ok((actions, visit_distribution(&visits, temperature)))
    }

    /// Drop the whole tree. Counters and timings are cumulative per engine
    /// and survive the reset.
    pub fn reset(&mut self) {
        self.search
            .get_mut()
            .expect("search lock poisoned")
            .tree
            .clear();
        debug!("search tree cleared");
    }

    /// Number of nodes currently in the tree.
    pub fn node_count(&self) -> usize {
        self.search.lock().expect("search lock poisoned").tree.len()
    }

    /// Statistics snapshot for the node reached by `state`, if explored.
    pub fn node_stats(&self, state: &G) -> Option<NodeStats> {
        let board = state.canonical_board();
        let guard = self.search.lock().expect("search lock poisoned");
        guard.tree.get(&board).map(|info| info.snapshot())
    }

    /// Sum of in-flight markers over the whole tree. Zero whenever no
    /// exploration is running.
    pub fn total_in_flight(&self) -> u64 {
        let guard = self.search.lock().expect("search lock poisoned");
        guard.tree.iter().map(|(_, info)| info.total_in_flight()).sum()
    }

    /// Analytical estimate of the memory used per tree node.
    pub fn memory_footprint_per_node(&self) -> usize {
        TreeStore::<G>::memory_footprint_per_node()
    }

    /// Fraction of exploration wall time spent inside the oracle.
    pub fn inference_time_ratio(&self) -> f64 {
        if self.total_time.is_zero() {
            return 0.0;
        }
        self.inference_time.as_secs_f64() / self.total_time.as_secs_f64()
    }

    /// Mean number of tree nodes traversed per simulation.
    pub fn average_exploration_depth(&self) -> f64 {
        let guard = self.search.lock().expect("search lock poisoned");
        if guard.totals.iterations == 0 {
            return 0.0;
        }
        guard.totals.nodes_traversed as f64 / guard.totals.iterations as f64
    }
}

/// Normalize temperature-scaled visit counts into a distribution.
fn visit_distribution(visits: &[u32], temperature: f64) -> Vec<f64> {
    let mut pi = vec![0.0; visits.len()];
    if visits.is_empty() {
        return pi;
    }

    if temperature == 0.0 {
        let mut best = 0;
        for (i, &n) in visits.iter().enumerate() {
            if n > visits[best] {
                best = i;
            }
        }
        pi[best] = 1.0;
        return pi;
    }

    let mut total = 0.0;
    for (i, &n) in visits.iter().enumerate() {
        if n > 0 {
            let weight = f64::from(n).powf(1.0 / temperature);
            pi[i] = weight;
            total += weight;
        }
    }
    if total > 0.0 {
        for p in &mut pi {
            *p /= total;
        }
    } else {
        // Nothing visited yet; degenerate, but a distribution nonetheless.
        pi.fill(1.0 / visits.len() as f64);
    }
    pi
}

/// Sample a Dirichlet(alpha, count) vector via Gamma variates.
fn dirichlet(alpha: f64, count: usize, rng: &mut ChaCha20Rng) -> Vec<f64> {
    if count == 0 {
        return Vec::new();
    }
    let gamma = Gamma::new(alpha, 1.0).expect("noise_alpha must be positive and finite");
    let mut samples: Vec<f64> = (0..count).map(|_| gamma.sample(rng)).collect();
    let total: f64 = samples.iter().sum();
    if total > 0.0 {
        for sample in &mut samples {
            *sample /= total;
        }
    } else {
        samples.fill(1.0 / count as f64);
    }
    samples
}
