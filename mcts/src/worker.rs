//! Search workers: descent, backup, and the evaluation seam.
//!
//! One worker performs one descent-plus-backup per simulation. The worker
//! holds the engine's global lock for the whole simulation except across
//! the oracle wait, which happens behind the [`EvalClient`] seam: the
//! synchronous client answers in-line, the channel-backed client releases
//! the lock, blocks on its mailbox, and reacquires the lock before the
//! worker looks at the tree again.

use std::sync::MutexGuard;
use std::time::{Duration, Instant};

use mcts_core::Game;
use tracing::trace;

use crate::config::MctsConfig;
use crate::node::{NodeInfo, RootNoise};
use crate::oracle::{Evaluation, Oracle, OracleError};
use crate::search::{SearchError, SearchLock, SearchState};

/// How a worker obtains oracle evaluations mid-descent.
///
/// `evaluate` receives the held lock guard and must return a (possibly
/// reacquired) guard: a client that suspends must release the guard for the
/// duration of the wait so other workers and the server can make progress,
/// and the caller must re-check the tree afterwards.
pub(crate) trait EvalClient<G: Game> {
    fn evaluate<'a>(
        &mut self,
        lock: &'a SearchLock<G>,
        guard: MutexGuard<'a, SearchState<G>>,
        board: &G::Board,
        actions: &[G::Action],
    ) -> Result<(MutexGuard<'a, SearchState<G>>, Evaluation), SearchError>;

    /// Signal that this worker will make no further requests.
    fn finish(&mut self);
}

/// Single-worker client: answers through the oracle's single-position entry
/// point without ever releasing the lock (there is nobody to yield to).
pub(crate) struct InlineClient<'o, O> {
    oracle: &'o mut O,
    pub inference_time: Duration,
}

impl<'o, O> InlineClient<'o, O> {
    pub fn new(oracle: &'o mut O) -> Self {
        Self {
            oracle,
            inference_time: Duration::ZERO,
        }
    }
}

impl<'o, G: Game, O: Oracle<G>> EvalClient<G> for InlineClient<'o, O> {
    fn evaluate<'a>(
        &mut self,
        _lock: &'a SearchLock<G>,
        guard: MutexGuard<'a, SearchState<G>>,
        board: &G::Board,
        actions: &[G::Action],
    ) -> Result<(MutexGuard<'a, SearchState<G>>, Evaluation), SearchError> {
        let started = Instant::now();
        let evaluation = self.oracle.evaluate(board, actions)?;
        self.inference_time += started.elapsed();
        Ok((guard, evaluation))
    }

    fn finish(&mut self) {}
}

/// One step of a descent, recorded for backup.
struct PathEntry<G: Game> {
    board: G::Board,
    white_to_move: bool,
    action: usize,
}

/// A search worker. Owns its path stack; everything shared lives behind the
/// engine's lock.
pub(crate) struct Worker<G: Game> {
    id: usize,
    stack: Vec<PathEntry<G>>,
}

impl<G: Game> Worker<G> {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            stack: Vec::new(),
        }
    }

    /// Run simulations until the shared remaining-simulations counter hits
    /// zero, then post the termination signal and return.
    pub fn run<C: EvalClient<G>>(
        &mut self,
        lock: &SearchLock<G>,
        root: &G,
        config: &MctsConfig,
        noise: Option<&RootNoise>,
        client: &mut C,
    ) -> Result<(), SearchError> {
        loop {
            let mut guard = lock.lock().expect("search lock poisoned");
            if guard.remaining == 0 {
                // Post the terminator before releasing the lock so the
                // server's view of this worker stays consistent.
                client.finish();
                return Ok(());
            }
            guard.remaining -= 1;
            guard.totals.iterations += 1;

            match self.descend(lock, guard, root.clone(), config, noise, client) {
                Ok((mut guard, white_reward)) => {
                    self.backup(&mut guard, white_reward);
                    debug_assert!(self.stack.is_empty(), "path stack not drained by backup");
                }
                Err(error) => {
                    // Unblock the server, then surface the failure. The tree
                    // keeps whatever this descent already recorded.
                    self.stack.clear();
                    client.finish();
                    return Err(error);
                }
            }
        }
    }

    /// Descend from a copy of the root until reaching a terminal state or
    /// expanding a fresh leaf. Returns the simulation's return from white's
    /// perspective, together with the (re)held guard for backup.
    fn descend<'a, C: EvalClient<G>>(
        &mut self,
        lock: &'a SearchLock<G>,
        mut guard: MutexGuard<'a, SearchState<G>>,
        mut state: G,
        config: &MctsConfig,
        noise: Option<&RootNoise>,
        client: &mut C,
    ) -> Result<(MutexGuard<'a, SearchState<G>>, f64), SearchError> {
        let mut is_root = true;
        loop {
            if let Some(reward) = state.white_reward() {
                return Ok((guard, reward));
            }

            let white = state.white_playing();
            let board = state.canonical_board();
            let actions = state.available_actions();

            if !guard.tree.contains(&board) {
                let (reacquired, evaluation) = client.evaluate(lock, guard, &board, &actions)?;
                guard = reacquired;
                // Another worker may have expanded this position while the
                // lock was released; if so, keep its record and drop ours.
                if !guard.tree.contains(&board) {
                    if evaluation.prior.len() != actions.len() {
                        return Err(SearchError::Oracle(OracleError::PriorLengthMismatch {
                            expected: actions.len(),
                            actual: evaluation.prior.len(),
                        }));
                    }
                    let value = f64::from(evaluation.value);
                    guard
                        .tree
                        .insert(board, NodeInfo::new(evaluation.prior, evaluation.value));
                    trace!(worker = self.id, "expanded new leaf");
                    // The oracle's value is relative to the side to move;
                    // the simulation return is white-relative.
                    return Ok((guard, if white { value } else { -value }));
                }
            }

            guard.totals.nodes_traversed += 1;
            let node = guard
                .tree
                .get(&board)
                .expect("node disappeared while the lock was held");
            let action = node.select_action(config.c_puct, if is_root { noise } else { None });

            guard.tree.apply_visit(&board, action);
            self.stack.push(PathEntry {
                board,
                white_to_move: white,
                action,
            });
            state
                .play(&actions[action])
                .map_err(|e| SearchError::Game(e.to_string()))?;
            is_root = false;
        }
    }

    /// Pop the path stack, crediting each edge with the return as seen by
    /// the side that was to move there, and releasing its in-flight marker.
    fn backup(&mut self, state: &mut SearchState<G>, white_reward: f64) {
        while let Some(entry) = self.stack.pop() {
            let reward = if entry.white_to_move {
                white_reward
            } else {
                -white_reward
            };
            state.tree.apply_backup(&entry.board, entry.action, reward);
        }
    }
}
