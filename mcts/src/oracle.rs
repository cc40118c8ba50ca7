//! Oracle trait for position evaluation.
//!
//! The oracle maps a position to a prior over its legal actions and a
//! scalar value estimate. In an AlphaZero-style agent this is a neural
//! network; the engine only requires the signature. Two reference oracles
//! are provided for tests and baselines: [`RandomOracle`] (uniform prior,
//! neutral value) and [`RolloutOracle`] (uniform prior, value from a random
//! playout).

use mcts_core::Game;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use thiserror::Error;

/// Errors surfaced by an oracle.
///
/// Cloneable so the inference server can hand the same failure to every
/// worker blocked on a response.
#[derive(Debug, Clone, Error)]
pub enum OracleError {
    #[error("evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("prior has {actual} entries for {expected} legal actions")]
    PriorLengthMismatch { expected: usize, actual: usize },
}

/// Result of evaluating one position.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Probability distribution over the legal actions, in the order they
    /// were passed to the oracle. Must have one entry per action and sum to
    /// approximately one.
    pub prior: Vec<f32>,

    /// Value estimate from the perspective of the side to move at the
    /// evaluated position. Conventionally in `[-1, 1]`, but the engine only
    /// requires a scalar.
    pub value: f32,
}

/// A position evaluator.
pub trait Oracle<G: Game>: Send {
    /// Evaluate a single position.
    fn evaluate(
        &mut self,
        board: &G::Board,
        actions: &[G::Action],
    ) -> Result<Evaluation, OracleError>;

    /// Evaluate a batch of positions. The default implementation falls back
    /// to sequential single-position evaluation; batching oracles override
    /// this. Result `i` must correspond to request `i`.
    fn evaluate_batch(
        &mut self,
        batch: &[(G::Board, Vec<G::Action>)],
    ) -> Result<Vec<Evaluation>, OracleError> {
        batch
            .iter()
            .map(|(board, actions)| self.evaluate(board, actions))
            .collect()
    }
}

fn uniform_prior(len: usize) -> Vec<f32> {
    if len == 0 {
        return Vec::new();
    }
    vec![1.0 / len as f32; len]
}

/// Uniform prior, neutral value. The cheapest possible oracle; useful for
/// exercising the search machinery without a model.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomOracle;

impl RandomOracle {
    pub fn new() -> Self {
        Self
    }
}

impl<G: Game> Oracle<G> for RandomOracle {
    fn evaluate(
        &mut self,
        _board: &G::Board,
        actions: &[G::Action],
    ) -> Result<Evaluation, OracleError> {
        Ok(Evaluation {
            prior: uniform_prior(actions.len()),
            value: 0.0,
        })
    }
}

/// Uniform prior; value obtained by playing uniformly random actions until
/// the game ends, reported from the perspective of the side to move at the
/// evaluated position.
#[derive(Debug, Clone)]
pub struct RolloutOracle {
    /// Cap on playout length, so misbehaving games cannot loop forever.
    /// A capped playout scores 0.
    max_depth: u32,
    rng: ChaCha20Rng,
}

impl RolloutOracle {
    pub fn new(seed: u64) -> Self {
        Self {
            max_depth: 1_000,
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for RolloutOracle {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<G: Game> Oracle<G> for RolloutOracle {
    fn evaluate(
        &mut self,
        board: &G::Board,
        actions: &[G::Action],
    ) -> Result<Evaluation, OracleError> {
        let mut state = G::from_canonical(board);
        let white_at_leaf = state.white_playing();

        let mut white_value = 0.0;
        for _ in 0..self.max_depth {
            if let Some(reward) = state.white_reward() {
                white_value = reward;
                break;
            }
            let moves = state.available_actions();
            if moves.is_empty() {
                break;
            }
            let choice = self.rng.gen_range(0..moves.len());
            state
                .play(&moves[choice])
                .map_err(|e| OracleError::EvaluationFailed(e.to_string()))?;
        }

        let value = if white_at_leaf {
            white_value
        } else {
            -white_value
        };
        Ok(Evaluation {
            prior: uniform_prior(actions.len()),
            value: value as f32,
        })
    }
}
