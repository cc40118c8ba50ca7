//! Shared fixtures for the engine's integration tests: two tiny synthetic
//! games with known-value positions and a pair of instrumented oracles.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use mcts::{Evaluation, Oracle, OracleError};
use mcts_core::Game;

/// One-ply game: white picks one of `rewards.len()` arms and the game ends
/// with the picked arm's white reward. Rewards are whole numbers so the
/// state can double as its own hashable canonical board.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OnePly {
    rewards: Vec<i8>,
    played: Option<usize>,
}

impl OnePly {
    pub fn new(rewards: &[i8]) -> Self {
        Self {
            rewards: rewards.to_vec(),
            played: None,
        }
    }

    /// A game that is already over at the root, with the given white reward.
    pub fn finished(reward: i8) -> Self {
        Self {
            rewards: vec![reward],
            played: Some(0),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid arm")]
pub struct BadArm;

impl Game for OnePly {
    type Board = OnePly;
    type Action = usize;
    type PlayError = BadArm;

    fn white_playing(&self) -> bool {
        true
    }

    fn white_reward(&self) -> Option<f64> {
        self.played.map(|arm| f64::from(self.rewards[arm]))
    }

    fn canonical_board(&self) -> OnePly {
        self.clone()
    }

    fn from_canonical(board: &OnePly) -> OnePly {
        board.clone()
    }

    fn available_actions(&self) -> Vec<usize> {
        if self.played.is_some() {
            return Vec::new();
        }
        (0..self.rewards.len()).collect()
    }

    fn play(&mut self, action: &usize) -> Result<(), BadArm> {
        if self.played.is_some() || *action >= self.rewards.len() {
            return Err(BadArm);
        }
        self.played = Some(*action);
        Ok(())
    }

    fn num_actions() -> usize {
        8
    }
}

/// Two-ply game with `arms` equally good actions at every node: two moves
/// are played (white then black), then the game ends drawn. Useful for
/// observing how concurrent workers spread over equivalent lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TwoPly {
    arms: u8,
    path: Vec<u8>,
}

impl TwoPly {
    pub fn new(arms: u8) -> Self {
        Self {
            arms,
            path: Vec::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid branch")]
pub struct BadBranch;

impl Game for TwoPly {
    type Board = TwoPly;
    type Action = u8;
    type PlayError = BadBranch;

    fn white_playing(&self) -> bool {
        self.path.len() % 2 == 0
    }

    fn white_reward(&self) -> Option<f64> {
        (self.path.len() >= 2).then_some(0.0)
    }

    fn canonical_board(&self) -> TwoPly {
        self.clone()
    }

    fn from_canonical(board: &TwoPly) -> TwoPly {
        board.clone()
    }

    fn available_actions(&self) -> Vec<u8> {
        if self.path.len() >= 2 {
            return Vec::new();
        }
        (0..self.arms).collect()
    }

    fn play(&mut self, action: &u8) -> Result<(), BadBranch> {
        if self.path.len() >= 2 || *action >= self.arms {
            return Err(BadBranch);
        }
        self.path.push(*action);
        Ok(())
    }

    fn num_actions() -> usize {
        8
    }
}

fn uniform_evaluation(len: usize) -> Evaluation {
    let prior = if len == 0 {
        Vec::new()
    } else {
        vec![1.0 / len as f32; len]
    };
    Evaluation { prior, value: 0.0 }
}

/// Uniform oracle that records every batch size it is asked to evaluate and
/// optionally dawdles inside the oracle call, so concurrent workers really
/// overlap with inference.
#[derive(Debug, Clone)]
pub struct RecordingOracle {
    pub batch_sizes: Arc<Mutex<Vec<usize>>>,
    pub delay: Duration,
}

impl RecordingOracle {
    pub fn new(delay: Duration) -> Self {
        Self {
            batch_sizes: Arc::new(Mutex::new(Vec::new())),
            delay,
        }
    }

    pub fn recorded(&self) -> Vec<usize> {
        self.batch_sizes.lock().unwrap().clone()
    }
}

impl<G: Game> Oracle<G> for RecordingOracle {
    fn evaluate(
        &mut self,
        _board: &G::Board,
        actions: &[G::Action],
    ) -> Result<Evaluation, OracleError> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        Ok(uniform_evaluation(actions.len()))
    }

    fn evaluate_batch(
        &mut self,
        batch: &[(G::Board, Vec<G::Action>)],
    ) -> Result<Vec<Evaluation>, OracleError> {
        self.batch_sizes.lock().unwrap().push(batch.len());
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        Ok(batch
            .iter()
            .map(|(_, actions)| uniform_evaluation(actions.len()))
            .collect())
    }
}

/// An oracle that always fails, for exercising error propagation.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingOracle;

impl<G: Game> Oracle<G> for FailingOracle {
    fn evaluate(
        &mut self,
        _board: &G::Board,
        _actions: &[G::Action],
    ) -> Result<Evaluation, OracleError> {
        Err(OracleError::EvaluationFailed("model unavailable".into()))
    }
}
