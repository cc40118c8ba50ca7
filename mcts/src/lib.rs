//! Asynchronous PUCT Monte Carlo Tree Search for AlphaZero-style agents.
//!
//! The engine grows a search tree rooted at a caller-supplied game state,
//! guiding expansion with action priors and value estimates from an
//! external [`Oracle`] (typically a neural network). After a requested
//! number of simulations it exposes a stochastic policy over root actions
//! derived from visit counts.
//!
//! # Overview
//!
//! Each simulation descends from the root by the PUCT rule, expands one
//! fresh leaf (or hits a terminal state), and backs the resulting value up
//! the visited path. With a single worker everything runs in-line. With
//! several workers, descents run concurrently against the shared tree:
//! a per-edge virtual-loss count steers workers away from each other, and
//! a dedicated inference server batches one request per worker into a
//! single oracle call.
//!
//! ```text
//!  worker 0 ──┐ requests                     ┌── oracle.evaluate_batch
//!  worker 1 ──┼────────► inference server ───┤
//!  worker n ──┘ ◄────────   (batching)       └── results routed back
//!      │
//!      ▼
//!  shared tree (single lock, never held across inference)
//! ```
//!
//! # Usage
//!
//! ```
//! use mcts::{Mcts, MctsConfig, RandomOracle};
//! use games_tictactoe::TicTacToe;
//!
//! let config = MctsConfig::default().with_workers(2);
//! let mut engine = Mcts::new(RandomOracle::new(), config);
//!
//! let state = TicTacToe::new();
//! engine.explore(&state, 400).unwrap();
//!
//! let (actions, pi) = engine.policy(&state, 1.0).unwrap();
//! assert_eq!(actions.len(), pi.len());
//! assert!((pi.iter().sum::<f64>() - 1.0).abs() < 1e-6);
//! ```
//!
//! # Components
//!
//! - [`TreeStore`]: canonical-board keyed statistics, the single point of
//!   shared mutation.
//! - [`NodeInfo`]/[`ActionStats`]: per-node and per-edge statistics plus
//!   the PUCT selection rule.
//! - [`Oracle`]: the evaluation capability, with [`RandomOracle`] and
//!   [`RolloutOracle`] as built-in references.
//! - [`Mcts`]: the engine; [`MctsConfig`] its knobs.

pub mod config;
pub mod node;
pub mod oracle;
pub mod search;
pub mod tree;

mod server;
mod worker;

pub use config::MctsConfig;
pub use node::{ActionStats, NodeInfo, NodeStats, RootNoise};
pub use oracle::{Evaluation, Oracle, OracleError, RandomOracle, RolloutOracle};
pub use search::{Mcts, SearchError};
pub use tree::TreeStore;

// The game capability, re-exported so downstream crates need only one
// dependency for the common case.
pub use mcts_core::Game;
