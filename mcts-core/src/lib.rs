//! Core game abstraction for the PUCT search engine
//!
//! This crate defines the [`Game`] capability that game implementations
//! provide and the search engine consumes. It deliberately contains no
//! search code: games depend on `mcts-core` alone, the engine depends on
//! `mcts-core` plus its own machinery, and the two meet only through the
//! trait boundary.

pub mod game;

pub use game::Game;
