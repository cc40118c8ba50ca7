//! Typed game trait for two-player zero-sum games.
//!
//! The search engine is generic over this trait. A value implementing
//! [`Game`] *is* a game state: cloning it copies the position, and `play`
//! advances it in place. "White" is the fixed reference player; rewards
//! reported by [`Game::white_reward`] are always from white's point of view
//! and the engine performs the perspective flips itself.

use std::hash::Hash;

/// A two-player zero-sum game state usable as a search root.
///
/// # Contract
///
/// * [`canonical_board`](Game::canonical_board) must be stable: two states
///   that represent the same position (up to symmetries the game considers
///   irrelevant) must produce equal, equally-hashing boards.
/// * [`available_actions`](Game::available_actions) must return the same
///   actions in the same order for any two states with equal canonical
///   boards. The engine records per-action statistics by index in this
///   order.
/// * [`white_reward`](Game::white_reward) returns `None` exactly while the
///   game is ongoing.
///
/// # Example
///
/// ```
/// use mcts_core::Game;
///
/// /// One pile of stones; players alternate taking one or two, and
/// /// whoever takes the last stone wins.
/// #[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// struct Pile {
///     stones: u8,
///     white_to_move: bool,
/// }
///
/// #[derive(Debug)]
/// struct BadMove;
///
/// impl std::fmt::Display for BadMove {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         write!(f, "cannot take that many stones")
///     }
/// }
///
/// impl std::error::Error for BadMove {}
///
/// impl Game for Pile {
///     type Board = Pile;
///     type Action = u8;
///     type PlayError = BadMove;
///
///     fn white_playing(&self) -> bool {
///         self.white_to_move
///     }
///
///     fn white_reward(&self) -> Option<f64> {
///         if self.stones > 0 {
///             return None;
///         }
///         // The side to move faces an empty pile: the other side took
///         // the last stone and won.
///         Some(if self.white_to_move { -1.0 } else { 1.0 })
///     }
///
///     fn canonical_board(&self) -> Pile {
///         self.clone()
///     }
///
///     fn from_canonical(board: &Pile) -> Pile {
///         board.clone()
///     }
///
///     fn available_actions(&self) -> Vec<u8> {
///         (1..=self.stones.min(2)).collect()
///     }
///
///     fn play(&mut self, action: &u8) -> Result<(), BadMove> {
///         if *action == 0 || *action > self.stones.min(2) {
///             return Err(BadMove);
///         }
///         self.stones -= action;
///         self.white_to_move = !self.white_to_move;
///         Ok(())
///     }
///
///     fn num_actions() -> usize {
///         2
///     }
/// }
///
/// let mut state = Pile { stones: 3, white_to_move: true };
/// state.play(&2).unwrap();
/// assert!(state.white_reward().is_none());
/// state.play(&1).unwrap();
/// assert_eq!(state.white_reward(), Some(-1.0));
/// ```
pub trait Game: Clone + Send + Sync {
    /// Canonical board representation, used as the tree key. Hashing and
    /// equality of tree nodes are delegated entirely to this type.
    type Board: Clone + Eq + Hash + Send;

    /// A legal move.
    type Action: Clone + Send;

    /// Error produced by an illegal or inapplicable [`play`](Game::play).
    type PlayError: std::error::Error;

    /// Whether white is the side to move.
    fn white_playing(&self) -> bool;

    /// Terminal reward from white's perspective, or `None` while the game
    /// is ongoing.
    fn white_reward(&self) -> Option<f64>;

    /// The canonical board for this state.
    fn canonical_board(&self) -> Self::Board;

    /// Reconstruct a state from its canonical board.
    ///
    /// Used by evaluators that simulate play from an arbitrary tree node,
    /// such as the engine's rollout oracle. Games whose canonical board
    /// drops information needed to resume play should not be paired with
    /// such evaluators.
    fn from_canonical(board: &Self::Board) -> Self;

    /// Legal actions, in an order that is stable for a given canonical
    /// board.
    fn available_actions(&self) -> Vec<Self::Action>;

    /// Apply `action` in place.
    fn play(&mut self, action: &Self::Action) -> Result<(), Self::PlayError>;

    /// Upper bound on the number of legal actions in any position.
    fn num_actions() -> usize;

    /// Estimated size in bytes of one canonical board, for memory
    /// diagnostics.
    fn board_memsize() -> usize {
        std::mem::size_of::<Self::Board>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    struct Pile {
        stones: u8,
        white_to_move: bool,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("cannot take {0} stones")]
    struct BadMove(u8);

    impl Game for Pile {
        type Board = Pile;
        type Action = u8;
        type PlayError = BadMove;

        fn white_playing(&self) -> bool {
            self.white_to_move
        }

        fn white_reward(&self) -> Option<f64> {
            if self.stones > 0 {
                return None;
            }
            Some(if self.white_to_move { -1.0 } else { 1.0 })
        }

        fn canonical_board(&self) -> Pile {
            self.clone()
        }

        fn from_canonical(board: &Pile) -> Pile {
            board.clone()
        }

        fn available_actions(&self) -> Vec<u8> {
            (1..=self.stones.min(2)).collect()
        }

        fn play(&mut self, action: &u8) -> Result<(), BadMove> {
            if *action == 0 || *action > self.stones.min(2) {
                return Err(BadMove(*action));
            }
            self.stones -= action;
            self.white_to_move = !self.white_to_move;
            Ok(())
        }

        fn num_actions() -> usize {
            2
        }
    }

    #[test]
    fn reward_is_none_while_ongoing() {
        let state = Pile {
            stones: 3,
            white_to_move: true,
        };
        assert!(state.white_reward().is_none());
    }

    #[test]
    fn winner_takes_last_stone() {
        let mut state = Pile {
            stones: 3,
            white_to_move: true,
        };
        state.play(&2).unwrap();
        state.play(&1).unwrap();
        // Black took the last stone.
        assert_eq!(state.white_reward(), Some(-1.0));
    }

    #[test]
    fn illegal_play_is_rejected() {
        let mut state = Pile {
            stones: 1,
            white_to_move: true,
        };
        assert!(state.play(&2).is_err());
        // State unchanged after a rejected move.
        assert_eq!(state.stones, 1);
        assert!(state.white_playing());
    }

    #[test]
    fn canonical_board_round_trips() {
        let state = Pile {
            stones: 2,
            white_to_move: false,
        };
        let board = state.canonical_board();
        assert_eq!(Pile::from_canonical(&board), state);
    }

    #[test]
    fn action_order_is_stable() {
        let a = Pile {
            stones: 5,
            white_to_move: true,
        };
        let b = Pile {
            stones: 5,
            white_to_move: true,
        };
        assert_eq!(a.available_actions(), b.available_actions());
    }

    #[test]
    fn default_board_memsize_uses_board_type() {
        assert_eq!(Pile::board_memsize(), std::mem::size_of::<Pile>());
    }
}
