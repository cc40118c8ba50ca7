//! Tic-tac-toe reference game for the search engine.
//!
//! A complete implementation of the `mcts-core` [`Game`] trait, used by the
//! engine's integration tests and benchmarks. X is white and always moves
//! first; the state itself serves as its canonical board, so the tree key
//! is simply a copy of the position.

use mcts_core::Game;
use thiserror::Error;

/// Complete game state: board, side to move, and outcome.
///
/// Board cells hold `0` (empty), `1` (X) or `2` (O). `outcome` is `0` while
/// the game is ongoing, the winning player's number once decided, or `3`
/// for a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TicTacToe {
    board: [u8; 9],
    current_player: u8,
    outcome: u8,
}

/// A move: place the current player's mark at a position (0-8, row-major).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    Place(u8),
}

impl Move {
    pub fn position(&self) -> u8 {
        match self {
            Move::Place(position) => *position,
        }
    }
}

/// Reasons a move can be rejected.
#[derive(Debug, Clone, Error)]
pub enum MoveError {
    #[error("position {0} is outside the board")]
    OutOfRange(u8),

    #[error("position {0} is already occupied")]
    Occupied(u8),

    #[error("the game is already over")]
    Finished,
}

impl TicTacToe {
    /// An empty board with X to move.
    pub fn new() -> Self {
        Self {
            board: [0; 9],
            current_player: 1,
            outcome: 0,
        }
    }

    /// Play a sequence of positions from the initial state. Handy for
    /// setting up test and benchmark positions.
    pub fn from_moves(positions: &[u8]) -> Result<Self, MoveError> {
        let mut state = Self::new();
        for &position in positions {
            state.play(&Move::Place(position))?;
        }
        Ok(state)
    }

    /// Whether the game has ended (win or draw).
    pub fn is_done(&self) -> bool {
        self.outcome != 0
    }

    /// Empty positions, in ascending order. Empty once the game is over.
    pub fn legal_positions(&self) -> Vec<u8> {
        if self.is_done() {
            return Vec::new();
        }
        (0..9u8)
            .filter(|&position| self.board[position as usize] == 0)
            .collect()
    }

    fn resolve_outcome(board: &[u8; 9]) -> u8 {
        const LINES: [[usize; 3]; 8] = [
            [0, 1, 2],
            [3, 4, 5],
            [6, 7, 8], // rows
            [0, 3, 6],
            [1, 4, 7],
            [2, 5, 8], // columns
            [0, 4, 8],
            [2, 4, 6], // diagonals
        ];

        for line in &LINES {
            let [a, b, c] = *line;
            if board[a] != 0 && board[a] == board[b] && board[b] == board[c] {
                return board[a];
            }
        }

        if board.iter().all(|&cell| cell != 0) {
            return 3; // draw
        }

        0
    }
}

impl Default for TicTacToe {
    fn default() -> Self {
        Self::new()
    }
}

impl Game for TicTacToe {
    type Board = TicTacToe;
    type Action = Move;
    type PlayError = MoveError;

    fn white_playing(&self) -> bool {
        self.current_player == 1
    }

    fn white_reward(&self) -> Option<f64> {
        match self.outcome {
            0 => None,
            1 => Some(1.0),
            2 => Some(-1.0),
            _ => Some(0.0),
        }
    }

    fn canonical_board(&self) -> TicTacToe {
        *self
    }

    fn from_canonical(board: &TicTacToe) -> TicTacToe {
        *board
    }

    fn available_actions(&self) -> Vec<Move> {
        self.legal_positions().into_iter().map(Move::Place).collect()
    }

    fn play(&mut self, action: &Move) -> Result<(), MoveError> {
        if self.is_done() {
            return Err(MoveError::Finished);
        }
        let position = action.position();
        if position >= 9 {
            return Err(MoveError::OutOfRange(position));
        }
        if self.board[position as usize] != 0 {
            return Err(MoveError::Occupied(position));
        }

        self.board[position as usize] = self.current_player;
        self.outcome = Self::resolve_outcome(&self.board);
        if self.outcome == 0 {
            self.current_player = if self.current_player == 1 { 2 } else { 1 };
        }
        Ok(())
    }

    fn num_actions() -> usize {
        9
    }
}
