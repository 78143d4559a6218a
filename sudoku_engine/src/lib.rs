//! Core of a variable-order sudoku solver.
//!
//! A [`Board`] holds one candidate [`ValueSet`] per cell and eliminates
//! candidates from row, column and box peers on every assignment, cascading
//! through naked and hidden singles. Three engines share the [`Solver`]
//! surface on top of the propagated board: exhaustive [`BacktrackSolver`]
//! search, the stochastic [`AntSystemSolver`] colony, and the
//! [`AnnealingSolver`] which works on a completely filled grid instead of
//! candidate sets.
//!
//! Supported grids are 6×6, 9×9, 12×12, 16×16, 25×25, 36×36, 49×49 and
//! 64×64; the puzzle-string length picks the geometry.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use sudoku_engine::{BacktrackSolver, Board, Solver};
//!
//! let board = Board::from_puzzle_string(
//!     "53..7....6..195....98....6.8...6...34..8.3..17...2...6.6....28....419..5....8..79",
//! )?;
//!
//! let mut solver = BacktrackSolver::new();
//! assert!(solver.solve(&board, Duration::from_secs(10)));
//!
//! let solution = solver.solution().unwrap();
//! assert!(board.check_solution(solution));
//! # Ok::<(), sudoku_engine::SudokuError>(())
//! ```

#![warn(missing_docs)]

mod annealing;
mod antsystem;
mod backtrack;
mod board;
pub mod decode;
mod solver;
mod types;
mod valueset;

pub use annealing::AnnealingSolver;
pub use antsystem::AntSystemSolver;
pub use backtrack::BacktrackSolver;
pub use board::Board;
pub use solver::Solver;
pub use types::SudokuError;
pub use valueset::ValueSet;
