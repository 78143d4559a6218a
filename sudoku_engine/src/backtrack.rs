//! Depth-first search over propagated boards.

use crate::board::Board;
use crate::solver::{Deadline, Solver};
use crate::valueset::ValueSet;
use arrayvec::ArrayVec;
use std::time::Duration;

/// Candidate values of one cell; 64 is the widest supported alphabet.
type Candidates = ArrayVec<usize, 64>;

enum SearchFail {
    Exhausted,
    TimedOut,
}

/// Backtracking search with most-constrained-cell selection.
///
/// Each branch clones the board and assigns one candidate through
/// [`Board::set_cell`], so propagation prunes the subtree before the next
/// decision. The parent keeps its own copy untouched until it moves on to
/// the next candidate.
#[derive(Debug, Default)]
pub struct BacktrackSolver {
    solution: Option<Board>,
    solution_time: Duration,
    cycles: u64,
}

impl BacktrackSolver {
    /// A fresh solver with zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn search(&mut self, board: &Board, deadline: &Deadline) -> Result<Board, SearchFail> {
        if deadline.expired() {
            return Err(SearchFail::TimedOut);
        }
        if board.fixed_count() == board.num_cells() && board.infeasible_count() == 0 {
            return Ok(board.clone());
        }
        if board.infeasible_count() > 0 {
            return Err(SearchFail::Exhausted);
        }

        let Some(cell) = most_constrained_cell(board) else {
            return Err(SearchFail::Exhausted);
        };

        let candidates: Candidates = board.cell(cell).iter().collect();
        for value in candidates {
            self.cycles += 1;
            let mut child = board.clone();
            child.set_cell(cell, ValueSet::singleton(board.num_units(), value));
            match self.search(&child, deadline) {
                Ok(solved) => return Ok(solved),
                Err(SearchFail::TimedOut) => return Err(SearchFail::TimedOut),
                Err(SearchFail::Exhausted) => {}
            }
        }

        Err(SearchFail::Exhausted)
    }
}

/// The non-fixed cell with the fewest candidates (at least two on a
/// propagated board), lowest index winning ties.
fn most_constrained_cell(board: &Board) -> Option<usize> {
    let mut best = None;
    let mut best_count = board.num_units() + 1;
    for i in 0..board.num_cells() {
        let cell = board.cell(i);
        if cell.is_fixed() {
            continue;
        }
        let count = cell.count();
        if count >= 2 && count < best_count {
            best = Some(i);
            best_count = count;
            if count == 2 {
                break;
            }
        }
    }
    best
}

impl Solver for BacktrackSolver {
    fn solve(&mut self, board: &Board, timeout: Duration) -> bool {
        let deadline = Deadline::start(timeout);
        self.cycles = 0;
        self.solution = self.search(board, &deadline).ok();
        self.solution_time = deadline.elapsed();
        self.solution.is_some()
    }

    fn solution(&self) -> Option<&Board> {
        self.solution.as_ref()
    }

    fn solution_time(&self) -> Duration {
        self.solution_time
    }

    fn cycles(&self) -> u64 {
        self.cycles
    }
}
