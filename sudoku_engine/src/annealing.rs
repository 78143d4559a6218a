//! Simulated annealing over completely filled grids.

use crate::board::Board;
use crate::solver::{Deadline, Solver};
use crate::valueset::ValueSet;
use itertools::Itertools;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Metropolis-Hastings search over box-valid grids.
///
/// The input board is first completed box by box: the symbols missing from a
/// box are shuffled onto its open cells, so every box holds each symbol
/// exactly once while rows and columns may still conflict. The annealing
/// loop then swaps pairs of non-clue cells inside one box, driving the
/// row/column conflict count towards zero under a geometric cooling
/// schedule. Box validity is preserved by every move, which is what makes
/// the incremental cost update of [`try_random_swap`] exact.
#[derive(Debug)]
pub struct AnnealingSolver {
    temp0: f64,
    cooling: f64,
    stop: f64,
    rng: SmallRng,
    solution: Option<Board>,
    solution_time: Duration,
    cycles: u64,
}

impl AnnealingSolver {
    /// A solver with the default schedule (`temp₀ = 1.0`, cooling `0.999`,
    /// stop at `1e-10`) and an entropy-seeded generator.
    #[must_use]
    pub fn new() -> Self {
        Self::from_rng(SmallRng::from_entropy())
    }

    /// A solver with the default schedule and a fixed seed, for reproducible
    /// runs.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(SmallRng::seed_from_u64(seed))
    }

    fn from_rng(rng: SmallRng) -> Self {
        AnnealingSolver {
            temp0: 1.0,
            cooling: 0.999,
            stop: 1e-10,
            rng,
            solution: None,
            solution_time: Duration::ZERO,
            cycles: 0,
        }
    }

    /// Override the cooling schedule.
    pub fn set_schedule(&mut self, temp0: f64, cooling: f64, stop: f64) {
        self.temp0 = temp0;
        self.cooling = cooling;
        self.stop = stop;
    }

    /// Complete every box with its missing symbols in shuffled order.
    fn fill_boxes(&mut self, board: &mut Board) {
        let n = board.num_units();
        for b in 0..n {
            let mut present = ValueSet::empty(n);
            for k in 0..n {
                let cell = board.cell(board.box_cell(b, k));
                if cell.is_fixed() {
                    present += cell;
                }
            }
            let mut missing: Vec<usize> = (!present).iter().collect();
            missing.shuffle(&mut self.rng);

            let open: Vec<usize> = (0..n)
                .map(|k| board.box_cell(b, k))
                .filter(|&i| !board.cell(i).is_fixed())
                .collect();
            for (&i, value) in open.iter().zip(missing) {
                board.force_set_cell(i, ValueSet::singleton(n, value));
            }
        }
    }

    /// Swap one conflicted non-clue cell with a box mate and report the new
    /// cost incrementally as `current_cost + (after − before)`, where before
    /// and after sum the two cells' row/column conflicts around the swap.
    /// Returns `current_cost` unchanged when no legal move exists.
    fn try_random_swap(&mut self, board: &mut Board, current_cost: usize) -> usize {
        let (dup_rows, dup_cols) = units_with_duplicates(board);
        let movable: Vec<usize> = (0..board.num_cells())
            .filter(|&i| !board.is_clue(i))
            .filter(|&i| dup_rows[board.row_for_cell(i)] || dup_cols[board.col_for_cell(i)])
            .collect();
        let Some(&first) = movable.choose(&mut self.rng) else {
            return current_cost;
        };

        let bx = board.box_for_cell(first);
        let partners: Vec<usize> = (0..board.num_units())
            .map(|k| board.box_cell(bx, k))
            .filter(|&i| i != first && !board.is_clue(i))
            .collect();
        let Some(&second) = partners.choose(&mut self.rng) else {
            return current_cost;
        };

        let before = local_conflicts(board, first) + local_conflicts(board, second);
        let first_value = board.cell(first);
        let second_value = board.cell(second);
        board.force_set_cell(first, second_value);
        board.force_set_cell(second, first_value);
        let after = local_conflicts(board, first) + local_conflicts(board, second);

        (current_cost + after).saturating_sub(before)
    }

    /// Break up the duplicates left by a run that failed to converge: in
    /// every row and column, each group of equal-valued cells loses its
    /// worst-conflicted non-clue member (the cell is reset to the empty
    /// set). The result is not solvable as-is; it is meant to be re-encoded
    /// and handed to another solver stage to fill the gaps.
    pub fn clean_duplicates(board: &mut Board) {
        let n = board.num_units();
        let scores: Vec<usize> = (0..board.num_cells())
            .map(|i| local_conflicts(board, i))
            .collect();

        for u in 0..n {
            let row: Vec<usize> = (0..n).map(|k| board.row_cell(u, k)).collect();
            erase_worst(board, &scores, &row);
            let col: Vec<usize> = (0..n).map(|k| board.col_cell(u, k)).collect();
            erase_worst(board, &scores, &col);
        }
    }
}

impl Default for AnnealingSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver for AnnealingSolver {
    fn solve(&mut self, board: &Board, timeout: Duration) -> bool {
        let deadline = Deadline::start(timeout);
        self.cycles = 0;
        self.solution = None;

        let mut sol = board.clone();
        self.fill_boxes(&mut sol);

        let mut current_cost = conflict_cost(&sol);
        let mut best = sol.clone();
        let mut best_cost = current_cost;

        let mut temp = self.temp0;
        while best_cost > 0 && temp > self.stop && !deadline.expired() {
            self.cycles += 1;
            let snapshot = sol.clone();
            let mut new_cost = self.try_random_swap(&mut sol, current_cost);
            if new_cost == 0 {
                // trust a claimed solution only after a full recount
                new_cost = conflict_cost(&sol);
            }
            let delta = new_cost as i64 - current_cost as i64;
            if delta <= 0 {
                current_cost = new_cost;
                if current_cost < best_cost {
                    best = sol.clone();
                    best_cost = current_cost;
                }
            } else if self.rng.gen::<f64>() < (-(delta as f64) / temp).exp() {
                current_cost = new_cost;
            } else {
                sol = snapshot;
            }
            temp *= self.cooling;
        }

        self.solution_time = deadline.elapsed();
        if best_cost == 0 {
            self.solution = Some(best);
            true
        } else {
            false
        }
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

/// The annealing cost: one per duplicate symbol occurrence in every row and
/// column, plus a defensive one per non-fixed cell. Zero exactly when the
/// grid is a completed valid solution.
fn conflict_cost(board: &Board) -> usize {
    let n = board.num_units();
    let mut cost = 0;

    for i in 0..board.num_cells() {
        if !board.cell(i).is_fixed() {
            cost += 1;
        }
    }

    for u in 0..n {
        let mut row_seen = ValueSet::empty(n);
        let mut row_fixed = 0;
        let mut col_seen = ValueSet::empty(n);
        let mut col_fixed = 0;
        for k in 0..n {
            let rc = board.cell(board.row_cell(u, k));
            if rc.is_fixed() {
                row_fixed += 1;
                row_seen += rc;
            }
            let cc = board.cell(board.col_cell(u, k));
            if cc.is_fixed() {
                col_fixed += 1;
                col_seen += cc;
            }
        }
        cost += row_fixed - row_seen.count();
        cost += col_fixed - col_seen.count();
    }

    cost
}

/// Which rows and columns currently contain at least one duplicate.
fn units_with_duplicates(board: &Board) -> (Vec<bool>, Vec<bool>) {
    let n = board.num_units();
    let mut rows = vec![false; n];
    let mut cols = vec![false; n];
    for u in 0..n {
        let mut row_seen = ValueSet::empty(n);
        let mut row_fixed = 0;
        let mut col_seen = ValueSet::empty(n);
        let mut col_fixed = 0;
        for k in 0..n {
            let rc = board.cell(board.row_cell(u, k));
            if rc.is_fixed() {
                row_fixed += 1;
                row_seen += rc;
            }
            let cc = board.cell(board.col_cell(u, k));
            if cc.is_fixed() {
                col_fixed += 1;
                col_seen += cc;
            }
        }
        rows[u] = row_fixed > row_seen.count();
        cols[u] = col_fixed > col_seen.count();
    }
    (rows, cols)
}

/// How many cells in `i`'s row and column hold the same symbol as `i`.
fn local_conflicts(board: &Board, i: usize) -> usize {
    let cell = board.cell(i);
    if !cell.is_fixed() {
        return 0;
    }
    let symbol = cell.index();
    let row = board.row_for_cell(i);
    let col = board.col_for_cell(i);

    let mut conflicts = 0;
    for k in 0..board.num_units() {
        let r = board.row_cell(row, k);
        if r != i {
            let other = board.cell(r);
            if other.is_fixed() && other.index() == symbol {
                conflicts += 1;
            }
        }
        let c = board.col_cell(col, k);
        if c != i {
            let other = board.cell(c);
            if other.is_fixed() && other.index() == symbol {
                conflicts += 1;
            }
        }
    }
    conflicts
}

fn erase_worst(board: &mut Board, scores: &[usize], unit: &[usize]) {
    let groups = unit
        .iter()
        .filter(|&&i| board.cell(i).is_fixed())
        .map(|&i| (board.cell(i).index(), i))
        .into_group_map();

    for (_, cells) in groups {
        if cells.len() < 2 {
            continue;
        }
        let victim = cells
            .into_iter()
            .filter(|&i| !board.is_clue(i))
            .max_by_key(|&i| scores[i]);
        if let Some(i) = victim {
            board.force_set_cell(i, ValueSet::empty(board.num_units()));
        }
    }
}
