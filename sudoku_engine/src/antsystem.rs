//! Ant Colony System search over propagated boards.

use crate::board::Board;
use crate::solver::{Deadline, Solver};
use crate::valueset::ValueSet;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Stochastic search guided by a pheromone matrix indexed by (cell, value).
///
/// Every colony cycle sends `n_ants` ants over clones of the input board.
/// An ant walks the cells in index order from a random offset and commits a
/// value from each open cell's candidate set through [`Board::set_cell`], so
/// constraint propagation prunes the remainder of its walk; a contradiction
/// ends the walk early. Value choice follows the classic exploit/explore
/// split: with probability `q0` the best-pheromone candidate, otherwise a
/// roulette wheel over the candidates. Each commitment applies the local
/// update `τ ← (1-ρ)·τ + ρ·τ₀`, and the cycle's best ant deposits
/// `τ ← (1-evap)·τ + evap·Δτ` along its trail, with `Δτ` growing as the ant
/// gets closer to a full grid.
#[derive(Debug)]
pub struct AntSystemSolver {
    n_ants: usize,
    q0: f64,
    rho: f64,
    evap: f64,
    rng: SmallRng,
    solution: Option<Board>,
    solution_time: Duration,
    cycles: u64,
}

impl AntSystemSolver {
    /// A colony with the given parameters and an entropy-seeded generator.
    ///
    /// `n_ants` is the colony size, `q0` the exploitation probability, `rho`
    /// the local and `evap` the global pheromone evaporation rate.
    #[must_use]
    pub fn new(n_ants: usize, q0: f64, rho: f64, evap: f64) -> Self {
        Self::from_rng(n_ants, q0, rho, evap, SmallRng::from_entropy())
    }

    /// Same as [`new`](Self::new) with a fixed seed, for reproducible runs.
    #[must_use]
    pub fn with_seed(n_ants: usize, q0: f64, rho: f64, evap: f64, seed: u64) -> Self {
        Self::from_rng(n_ants, q0, rho, evap, SmallRng::seed_from_u64(seed))
    }

    fn from_rng(n_ants: usize, q0: f64, rho: f64, evap: f64, rng: SmallRng) -> Self {
        AntSystemSolver {
            n_ants,
            q0,
            rho,
            evap,
            rng,
            solution: None,
            solution_time: Duration::ZERO,
            cycles: 0,
        }
    }

    fn rollout(
        &mut self,
        board: &Board,
        pheromone: &mut [Vec<f64>],
        tau0: f64,
    ) -> (Board, Vec<(usize, usize)>) {
        let num_cells = board.num_cells();
        let mut ant = board.clone();
        let mut trail = Vec::new();

        let offset = self.rng.gen_range(0..num_cells);
        for step in 0..num_cells {
            if ant.infeasible_count() > 0 {
                break;
            }
            let i = (offset + step) % num_cells;
            let cell = ant.cell(i);
            if cell.is_fixed() || cell.is_empty() {
                continue;
            }
            let value = self.choose_value(&pheromone[i], cell);
            ant.set_cell(i, ValueSet::singleton(ant.num_units(), value));
            trail.push((i, value));
            let p = &mut pheromone[i][value];
            *p = (1.0 - self.rho) * *p + self.rho * tau0;
        }

        (ant, trail)
    }

    fn choose_value(&mut self, pheromone: &[f64], candidates: ValueSet) -> usize {
        debug_assert!(!candidates.is_empty());
        if self.rng.gen::<f64>() < self.q0 {
            let mut chosen = candidates.index();
            for v in candidates.iter() {
                if pheromone[v] > pheromone[chosen] {
                    chosen = v;
                }
            }
            chosen
        } else {
            let total: f64 = candidates.iter().map(|v| pheromone[v]).sum();
            let mut target = self.rng.gen::<f64>() * total;
            let mut chosen = candidates.index();
            for v in candidates.iter() {
                chosen = v;
                target -= pheromone[v];
                if target <= 0.0 {
                    break;
                }
            }
            chosen
        }
    }
}

impl Solver for AntSystemSolver {
    fn solve(&mut self, board: &Board, timeout: Duration) -> bool {
        let deadline = Deadline::start(timeout);
        self.cycles = 0;
        self.solution = None;

        if board.solved() {
            self.solution = Some(board.clone());
            self.solution_time = deadline.elapsed();
            return true;
        }

        let num_cells = board.num_cells();
        let tau0 = 1.0 / num_cells as f64;
        let mut pheromone = vec![vec![tau0; board.num_units()]; num_cells];

        'colony: while !deadline.expired() {
            self.cycles += 1;
            let mut best_trail: Vec<(usize, usize)> = Vec::new();
            let mut best_fixed = 0;

            for _ in 0..self.n_ants {
                if deadline.expired() {
                    break 'colony;
                }
                let (ant, trail) = self.rollout(board, &mut pheromone, tau0);
                if ant.solved() {
                    self.solution = Some(ant);
                    self.solution_time = deadline.elapsed();
                    return true;
                }
                if ant.fixed_count() > best_fixed {
                    best_fixed = ant.fixed_count();
                    best_trail = trail;
                }
            }

            if best_fixed < num_cells {
                let dtau = num_cells as f64 / (num_cells - best_fixed) as f64;
                for (cell, value) in best_trail {
                    let p = &mut pheromone[cell][value];
                    *p = (1.0 - self.evap) * *p + self.evap * dtau;
                }
            }
        }

        self.solution_time = deadline.elapsed();
        false
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
