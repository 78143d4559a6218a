//! The board: a grid of candidate sets with constraint propagation.

use crate::decode;
use crate::types::SudokuError;
use crate::valueset::ValueSet;
use bitvec::array as bit_array;
use std::fmt::Display;

/// Cell count of the largest supported grid (64×64).
const MAX_CELLS: usize = 64 * 64;

/// One bit per cell of the largest supported grid.
type ClueMask = bit_array::BitArray<[u64; MAX_CELLS / 64]>;

/// A variable-order sudoku grid.
///
/// Every cell holds a [`ValueSet`] of still-possible symbols. Assigning a
/// cell through [`set_cell`](Self::set_cell) eliminates that symbol from the
/// cell's row, column and box peers and cascades through any naked or hidden
/// singles this uncovers. A cell whose candidate set is emptied by
/// propagation marks the board infeasible; search engines treat
/// `infeasible_count() > 0` as a pruned branch.
///
/// Cells are addressed by a single 0-based row-major index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    num_units: usize,
    box_rows: usize,
    box_cols: usize,
    num_cells: usize,
    cells: Vec<ValueSet>,
    is_clue: ClueMask,
    num_fixed: usize,
    num_infeasible: usize,
}

impl Board {
    fn with_geometry(num_units: usize, box_rows: usize, box_cols: usize) -> Self {
        let num_cells = num_units * num_units;
        Board {
            num_units,
            box_rows,
            box_cols,
            num_cells,
            cells: vec![ValueSet::full(num_units); num_cells],
            is_clue: ClueMask::ZERO,
            num_fixed: 0,
            num_infeasible: 0,
        }
    }

    /// Build a board from a puzzle string of one character per cell, `.` for
    /// unknowns. The string length selects the geometry. Clues are applied
    /// one by one with full constraint propagation, so the returned board is
    /// already as constrained as the singles rules allow.
    ///
    /// # Errors
    /// [`SudokuError::BadPuzzleSize`] for an unsupported length,
    /// [`SudokuError::BadDigit`] for a character outside the size's alphabet.
    pub fn from_puzzle_string(puzzle: &str) -> Result<Self, SudokuError> {
        let (num_units, box_rows, box_cols) = decode::geometry_for_len(puzzle.len())?;
        let mut board = Self::with_geometry(num_units, box_rows, box_cols);

        for (i, c) in puzzle.chars().enumerate() {
            if c == '.' {
                continue;
            }
            let value = decode::value_of(num_units, c)?;
            board.set_cell(i, ValueSet::singleton(num_units, value - 1));
            board.is_clue.set(i, true);
        }

        Ok(board)
    }

    /// An all-unknown board of order `order` (grid side `order²`).
    ///
    /// # Errors
    /// [`SudokuError::BadOrder`] if `order²` is not a supported grid side.
    pub fn blank(order: usize) -> Result<Self, SudokuError> {
        let num_units = order * order;
        match decode::geometry_for_len(num_units * num_units) {
            Ok((n, box_rows, box_cols)) => Ok(Self::with_geometry(n, box_rows, box_cols)),
            Err(_) => Err(SudokuError::BadOrder(order)),
        }
    }

    /// The number of symbols (and the side length) of the grid.
    #[must_use]
    pub fn num_units(&self) -> usize {
        self.num_units
    }

    /// The total number of cells.
    #[must_use]
    pub fn num_cells(&self) -> usize {
        self.num_cells
    }

    /// The candidate set of cell `i`.
    #[must_use]
    pub fn cell(&self, i: usize) -> ValueSet {
        self.cells[i]
    }

    /// Whether cell `i` was given in the original puzzle.
    #[must_use]
    pub fn is_clue(&self, i: usize) -> bool {
        self.is_clue[i]
    }

    /// How many cells are currently fixed to a single symbol.
    #[must_use]
    pub fn fixed_count(&self) -> usize {
        self.num_fixed
    }

    /// How many cells were reduced to the empty set by propagation. Any
    /// non-zero value means no solution is reachable from this state.
    #[must_use]
    pub fn infeasible_count(&self) -> usize {
        self.num_infeasible
    }

    /// Whether every cell is fixed and no cell is infeasible.
    #[must_use]
    pub fn solved(&self) -> bool {
        self.num_fixed == self.num_cells && self.num_infeasible == 0
    }

    /// Index of the `k`-th cell of row `row`.
    #[must_use]
    pub fn row_cell(&self, row: usize, k: usize) -> usize {
        row * self.num_units + k
    }

    /// Index of the `k`-th cell of column `col`.
    #[must_use]
    pub fn col_cell(&self, col: usize, k: usize) -> usize {
        k * self.num_units + col
    }

    /// Index of the `k`-th cell of box `b`, in row-major order within the
    /// box.
    #[must_use]
    pub fn box_cell(&self, b: usize, k: usize) -> usize {
        let boxes_per_row = self.num_units / self.box_cols;
        let box_col = b % boxes_per_row;
        let box_row = b / boxes_per_row;
        let top_corner = box_col * self.box_cols + box_row * self.box_rows * self.num_units;
        top_corner + k % self.box_cols + (k / self.box_cols) * self.num_units
    }

    /// The row containing cell `i`.
    #[must_use]
    pub fn row_for_cell(&self, i: usize) -> usize {
        i / self.num_units
    }

    /// The column containing cell `i`.
    #[must_use]
    pub fn col_for_cell(&self, i: usize) -> usize {
        i % self.num_units
    }

    /// The box containing cell `i`.
    #[must_use]
    pub fn box_for_cell(&self, i: usize) -> usize {
        let box_row = self.row_for_cell(i) / self.box_rows;
        let box_col = self.col_for_cell(i) / self.box_cols;
        box_row * (self.num_units / self.box_cols) + box_col
    }

    /// Re-derive the candidates of cell `i` from its peers.
    ///
    /// Symbols fixed in any peer are removed. If that leaves exactly one
    /// candidate, or if a remaining candidate has no other home in one of the
    /// cell's units (a hidden single), the cell is assigned through
    /// [`set_cell`](Self::set_cell) and propagation continues from there. A
    /// cell left with no candidates bumps the infeasibility counter.
    pub fn constrain_cell(&mut self, i: usize) {
        if self.cells[i].is_empty() || self.cells[i].is_fixed() {
            return;
        }

        let row = self.row_for_cell(i);
        let col = self.col_for_cell(i);
        let bx = self.box_for_cell(i);

        let mut row_fixed = ValueSet::empty(self.num_units);
        let mut col_fixed = ValueSet::empty(self.num_units);
        let mut box_fixed = ValueSet::empty(self.num_units);
        let mut row_all = ValueSet::empty(self.num_units);
        let mut col_all = ValueSet::empty(self.num_units);
        let mut box_all = ValueSet::empty(self.num_units);

        for j in 0..self.num_units {
            let k = self.box_cell(bx, j);
            if k != i {
                if self.cells[k].is_fixed() {
                    box_fixed += self.cells[k];
                }
                box_all += self.cells[k];
            }
            let k = self.col_cell(col, j);
            if k != i {
                if self.cells[k].is_fixed() {
                    col_fixed += self.cells[k];
                }
                col_all += self.cells[k];
            }
            let k = self.row_cell(row, j);
            if k != i {
                if self.cells[k].is_fixed() {
                    row_fixed += self.cells[k];
                }
                row_all += self.cells[k];
            }
        }

        let legal_by_fixed = !(row_fixed + col_fixed + box_fixed);

        if legal_by_fixed.is_fixed() {
            // every other symbol is taken by a peer
            self.set_cell(i, legal_by_fixed);
        } else {
            let remaining = self.cells[i] & legal_by_fixed;
            if remaining.is_fixed() {
                // naked single
                self.set_cell(i, remaining);
            } else {
                self.cells[i] = remaining;
                // hidden single: a candidate with no other home in a unit
                let unique_in_row = self.cells[i] - row_all;
                let unique_in_col = self.cells[i] - col_all;
                let unique_in_box = self.cells[i] - box_all;
                if unique_in_row.is_fixed() {
                    self.set_cell(i, unique_in_row);
                } else if unique_in_col.is_fixed() {
                    self.set_cell(i, unique_in_col);
                } else if unique_in_box.is_fixed() {
                    self.set_cell(i, unique_in_box);
                }
            }
        }

        if self.cells[i].is_empty() {
            self.num_infeasible += 1;
        }
    }

    /// Fix cell `i` to the single symbol in `value` and propagate.
    ///
    /// A no-op on an already-fixed cell. Recursion through
    /// [`constrain_cell`](Self::constrain_cell) is bounded because every
    /// nested call fixes a cell that was not fixed before.
    pub fn set_cell(&mut self, i: usize, value: ValueSet) {
        debug_assert!(value.is_fixed());
        if self.cells[i].is_fixed() {
            return;
        }
        self.cells[i] = value;
        self.num_fixed += 1;
        self.constrain_peers(i);
    }

    /// Overwrite cell `i` unconditionally, then constrain its peers.
    ///
    /// This is the annealing engine's entry point: it operates on a filled
    /// grid where cells must be swappable even though they are fixed.
    pub fn force_set_cell(&mut self, i: usize, value: ValueSet) {
        let was_fixed = self.cells[i].is_fixed();
        self.cells[i] = value;
        if !was_fixed && value.is_fixed() {
            self.num_fixed += 1;
        } else if was_fixed && !value.is_fixed() {
            self.num_fixed -= 1;
        }
        self.constrain_peers(i);
    }

    fn constrain_peers(&mut self, i: usize) {
        let row = self.row_for_cell(i);
        let col = self.col_for_cell(i);
        let bx = self.box_for_cell(i);

        for j in 0..self.num_units {
            let k = self.box_cell(bx, j);
            if k != i {
                self.constrain_cell(k);
            }
            let k = self.col_cell(col, j);
            if k != i {
                self.constrain_cell(k);
            }
            let k = self.row_cell(row, j);
            if k != i {
                self.constrain_cell(k);
            }
        }
    }

    /// Check that `other` is a completed valid grid consistent with this
    /// board: same cell count, every cell fixed, every unit containing each
    /// symbol exactly once, and every fixed cell of `self` holding the same
    /// symbol in `other`.
    #[must_use]
    pub fn check_solution(&self, other: &Board) -> bool {
        if other.num_cells != self.num_cells {
            return false;
        }

        for i in 0..self.num_cells {
            if !other.cells[i].is_fixed() {
                return false;
            }
        }

        for u in 0..self.num_units {
            let mut row = ValueSet::empty(self.num_units);
            let mut col = ValueSet::empty(self.num_units);
            let mut bx = ValueSet::empty(self.num_units);
            for k in 0..self.num_units {
                row += other.cells[self.row_cell(u, k)];
                col += other.cells[self.col_cell(u, k)];
                bx += other.cells[self.box_cell(u, k)];
            }
            if row.count() != self.num_units
                || col.count() != self.num_units
                || bx.count() != self.num_units
            {
                return false;
            }
        }

        for i in 0..self.num_cells {
            if self.cells[i].is_fixed() && self.cells[i].index() != other.cells[i].index() {
                return false;
            }
        }

        true
    }

    /// Render the board for humans: cells in row-major order, `|` between
    /// box columns and dashed rules between box rows. With `use_numbers` the
    /// fixed cells print as 1-based numbers; otherwise they print as symbols
    /// from the size's alphabet. Non-fixed cells print as `.` unless
    /// `show_unfixed` asks for their full candidate list (which forces
    /// symbol output for readability).
    #[must_use]
    pub fn as_string(&self, use_numbers: bool, show_unfixed: bool) -> String {
        let use_numbers = use_numbers && !show_unfixed;
        let alphabet = decode::alphabet(self.num_units);

        let mut cell_strings = Vec::with_capacity(self.num_cells);
        let mut max_len = 0;
        for cell in &self.cells {
            let contents = if use_numbers {
                if cell.is_fixed() {
                    (cell.index() + 1).to_string()
                } else {
                    String::from(".")
                }
            } else if !show_unfixed && !cell.is_fixed() {
                String::from(".")
            } else {
                cell.format_with(alphabet)
            };
            max_len = max_len.max(contents.len());
            cell_strings.push(contents);
        }

        let pitch = max_len + 1;
        let boxes_per_row = self.num_units / self.box_cols;
        let mut out = String::new();
        for (i, contents) in cell_strings.iter().enumerate() {
            out.push_str(&format!("{contents:>pitch$} "));
            if i % self.num_units == self.num_units - 1 {
                if i != self.num_cells - 1 {
                    out.push('\n');
                }
            } else if i % self.box_cols == self.box_cols - 1 {
                out.push('|');
            }
            if i % (self.num_units * self.box_rows) == self.num_units * self.box_rows - 1
                && i != self.num_cells - 1
            {
                for j in 0..boxes_per_row {
                    for _ in 0..self.box_cols * (pitch + 1) {
                        out.push('-');
                    }
                    if j != boxes_per_row - 1 {
                        out.push('+');
                    }
                }
                out.push('\n');
            }
        }
        out
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}", self.as_string(false, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A complete 6×6 grid used as a fixture throughout.
    const FULL_6: &str = "123456456123231564564231312645645312";

    #[test]
    fn geometry_round_trips() {
        for order in [3, 4, 5, 6, 7, 8] {
            let board = Board::blank(order).unwrap();
            for i in 0..board.num_cells() {
                let row = board.row_for_cell(i);
                let col = board.col_for_cell(i);
                assert_eq!(board.row_cell(row, col), i);
                assert_eq!(board.col_cell(col, row), i);
                let b = board.box_for_cell(i);
                let in_box = (0..board.num_units())
                    .filter(|&k| board.box_cell(b, k) == i)
                    .count();
                assert_eq!(in_box, 1, "cell {i} of order {order}");
            }
        }
    }

    #[test]
    fn rectangular_box_geometry() {
        let board = Board::from_puzzle_string(&".".repeat(36)).unwrap();
        // 6×6 boxes are 2 rows by 3 columns
        assert_eq!(board.box_for_cell(0), 0);
        assert_eq!(board.box_for_cell(3), 1);
        assert_eq!(board.box_for_cell(12), 2);
        let box0: Vec<usize> = (0..6).map(|k| board.box_cell(0, k)).collect();
        assert_eq!(box0, vec![0, 1, 2, 6, 7, 8]);
        let box3: Vec<usize> = (0..6).map(|k| board.box_cell(3, k)).collect();
        assert_eq!(box3, vec![15, 16, 17, 21, 22, 23]);
    }

    #[test]
    fn unsupported_sizes_are_rejected() {
        assert_eq!(
            Board::from_puzzle_string("123"),
            Err(SudokuError::BadPuzzleSize(3))
        );
        assert_eq!(
            Board::from_puzzle_string(&".".repeat(100)),
            Err(SudokuError::BadPuzzleSize(100))
        );
        assert_eq!(Board::blank(2), Err(SudokuError::BadOrder(2)));
        assert!(Board::blank(3).is_ok());
    }

    #[test]
    fn bad_digits_are_rejected() {
        let mut puzzle = ".".repeat(36);
        puzzle.replace_range(4..5, "7");
        assert_eq!(
            Board::from_puzzle_string(&puzzle),
            Err(SudokuError::BadDigit('7'))
        );
    }

    #[test]
    fn clues_are_flagged_and_propagated() {
        let mut puzzle = String::from(FULL_6);
        puzzle.replace_range(0..1, ".");
        let board = Board::from_puzzle_string(&puzzle).unwrap();

        assert!(!board.is_clue(0));
        assert!(board.is_clue(1));
        // the blank is a naked single, so propagation finishes the grid
        assert_eq!(board.fixed_count(), 36);
        assert!(board.cell(0).is_fixed());
        assert_eq!(board.cell(0).index(), 0);
        assert!(board.solved());
    }

    #[test]
    fn set_cell_eliminates_from_peers() {
        let mut board = Board::blank(3).unwrap();
        board.set_cell(11, ValueSet::singleton(9, 5));

        assert_eq!(board.fixed_count(), 1);
        let sees = [
            0, 1, 2, 9, 10, 12, 13, 14, 15, 16, 17, 18, 19, 20, 29, 38, 47, 56, 65, 74,
        ];
        for i in sees {
            assert!(!board.cell(i).contains(5), "peer {i} still allows 6");
        }
        for i in (0..81).filter(|x| *x != 11 && !sees.contains(x)) {
            assert!(board.cell(i).contains(5), "non-peer {i} lost a candidate");
        }
    }

    #[test]
    fn set_cell_is_idempotent() {
        let mut board = Board::blank(3).unwrap();
        board.set_cell(0, ValueSet::singleton(9, 3));
        let snapshot = board.clone();
        board.set_cell(0, ValueSet::singleton(9, 7));
        assert_eq!(board, snapshot);
    }

    #[test]
    fn constrain_cell_is_idempotent() {
        let puzzle =
            "53..7....6..195....98....6.8...6...34..8.3..17...2...6.6....28....419..5....8..79";
        let mut board = Board::from_puzzle_string(puzzle).unwrap();
        let mut twice = board.clone();
        for i in 0..board.num_cells() {
            board.constrain_cell(i);
            twice.constrain_cell(i);
            twice.constrain_cell(i);
        }
        assert_eq!(board, twice);
    }

    #[test]
    fn fixed_count_matches_cells() {
        let puzzle =
            "53..7....6..195....98....6.8...6...34..8.3..17...2...6.6....28....419..5....8..79";
        let board = Board::from_puzzle_string(puzzle).unwrap();
        let fixed = (0..board.num_cells())
            .filter(|&i| board.cell(i).is_fixed())
            .count();
        assert_eq!(board.fixed_count(), fixed);
    }

    #[test]
    fn no_unit_holds_a_symbol_twice() {
        let puzzle =
            "53..7....6..195....98....6.8...6...34..8.3..17...2...6.6....28....419..5....8..79";
        let board = Board::from_puzzle_string(puzzle).unwrap();
        type UnitFn = fn(&Board, usize, usize) -> usize;
        let units: [UnitFn; 3] = [Board::row_cell, Board::col_cell, Board::box_cell];
        for u in 0..board.num_units() {
            for unit_cell in units {
                let mut seen = ValueSet::empty(9);
                for k in 0..board.num_units() {
                    let cell = board.cell(unit_cell(&board, u, k));
                    if cell.is_fixed() {
                        assert!(!seen.contains(cell.index()));
                        seen += cell;
                    }
                }
            }
        }
    }

    #[test]
    fn collapsing_a_cell_marks_infeasibility() {
        // Clues 1..7 in row 0 leave cells 7 and 8 with candidates {8, 9}; a 9
        // in the same box then forces both survivors into the same symbol and
        // one of them collapses.
        let puzzle = format!("1234567..{}{}", ".......9.", &".".repeat(63));
        let board = Board::from_puzzle_string(&puzzle).unwrap();
        assert!(board.infeasible_count() > 0);
    }

    #[test]
    fn check_solution_accepts_a_valid_completion() {
        let mut puzzle = String::from(FULL_6);
        puzzle.replace_range(0..1, ".");
        puzzle.replace_range(7..8, ".");
        let board = Board::from_puzzle_string(&puzzle).unwrap();
        let solution = Board::from_puzzle_string(FULL_6).unwrap();
        assert!(board.check_solution(&solution));
    }

    #[test]
    fn check_solution_rejects_bad_grids() {
        let board = Board::from_puzzle_string(FULL_6).unwrap();

        // incomplete
        let unfinished = Board::from_puzzle_string(&".".repeat(36)).unwrap();
        assert!(!board.check_solution(&unfinished));

        // wrong size
        let other_size = Board::blank(3).unwrap();
        assert!(!board.check_solution(&other_size));

        // complete but inconsistent with this board's fixed cells
        let mut renumbered = String::new();
        for c in FULL_6.chars() {
            let v = c.to_digit(10).unwrap() as usize;
            renumbered.push(char::from_digit(((v % 6) + 1) as u32, 10).unwrap());
        }
        let relabeled = Board::from_puzzle_string(&renumbered).unwrap();
        assert!(!board.check_solution(&relabeled));
    }

    #[test]
    fn duplicate_unit_fails_check_solution() {
        let blank = Board::from_puzzle_string(&".".repeat(36)).unwrap();
        let mut bad = Board::from_puzzle_string(FULL_6).unwrap();
        // overwrite one cell with its row neighbour's symbol
        let neighbour = bad.cell(1);
        bad.force_set_cell(0, neighbour);
        assert!(!blank.check_solution(&bad));
    }

    #[test]
    fn as_string_layout() {
        let board = Board::from_puzzle_string(FULL_6).unwrap();
        let expected = [
            " 1  2  3 | 4  5  6 ",
            " 4  5  6 | 1  2  3 ",
            "---------+---------",
            " 2  3  1 | 5  6  4 ",
            " 5  6  4 | 2  3  1 ",
            "---------+---------",
            " 3  1  2 | 6  4  5 ",
            " 6  4  5 | 3  1  2 ",
        ]
        .join("\n");
        assert_eq!(board.as_string(true, false), expected);
        assert_eq!(board.as_string(false, false), expected);
        assert_eq!(format!("{board}"), expected);
    }

    #[test]
    fn as_string_hides_or_shows_unfixed_cells() {
        let mut puzzle = String::from(FULL_6);
        puzzle.replace_range(0..1, ".");
        let mut board = Board::from_puzzle_string(&puzzle).unwrap();
        board.force_set_cell(0, ValueSet::from_mask(6, 0b000011));

        let hidden = board.as_string(true, false);
        assert!(hidden.starts_with(" . "));

        // show_unfixed forces symbol output and lists the candidates
        let shown = board.as_string(true, true);
        assert!(shown.starts_with(" 12 "));
    }

    #[test]
    fn solved_string_round_trips_through_the_decoder() {
        let board = Board::from_puzzle_string(FULL_6).unwrap();
        let rendered = board.as_string(true, false);
        let puzzle: String = rendered
            .split_whitespace()
            .filter_map(|token| token.parse::<usize>().ok())
            .map(|v| decode::symbol_of(6, v))
            .collect();
        assert_eq!(puzzle.len(), 36);
        let reparsed = Board::from_puzzle_string(&puzzle).unwrap();
        for i in 0..board.num_cells() {
            assert_eq!(board.cell(i).index(), reparsed.cell(i).index());
        }
    }
}
