//! A command line utility for solving variable-order sudoku.

use clap::Parser;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use sudoku_engine::{
    decode, AnnealingSolver, AntSystemSolver, BacktrackSolver, Board, Solver, SudokuError,
};

#[derive(Parser)]
#[command(author, version, about, name = "sudoku_solver")]
struct Args {
    /// Puzzle string, one character per cell with '.' for unknowns.
    #[arg(long)]
    puzzle: Option<String>,

    /// Read the puzzle from an integer-format file instead.
    #[arg(long)]
    file: Option<PathBuf>,

    /// Solve an empty grid of the size given by --order.
    #[arg(long)]
    blank: bool,

    /// Box size k for --blank; the grid is k²×k².
    #[arg(long, default_value_t = 3)]
    order: usize,

    /// Algorithm: 0 = ant system, 1 = backtracking, 2 = simulated annealing.
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=2))]
    alg: u8,

    /// Give up after this many seconds.
    #[arg(long, default_value_t = 10.0)]
    timeout: f64,

    /// Colony size for the ant system.
    #[arg(long, default_value_t = 10)]
    ants: usize,

    /// Ant system exploitation probability.
    #[arg(long, default_value_t = 0.9)]
    q0: f64,

    /// Ant system local pheromone evaporation rate.
    #[arg(long, default_value_t = 0.9)]
    rho: f64,

    /// Ant system global pheromone evaporation rate.
    #[arg(long, default_value_t = 0.005)]
    evap: f64,

    /// Narrate the outcome and print the solved grid.
    #[arg(long)]
    verbose: bool,

    /// Print the constrained grid before solving.
    #[arg(long)]
    showinitial: bool,
}

/// Convert the integer file layout into a puzzle string.
///
/// The first two whitespace-separated integers are a header; the first of
/// them is either the order (old layout, `order⁴` cell values follow) or the
/// grid side (new layout, `side²` values follow). Cell values are `-1` for
/// unknown, else 1-based symbols in row-major order.
fn puzzle_from_numbers(text: &str) -> Result<String, SudokuError> {
    let mut numbers = Vec::new();
    for token in text.split_whitespace() {
        let n: i64 = token
            .parse()
            .map_err(|_| SudokuError::BadFile(format!("'{token}' is not an integer")))?;
        numbers.push(n);
    }
    if numbers.len() < 2 || numbers[0] <= 0 {
        return Err(SudokuError::BadFile(String::from("missing or bad header")));
    }

    let first = numbers[0] as usize;
    let values = &numbers[2..]; // the second header number is unused

    let num_units = if values.len() == first.pow(4) {
        // old layout: the header is the order
        first * first
    } else if values.len() == first * first {
        first
    } else {
        return Err(SudokuError::BadFile(format!(
            "expected {} or {} values, got {}",
            first * first,
            first.pow(4),
            values.len()
        )));
    };

    let mut puzzle = String::with_capacity(values.len());
    for v in values {
        if *v == -1 {
            puzzle.push('.');
        } else if (1..=num_units as i64).contains(v) {
            puzzle.push(decode::symbol_of(num_units, *v as usize));
        } else {
            return Err(SudokuError::BadFile(format!("cell value {v} out of range")));
        }
    }
    Ok(puzzle)
}

fn load_board(args: &Args) -> Result<Board, Box<dyn Error>> {
    if args.blank {
        return Ok(Board::blank(args.order)?);
    }
    if let Some(puzzle) = &args.puzzle {
        return Ok(Board::from_puzzle_string(puzzle)?);
    }
    if let Some(path) = &args.file {
        let text = fs::read_to_string(path)?;
        return Ok(Board::from_puzzle_string(&puzzle_from_numbers(&text)?)?);
    }
    Err(Box::from("no puzzle specified"))
}

fn run(args: &Args) -> Result<bool, Box<dyn Error>> {
    let board = load_board(args)?;

    if args.showinitial {
        println!("Initial constrained grid");
        println!("{}", board.as_string(false, true));
    }

    let mut solver: Box<dyn Solver> = match args.alg {
        0 => Box::new(AntSystemSolver::new(args.ants, args.q0, args.rho, args.evap)),
        1 => Box::new(BacktrackSolver::new()),
        _ => Box::new(AnnealingSolver::new()),
    };

    let timeout = Duration::try_from_secs_f64(args.timeout)
        .map_err(|_| "timeout must be a non-negative number of seconds")?;
    let mut success = solver.solve(&board, timeout);

    // a solution that fails the checker is a solver bug, not a user error
    if success {
        match solver.solution() {
            Some(solution) if board.check_solution(solution) => {}
            Some(solution) => {
                eprintln!("solution not valid");
                eprintln!("fixed cells: {}", solution.fixed_count());
                eprintln!("{}", solution.as_string(true, false));
                success = false;
            }
            None => success = false,
        }
    }

    let elapsed = solver.solution_time().as_secs_f64();
    if args.verbose {
        if success {
            if let Some(solution) = solver.solution() {
                println!("Solution:");
                println!("{}", solution.as_string(true, false));
            }
            println!("solved in {elapsed}");
        } else {
            println!("failed in time {elapsed}");
        }
    } else {
        println!("{}", u8::from(!success));
        println!("{elapsed}");
        println!("{}", solver.cycles());
    }

    Ok(success)
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_6: &str = "123456456123231564564231312645645312";

    fn six_by_six_numbers() -> String {
        let mut text = String::from("6 6\n");
        for (i, c) in FULL_6.chars().enumerate() {
            if i == 0 {
                text.push_str("-1 ");
            } else {
                text.push_str(&format!("{} ", c.to_digit(10).unwrap()));
            }
        }
        text
    }

    #[test]
    fn new_layout_decodes() {
        let puzzle = puzzle_from_numbers(&six_by_six_numbers()).unwrap();
        assert_eq!(puzzle.len(), 36);
        assert!(puzzle.starts_with(".23456"));
        assert!(Board::from_puzzle_string(&puzzle).is_ok());
    }

    #[test]
    fn old_layout_decodes() {
        // header is the order; 3⁴ values follow for a 9×9 grid
        let mut text = String::from("3 3\n");
        for _ in 0..81 {
            text.push_str("-1 ");
        }
        let puzzle = puzzle_from_numbers(&text).unwrap();
        assert_eq!(puzzle, ".".repeat(81));
    }

    #[test]
    fn sixteen_by_sixteen_values_map_to_the_offset_alphabet() {
        let mut text = String::from("16 16\n");
        for v in 1..=16 {
            text.push_str(&format!("{v} "));
        }
        for _ in 16..256 {
            text.push_str("-1 ");
        }
        let puzzle = puzzle_from_numbers(&text).unwrap();
        assert!(puzzle.starts_with("0123456789abcdef"));
    }

    #[test]
    fn bad_files_are_rejected() {
        assert!(matches!(
            puzzle_from_numbers(""),
            Err(SudokuError::BadFile(_))
        ));
        assert!(matches!(
            puzzle_from_numbers("6 6 1 2 3"),
            Err(SudokuError::BadFile(_))
        ));
        assert!(matches!(
            puzzle_from_numbers("6 6 one two"),
            Err(SudokuError::BadFile(_))
        ));

        let mut out_of_range = String::from("6 6\n");
        for _ in 0..35 {
            out_of_range.push_str("1 ");
        }
        out_of_range.push_str("7 ");
        assert!(matches!(
            puzzle_from_numbers(&out_of_range),
            Err(SudokuError::BadFile(_))
        ));
    }
}
