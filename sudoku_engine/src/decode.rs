//! Mapping between puzzle characters and symbol values.
//!
//! Each grid size has its own alphabet. The small grids use digits, the
//! 12×12 and 16×16 grids use `'0'..'9'` followed by letters (so `'0'` is
//! symbol 1), and grids of 25×25 and up use letters from `'a'` with a
//! deterministic extension past `'z'` for the giant sizes.

use crate::types::SudokuError;

const DIGITS_6: &str = "123456";
const DIGITS_9: &str = "123456789";
const DIGITS_12: &str = "0123456789ab";
const DIGITS_16: &str = "0123456789abcdef";
const LETTERS: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789+/";

/// The symbol alphabet for a grid with `num_units` symbols, ordered by value.
#[must_use]
pub fn alphabet(num_units: usize) -> &'static str {
    debug_assert!(num_units <= 64);
    match num_units {
        6 => DIGITS_6,
        9 => DIGITS_9,
        12 => DIGITS_12,
        16 => DIGITS_16,
        _ => &LETTERS[..num_units],
    }
}

/// Decode one puzzle character into its 1-based symbol value.
///
/// # Errors
/// Returns [`SudokuError::BadDigit`] if `c` is not in the alphabet for this
/// grid size.
pub fn value_of(num_units: usize, c: char) -> Result<usize, SudokuError> {
    match alphabet(num_units).chars().position(|s| s == c) {
        Some(pos) => Ok(pos + 1),
        None => Err(SudokuError::BadDigit(c)),
    }
}

/// Encode a 1-based symbol value as its puzzle character.
#[must_use]
pub fn symbol_of(num_units: usize, value: usize) -> char {
    debug_assert!(1 <= value && value <= num_units);
    alphabet(num_units).as_bytes()[value - 1] as char
}

/// Resolve a puzzle-string length into `(num_units, box_rows, box_cols)`.
///
/// # Errors
/// Returns [`SudokuError::BadPuzzleSize`] for lengths outside the eight
/// supported grids.
pub fn geometry_for_len(len: usize) -> Result<(usize, usize, usize), SudokuError> {
    match len {
        36 => Ok((6, 2, 3)),
        81 => Ok((9, 3, 3)),
        144 => Ok((12, 3, 4)),
        256 => Ok((16, 4, 4)),
        625 => Ok((25, 5, 5)),
        1296 => Ok((36, 6, 6)),
        2401 => Ok((49, 7, 7)),
        4096 => Ok((64, 8, 8)),
        _ => Err(SudokuError::BadPuzzleSize(len)),
    }
}
