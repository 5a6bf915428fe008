//! Bijection between words and pixel positions
//!
//! Quadrant extraction during encoding and pixel placement during decoding
//! both go through [`Symbol::offset`], so the two directions cannot drift
//! apart.

use crate::automaton::alphabet::{Symbol, Word};
use crate::io::error::{Result, invalid_parameter};

/// Pixel position as (row, col) in a `2^n x 2^n` grid
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Coordinates {
    /// Row index
    pub x: usize,
    /// Column index
    pub y: usize,
}

impl Coordinates {
    /// Create coordinates from a row and column
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Top-left pixel of the cell addressed by `word`
    ///
    /// Each symbol adds its quadrant offset at the current scale, starting
    /// from `2^(n-1)` and halving per symbol.
    pub fn from_word(word: &Word) -> Self {
        let depth = word.len();
        word.symbols()
            .iter()
            .enumerate()
            .fold(Self::default(), |acc, (level, symbol)| {
                let size = 1_usize << (depth - level - 1);
                let (row, col) = symbol.offset();
                Self::new(acc.x + row * size, acc.y + col * size)
            })
    }

    /// Position of the cell addressed by `prefix ‖ suffix`
    ///
    /// `prefix` and `suffix` are the positions of the two halves in their own
    /// grids; `suffix_len` is the length of the suffix word.
    pub const fn concatenated(prefix: Self, suffix: Self, suffix_len: usize) -> Self {
        Self::new(
            (prefix.x << suffix_len) + suffix.x,
            (prefix.y << suffix_len) + suffix.y,
        )
    }

    /// Word of the given length addressing this pixel
    ///
    /// Derived by testing quadrant membership level by level.
    ///
    /// # Errors
    ///
    /// Returns an error if the position lies outside the `2^length` grid
    pub fn to_word(self, length: usize) -> Result<Word> {
        let side = 1_usize.checked_shl(u32::try_from(length).unwrap_or(u32::MAX));
        if side.is_none_or(|side| self.x >= side || self.y >= side) {
            return Err(invalid_parameter(
                "coordinates",
                &format!("({}, {})", self.x, self.y),
                &format!("outside a grid of depth {length}"),
            ));
        }

        let symbols = (0..length)
            .map(|level| {
                let shift = length - level - 1;
                Symbol::from_offset((self.x >> shift) & 1 == 1, (self.y >> shift) & 1 == 1)
            })
            .collect::<Vec<_>>();
        Ok(Word::from(symbols))
    }
}

impl From<&Word> for Coordinates {
    fn from(word: &Word) -> Self {
        Self::from_word(word)
    }
}
