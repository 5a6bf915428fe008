//! Quadrant symbols and the words addressing quadtree cells

use crate::io::error::{Result, WfaError, invalid_parameter};
use std::fmt;
use std::str::FromStr;

/// One of the four quadrants of a square region
///
/// The grid is indexed `(row, col)`. A symbol selects the upper or lower
/// half of the rows and the left or right half of the columns:
///
/// | symbol | rows  | cols  |
/// |--------|-------|-------|
/// | `Zero` | upper | right |
/// | `One`  | lower | right |
/// | `Two`  | upper | left  |
/// | `Three`| lower | left  |
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    /// Upper rows, right columns
    Zero = 0,
    /// Lower rows, right columns
    One = 1,
    /// Upper rows, left columns
    Two = 2,
    /// Lower rows, left columns
    Three = 3,
}

impl Symbol {
    /// All symbols in label order
    pub const ALL: [Self; 4] = [Self::Zero, Self::One, Self::Two, Self::Three];

    /// Label used as transition-matrix index and on disk
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Offset of the quadrant in units of its own size as (row, col)
    pub const fn offset(self) -> (usize, usize) {
        match self {
            Self::Zero => (0, 1),
            Self::One => (1, 1),
            Self::Two => (0, 0),
            Self::Three => (1, 0),
        }
    }

    /// Symbol whose quadrant has the given unit offset
    pub const fn from_offset(row: bool, col: bool) -> Self {
        match (row, col) {
            (false, true) => Self::Zero,
            (true, true) => Self::One,
            (false, false) => Self::Two,
            (true, false) => Self::Three,
        }
    }
}

impl TryFrom<u8> for Symbol {
    type Error = WfaError;

    fn try_from(label: u8) -> Result<Self> {
        match label {
            0 => Ok(Self::Zero),
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            other => Err(invalid_parameter(
                "label",
                &other,
                &"quadrant labels range from 0 to 3",
            )),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Ordered sequence of symbols addressing one quadtree cell
///
/// A word of length `n` selects one cell of the `2^n x 2^n` grid; the first
/// symbol picks the coarsest quadrant.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Word {
    symbols: Vec<Symbol>,
}

impl Word {
    /// The empty word, addressing the whole square
    pub const fn new() -> Self {
        Self {
            symbols: Vec::new(),
        }
    }

    /// Single-symbol word
    pub fn single(symbol: Symbol) -> Self {
        Self {
            symbols: vec![symbol],
        }
    }

    /// Number of symbols, i.e. the quadtree depth addressed
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether this is the empty word
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Symbols from coarsest to finest
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Word one level deeper, with `symbol` appended
    #[must_use]
    pub fn appended(&self, symbol: Symbol) -> Self {
        let mut symbols = Vec::with_capacity(self.len() + 1);
        symbols.extend_from_slice(&self.symbols);
        symbols.push(symbol);
        Self { symbols }
    }

    /// Word with `symbol` placed in front
    #[must_use]
    pub fn prepended(&self, symbol: Symbol) -> Self {
        let mut symbols = Vec::with_capacity(self.len() + 1);
        symbols.push(symbol);
        symbols.extend_from_slice(&self.symbols);
        Self { symbols }
    }

    /// Concatenation `self ‖ suffix`
    #[must_use]
    pub fn concat(&self, suffix: &Self) -> Self {
        let mut symbols = Vec::with_capacity(self.len() + suffix.len());
        symbols.extend_from_slice(&self.symbols);
        symbols.extend_from_slice(&suffix.symbols);
        Self { symbols }
    }

    /// Every word of the given length, in lexicographic label order
    pub fn all_of_length(length: usize) -> Vec<Self> {
        let mut words = vec![Self::new()];
        for _ in 0..length {
            words = words
                .iter()
                .flat_map(|word| Symbol::ALL.into_iter().map(|symbol| word.appended(symbol)))
                .collect();
        }
        words
    }
}

impl From<Vec<Symbol>> for Word {
    fn from(symbols: Vec<Symbol>) -> Self {
        Self { symbols }
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for symbol in &self.symbols {
            write!(f, "{symbol}")?;
        }
        Ok(())
    }
}

impl FromStr for Word {
    type Err = WfaError;

    fn from_str(text: &str) -> Result<Self> {
        text.chars()
            .map(|c| {
                c.to_digit(4)
                    .and_then(|digit| u8::try_from(digit).ok())
                    .ok_or_else(|| invalid_parameter("word", &text, &"expected digits 0-3"))
                    .and_then(Symbol::try_from)
            })
            .collect::<Result<Vec<_>>>()
            .map(Self::from)
    }
}
