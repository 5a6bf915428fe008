//! Weighted labeled edges between states

use crate::automaton::alphabet::Symbol;
use std::fmt;

/// Edge `from --label/weight--> to`
///
/// All transitions sharing a label form that label's transition matrix,
/// with `weight` stored at row `from`, column `to`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transition {
    /// Source state id
    pub from: usize,
    /// Target state id
    pub to: usize,
    /// Quadrant symbol the edge is labeled with
    pub label: Symbol,
    /// Coefficient of the target state in the source state's quadrant
    pub weight: f64,
}

impl Transition {
    /// Create a transition
    pub const fn new(from: usize, to: usize, label: Symbol, weight: f64) -> Self {
        Self {
            from,
            to,
            label,
            weight,
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}",
            self.from, self.to, self.label, self.weight
        )
    }
}
