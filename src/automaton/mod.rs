//! Automaton model: quadtree addressing, states, transitions and the
//! automaton aggregate

/// Quadrant symbols and words
pub mod alphabet;
/// Fixed bilinear basis automaton
pub mod base;
/// Word to pixel mapping
pub mod coordinates;
/// States and their image patches
pub mod state;
/// Weighted labelled edges
pub mod transition;
/// The automaton aggregate with arena rollback
pub mod wfa;

pub use alphabet::{Symbol, Word};
pub use coordinates::Coordinates;
pub use transition::Transition;
pub use wfa::{ColorRepresentation, Resolution, Wfa};
