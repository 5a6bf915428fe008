//! Lossy image compression with weighted finite automata
//!
//! An image is encoded as a small weighted automaton whose states stand for
//! quadtree patches; the value of a pixel is a matrix-chain product along
//! the quadtree address of that pixel. Encoding searches the quadtree with
//! branch and bound, decoding evaluates the chains meet-in-the-middle.

#![deny(unsafe_code)]

/// Encoder, decoder and the shared chain evaluator
pub mod algorithm;
/// Automaton model and quadtree addressing
pub mod automaton;
/// Input/output operations, configuration and error handling
pub mod io;
/// Dense linear algebra
pub mod math;

pub use io::error::{Result, WfaError};
