//! Linear algebra used by the encoder and decoder

/// Dense matrices, vectors and least squares
pub mod linalg;

pub use linalg::{Matrix, Vector};
