//! Fixed six-state automaton generating the bilinear basis images
//!
//! States 0-5 of every encoded automaton are this automaton. Their internal
//! transitions are never persisted; they are rebuilt from these tables when
//! a file is loaded.

use crate::automaton::alphabet::Symbol;
use crate::automaton::transition::Transition;
use crate::io::configuration::BASE_STATE_COUNT;
use crate::math::linalg::{Matrix, Vector};
use ndarray::Array2;

type BaseTable = [[f64; BASE_STATE_COUNT]; BASE_STATE_COUNT];

/// Transition tables indexed by symbol label
pub const BASE_MATRICES: [BaseTable; 4] = [
    [
        [1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        [0.0, 0.5, 0.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 0.5, 0.0, 0.0, 0.0],
        [0.0, 0.0, 0.0, 0.25, 0.0, 0.0],
        [0.0, 0.0, 0.0, 0.0, 0.25, 0.0],
        [0.0, 0.0, 0.0, 0.0, 0.0, 0.25],
    ],
    [
        [1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        [0.5, 0.5, 0.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 0.5, 0.0, 0.0, 0.0],
        [0.0, 0.0, 0.25, 0.25, 0.0, 0.0],
        [0.25, 0.5, 0.0, 0.0, 0.25, 0.0],
        [0.0, 0.0, 0.0, 0.0, 0.0, 0.25],
    ],
    [
        [1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        [0.0, 0.5, 0.0, 0.0, 0.0, 0.0],
        [0.5, 0.0, 0.5, 0.0, 0.0, 0.0],
        [0.0, 0.25, 0.0, 0.25, 0.0, 0.0],
        [0.0, 0.0, 0.0, 0.0, 0.25, 0.0],
        [0.25, 0.0, 0.5, 0.0, 0.0, 0.25],
    ],
    [
        [1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        [0.5, 0.5, 0.0, 0.0, 0.0, 0.0],
        [0.5, 0.0, 0.5, 0.0, 0.0, 0.0],
        [0.25, 0.25, 0.25, 0.25, 0.0, 0.0],
        [0.25, 0.5, 0.0, 0.0, 0.25, 0.0],
        [0.25, 0.0, 0.5, 0.0, 0.0, 0.25],
    ],
];

/// Final distribution of the basis automaton
pub const BASE_FINAL_DISTRIBUTION: [f64; BASE_STATE_COUNT] = [1.0, 0.5, 0.5, 0.25, 0.5, 0.5];

/// Basis transition matrices as dense 6x6 matrices, indexed by label
pub fn base_matrices() -> [Matrix; 4] {
    BASE_MATRICES.map(|table| {
        Matrix::from(Array2::from_shape_fn(
            (BASE_STATE_COUNT, BASE_STATE_COUNT),
            |(row, col)| {
                table
                    .get(row)
                    .and_then(|cells| cells.get(col))
                    .copied()
                    .unwrap_or(0.0)
            },
        ))
    })
}

/// Final distribution of the basis automaton as a vector
pub fn base_final_distribution() -> Vector {
    Vector::from(BASE_FINAL_DISTRIBUTION.to_vec())
}

/// Unit initial distributions selecting each basis image in turn
pub fn base_initial_distributions() -> Vec<Vector> {
    (0..BASE_STATE_COUNT)
        .map(|index| {
            let mut values = vec![0.0; BASE_STATE_COUNT];
            if let Some(cell) = values.get_mut(index) {
                *cell = 1.0;
            }
            Vector::from(values)
        })
        .collect()
}

/// Non-zero entries of the basis tables as transitions
///
/// These are appended to every automaton loaded from disk.
pub fn base_transitions() -> Vec<Transition> {
    Symbol::ALL
        .into_iter()
        .zip(BASE_MATRICES.iter())
        .flat_map(|(symbol, table)| {
            table.iter().enumerate().flat_map(move |(from, row)| {
                row.iter()
                    .enumerate()
                    .filter(|(_, weight)| **weight != 0.0)
                    .map(move |(to, weight)| Transition::new(from, to, symbol, *weight))
            })
        })
        .collect()
}
