//! Meet-in-the-middle evaluation of automaton matrix chains
//!
//! The value of the pixel addressed by `w = w1 ‖ w2` is
//! `I · M_w1[0] · … · M_w1[k] · M_w2[0] · … · M_w2[m] · F`. Instead of
//! evaluating the chain per pixel, the row vectors `I · M_w1` are expanded
//! for every prefix and the column vectors `M_w2 · F` for every suffix;
//! each pixel is then a single dot product.

use crate::automaton::alphabet::{Symbol, Word};
use crate::automaton::base::{base_final_distribution, base_initial_distributions, base_matrices};
use crate::automaton::coordinates::Coordinates;
use crate::automaton::state::StateImage;
use crate::io::error::{Result, dimension_mismatch};
use crate::io::progress::ProgressCounter;
use crate::math::linalg::{Matrix, Vector};
use ndarray::Array2;
use rayon::prelude::*;
use tracing::debug;

/// Leaves credited to the progress counter at once during expansion
const PROGRESS_BATCH: u64 = 256;

/// Partial chain product together with the word it was built from
#[derive(Clone, Debug, PartialEq)]
pub struct MidResult {
    /// Word consumed so far
    pub address: Word,
    /// Row vector (prefix) or column vector (suffix) of the partial product
    pub value: Vector,
}

/// Side of the chain a half is expanded towards
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Half {
    /// Row vectors `I · M_w`, symbols appended
    First,
    /// Column vectors `M_w · F`, symbols prepended
    Second,
}

/// Nodes below the root of a full quadtree of the given depth
///
/// Equals the number of words of length 1 to `depth`.
pub const fn tree_nodes(depth: usize) -> u64 {
    let mut total = 0;
    let mut level = 1;
    let mut index = 0;
    while index < depth {
        level *= 4;
        total += level;
        index += 1;
    }
    total
}

/// Expand `seed` into one partial product per word of length `length`
///
/// Uses an explicit stack: each popped node shorter than `length` pushes its
/// four children, nodes of full length are emitted.
///
/// # Errors
///
/// Returns an error if a matrix does not match the seed's dimension
pub fn expand(
    seed: &Vector,
    matrices: &[Matrix; 4],
    length: usize,
    half: Half,
    progress: &ProgressCounter<'_>,
) -> Result<Vec<MidResult>> {
    let mut results = Vec::with_capacity(1_usize << (2 * length.min(30)));
    let mut stack = vec![MidResult {
        address: Word::new(),
        value: seed.clone(),
    }];
    let mut pending: u64 = 0;

    while let Some(node) = stack.pop() {
        if node.address.len() >= length {
            results.push(node);
            pending += 1;
            if pending == PROGRESS_BATCH {
                progress.advance(pending);
                pending = 0;
            }
            continue;
        }

        for (symbol, matrix) in Symbol::ALL.into_iter().zip(matrices.iter()) {
            let child = match half {
                Half::First => MidResult {
                    address: node.address.appended(symbol),
                    value: node.value.multiply_matrix(matrix)?,
                },
                Half::Second => MidResult {
                    address: node.address.prepended(symbol),
                    value: matrix.multiply_vector(&node.value)?,
                },
            };
            stack.push(child);
        }
    }

    progress.advance(pending);
    Ok(results)
}

/// Combine prefix and suffix products into a `size x size` grid
///
/// Pixel `Coordinates(w1 ‖ w2)` receives `prefix(w1) · suffix(w2)`. The dot
/// products are computed in parallel over the suffix list.
///
/// # Errors
///
/// Returns an error if vector dimensions disagree or a word addresses a
/// pixel outside the grid
pub fn combine(
    first_half: &[MidResult],
    second_half: &[MidResult],
    size: usize,
    progress: &ProgressCounter<'_>,
) -> Result<Array2<f64>> {
    let suffix_len = second_half.first().map_or(0, |sh| sh.address.len());
    let prefix_positions: Vec<Coordinates> = first_half
        .iter()
        .map(|fh| Coordinates::from_word(&fh.address))
        .collect();

    let columns = second_half
        .par_iter()
        .map(|sh| {
            let values = first_half
                .iter()
                .map(|fh| fh.value.dot(&sh.value))
                .collect::<Result<Vec<f64>>>()?;
            progress.advance(values.len() as u64);
            Ok((Coordinates::from_word(&sh.address), values))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut grid = Array2::zeros((size, size));
    for (suffix_position, values) in columns {
        for (prefix_position, value) in prefix_positions.iter().zip(values) {
            let pixel = Coordinates::concatenated(*prefix_position, suffix_position, suffix_len);
            let cell = grid
                .get_mut((pixel.x, pixel.y))
                .ok_or_else(|| dimension_mismatch("pixel placement", (size, size), (pixel.x + 1, pixel.y + 1)))?;
            *cell = value;
        }
    }

    Ok(grid)
}

/// Value of a single word by direct chain multiplication
///
/// Reference for the meet-in-the-middle evaluation.
///
/// # Errors
///
/// Returns an error if the distributions and matrices disagree in size
pub fn evaluate_word(
    initial: &Vector,
    matrices: &[Matrix; 4],
    word: &Word,
    final_distribution: &Vector,
) -> Result<f64> {
    let mut row = initial.clone();
    for symbol in word.symbols() {
        let matrix = matrices
            .get(symbol.index())
            .ok_or_else(|| dimension_mismatch("transition label", (4, 1), (symbol.index() + 1, 1)))?;
        row = row.multiply_matrix(matrix)?;
    }
    row.dot(final_distribution)
}

/// Render `initial` over a `2^power` square with the word split after
/// `power - suffix_len` symbols
///
/// # Errors
///
/// Returns an error if the automaton dimensions disagree
pub fn render(
    initial: &Vector,
    matrices: &[Matrix; 4],
    final_distribution: &Vector,
    power: usize,
    suffix_len: usize,
    progress: &ProgressCounter<'_>,
) -> Result<Array2<f64>> {
    let suffix_len = suffix_len.min(power);
    let (first_half, second_half) = rayon::join(
        || expand(initial, matrices, power - suffix_len, Half::First, progress),
        || expand(final_distribution, matrices, suffix_len, Half::Second, progress),
    );
    combine(&first_half?, &second_half?, 1 << power, progress)
}

/// Render the six bilinear basis images on a `2^power` square
///
/// The six images are evaluated in parallel and share one suffix
/// expansion.
///
/// # Errors
///
/// Returns an error if the basis automaton cannot be evaluated
pub fn create_base_images(power: usize) -> Result<Vec<StateImage>> {
    let suffix_len = power.div_ceil(2);
    let matrices = base_matrices();
    let progress = ProgressCounter::silent(1);

    debug!(size = 1_usize << power, "rendering basis images");

    let second_half = expand(
        &base_final_distribution(),
        &matrices,
        suffix_len,
        Half::Second,
        &progress,
    )?;

    base_initial_distributions()
        .par_iter()
        .map(|initial| {
            let first_half = expand(
                initial,
                &matrices,
                power - suffix_len,
                Half::First,
                &progress,
            )?;
            StateImage::new(combine(&first_half, &second_half, 1 << power, &progress)?)
        })
        .collect()
}
