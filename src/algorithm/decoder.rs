//! Reconstruct rasters from automata
//!
//! Each colour plane is the sub-automaton reached through the plane's
//! quadrant symbol from the root state. Planes are rendered with the
//! meet-in-the-middle evaluator at full resolution and block-averaged when
//! a shallower depth is requested.

use crate::algorithm::evaluation::{Half, MidResult, combine, expand};
use crate::automaton::wfa::{Resolution, Wfa};
use crate::io::error::{Result, dimension_mismatch};
use crate::io::format::read_wfa;
use crate::io::image::{PLANE_SYMBOLS, assemble_rgb, plane_means, save_rgb, shrink};
use crate::io::progress::{ProgressCounter, ProgressSink};
use crate::math::linalg::{Matrix, Vector};
use image::RgbImage;
use ndarray::Array2;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// How a reconstruction splits its words and how far it shrinks the result
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodePlan {
    /// Word length covering the full-resolution plane
    pub power: usize,
    /// Effective depth after clamping, at most `power`
    pub depth: usize,
    /// Length of the suffix half of each word
    pub suffix_len: usize,
}

impl DecodePlan {
    /// Plan for a raster of `resolution` decoded at `depth`
    ///
    /// A depth of zero or at least the native depth decodes at full
    /// resolution. The suffix half takes `ceil(depth / 2)` symbols.
    pub const fn new(resolution: Resolution, depth: usize) -> Self {
        let power = resolution.power();
        let depth = if depth == 0 || depth >= power {
            power
        } else {
            depth
        };
        Self {
            power,
            depth,
            suffix_len: depth.div_ceil(2),
        }
    }

    /// Length of the prefix half of each word
    pub const fn prefix_len(self) -> usize {
        self.power - self.suffix_len
    }

    /// Side of the full-resolution plane
    pub const fn side(self) -> usize {
        1 << self.power
    }

    /// Block size the full-resolution planes are averaged over
    pub const fn shrink_ratio(self) -> usize {
        1 << (self.power - self.depth)
    }

    /// Work units: prefix leaves of three planes, suffix leaves, dot
    /// products of three planes and output pixels
    pub const fn total_work(self, output: Resolution) -> u64 {
        let prefixes = 1_u64 << (2 * self.prefix_len());
        let suffixes = 1_u64 << (2 * self.suffix_len);
        let products = 1_u64 << (2 * self.power);
        3 * prefixes + suffixes + 3 * products + (output.width * output.height) as u64
    }
}

/// Evaluator holding the dense form of a loaded automaton
pub struct Decoder {
    wfa: Wfa,
    matrices: [Matrix; 4],
    initial: Vector,
}

impl Decoder {
    /// Build transition matrices and the root initial distribution
    ///
    /// # Errors
    ///
    /// Returns an error if the automaton has no root state or a transition
    /// lies outside it
    pub fn new(wfa: Wfa) -> Result<Self> {
        let matrices = wfa.transition_matrices()?;
        let initial = wfa.initial_distribution()?;
        if wfa.final_distribution().len() != wfa.number_of_states() {
            return Err(dimension_mismatch(
                "final distribution",
                (wfa.number_of_states(), 1),
                (wfa.final_distribution().len(), 1),
            ));
        }
        Ok(Self {
            wfa,
            matrices,
            initial,
        })
    }

    /// Automaton being decoded
    pub const fn wfa(&self) -> &Wfa {
        &self.wfa
    }

    /// Dense transition matrices indexed by label
    pub const fn matrices(&self) -> &[Matrix; 4] {
        &self.matrices
    }

    /// Split and shrink settings for `depth`
    pub const fn plan(&self, depth: usize) -> DecodePlan {
        DecodePlan::new(self.wfa.resolution(), depth)
    }

    /// Resolution of the raster produced at `depth`
    pub fn output_resolution(&self, depth: usize) -> Resolution {
        self.wfa
            .resolution()
            .downscaled(self.plan(depth).shrink_ratio())
    }

    fn prefixes(&self, plane: usize, length: usize, progress: &ProgressCounter<'_>) -> Result<Vec<MidResult>> {
        let symbol = PLANE_SYMBOLS
            .get(plane)
            .copied()
            .ok_or_else(|| dimension_mismatch("colour plane", (PLANE_SYMBOLS.len(), 1), (plane + 1, 1)))?;
        let matrix = self
            .matrices
            .get(symbol.index())
            .ok_or_else(|| dimension_mismatch("transition label", (4, 1), (symbol.index() + 1, 1)))?;
        let seed = self.initial.multiply_matrix(matrix)?;
        expand(&seed, &self.matrices, length, Half::First, progress)
    }

    /// Evaluate the three colour planes at the planned resolution
    ///
    /// The three prefix expansions and the shared suffix expansion run in
    /// parallel. Planes come back in red, green, blue order with values
    /// nominally in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the automaton's dimensions are inconsistent
    pub fn reconstruct_planes(
        &self,
        depth: usize,
        progress: &ProgressCounter<'_>,
    ) -> Result<[Array2<f64>; 3]> {
        let plan = self.plan(depth);
        let start = Instant::now();

        let ((red, green), (blue, suffixes)) = rayon::join(
            || {
                rayon::join(
                    || self.prefixes(0, plan.prefix_len(), progress),
                    || self.prefixes(1, plan.prefix_len(), progress),
                )
            },
            || {
                rayon::join(
                    || self.prefixes(2, plan.prefix_len(), progress),
                    || {
                        expand(
                            self.wfa.final_distribution(),
                            &self.matrices,
                            plan.suffix_len,
                            Half::Second,
                            progress,
                        )
                    },
                )
            },
        );
        let suffixes = suffixes?;
        debug!(
            prefix_len = plan.prefix_len(),
            suffix_len = plan.suffix_len,
            elapsed = ?start.elapsed(),
            "expanded word halves"
        );

        let mut planes = [
            combine(&red?, &suffixes, plan.side(), progress)?,
            combine(&green?, &suffixes, plan.side(), progress)?,
            combine(&blue?, &suffixes, plan.side(), progress)?,
        ];
        debug!(elapsed = ?start.elapsed(), "combined planes");

        let ratio = plan.shrink_ratio();
        if ratio > 1 {
            for plane in &mut planes {
                *plane = shrink(plane, ratio)?;
            }
            debug!(ratio, "averaged planes down to the requested depth");
        }
        Ok(planes)
    }

    /// Reconstruct the RGB raster at `depth`
    ///
    /// # Errors
    ///
    /// Returns an error if the automaton's dimensions are inconsistent
    pub fn to_image(&self, depth: usize, sink: &dyn ProgressSink) -> Result<RgbImage> {
        let output = self.output_resolution(depth);
        let progress = ProgressCounter::new(sink, self.plan(depth).total_work(output));

        let planes = self.reconstruct_planes(depth, &progress)?;
        let image = assemble_rgb(&planes, output);
        progress.advance((output.width * output.height) as u64);
        progress.finish();

        debug!(means = ?plane_means(&planes), "assembled raster");
        Ok(image)
    }
}

/// Decode the automaton at `input` and save the raster to `output`
///
/// `depth` zero decodes at native resolution.
///
/// # Errors
///
/// Returns an error if the automaton cannot be loaded, is inconsistent or
/// the raster cannot be saved
pub fn wfa_to_image(
    input: &Path,
    output: &Path,
    depth: usize,
    sink: &dyn ProgressSink,
) -> Result<RgbImage> {
    let start = Instant::now();
    let wfa = read_wfa(input)?;
    info!(
        input = %input.display(),
        states = wfa.number_of_states(),
        transitions = wfa.transitions().len(),
        "decoding automaton"
    );

    let decoder = Decoder::new(wfa)?;
    let image = decoder.to_image(depth, sink)?;
    save_rgb(&image, output)?;

    info!(
        output = %output.display(),
        width = image.width(),
        height = image.height(),
        elapsed = ?start.elapsed(),
        "decoded automaton"
    );
    Ok(image)
}
