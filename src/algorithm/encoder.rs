//! Branch-and-bound search turning an image into an automaton
//!
//! Every quadrant of a state is either expressed as a linear combination of
//! already committed states or given a state of its own, whichever costs
//! fewer transitions. The second option is explored recursively under a
//! budget derived from the first, and discarded by rolling the automaton
//! back when it loses.
//!
//! Fits are taken against the images the automaton reproduces for each
//! committed state, so an accepted residual is also the decoded error of
//! that quadrant.

use crate::algorithm::evaluation::tree_nodes;
use crate::automaton::alphabet::Symbol;
use crate::automaton::state::StateImage;
use crate::automaton::transition::Transition;
use crate::automaton::wfa::{ColorRepresentation, Resolution, Wfa};
use crate::io::configuration::{EXACT_MATCH_TOLERANCE, EncoderConfig, ROOT_STATE_ID};
use crate::io::error::{Result, invalid_parameter};
use crate::io::format::write_wfa;
use crate::io::image::prepare_image;
use crate::io::progress::{ProgressCounter, ProgressSink};
use crate::math::linalg::{Matrix, Vector};
use ndarray::Array2;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, trace};

/// Relative spread tolerated between per-element ratios of an exact match
const RATIO_TOLERANCE: f64 = 1e-12;

/// Scalar `r` with `r * candidate == target`, if one exists
///
/// Both vectors must vanish at the same positions and every non-zero pair
/// must have the same ratio. A zero ratio is never reported.
pub fn exact_ratio(target: &Vector, candidate: &Vector) -> Option<f64> {
    if target.len() != candidate.len() {
        return None;
    }

    let mut ratio: Option<f64> = None;
    for (b, v) in target.as_array().iter().zip(candidate.as_array()) {
        match (*b == 0.0, *v == 0.0) {
            (true, true) => {}
            (false, false) => {
                let current = b / v;
                match ratio {
                    None => ratio = Some(current),
                    Some(first)
                        if (first - current).abs() <= RATIO_TOLERANCE * first.abs() => {}
                    Some(_) => return None,
                }
            }
            _ => return None,
        }
    }
    ratio.filter(|r| r.is_finite() && *r != 0.0)
}

/// Round to the given number of decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10_f64.powi(decimals);
    (value * scale).round() / scale
}

/// Recursive encoder owning the automaton under construction
pub struct Encoder<'a> {
    wfa: Wfa,
    config: EncoderConfig,
    depth: usize,
    progress: ProgressCounter<'a>,
}

impl<'a> Encoder<'a> {
    /// Prepare the search over a normalised quadrant grid
    ///
    /// `grid` must be the square of side `2 * resolution.side()` holding the
    /// colour planes. The basis states and the root state are created here.
    ///
    /// # Errors
    ///
    /// Returns an error if the grid has the wrong shape or the basis images
    /// cannot be rendered
    pub fn new(
        grid: Array2<f64>,
        resolution: Resolution,
        config: EncoderConfig,
        sink: &'a dyn ProgressSink,
    ) -> Result<Self> {
        let expected = 2 * resolution.side();
        if grid.dim() != (expected, expected) {
            let (rows, cols) = grid.dim();
            return Err(invalid_parameter(
                "image",
                &format!("{rows}x{cols}"),
                &format!("expected a {expected}x{expected} grid of colour planes"),
            ));
        }

        let start = Instant::now();
        let mut wfa = Wfa::new(resolution, ColorRepresentation::Rgb);
        wfa.add_base_states()?;
        debug!(elapsed = ?start.elapsed(), "basis states ready");

        let root = wfa.add_state(StateImage::new(grid)?);
        if root != ROOT_STATE_ID {
            return Err(invalid_parameter(
                "root",
                &root,
                &format!("the whole image must be state {ROOT_STATE_ID}"),
            ));
        }

        let depth = resolution.power() + 1;
        Ok(Self {
            wfa,
            config,
            depth,
            progress: ProgressCounter::new(sink, tree_nodes(depth)),
        })
    }

    /// Quadtree depth of the root state
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Automaton built so far
    pub const fn wfa(&self) -> &Wfa {
        &self.wfa
    }

    /// Progress of the search
    pub const fn progress(&self) -> &ProgressCounter<'a> {
        &self.progress
    }

    /// Run the search from the root with an unlimited budget
    ///
    /// Returns the number of transitions the root subtree costs.
    ///
    /// # Errors
    ///
    /// Returns an error if a linear-algebra step fails
    pub fn run(&mut self) -> Result<f64> {
        let start = Instant::now();
        let cost = self.make_wfa(ROOT_STATE_ID, f64::INFINITY, self.depth)?;
        self.progress.finish();
        debug!(
            cost,
            states = self.wfa.number_of_states(),
            elapsed = ?start.elapsed(),
            "search finished"
        );
        Ok(cost)
    }

    /// Finish the automaton with the basis transitions and the final
    /// distribution
    pub fn into_wfa(mut self) -> Wfa {
        self.wfa.add_base_transitions();
        self.wfa.compute_final_distribution();
        self.wfa
    }

    /// Encode the subtree of `state` at most `budget` transitions deep
    ///
    /// Returns the transition cost, or infinity if the budget cannot be met
    /// or `depth` is exhausted. Every quadtree node below `state` is
    /// credited to the progress counter exactly once, visited or pruned.
    ///
    /// # Errors
    ///
    /// Returns an error if `state` does not exist or a linear-algebra step
    /// fails
    pub fn make_wfa(&mut self, state: usize, budget: f64, depth: usize) -> Result<f64> {
        if budget <= 0.0 || depth == 0 {
            self.progress.advance(tree_nodes(depth));
            return Ok(f64::INFINITY);
        }

        let mut cost = 0.0;
        for (position, symbol) in Symbol::ALL.into_iter().enumerate() {
            let quadrant = self.wfa.state(state)?.image().quadrant(symbol)?;
            let (transitions, cost1) = self.find_linear_combination(state, &quadrant, symbol)?;

            let mark = self.wfa.watermark();
            let child = self.wfa.add_state(quadrant);
            self.wfa
                .add_transition(Transition::new(state, child, symbol, 1.0));

            let cost2 = self.make_wfa(child, (budget - cost - 1.0).min(cost1 - 1.0), depth - 1)?;

            if cost1 < cost2 {
                self.wfa.rollback(mark);
                self.wfa.add_transitions(transitions);
                cost += cost1;
            } else {
                if cost2.is_finite() {
                    self.wfa.commit(child)?;
                }
                cost += cost2;
            }
            trace!(state, %symbol, depth, cost1, cost2, "quadrant decided");

            self.progress.advance(1);

            if cost > budget || (cost1.is_infinite() && cost2.is_infinite()) {
                let skipped = (Symbol::ALL.len() - position - 1) as u64;
                self.progress
                    .advance(skipped * (1 + tree_nodes(depth - 1)));
                return Ok(f64::INFINITY);
            }
        }

        Ok(if cost < budget { cost } else { f64::INFINITY })
    }

    /// Express `quadrant` through committed states
    ///
    /// Tries an exact scalar multiple of one state first (cost one), then a
    /// least-squares fit over all committed states at least as large as the
    /// quadrant. Returns the transitions from `parent` labelled `label` and
    /// their count, or infinity as cost if the fit is not good enough.
    ///
    /// # Errors
    ///
    /// Returns an error if a committed state lacks the quadrant size in its
    /// pyramid
    pub fn find_linear_combination(
        &self,
        parent: usize,
        quadrant: &StateImage,
        label: Symbol,
    ) -> Result<(Vec<Transition>, f64)> {
        let size = quadrant.size();
        let target = quadrant.to_vector();

        let mut candidates = Vec::new();
        let mut columns = Vec::new();
        for state in self
            .wfa
            .states()
            .iter()
            .filter(|s| s.is_processed() && s.highest_resolution() >= size)
        {
            let id = state.id();
            let column = state.image_with_size(size)?.to_vector();

            if let Some(ratio) = exact_ratio(&target, &column)
                && column.scale(ratio).square_error(&target)? <= EXACT_MATCH_TOLERANCE
            {
                return Ok((vec![Transition::new(parent, id, label, ratio)], 1.0));
            }
            candidates.push(id);
            columns.push(column);
        }

        // Keep the system over-determined, but always allow one column
        let width = columns.len().min(target.len().saturating_sub(1).max(1));
        columns.truncate(width);
        candidates.truncate(width);

        let design = Matrix::from_columns(target.len(), &columns)?;
        let coefficients = design.solve_least_squares(&target)?;
        let residual = design
            .multiply_vector(&coefficients)?
            .square_error(&target)?;

        let transitions: Vec<Transition> = candidates
            .iter()
            .zip(coefficients.as_array())
            .filter(|(_, weight)| round_to(**weight, self.config.coefficient_decimals) != 0.0)
            .map(|(id, weight)| Transition::new(parent, *id, label, *weight))
            .collect();

        let cost = if residual < self.config.error_threshold {
            transitions.len() as f64
        } else {
            f64::INFINITY
        };
        Ok((transitions, cost))
    }
}

/// Encode a prepared quadrant grid into an automaton
///
/// # Errors
///
/// Returns an error if the grid does not match `resolution` or the search
/// fails
pub fn encode_image(
    grid: Array2<f64>,
    resolution: Resolution,
    config: EncoderConfig,
    sink: &dyn ProgressSink,
) -> Result<Wfa> {
    let mut encoder = Encoder::new(grid, resolution, config, sink)?;
    encoder.run()?;
    Ok(encoder.into_wfa())
}

/// Encode the raster at `input` and persist the automaton to `output`
///
/// # Errors
///
/// Returns an error if the raster cannot be loaded, the search fails or
/// the automaton cannot be written
pub fn image_to_wfa(input: &Path, output: &Path, sink: &dyn ProgressSink) -> Result<Wfa> {
    let start = Instant::now();
    let (grid, resolution) = prepare_image(input)?;
    info!(
        input = %input.display(),
        width = resolution.width,
        height = resolution.height,
        "encoding image"
    );

    let wfa = encode_image(grid, resolution, EncoderConfig::default(), sink)?;
    write_wfa(&wfa, output)?;

    info!(
        output = %output.display(),
        states = wfa.number_of_states(),
        transitions = wfa.transitions().len(),
        elapsed = ?start.elapsed(),
        "encoded image"
    );
    Ok(wfa)
}
