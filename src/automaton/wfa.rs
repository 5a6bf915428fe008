//! The weighted finite automaton aggregate
//!
//! States and transitions live in append-only arenas indexed by id. The
//! search backtracks by truncating both arenas to a saved [`Watermark`]
//! instead of removing individual nodes.

use crate::algorithm::evaluation::create_base_images;
use crate::automaton::base::base_transitions;
use crate::automaton::state::{State, StateImage};
use crate::automaton::transition::Transition;
use crate::io::configuration::ROOT_STATE_ID;
use crate::io::error::{Result, dimension_mismatch, invalid_parameter};
use crate::math::linalg::{Matrix, Vector};
use ndarray::{Array2, s};

/// Colour model the planes of an automaton are expressed in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ColorRepresentation {
    /// Red, green and blue planes
    #[default]
    Rgb = 0,
    /// Luma and two chroma planes
    Yuv = 1,
}

impl ColorRepresentation {
    /// Tag byte written to the file header
    pub const fn to_byte(self) -> u8 {
        self as u8
    }

    /// Representation for a header tag byte
    pub const fn from_byte(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Rgb),
            1 => Some(Self::Yuv),
            _ => None,
        }
    }
}

/// Width and height of the raster an automaton reconstructs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
}

impl Resolution {
    /// Create a resolution
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Quadtree depth needed to cover the raster: `ceil(log2(max(w, h)))`
    pub const fn power(self) -> usize {
        let max = if self.width > self.height {
            self.width
        } else {
            self.height
        };
        if max <= 1 {
            0
        } else {
            (usize::BITS - (max - 1).leading_zeros()) as usize
        }
    }

    /// Side of the power-of-two working square
    pub const fn side(self) -> usize {
        1 << self.power()
    }

    /// Resolution after block-averaging by `ratio`, never below one pixel
    #[must_use]
    pub fn downscaled(self, ratio: usize) -> Self {
        let ratio = ratio.max(1);
        Self::new((self.width / ratio).max(1), (self.height / ratio).max(1))
    }
}

/// Saved arena lengths to roll back to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Watermark {
    states: usize,
    transitions: usize,
}

impl Watermark {
    /// Number of states at the time the mark was taken
    pub const fn states(self) -> usize {
        self.states
    }
}

/// Weighted finite automaton describing one image
#[derive(Clone, Debug)]
pub struct Wfa {
    color_representation: ColorRepresentation,
    resolution: Resolution,
    number_of_states: usize,
    states: Vec<State>,
    transitions: Vec<Transition>,
    final_distribution: Vector,
}

impl Wfa {
    /// Empty automaton for encoding
    pub fn new(resolution: Resolution, color_representation: ColorRepresentation) -> Self {
        Self {
            color_representation,
            resolution,
            number_of_states: 0,
            states: Vec::new(),
            transitions: Vec::new(),
            final_distribution: Vector::zeros(0),
        }
    }

    /// Automaton rebuilt from persisted parts, without state images
    ///
    /// # Errors
    ///
    /// Returns an error if the final distribution length differs from the
    /// state count
    pub fn from_parts(
        color_representation: ColorRepresentation,
        resolution: Resolution,
        final_distribution: Vector,
        transitions: Vec<Transition>,
    ) -> Result<Self> {
        let number_of_states = final_distribution.len();
        if let Some(t) = transitions
            .iter()
            .find(|t| t.from >= number_of_states || t.to >= number_of_states)
        {
            return Err(invalid_parameter(
                "transition",
                t,
                &format!("automaton has {number_of_states} states"),
            ));
        }
        Ok(Self {
            color_representation,
            resolution,
            number_of_states,
            states: Vec::new(),
            transitions,
            final_distribution,
        })
    }

    /// Colour model tag
    pub const fn color_representation(&self) -> ColorRepresentation {
        self.color_representation
    }

    /// Target raster size
    pub const fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Number of states, kept in sync with every add and rollback
    pub const fn number_of_states(&self) -> usize {
        self.number_of_states
    }

    /// States with images, ordered by id (empty for a loaded automaton)
    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// All transitions in insertion order
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// One scalar per state closing every matrix chain
    pub const fn final_distribution(&self) -> &Vector {
        &self.final_distribution
    }

    /// State with the given id
    ///
    /// # Errors
    ///
    /// Returns an error if no state has this id
    pub fn state(&self, id: usize) -> Result<&State> {
        self.states
            .get(id)
            .ok_or_else(|| invalid_parameter("state", &id, &"no such state"))
    }

    /// Append a provisional state and return its id
    pub fn add_state(&mut self, image: StateImage) -> usize {
        let id = self.states.len();
        self.states.push(State::new(id, image));
        self.number_of_states = self.states.len();
        id
    }

    /// Commit a provisional state as a basis vector
    ///
    /// The state's subtree must be final. Its reproduction pyramid is built
    /// bottom-up from the outgoing transitions: level `k` quadrant `a` is
    /// the weighted sum of level `k - 1` of every state reached by label
    /// `a`, and level 0 is the patch mean.
    ///
    /// # Errors
    ///
    /// Returns an error if no state has this id or a reached state is not
    /// committed at the required size
    pub fn commit(&mut self, id: usize) -> Result<()> {
        let state = self.state(id)?;
        let power = state.highest_resolution().trailing_zeros() as usize;
        let outgoing: Vec<Transition> = self
            .transitions
            .iter()
            .filter(|t| t.from == id)
            .copied()
            .collect();

        let mut pyramid = vec![StateImage::new(Array2::from_elem(
            (1, 1),
            state.image().average(),
        ))?];
        for level in 1..=power {
            let half = 1_usize << (level - 1);
            let mut grid = Array2::<f64>::zeros((2 * half, 2 * half));
            for transition in &outgoing {
                let source = self.state(transition.to)?.image_with_size(half)?;
                let (row, col) = transition.label.offset();
                grid.slice_mut(s![row * half..(row + 1) * half, col * half..(col + 1) * half])
                    .scaled_add(transition.weight, source.values());
            }
            pyramid.push(StateImage::new(grid)?);
        }

        self.states
            .get_mut(id)
            .ok_or_else(|| invalid_parameter("state", &id, &"no such state"))?
            .commit(pyramid)
    }

    /// Append a transition
    pub fn add_transition(&mut self, transition: Transition) {
        self.transitions.push(transition);
    }

    /// Append several transitions
    pub fn add_transitions(&mut self, transitions: impl IntoIterator<Item = Transition>) {
        self.transitions.extend(transitions);
    }

    /// Current arena lengths
    pub fn watermark(&self) -> Watermark {
        Watermark {
            states: self.states.len(),
            transitions: self.transitions.len(),
        }
    }

    /// Drop every state and transition added after `mark`
    ///
    /// Every transition appended after the mark starts or ends in a state
    /// with id at or above `mark.states()`, so truncation removes exactly
    /// the subtree spawned since then.
    pub fn rollback(&mut self, mark: Watermark) {
        self.states.truncate(mark.states);
        self.transitions.truncate(mark.transitions);
        self.number_of_states = self.states.len();
    }

    /// Seed states 0-5 with the bilinear basis images
    ///
    /// Each basis state is rendered at every power-of-two size up to the
    /// working square, so its pyramid comes from the basis automaton itself
    /// rather than from block averaging.
    ///
    /// # Errors
    ///
    /// Returns an error if the basis images cannot be evaluated
    pub fn add_base_states(&mut self) -> Result<()> {
        let levels = (0..=self.resolution.power())
            .map(create_base_images)
            .collect::<Result<Vec<_>>>()?;
        let finest = levels.last().cloned().unwrap_or_default();

        for (index, image) in finest.into_iter().enumerate() {
            let pyramid = levels
                .iter()
                .filter_map(|images| images.get(index).cloned())
                .collect();
            let id = self.add_state(image);
            self.states
                .get_mut(id)
                .ok_or_else(|| invalid_parameter("state", &id, &"no such state"))?
                .commit(pyramid)?;
        }
        Ok(())
    }

    /// Append the fixed transitions of the basis automaton
    pub fn add_base_transitions(&mut self) {
        self.transitions.extend(base_transitions());
    }

    /// Set each state's final weight to its average intensity
    pub fn compute_final_distribution(&mut self) {
        self.final_distribution = Vector::from(
            self.states
                .iter()
                .map(State::average_intensity)
                .collect::<Vec<_>>(),
        );
    }

    /// Unit vector on the root state
    ///
    /// # Errors
    ///
    /// Returns an error if the automaton has no root state
    pub fn initial_distribution(&self) -> Result<Vector> {
        Vector::unit(self.number_of_states, ROOT_STATE_ID)
    }

    /// Dense per-label transition matrices
    ///
    /// Entry `[from, to]` of matrix `label` holds the transition weight;
    /// a repeated (from, to, label) triple keeps the last weight.
    ///
    /// # Errors
    ///
    /// Returns an error if a transition refers to a state outside the
    /// automaton
    pub fn transition_matrices(&self) -> Result<[Matrix; 4]> {
        let n = self.number_of_states;
        let mut matrices = [
            Matrix::zeros(n, n),
            Matrix::zeros(n, n),
            Matrix::zeros(n, n),
            Matrix::zeros(n, n),
        ];
        for transition in &self.transitions {
            let matrix = matrices
                .get_mut(transition.label.index())
                .ok_or_else(|| dimension_mismatch("transition label", (4, 1), (1, 1)))?;
            matrix.set(transition.from, transition.to, transition.weight)?;
        }
        Ok(matrices)
    }
}
