//! Automaton states and the image patches they own

use crate::automaton::alphabet::Symbol;
use crate::io::error::{Result, invalid_parameter};
use crate::math::linalg::Vector;
use ndarray::{Array1, Array2, s};

/// Immutable square grid of intensities for one image patch
#[derive(Clone, Debug, PartialEq)]
pub struct StateImage {
    values: Array2<f64>,
}

impl StateImage {
    /// Wrap a square grid
    ///
    /// # Errors
    ///
    /// Returns an error if the grid is not square
    pub fn new(values: Array2<f64>) -> Result<Self> {
        let (rows, cols) = values.dim();
        if rows != cols {
            return Err(invalid_parameter(
                "image",
                &format!("{rows}x{cols}"),
                &"state images must be square",
            ));
        }
        Ok(Self { values })
    }

    /// Side length in pixels
    pub fn size(&self) -> usize {
        self.values.nrows()
    }

    /// Borrow the pixel grid
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Pixel at (`row`, `col`), if inside the patch
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get((row, col)).copied()
    }

    /// Sub-grid of half the size selected by `symbol`
    ///
    /// # Errors
    ///
    /// Returns an error if the patch is a single pixel or has odd size
    pub fn quadrant(&self, symbol: Symbol) -> Result<Self> {
        let size = self.size();
        if size < 2 || size % 2 != 0 {
            return Err(invalid_parameter(
                "size",
                &size,
                &"only even-sized patches can be split into quadrants",
            ));
        }

        let half = size / 2;
        let (row, col) = symbol.offset();
        let (top, left) = (row * half, col * half);
        let values = self
            .values
            .slice(s![top..top + half, left..left + half])
            .to_owned();
        Ok(Self { values })
    }

    /// Row-major flattening into a vector of length `size²`
    pub fn to_vector(&self) -> Vector {
        Vector::from(self.values.iter().copied().collect::<Array1<f64>>())
    }

    /// Mean intensity over the patch
    pub fn average(&self) -> f64 {
        self.values.mean().unwrap_or(0.0)
    }
}

/// Node of the automaton owning an image patch
///
/// The patch itself is what the encoder splits into quadrants. Once the
/// state is committed it also carries its reproduction pyramid: level `k`
/// holds the `2^k` square the automaton produces for this state, which is
/// what later quadrants are fitted against.
#[derive(Clone, Debug)]
pub struct State {
    id: usize,
    image: StateImage,
    pyramid: Vec<StateImage>,
}

impl State {
    /// Provisional state that may still be rolled back
    pub const fn new(id: usize, image: StateImage) -> Self {
        Self {
            id,
            image,
            pyramid: Vec::new(),
        }
    }

    /// Dense id, also the row/column index in transition matrices
    pub const fn id(&self) -> usize {
        self.id
    }

    /// Full-resolution patch
    pub const fn image(&self) -> &StateImage {
        &self.image
    }

    /// Side of the full-resolution patch
    pub fn highest_resolution(&self) -> usize {
        self.image.size()
    }

    /// Whether the state is a committed basis vector
    pub const fn is_processed(&self) -> bool {
        !self.pyramid.is_empty()
    }

    /// Commit the state with the images the automaton reproduces for it
    ///
    /// `pyramid[k]` must be the `2^k` square, from a single pixel up to the
    /// full patch size.
    ///
    /// # Errors
    ///
    /// Returns an error if the patch size is not a power of two or a level
    /// has the wrong size
    pub fn commit(&mut self, pyramid: Vec<StateImage>) -> Result<()> {
        let size = self.highest_resolution();
        if !size.is_power_of_two() {
            return Err(invalid_parameter(
                "size",
                &size,
                &"only power-of-two patches can be committed",
            ));
        }

        let levels = size.trailing_zeros() as usize + 1;
        let misplaced = pyramid
            .iter()
            .enumerate()
            .find(|(level, image)| image.size() != 1_usize << *level);
        if pyramid.len() != levels || misplaced.is_some() {
            return Err(invalid_parameter(
                "pyramid",
                &format!("{:?}", pyramid.iter().map(StateImage::size).collect::<Vec<_>>()),
                &format!("state {} needs {levels} levels doubling from 1", self.id),
            ));
        }

        self.pyramid = pyramid;
        Ok(())
    }

    /// Sizes held in the reproduction pyramid, coarsest first
    pub fn pyramid_sizes(&self) -> Vec<usize> {
        self.pyramid.iter().map(StateImage::size).collect()
    }

    /// Reproduced patch at the requested size
    ///
    /// # Errors
    ///
    /// Returns an error if the state is not committed or `size` is not one
    /// of its pyramid levels
    pub fn image_with_size(&self, size: usize) -> Result<&StateImage> {
        self.pyramid
            .iter()
            .find(|image| image.size() == size)
            .ok_or_else(|| {
                invalid_parameter(
                    "size",
                    &size,
                    &format!("state {} has no reproduced image at this size", self.id),
                )
            })
    }

    /// Average intensity used as this state's final-distribution entry
    ///
    /// The single-pixel level of a committed state, otherwise the mean of
    /// the patch.
    pub fn average_intensity(&self) -> f64 {
        self.pyramid
            .first()
            .and_then(|pixel| pixel.get(0, 0))
            .unwrap_or_else(|| self.image.average())
    }
}
