//! Dense matrix and vector types with shape-checked products
//!
//! Every product validates operand shapes and reports a
//! [`WfaError::DimensionMismatch`](crate::WfaError::DimensionMismatch)
//! instead of panicking. Least squares is solved through a one-sided Jacobi
//! SVD so that rank-deficient systems yield the minimum-norm solution.

use crate::io::error::{Result, dimension_mismatch, invalid_parameter};
use ndarray::{Array1, Array2, ArrayView1, Axis, Zip, s};
use rayon::prelude::*;

/// Sweeps after which the Jacobi iteration gives up converging further
const MAX_JACOBI_SWEEPS: usize = 64;

/// Relative off-diagonal magnitude treated as already orthogonal
const JACOBI_TOLERANCE: f64 = 1e-13;

/// Dense real column vector
///
/// Also used as a row vector on the left of a matrix product
/// ([`Vector::multiply_matrix`]).
#[derive(Clone, Debug, PartialEq)]
pub struct Vector {
    values: Array1<f64>,
}

impl Vector {
    /// Zero vector of the given length
    pub fn zeros(len: usize) -> Self {
        Self {
            values: Array1::zeros(len),
        }
    }

    /// Vector with a single one at `index`
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is not smaller than `len`
    pub fn unit(len: usize, index: usize) -> Result<Self> {
        let mut vector = Self::zeros(len);
        let cell = vector.values.get_mut(index).ok_or_else(|| {
            invalid_parameter("index", &index, &format!("unit vector has length {len}"))
        })?;
        *cell = 1.0;
        Ok(vector)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the vector has no entries
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entry at `index`, if present
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    /// Borrow the underlying array
    pub const fn as_array(&self) -> &Array1<f64> {
        &self.values
    }

    /// Entries as a plain vector
    pub fn to_vec(&self) -> Vec<f64> {
        self.values.to_vec()
    }

    /// Multiply every entry by `factor`
    #[must_use]
    pub fn scale(&self, factor: f64) -> Self {
        Self {
            values: self.values.mapv(|v| v * factor),
        }
    }

    /// Inner product
    ///
    /// # Errors
    ///
    /// Returns an error if the vectors differ in length
    pub fn dot(&self, other: &Self) -> Result<f64> {
        if self.len() != other.len() {
            return Err(dimension_mismatch(
                "dot product",
                (1, self.len()),
                (other.len(), 1),
            ));
        }
        Ok(self.values.dot(&other.values))
    }

    /// Row vector times matrix
    ///
    /// # Errors
    ///
    /// Returns an error if the vector length differs from the matrix row count
    pub fn multiply_matrix(&self, matrix: &Matrix) -> Result<Self> {
        if self.len() != matrix.rows() {
            return Err(dimension_mismatch(
                "vector-matrix product",
                (1, self.len()),
                matrix.shape(),
            ));
        }
        Ok(Self {
            values: self.values.dot(&matrix.values),
        })
    }

    /// Sum of squared differences, evaluated in parallel
    ///
    /// # Errors
    ///
    /// Returns an error if the vectors differ in length
    pub fn square_error(&self, other: &Self) -> Result<f64> {
        if self.len() != other.len() {
            return Err(dimension_mismatch(
                "square error",
                (self.len(), 1),
                (other.len(), 1),
            ));
        }
        let squares = Zip::from(&self.values)
            .and(&other.values)
            .par_map_collect(|&a, &b| (a - b) * (a - b));
        Ok(squares.sum())
    }
}

impl From<Vec<f64>> for Vector {
    fn from(values: Vec<f64>) -> Self {
        Self {
            values: Array1::from(values),
        }
    }
}

impl From<Array1<f64>> for Vector {
    fn from(values: Array1<f64>) -> Self {
        Self { values }
    }
}

/// Dense real matrix stored row-major
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix {
    values: Array2<f64>,
}

impl Matrix {
    /// Zero matrix with the given shape
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            values: Array2::zeros((rows, cols)),
        }
    }

    /// Stack equally long vectors side by side as matrix columns
    ///
    /// Rows are filled in parallel.
    ///
    /// # Errors
    ///
    /// Returns an error if the vectors differ in length from `rows`
    pub fn from_columns(rows: usize, columns: &[Vector]) -> Result<Self> {
        if let Some(column) = columns.iter().find(|c| c.len() != rows) {
            return Err(dimension_mismatch(
                "column concatenation",
                (rows, columns.len()),
                (column.len(), 1),
            ));
        }

        let mut values = Array2::zeros((rows, columns.len()));
        values
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(row, mut lane)| {
                for (column, cell) in columns.iter().zip(lane.iter_mut()) {
                    *cell = column.get(row).unwrap_or(0.0);
                }
            });

        Ok(Self { values })
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.values.nrows()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.values.ncols()
    }

    /// Shape as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.values.dim()
    }

    /// Entry at (`row`, `col`), if present
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get((row, col)).copied()
    }

    /// Overwrite entry at (`row`, `col`)
    ///
    /// # Errors
    ///
    /// Returns an error if the position lies outside the matrix
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        let shape = self.shape();
        let cell = self
            .values
            .get_mut((row, col))
            .ok_or_else(|| dimension_mismatch("matrix write", shape, (row + 1, col + 1)))?;
        *cell = value;
        Ok(())
    }

    /// Borrow the underlying array
    pub const fn as_array(&self) -> &Array2<f64> {
        &self.values
    }

    /// Transposed copy
    #[must_use]
    pub fn transpose(&self) -> Self {
        Self {
            values: self.values.t().to_owned(),
        }
    }

    /// Multiply every entry by `factor`
    #[must_use]
    pub fn scale(&self, factor: f64) -> Self {
        Self {
            values: self.values.mapv(|v| v * factor),
        }
    }

    /// Matrix product `self * other`
    ///
    /// # Errors
    ///
    /// Returns an error if the column count of `self` differs from the row
    /// count of `other`
    pub fn multiply(&self, other: &Self) -> Result<Self> {
        if self.cols() != other.rows() {
            return Err(dimension_mismatch(
                "matrix product",
                self.shape(),
                other.shape(),
            ));
        }
        Ok(Self {
            values: self.values.dot(&other.values),
        })
    }

    /// Matrix times column vector
    ///
    /// # Errors
    ///
    /// Returns an error if the column count differs from the vector length
    pub fn multiply_vector(&self, vector: &Vector) -> Result<Vector> {
        if self.cols() != vector.len() {
            return Err(dimension_mismatch(
                "matrix-vector product",
                self.shape(),
                (vector.len(), 1),
            ));
        }
        Ok(Vector::from(self.values.dot(vector.as_array())))
    }

    /// Minimum-norm least-squares solution of `self * x ≈ b`
    ///
    /// Singular values below `max(rows, cols) * eps * sigma_max` are treated
    /// as zero, so under-determined and rank-deficient systems are solved as
    /// well.
    ///
    /// # Errors
    ///
    /// Returns an error if the row count differs from the length of `b`
    pub fn solve_least_squares(&self, b: &Vector) -> Result<Vector> {
        if self.rows() != b.len() {
            return Err(dimension_mismatch(
                "least squares",
                self.shape(),
                (b.len(), 1),
            ));
        }

        let (scaled_left, right_vectors) = jacobi_svd(&self.values);
        let sigmas: Vec<f64> = scaled_left
            .columns()
            .into_iter()
            .map(|column| column.dot(&column).sqrt())
            .collect();
        let sigma_max = sigmas.iter().copied().fold(0.0_f64, f64::max);
        let cutoff = sigma_max * self.rows().max(self.cols()) as f64 * f64::EPSILON;

        let mut solution = Array1::zeros(self.cols());
        for ((sigma, left), right) in sigmas
            .iter()
            .zip(scaled_left.columns())
            .zip(right_vectors.columns())
        {
            if *sigma <= cutoff || *sigma == 0.0 {
                continue;
            }
            let coefficient = left.dot(b.as_array()) / (sigma * sigma);
            solution.scaled_add(coefficient, &right);
        }

        Ok(Vector::from(solution))
    }
}

impl From<Array2<f64>> for Matrix {
    fn from(values: Array2<f64>) -> Self {
        Self { values }
    }
}

// One-sided Jacobi: returns (U * Sigma, V) with A * V = U * Sigma
fn jacobi_svd(matrix: &Array2<f64>) -> (Array2<f64>, Array2<f64>) {
    let mut left = matrix.clone();
    let cols = left.ncols();
    let mut right = Array2::eye(cols);

    for _ in 0..MAX_JACOBI_SWEEPS {
        let mut rotated = false;

        for p in 0..cols {
            for q in (p + 1)..cols {
                let (alpha, beta, gamma) = column_products(left.column(p), left.column(q));
                if gamma == 0.0 || gamma.abs() <= JACOBI_TOLERANCE * (alpha * beta).sqrt() {
                    continue;
                }
                rotated = true;

                let zeta = (beta - alpha) / (2.0 * gamma);
                let t = zeta.signum() / (zeta.abs() + zeta.mul_add(zeta, 1.0).sqrt());
                let c = 1.0 / t.mul_add(t, 1.0).sqrt();
                let s = c * t;

                rotate_columns(&mut left, p, q, c, s);
                rotate_columns(&mut right, p, q, c, s);
            }
        }

        if !rotated {
            break;
        }
    }

    (left, right)
}

fn column_products(p: ArrayView1<'_, f64>, q: ArrayView1<'_, f64>) -> (f64, f64, f64) {
    (p.dot(&p), q.dot(&q), p.dot(&q))
}

fn rotate_columns(matrix: &mut Array2<f64>, p: usize, q: usize, c: f64, s: f64) {
    let (mut first, mut second) = matrix.multi_slice_mut((s![.., p], s![.., q]));
    Zip::from(&mut first).and(&mut second).for_each(|x, y| {
        let (xp, yq) = (*x, *y);
        *x = c.mul_add(xp, -s * yq);
        *y = s.mul_add(xp, c * yq);
    });
}
