//! Raster loading, plane layout and export
//!
//! An RGB raster is padded with black to a power-of-two square of side `s`
//! and its three channels are laid out as quadrants of one `2s x 2s`
//! grid. The quadrant holding each channel is fixed by [`PLANE_SYMBOLS`];
//! the fourth quadrant stays black.

use crate::automaton::alphabet::Symbol;
use crate::automaton::wfa::Resolution;
use crate::io::error::{Result, WfaError, invalid_parameter};
use image::{Rgb, RgbImage};
use ndarray::{Array2, s};
use std::path::Path;

/// Quadrant of the concatenated grid holding the red, green and blue plane
pub const PLANE_SYMBOLS: [Symbol; 3] = [Symbol::Two, Symbol::Zero, Symbol::One];

/// Largest channel value
const CHANNEL_MAX: f64 = 255.0;

/// Load an RGB raster from disk
///
/// # Errors
///
/// Returns an error if the file does not exist or cannot be decoded
pub fn load_rgb(path: &Path) -> Result<RgbImage> {
    if !path.exists() {
        return Err(WfaError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let image = image::open(path).map_err(|e| WfaError::ImageLoad {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(image.to_rgb8())
}

/// Split a raster into three channel planes padded with black to `side`
///
/// Planes are indexed `[row, col]` with values in `[0, 255]`.
pub fn split_planes(image: &RgbImage, side: usize) -> [Array2<f64>; 3] {
    let mut planes = [
        Array2::zeros((side, side)),
        Array2::zeros((side, side)),
        Array2::zeros((side, side)),
    ];
    for (col, row, Rgb(channels)) in image.enumerate_pixels() {
        for (plane, channel) in planes.iter_mut().zip(channels) {
            if let Some(cell) = plane.get_mut((row as usize, col as usize)) {
                *cell = f64::from(*channel);
            }
        }
    }
    planes
}

/// Lay the three planes out as quadrants of one grid of twice their side
pub fn concatenate_planes(planes: &[Array2<f64>; 3]) -> Array2<f64> {
    let side = planes.first().map_or(0, Array2::nrows);
    let mut grid = Array2::zeros((2 * side, 2 * side));
    for (plane, symbol) in planes.iter().zip(PLANE_SYMBOLS) {
        let (row, col) = symbol.offset();
        let (top, left) = (row * side, col * side);
        grid.slice_mut(s![top..top + side, left..left + side])
            .assign(plane);
    }
    grid
}

/// Rescale channel values from `[0, 255]` to `[0, 1]` in place
pub fn map_to_unit(grid: &mut Array2<f64>) {
    grid.par_mapv_inplace(|v| v / CHANNEL_MAX);
}

/// Load a raster and prepare the normalised quadrant grid for encoding
///
/// Returns the grid together with the original raster size.
///
/// # Errors
///
/// Returns an error if the raster cannot be loaded or is empty
pub fn prepare_image(path: &Path) -> Result<(Array2<f64>, Resolution)> {
    let image = load_rgb(path)?;
    let resolution = Resolution::new(image.width() as usize, image.height() as usize);
    if resolution.width == 0 || resolution.height == 0 {
        return Err(WfaError::UnsupportedFormat {
            path: path.to_path_buf(),
            reason: "image has no pixels".to_string(),
        });
    }

    let planes = split_planes(&image, resolution.side());
    let mut grid = concatenate_planes(&planes);
    map_to_unit(&mut grid);
    Ok((grid, resolution))
}

/// Block-average a square grid by an integer `ratio`
///
/// Each output pixel is the mean of a `ratio x ratio` block.
///
/// # Errors
///
/// Returns an error if `ratio` is zero or does not divide both sides
pub fn shrink(values: &Array2<f64>, ratio: usize) -> Result<Array2<f64>> {
    let (rows, cols) = values.dim();
    if ratio == 0 || rows % ratio != 0 || cols % ratio != 0 {
        return Err(invalid_parameter(
            "ratio",
            &ratio,
            &format!("must divide the grid size {rows}x{cols}"),
        ));
    }
    if ratio == 1 {
        return Ok(values.clone());
    }

    let area = (ratio * ratio) as f64;
    let shrunk = values
        .exact_chunks((ratio, ratio))
        .into_iter()
        .map(|block| block.sum() / area)
        .collect::<Vec<_>>();
    Array2::from_shape_vec((rows / ratio, cols / ratio), shrunk)
        .map_err(|e| invalid_parameter("ratio", &ratio, &e))
}

/// Assemble three `[0, 1]` planes into an RGB raster cropped to `resolution`
///
/// Values are scaled to `[0, 255]`, clamped and truncated.
pub fn assemble_rgb(planes: &[Array2<f64>; 3], resolution: Resolution) -> RgbImage {
    let to_channel = |plane: &Array2<f64>, row: usize, col: usize| -> u8 {
        let value = plane.get((row, col)).copied().unwrap_or(0.0);
        (value * CHANNEL_MAX).clamp(0.0, CHANNEL_MAX) as u8
    };
    let [red, green, blue] = planes;

    RgbImage::from_fn(resolution.width as u32, resolution.height as u32, |x, y| {
        let (row, col) = (y as usize, x as usize);
        Rgb([
            to_channel(red, row, col),
            to_channel(green, row, col),
            to_channel(blue, row, col),
        ])
    })
}

/// Mean of every channel plane, used for logging summaries
pub fn plane_means(planes: &[Array2<f64>; 3]) -> [f64; 3] {
    planes.each_ref().map(|plane| plane.mean().unwrap_or(0.0))
}

/// Save a raster, creating parent directories as needed
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the image cannot
/// be written
pub fn save_rgb(image: &RgbImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| WfaError::FileSystem {
            path: parent.to_path_buf(),
            operation: "create directory",
            source: e,
        })?;
    }

    image.save(path).map_err(|e| WfaError::ImageExport {
        path: path.to_path_buf(),
        source: e,
    })
}
