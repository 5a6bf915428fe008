//! Error types for encoding, decoding and automaton persistence

use std::fmt;
use std::path::PathBuf;

/// Main error type for all codec operations
#[derive(Debug)]
pub enum WfaError {
    /// Input path does not exist
    FileNotFound {
        /// Path that was looked up
        path: PathBuf,
    },

    /// Input exists but is not something this codec can read
    UnsupportedFormat {
        /// Path of the rejected file
        path: PathBuf,
        /// Why the file was rejected
        reason: String,
    },

    /// Automaton file content is truncated or corrupt
    ///
    /// Raised when the declared state count does not match the file length,
    /// a trailing record is incomplete, or a record refers to an unknown
    /// state or label.
    LoadFailure {
        /// Path of the automaton file
        path: PathBuf,
        /// Description of the inconsistency
        reason: String,
    },

    /// Operands of a linear-algebra operation have incompatible shapes
    DimensionMismatch {
        /// Name of the operation that was attempted
        operation: &'static str,
        /// Shape of the left operand (rows, cols)
        left: (usize, usize),
        /// Shape of the right operand (rows, cols)
        right: (usize, usize),
    },

    /// Parameter validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// Failed to decode a source raster
    ImageLoad {
        /// Path to the image file
        path: PathBuf,
        /// Underlying image loading error
        source: image::ImageError,
    },

    /// Failed to save a reconstructed raster
    ImageExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying image export error
        source: image::ImageError,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

impl fmt::Display for WfaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileNotFound { path } => {
                write!(f, "File '{}' was not found", path.display())
            }
            Self::UnsupportedFormat { path, reason } => {
                write!(f, "Unsupported format of '{}': {reason}", path.display())
            }
            Self::LoadFailure { path, reason } => {
                write!(
                    f,
                    "The automaton '{}' cannot be loaded: {reason}",
                    path.display()
                )
            }
            Self::DimensionMismatch {
                operation,
                left,
                right,
            } => {
                write!(
                    f,
                    "Dimension mismatch in {operation}: {}x{} and {}x{}",
                    left.0, left.1, right.0, right.1
                )
            }
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::ImageLoad { path, source } => {
                write!(f, "Failed to load image '{}': {source}", path.display())
            }
            Self::ImageExport { path, source } => {
                write!(
                    f,
                    "Failed to export image to '{}': {source}",
                    path.display()
                )
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for WfaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ImageLoad { source, .. } | Self::ImageExport { source, .. } => Some(source),
            Self::FileSystem { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for codec results
pub type Result<T> = std::result::Result<T, WfaError>;

impl From<image::ImageError> for WfaError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageLoad {
            path: PathBuf::from("<unknown>"),
            source: err,
        }
    }
}

impl From<std::io::Error> for WfaError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("<unknown>"),
            operation: "unknown",
            source: err,
        }
    }
}

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> WfaError {
    WfaError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create a load failure for a corrupt automaton file
pub fn load_failure(path: impl Into<PathBuf>, reason: &impl ToString) -> WfaError {
    WfaError::LoadFailure {
        path: path.into(),
        reason: reason.to_string(),
    }
}

/// Create a dimension mismatch error from two operand shapes
pub const fn dimension_mismatch(
    operation: &'static str,
    left: (usize, usize),
    right: (usize, usize),
) -> WfaError {
    WfaError::DimensionMismatch {
        operation,
        left,
        right,
    }
}
