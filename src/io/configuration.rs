//! Codec constants and runtime configuration defaults

// Encoder acceptance criteria
/// Squared residual below which a least-squares fit replaces a new state
pub const LEAST_SQUARES_THRESHOLD: f64 = 1e-3;

/// Decimal places a coefficient is rounded to before being dropped as zero
pub const COEFFICIENT_DECIMALS: i32 = 15;

/// Squared error accepted as an exact scalar-multiple match
pub const EXACT_MATCH_TOLERANCE: f64 = 1e-20;

// Fixed automaton layout shared by encoder and decoder
/// Number of bilinear basis states seeded before encoding
pub const BASE_STATE_COUNT: usize = 6;

/// State id assigned to the whole prepared image
pub const ROOT_STATE_ID: usize = BASE_STATE_COUNT;

// Persistence
/// Size of the read and write chunks used for automaton files
pub const CHUNK_SIZE: usize = 4096;

/// Largest quadtree depth a loaded automaton may declare (8192 pixels a side)
pub const MAX_RESOLUTION_POWER: usize = 13;

/// Extension of persisted automata
pub const WFA_EXTENSION: &str = "wfa";

/// Extension of reconstructed rasters
pub const DECODED_EXTENSION: &str = "png";

// Progress display settings
/// Number of discrete steps a progress fraction is quantised to
pub const PROGRESS_RESOLUTION: u64 = 1000;

/// Width of progress bars in characters
pub const PROGRESS_BAR_WIDTH: u16 = 40;

/// Parameters of the quadtree search
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EncoderConfig {
    /// Squared residual below which a linear combination is accepted
    pub error_threshold: f64,
    /// Decimal places a coefficient must survive to become a transition
    pub coefficient_decimals: i32,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            error_threshold: LEAST_SQUARES_THRESHOLD,
            coefficient_decimals: COEFFICIENT_DECIMALS,
        }
    }
}
