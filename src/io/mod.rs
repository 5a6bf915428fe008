/// Command-line interface and file orchestration
pub mod cli;
/// Codec constants and encoder settings
pub mod configuration;
/// Error taxonomy
pub mod error;
/// Binary automaton files
pub mod format;
/// Raster loading, plane layout and export
pub mod image;
/// Progress accounting and terminal bars
pub mod progress;
