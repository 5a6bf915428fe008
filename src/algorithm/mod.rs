/// Automaton reconstruction into rasters
pub mod decoder;
/// Recursive branch-and-bound image encoder
pub mod encoder;
/// Meet-in-the-middle matrix-chain evaluation
pub mod evaluation;
