pub mod decoder;
pub mod evaluation;
