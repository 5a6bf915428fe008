//! CLI entry point for the weighted finite automata image codec

use clap::Parser;
use tracing_subscriber::EnvFilter;
use wfa_codec::io::cli::{Cli, FileProcessor};

fn main() -> wfa_codec::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wfa_codec=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let processor = FileProcessor::new(cli);
    processor.process()
}
