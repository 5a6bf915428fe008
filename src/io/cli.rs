//! Command-line interface for encoding rasters and decoding automata

use crate::algorithm::decoder::wfa_to_image;
use crate::algorithm::encoder::image_to_wfa;
use crate::io::configuration::{DECODED_EXTENSION, WFA_EXTENSION};
use crate::io::error::Result;
use crate::io::progress::{ProgressSink, progress_bar};
use clap::{Parser, Subcommand};
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "wfa")]
#[command(
    author,
    version,
    about = "Compress images with weighted finite automata"
)]
/// Command-line arguments for the codec
pub struct Cli {
    /// Operation to perform
    #[command(subcommand)]
    pub command: Command,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Overwrite the output if it already exists
    #[arg(short, long, global = true)]
    pub force: bool,
}

/// Codec operations
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Encode a raster image into a .wfa automaton
    Encode {
        /// Image to encode
        #[arg(value_name = "IMAGE")]
        input: PathBuf,

        /// Automaton to write (defaults to <IMAGE>.wfa)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Decode a .wfa automaton into a PNG image
    Decode {
        /// Automaton to decode
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Quadtree depth to reconstruct (defaults to full resolution)
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
        depth: Option<u32>,

        /// Image to write (defaults to <FILE>.png)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Command {
    /// Input path of the operation
    pub fn input(&self) -> &Path {
        match self {
            Self::Encode { input, .. } | Self::Decode { input, .. } => input,
        }
    }

    /// Output path, derived from the input when not given
    pub fn output_path(&self) -> PathBuf {
        match self {
            Self::Encode { input, output } => output
                .clone()
                .unwrap_or_else(|| input.with_extension(WFA_EXTENSION)),
            Self::Decode { input, output, .. } => output
                .clone()
                .unwrap_or_else(|| input.with_extension(DECODED_EXTENSION)),
        }
    }

    /// Depth passed to the decoder, zero meaning native resolution
    pub fn decode_depth(&self) -> usize {
        match self {
            Self::Decode {
                depth: Some(depth), ..
            } => *depth as usize,
            _ => 0,
        }
    }
}

impl Cli {
    /// Check if existing output files should be skipped
    pub const fn skip_existing(&self) -> bool {
        !self.force
    }

    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }
}

/// Runs the requested operation with progress display
pub struct FileProcessor {
    cli: Cli,
}

impl FileProcessor {
    /// Create a processor for the parsed arguments
    pub const fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Arguments being processed
    pub const fn cli(&self) -> &Cli {
        &self.cli
    }

    /// Run the operation
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or decoding fails
    pub fn process(&self) -> Result<()> {
        let command = &self.cli.command;
        let output = command.output_path();
        if !self.should_process_file(command.input(), &output) {
            return Ok(());
        }

        let bar = self
            .cli
            .should_show_progress()
            .then(|| progress_bar(&Self::progress_message(command)));
        let sink: &dyn ProgressSink = match &bar {
            Some(progress) => progress,
            None => &(),
        };

        match command {
            Command::Encode { input, .. } => {
                let wfa = image_to_wfa(input, &output, sink)?;
                Self::finish(
                    bar.as_ref(),
                    format!(
                        "Encoded {} ({} states, {} transitions)",
                        output.display(),
                        wfa.number_of_states(),
                        wfa.transitions().len()
                    ),
                );
            }
            Command::Decode { input, .. } => {
                let image = wfa_to_image(input, &output, command.decode_depth(), sink)?;
                Self::finish(
                    bar.as_ref(),
                    format!(
                        "Decoded {} ({}x{})",
                        output.display(),
                        image.width(),
                        image.height()
                    ),
                );
            }
        }
        Ok(())
    }

    fn progress_message(command: &Command) -> String {
        let verb = match command {
            Command::Encode { .. } => "Encoding",
            Command::Decode { .. } => "Decoding",
        };
        let name = command
            .input()
            .file_name()
            .unwrap_or_default()
            .to_string_lossy();
        format!("{verb} {name}")
    }

    fn finish(bar: Option<&ProgressBar>, message: String) {
        if let Some(bar) = bar {
            bar.finish_with_message(message);
        }
    }

    fn should_process_file(&self, input_path: &Path, output_path: &Path) -> bool {
        if !self.cli.skip_existing() || !output_path.exists() {
            return true;
        }

        // Allow print for user feedback when an output is kept
        #[allow(clippy::print_stderr)]
        if !self.cli.quiet {
            eprintln!(
                "Skipping: {} ({} exists, use --force to overwrite)",
                input_path.display(),
                output_path.display()
            );
        }
        false
    }
}
