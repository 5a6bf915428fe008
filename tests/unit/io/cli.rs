//! Tests for command-line parsing and output handling

#[cfg(test)]
mod tests {
    use clap::Parser;
    use std::path::PathBuf;
    use wfa_codec::io::cli::{Cli, Command, FileProcessor};

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("valid arguments")
    }

    // Tests encode derives its output from the input
    // Verified by keeping the input extension
    #[test]
    fn test_encode_default_output() {
        let cli = parse(&["wfa", "encode", "photos/cat.png"]);

        assert_eq!(cli.command.input(), PathBuf::from("photos/cat.png"));
        assert_eq!(cli.command.output_path(), PathBuf::from("photos/cat.wfa"));
        assert_eq!(cli.command.decode_depth(), 0);
        assert!(cli.should_show_progress());
        assert!(cli.skip_existing());
    }

    // Tests decode options are parsed
    // Verified by ignoring the depth flag
    #[test]
    fn test_decode_options() {
        let cli = parse(&["wfa", "decode", "cat.wfa", "--depth", "3", "-o", "small.png"]);

        assert_eq!(
            cli.command,
            Command::Decode {
                input: PathBuf::from("cat.wfa"),
                depth: Some(3),
                output: Some(PathBuf::from("small.png")),
            }
        );
        assert_eq!(cli.command.decode_depth(), 3);
        assert_eq!(cli.command.output_path(), PathBuf::from("small.png"));

        let default = parse(&["wfa", "decode", "cat.wfa"]);
        assert_eq!(default.command.output_path(), PathBuf::from("cat.png"));
    }

    // Tests a zero depth is rejected at parse time
    // Verified by widening the accepted range to zero
    #[test]
    fn test_zero_depth_rejected() {
        assert!(Cli::try_parse_from(["wfa", "decode", "cat.wfa", "--depth", "0"]).is_err());
        assert!(Cli::try_parse_from(["wfa", "decode", "cat.wfa", "--depth", "-2"]).is_err());
    }

    // Tests an existing output is kept unless forced
    // Verified by processing regardless of existing output
    #[test]
    fn test_existing_output_skipped() {
        let dir = tempfile::tempdir().expect("temporary directory");
        let input = dir.path().join("broken.png");
        let output = dir.path().join("broken.wfa");
        std::fs::write(&input, b"not an image").expect("write input");
        std::fs::write(&output, b"keep me").expect("write output");

        let args = |force: bool| {
            let mut args = vec![
                "wfa".to_string(),
                "encode".to_string(),
                input.display().to_string(),
                "--quiet".to_string(),
            ];
            if force {
                args.push("--force".to_string());
            }
            Cli::try_parse_from(args).expect("valid arguments")
        };

        // Skipping never touches the broken input
        assert!(FileProcessor::new(args(false)).process().is_ok());
        assert_eq!(std::fs::read(&output).expect("read output"), b"keep me");

        let forced = FileProcessor::new(args(true));
        assert!(forced.cli().force);
        assert!(forced.process().is_err());
    }
}
