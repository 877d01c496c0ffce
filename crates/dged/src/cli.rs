//! Command-line surface: argument parsing and the exit-code contract.
//!
//! clap's own `--help`/parse-error exit codes don't match this editor's
//! contract, so the help flag is handled by hand and every outcome is
//! translated explicitly in `main`.

use std::path::PathBuf;

use clap::{CommandFactory, Parser};

#[derive(Parser, Debug)]
#[command(
    name = "dged",
    about = "A small, keyboard-driven terminal text editor",
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct Args {
    /// Pre-position dot at line N (1-based) after loading the file.
    #[arg(short = 'l', long = "line", value_name = "N")]
    pub line: Option<usize>,

    /// Pre-position dot at the end of the buffer after loading the file.
    #[arg(short = 'e', long = "end")]
    pub end: bool,

    /// Print this usage text and exit.
    #[arg(short = 'h', long = "help")]
    pub help: bool,

    /// File to open. Omit to start with an empty scratch buffer.
    pub filename: Option<PathBuf>,
}

pub enum Parsed {
    Run(Args),
    Help,
    /// A parse error; the message has already been printed to stderr.
    Error,
}

pub fn parse(raw: impl IntoIterator<Item = String>) -> Parsed {
    match Args::try_parse_from(raw) {
        Ok(args) if args.help => Parsed::Help,
        Ok(args) => Parsed::Run(args),
        Err(err) => {
            eprintln!("{err}");
            Parsed::Error
        }
    }
}

pub fn print_help() {
    let _ = Args::command().print_help();
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_filename_parses() {
        let parsed = parse(["dged".to_string(), "notes.txt".to_string()]);
        match parsed {
            Parsed::Run(args) => assert_eq!(args.filename.unwrap().to_str().unwrap(), "notes.txt"),
            _ => panic!("expected Run"),
        }
    }

    #[test]
    fn two_positionals_is_an_error() {
        let parsed = parse(["dged".to_string(), "a.txt".to_string(), "b.txt".to_string()]);
        assert!(matches!(parsed, Parsed::Error));
    }

    #[test]
    fn help_flag_short_circuits() {
        let parsed = parse(["dged".to_string(), "-h".to_string()]);
        assert!(matches!(parsed, Parsed::Help));
    }

    #[test]
    fn line_and_end_flags_parse() {
        let parsed = parse(["dged".to_string(), "-l".to_string(), "12".to_string(), "a.txt".to_string()]);
        match parsed {
            Parsed::Run(args) => assert_eq!(args.line, Some(12)),
            _ => panic!("expected Run"),
        }
    }
}
