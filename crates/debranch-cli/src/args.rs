use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for the debranch binary.
#[derive(Parser, Debug)]
#[command(
    name = "debranch",
    version,
    about = "Strip compile-time dead branches from JavaScript"
)]
pub struct CliArgs {
    /// Input file. Reads stdin when omitted or `-`.
    pub input: Option<PathBuf>,

    /// Output file. Writes stdout when omitted.
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Define a known constant, e.g. `-d __DEV__=false` or `-d VERSION='2.1'`.
    /// Values parse as `true`, `false`, `null`, `undefined`, a number, or
    /// otherwise a string. Repeatable.
    #[arg(short = 'd', long = "define", value_name = "NAME=VALUE")]
    pub defines: Vec<String>,

    /// Start from an empty environment instead of the default
    /// `__DEV__=false`.
    #[arg(long = "no-default-defines")]
    pub no_default_defines: bool,
}
