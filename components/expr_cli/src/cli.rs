//! Command line arguments

use clap::Parser;
use interpreter::CompilerMode;

/// Evaluate expressions from the command line or interactively
#[derive(Debug, Parser)]
#[command(name = "corten-el", version, about)]
pub struct Cli {
    /// Evaluate one expression and print the result
    #[arg(short, long, value_name = "EXPR", conflicts_with = "template")]
    pub eval: Option<String>,

    /// Evaluate template text with embedded #{...} expressions
    #[arg(short, long, value_name = "TEXT")]
    pub template: Option<String>,

    /// Start the interactive shell
    #[arg(short, long)]
    pub repl: bool,

    /// Compiler mode; defaults to CORTEN_EL_COMPILER_MODE or off
    #[arg(short, long, value_name = "MODE", value_parser = parse_mode)]
    pub mode: Option<CompilerMode>,

    /// Bind a variable, NAME=EXPR; the value is itself an expression
    #[arg(long = "var", value_name = "NAME=EXPR")]
    pub vars: Vec<String>,

    /// Root object as JSON
    #[arg(long, value_name = "JSON")]
    pub root: Option<String>,

    /// Evaluate this many times, to drive compilation
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub repeat: u32,

    /// Log compilation activity to stderr (filter with RUST_LOG)
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_mode(s: &str) -> Result<CompilerMode, String> {
    s.parse().map_err(|e: interpreter::ConfigError| e.to_string())
}
