//! Expression engine CLI library
//!
//! Provides the [`Runtime`] session and the REPL behind the `corten-el`
//! binary.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod error;
pub mod repl;
pub mod runtime;

pub use cli::Cli;
pub use error::{CliError, CliResult};
pub use runtime::{format_value, Runtime};
