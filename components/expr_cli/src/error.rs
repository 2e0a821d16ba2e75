//! Error types for the CLI

use core_types::{EvaluationError, ExpressionError, ParseError};
use interpreter::ConfigError;
use thiserror::Error;

/// CLI-specific errors
#[derive(Debug, Error)]
pub enum CliError {
    /// Malformed expression
    #[error("syntax error: {}", .0.message())]
    Parse(ParseError),

    /// Evaluation failed
    #[error("evaluation error: {}", .0.message())]
    Evaluation(EvaluationError),

    /// Bad configuration input
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A `--var` binding that is not `NAME=EXPR`
    #[error("invalid variable binding '{0}', expected NAME=EXPR")]
    InvalidBinding(String),

    /// Root object JSON does not parse
    #[error("invalid root object: {0}")]
    InvalidRoot(#[from] serde_json::Error),

    /// REPL error
    #[error("REPL error: {0}")]
    Repl(String),
}

impl From<ParseError> for CliError {
    fn from(err: ParseError) -> Self {
        CliError::Parse(err)
    }
}

impl From<EvaluationError> for CliError {
    fn from(err: EvaluationError) -> Self {
        CliError::Evaluation(err)
    }
}

impl From<ExpressionError> for CliError {
    fn from(err: ExpressionError) -> Self {
        match err {
            ExpressionError::Parse(e) => CliError::Parse(e),
            ExpressionError::Evaluation(e) => CliError::Evaluation(e),
        }
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
