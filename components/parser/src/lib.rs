//! Expression parser
//!
//! Turns expression source into the executable node tree of the
//! `interpreter` crate.
//!
//! # Overview
//!
//! - [`Lexer`] - Tokenizes expression source
//! - [`Token`] - Token types including identifiers, literals, keywords
//! - [`Parser`] - Recursive descent parser producing nodes
//! - [`parse_template`] - Parses text with embedded `#{...}` expressions
//!
//! # Example
//!
//! ```
//! use interpreter::CompilerConfiguration;
//! use parser::parse_expression;
//!
//! let config = CompilerConfiguration::default();
//! let ast = parse_expression("1 + 2 * 3", &config).unwrap();
//! assert_eq!(ast.to_expression_string(), "(1 + (2 * 3))");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod lexer;
pub mod parser;
pub mod template;

pub use lexer::{Keyword, Lexer, Punctuator, Spanned, Token};
pub use parser::Parser;
pub use template::{parse_template, TemplateContext};

use core_types::{MessageCode, ParseError};
use interpreter::{CompilerConfiguration, Node};

fn check_length(source: &str, config: &CompilerConfiguration) -> Result<(), ParseError> {
    let max = config.maximum_expression_length;
    if source.chars().count() > max {
        return Err(error::parse_error(
            MessageCode::MaxExpressionLengthExceeded,
            0,
            [max.to_string()],
        ));
    }
    Ok(())
}

/// Parse a standalone expression, enforcing the configured length limit
pub fn parse_expression(
    source: &str,
    config: &CompilerConfiguration,
) -> Result<Box<dyn Node>, ParseError> {
    check_length(source, config)?;
    Parser::new(source).parse()
}

/// Parse template text, enforcing the configured length limit
pub fn parse_template_expression(
    source: &str,
    context: &TemplateContext,
    config: &CompilerConfiguration,
) -> Result<Box<dyn Node>, ParseError> {
    check_length(source, config)?;
    parse_template(source, context)
}
