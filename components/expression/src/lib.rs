//! Public face of the expression engine
//!
//! [`ExpressionParser`] turns source text into [`Expression`]s. An
//! expression interprets its tree, and depending on the configured
//! [`CompilerMode`] compiles itself once it knows the types flowing through
//! it, falling back to interpretation for good if the compiled form's
//! assumptions ever break.
//!
//! # Example
//!
//! ```
//! use core_types::{Record, Value};
//! use expression::{CompilationState, ExpressionParser};
//! use interpreter::{CompilerConfiguration, CompilerMode, StandardEvaluationContext};
//!
//! let config = CompilerConfiguration::new(CompilerMode::Mixed).with_warm_up_threshold(2);
//! let parser = ExpressionParser::new(config);
//! let expr = parser.parse_expression("name.length() > 3").unwrap();
//!
//! let ctx = StandardEvaluationContext::with_root(
//!     Record::new("Person").with("name", "Ada").into_value(),
//! );
//! assert_eq!(expr.get_value_in(&ctx), Ok(Value::Boolean(false)));
//! assert_eq!(expr.get_value_in(&ctx), Ok(Value::Boolean(false)));
//! assert_eq!(expr.compilation_state(), CompilationState::Compiled);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod expression;
pub mod expression_parser;
pub mod state;

// Re-export main types at crate root
pub use expression::Expression;
pub use expression_parser::ExpressionParser;
pub use interpreter::{CompilerConfiguration, CompilerMode};
pub use parser::TemplateContext;
pub use state::CompilationState;
