//! Core value types and error handling for the expression engine.
//!
//! This crate provides the foundational types shared by every other
//! component: the dynamic value model evaluated against a host object
//! graph, runtime type tags, and the error taxonomy.
//!
//! # Overview
//!
//! - [`Value`] - Dynamically-typed value produced and consumed by expressions
//! - [`HostObject`] - Contract for objects of the host object graph
//! - [`TypeDescriptor`] - Runtime type tag of a value
//! - [`TypedValue`] - Value paired with a lazily computed type tag
//! - [`EvaluationError`] / [`ParseError`] - Diagnostics with message codes
//! - [`SourceSpan`] - Source range of an AST node
//!
//! # Examples
//!
//! ```
//! use core_types::{TypeDescriptor, TypedValue, Value};
//!
//! let value = TypedValue::new(Value::Int(42));
//! assert_eq!(value.type_descriptor(), Some(&TypeDescriptor::Int));
//! assert_eq!(value.value().to_string(), "42");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod descriptor;
mod error;
mod source;
mod typed_value;
mod value;

pub use descriptor::TypeDescriptor;
pub use error::{
    format_message, EvalResult, EvaluationError, ExpressionError, MessageCode, ParseError,
};
pub use source::SourceSpan;
pub use typed_value::TypedValue;
pub use value::{HostObject, ListRef, MapRef, Record, Value};
