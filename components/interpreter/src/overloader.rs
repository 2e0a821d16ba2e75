//! Operator overloading

use core_types::{EvalResult, EvaluationError, MessageCode, Value};
use std::fmt;

/// Arithmetic operations an overloader may claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// +
    Add,
    /// -
    Subtract,
    /// *
    Multiply,
    /// /
    Divide,
    /// %
    Modulus,
    /// ^
    Power,
}

impl Operation {
    /// Operator token used in diagnostics
    pub fn symbol(self) -> &'static str {
        match self {
            Operation::Add => "+",
            Operation::Subtract => "-",
            Operation::Multiply => "*",
            Operation::Divide => "/",
            Operation::Modulus => "%",
            Operation::Power => "^",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Implements operators for operand types the language does not handle
pub trait OperatorOverloader: Send + Sync + fmt::Debug {
    /// Whether this overloader claims the operation for these operands
    fn overrides_operation(&self, op: Operation, left: &Value, right: &Value) -> EvalResult<bool>;

    /// Perform a claimed operation
    fn operate(&self, op: Operation, left: &Value, right: &Value) -> EvalResult<Value>;
}

/// The error raised when no overloader claims an operation
pub fn operator_not_supported(op: Operation, left: &Value, right: &Value) -> EvaluationError {
    EvaluationError::new(
        MessageCode::OperatorNotSupportedBetweenTypes,
        [op.symbol().to_string(), left.type_name(), right.type_name()],
    )
}

/// Overloader that claims nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardOperatorOverloader;

impl OperatorOverloader for StandardOperatorOverloader {
    fn overrides_operation(&self, _op: Operation, _left: &Value, _right: &Value) -> EvalResult<bool> {
        Ok(false)
    }

    fn operate(&self, op: Operation, left: &Value, right: &Value) -> EvalResult<Value> {
        Err(operator_not_supported(op, left, right))
    }
}
