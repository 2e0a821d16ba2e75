//! Ordering of values

use crate::operators::{promote, Promoted};
use core_types::{EvalResult, EvaluationError, MessageCode, Value};
use std::cmp::Ordering;
use std::fmt;

/// Orders pairs of values for the relational operators
pub trait TypeComparator: Send + Sync + fmt::Debug {
    /// Whether the pair can be ordered
    fn can_compare(&self, left: &Value, right: &Value) -> bool;

    /// Order the pair
    fn compare(&self, left: &Value, right: &Value) -> EvalResult<Ordering>;
}

/// Orders numbers, strings, characters and booleans.
///
/// Null sorts before everything else.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardTypeComparator;

impl TypeComparator for StandardTypeComparator {
    fn can_compare(&self, left: &Value, right: &Value) -> bool {
        matches!(
            (left, right),
            (Value::Null, _)
                | (_, Value::Null)
                | (Value::String(_), Value::String(_))
                | (Value::Char(_), Value::Char(_))
                | (Value::Boolean(_), Value::Boolean(_))
        ) || (left.is_number() && right.is_number())
    }

    fn compare(&self, left: &Value, right: &Value) -> EvalResult<Ordering> {
        Ok(match (left, right) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Char(a), Value::Char(b)) => a.cmp(b),
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            _ => match promote(left, right) {
                Some(Promoted::Int(a, b)) => a.cmp(&b),
                Some(Promoted::Long(a, b)) => a.cmp(&b),
                Some(Promoted::Float(a, b)) => a.total_cmp(&b),
                Some(Promoted::Double(a, b)) => a.total_cmp(&b),
                None => {
                    return Err(EvaluationError::new(
                        MessageCode::NotComparable,
                        [left.type_name(), right.type_name()],
                    ))
                }
            },
        })
    }
}
