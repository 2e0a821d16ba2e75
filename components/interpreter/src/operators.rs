//! Operator semantics shared by interpreted and compiled evaluation
//!
//! Binary numeric operands are promoted to a common kind: double over float,
//! float over long, long over int. Bytes and shorts operate as ints. Integer
//! arithmetic wraps; integer division by zero is an error.

use crate::context::EvaluationContext;
use bytecode_system::{CompareOp, NumericOp};
use core_types::{EvalResult, EvaluationError, MessageCode, TypeDescriptor, Value};
use std::cmp::Ordering;

/// A pair of numbers promoted to a common kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Promoted {
    /// Both ints
    Int(i32, i32),
    /// Both longs
    Long(i64, i64),
    /// Both floats
    Float(f32, f32),
    /// Both doubles
    Double(f64, f64),
}

fn rank(value: &Value) -> Option<u8> {
    Some(match value {
        Value::Byte(_) | Value::Short(_) | Value::Int(_) => 0,
        Value::Long(_) => 1,
        Value::Float(_) => 2,
        Value::Double(_) => 3,
        _ => return None,
    })
}

/// Float view of a number; longs round once, straight to single precision
pub(crate) fn as_f32(value: &Value) -> Option<f32> {
    match value {
        Value::Long(n) => Some(*n as f32),
        other => other.as_f64().map(|d| d as f32),
    }
}

/// Promote two numbers, `None` unless both are numbers
pub fn promote(left: &Value, right: &Value) -> Option<Promoted> {
    let kind = rank(left)?.max(rank(right)?);
    Some(match kind {
        0 => Promoted::Int(left.as_i64()? as i32, right.as_i64()? as i32),
        1 => Promoted::Long(left.as_i64()?, right.as_i64()?),
        2 => Promoted::Float(as_f32(left)?, as_f32(right)?),
        _ => Promoted::Double(left.as_f64()?, right.as_f64()?),
    })
}

/// Int arithmetic
pub fn int_arith(op: NumericOp, a: i32, b: i32) -> EvalResult<i32> {
    Ok(match op {
        NumericOp::Add => a.wrapping_add(b),
        NumericOp::Sub => a.wrapping_sub(b),
        NumericOp::Mul => a.wrapping_mul(b),
        NumericOp::Div | NumericOp::Rem if b == 0 => {
            return Err(EvaluationError::of(MessageCode::DivisionByZero))
        }
        NumericOp::Div => a.wrapping_div(b),
        NumericOp::Rem => a.wrapping_rem(b),
    })
}

/// Long arithmetic
pub fn long_arith(op: NumericOp, a: i64, b: i64) -> EvalResult<i64> {
    Ok(match op {
        NumericOp::Add => a.wrapping_add(b),
        NumericOp::Sub => a.wrapping_sub(b),
        NumericOp::Mul => a.wrapping_mul(b),
        NumericOp::Div | NumericOp::Rem if b == 0 => {
            return Err(EvaluationError::of(MessageCode::DivisionByZero))
        }
        NumericOp::Div => a.wrapping_div(b),
        NumericOp::Rem => a.wrapping_rem(b),
    })
}

/// Float arithmetic
pub fn float_arith(op: NumericOp, a: f32, b: f32) -> f32 {
    match op {
        NumericOp::Add => a + b,
        NumericOp::Sub => a - b,
        NumericOp::Mul => a * b,
        NumericOp::Div => a / b,
        NumericOp::Rem => a % b,
    }
}

/// Double arithmetic
pub fn double_arith(op: NumericOp, a: f64, b: f64) -> f64 {
    match op {
        NumericOp::Add => a + b,
        NumericOp::Sub => a - b,
        NumericOp::Mul => a * b,
        NumericOp::Div => a / b,
        NumericOp::Rem => a % b,
    }
}

/// Numeric binary operation, `None` unless both operands are numbers
pub fn arithmetic(op: NumericOp, left: &Value, right: &Value) -> Option<EvalResult<Value>> {
    Some(match promote(left, right)? {
        Promoted::Int(a, b) => int_arith(op, a, b).map(Value::Int),
        Promoted::Long(a, b) => long_arith(op, a, b).map(Value::Long),
        Promoted::Float(a, b) => Ok(Value::Float(float_arith(op, a, b))),
        Promoted::Double(a, b) => Ok(Value::Double(double_arith(op, a, b))),
    })
}

/// Unary minus, `None` for non-numbers
pub fn negate(value: &Value) -> Option<Value> {
    Some(match value {
        Value::Byte(n) => Value::Byte(n.wrapping_neg()),
        Value::Short(n) => Value::Short(n.wrapping_neg()),
        Value::Int(n) => Value::Int(n.wrapping_neg()),
        Value::Long(n) => Value::Long(n.wrapping_neg()),
        Value::Float(n) => Value::Float(-n),
        Value::Double(n) => Value::Double(-n),
        _ => return None,
    })
}

/// Exponentiation, `None` unless both operands are numbers.
///
/// Int powers that overflow an int widen to long.
pub fn power(base: &Value, exponent: &Value) -> Option<Value> {
    Some(match promote(base, exponent)? {
        Promoted::Int(a, b) => {
            let result = f64::from(a).powf(f64::from(b));
            if result >= f64::from(i32::MIN) && result <= f64::from(i32::MAX) {
                Value::Int(result as i32)
            } else {
                Value::Long(result as i64)
            }
        }
        Promoted::Long(a, b) => Value::Long((a as f64).powf(b as f64) as i64),
        Promoted::Float(a, b) => Value::Float(a.powf(b)),
        Promoted::Double(a, b) => Value::Double(a.powf(b)),
    })
}

fn compare_partial<T: PartialOrd>(op: CompareOp, a: T, b: T) -> bool {
    match op {
        CompareOp::Eq => a == b,
        CompareOp::Ne => a != b,
        CompareOp::Lt => a < b,
        CompareOp::Le => a <= b,
        CompareOp::Gt => a > b,
        CompareOp::Ge => a >= b,
    }
}

/// Numeric comparison with IEEE semantics, `None` unless both are numbers
pub fn compare_numbers(op: CompareOp, left: &Value, right: &Value) -> Option<bool> {
    Some(match promote(left, right)? {
        Promoted::Int(a, b) => compare_partial(op, a, b),
        Promoted::Long(a, b) => compare_partial(op, a, b),
        Promoted::Float(a, b) => compare_partial(op, a, b),
        Promoted::Double(a, b) => compare_partial(op, a, b),
    })
}

/// Equality as tested by `==`.
///
/// Numbers compare by promoted value, null equals only null, and other
/// pairs go to the comparator when it can order them.
pub fn equality_check(
    context: &dyn EvaluationContext,
    left: &Value,
    right: &Value,
) -> EvalResult<bool> {
    if let Some(eq) = compare_numbers(CompareOp::Eq, left, right) {
        return Ok(eq);
    }
    match (left, right) {
        (Value::Null, Value::Null) => Ok(true),
        (Value::Null, _) | (_, Value::Null) => Ok(false),
        (Value::String(a), Value::String(b)) => Ok(a == b),
        (Value::Boolean(a), Value::Boolean(b)) => Ok(a == b),
        (Value::Char(a), Value::Char(b)) => Ok(a == b),
        _ => {
            let comparator = context.type_comparator();
            if comparator.can_compare(left, right) {
                Ok(comparator.compare(left, right)? == Ordering::Equal)
            } else {
                Ok(left == right)
            }
        }
    }
}

/// Relational comparison as tested by `<`, `<=`, `>` and `>=`
pub fn compare_values(
    context: &dyn EvaluationContext,
    op: CompareOp,
    left: &Value,
    right: &Value,
) -> EvalResult<bool> {
    match op {
        CompareOp::Eq => return equality_check(context, left, right),
        CompareOp::Ne => return equality_check(context, left, right).map(|eq| !eq),
        _ => {}
    }
    if let Some(result) = compare_numbers(op, left, right) {
        return Ok(result);
    }
    let comparator = context.type_comparator();
    if !comparator.can_compare(left, right) {
        return Err(EvaluationError::new(
            MessageCode::NotComparable,
            [left.type_name(), right.type_name()],
        ));
    }
    Ok(op.test(comparator.compare(left, right)?))
}

/// Boolean value of an operand, converting through the context
pub fn to_boolean(context: &dyn EvaluationContext, value: &Value) -> EvalResult<bool> {
    if let Value::Boolean(b) = value {
        return Ok(*b);
    }
    let source = TypeDescriptor::of(value);
    let converted = context
        .type_converter()
        .convert_value(value, source.as_ref(), &TypeDescriptor::Boolean)?;
    converted.as_bool().ok_or_else(|| {
        EvaluationError::new(
            MessageCode::TypeConversionError,
            [value.type_name().as_str(), "Boolean"],
        )
    })
}

/// Whether the elvis operator keeps its left operand
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// String form used by concatenation
pub fn concat_text(value: &Value) -> String {
    value.to_string()
}
