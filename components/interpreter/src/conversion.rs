//! Type conversion

use crate::operators::as_f32;
use core_types::{EvalResult, EvaluationError, MessageCode, TypeDescriptor, Value};
use std::fmt;

/// Converts values between runtime types
pub trait TypeConverter: Send + Sync + fmt::Debug {
    /// Whether values of `source` (`None` = null) can become `target`
    fn can_convert(&self, source: Option<&TypeDescriptor>, target: &TypeDescriptor) -> bool;

    /// Convert `value`, whose type is `source`, to `target`
    fn convert_value(
        &self,
        value: &Value,
        source: Option<&TypeDescriptor>,
        target: &TypeDescriptor,
    ) -> EvalResult<Value>;
}

/// Conversions between the built-in types.
///
/// Numbers convert to each other with truncation, anything converts to a
/// string, and strings parse to numbers, booleans and single characters.
/// Null converts to null.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardTypeConverter;

fn conversion_error(source: Option<&TypeDescriptor>, target: &TypeDescriptor) -> EvaluationError {
    EvaluationError::new(
        MessageCode::TypeConversionError,
        [
            source.map_or("null", TypeDescriptor::name),
            target.name(),
        ],
    )
}

/// Numeric cast; floating sources saturate, integral sources wrap
fn number_to(value: &Value, target: &TypeDescriptor) -> Option<Value> {
    let d = value.as_f64()?;
    let floating = matches!(value, Value::Float(_) | Value::Double(_));
    let (i, int) = if floating {
        (d as i64, d as i32)
    } else {
        let i = value.as_i64()?;
        (i, i as i32)
    };
    Some(match target {
        TypeDescriptor::Byte => Value::Byte(int as i8),
        TypeDescriptor::Short => Value::Short(int as i16),
        TypeDescriptor::Int => Value::Int(int),
        TypeDescriptor::Long => Value::Long(i),
        TypeDescriptor::Float => Value::Float(as_f32(value)?),
        TypeDescriptor::Double => Value::Double(d),
        TypeDescriptor::Char => Value::Char(char::from_u32(u32::from(int as u16))?),
        _ => return None,
    })
}

fn parse_to(s: &str, target: &TypeDescriptor) -> Option<Value> {
    let t = s.trim();
    Some(match target {
        TypeDescriptor::Byte => Value::Byte(t.parse().ok()?),
        TypeDescriptor::Short => Value::Short(t.parse().ok()?),
        TypeDescriptor::Int => Value::Int(t.parse().ok()?),
        TypeDescriptor::Long => Value::Long(t.parse().ok()?),
        TypeDescriptor::Float => Value::Float(t.parse().ok()?),
        TypeDescriptor::Double => Value::Double(t.parse().ok()?),
        TypeDescriptor::Boolean => match t.to_ascii_lowercase().as_str() {
            "true" | "on" | "yes" | "1" => Value::Boolean(true),
            "false" | "off" | "no" | "0" => Value::Boolean(false),
            _ => return None,
        },
        TypeDescriptor::Char => {
            let mut chars = s.chars();
            let c = chars.next()?;
            if chars.next().is_some() {
                return None;
            }
            Value::Char(c)
        }
        _ => return None,
    })
}

impl TypeConverter for StandardTypeConverter {
    fn can_convert(&self, source: Option<&TypeDescriptor>, target: &TypeDescriptor) -> bool {
        let Some(source) = source else {
            return true;
        };
        if target.is_assignable_from(source) || *target == TypeDescriptor::String {
            return true;
        }
        match source {
            TypeDescriptor::String => target.is_numeric() || matches!(
                target,
                TypeDescriptor::Boolean | TypeDescriptor::Char
            ),
            TypeDescriptor::Char => target.is_numeric(),
            s if s.is_numeric() => target.is_numeric() || *target == TypeDescriptor::Char,
            _ => false,
        }
    }

    fn convert_value(
        &self,
        value: &Value,
        source: Option<&TypeDescriptor>,
        target: &TypeDescriptor,
    ) -> EvalResult<Value> {
        let failure = || conversion_error(source, target);
        if value.is_null() {
            return Ok(Value::Null);
        }
        if TypeDescriptor::of(value).is_some_and(|td| target.is_assignable_from(&td)) {
            return Ok(value.clone());
        }
        match value {
            Value::String(s) => parse_to(s, target).ok_or_else(failure),
            _ if *target == TypeDescriptor::String => Ok(Value::from(value.to_string())),
            Value::Char(c) => number_to(&Value::Int(*c as i32), target).ok_or_else(failure),
            v if v.is_number() => number_to(v, target).ok_or_else(failure),
            _ => Err(failure()),
        }
    }
}
