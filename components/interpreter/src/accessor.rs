//! Property accessors
//!
//! Property references ask each accessor of the context, in order, whether it
//! can read or write a named property of a target.

use crate::context::EvaluationContext;
use bytecode_system::{CodeFlow, CompileError, Opcode};
use core_types::{
    EvalResult, EvaluationError, MessageCode, SourceSpan, TypeDescriptor, TypedValue, Value,
};
use std::fmt;

/// Reads and writes named properties of targets
pub trait PropertyAccessor: Send + Sync + fmt::Debug {
    /// Target types this accessor is specific to, `None` for any
    fn specific_target_types(&self) -> Option<Vec<TypeDescriptor>> {
        None
    }

    /// Whether `name` can be read from `target`
    fn can_read(&self, context: &dyn EvaluationContext, target: &Value, name: &str)
        -> EvalResult<bool>;

    /// Read `name` from `target`
    fn read(
        &self,
        context: &dyn EvaluationContext,
        target: &Value,
        name: &str,
    ) -> EvalResult<TypedValue>;

    /// Whether `name` can be written on `target`
    fn can_write(
        &self,
        context: &dyn EvaluationContext,
        target: &Value,
        name: &str,
    ) -> EvalResult<bool>;

    /// Write `name` on `target`
    fn write(
        &self,
        context: &dyn EvaluationContext,
        target: &Value,
        name: &str,
        value: Value,
    ) -> EvalResult<()>;

    /// Whether reads through this accessor can be compiled
    fn is_compilable(&self) -> bool {
        false
    }

    /// Emit a read of `name` from the reference on top of the stack,
    /// attributed to the reference at `span`
    fn generate_code(
        &self,
        name: &str,
        _span: SourceSpan,
        _cf: &mut CodeFlow,
    ) -> Result<(), CompileError> {
        Err(CompileError::NotCompilable(format!(
            "{:?} cannot compile read of '{}'",
            self, name
        )))
    }
}

/// Whether an accessor applies to a target by its declared types
pub(crate) fn accessor_applies(accessor: &dyn PropertyAccessor, target: &Value) -> bool {
    match (accessor.specific_target_types(), TypeDescriptor::of(target)) {
        (None, _) => true,
        (Some(types), Some(td)) => types.iter().any(|t| t.is_assignable_from(&td)),
        (Some(_), None) => false,
    }
}

/// Reads a property of a value the way compiled code does.
///
/// Maps are read by key; host objects through [`HostObject::read_property`].
///
/// [`HostObject::read_property`]: core_types::HostObject::read_property
pub fn read_property(target: &Value, name: &str) -> EvalResult<Value> {
    match target {
        Value::Null => Err(EvaluationError::new(
            MessageCode::PropertyOrFieldNotReadableOnNull,
            [name],
        )),
        Value::Object(object) => object.read_property(name).ok_or_else(|| {
            EvaluationError::new(
                MessageCode::PropertyOrFieldNotReadable,
                [name, object.type_name()],
            )
        }),
        Value::Map(map) => map.read().get(name).cloned().ok_or_else(|| {
            EvaluationError::new(MessageCode::PropertyOrFieldNotReadable, [name, "Map"])
        }),
        other => Err(EvaluationError::new(
            MessageCode::PropertyOrFieldNotReadable,
            [name.to_string(), other.type_name()],
        )),
    }
}

/// Accessor for host object properties
#[derive(Debug, Clone, Copy, Default)]
pub struct ReflectivePropertyAccessor;

impl PropertyAccessor for ReflectivePropertyAccessor {
    fn can_read(
        &self,
        _context: &dyn EvaluationContext,
        target: &Value,
        name: &str,
    ) -> EvalResult<bool> {
        Ok(target
            .as_object()
            .is_some_and(|o| o.read_property(name).is_some()))
    }

    fn read(
        &self,
        _context: &dyn EvaluationContext,
        target: &Value,
        name: &str,
    ) -> EvalResult<TypedValue> {
        read_property(target, name).map(TypedValue::new)
    }

    fn can_write(
        &self,
        _context: &dyn EvaluationContext,
        target: &Value,
        name: &str,
    ) -> EvalResult<bool> {
        Ok(target.as_object().is_some_and(|o| o.can_write_property(name)))
    }

    fn write(
        &self,
        _context: &dyn EvaluationContext,
        target: &Value,
        name: &str,
        value: Value,
    ) -> EvalResult<()> {
        match target.as_object() {
            Some(object) if object.write_property(name, value) => Ok(()),
            _ => Err(EvaluationError::new(
                MessageCode::PropertyOrFieldNotWritable,
                [name.to_string(), target.type_name()],
            )),
        }
    }

    fn is_compilable(&self) -> bool {
        true
    }

    fn generate_code(
        &self,
        name: &str,
        span: SourceSpan,
        cf: &mut CodeFlow,
    ) -> Result<(), CompileError> {
        cf.emit_at(Opcode::GetProperty(name.to_string()), span);
        Ok(())
    }
}

/// Accessor treating map keys as properties
#[derive(Debug, Clone, Copy, Default)]
pub struct MapAccessor;

impl PropertyAccessor for MapAccessor {
    fn specific_target_types(&self) -> Option<Vec<TypeDescriptor>> {
        Some(vec![TypeDescriptor::Map])
    }

    fn can_read(
        &self,
        _context: &dyn EvaluationContext,
        target: &Value,
        name: &str,
    ) -> EvalResult<bool> {
        Ok(match target {
            Value::Map(map) => map.read().contains_key(name),
            _ => false,
        })
    }

    fn read(
        &self,
        _context: &dyn EvaluationContext,
        target: &Value,
        name: &str,
    ) -> EvalResult<TypedValue> {
        read_property(target, name).map(TypedValue::new)
    }

    fn can_write(
        &self,
        _context: &dyn EvaluationContext,
        target: &Value,
        _name: &str,
    ) -> EvalResult<bool> {
        Ok(matches!(target, Value::Map(_)))
    }

    fn write(
        &self,
        _context: &dyn EvaluationContext,
        target: &Value,
        name: &str,
        value: Value,
    ) -> EvalResult<()> {
        match target {
            Value::Map(map) => {
                map.write().insert(name.to_string(), value);
                Ok(())
            }
            other => Err(EvaluationError::new(
                MessageCode::PropertyOrFieldNotWritable,
                [name.to_string(), other.type_name()],
            )),
        }
    }

    fn is_compilable(&self) -> bool {
        true
    }

    fn generate_code(
        &self,
        name: &str,
        span: SourceSpan,
        cf: &mut CodeFlow,
    ) -> Result<(), CompileError> {
        cf.emit_at(Opcode::GetProperty(name.to_string()), span);
        Ok(())
    }
}
