//! Compiled expression units
//!
//! A unit owns verified code, its linked synthetic fields, and optionally a
//! native function for purely numeric code. Units are immutable once built
//! and are shared between threads.

use crate::cranelift_backend::NativeFunction;
use crate::executor::Executor;
use bytecode_system::{CodeChunk, CompileError, FieldId, FieldInit};
use core_types::{EvaluationError, Value};
use interpreter::{compile_pattern, EvaluationContext};
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Why a compiled unit did not produce a value
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitFailure {
    /// A type assumption baked in at compile time does not hold
    #[error("coercion failed at instruction {offset}: expected {expected}, found {found}")]
    Coercion {
        /// Instruction offset
        offset: usize,
        /// Type the code expected
        expected: String,
        /// Type found at runtime
        found: String,
    },

    /// The code reached a state verification should have excluded
    #[error("invalid state at instruction {offset}: {reason}")]
    InvalidState {
        /// Instruction offset
        offset: usize,
        /// What went wrong
        reason: String,
    },

    /// The evaluation itself failed, exactly as interpretation would
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

impl UnitFailure {
    /// Whether the unit must be discarded for good
    pub fn is_disqualifying(&self) -> bool {
        !matches!(self, UnitFailure::Evaluation(_))
    }
}

/// A linked synthetic field
#[derive(Debug, Clone)]
pub enum FieldSlot {
    /// Constant
    Value(Value),
    /// Elements copied into a fresh list on every load
    List(Vec<Value>),
    /// Compiled pattern
    Pattern(Regex),
}

/// Executable form of one expression tree
pub struct CompiledUnit {
    chunk: CodeChunk,
    fields: HashMap<FieldId, FieldSlot>,
    native: Option<NativeFunction>,
}

impl CompiledUnit {
    /// Link a chunk: run every static initializer once.
    ///
    /// Fields without an initializer start out null.
    pub fn link(chunk: CodeChunk, native: Option<NativeFunction>) -> Result<Self, CompileError> {
        let mut fields = HashMap::with_capacity(chunk.fields.len());
        for decl in &chunk.fields {
            let slot = match &decl.init {
                None => FieldSlot::Value(Value::Null),
                Some(FieldInit::Value(value)) => FieldSlot::Value(value.clone()),
                Some(FieldInit::List(items)) => FieldSlot::List(items.clone()),
                Some(FieldInit::Pattern(pattern)) => {
                    let regex = compile_pattern(pattern).map_err(|e| {
                        CompileError::FieldInitialization {
                            field: decl.id.0,
                            reason: e.message(),
                        }
                    })?;
                    FieldSlot::Pattern(regex)
                }
            };
            fields.insert(decl.id, slot);
        }
        Ok(Self {
            chunk,
            fields,
            native,
        })
    }

    /// Evaluate against a target and context
    pub fn get_value(
        &self,
        target: &Value,
        context: &dyn EvaluationContext,
    ) -> Result<Value, UnitFailure> {
        if let Some(native) = &self.native {
            return Ok(native.call());
        }
        Executor::new(&self.chunk, &self.fields, target, context).run()
    }

    /// The code this unit runs
    pub fn chunk(&self) -> &CodeChunk {
        &self.chunk
    }

    /// Number of linked fields
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Whether evaluation runs native code
    pub fn is_native(&self) -> bool {
        self.native.is_some()
    }
}

impl fmt::Debug for CompiledUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledUnit")
            .field("name", &self.chunk.name)
            .field("instructions", &self.chunk.instructions.len())
            .field("fields", &self.fields.len())
            .field("native", &self.native.is_some())
            .finish()
    }
}
