//! Code chunk - compiled expression container
//!
//! Contains instructions, constants, synthetic fields, and metadata for
//! execution.

use crate::descriptor::Descriptor;
use crate::instruction::Instruction;
use crate::opcode::{FieldId, Opcode};
use core_types::{SourceSpan, Value};

/// Static initializer of a synthetic field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldInit {
    /// Constant value
    Value(Value),
    /// Fresh list built from these elements on every load
    List(Vec<Value>),
    /// Regular expression compiled once when the unit is loaded
    Pattern(String),
}

/// Declaration of a synthetic field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    /// Field id
    pub id: FieldId,
    /// Diagnostic name
    pub name: String,
    /// Static initializer, `None` leaves the field null
    pub init: Option<FieldInit>,
}

/// A compiled expression body
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CodeChunk {
    /// Unit name for diagnostics
    pub name: String,
    /// Sequence of instructions
    pub instructions: Vec<Instruction>,
    /// Constant pool for reference literals
    pub constants: Vec<Value>,
    /// Synthetic fields, in declaration order
    pub fields: Vec<FieldDecl>,
    /// Number of scope-local slots
    pub local_count: u16,
    /// Descriptor of the returned value
    pub result: Option<Descriptor>,
}

impl CodeChunk {
    /// Create a new empty chunk
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Emit an instruction without source span
    pub fn emit(&mut self, opcode: Opcode) {
        self.instructions.push(Instruction::new(opcode));
    }

    /// Emit an instruction with source span
    pub fn emit_with_span(&mut self, opcode: Opcode, span: SourceSpan) {
        self.instructions.push(Instruction::with_span(opcode, span));
    }

    /// Add a constant to the constant pool and return its index
    pub fn add_constant(&mut self, value: Value) -> usize {
        if let Some(idx) = self.constants.iter().position(|c| same_constant(c, &value)) {
            return idx;
        }
        let idx = self.constants.len();
        self.constants.push(value);
        idx
    }

    /// Get the number of instructions
    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    /// Field declaration by id
    pub fn field(&self, id: FieldId) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Opcodes in order, without spans
    pub fn opcodes(&self) -> impl Iterator<Item = &Opcode> {
        self.instructions.iter().map(|i| &i.opcode)
    }
}

// Only immutable scalars are shared; lists and host objects keep identity.
fn same_constant(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::Char(x), Value::Char(y)) => x == y,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_constants_are_pooled() {
        let mut chunk = CodeChunk::new("unit");
        let a = chunk.add_constant(Value::from("x"));
        let b = chunk.add_constant(Value::from("x"));
        let c = chunk.add_constant(Value::from("y"));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(chunk.constants.len(), 2);
    }

    #[test]
    fn test_list_constants_are_not_pooled() {
        let mut chunk = CodeChunk::new("unit");
        let a = chunk.add_constant(Value::list(vec![]));
        let b = chunk.add_constant(Value::list(vec![]));
        assert_ne!(a, b);
    }
}
