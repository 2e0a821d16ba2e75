//! Low-level code emitter abstraction
//!
//! [`CodeFlow`](crate::CodeFlow) drives an emitter without knowing what it
//! produces. [`ChunkEmitter`] builds a [`CodeChunk`] for the stack machine.

use crate::chunk::{CodeChunk, FieldDecl};
use crate::descriptor::Descriptor;
use crate::error::CompileError;
use crate::opcode::Opcode;
use core_types::{SourceSpan, Value};

/// Sink for generated code
pub trait CodeEmitter {
    /// Append an instruction
    fn emit(&mut self, opcode: Opcode, span: Option<SourceSpan>);

    /// Intern a reference constant
    fn add_constant(&mut self, value: Value) -> usize;

    /// Index of the next instruction
    fn offset(&self) -> usize;

    /// Point the jump at `at` to `target`
    fn patch_jump(&mut self, at: usize, target: usize) -> Result<(), CompileError>;

    /// Declare a synthetic field
    fn declare_field(&mut self, decl: FieldDecl);

    /// Take the finished code
    fn finish(&mut self, local_count: u16, result: Option<Descriptor>) -> CodeChunk;
}

/// Emitter producing a [`CodeChunk`]
#[derive(Debug, Default)]
pub struct ChunkEmitter {
    chunk: CodeChunk,
}

impl ChunkEmitter {
    /// Create an emitter for a named unit
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            chunk: CodeChunk::new(name),
        }
    }
}

impl CodeEmitter for ChunkEmitter {
    fn emit(&mut self, opcode: Opcode, span: Option<SourceSpan>) {
        match span {
            Some(span) => self.chunk.emit_with_span(opcode, span),
            None => self.chunk.emit(opcode),
        }
    }

    fn add_constant(&mut self, value: Value) -> usize {
        self.chunk.add_constant(value)
    }

    fn offset(&self) -> usize {
        self.chunk.instructions.len()
    }

    fn patch_jump(&mut self, at: usize, target: usize) -> Result<(), CompileError> {
        match self.chunk.instructions.get_mut(at) {
            Some(inst) => {
                if inst.opcode.set_jump_target(target) {
                    Ok(())
                } else {
                    Err(CompileError::InvalidJump(at))
                }
            }
            None => Err(CompileError::InvalidJump(at)),
        }
    }

    fn declare_field(&mut self, decl: FieldDecl) {
        self.chunk.fields.push(decl);
    }

    fn finish(&mut self, local_count: u16, result: Option<Descriptor>) -> CodeChunk {
        let name = self.chunk.name.clone();
        let mut chunk = std::mem::replace(&mut self.chunk, CodeChunk::new(name));
        chunk.local_count = local_count;
        chunk.result = result;
        chunk
    }
}
