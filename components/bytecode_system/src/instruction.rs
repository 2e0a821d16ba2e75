//! Instruction representation
//!
//! Contains the instruction structure and source span tracking.

use crate::opcode::Opcode;
use core_types::SourceSpan;

/// A single instruction with optional source mapping
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// The opcode for this instruction
    pub opcode: Opcode,
    /// Span of the AST node that emitted it
    pub span: Option<SourceSpan>,
}

impl Instruction {
    /// Create a new instruction without source span
    pub fn new(opcode: Opcode) -> Self {
        Self { opcode, span: None }
    }

    /// Create a new instruction with source span
    pub fn with_span(opcode: Opcode, span: SourceSpan) -> Self {
        Self {
            opcode,
            span: Some(span),
        }
    }
}
