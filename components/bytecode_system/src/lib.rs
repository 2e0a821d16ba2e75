//! Code generation model for compiled expressions
//!
//! This crate provides the instruction set executed by compiled expression
//! units, the compile-time operand descriptors, and [`CodeFlow`], the
//! bookkeeping object AST nodes drive while generating code.
//!
//! # Features
//!
//! - Stack-based instruction set with typed primitive families
//! - Boxing, unboxing and numeric coercion helpers
//! - Deferred synthetic fields with static initializers
//! - Peephole optimization passes
//!
//! # Example
//!
//! ```
//! use bytecode_system::{CodeFlow, Descriptor, NumericOp, Opcode, PrimitiveKind};
//!
//! let mut cf = CodeFlow::for_chunk("sum");
//!
//! // 1 + 2L
//! cf.emit(Opcode::IConst(1));
//! cf.push_descriptor(Descriptor::Primitive(PrimitiveKind::Int));
//! cf.insert_primitive_conversion(PrimitiveKind::Int, PrimitiveKind::Long).unwrap();
//! cf.emit(Opcode::LConst(2));
//! cf.emit(Opcode::LArith(NumericOp::Add));
//! cf.insert_boxing(PrimitiveKind::Long);
//! cf.emit(Opcode::Return);
//!
//! let chunk = cf.finish(Some(Descriptor::Boxed(PrimitiveKind::Long)));
//! assert_eq!(chunk.instruction_count(), 6);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunk;
pub mod codeflow;
pub mod descriptor;
pub mod emitter;
pub mod error;
pub mod instruction;
pub mod opcode;
pub mod optimizer;

// Re-export main types at crate root
pub use chunk::{CodeChunk, FieldDecl, FieldInit};
pub use codeflow::CodeFlow;
pub use descriptor::{Descriptor, PrimitiveKind};
pub use emitter::{ChunkEmitter, CodeEmitter};
pub use error::CompileError;
pub use instruction::Instruction;
pub use opcode::{CompareOp, FieldId, LocalSlot, NumericOp, Opcode};
pub use optimizer::Optimizer;
