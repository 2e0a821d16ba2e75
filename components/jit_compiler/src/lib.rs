//! Compilation of expression trees
//!
//! This crate turns an interpreted expression tree into a
//! [`CompiledUnit`]:
//! - [`ExpressionCompiler`]: drives code generation, optimization and
//!   verification, then links the unit
//! - [`Executor`]: the stack machine running linked code
//! - [`CraneliftBackend`]: native tier for purely numeric code
//! - [`Deoptimizer`]: tracks failures that force a unit back to
//!   interpretation
//!
//! # Example
//!
//! ```
//! use bytecode_system::{CodeFlow, Descriptor, NumericOp, Opcode, PrimitiveKind};
//! use core_types::Value;
//! use interpreter::StandardEvaluationContext;
//! use jit_compiler::{verify, CompiledUnit};
//!
//! let mut cf = CodeFlow::for_chunk("6 * 7");
//! cf.emit(Opcode::IConst(6));
//! cf.emit(Opcode::IConst(7));
//! cf.emit(Opcode::IArith(NumericOp::Mul));
//! cf.insert_boxing(PrimitiveKind::Int);
//! cf.emit(Opcode::Return);
//! let chunk = cf.finish(Some(Descriptor::Boxed(PrimitiveKind::Int)));
//! verify(&chunk).unwrap();
//!
//! let unit = CompiledUnit::link(chunk, None).unwrap();
//! let ctx = StandardEvaluationContext::new();
//! assert_eq!(unit.get_value(&Value::Null, &ctx), Ok(Value::Int(42)));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod compiled_unit;
pub mod compiler;
pub mod cranelift_backend;
pub mod deopt;
pub mod executor;
pub mod verifier;

// Re-export main types at crate root
pub use compiled_unit::{CompiledUnit, FieldSlot, UnitFailure};
pub use compiler::{CompilerStats, ExpressionCompiler, StatsSnapshot};
pub use cranelift_backend::{native_result_kind, CraneliftBackend, NativeFunction};
pub use deopt::{DeoptInfo, DeoptReason, Deoptimizer};
pub use executor::{Executor, Slot};
pub use verifier::verify;
