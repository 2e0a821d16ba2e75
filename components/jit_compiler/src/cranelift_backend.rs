//! Cranelift-based native tier
//!
//! Compiles purely numeric chunks (constants, typed arithmetic, typed
//! comparisons and conversions, ending in a single box and return) to native
//! functions taking no arguments. Anything else is left to the executor.

use crate::executor::{box_slot, Slot};
use bytecode_system::{CodeChunk, CompareOp, CompileError, NumericOp, Opcode, PrimitiveKind};
use core_types::Value;
use cranelift_codegen::ir::condcodes::{FloatCC, IntCC};
use cranelift_codegen::ir::{types, AbiParam, InstBuilder, Type};
use cranelift_codegen::settings::{self, Configurable};
use cranelift_codegen::Context;
use cranelift_frontend::{FunctionBuilder, FunctionBuilderContext};
use cranelift_jit::{JITBuilder, JITModule};
use cranelift_module::{Linkage, Module};
use std::fmt;
use target_lexicon::{Architecture, Triple};

fn backend_error(e: impl fmt::Display) -> CompileError {
    CompileError::Backend(e.to_string())
}

fn clif_type(kind: PrimitiveKind) -> Type {
    match kind.stack_kind() {
        PrimitiveKind::Long => types::I64,
        PrimitiveKind::Float => types::F32,
        PrimitiveKind::Double => types::F64,
        _ => types::I32,
    }
}

fn int_cc(op: CompareOp) -> IntCC {
    match op {
        CompareOp::Eq => IntCC::Equal,
        CompareOp::Ne => IntCC::NotEqual,
        CompareOp::Lt => IntCC::SignedLessThan,
        CompareOp::Le => IntCC::SignedLessThanOrEqual,
        CompareOp::Gt => IntCC::SignedGreaterThan,
        CompareOp::Ge => IntCC::SignedGreaterThanOrEqual,
    }
}

fn float_cc(op: CompareOp) -> FloatCC {
    match op {
        CompareOp::Eq => FloatCC::Equal,
        CompareOp::Ne => FloatCC::NotEqual,
        CompareOp::Lt => FloatCC::LessThan,
        CompareOp::Le => FloatCC::LessThanOrEqual,
        CompareOp::Gt => FloatCC::GreaterThan,
        CompareOp::Ge => FloatCC::GreaterThanOrEqual,
    }
}

/// Whether an opcode has a native translation
fn is_native_opcode(opcode: &Opcode) -> bool {
    use Opcode::*;
    match opcode {
        IConst(_) | LConst(_) | FConst(_) | DConst(_) => true,
        IArith(op) | LArith(op) => matches!(op, NumericOp::Add | NumericOp::Sub | NumericOp::Mul),
        FArith(op) | DArith(op) => !matches!(op, NumericOp::Rem),
        INeg | LNeg | FNeg | DNeg | INot => true,
        ICmp(_) | LCmp(_) | FCmp(_) | DCmp(_) => true,
        I2L | I2F | I2D | L2I | L2F | L2D | F2I | F2L | F2D | D2I | D2L | D2F => true,
        _ => false,
    }
}

/// Kind of the boxed result when the chunk qualifies for the native tier
pub fn native_result_kind(chunk: &CodeChunk) -> Option<PrimitiveKind> {
    let ops: Vec<&Opcode> = chunk.opcodes().collect();
    let [body @ .., Opcode::Box(kind), Opcode::Return] = ops.as_slice() else {
        return None;
    };
    (!body.is_empty() && body.iter().all(|op| is_native_opcode(op))).then_some(*kind)
}

/// A finalized native function and the module owning its memory
pub struct NativeFunction {
    module: Option<JITModule>,
    code: *const u8,
    kind: PrimitiveKind,
}

// SAFETY: the code is finalized and never written again; it reads no
// shared state, so calling it from any thread is sound. The module is only
// touched again on drop, which needs exclusive ownership.
unsafe impl Send for NativeFunction {}
unsafe impl Sync for NativeFunction {}

impl NativeFunction {
    /// Run the native code and box its result
    pub fn call(&self) -> Value {
        // SAFETY: the signature was built from `kind` in `build_ir`.
        let slot = unsafe {
            match self.kind.stack_kind() {
                PrimitiveKind::Long => {
                    let f: extern "C" fn() -> i64 = std::mem::transmute(self.code);
                    Slot::Long(f())
                }
                PrimitiveKind::Float => {
                    let f: extern "C" fn() -> f32 = std::mem::transmute(self.code);
                    Slot::Float(f())
                }
                PrimitiveKind::Double => {
                    let f: extern "C" fn() -> f64 = std::mem::transmute(self.code);
                    Slot::Double(f())
                }
                _ => {
                    let f: extern "C" fn() -> i32 = std::mem::transmute(self.code);
                    Slot::Int(f())
                }
            }
        };
        box_slot(self.kind, slot).unwrap_or(Value::Null)
    }

    /// Kind of the boxed result
    pub fn result_kind(&self) -> PrimitiveKind {
        self.kind
    }
}

impl Drop for NativeFunction {
    fn drop(&mut self) {
        if let Some(module) = self.module.take() {
            // SAFETY: `code` points into this module and dies with it.
            unsafe { module.free_memory() };
        }
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Cranelift-based native code generator.
///
/// Each backend owns one JIT module and compiles one function into it.
pub struct CraneliftBackend {
    module: JITModule,
    ctx: Context,
}

impl CraneliftBackend {
    /// Create a backend for the host machine
    pub fn new() -> Result<Self, CompileError> {
        let host = Triple::host();
        if !matches!(
            host.architecture,
            Architecture::X86_64 | Architecture::Aarch64(_) | Architecture::Riscv64(_) | Architecture::S390x
        ) {
            return Err(CompileError::Backend(format!(
                "no native tier for {}",
                host.architecture
            )));
        }

        let mut flag_builder = settings::builder();
        flag_builder.set("opt_level", "speed").map_err(backend_error)?;
        flag_builder.set("is_pic", "false").map_err(backend_error)?;

        let isa_builder = cranelift_native::builder().map_err(backend_error)?;
        let isa = isa_builder
            .finish(settings::Flags::new(flag_builder))
            .map_err(backend_error)?;

        let builder = JITBuilder::with_isa(isa, cranelift_module::default_libcall_names());
        let module = JITModule::new(builder);
        let ctx = module.make_context();
        Ok(Self { module, ctx })
    }

    /// Compile a qualifying chunk into a native function
    pub fn compile_function(mut self, chunk: &CodeChunk) -> Result<NativeFunction, CompileError> {
        let kind = native_result_kind(chunk).ok_or_else(|| {
            CompileError::Backend(format!("'{}' is not purely numeric", chunk.name))
        })?;
        self.build_ir(chunk, kind)?;

        let name = format!("expr_{}", chunk.name);
        let id = self
            .module
            .declare_function(&name, Linkage::Export, &self.ctx.func.signature)
            .map_err(backend_error)?;
        self.module
            .define_function(id, &mut self.ctx)
            .map_err(backend_error)?;
        self.module.clear_context(&mut self.ctx);
        self.module.finalize_definitions().map_err(backend_error)?;

        let code = self.module.get_finalized_function(id);
        Ok(NativeFunction {
            module: Some(self.module),
            code,
            kind,
        })
    }

    fn build_ir(&mut self, chunk: &CodeChunk, kind: PrimitiveKind) -> Result<(), CompileError> {
        let mut sig = self.module.make_signature();
        sig.returns.push(AbiParam::new(clif_type(kind)));
        self.ctx.func.signature = sig;

        let mut builder_ctx = FunctionBuilderContext::new();
        let mut builder = FunctionBuilder::new(&mut self.ctx.func, &mut builder_ctx);
        let entry_block = builder.create_block();
        builder.switch_to_block(entry_block);
        builder.seal_block(entry_block);

        let mut stack: Vec<cranelift_codegen::ir::Value> = Vec::new();
        let underflow = || CompileError::Backend("operand stack underflow".to_string());

        let body = chunk.opcodes().take(chunk.instruction_count().saturating_sub(2));
        for opcode in body {
            let value = match opcode {
                Opcode::IConst(n) => builder.ins().iconst(types::I32, i64::from(*n)),
                Opcode::LConst(n) => builder.ins().iconst(types::I64, *n),
                Opcode::FConst(n) => builder.ins().f32const(*n),
                Opcode::DConst(n) => builder.ins().f64const(*n),
                Opcode::IArith(op) | Opcode::LArith(op) => {
                    let b = stack.pop().ok_or_else(underflow)?;
                    let a = stack.pop().ok_or_else(underflow)?;
                    match op {
                        NumericOp::Add => builder.ins().iadd(a, b),
                        NumericOp::Sub => builder.ins().isub(a, b),
                        NumericOp::Mul => builder.ins().imul(a, b),
                        _ => return Err(CompileError::Backend("integer division".to_string())),
                    }
                }
                Opcode::FArith(op) | Opcode::DArith(op) => {
                    let b = stack.pop().ok_or_else(underflow)?;
                    let a = stack.pop().ok_or_else(underflow)?;
                    match op {
                        NumericOp::Add => builder.ins().fadd(a, b),
                        NumericOp::Sub => builder.ins().fsub(a, b),
                        NumericOp::Mul => builder.ins().fmul(a, b),
                        NumericOp::Div => builder.ins().fdiv(a, b),
                        NumericOp::Rem => {
                            return Err(CompileError::Backend("float remainder".to_string()))
                        }
                    }
                }
                Opcode::INeg | Opcode::LNeg => {
                    let a = stack.pop().ok_or_else(underflow)?;
                    builder.ins().ineg(a)
                }
                Opcode::FNeg | Opcode::DNeg => {
                    let a = stack.pop().ok_or_else(underflow)?;
                    builder.ins().fneg(a)
                }
                Opcode::INot => {
                    let a = stack.pop().ok_or_else(underflow)?;
                    let is_zero = builder.ins().icmp_imm(IntCC::Equal, a, 0);
                    builder.ins().uextend(types::I32, is_zero)
                }
                Opcode::ICmp(op) | Opcode::LCmp(op) => {
                    let b = stack.pop().ok_or_else(underflow)?;
                    let a = stack.pop().ok_or_else(underflow)?;
                    let flag = builder.ins().icmp(int_cc(*op), a, b);
                    builder.ins().uextend(types::I32, flag)
                }
                Opcode::FCmp(op) | Opcode::DCmp(op) => {
                    let b = stack.pop().ok_or_else(underflow)?;
                    let a = stack.pop().ok_or_else(underflow)?;
                    let flag = builder.ins().fcmp(float_cc(*op), a, b);
                    builder.ins().uextend(types::I32, flag)
                }
                Opcode::I2L => {
                    let a = stack.pop().ok_or_else(underflow)?;
                    builder.ins().sextend(types::I64, a)
                }
                Opcode::L2I => {
                    let a = stack.pop().ok_or_else(underflow)?;
                    builder.ins().ireduce(types::I32, a)
                }
                Opcode::I2F | Opcode::L2F => {
                    let a = stack.pop().ok_or_else(underflow)?;
                    builder.ins().fcvt_from_sint(types::F32, a)
                }
                Opcode::I2D | Opcode::L2D => {
                    let a = stack.pop().ok_or_else(underflow)?;
                    builder.ins().fcvt_from_sint(types::F64, a)
                }
                Opcode::F2I | Opcode::D2I => {
                    let a = stack.pop().ok_or_else(underflow)?;
                    builder.ins().fcvt_to_sint_sat(types::I32, a)
                }
                Opcode::F2L | Opcode::D2L => {
                    let a = stack.pop().ok_or_else(underflow)?;
                    builder.ins().fcvt_to_sint_sat(types::I64, a)
                }
                Opcode::F2D => {
                    let a = stack.pop().ok_or_else(underflow)?;
                    builder.ins().fpromote(types::F64, a)
                }
                Opcode::D2F => {
                    let a = stack.pop().ok_or_else(underflow)?;
                    builder.ins().fdemote(types::F32, a)
                }
                other => {
                    return Err(CompileError::Backend(format!(
                        "no native translation for {:?}",
                        other
                    )))
                }
            };
            stack.push(value);
        }

        let result = stack.pop().ok_or_else(underflow)?;
        if !stack.is_empty() {
            return Err(CompileError::Backend("unbalanced operand stack".to_string()));
        }
        builder.ins().return_(&[result]);
        builder.finalize();
        Ok(())
    }
}
