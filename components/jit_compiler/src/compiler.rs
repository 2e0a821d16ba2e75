//! Expression compiler
//!
//! Drives code generation over an expression tree, then optimizes, verifies
//! and links the result into a [`CompiledUnit`]. Purely numeric code is also
//! handed to the native tier when it is enabled.

use crate::compiled_unit::CompiledUnit;
use crate::cranelift_backend::{native_result_kind, CraneliftBackend, NativeFunction};
use crate::verifier::verify;
use bytecode_system::{CodeChunk, CodeFlow, CompileError, Descriptor, Opcode, Optimizer};
use interpreter::Node;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters shared by every compilation of one compiler
#[derive(Debug, Default)]
pub struct CompilerStats {
    units_compiled: AtomicU64,
    compile_failures: AtomicU64,
    native_units: AtomicU64,
    instructions_emitted: AtomicU64,
}

/// Point-in-time copy of [`CompilerStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Units linked successfully
    pub units_compiled: u64,
    /// Trees that failed to compile
    pub compile_failures: u64,
    /// Units running native code
    pub native_units: u64,
    /// Instructions in linked units after optimization
    pub instructions_emitted: u64,
}

impl CompilerStats {
    /// Current counter values
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            units_compiled: self.units_compiled.load(Ordering::Relaxed),
            compile_failures: self.compile_failures.load(Ordering::Relaxed),
            native_units: self.native_units.load(Ordering::Relaxed),
            instructions_emitted: self.instructions_emitted.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.units_compiled.store(0, Ordering::Relaxed);
        self.compile_failures.store(0, Ordering::Relaxed);
        self.native_units.store(0, Ordering::Relaxed);
        self.instructions_emitted.store(0, Ordering::Relaxed);
    }
}

/// Compiler from expression trees to [`CompiledUnit`]s.
///
/// Compilation never evaluates anything: the tree supplies the descriptors
/// it observed while being interpreted, and a tree whose nodes have not
/// seen enough reports itself as not compilable.
///
/// ```
/// use core_types::{SourceSpan, Value};
/// use interpreter::nodes::{ArithmeticKind, Literal, OpArithmetic};
/// use interpreter::{CompilerConfiguration, ExpressionState, Node, StandardEvaluationContext};
/// use jit_compiler::ExpressionCompiler;
///
/// let span = SourceSpan::new(0, 5);
/// let tree = OpArithmetic::new(
///     ArithmeticKind::Plus,
///     Box::new(Literal::int(2, span)),
///     Box::new(Literal::int(3, span)),
///     span,
/// );
/// let ctx = StandardEvaluationContext::new();
/// let config = CompilerConfiguration::default();
///
/// // The sum's result type is only known once it has been interpreted
/// assert!(ExpressionCompiler::new(false).compile(&tree).is_err());
/// tree.get_value(&mut ExpressionState::new(&ctx, &config)).unwrap();
///
/// let unit = ExpressionCompiler::new(false).compile(&tree).unwrap();
/// assert_eq!(unit.get_value(&Value::Null, &ctx), Ok(Value::Int(5)));
/// ```
#[derive(Debug, Clone)]
pub struct ExpressionCompiler {
    native_tier: bool,
    optimizer: Optimizer,
    stats: Arc<CompilerStats>,
}

impl ExpressionCompiler {
    /// Create a compiler; `native_tier` enables native code for numeric units
    pub fn new(native_tier: bool) -> Self {
        Self {
            native_tier,
            optimizer: Optimizer::new(),
            stats: Arc::new(CompilerStats::default()),
        }
    }

    /// Compile an expression tree
    pub fn compile(&self, root: &dyn Node) -> Result<CompiledUnit, CompileError> {
        let result = self.compile_tree(root);
        match &result {
            Ok(unit) => {
                self.stats.units_compiled.fetch_add(1, Ordering::Relaxed);
                self.stats
                    .instructions_emitted
                    .fetch_add(unit.chunk().instruction_count() as u64, Ordering::Relaxed);
                if unit.is_native() {
                    self.stats.native_units.fetch_add(1, Ordering::Relaxed);
                }
                tracing::debug!(
                    expression = %unit.chunk().name,
                    instructions = unit.chunk().instruction_count(),
                    native = unit.is_native(),
                    "compiled expression"
                );
            }
            Err(err) => {
                self.stats.compile_failures.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    expression = %root.to_expression_string(),
                    error = %err,
                    "expression not compiled"
                );
            }
        }
        result
    }

    fn compile_tree(&self, root: &dyn Node) -> Result<CompiledUnit, CompileError> {
        if !root.is_compilable() {
            return Err(CompileError::NotCompilable(root.to_expression_string()));
        }
        let mut chunk = generate(root)?;
        self.optimizer.optimize(&mut chunk);
        verify(&chunk)?;

        let native = if self.native_tier {
            self.try_native(&chunk)
        } else {
            None
        };
        CompiledUnit::link(chunk, native)
    }

    fn try_native(&self, chunk: &CodeChunk) -> Option<NativeFunction> {
        native_result_kind(chunk)?;
        match CraneliftBackend::new().and_then(|backend| backend.compile_function(chunk)) {
            Ok(function) => Some(function),
            Err(err) => {
                tracing::debug!(error = %err, "native tier unavailable, using executor");
                None
            }
        }
    }

    /// Shared counters
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Zero all counters
    pub fn reset_stats(&self) {
        self.stats.reset();
    }
}

impl Default for ExpressionCompiler {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Generate the body of a tree and terminate it with a boxed return
fn generate(root: &dyn Node) -> Result<CodeChunk, CompileError> {
    let mut cf = CodeFlow::for_chunk(root.to_expression_string());
    root.generate_code(&mut cf)?;
    let last = cf.last_descriptor().cloned().ok_or_else(|| {
        CompileError::InvalidCode(format!("'{}' left no value", root.to_expression_string()))
    })?;
    if let Descriptor::Primitive(kind) = last {
        cf.insert_boxing(kind);
    }
    cf.emit(Opcode::Return);
    Ok(cf.finish(Some(last.boxed())))
}
