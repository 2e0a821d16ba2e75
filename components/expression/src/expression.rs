//! Parsed expressions and their compilation lifecycle

use crate::state::{CompilationState, StateCell};
use core_types::{EvalResult, TypeDescriptor, TypedValue, Value};
use interpreter::{
    CompilerConfiguration, CompilerMode, EvaluationContext, ExpressionState, Node,
    StandardEvaluationContext,
};
use jit_compiler::{CompiledUnit, Deoptimizer, ExpressionCompiler, UnitFailure};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A parsed expression, ready to evaluate any number of times.
///
/// Evaluation starts out by walking the tree. Depending on the
/// configuration's [`CompilerMode`], the tree is later compiled and the
/// compiled unit is preferred. A unit whose compile-time type assumptions
/// stop holding is discarded and the expression interprets for good.
///
/// Expressions are shared freely between threads; every call evaluates
/// against its own [`ExpressionState`].
#[derive(Debug)]
pub struct Expression {
    source: String,
    ast: Box<dyn Node>,
    configuration: Arc<CompilerConfiguration>,
    compiler: ExpressionCompiler,
    state: StateCell,
    compiled: RwLock<Option<Arc<CompiledUnit>>>,
    compile_lock: Mutex<()>,
    interpreted: AtomicU64,
    deoptimizer: Deoptimizer,
}

impl Expression {
    pub(crate) fn new(
        source: String,
        ast: Box<dyn Node>,
        configuration: Arc<CompilerConfiguration>,
        compiler: ExpressionCompiler,
    ) -> Self {
        Self {
            source,
            ast,
            configuration,
            compiler,
            state: StateCell::new(),
            compiled: RwLock::new(None),
            compile_lock: Mutex::new(()),
            interpreted: AtomicU64::new(0),
            deoptimizer: Deoptimizer::new(),
        }
    }

    /// Source text the expression was parsed from
    pub fn expression_string(&self) -> &str {
        &self.source
    }

    /// Root of the expression tree
    pub fn ast(&self) -> &dyn Node {
        self.ast.as_ref()
    }

    /// Configuration the expression was parsed with
    pub fn configuration(&self) -> &CompilerConfiguration {
        &self.configuration
    }

    /// Evaluate against a fresh default context
    pub fn get_value(&self) -> EvalResult<Value> {
        self.evaluate(&StandardEvaluationContext::new(), None)
    }

    /// Evaluate against a fresh default context and the given root object
    pub fn get_value_with_root(&self, root: &Value) -> EvalResult<Value> {
        self.evaluate(&StandardEvaluationContext::new(), Some(root))
    }

    /// Evaluate against a context and its root object
    pub fn get_value_in(&self, context: &dyn EvaluationContext) -> EvalResult<Value> {
        self.evaluate(context, None)
    }

    /// Evaluate against a context with a root object overriding its own
    pub fn get_value_in_with_root(
        &self,
        context: &dyn EvaluationContext,
        root: &Value,
    ) -> EvalResult<Value> {
        self.evaluate(context, Some(root))
    }

    /// Evaluate and convert the result through the context's type converter
    pub fn get_value_as(
        &self,
        context: &dyn EvaluationContext,
        root: Option<&Value>,
        desired: &TypeDescriptor,
    ) -> EvalResult<Value> {
        let value = self.evaluate(context, root)?;
        let source = TypeDescriptor::of(&value);
        if *desired == TypeDescriptor::Any || source.as_ref() == Some(desired) {
            return Ok(value);
        }
        context
            .type_converter()
            .convert_value(&value, source.as_ref(), desired)
    }

    /// Assign through the expression, e.g. `name` or `list[0]`
    pub fn set_value(
        &self,
        context: &dyn EvaluationContext,
        root: Option<&Value>,
        value: Value,
    ) -> EvalResult<()> {
        let mut state = self.state_for(context, root);
        self.ast.set_value(&mut state, TypedValue::new(value))
    }

    /// Whether [`Expression::set_value`] would succeed in principle
    pub fn is_writable(
        &self,
        context: &dyn EvaluationContext,
        root: Option<&Value>,
    ) -> EvalResult<bool> {
        let mut state = self.state_for(context, root);
        self.ast.is_writable(&mut state)
    }

    /// Type of the value the expression currently evaluates to, `None` for
    /// null
    pub fn get_value_type(
        &self,
        context: &dyn EvaluationContext,
        root: Option<&Value>,
    ) -> EvalResult<Option<TypeDescriptor>> {
        let mut state = self.state_for(context, root);
        let typed = self.ast.get_value_internal(&mut state)?;
        Ok(typed
            .type_descriptor()
            .cloned()
            .or_else(|| TypeDescriptor::of(typed.value())))
    }

    /// Compile now, whatever the mode.
    ///
    /// Returns whether a compiled unit is in place afterwards. Fails once
    /// the expression has fallen back to interpretation, and whenever part
    /// of the tree has not been evaluated yet. A failed explicit attempt
    /// leaves the state as it was.
    pub fn compile(&self) -> bool {
        let _guard = self.compile_lock.lock();
        match self.state.get() {
            CompilationState::Compiled => return true,
            CompilationState::InterpretingFallback => return false,
            _ => {}
        }
        match self.compiler.compile(self.ast.as_ref()) {
            Ok(unit) => {
                self.publish(unit);
                true
            }
            Err(_) => false,
        }
    }

    /// Drop the compiled unit and interpret until compiled again.
    ///
    /// An expression that has fallen back stays in fallback.
    pub fn revert_to_interpreted(&self) {
        let _guard = self.compile_lock.lock();
        if self.state.transition(CompilationState::Compiled, CompilationState::Interpreting) {
            *self.compiled.write() = None;
        }
    }

    /// Current compilation state
    pub fn compilation_state(&self) -> CompilationState {
        self.state.get()
    }

    /// Number of evaluations that walked the tree
    pub fn interpreted_count(&self) -> u64 {
        self.interpreted.load(Ordering::Relaxed)
    }

    /// The published compiled unit, if any
    pub fn compiled_unit(&self) -> Option<Arc<CompiledUnit>> {
        self.compiled.read().clone()
    }

    fn state_for<'a>(
        &'a self,
        context: &'a dyn EvaluationContext,
        root: Option<&Value>,
    ) -> ExpressionState<'a> {
        let root = root
            .map(|value| TypedValue::new(value.clone()))
            .unwrap_or_else(|| context.root_object());
        ExpressionState::with_root(context, root, &self.configuration)
    }

    fn evaluate(&self, context: &dyn EvaluationContext, root: Option<&Value>) -> EvalResult<Value> {
        if self.configuration.mode == CompilerMode::Immediate
            && self.state.get() == CompilationState::Parsed
            && self.ast.is_compilable()
        {
            self.attempt_compile();
        }

        if let Some(unit) = self.compiled_unit() {
            let target = root
                .cloned()
                .unwrap_or_else(|| context.root_object().into_value());
            match unit.get_value(&target, context) {
                Ok(value) => return Ok(value),
                Err(UnitFailure::Evaluation(err)) => return Err(err),
                Err(failure) => self.disqualify(&failure),
            }
        }

        let result = self.interpret(context, root);
        if result.is_ok() {
            self.after_interpretation();
        }
        result
    }

    fn interpret(&self, context: &dyn EvaluationContext, root: Option<&Value>) -> EvalResult<Value> {
        self.state
            .transition(CompilationState::Parsed, CompilationState::Interpreting);
        self.interpreted.fetch_add(1, Ordering::Relaxed);
        let mut state = self.state_for(context, root);
        self.ast.get_value(&mut state)
    }

    fn after_interpretation(&self) {
        if self.state.get() != CompilationState::Interpreting {
            return;
        }
        let warm = match self.configuration.mode {
            CompilerMode::Off => false,
            CompilerMode::Immediate => true,
            CompilerMode::Mixed => {
                self.interpreted_count() >= u64::from(self.configuration.warm_up_threshold)
            }
        };
        if warm {
            self.attempt_compile();
        }
    }

    /// One automatic compile attempt; losers of the race keep interpreting
    fn attempt_compile(&self) {
        let Some(_guard) = self.compile_lock.try_lock() else {
            return;
        };
        let started = self
            .state
            .transition(CompilationState::Parsed, CompilationState::CompilationAttempted)
            || self
                .state
                .transition(CompilationState::Interpreting, CompilationState::CompilationAttempted);
        if !started {
            return;
        }
        match self.compiler.compile(self.ast.as_ref()) {
            Ok(unit) => self.publish(unit),
            Err(err) => {
                tracing::debug!(
                    expression = %self.source,
                    error = %err,
                    "compilation failed, interpreting from now on"
                );
                self.state.set(CompilationState::InterpretingFallback);
            }
        }
    }

    fn publish(&self, unit: CompiledUnit) {
        *self.compiled.write() = Some(Arc::new(unit));
        self.state.set(CompilationState::Compiled);
        tracing::debug!(expression = %self.source, "compiled unit published");
    }

    fn disqualify(&self, failure: &UnitFailure) {
        if self.deoptimizer.record(&self.source, failure) {
            *self.compiled.write() = None;
            self.state.set(CompilationState::InterpretingFallback);
        }
    }
}
