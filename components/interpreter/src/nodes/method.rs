//! Method invocation such as `name.substring(1, 3)`

use crate::context::EvaluationContext;
use crate::inline_cache::InlineCache;
use crate::method::{format_signature, MethodExecutor};
use crate::node::{generate_operand, load_receiver, ExitDescriptor, Node, NodeBase};
use crate::state::ExpressionState;
use bytecode_system::{CodeFlow, CompileError, Descriptor};
use core_types::{EvalResult, MessageCode, SourceSpan, TypeDescriptor, TypedValue, Value};
use parking_lot::RwLock;
use std::sync::Arc;

type ArgTypes = Vec<Option<TypeDescriptor>>;

/// Calls a method on the active context object.
///
/// Arguments are evaluated against the scope root rather than the receiver,
/// so `a.b(c)` reads `c` from the same object `a` was read from.
#[derive(Debug)]
pub struct MethodReference {
    base: NodeBase,
    name: String,
    null_safe: bool,
    cache: RwLock<InlineCache<(ArgTypes, Arc<dyn MethodExecutor>)>>,
    target_exit: ExitDescriptor,
}

impl MethodReference {
    /// Call of `name` with argument expressions
    pub fn new(
        name: impl Into<String>,
        null_safe: bool,
        arguments: Vec<Box<dyn Node>>,
        span: SourceSpan,
    ) -> Self {
        Self {
            base: NodeBase::new(span, arguments),
            name: name.into(),
            null_safe,
            cache: RwLock::new(InlineCache::new()),
            target_exit: ExitDescriptor::new(),
        }
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    fn evaluate_arguments(&self, state: &mut ExpressionState<'_>) -> EvalResult<Vec<Value>> {
        let root = state.scope_root_context_object();
        let mut guard = state.scoped_active_context_object(root);
        self.children()
            .iter()
            .map(|arg| arg.get_value_internal(&mut guard).map(TypedValue::into_value))
            .collect()
    }

    fn resolve(
        &self,
        context: &dyn EvaluationContext,
        target: &Value,
        arg_types: &ArgTypes,
    ) -> EvalResult<Arc<dyn MethodExecutor>> {
        let key = target.type_descriptor();
        let cached = self.cache.read().lookup(&key);
        if let Some((types, executor)) = cached {
            if types == *arg_types {
                return Ok(executor);
            }
        }
        for resolver in context.method_resolvers() {
            if let Some(executor) = resolver.resolve(context, target, &self.name, arg_types)? {
                self.cache
                    .write()
                    .update(key, (arg_types.clone(), Arc::clone(&executor)));
                return Ok(executor);
            }
        }
        Err(self.base.error(
            MessageCode::MethodNotFound,
            [format_signature(&self.name, arg_types), target.type_name()],
        ))
    }
}

impl Node for MethodReference {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn get_value_internal(&self, state: &mut ExpressionState<'_>) -> EvalResult<TypedValue> {
        let target = state.active_context_object();
        let args = self.evaluate_arguments(state)?;
        let arg_types: ArgTypes = args.iter().map(Value::type_descriptor).collect();
        if target.is_null() {
            if self.null_safe {
                return Ok(TypedValue::null());
            }
            return Err(self.base.error(
                MessageCode::MethodCallOnNullObjectNotAllowed,
                [format_signature(&self.name, &arg_types)],
            ));
        }
        let context = state.evaluation_context();
        let executor = self.resolve(context, target.value(), &arg_types)?;
        let result = self
            .base
            .locate(executor.execute(context, target.value(), &args))?;
        self.target_exit.observe_value(target.value());
        self.base.exit.observe_value(result.value());
        Ok(result)
    }

    fn to_expression_string(&self) -> String {
        let args: Vec<String> = self
            .children()
            .iter()
            .map(|arg| arg.to_expression_string())
            .collect();
        let call = format!("{}({})", self.name, args.join(", "));
        if self.null_safe {
            format!("?.{}", call)
        } else {
            call
        }
    }

    fn is_compilable(&self) -> bool {
        if self.null_safe || self.exit_descriptor().is_none() || self.target_exit.get().is_none() {
            return false;
        }
        let executor_compilable = self
            .cache
            .read()
            .monomorphic_entry()
            .is_some_and(|(_, (_, executor))| executor.is_compilable());
        executor_compilable && self.children_compilable()
    }

    fn generate_code(&self, cf: &mut CodeFlow) -> Result<(), CompileError> {
        let not_compilable = || CompileError::NotCompilable(self.to_expression_string());
        let executor = self
            .cache
            .read()
            .monomorphic_entry()
            .map(|(_, (_, executor))| Arc::clone(executor))
            .ok_or_else(not_compilable)?;
        let target = self.target_exit.get().ok_or_else(not_compilable)?;
        let exit = self.exit_descriptor().ok_or_else(not_compilable)?;
        load_receiver(cf, &target)?;
        for arg in self.children() {
            let descriptor = generate_operand(arg.as_ref(), cf)?;
            cf.insert_boxing_if_necessary(&descriptor);
        }
        executor.generate_code(self.children().len(), self.span(), cf)?;
        cf.insert_check_cast(&exit, Some(&Descriptor::Object))?;
        cf.push_descriptor(exit);
        Ok(())
    }
}
