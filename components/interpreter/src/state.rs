//! Per-evaluation state
//!
//! An [`ExpressionState`] is created for each top-level evaluation call and
//! never shared between threads. It keeps the stack of active context
//! objects used as implicit receivers, and a stack of variable scopes that
//! each remember the active object at the time they were entered.
//!
//! Nodes that push an active object or enter a scope do it through the
//! guards returned by [`ExpressionState::scoped_active_context_object`] and
//! [`ExpressionState::scoped`], so both stacks are restored on every exit
//! path, including `?` returns.

use crate::config::CompilerConfiguration;
use crate::context::EvaluationContext;
use crate::overloader::Operation;
use core_types::{EvalResult, TypeDescriptor, TypedValue, Value};
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

#[derive(Debug)]
struct VariableScope {
    variables: HashMap<String, TypedValue>,
    root: TypedValue,
}

/// Cursor over an evaluation context for one evaluation
pub struct ExpressionState<'a> {
    context: &'a dyn EvaluationContext,
    root_object: TypedValue,
    configuration: &'a CompilerConfiguration,
    context_objects: Vec<TypedValue>,
    scopes: Vec<VariableScope>,
    locals: HashMap<String, TypedValue>,
}

impl<'a> ExpressionState<'a> {
    /// State rooted at the context's root object
    pub fn new(
        context: &'a dyn EvaluationContext,
        configuration: &'a CompilerConfiguration,
    ) -> Self {
        let root = context.root_object();
        Self::with_root(context, root, configuration)
    }

    /// State with an explicit root object
    pub fn with_root(
        context: &'a dyn EvaluationContext,
        root_object: TypedValue,
        configuration: &'a CompilerConfiguration,
    ) -> Self {
        Self {
            context,
            root_object,
            configuration,
            context_objects: Vec::new(),
            scopes: Vec::new(),
            locals: HashMap::new(),
        }
    }

    /// The evaluation context
    pub fn evaluation_context(&self) -> &'a dyn EvaluationContext {
        self.context
    }

    /// The compiler configuration
    pub fn configuration(&self) -> &'a CompilerConfiguration {
        self.configuration
    }

    /// The root object
    pub fn root_object(&self) -> TypedValue {
        self.root_object.clone()
    }

    // ---------------------------------------------------------------------
    // Active context objects
    // ---------------------------------------------------------------------

    /// Top of the active-object stack, or the root object when empty
    pub fn active_context_object(&self) -> TypedValue {
        self.context_objects
            .last()
            .cloned()
            .unwrap_or_else(|| self.root_object.clone())
    }

    /// Push an implicit receiver. Must be paired with
    /// [`ExpressionState::pop_active_context_object`].
    pub fn push_active_context_object(&mut self, object: TypedValue) {
        self.context_objects.push(object);
    }

    /// Pop the implicit receiver
    pub fn pop_active_context_object(&mut self) -> Option<TypedValue> {
        self.context_objects.pop()
    }

    /// Push an implicit receiver for the lifetime of the returned guard
    pub fn scoped_active_context_object<'s>(
        &'s mut self,
        object: TypedValue,
    ) -> ContextObjectGuard<'s, 'a> {
        self.push_active_context_object(object);
        ContextObjectGuard { state: self }
    }

    /// Depth of the active-object stack
    pub fn context_object_depth(&self) -> usize {
        self.context_objects.len()
    }

    // ---------------------------------------------------------------------
    // Variable scopes
    // ---------------------------------------------------------------------

    /// Enter an empty scope
    pub fn enter_scope(&mut self) {
        self.enter_scope_with_map(HashMap::new());
    }

    /// Enter a scope binding one variable
    pub fn enter_scope_with(&mut self, name: &str, value: TypedValue) {
        self.enter_scope_with_map(HashMap::from([(name.to_string(), value)]));
    }

    /// Enter a scope binding several variables
    pub fn enter_scope_with_map(&mut self, variables: HashMap<String, TypedValue>) {
        let root = self.active_context_object();
        self.scopes.push(VariableScope { variables, root });
    }

    /// Leave the innermost scope
    pub fn exit_scope(&mut self) {
        self.scopes.pop();
    }

    /// Enter a scope for the lifetime of the returned guard
    pub fn scoped<'s>(
        &'s mut self,
        variables: HashMap<String, TypedValue>,
    ) -> ScopeGuard<'s, 'a> {
        self.enter_scope_with_map(variables);
        ScopeGuard { state: self }
    }

    /// Active object captured when the innermost scope was entered
    pub fn scope_root_context_object(&self) -> TypedValue {
        self.scopes
            .last()
            .map(|scope| scope.root.clone())
            .unwrap_or_else(|| self.root_object.clone())
    }

    /// Depth of the scope stack
    pub fn scope_depth(&self) -> usize {
        self.scopes.len()
    }

    /// Set a local variable.
    ///
    /// The innermost scope defining `name` is updated; otherwise the variable
    /// is defined in the innermost scope. With no scope open it lives for the
    /// rest of the evaluation and the scope stack is left alone.
    pub fn set_local_variable(&mut self, name: &str, value: TypedValue) {
        if let Some(scope) = self
            .scopes
            .iter_mut()
            .rev()
            .find(|scope| scope.variables.contains_key(name))
        {
            scope.variables.insert(name.to_string(), value);
            return;
        }
        if let Some(local) = self.locals.get_mut(name) {
            *local = value;
            return;
        }
        match self.scopes.last_mut() {
            Some(scope) => scope.variables.insert(name.to_string(), value),
            None => self.locals.insert(name.to_string(), value),
        };
    }

    /// Look up a local variable, innermost scope first.
    ///
    /// Does not consult the evaluation context.
    pub fn lookup_local_variable(&self, name: &str) -> Option<TypedValue> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.variables.get(name))
            .or_else(|| self.locals.get(name))
            .cloned()
    }

    // ---------------------------------------------------------------------
    // Delegation to the context
    // ---------------------------------------------------------------------

    /// Set a context variable
    pub fn set_variable(&self, name: &str, value: Value) {
        self.context.set_variable(name, value);
    }

    /// Look up a context variable; null when unbound
    pub fn lookup_variable(&self, name: &str) -> TypedValue {
        self.context
            .lookup_variable(name)
            .map(TypedValue::new)
            .unwrap_or_else(TypedValue::null)
    }

    /// Apply an operation through the operator overloader.
    ///
    /// Fails with `OperatorNotSupportedBetweenTypes` when the overloader
    /// does not claim it.
    pub fn operate(&self, op: Operation, left: &Value, right: &Value) -> EvalResult<TypedValue> {
        let overloader = self.context.operator_overloader();
        if overloader.overrides_operation(op, left, right)? {
            return overloader.operate(op, left, right).map(TypedValue::new);
        }
        Err(crate::overloader::operator_not_supported(op, left, right))
    }

    /// Convert a value through the type converter
    pub fn convert_value(&self, value: &TypedValue, target: &TypeDescriptor) -> EvalResult<Value> {
        self.context
            .type_converter()
            .convert_value(value.value(), value.type_descriptor(), target)
    }
}

/// Pops the active context object it pushed when dropped
pub struct ContextObjectGuard<'s, 'a> {
    state: &'s mut ExpressionState<'a>,
}

impl<'a> Deref for ContextObjectGuard<'_, 'a> {
    type Target = ExpressionState<'a>;

    fn deref(&self) -> &Self::Target {
        self.state
    }
}

impl DerefMut for ContextObjectGuard<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.state
    }
}

impl Drop for ContextObjectGuard<'_, '_> {
    fn drop(&mut self) {
        self.state.pop_active_context_object();
    }
}

/// Exits the scope it entered when dropped
pub struct ScopeGuard<'s, 'a> {
    state: &'s mut ExpressionState<'a>,
}

impl<'a> Deref for ScopeGuard<'_, 'a> {
    type Target = ExpressionState<'a>;

    fn deref(&self) -> &Self::Target {
        self.state
    }
}

impl DerefMut for ScopeGuard<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.state
    }
}

impl Drop for ScopeGuard<'_, '_> {
    fn drop(&mut self) {
        self.state.exit_scope();
    }
}
