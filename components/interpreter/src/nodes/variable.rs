//! Variable references: `#name`, `#this` and `#root`

use crate::node::{Node, NodeBase};
use crate::state::ExpressionState;
use bytecode_system::{CodeFlow, CompileError, Descriptor, Opcode};
use core_types::{EvalResult, SourceSpan, TypedValue};
use std::sync::atomic::{AtomicBool, Ordering};

const THIS: &str = "this";
const ROOT: &str = "root";

/// A `#name` reference.
///
/// `#this` is the element currently being selected or projected, or the
/// active context object outside such a scope. `#root` is the root object.
/// Other names resolve to a local scope variable first, then to the
/// context's variables.
#[derive(Debug)]
pub struct VariableReference {
    base: NodeBase,
    name: String,
    saw_local: AtomicBool,
}

impl VariableReference {
    /// Reference to the named variable, without the `#`
    pub fn new(name: impl Into<String>, span: SourceSpan) -> Self {
        Self {
            base: NodeBase::new(span, Vec::new()),
            name: name.into(),
            saw_local: AtomicBool::new(false),
        }
    }

    /// Variable name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Node for VariableReference {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn get_value_internal(&self, state: &mut ExpressionState<'_>) -> EvalResult<TypedValue> {
        let value = match self.name.as_str() {
            THIS => state
                .lookup_local_variable(THIS)
                .unwrap_or_else(|| state.active_context_object()),
            ROOT => state.root_object(),
            name => match state.lookup_local_variable(name) {
                Some(local) => {
                    self.saw_local.store(true, Ordering::Relaxed);
                    local
                }
                None => state.lookup_variable(name),
            },
        };
        self.base.exit.observe_value(value.value());
        Ok(value)
    }

    fn to_expression_string(&self) -> String {
        format!("#{}", self.name)
    }

    fn is_writable(&self, _state: &mut ExpressionState<'_>) -> EvalResult<bool> {
        Ok(!matches!(self.name.as_str(), THIS | ROOT))
    }

    fn set_value(&self, state: &mut ExpressionState<'_>, value: TypedValue) -> EvalResult<()> {
        match self.name.as_str() {
            THIS | ROOT => Err(self.base.error(
                core_types::MessageCode::NotAssignable,
                [self.to_expression_string()],
            )),
            name if state.lookup_local_variable(name).is_some() => {
                state.set_local_variable(name, value);
                Ok(())
            }
            name => {
                state.set_variable(name, value.into_value());
                Ok(())
            }
        }
    }

    fn is_compilable(&self) -> bool {
        self.name != THIS && !self.saw_local.load(Ordering::Relaxed) && self.exit_descriptor().is_some()
    }

    fn generate_code(&self, cf: &mut CodeFlow) -> Result<(), CompileError> {
        let exit = self
            .exit_descriptor()
            .ok_or_else(|| CompileError::NotCompilable(self.to_expression_string()))?;
        match self.name.as_str() {
            THIS => return Err(CompileError::NotCompilable(self.to_expression_string())),
            ROOT => cf.emit_at(Opcode::LoadTarget, self.span()),
            name => cf.emit_at(Opcode::LoadVariable(name.to_string()), self.span()),
        }
        cf.insert_check_cast(&exit, Some(&Descriptor::Object))?;
        cf.push_descriptor(exit);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompilerConfiguration;
    use crate::context::{EvaluationContext, StandardEvaluationContext};
    use core_types::{MessageCode, Value};

    fn span() -> SourceSpan {
        SourceSpan::new(0, 5)
    }

    #[test]
    fn test_this_defaults_to_active_object() {
        let ctx = StandardEvaluationContext::with_root(Value::Int(5));
        let config = CompilerConfiguration::default();
        let mut state = ExpressionState::new(&ctx, &config);
        let this = VariableReference::new("this", span());
        assert_eq!(this.get_value(&mut state).unwrap(), Value::Int(5));
        state.enter_scope_with("this", TypedValue::new(Value::Int(9)));
        assert_eq!(this.get_value(&mut state).unwrap(), Value::Int(9));
        state.exit_scope();
        assert!(!this.is_compilable());
    }

    #[test]
    fn test_context_variables_and_assignment() {
        let ctx = StandardEvaluationContext::new();
        ctx.set_variable("x", Value::from("a"));
        let config = CompilerConfiguration::default();
        let mut state = ExpressionState::new(&ctx, &config);
        let x = VariableReference::new("x", span());
        assert_eq!(x.get_value(&mut state).unwrap(), Value::from("a"));
        assert!(x.is_compilable());
        x.set_value(&mut state, TypedValue::new(Value::Int(1))).unwrap();
        assert_eq!(ctx.lookup_variable("x"), Some(Value::Int(1)));
        let unbound = VariableReference::new("missing", span());
        assert_eq!(unbound.get_value(&mut state).unwrap(), Value::Null);
    }

    #[test]
    fn test_root_is_not_assignable() {
        let ctx = StandardEvaluationContext::new();
        let config = CompilerConfiguration::default();
        let mut state = ExpressionState::new(&ctx, &config);
        let root = VariableReference::new("root", span());
        assert!(!root.is_writable(&mut state).unwrap());
        let err = root
            .set_value(&mut state, TypedValue::null())
            .unwrap_err();
        assert_eq!(err.code, MessageCode::NotAssignable);
    }
}
