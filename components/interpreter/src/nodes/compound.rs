//! Dotted navigation such as `a.b.c`

use crate::node::{Node, NodeBase};
use crate::state::ExpressionState;
use bytecode_system::{CodeFlow, CompileError};
use core_types::{EvalResult, SourceSpan, TypedValue};

/// A chain of steps, each evaluated against the previous step's value
#[derive(Debug)]
pub struct CompoundExpression {
    base: NodeBase,
}

impl CompoundExpression {
    /// Chain of at least two steps
    pub fn new(steps: Vec<Box<dyn Node>>, span: SourceSpan) -> Self {
        if let Some((_, init)) = steps.split_last() {
            for step in init {
                step.base().mark_navigation_step();
            }
        }
        Self {
            base: NodeBase::new(span, steps),
        }
    }

    /// Evaluate every step but the last, returning the final receiver
    fn navigate(&self, state: &mut ExpressionState<'_>) -> EvalResult<TypedValue> {
        let steps = self.children();
        let Some((first, rest)) = steps.split_first() else {
            return Ok(state.active_context_object());
        };
        let mut result = first.get_value_internal(state)?;
        for step in rest.iter().take(rest.len().saturating_sub(1)) {
            let mut guard = state.scoped_active_context_object(result);
            result = step.get_value_internal(&mut guard)?;
        }
        Ok(result)
    }

    fn last_step(&self) -> Option<&dyn Node> {
        match self.children() {
            [_, .., last] => Some(last.as_ref()),
            _ => None,
        }
    }
}

impl Node for CompoundExpression {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn get_value_internal(&self, state: &mut ExpressionState<'_>) -> EvalResult<TypedValue> {
        let receiver = self.navigate(state)?;
        match self.last_step() {
            Some(last) => {
                let mut guard = state.scoped_active_context_object(receiver);
                last.get_value_internal(&mut guard)
            }
            None => Ok(receiver),
        }
    }

    fn is_writable(&self, state: &mut ExpressionState<'_>) -> EvalResult<bool> {
        let receiver = self.navigate(state)?;
        match self.last_step() {
            Some(last) => {
                let mut guard = state.scoped_active_context_object(receiver);
                last.is_writable(&mut guard)
            }
            None => Ok(false),
        }
    }

    fn set_value(&self, state: &mut ExpressionState<'_>, value: TypedValue) -> EvalResult<()> {
        let receiver = self.navigate(state)?;
        match self.last_step() {
            Some(last) => {
                let mut guard = state.scoped_active_context_object(receiver);
                last.set_value(&mut guard, value)
            }
            None => Err(self.base.error(
                core_types::MessageCode::NotAssignable,
                [self.to_expression_string()],
            )),
        }
    }

    fn to_expression_string(&self) -> String {
        let mut out = String::new();
        for (i, step) in self.children().iter().enumerate() {
            let text = step.to_expression_string();
            if i > 0 && !text.starts_with('[') && !text.starts_with("?.") {
                out.push('.');
            }
            out.push_str(&text);
        }
        out
    }

    fn exit_descriptor(&self) -> Option<bytecode_system::Descriptor> {
        self.last_step().and_then(|last| last.exit_descriptor())
    }

    fn is_compilable(&self) -> bool {
        self.children_compilable()
    }

    fn generate_code(&self, cf: &mut CodeFlow) -> Result<(), CompileError> {
        for step in self.children() {
            step.generate_code(cf)?;
        }
        Ok(())
    }
}
