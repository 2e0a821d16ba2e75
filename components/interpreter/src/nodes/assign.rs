//! Assignment: `name = 'value'`

use crate::node::{Node, NodeBase};
use crate::state::ExpressionState;
use core_types::{EvalResult, SourceSpan, TypedValue};

/// Evaluates the right-hand side and assigns it through the left-hand side.
///
/// Yields the assigned value. Never compiled.
#[derive(Debug)]
pub struct Assign {
    base: NodeBase,
}

impl Assign {
    /// `target = value`
    pub fn new(target: Box<dyn Node>, value: Box<dyn Node>, span: SourceSpan) -> Self {
        Self {
            base: NodeBase::new(span, vec![target, value]),
        }
    }
}

impl Node for Assign {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn get_value_internal(&self, state: &mut ExpressionState<'_>) -> EvalResult<TypedValue> {
        let [target, value] = self.children() else {
            return Ok(TypedValue::null());
        };
        let assigned = value.get_value_internal(state)?;
        target.set_value(state, assigned.clone())?;
        Ok(assigned)
    }

    fn to_expression_string(&self) -> String {
        let parts: Vec<String> = self
            .children()
            .iter()
            .map(|child| child.to_expression_string())
            .collect();
        parts.join(" = ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompilerConfiguration;
    use crate::context::{EvaluationContext, StandardEvaluationContext};
    use crate::nodes::{Literal, VariableReference};
    use core_types::Value;

    #[test]
    fn test_assign_to_variable() {
        let span = SourceSpan::new(0, 6);
        let ctx = StandardEvaluationContext::new();
        let config = CompilerConfiguration::default();
        let mut state = ExpressionState::new(&ctx, &config);
        let node = Assign::new(
            Box::new(VariableReference::new("x", span)),
            Box::new(Literal::int(4, span)),
            span,
        );
        assert_eq!(node.get_value(&mut state).unwrap(), Value::Int(4));
        assert_eq!(ctx.lookup_variable("x"), Some(Value::Int(4)));
        assert_eq!(node.to_expression_string(), "#x = 4");
        assert!(!node.is_compilable());
    }
}
