//! Inline lists such as `{1, 2, 3}`

use crate::node::{ExitDescriptor, Node, NodeBase};
use crate::state::ExpressionState;
use bytecode_system::{CodeFlow, CompileError, Descriptor, FieldInit, Opcode};
use core_types::{EvalResult, SourceSpan, TypedValue, Value};

/// A list literal.
///
/// When every element is a literal the list is constant: its elements are
/// captured once, and each evaluation still yields a fresh list so callers
/// can mutate the result.
#[derive(Debug)]
pub struct InlineList {
    base: NodeBase,
    constant: Option<Vec<Value>>,
}

impl InlineList {
    /// List of element expressions
    pub fn new(elements: Vec<Box<dyn Node>>, span: SourceSpan) -> Self {
        let constant = elements
            .iter()
            .map(|element| element.literal_value().cloned())
            .collect::<Option<Vec<_>>>();
        Self {
            base: NodeBase::with_exit(span, elements, ExitDescriptor::fixed(Descriptor::List)),
            constant,
        }
    }

    /// Whether the elements are all literals
    pub fn is_constant(&self) -> bool {
        self.constant.is_some()
    }
}

impl Node for InlineList {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn get_value_internal(&self, state: &mut ExpressionState<'_>) -> EvalResult<TypedValue> {
        let items = match &self.constant {
            Some(values) => values.clone(),
            None => self
                .children()
                .iter()
                .map(|element| element.get_value(state))
                .collect::<EvalResult<Vec<_>>>()?,
        };
        Ok(TypedValue::new(Value::list(items)))
    }

    fn to_expression_string(&self) -> String {
        let elements: Vec<String> = self
            .children()
            .iter()
            .map(|element| element.to_expression_string())
            .collect();
        format!("{{{}}}", elements.join(","))
    }

    fn is_compilable(&self) -> bool {
        self.is_constant()
    }

    fn generate_code(&self, cf: &mut CodeFlow) -> Result<(), CompileError> {
        let values = self
            .constant
            .clone()
            .ok_or_else(|| CompileError::NotCompilable(self.to_expression_string()))?;
        let key = format!("inline-list-{}", self.id());
        let name = format!("inlineList${}", self.id().0);
        let field = cf.register_static_field(&key, &name, FieldInit::List(values));
        cf.emit_at(Opcode::GetField(field), self.span());
        cf.push_descriptor(Descriptor::List);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompilerConfiguration;
    use crate::context::StandardEvaluationContext;
    use crate::nodes::{Literal, VariableReference};

    fn span() -> SourceSpan {
        SourceSpan::new(0, 7)
    }

    #[test]
    fn test_constant_list_yields_fresh_copies() {
        let ctx = StandardEvaluationContext::new();
        let config = CompilerConfiguration::default();
        let mut state = ExpressionState::new(&ctx, &config);
        let node = InlineList::new(
            vec![Box::new(Literal::int(1, span())), Box::new(Literal::int(2, span()))],
            span(),
        );
        assert!(node.is_constant());
        let first = node.get_value(&mut state).unwrap();
        if let Value::List(items) = &first {
            items.write().push(Value::Int(3));
        }
        assert_eq!(node.get_value(&mut state).unwrap().to_string(), "[1, 2]");
        assert_eq!(node.to_expression_string(), "{1,2}");
    }

    #[test]
    fn test_constant_list_registers_one_field() {
        let node = InlineList::new(vec![Box::new(Literal::string("a", span()))], span());
        let mut cf = CodeFlow::for_chunk("unit");
        node.generate_code(&mut cf).unwrap();
        node.generate_code(&mut cf).unwrap();
        let chunk = cf.finish(None);
        assert_eq!(chunk.fields.len(), 1);
        assert_eq!(
            chunk.fields[0].init,
            Some(FieldInit::List(vec![Value::from("a")]))
        );
    }

    #[test]
    fn test_dynamic_list_is_not_compilable() {
        let node = InlineList::new(
            vec![Box::new(VariableReference::new("x", span()))],
            span(),
        );
        assert!(!node.is_compilable());
    }
}
