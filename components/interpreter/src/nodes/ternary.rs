//! Conditional operators: `a ? b : c` and `a ?: b`

use crate::node::{generate_operand, Node, NodeBase};
use crate::operators::{is_present, to_boolean};
use crate::state::ExpressionState;
use bytecode_system::{CodeFlow, CompileError, Descriptor, Opcode, PrimitiveKind};
use core_types::{EvalResult, SourceSpan, TypedValue};

/// Descriptor of a value that may come from either of two branches
fn join_exits(a: Descriptor, b: Descriptor) -> Descriptor {
    if a == b {
        a
    } else if CodeFlow::are_boxing_compatible(&a, &b) {
        a.boxed()
    } else {
        Descriptor::Object
    }
}

/// Generate a branch and adapt it to the joined descriptor
fn generate_branch(node: &dyn Node, exit: &Descriptor, cf: &mut CodeFlow) -> Result<(), CompileError> {
    let descriptor = generate_operand(node, cf)?;
    if !exit.is_primitive() {
        cf.insert_boxing_if_necessary(&descriptor);
    }
    Ok(())
}

/// `condition ? then : otherwise`
#[derive(Debug)]
pub struct Ternary {
    base: NodeBase,
}

impl Ternary {
    /// Conditional with both branches
    pub fn new(
        condition: Box<dyn Node>,
        then: Box<dyn Node>,
        otherwise: Box<dyn Node>,
        span: SourceSpan,
    ) -> Self {
        Self {
            base: NodeBase::new(span, vec![condition, then, otherwise]),
        }
    }
}

impl Node for Ternary {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn get_value_internal(&self, state: &mut ExpressionState<'_>) -> EvalResult<TypedValue> {
        let [condition, then, otherwise] = self.children() else {
            return Ok(TypedValue::null());
        };
        let test = condition.get_value(state)?;
        if condition.base().locate(to_boolean(state.evaluation_context(), &test))? {
            then.get_value_internal(state)
        } else {
            otherwise.get_value_internal(state)
        }
    }

    fn to_expression_string(&self) -> String {
        let parts: Vec<String> = self
            .children()
            .iter()
            .map(|child| child.to_expression_string())
            .collect();
        format!("({} ? {} : {})", parts[0], parts[1], parts[2])
    }

    fn exit_descriptor(&self) -> Option<Descriptor> {
        let [_, then, otherwise] = self.children() else {
            return None;
        };
        Some(join_exits(then.exit_descriptor()?, otherwise.exit_descriptor()?))
    }

    fn is_compilable(&self) -> bool {
        self.children_compilable()
            && CodeFlow::is_boolean_compatible(self.children()[0].exit_descriptor().as_ref())
            && self.exit_descriptor().is_some()
    }

    fn generate_code(&self, cf: &mut CodeFlow) -> Result<(), CompileError> {
        let not_compilable = || CompileError::NotCompilable(self.to_expression_string());
        let exit = self.exit_descriptor().ok_or_else(not_compilable)?;
        let [condition, then, otherwise] = self.children() else {
            return Err(not_compilable());
        };
        let descriptor = generate_operand(condition.as_ref(), cf)?;
        cf.insert_numeric_unboxing_or_primitive_type_coercion(&descriptor, PrimitiveKind::Boolean)?;
        let to_else = cf.emit_jump(Opcode::JumpIfFalse(0));
        generate_branch(then.as_ref(), &exit, cf)?;
        let to_end = cf.emit_jump(Opcode::Jump(0));
        cf.patch_jump_here(to_else)?;
        generate_branch(otherwise.as_ref(), &exit, cf)?;
        cf.patch_jump_here(to_end)?;
        cf.push_descriptor(exit);
        Ok(())
    }
}

/// `value ?: fallback`, which keeps `value` unless it is null or an empty
/// string
#[derive(Debug)]
pub struct Elvis {
    base: NodeBase,
}

impl Elvis {
    /// Elvis with its fallback
    pub fn new(value: Box<dyn Node>, fallback: Box<dyn Node>, span: SourceSpan) -> Self {
        Self {
            base: NodeBase::new(span, vec![value, fallback]),
        }
    }
}

impl Node for Elvis {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn get_value_internal(&self, state: &mut ExpressionState<'_>) -> EvalResult<TypedValue> {
        let [value, fallback] = self.children() else {
            return Ok(TypedValue::null());
        };
        let result = value.get_value_internal(state)?;
        if is_present(result.value()) {
            Ok(result)
        } else {
            fallback.get_value_internal(state)
        }
    }

    fn to_expression_string(&self) -> String {
        format!(
            "({} ?: {})",
            self.children()[0].to_expression_string(),
            self.children()[1].to_expression_string()
        )
    }

    fn exit_descriptor(&self) -> Option<Descriptor> {
        let [value, fallback] = self.children() else {
            return None;
        };
        Some(join_exits(value.exit_descriptor()?.boxed(), fallback.exit_descriptor()?.boxed()))
    }

    fn is_compilable(&self) -> bool {
        self.children_compilable() && self.exit_descriptor().is_some()
    }

    fn generate_code(&self, cf: &mut CodeFlow) -> Result<(), CompileError> {
        let not_compilable = || CompileError::NotCompilable(self.to_expression_string());
        let exit = self.exit_descriptor().ok_or_else(not_compilable)?;
        let [value, fallback] = self.children() else {
            return Err(not_compilable());
        };
        generate_branch(value.as_ref(), &exit, cf)?;
        cf.emit(Opcode::Dup);
        let to_end = cf.emit_jump(Opcode::JumpIfPresent(0));
        cf.emit(Opcode::Pop);
        generate_branch(fallback.as_ref(), &exit, cf)?;
        cf.patch_jump_here(to_end)?;
        cf.push_descriptor(exit);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompilerConfiguration;
    use crate::context::StandardEvaluationContext;
    use crate::nodes::Literal;
    use core_types::Value;

    fn span() -> SourceSpan {
        SourceSpan::new(0, 10)
    }

    fn eval(node: &dyn Node) -> EvalResult<Value> {
        let ctx = StandardEvaluationContext::new();
        let config = CompilerConfiguration::default();
        let mut state = ExpressionState::new(&ctx, &config);
        node.get_value(&mut state)
    }

    #[test]
    fn test_ternary_picks_branch_and_joins_exits() {
        let node = Ternary::new(
            Box::new(Literal::boolean(false, span())),
            Box::new(Literal::int(1, span())),
            Box::new(Literal::long(2, span())),
            span(),
        );
        assert_eq!(eval(&node), Ok(Value::Long(2)));
        assert_eq!(node.exit_descriptor(), Some(Descriptor::Object));
        let same = Ternary::new(
            Box::new(Literal::boolean(true, span())),
            Box::new(Literal::int(1, span())),
            Box::new(Literal::int(2, span())),
            span(),
        );
        assert_eq!(same.exit_descriptor(), Some(Descriptor::Primitive(PrimitiveKind::Int)));
        assert!(same.is_compilable());
    }

    #[test]
    fn test_elvis_treats_empty_string_as_absent() {
        let node = Elvis::new(
            Box::new(Literal::string("", span())),
            Box::new(Literal::string("fallback", span())),
            span(),
        );
        assert_eq!(eval(&node), Ok(Value::from("fallback")));
        assert_eq!(node.exit_descriptor(), Some(Descriptor::String));
        let kept = Elvis::new(
            Box::new(Literal::int(0, span())),
            Box::new(Literal::int(1, span())),
            span(),
        );
        assert_eq!(eval(&kept), Ok(Value::Int(0)));
        assert_eq!(kept.exit_descriptor(), Some(Descriptor::Boxed(PrimitiveKind::Int)));
    }
}
