//! Boolean operators: `and`, `or`, `not` (also `&&`, `||`, `!`)

use crate::node::{generate_operand, ExitDescriptor, Node, NodeBase};
use crate::operators::to_boolean;
use crate::state::ExpressionState;
use bytecode_system::{CodeFlow, CompileError, Descriptor, Opcode, PrimitiveKind};
use core_types::{EvalResult, SourceSpan, TypedValue, Value};

const BOOLEAN: Descriptor = Descriptor::Primitive(PrimitiveKind::Boolean);

fn boolean_operand(node: &dyn Node, state: &mut ExpressionState<'_>) -> EvalResult<bool> {
    let value = node.get_value(state)?;
    node.base()
        .locate(to_boolean(state.evaluation_context(), &value))
}

/// Generate an operand and leave it as a boolean int slot
fn generate_condition(node: &dyn Node, cf: &mut CodeFlow) -> Result<(), CompileError> {
    let descriptor = generate_operand(node, cf)?;
    cf.insert_numeric_unboxing_or_primitive_type_coercion(&descriptor, PrimitiveKind::Boolean)
}

fn conditions_compilable(node: &dyn Node) -> bool {
    node.children_compilable()
        && node
            .children()
            .iter()
            .all(|child| CodeFlow::is_boolean_compatible(child.exit_descriptor().as_ref()))
}

/// Which short-circuit operator a node applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalKind {
    /// `and`
    And,
    /// `or`
    Or,
}

/// Short-circuit `and` / `or`
#[derive(Debug)]
pub struct OpLogical {
    base: NodeBase,
    kind: LogicalKind,
}

impl OpLogical {
    /// `left kind right`
    pub fn new(kind: LogicalKind, left: Box<dyn Node>, right: Box<dyn Node>, span: SourceSpan) -> Self {
        Self {
            base: NodeBase::with_exit(span, vec![left, right], ExitDescriptor::fixed(BOOLEAN)),
            kind,
        }
    }
}

impl Node for OpLogical {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn get_value_internal(&self, state: &mut ExpressionState<'_>) -> EvalResult<TypedValue> {
        let [left, right] = self.children() else {
            return Ok(TypedValue::null());
        };
        let l = boolean_operand(left.as_ref(), state)?;
        let result = match (self.kind, l) {
            (LogicalKind::And, false) => false,
            (LogicalKind::Or, true) => true,
            _ => boolean_operand(right.as_ref(), state)?,
        };
        Ok(TypedValue::new(Value::Boolean(result)))
    }

    fn to_expression_string(&self) -> String {
        let word = match self.kind {
            LogicalKind::And => "and",
            LogicalKind::Or => "or",
        };
        let parts: Vec<String> = self
            .children()
            .iter()
            .map(|child| child.to_expression_string())
            .collect();
        format!("({})", parts.join(&format!(" {} ", word)))
    }

    fn is_compilable(&self) -> bool {
        conditions_compilable(self)
    }

    fn generate_code(&self, cf: &mut CodeFlow) -> Result<(), CompileError> {
        let [left, right] = self.children() else {
            return Err(CompileError::NotCompilable(self.to_expression_string()));
        };
        generate_condition(left.as_ref(), cf)?;
        cf.emit(Opcode::Dup);
        let skip = match self.kind {
            LogicalKind::And => cf.emit_jump(Opcode::JumpIfFalse(0)),
            LogicalKind::Or => cf.emit_jump(Opcode::JumpIfTrue(0)),
        };
        cf.emit(Opcode::Pop);
        generate_condition(right.as_ref(), cf)?;
        cf.patch_jump_here(skip)?;
        cf.push_descriptor(BOOLEAN);
        Ok(())
    }
}

/// Logical negation
#[derive(Debug)]
pub struct OpNot {
    base: NodeBase,
}

impl OpNot {
    /// `not operand`
    pub fn new(operand: Box<dyn Node>, span: SourceSpan) -> Self {
        Self {
            base: NodeBase::with_exit(span, vec![operand], ExitDescriptor::fixed(BOOLEAN)),
        }
    }
}

impl Node for OpNot {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn get_value_internal(&self, state: &mut ExpressionState<'_>) -> EvalResult<TypedValue> {
        let value = boolean_operand(self.children()[0].as_ref(), state)?;
        Ok(TypedValue::new(Value::Boolean(!value)))
    }

    fn to_expression_string(&self) -> String {
        format!("!{}", self.children()[0].to_expression_string())
    }

    fn is_compilable(&self) -> bool {
        conditions_compilable(self)
    }

    fn generate_code(&self, cf: &mut CodeFlow) -> Result<(), CompileError> {
        generate_condition(self.children()[0].as_ref(), cf)?;
        cf.emit_at(Opcode::INot, self.span());
        cf.push_descriptor(BOOLEAN);
        Ok(())
    }
}
