//! Relational operators: `== != < <= > >=` and their word forms

use crate::node::{generate_operand, ExitDescriptor, Node, NodeBase};
use crate::operators::compare_values;
use crate::state::ExpressionState;
use bytecode_system::{CodeFlow, CompareOp, CompileError, Descriptor, Opcode, PrimitiveKind};
use core_types::{EvalResult, SourceSpan, TypedValue, Value};

fn compare_opcode(kind: PrimitiveKind, op: CompareOp) -> Option<Opcode> {
    Some(match kind {
        PrimitiveKind::Int => Opcode::ICmp(op),
        PrimitiveKind::Long => Opcode::LCmp(op),
        PrimitiveKind::Float => Opcode::FCmp(op),
        PrimitiveKind::Double => Opcode::DCmp(op),
        _ => return None,
    })
}

/// A comparison yielding a boolean.
///
/// Numbers compare by promoted value. Other operands are compared through
/// the context's type comparator, except that equality falls back to value
/// equality when the comparator cannot order the pair.
#[derive(Debug)]
pub struct OpRelational {
    base: NodeBase,
    op: CompareOp,
}

impl OpRelational {
    /// `left op right`
    pub fn new(op: CompareOp, left: Box<dyn Node>, right: Box<dyn Node>, span: SourceSpan) -> Self {
        let exit = ExitDescriptor::fixed(Descriptor::Primitive(PrimitiveKind::Boolean));
        Self {
            base: NodeBase::with_exit(span, vec![left, right], exit),
            op,
        }
    }

    /// The comparison
    pub fn op(&self) -> CompareOp {
        self.op
    }

    fn operands(&self) -> (&dyn Node, &dyn Node) {
        (self.children()[0].as_ref(), self.children()[1].as_ref())
    }

    fn numeric_kind(&self) -> Option<PrimitiveKind> {
        let (left, right) = self.operands();
        CodeFlow::binary_numeric_promotion(&left.exit_descriptor()?, &right.exit_descriptor()?)
    }
}

impl Node for OpRelational {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn get_value_internal(&self, state: &mut ExpressionState<'_>) -> EvalResult<TypedValue> {
        let (left, right) = self.operands();
        let l = left.get_value(state)?;
        let r = right.get_value(state)?;
        let result = compare_values(state.evaluation_context(), self.op, &l, &r);
        Ok(TypedValue::new(Value::Boolean(self.base.locate(result)?)))
    }

    fn to_expression_string(&self) -> String {
        let (left, right) = self.operands();
        format!(
            "({} {} {})",
            left.to_expression_string(),
            self.op.symbol(),
            right.to_expression_string()
        )
    }

    fn is_compilable(&self) -> bool {
        let (left, right) = self.operands();
        self.children_compilable()
            && left.exit_descriptor().is_some()
            && right.exit_descriptor().is_some()
    }

    fn generate_code(&self, cf: &mut CodeFlow) -> Result<(), CompileError> {
        let (left, right) = self.operands();
        if let Some(kind) = self.numeric_kind() {
            for operand in [left, right] {
                let descriptor = generate_operand(operand, cf)?;
                cf.insert_numeric_unboxing_or_primitive_type_coercion(&descriptor, kind)?;
            }
            let opcode = compare_opcode(kind, self.op)
                .ok_or_else(|| CompileError::NotCompilable(self.to_expression_string()))?;
            cf.emit_at(opcode, self.span());
        } else {
            for operand in [left, right] {
                let descriptor = generate_operand(operand, cf)?;
                cf.insert_boxing_if_necessary(&descriptor);
            }
            match self.op {
                CompareOp::Eq => cf.emit_at(Opcode::RefEquals, self.span()),
                CompareOp::Ne => {
                    cf.emit_at(Opcode::RefEquals, self.span());
                    cf.emit(Opcode::INot);
                }
                op => cf.emit_at(Opcode::RefCompare(op), self.span()),
            }
        }
        cf.push_descriptor(Descriptor::Primitive(PrimitiveKind::Boolean));
        Ok(())
    }
}
