//! Arithmetic operators: `+ - * / % ^`
//!
//! Numeric operands are promoted to a common kind before the operation.
//! `+` concatenates when either operand is a string, and `*` repeats a
//! string. Anything else goes to the context's operator overloader.

use crate::node::{generate_operand, value_descriptor, Node, NodeBase};
use crate::operators::{arithmetic, concat_text, negate, power};
use crate::overloader::Operation;
use crate::state::ExpressionState;
use bytecode_system::{CodeFlow, CompileError, Descriptor, NumericOp, Opcode, PrimitiveKind};
use core_types::{EvalResult, MessageCode, SourceSpan, TypedValue, Value};
use std::sync::atomic::{AtomicBool, Ordering};

/// Which arithmetic operator a node applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticKind {
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Multiply,
    /// `/` or `div`
    Divide,
    /// `%` or `mod`
    Modulus,
    /// `^`
    Power,
}

impl ArithmeticKind {
    fn operation(self) -> Operation {
        match self {
            ArithmeticKind::Plus => Operation::Add,
            ArithmeticKind::Minus => Operation::Subtract,
            ArithmeticKind::Multiply => Operation::Multiply,
            ArithmeticKind::Divide => Operation::Divide,
            ArithmeticKind::Modulus => Operation::Modulus,
            ArithmeticKind::Power => Operation::Power,
        }
    }

    fn numeric_op(self) -> Option<NumericOp> {
        Some(match self {
            ArithmeticKind::Plus => NumericOp::Add,
            ArithmeticKind::Minus => NumericOp::Sub,
            ArithmeticKind::Multiply => NumericOp::Mul,
            ArithmeticKind::Divide => NumericOp::Div,
            ArithmeticKind::Modulus => NumericOp::Rem,
            ArithmeticKind::Power => return None,
        })
    }

    /// Operator symbol
    pub fn symbol(self) -> &'static str {
        self.operation().symbol()
    }
}

fn arith_opcode(kind: PrimitiveKind, op: NumericOp) -> Option<Opcode> {
    Some(match kind {
        PrimitiveKind::Int => Opcode::IArith(op),
        PrimitiveKind::Long => Opcode::LArith(op),
        PrimitiveKind::Float => Opcode::FArith(op),
        PrimitiveKind::Double => Opcode::DArith(op),
        _ => return None,
    })
}

fn neg_opcode(kind: PrimitiveKind) -> Option<Opcode> {
    Some(match kind.stack_kind() {
        PrimitiveKind::Int => Opcode::INeg,
        PrimitiveKind::Long => Opcode::LNeg,
        PrimitiveKind::Float => Opcode::FNeg,
        PrimitiveKind::Double => Opcode::DNeg,
        _ => return None,
    })
}

/// A binary or unary arithmetic operator.
///
/// Only `+` and `-` have unary forms.
#[derive(Debug)]
pub struct OpArithmetic {
    base: NodeBase,
    kind: ArithmeticKind,
    overloaded: AtomicBool,
}

impl OpArithmetic {
    /// Binary operator
    pub fn new(kind: ArithmeticKind, left: Box<dyn Node>, right: Box<dyn Node>, span: SourceSpan) -> Self {
        Self::with_operands(kind, vec![left, right], span)
    }

    /// Unary `+` or `-`
    pub fn unary(kind: ArithmeticKind, operand: Box<dyn Node>, span: SourceSpan) -> Self {
        Self::with_operands(kind, vec![operand], span)
    }

    fn with_operands(kind: ArithmeticKind, operands: Vec<Box<dyn Node>>, span: SourceSpan) -> Self {
        Self {
            base: NodeBase::new(span, operands),
            kind,
            overloaded: AtomicBool::new(false),
        }
    }

    /// The operator
    pub fn kind(&self) -> ArithmeticKind {
        self.kind
    }

    fn is_unary(&self) -> bool {
        self.children().len() == 1
    }

    fn evaluate_unary(&self, operand: &Value) -> EvalResult<Value> {
        let result = match self.kind {
            ArithmeticKind::Plus if operand.is_number() => Some(operand.clone()),
            ArithmeticKind::Minus => negate(operand),
            _ => None,
        };
        result.ok_or_else(|| {
            self.base.error(
                MessageCode::OperatorNotSupportedOnType,
                [self.kind.symbol().to_string(), operand.type_name()],
            )
        })
    }

    fn evaluate_binary(
        &self,
        state: &ExpressionState<'_>,
        left: &Value,
        right: &Value,
    ) -> EvalResult<Value> {
        match (self.kind, left, right) {
            (ArithmeticKind::Plus, Value::String(_), _) | (ArithmeticKind::Plus, _, Value::String(_)) => {
                return Ok(Value::from(format!("{}{}", concat_text(left), concat_text(right))));
            }
            (ArithmeticKind::Multiply, Value::String(text), count) if count.is_number() => {
                let times = usize::try_from(count.as_i64().unwrap_or(0)).unwrap_or(0);
                return Ok(Value::from(text.repeat(times)));
            }
            _ => {}
        }
        let numeric = match self.kind.numeric_op() {
            Some(op) => arithmetic(op, left, right).transpose()?,
            None => power(left, right),
        };
        match numeric {
            Some(value) => Ok(value),
            None => {
                self.overloaded.store(true, Ordering::Relaxed);
                state
                    .operate(self.kind.operation(), left, right)
                    .map(TypedValue::into_value)
            }
        }
    }

    fn is_string_concat(&self) -> bool {
        self.kind == ArithmeticKind::Plus && self.exit_descriptor() == Some(Descriptor::String)
    }

    fn numeric_kind(&self) -> Option<PrimitiveKind> {
        let operands: Vec<Descriptor> = self
            .children()
            .iter()
            .map(|operand| operand.exit_descriptor())
            .collect::<Option<_>>()?;
        let kind = match operands.as_slice() {
            [operand] if CodeFlow::is_primitive_or_unboxable_supported_number(Some(operand)) => {
                CodeFlow::to_primitive_target(operand)?
            }
            [left, right] => CodeFlow::binary_numeric_promotion(left, right)?,
            _ => return None,
        };
        (self.exit_descriptor() == Some(Descriptor::Primitive(kind))).then_some(kind)
    }
}

impl Node for OpArithmetic {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn get_value_internal(&self, state: &mut ExpressionState<'_>) -> EvalResult<TypedValue> {
        let result = match self.children() {
            [operand] => {
                let value = operand.get_value(state)?;
                self.evaluate_unary(&value)?
            }
            [left, right] => {
                let l = left.get_value(state)?;
                let r = right.get_value(state)?;
                self.base.locate(self.evaluate_binary(state, &l, &r))?
            }
            _ => Value::Null,
        };
        self.base.exit.observe(value_descriptor(&result));
        Ok(TypedValue::new(result))
    }

    fn to_expression_string(&self) -> String {
        match self.children() {
            [operand] => format!("{}{}", self.kind.symbol(), operand.to_expression_string()),
            [left, right] => format!(
                "({} {} {})",
                left.to_expression_string(),
                self.kind.symbol(),
                right.to_expression_string()
            ),
            _ => String::new(),
        }
    }

    fn is_compilable(&self) -> bool {
        if self.kind == ArithmeticKind::Power
            || self.overloaded.load(Ordering::Relaxed)
            || !self.children_compilable()
        {
            return false;
        }
        (self.is_string_concat() && !self.is_unary()) || self.numeric_kind().is_some()
    }

    fn generate_code(&self, cf: &mut CodeFlow) -> Result<(), CompileError> {
        let not_compilable = || CompileError::NotCompilable(self.to_expression_string());
        if self.is_string_concat() && !self.is_unary() {
            for operand in self.children() {
                let descriptor = generate_operand(operand.as_ref(), cf)?;
                cf.insert_boxing_if_necessary(&descriptor);
            }
            cf.emit_at(Opcode::Concat(2), self.span());
            cf.push_descriptor(Descriptor::String);
            return Ok(());
        }
        let kind = self.numeric_kind().ok_or_else(not_compilable)?;
        for operand in self.children() {
            let descriptor = generate_operand(operand.as_ref(), cf)?;
            let target = if self.is_unary() { kind } else { kind.stack_kind() };
            cf.insert_numeric_unboxing_or_primitive_type_coercion(&descriptor, target)?;
        }
        match (self.is_unary(), self.kind) {
            (true, ArithmeticKind::Plus) => {}
            (true, _) => cf.emit_at(neg_opcode(kind).ok_or_else(not_compilable)?, self.span()),
            (false, _) => {
                let op = self.kind.numeric_op().ok_or_else(not_compilable)?;
                cf.emit_at(arith_opcode(kind, op).ok_or_else(not_compilable)?, self.span());
            }
        }
        cf.push_descriptor(Descriptor::Primitive(kind));
        Ok(())
    }
}
