//! Literals and template strings

use crate::node::{generate_operand, value_descriptor, ExitDescriptor, Node, NodeBase};
use crate::state::ExpressionState;
use bytecode_system::{CodeFlow, CompileError, Descriptor, Opcode};
use core_types::{EvalResult, SourceSpan, TypeDescriptor, TypedValue, Value};

/// A constant
#[derive(Debug)]
pub struct Literal {
    base: NodeBase,
    value: Value,
    source: String,
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

impl Literal {
    /// Literal with its source text
    pub fn new(value: Value, source: impl Into<String>, span: SourceSpan) -> Self {
        let exit = ExitDescriptor::fixed(value_descriptor(&value));
        Self {
            base: NodeBase::with_exit(span, Vec::new(), exit),
            value,
            source: source.into(),
        }
    }

    /// String literal
    pub fn string(s: &str, span: SourceSpan) -> Self {
        Self::new(Value::from(s), quote(s), span)
    }

    /// Int literal
    pub fn int(n: i32, span: SourceSpan) -> Self {
        Self::new(Value::Int(n), n.to_string(), span)
    }

    /// Long literal
    pub fn long(n: i64, span: SourceSpan) -> Self {
        Self::new(Value::Long(n), format!("{}L", n), span)
    }

    /// Float literal
    pub fn float(n: f32, span: SourceSpan) -> Self {
        Self::new(Value::Float(n), format!("{}f", n), span)
    }

    /// Double literal
    pub fn double(n: f64, span: SourceSpan) -> Self {
        Self::new(Value::Double(n), Value::Double(n).to_string(), span)
    }

    /// Boolean literal
    pub fn boolean(b: bool, span: SourceSpan) -> Self {
        Self::new(Value::Boolean(b), b.to_string(), span)
    }

    /// The null literal
    pub fn null(span: SourceSpan) -> Self {
        Self::new(Value::Null, "null", span)
    }

    /// The constant
    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl Node for Literal {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn get_value_internal(&self, _state: &mut ExpressionState<'_>) -> EvalResult<TypedValue> {
        Ok(TypedValue::new(self.value.clone()))
    }

    fn to_expression_string(&self) -> String {
        self.source.clone()
    }

    fn is_compilable(&self) -> bool {
        true
    }

    fn generate_code(&self, cf: &mut CodeFlow) -> Result<(), CompileError> {
        let span = self.span();
        match &self.value {
            Value::Null => cf.emit_at(Opcode::PushNull, span),
            Value::Boolean(b) => cf.emit_at(Opcode::IConst(i32::from(*b)), span),
            Value::Char(c) => cf.emit_at(Opcode::IConst(*c as i32), span),
            Value::Int(n) => cf.emit_at(Opcode::IConst(*n), span),
            Value::Long(n) => cf.emit_at(Opcode::LConst(*n), span),
            Value::Float(n) => cf.emit_at(Opcode::FConst(*n), span),
            Value::Double(n) => cf.emit_at(Opcode::DConst(*n), span),
            other => {
                let index = cf.add_constant(other.clone());
                cf.emit_at(Opcode::PushConst(index), span);
            }
        }
        cf.push_descriptor(value_descriptor(&self.value));
        Ok(())
    }

    fn literal_value(&self) -> Option<&Value> {
        Some(&self.value)
    }
}

/// Literal text with embedded expressions, as produced by template parsing.
///
/// Each part is rendered as a string; null parts render as nothing.
#[derive(Debug)]
pub struct CompositeString {
    base: NodeBase,
    prefix: String,
    suffix: String,
}

impl CompositeString {
    /// Template of literal and expression parts
    pub fn new(parts: Vec<Box<dyn Node>>, prefix: &str, suffix: &str, span: SourceSpan) -> Self {
        Self {
            base: NodeBase::with_exit(span, parts, ExitDescriptor::fixed(Descriptor::String)),
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        }
    }
}

impl Node for CompositeString {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn get_value_internal(&self, state: &mut ExpressionState<'_>) -> EvalResult<TypedValue> {
        let mut text = String::new();
        for part in self.children() {
            let value = part.get_value_internal(state)?;
            if value.is_null() {
                continue;
            }
            let rendered = state.convert_value(&value, &TypeDescriptor::String)?;
            text.push_str(&rendered.to_string());
        }
        Ok(TypedValue::new(Value::from(text)))
    }

    fn to_expression_string(&self) -> String {
        self.children()
            .iter()
            .map(|part| match part.literal_value() {
                Some(Value::String(s)) => s.clone(),
                _ => format!(
                    "{}{}{}",
                    self.prefix,
                    part.to_expression_string(),
                    self.suffix
                ),
            })
            .collect()
    }

    fn is_compilable(&self) -> bool {
        self.children_compilable()
    }

    fn generate_code(&self, cf: &mut CodeFlow) -> Result<(), CompileError> {
        for part in self.children() {
            let descriptor = generate_operand(part.as_ref(), cf)?;
            cf.insert_boxing_if_necessary(&descriptor);
        }
        cf.emit_at(Opcode::Interpolate(self.children().len()), self.span());
        cf.push_descriptor(Descriptor::String);
        Ok(())
    }
}
