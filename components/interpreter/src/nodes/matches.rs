//! The `matches` operator

use crate::node::{generate_operand, ExitDescriptor, Node, NodeBase};
use crate::state::ExpressionState;
use bytecode_system::{CodeFlow, CompileError, Descriptor, FieldInit, Opcode, PrimitiveKind};
use core_types::{EvalResult, EvaluationError, MessageCode, SourceSpan, TypedValue, Value};
use parking_lot::RwLock;
use regex::Regex;

/// Compile a pattern that must match the whole input
pub fn compile_pattern(pattern: &str) -> EvalResult<Regex> {
    Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
        EvaluationError::new(MessageCode::InvalidPattern, [pattern.to_string(), e.to_string()])
    })
}

/// Whether `text` matches `pattern` in full
#[derive(Debug)]
pub struct OpMatches {
    base: NodeBase,
    cached: RwLock<Option<(String, Regex)>>,
}

impl OpMatches {
    /// `text matches pattern`
    pub fn new(text: Box<dyn Node>, pattern: Box<dyn Node>, span: SourceSpan) -> Self {
        let exit = ExitDescriptor::fixed(Descriptor::Primitive(PrimitiveKind::Boolean));
        Self {
            base: NodeBase::with_exit(span, vec![text, pattern], exit),
            cached: RwLock::new(None),
        }
    }

    fn regex(&self, pattern: &str) -> EvalResult<Regex> {
        if let Some((source, regex)) = &*self.cached.read() {
            if source == pattern {
                return Ok(regex.clone());
            }
        }
        let regex = self.base.locate(compile_pattern(pattern))?;
        *self.cached.write() = Some((pattern.to_string(), regex.clone()));
        Ok(regex)
    }

    fn literal_pattern(&self) -> Option<&str> {
        self.children()[1].literal_value().and_then(Value::as_str)
    }
}

impl Node for OpMatches {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn get_value_internal(&self, state: &mut ExpressionState<'_>) -> EvalResult<TypedValue> {
        let text = self.children()[0].get_value(state)?;
        let pattern = self.children()[1].get_value(state)?;
        let Value::String(text) = text else {
            return Err(self
                .base
                .error(MessageCode::InvalidFirstOperandForMatches, [text.to_string()]));
        };
        let Value::String(pattern) = pattern else {
            return Err(self.base.error(
                MessageCode::InvalidPattern,
                [pattern.to_string(), "the pattern must be a string".to_string()],
            ));
        };
        let regex = self.regex(&pattern)?;
        Ok(TypedValue::new(Value::Boolean(regex.is_match(&text))))
    }

    fn to_expression_string(&self) -> String {
        format!(
            "{} matches {}",
            self.children()[0].to_expression_string(),
            self.children()[1].to_expression_string()
        )
    }

    fn is_compilable(&self) -> bool {
        self.children()[0].is_compilable()
            && self.children()[0].exit_descriptor() == Some(Descriptor::String)
            && self.literal_pattern().is_some_and(|p| compile_pattern(p).is_ok())
    }

    fn generate_code(&self, cf: &mut CodeFlow) -> Result<(), CompileError> {
        let pattern = self
            .literal_pattern()
            .ok_or_else(|| CompileError::NotCompilable(self.to_expression_string()))?
            .to_string();
        generate_operand(self.children()[0].as_ref(), cf)?;
        let key = format!("matches-{}", self.id());
        let name = format!("pattern${}", self.id().0);
        let field = cf.register_static_field(&key, &name, FieldInit::Pattern(pattern));
        cf.emit_at(Opcode::Matches(field), self.span());
        cf.push_descriptor(Descriptor::Primitive(PrimitiveKind::Boolean));
        Ok(())
    }
}
