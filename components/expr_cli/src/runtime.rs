//! Evaluation session behind the CLI and the REPL
//!
//! A runtime owns one evaluation context and caches parsed expressions by
//! source, so evaluating the same text again reuses the expression and lets
//! it warm up and compile.

use crate::error::{CliError, CliResult};
use core_types::Value;
use expression::{CompilationState, Expression, ExpressionParser, TemplateContext};
use interpreter::{CompilerConfiguration, CompilerMode, EvaluationContext, StandardEvaluationContext};
use std::collections::HashMap;
use std::sync::Arc;

/// Evaluation session
pub struct Runtime {
    parser: ExpressionParser,
    context: StandardEvaluationContext,
    template: TemplateContext,
    expressions: HashMap<String, Arc<Expression>>,
    templates: HashMap<String, Arc<Expression>>,
}

impl Runtime {
    /// Create a runtime with the given configuration
    ///
    /// # Example
    /// ```
    /// use core_types::Value;
    /// use expr_cli::Runtime;
    /// use interpreter::CompilerConfiguration;
    ///
    /// let mut runtime = Runtime::new(CompilerConfiguration::default());
    /// assert_eq!(runtime.evaluate("6 * 7").unwrap(), Value::Int(42));
    /// ```
    pub fn new(configuration: CompilerConfiguration) -> Self {
        Self {
            parser: ExpressionParser::new(configuration),
            context: StandardEvaluationContext::new(),
            template: TemplateContext::default(),
            expressions: HashMap::new(),
            templates: HashMap::new(),
        }
    }

    /// Current compiler mode
    pub fn mode(&self) -> CompilerMode {
        self.parser.configuration().mode
    }

    /// Switch the compiler mode; cached expressions are dropped
    pub fn set_mode(&mut self, mode: CompilerMode) {
        let mut configuration = self.parser.configuration().clone();
        configuration.mode = mode;
        self.parser = ExpressionParser::new(configuration);
        self.expressions.clear();
        self.templates.clear();
        tracing::debug!(%mode, "compiler mode changed");
    }

    /// Replace the root object
    pub fn set_root(&mut self, root: Value) {
        self.context.set_root_object(root);
    }

    /// Replace the root object with parsed JSON
    pub fn set_root_json(&mut self, json: &str) -> CliResult<()> {
        let parsed: serde_json::Value = serde_json::from_str(json)?;
        self.set_root(from_json(parsed));
        Ok(())
    }

    /// Bind a variable from `NAME=EXPR`, evaluating the expression
    pub fn bind(&mut self, binding: &str) -> CliResult<()> {
        let (name, source) = binding
            .split_once('=')
            .map(|(name, source)| (name.trim(), source.trim()))
            .filter(|(name, source)| !name.is_empty() && !source.is_empty())
            .ok_or_else(|| CliError::InvalidBinding(binding.to_string()))?;
        let value = self.parser.evaluate(source, &self.context)?;
        self.context.set_variable(name, value);
        Ok(())
    }

    /// Bound variables, sorted by name
    pub fn variables(&self) -> Vec<(String, Value)> {
        self.context
            .variable_names()
            .into_iter()
            .map(|name| {
                let value = self.context.lookup_variable(&name).unwrap_or(Value::Null);
                (name, value)
            })
            .collect()
    }

    /// Evaluate an expression
    pub fn evaluate(&mut self, source: &str) -> CliResult<Value> {
        let expression = self.expression(source)?;
        Ok(expression.get_value_in(&self.context)?)
    }

    /// Evaluate an expression `times` times, returning the last result
    pub fn evaluate_repeated(&mut self, source: &str, times: u32) -> CliResult<Value> {
        let expression = self.expression(source)?;
        let mut result = Value::Null;
        for _ in 0..times.max(1) {
            result = expression.get_value_in(&self.context)?;
        }
        Ok(result)
    }

    /// Evaluate template text
    pub fn evaluate_template(&mut self, text: &str) -> CliResult<Value> {
        let expression = match self.templates.get(text) {
            Some(expression) => Arc::clone(expression),
            None => {
                let parsed = Arc::new(self.parser.parse_template(text, &self.template)?);
                self.templates.insert(text.to_string(), Arc::clone(&parsed));
                parsed
            }
        };
        Ok(expression.get_value_in(&self.context)?)
    }

    /// Compilation state of a previously evaluated expression
    pub fn compilation_state(&self, source: &str) -> Option<CompilationState> {
        self.expressions
            .get(source)
            .map(|expression| expression.compilation_state())
    }

    /// One-line summary of the shared compiler's counters
    pub fn stats_line(&self) -> String {
        let stats = self.parser.compiler_stats();
        format!(
            "compiled {}, failed {}, native {}, instructions {}",
            stats.units_compiled, stats.compile_failures, stats.native_units, stats.instructions_emitted
        )
    }

    fn expression(&mut self, source: &str) -> CliResult<Arc<Expression>> {
        if let Some(expression) = self.expressions.get(source) {
            return Ok(Arc::clone(expression));
        }
        let parsed = Arc::new(self.parser.parse_expression(source)?);
        self.expressions.insert(source.to_string(), Arc::clone(&parsed));
        Ok(parsed)
    }
}

/// Map JSON onto engine values; integers that fit become ints
fn from_json(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i32::try_from(i).map(Value::Int).unwrap_or(Value::Long(i))
            } else {
                Value::Double(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => Value::list(items.into_iter().map(from_json).collect()),
        serde_json::Value::Object(entries) => {
            Value::map(entries.into_iter().map(|(k, v)| (k, from_json(v))))
        }
    }
}

/// Render a value for display; strings are quoted
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Char(c) => format!("'{}'", c),
        other => other.to_string(),
    }
}
