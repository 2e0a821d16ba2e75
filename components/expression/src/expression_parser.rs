//! Parser facade producing [`Expression`]s

use crate::expression::Expression;
use core_types::{ExpressionError, ParseError, Value};
use interpreter::{CompilerConfiguration, ConfigError, EvaluationContext};
use jit_compiler::{ExpressionCompiler, StatsSnapshot};
use parser::TemplateContext;
use std::sync::Arc;

/// Parses expression source under one [`CompilerConfiguration`].
///
/// Every expression produced shares the configuration and one compiler, so
/// [`ExpressionParser::compiler_stats`] covers all of them.
#[derive(Debug, Clone)]
pub struct ExpressionParser {
    configuration: Arc<CompilerConfiguration>,
    compiler: ExpressionCompiler,
}

impl ExpressionParser {
    /// Parser with the given configuration
    pub fn new(configuration: CompilerConfiguration) -> Self {
        let compiler = ExpressionCompiler::new(configuration.native_tier);
        Self {
            configuration: Arc::new(configuration),
            compiler,
        }
    }

    /// Parser configured from `CORTEN_EL_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        CompilerConfiguration::from_env().map(Self::new)
    }

    /// The shared configuration
    pub fn configuration(&self) -> &CompilerConfiguration {
        &self.configuration
    }

    /// Parse a single expression
    pub fn parse_expression(&self, source: &str) -> Result<Expression, ParseError> {
        let ast = parser::parse_expression(source, &self.configuration)?;
        Ok(self.expression(source, ast))
    }

    /// Parse literal text with embedded expressions
    pub fn parse_template(
        &self,
        source: &str,
        context: &TemplateContext,
    ) -> Result<Expression, ParseError> {
        let ast = parser::parse_template_expression(source, context, &self.configuration)?;
        Ok(self.expression(source, ast))
    }

    /// Parse and evaluate once against a context.
    ///
    /// Either failure comes back through the one carrier type.
    pub fn evaluate(
        &self,
        source: &str,
        context: &dyn EvaluationContext,
    ) -> Result<Value, ExpressionError> {
        let expression = self.parse_expression(source)?;
        Ok(expression.get_value_in(context)?)
    }

    /// Counters of the shared compiler
    pub fn compiler_stats(&self) -> StatsSnapshot {
        self.compiler.stats()
    }

    fn expression(&self, source: &str, ast: Box<dyn interpreter::Node>) -> Expression {
        Expression::new(
            source.to_string(),
            ast,
            Arc::clone(&self.configuration),
            self.compiler.clone(),
        )
    }
}

impl Default for ExpressionParser {
    fn default() -> Self {
        Self::new(CompilerConfiguration::default())
    }
}
