//! Template parsing: literal text with embedded `#{...}` expressions

use crate::error::parse_error;
use crate::parser::Parser;
use core_types::{MessageCode, ParseError, SourceSpan};
use interpreter::nodes::{CompositeString, Literal};
use interpreter::Node;

/// Delimiters marking expressions inside template text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateContext {
    prefix: String,
    suffix: String,
}

impl TemplateContext {
    /// Template delimiters; both must be non-empty
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Opening delimiter
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Closing delimiter
    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

impl Default for TemplateContext {
    fn default() -> Self {
        Self::new("#{", "}")
    }
}

fn starts_with_at(chars: &[char], at: usize, needle: &[char]) -> bool {
    chars.len() >= at + needle.len() && chars[at..at + needle.len()] == *needle
}

fn find_from(chars: &[char], from: usize, needle: &[char]) -> Option<usize> {
    (from..chars.len()).find(|&i| starts_with_at(chars, i, needle))
}

/// Position of the suffix closing an expression that starts at `from`.
///
/// Brackets must balance and quoted text is skipped, so a suffix inside
/// `{..}` or a string literal does not end the expression.
fn closing_suffix(chars: &[char], from: usize, suffix: &[char]) -> Option<usize> {
    let mut open: Vec<char> = Vec::new();
    let mut pos = from;
    while pos < chars.len() {
        if open.is_empty() && starts_with_at(chars, pos, suffix) {
            return Some(pos);
        }
        match chars[pos] {
            '(' => open.push(')'),
            '[' => open.push(']'),
            '{' => open.push('}'),
            c @ (')' | ']' | '}') => {
                if open.pop() != Some(c) {
                    return None;
                }
            }
            quote @ ('\'' | '"') => {
                pos += 1;
                while pos < chars.len() && chars[pos] != quote {
                    pos += 1;
                }
            }
            _ => {}
        }
        pos += 1;
    }
    None
}

/// Parse template text into a node producing the concatenated string.
///
/// Text without any expression yields a plain string literal.
pub fn parse_template(
    source: &str,
    context: &TemplateContext,
) -> Result<Box<dyn Node>, ParseError> {
    let chars: Vec<char> = source.chars().collect();
    let prefix: Vec<char> = context.prefix.chars().collect();
    let suffix: Vec<char> = context.suffix.chars().collect();
    let mut parts: Vec<Box<dyn Node>> = Vec::new();
    let mut start = 0;
    let mut has_expression = false;

    while start < chars.len() {
        let Some(open) = find_from(&chars, start, &prefix) else {
            break;
        };
        if open > start {
            let text: String = chars[start..open].iter().collect();
            parts.push(Box::new(Literal::string(&text, SourceSpan::new(start, open))));
        }
        let body = open + prefix.len();
        let close = closing_suffix(&chars, body, &suffix).ok_or_else(|| {
            parse_error(
                MessageCode::MissingTemplateSuffix,
                open,
                [context.suffix.clone(), open.to_string()],
            )
        })?;
        let expression: String = chars[body..close].iter().collect();
        if expression.trim().is_empty() {
            return Err(parse_error(
                MessageCode::EmptyTemplateExpression,
                open,
                [context.prefix.clone(), open.to_string()],
            ));
        }
        parts.push(Parser::with_offset(&expression, body).parse()?);
        has_expression = true;
        start = close + suffix.len();
    }
    if start < chars.len() {
        let text: String = chars[start..].iter().collect();
        parts.push(Box::new(Literal::string(&text, SourceSpan::new(start, chars.len()))));
    }

    let span = SourceSpan::new(0, chars.len());
    if !has_expression {
        let text: String = chars.iter().collect();
        return Ok(Box::new(Literal::string(&text, span)));
    }
    Ok(Box::new(CompositeString::new(
        parts,
        &context.prefix,
        &context.suffix,
        span,
    )))
}
