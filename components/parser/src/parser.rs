//! Recursive descent parser for expressions
//!
//! Precedence, loosest first:
//!
//! ```text
//! expression  := logicalOr ( '=' expression | '?:' expression | '?' expression ':' expression )?
//! logicalOr   := logicalAnd ( ('or' | '||') logicalAnd )*
//! logicalAnd  := relational ( ('and' | '&&') relational )*
//! relational  := sum ( relop sum )?
//! sum         := product ( ('+' | '-') product )*
//! product     := power ( ('*' | '/' | '%' | 'div' | 'mod') power )*
//! power       := unary ( '^' power )?
//! unary       := ('-' | '+' | '!' | 'not') unary | primary
//! primary     := startNode ( ('.' | '?.') dottedNode | '[' expression ']' )*
//! ```

use crate::error::{missing_token, parse_error, unexpected_eof};
use crate::lexer::{Keyword, Lexer, Punctuator, Spanned, Token};
use bytecode_system::CompareOp;
use core_types::{MessageCode, ParseError, SourceSpan, Value};
use interpreter::nodes::{
    ArithmeticKind, Assign, BeanReference, CompoundExpression, ConstructorReference, Elvis,
    Indexer, InlineList, Literal, LogicalKind, MethodReference, OpArithmetic, OpLogical,
    OpMatches, OpNot, OpRelational, Projection, PropertyOrFieldReference, Selection,
    SelectionKind, Ternary, TypeReference, VariableReference,
};
use interpreter::Node;

type PResult<T> = Result<T, ParseError>;

/// Parser producing an executable node tree
pub struct Parser {
    lexer: Lexer,
    last_end: usize,
}

impl Parser {
    /// Create a parser for the given source
    pub fn new(source: &str) -> Self {
        Self::with_offset(source, 0)
    }

    /// Create a parser for source embedded at `offset` of a larger text
    pub fn with_offset(source: &str, offset: usize) -> Self {
        Self {
            lexer: Lexer::with_offset(source, offset),
            last_end: offset,
        }
    }

    /// Parse a complete expression; trailing tokens are an error
    pub fn parse(&mut self) -> PResult<Box<dyn Node>> {
        let first = self.peek()?;
        if first.token == Token::EOF {
            return Err(unexpected_eof(first.span.start));
        }
        let expr = self.parse_expression()?;
        let next = self.peek()?;
        if next.token != Token::EOF {
            let at = next.span.start;
            return Err(parse_error(
                MessageCode::MoreInput,
                at,
                [self.lexer.remaining_text()],
            ));
        }
        Ok(expr)
    }

    // ------------------------------------------------------------------
    // Token helpers
    // ------------------------------------------------------------------

    fn peek(&mut self) -> PResult<Spanned> {
        self.lexer.peek_token().cloned()
    }

    fn next(&mut self) -> PResult<Spanned> {
        let token = self.lexer.next_token()?;
        self.last_end = token.span.end;
        Ok(token)
    }

    fn peek_is(&mut self, punct: Punctuator) -> PResult<bool> {
        Ok(self.lexer.peek_token()?.token == Token::Punctuator(punct))
    }

    fn peek_keyword(&mut self, keyword: Keyword) -> PResult<bool> {
        Ok(self.lexer.peek_token()?.token == Token::Keyword(keyword))
    }

    fn maybe_eat(&mut self, punct: Punctuator) -> PResult<bool> {
        if self.peek_is(punct)? {
            self.next()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn expect(&mut self, punct: Punctuator) -> PResult<Spanned> {
        let next = self.peek()?;
        if next.token != Token::Punctuator(punct) {
            return Err(missing_token(punct.text(), &next.token.to_string(), next.span.start));
        }
        self.next()
    }

    fn expect_identifier(&mut self) -> PResult<String> {
        let next = self.next()?;
        match next.token {
            Token::Identifier(name) => Ok(name),
            Token::EOF => Err(unexpected_eof(next.span.start)),
            other => Err(parse_error(
                MessageCode::UnexpectedToken,
                next.span.start,
                [other.to_string()],
            )),
        }
    }

    fn span_from(&self, start: usize) -> SourceSpan {
        SourceSpan::new(start, self.last_end)
    }

    fn start_of_next(&mut self) -> PResult<usize> {
        Ok(self.lexer.peek_token()?.span.start)
    }

    // ------------------------------------------------------------------
    // Operators
    // ------------------------------------------------------------------

    fn parse_expression(&mut self) -> PResult<Box<dyn Node>> {
        let start = self.start_of_next()?;
        let left = self.parse_logical_or()?;
        if self.maybe_eat(Punctuator::Assign)? {
            let value = self.parse_expression()?;
            return Ok(Box::new(Assign::new(left, value, self.span_from(start))));
        }
        if self.maybe_eat(Punctuator::Elvis)? {
            let fallback = self.parse_expression()?;
            return Ok(Box::new(Elvis::new(left, fallback, self.span_from(start))));
        }
        if self.maybe_eat(Punctuator::Question)? {
            let then = self.parse_expression()?;
            self.expect(Punctuator::Colon)?;
            let otherwise = self.parse_expression()?;
            return Ok(Box::new(Ternary::new(
                left,
                then,
                otherwise,
                self.span_from(start),
            )));
        }
        Ok(left)
    }

    fn parse_logical_or(&mut self) -> PResult<Box<dyn Node>> {
        let start = self.start_of_next()?;
        let mut left = self.parse_logical_and()?;
        while self.peek_keyword(Keyword::Or)? || self.peek_is(Punctuator::OrOr)? {
            self.next()?;
            let right = self.parse_logical_and()?;
            left = Box::new(OpLogical::new(LogicalKind::Or, left, right, self.span_from(start)));
        }
        Ok(left)
    }

    fn parse_logical_and(&mut self) -> PResult<Box<dyn Node>> {
        let start = self.start_of_next()?;
        let mut left = self.parse_relational()?;
        while self.peek_keyword(Keyword::And)? || self.peek_is(Punctuator::AndAnd)? {
            self.next()?;
            let right = self.parse_relational()?;
            left = Box::new(OpLogical::new(LogicalKind::And, left, right, self.span_from(start)));
        }
        Ok(left)
    }

    fn relational_operator(token: &Token) -> Option<CompareOp> {
        Some(match token {
            Token::Punctuator(Punctuator::EqEq) | Token::Keyword(Keyword::Eq) => CompareOp::Eq,
            Token::Punctuator(Punctuator::NotEq) | Token::Keyword(Keyword::Ne) => CompareOp::Ne,
            Token::Punctuator(Punctuator::Lt) | Token::Keyword(Keyword::Lt) => CompareOp::Lt,
            Token::Punctuator(Punctuator::LtEq) | Token::Keyword(Keyword::Le) => CompareOp::Le,
            Token::Punctuator(Punctuator::Gt) | Token::Keyword(Keyword::Gt) => CompareOp::Gt,
            Token::Punctuator(Punctuator::GtEq) | Token::Keyword(Keyword::Ge) => CompareOp::Ge,
            _ => return None,
        })
    }

    fn parse_relational(&mut self) -> PResult<Box<dyn Node>> {
        let start = self.start_of_next()?;
        let left = self.parse_sum()?;
        let next = self.peek()?;
        if next.token == Token::Keyword(Keyword::Matches) {
            self.next()?;
            let pattern = self.parse_sum()?;
            return Ok(Box::new(OpMatches::new(left, pattern, self.span_from(start))));
        }
        if let Some(op) = Self::relational_operator(&next.token) {
            self.next()?;
            let right = self.parse_sum()?;
            return Ok(Box::new(OpRelational::new(op, left, right, self.span_from(start))));
        }
        Ok(left)
    }

    fn parse_sum(&mut self) -> PResult<Box<dyn Node>> {
        let start = self.start_of_next()?;
        let mut left = self.parse_product()?;
        loop {
            let kind = match self.peek()?.token {
                Token::Punctuator(Punctuator::Plus) => ArithmeticKind::Plus,
                Token::Punctuator(Punctuator::Minus) => ArithmeticKind::Minus,
                _ => return Ok(left),
            };
            self.next()?;
            let right = self.parse_product()?;
            left = Box::new(OpArithmetic::new(kind, left, right, self.span_from(start)));
        }
    }

    fn parse_product(&mut self) -> PResult<Box<dyn Node>> {
        let start = self.start_of_next()?;
        let mut left = self.parse_power()?;
        loop {
            let kind = match self.peek()?.token {
                Token::Punctuator(Punctuator::Star) => ArithmeticKind::Multiply,
                Token::Punctuator(Punctuator::Slash) | Token::Keyword(Keyword::Div) => {
                    ArithmeticKind::Divide
                }
                Token::Punctuator(Punctuator::Percent) | Token::Keyword(Keyword::Mod) => {
                    ArithmeticKind::Modulus
                }
                _ => return Ok(left),
            };
            self.next()?;
            let right = self.parse_power()?;
            left = Box::new(OpArithmetic::new(kind, left, right, self.span_from(start)));
        }
    }

    fn parse_power(&mut self) -> PResult<Box<dyn Node>> {
        let start = self.start_of_next()?;
        let base = self.parse_unary()?;
        if self.maybe_eat(Punctuator::Caret)? {
            let exponent = self.parse_power()?;
            return Ok(Box::new(OpArithmetic::new(
                ArithmeticKind::Power,
                base,
                exponent,
                self.span_from(start),
            )));
        }
        Ok(base)
    }

    fn parse_unary(&mut self) -> PResult<Box<dyn Node>> {
        let start = self.start_of_next()?;
        match self.peek()?.token {
            Token::Punctuator(Punctuator::Bang) | Token::Keyword(Keyword::Not) => {
                self.next()?;
                let operand = self.parse_unary()?;
                Ok(Box::new(OpNot::new(operand, self.span_from(start))))
            }
            Token::Punctuator(Punctuator::Minus) => {
                self.next()?;
                let operand = self.parse_unary()?;
                Ok(Box::new(OpArithmetic::unary(
                    ArithmeticKind::Minus,
                    operand,
                    self.span_from(start),
                )))
            }
            Token::Punctuator(Punctuator::Plus) => {
                self.next()?;
                let operand = self.parse_unary()?;
                Ok(Box::new(OpArithmetic::unary(
                    ArithmeticKind::Plus,
                    operand,
                    self.span_from(start),
                )))
            }
            _ => self.parse_primary(),
        }
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    fn parse_primary(&mut self) -> PResult<Box<dyn Node>> {
        let start = self.start_of_next()?;
        let mut steps = vec![self.parse_start_node()?];
        loop {
            let next = self.peek()?;
            match next.token {
                Token::Punctuator(Punctuator::Dot) => {
                    self.next()?;
                    steps.push(self.parse_dotted_node(false)?);
                }
                Token::Punctuator(Punctuator::SafeNavi) => {
                    self.next()?;
                    steps.push(self.parse_dotted_node(true)?);
                }
                Token::Punctuator(Punctuator::LBracket) => {
                    steps.push(self.parse_indexer()?);
                }
                _ => break,
            }
        }
        if steps.len() == 1 {
            if let Some(only) = steps.pop() {
                return Ok(only);
            }
        }
        Ok(Box::new(CompoundExpression::new(steps, self.span_from(start))))
    }

    fn parse_start_node(&mut self) -> PResult<Box<dyn Node>> {
        let first = self.peek()?;
        let start = first.span.start;
        match first.token {
            Token::Int(..)
            | Token::Long(..)
            | Token::Float(..)
            | Token::Double(..)
            | Token::String(_)
            | Token::Keyword(Keyword::True | Keyword::False | Keyword::Null) => {
                self.parse_literal()
            }
            Token::Punctuator(Punctuator::LParen) => {
                self.next()?;
                let inner = self.parse_expression()?;
                self.expect(Punctuator::RParen)?;
                Ok(inner)
            }
            Token::Identifier(ref name) if name == "T" => {
                self.next()?;
                if self.peek_is(Punctuator::LParen)? {
                    self.parse_type_reference(start)
                } else {
                    Ok(Box::new(PropertyOrFieldReference::new(
                        "T",
                        false,
                        self.span_from(start),
                    )))
                }
            }
            Token::Identifier(_) => self.parse_method_or_property(false),
            Token::Keyword(Keyword::New) => self.parse_constructor(),
            Token::Punctuator(Punctuator::Hash) => {
                self.next()?;
                let name = self.expect_identifier()?;
                Ok(Box::new(VariableReference::new(name, self.span_from(start))))
            }
            Token::Punctuator(Punctuator::At) => {
                self.next()?;
                let next = self.next()?;
                let name = match next.token {
                    Token::Identifier(name) | Token::String(name) => name,
                    Token::EOF => return Err(unexpected_eof(next.span.start)),
                    other => {
                        return Err(parse_error(
                            MessageCode::UnexpectedToken,
                            next.span.start,
                            [other.to_string()],
                        ))
                    }
                };
                Ok(Box::new(BeanReference::new(name, self.span_from(start))))
            }
            Token::Punctuator(Punctuator::LBrace) => self.parse_inline_list(),
            Token::Punctuator(Punctuator::LBracket) => self.parse_indexer(),
            Token::Punctuator(
                Punctuator::Select
                | Punctuator::SelectFirst
                | Punctuator::SelectLast
                | Punctuator::Project,
            ) => self.parse_collection_operator(false),
            Token::EOF => Err(unexpected_eof(start)),
            other => Err(parse_error(
                MessageCode::UnexpectedToken,
                start,
                [other.to_string()],
            )),
        }
    }

    fn parse_dotted_node(&mut self, null_safe: bool) -> PResult<Box<dyn Node>> {
        let next = self.peek()?;
        match next.token {
            Token::Identifier(_) => self.parse_method_or_property(null_safe),
            Token::Punctuator(
                Punctuator::Select
                | Punctuator::SelectFirst
                | Punctuator::SelectLast
                | Punctuator::Project,
            ) => self.parse_collection_operator(null_safe),
            Token::EOF => Err(unexpected_eof(next.span.start)),
            other => Err(parse_error(
                MessageCode::UnexpectedToken,
                next.span.start,
                [other.to_string()],
            )),
        }
    }

    fn parse_method_or_property(&mut self, null_safe: bool) -> PResult<Box<dyn Node>> {
        let start = self.start_of_next()?;
        let name = self.expect_identifier()?;
        if self.peek_is(Punctuator::LParen)? {
            let args = self.parse_arguments()?;
            return Ok(Box::new(MethodReference::new(
                name,
                null_safe,
                args,
                self.span_from(start),
            )));
        }
        Ok(Box::new(PropertyOrFieldReference::new(
            name,
            null_safe,
            self.span_from(start),
        )))
    }

    fn parse_arguments(&mut self) -> PResult<Vec<Box<dyn Node>>> {
        self.expect(Punctuator::LParen)?;
        let mut args = Vec::new();
        if self.maybe_eat(Punctuator::RParen)? {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression()?);
            if self.maybe_eat(Punctuator::Comma)? {
                continue;
            }
            self.expect(Punctuator::RParen)?;
            return Ok(args);
        }
    }

    fn parse_indexer(&mut self) -> PResult<Box<dyn Node>> {
        let start = self.expect(Punctuator::LBracket)?.span.start;
        let index = self.parse_expression()?;
        self.expect(Punctuator::RBracket)?;
        Ok(Box::new(Indexer::new(index, self.span_from(start))))
    }

    fn parse_collection_operator(&mut self, null_safe: bool) -> PResult<Box<dyn Node>> {
        let open = self.next()?;
        let start = open.span.start;
        let inner = self.parse_expression()?;
        self.expect(Punctuator::RBracket)?;
        let span = self.span_from(start);
        let kind = match open.token {
            Token::Punctuator(Punctuator::Project) => {
                return Ok(Box::new(Projection::new(null_safe, inner, span)))
            }
            Token::Punctuator(Punctuator::SelectFirst) => SelectionKind::First,
            Token::Punctuator(Punctuator::SelectLast) => SelectionKind::Last,
            _ => SelectionKind::All,
        };
        Ok(Box::new(Selection::new(kind, null_safe, inner, span)))
    }

    fn parse_qualified_name(&mut self) -> PResult<String> {
        let mut name = self.expect_identifier()?;
        while self.maybe_eat(Punctuator::Dot)? {
            name.push('.');
            name.push_str(&self.expect_identifier()?);
        }
        Ok(name)
    }

    fn parse_type_reference(&mut self, start: usize) -> PResult<Box<dyn Node>> {
        self.expect(Punctuator::LParen)?;
        let name = self.parse_qualified_name()?;
        self.expect(Punctuator::RParen)?;
        Ok(Box::new(TypeReference::new(name, self.span_from(start))))
    }

    fn parse_constructor(&mut self) -> PResult<Box<dyn Node>> {
        let start = self.next()?.span.start;
        let name = self.parse_qualified_name()?;
        let args = self.parse_arguments()?;
        Ok(Box::new(ConstructorReference::new(
            name,
            args,
            self.span_from(start),
        )))
    }

    fn parse_inline_list(&mut self) -> PResult<Box<dyn Node>> {
        let start = self.expect(Punctuator::LBrace)?.span.start;
        let mut elements = Vec::new();
        if !self.maybe_eat(Punctuator::RBrace)? {
            loop {
                elements.push(self.parse_expression()?);
                if self.maybe_eat(Punctuator::Comma)? {
                    continue;
                }
                self.expect(Punctuator::RBrace)?;
                break;
            }
        }
        Ok(Box::new(InlineList::new(elements, self.span_from(start))))
    }

    fn parse_literal(&mut self) -> PResult<Box<dyn Node>> {
        let token = self.next()?;
        let span = token.span;
        let literal = match token.token {
            Token::Int(n, text) => Literal::new(Value::Int(n), text, span),
            Token::Long(n, text) => Literal::new(Value::Long(n), text, span),
            Token::Float(n, text) => Literal::new(Value::Float(n), text, span),
            Token::Double(n, text) => Literal::new(Value::Double(n), text, span),
            Token::String(s) => Literal::string(&s, span),
            Token::Keyword(Keyword::True) => Literal::boolean(true, span),
            Token::Keyword(Keyword::False) => Literal::boolean(false, span),
            Token::Keyword(Keyword::Null) => Literal::null(span),
            other => {
                return Err(parse_error(
                    MessageCode::UnexpectedToken,
                    span.start,
                    [other.to_string()],
                ))
            }
        };
        Ok(Box::new(literal))
    }
}
