//! Expression lexer - tokenizes expression source into tokens

use crate::error::{parse_error, unexpected_character};
use core_types::{MessageCode, ParseError, SourceSpan};
use std::fmt;

/// Reserved words, matched case-insensitively
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    /// true
    True,
    /// false
    False,
    /// null
    Null,
    /// new
    New,
    /// and
    And,
    /// or
    Or,
    /// not
    Not,
    /// matches
    Matches,
    /// eq
    Eq,
    /// ne
    Ne,
    /// lt
    Lt,
    /// le
    Le,
    /// gt
    Gt,
    /// ge
    Ge,
    /// div
    Div,
    /// mod
    Mod,
}

impl Keyword {
    fn lookup(word: &str) -> Option<Keyword> {
        Some(match word.to_ascii_lowercase().as_str() {
            "true" => Keyword::True,
            "false" => Keyword::False,
            "null" => Keyword::Null,
            "new" => Keyword::New,
            "and" => Keyword::And,
            "or" => Keyword::Or,
            "not" => Keyword::Not,
            "matches" => Keyword::Matches,
            "eq" => Keyword::Eq,
            "ne" => Keyword::Ne,
            "lt" => Keyword::Lt,
            "le" => Keyword::Le,
            "gt" => Keyword::Gt,
            "ge" => Keyword::Ge,
            "div" => Keyword::Div,
            "mod" => Keyword::Mod,
            _ => return None,
        })
    }
}

/// Operators and delimiters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punctuator {
    /// (
    LParen,
    /// )
    RParen,
    /// [
    LBracket,
    /// ]
    RBracket,
    /// {
    LBrace,
    /// }
    RBrace,
    /// ,
    Comma,
    /// .
    Dot,
    /// ?.
    SafeNavi,
    /// ?[
    Select,
    /// ^[
    SelectFirst,
    /// $[
    SelectLast,
    /// ![
    Project,
    /// ?
    Question,
    /// ?:
    Elvis,
    /// :
    Colon,
    /// +
    Plus,
    /// -
    Minus,
    /// *
    Star,
    /// /
    Slash,
    /// %
    Percent,
    /// ^
    Caret,
    /// !
    Bang,
    /// ==
    EqEq,
    /// !=
    NotEq,
    /// <
    Lt,
    /// <=
    LtEq,
    /// >
    Gt,
    /// >=
    GtEq,
    /// &&
    AndAnd,
    /// ||
    OrOr,
    /// =
    Assign,
    /// #
    Hash,
    /// @
    At,
}

impl Punctuator {
    /// Source text of the punctuator
    pub fn text(self) -> &'static str {
        match self {
            Punctuator::LParen => "(",
            Punctuator::RParen => ")",
            Punctuator::LBracket => "[",
            Punctuator::RBracket => "]",
            Punctuator::LBrace => "{",
            Punctuator::RBrace => "}",
            Punctuator::Comma => ",",
            Punctuator::Dot => ".",
            Punctuator::SafeNavi => "?.",
            Punctuator::Select => "?[",
            Punctuator::SelectFirst => "^[",
            Punctuator::SelectLast => "$[",
            Punctuator::Project => "![",
            Punctuator::Question => "?",
            Punctuator::Elvis => "?:",
            Punctuator::Colon => ":",
            Punctuator::Plus => "+",
            Punctuator::Minus => "-",
            Punctuator::Star => "*",
            Punctuator::Slash => "/",
            Punctuator::Percent => "%",
            Punctuator::Caret => "^",
            Punctuator::Bang => "!",
            Punctuator::EqEq => "==",
            Punctuator::NotEq => "!=",
            Punctuator::Lt => "<",
            Punctuator::LtEq => "<=",
            Punctuator::Gt => ">",
            Punctuator::GtEq => ">=",
            Punctuator::AndAnd => "&&",
            Punctuator::OrOr => "||",
            Punctuator::Assign => "=",
            Punctuator::Hash => "#",
            Punctuator::At => "@",
        }
    }
}

/// Token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifier
    Identifier(String),
    /// Int literal, with its source text
    Int(i32, String),
    /// Long literal, with its source text
    Long(i64, String),
    /// Float literal, with its source text
    Float(f32, String),
    /// Double literal, with its source text
    Double(f64, String),
    /// String literal, unescaped
    String(String),
    /// Keyword
    Keyword(Keyword),
    /// Punctuator/operator
    Punctuator(Punctuator),
    /// End of input
    EOF,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier(name) => f.write_str(name),
            Token::Int(_, text)
            | Token::Long(_, text)
            | Token::Float(_, text)
            | Token::Double(_, text) => f.write_str(text),
            Token::String(s) => write!(f, "'{}'", s),
            Token::Keyword(k) => f.write_str(&format!("{:?}", k).to_ascii_lowercase()),
            Token::Punctuator(p) => f.write_str(p.text()),
            Token::EOF => f.write_str("<end>"),
        }
    }
}

/// A token and the source range it covers
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    /// The token
    pub token: Token,
    /// Character range in the full source
    pub span: SourceSpan,
}

/// Lexer for expression source
pub struct Lexer {
    chars: Vec<char>,
    position: usize,
    base_offset: usize,
    current_token: Option<Spanned>,
}

impl Lexer {
    /// Create a lexer for the given source
    pub fn new(source: &str) -> Self {
        Self::with_offset(source, 0)
    }

    /// Create a lexer whose positions are shifted by `base_offset`.
    ///
    /// Used for expressions embedded in a template.
    pub fn with_offset(source: &str, base_offset: usize) -> Self {
        Self {
            chars: source.chars().collect(),
            position: 0,
            base_offset,
            current_token: None,
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Result<Spanned, ParseError> {
        if let Some(token) = self.current_token.take() {
            return Ok(token);
        }
        self.scan_token()
    }

    /// Peek at the next token without consuming it
    pub fn peek_token(&mut self) -> Result<&Spanned, ParseError> {
        let token = match self.current_token.take() {
            Some(token) => token,
            None => self.scan_token()?,
        };
        Ok(self.current_token.insert(token))
    }

    /// Unconsumed source text, starting at the peeked token if any
    pub fn remaining_text(&self) -> String {
        let from = self
            .current_token
            .as_ref()
            .map_or(self.position, |t| t.span.start - self.base_offset);
        self.chars[from.min(self.chars.len())..].iter().collect()
    }

    fn offset(&self, local: usize) -> usize {
        self.base_offset + local
    }

    fn spanned(&self, token: Token, start: usize) -> Spanned {
        Spanned {
            token,
            span: SourceSpan::new(self.offset(start), self.offset(self.position)),
        }
    }

    fn scan_token(&mut self) -> Result<Spanned, ParseError> {
        self.skip_whitespace();
        let start = self.position;
        if self.is_at_end() {
            return Ok(self.spanned(Token::EOF, start));
        }
        let ch = self.advance();
        let punct = |p| Token::Punctuator(p);
        let token = match ch {
            '(' => punct(Punctuator::LParen),
            ')' => punct(Punctuator::RParen),
            '[' => punct(Punctuator::LBracket),
            ']' => punct(Punctuator::RBracket),
            '{' => punct(Punctuator::LBrace),
            '}' => punct(Punctuator::RBrace),
            ',' => punct(Punctuator::Comma),
            ':' => punct(Punctuator::Colon),
            '+' => punct(Punctuator::Plus),
            '-' => punct(Punctuator::Minus),
            '*' => punct(Punctuator::Star),
            '/' => punct(Punctuator::Slash),
            '%' => punct(Punctuator::Percent),
            '#' => punct(Punctuator::Hash),
            '@' => punct(Punctuator::At),
            '?' => {
                if self.match_char('.') {
                    punct(Punctuator::SafeNavi)
                } else if self.match_char('[') {
                    punct(Punctuator::Select)
                } else if self.match_char(':') {
                    punct(Punctuator::Elvis)
                } else {
                    punct(Punctuator::Question)
                }
            }
            '^' => {
                if self.match_char('[') {
                    punct(Punctuator::SelectFirst)
                } else {
                    punct(Punctuator::Caret)
                }
            }
            '!' => {
                if self.match_char('=') {
                    punct(Punctuator::NotEq)
                } else if self.match_char('[') {
                    punct(Punctuator::Project)
                } else {
                    punct(Punctuator::Bang)
                }
            }
            '=' => {
                if self.match_char('=') {
                    punct(Punctuator::EqEq)
                } else {
                    punct(Punctuator::Assign)
                }
            }
            '<' => {
                if self.match_char('=') {
                    punct(Punctuator::LtEq)
                } else {
                    punct(Punctuator::Lt)
                }
            }
            '>' => {
                if self.match_char('=') {
                    punct(Punctuator::GtEq)
                } else {
                    punct(Punctuator::Gt)
                }
            }
            '&' if self.match_char('&') => punct(Punctuator::AndAnd),
            '|' if self.match_char('|') => punct(Punctuator::OrOr),
            '.' => punct(Punctuator::Dot),
            '$' if self.match_char('[') => punct(Punctuator::SelectLast),
            '\'' | '"' => self.scan_string(ch, start)?,
            c if c.is_ascii_digit() => self.scan_number(c, start)?,
            c if is_id_start(c) => self.scan_identifier(c),
            c => return Err(unexpected_character(c, self.offset(start))),
        };
        Ok(self.spanned(token, start))
    }

    /// Quotes inside a literal are escaped by doubling them
    fn scan_string(&mut self, quote: char, start: usize) -> Result<Token, ParseError> {
        let mut value = String::new();
        loop {
            if self.is_at_end() {
                return Err(parse_error(
                    MessageCode::UnterminatedStringLiteral,
                    self.offset(start),
                    Vec::<String>::new(),
                ));
            }
            let c = self.advance();
            if c == quote {
                if self.match_char(quote) {
                    value.push(quote);
                } else {
                    return Ok(Token::String(value));
                }
            } else {
                value.push(c);
            }
        }
    }

    fn scan_number(&mut self, first: char, start: usize) -> Result<Token, ParseError> {
        if first == '0' && matches!(self.peek(), 'x' | 'X') {
            self.advance();
            return self.scan_hex(start);
        }
        let mut digits = String::from(first);
        self.take_digits(&mut digits);
        let mut real = false;
        if self.peek() == '.' && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            real = true;
            digits.push(self.advance());
            self.take_digits(&mut digits);
        }
        if matches!(self.peek(), 'e' | 'E') {
            let sign = self.peek_next();
            let digit_at = if matches!(sign, Some('+' | '-')) { 2 } else { 1 };
            if self.chars.get(self.position + digit_at).is_some_and(|c| c.is_ascii_digit()) {
                real = true;
                for _ in 0..digit_at {
                    digits.push(self.advance());
                }
                self.take_digits(&mut digits);
            }
        }
        let text_at = |lexer: &Lexer| -> String { lexer.chars[start..lexer.position].iter().collect() };
        let at = self.offset(start);
        match self.peek() {
            'l' | 'L' if !real => {
                self.advance();
                let text = text_at(self);
                let n = digits
                    .parse::<i64>()
                    .map_err(|_| parse_error(MessageCode::NotALong, at, [&text]))?;
                Ok(Token::Long(n, text))
            }
            'f' | 'F' => {
                self.advance();
                let text = text_at(self);
                let n = digits
                    .parse::<f32>()
                    .map_err(|_| parse_error(MessageCode::InvalidRealLiteral, at, [&text]))?;
                Ok(Token::Float(n, text))
            }
            'd' | 'D' => {
                self.advance();
                let text = text_at(self);
                let n = digits
                    .parse::<f64>()
                    .map_err(|_| parse_error(MessageCode::InvalidRealLiteral, at, [&text]))?;
                Ok(Token::Double(n, text))
            }
            _ if real => {
                let text = text_at(self);
                let n = digits
                    .parse::<f64>()
                    .map_err(|_| parse_error(MessageCode::InvalidRealLiteral, at, [&text]))?;
                Ok(Token::Double(n, text))
            }
            _ => {
                let text = text_at(self);
                let n = digits
                    .parse::<i32>()
                    .map_err(|_| parse_error(MessageCode::NotAnInteger, at, [&text]))?;
                Ok(Token::Int(n, text))
            }
        }
    }

    fn scan_hex(&mut self, start: usize) -> Result<Token, ParseError> {
        let mut digits = String::new();
        while self.peek().is_ascii_hexdigit() {
            digits.push(self.advance());
        }
        let long = matches!(self.peek(), 'l' | 'L');
        if long {
            self.advance();
        }
        let text: String = self.chars[start..self.position].iter().collect();
        let at = self.offset(start);
        if long {
            let n = u64::from_str_radix(&digits, 16)
                .map_err(|_| parse_error(MessageCode::NotALong, at, [&text]))?;
            Ok(Token::Long(n as i64, text))
        } else {
            let n = u32::from_str_radix(&digits, 16)
                .map_err(|_| parse_error(MessageCode::NotAnInteger, at, [&text]))?;
            Ok(Token::Int(n as i32, text))
        }
    }

    fn take_digits(&mut self, into: &mut String) {
        while self.peek().is_ascii_digit() {
            into.push(self.advance());
        }
    }

    fn scan_identifier(&mut self, first: char) -> Token {
        let mut name = String::from(first);
        while is_id_continue(self.peek()) {
            name.push(self.advance());
        }
        match Keyword::lookup(&name) {
            Some(keyword) => Token::Keyword(keyword),
            None => Token::Identifier(name),
        }
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.peek().is_whitespace() {
            self.position += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.chars.len()
    }

    fn peek(&self) -> char {
        self.chars.get(self.position).copied().unwrap_or('\0')
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.position + 1).copied()
    }

    fn advance(&mut self) -> char {
        let ch = self.peek();
        self.position += 1;
        ch
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == expected && !self.is_at_end() {
            self.position += 1;
            true
        } else {
            false
        }
    }
}

fn is_id_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}

fn is_id_continue(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut out = Vec::new();
        loop {
            let next = lexer.next_token().unwrap();
            if next.token == Token::EOF {
                return out;
            }
            out.push(next.token);
        }
    }

    #[test]
    fn test_lexer_empty_source() {
        assert!(tokens("   ").is_empty());
    }

    #[test]
    fn test_lexer_numbers() {
        assert_eq!(
            tokens("42 7L 0x1F 1.5 2f 3d 1e3"),
            vec![
                Token::Int(42, "42".into()),
                Token::Long(7, "7L".into()),
                Token::Int(31, "0x1F".into()),
                Token::Double(1.5, "1.5".into()),
                Token::Float(2.0, "2f".into()),
                Token::Double(3.0, "3d".into()),
                Token::Double(1000.0, "1e3".into()),
            ]
        );
    }

    #[test]
    fn test_lexer_int_overflow() {
        let err = Lexer::new("2147483648").next_token().unwrap_err();
        assert_eq!(err.code, MessageCode::NotAnInteger);
        assert_eq!(err.inserts, vec!["2147483648"]);
        assert_eq!(
            tokens("2147483648L"),
            vec![Token::Long(2_147_483_648, "2147483648L".into())]
        );
    }

    #[test]
    fn test_lexer_strings_with_doubled_quotes() {
        assert_eq!(
            tokens(r#"'it''s' "say ""hi""""#),
            vec![
                Token::String("it's".into()),
                Token::String(r#"say "hi""#.into())
            ]
        );
        let err = Lexer::new("'open").next_token().unwrap_err();
        assert_eq!(err.code, MessageCode::UnterminatedStringLiteral);
        assert_eq!(err.position, 0);
    }

    #[test]
    fn test_lexer_word_operators_ignore_case() {
        assert_eq!(
            tokens("a AND b or NOT c"),
            vec![
                Token::Identifier("a".into()),
                Token::Keyword(Keyword::And),
                Token::Identifier("b".into()),
                Token::Keyword(Keyword::Or),
                Token::Keyword(Keyword::Not),
                Token::Identifier("c".into()),
            ]
        );
    }

    #[test]
    fn test_lexer_collection_operators() {
        assert_eq!(
            tokens("?.?[ ^[ $[ ![ ?: ? != !"),
            vec![
                Token::Punctuator(Punctuator::SafeNavi),
                Token::Punctuator(Punctuator::Select),
                Token::Punctuator(Punctuator::SelectFirst),
                Token::Punctuator(Punctuator::SelectLast),
                Token::Punctuator(Punctuator::Project),
                Token::Punctuator(Punctuator::Elvis),
                Token::Punctuator(Punctuator::Question),
                Token::Punctuator(Punctuator::NotEq),
                Token::Punctuator(Punctuator::Bang),
            ]
        );
    }

    #[test]
    fn test_lexer_spans_are_shifted() {
        let mut lexer = Lexer::with_offset("a + b", 10);
        lexer.next_token().unwrap();
        let plus = lexer.next_token().unwrap();
        assert_eq!(plus.span, SourceSpan::new(12, 13));
    }

    #[test]
    fn test_lexer_unexpected_character() {
        let mut lexer = Lexer::new("a ~ b");
        lexer.next_token().unwrap();
        let err = lexer.next_token().unwrap_err();
        assert_eq!(err.position, 2);
        assert_eq!(err.code, MessageCode::UnexpectedCharacter);
        assert_eq!(err.inserts, vec!["~"]);
    }

    #[test]
    fn test_remaining_text_includes_peeked_token() {
        let mut lexer = Lexer::new("1 2 3");
        lexer.next_token().unwrap();
        lexer.peek_token().unwrap();
        assert_eq!(lexer.remaining_text(), "2 3");
    }
}
