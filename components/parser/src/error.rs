//! Parser error types and helpers

use core_types::{MessageCode, ParseError};

/// Create a parse error at a given position
pub fn parse_error<I, S>(code: MessageCode, position: usize, inserts: I) -> ParseError
where
    I: IntoIterator<Item = S>,
    S: ToString,
{
    ParseError::new(code, position, inserts)
}

/// Create an unrecognized character error
pub fn unexpected_character(c: char, position: usize) -> ParseError {
    ParseError::new(MessageCode::UnexpectedCharacter, position, [c])
}

/// Create a missing token error
pub fn missing_token(expected: &str, found: &str, position: usize) -> ParseError {
    ParseError::new(MessageCode::MissingExpectedToken, position, [expected, found])
}

/// Create an unexpected end of input error
pub fn unexpected_eof(position: usize) -> ParseError {
    ParseError::new(MessageCode::UnexpectedEndOfInput, position, Vec::<String>::new())
}
