//! Error taxonomy.
//!
//! Parse failures and evaluation failures both carry a [`MessageCode`], an
//! ordered list of inserts, and a position. Rendering a diagnostic is a pure
//! function of those three.

use crate::SourceSpan;
use std::fmt;
use thiserror::Error;

/// Result of an evaluation step.
pub type EvalResult<T> = Result<T, EvaluationError>;

/// Diagnostic message codes.
///
/// Each code has a fixed numeric id and a message template with `{n}`
/// placeholders filled from the error's inserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageCode {
    // Parse time
    /// Source longer than the configured limit
    MaxExpressionLengthExceeded,
    /// Input ended inside a construct
    UnexpectedEndOfInput,
    /// Token not valid at this point
    UnexpectedToken,
    /// A required token is missing
    MissingExpectedToken,
    /// String literal without closing quote
    UnterminatedStringLiteral,
    /// Character outside the token set
    UnexpectedCharacter,
    /// Integer literal out of range
    NotAnInteger,
    /// Long literal out of range
    NotALong,
    /// Real literal cannot be parsed
    InvalidRealLiteral,
    /// Tokens left after a complete expression
    MoreInput,
    /// Template expression without suffix
    MissingTemplateSuffix,
    /// Template delimiters with nothing inside
    EmptyTemplateExpression,

    // Evaluation time
    /// Binary operator rejected for the operand types
    OperatorNotSupportedBetweenTypes,
    /// Unary operator rejected for the operand type
    OperatorNotSupportedOnType,
    /// No accessor can read the property
    PropertyOrFieldNotReadable,
    /// Property read on null
    PropertyOrFieldNotReadableOnNull,
    /// No accessor can write the property
    PropertyOrFieldNotWritable,
    /// Property write on null
    PropertyOrFieldNotWritableOnNull,
    /// No resolver found the method
    MethodNotFound,
    /// Method call on null
    MethodCallOnNullObjectNotAllowed,
    /// Host method failed
    ExceptionDuringMethodInvocation,
    /// No resolver found a constructor
    ConstructorNotFound,
    /// Host constructor failed
    ConstructorInvocationProblem,
    /// Type locator cannot find the type
    TypeNotFound,
    /// Type converter cannot convert
    TypeConversionError,
    /// Type comparator cannot compare
    NotComparable,
    /// Collection index out of range
    CollectionIndexOutOfBounds,
    /// String index out of range
    StringIndexOutOfBounds,
    /// Value cannot be indexed
    IndexingNotSupportedForType,
    /// Index applied to null
    CannotIndexIntoNullValue,
    /// Collection auto-grow failed
    UnableToGrowCollection,
    /// Write on a node that is not writable
    NotAssignable,
    /// Integer division or modulus by zero
    DivisionByZero,
    /// Regular expression does not compile
    InvalidPattern,
    /// Left operand of `matches` is not a string
    InvalidFirstOperandForMatches,
    /// Selection criteria produced a non-boolean
    ResultOfSelectionCriteriaIsNotBoolean,
    /// Selection applied to an unsupported value
    InvalidTypeForSelection,
    /// Projection applied to an unsupported value
    ProjectionNotSupportedOnType,
    /// Bean reference without bean resolver
    NoBeanResolverRegistered,
    /// Bean resolver failed
    ExceptionDuringBeanResolution,
}

impl MessageCode {
    /// Numeric id of the code.
    pub fn id(self) -> u16 {
        match self {
            MessageCode::MaxExpressionLengthExceeded => 1001,
            MessageCode::UnexpectedEndOfInput => 1002,
            MessageCode::UnexpectedToken => 1003,
            MessageCode::MissingExpectedToken => 1004,
            MessageCode::UnterminatedStringLiteral => 1005,
            MessageCode::UnexpectedCharacter => 1006,
            MessageCode::NotAnInteger => 1007,
            MessageCode::NotALong => 1008,
            MessageCode::InvalidRealLiteral => 1009,
            MessageCode::MoreInput => 1010,
            MessageCode::MissingTemplateSuffix => 1011,
            MessageCode::EmptyTemplateExpression => 1012,
            MessageCode::OperatorNotSupportedBetweenTypes => 1101,
            MessageCode::OperatorNotSupportedOnType => 1102,
            MessageCode::PropertyOrFieldNotReadable => 1103,
            MessageCode::PropertyOrFieldNotReadableOnNull => 1104,
            MessageCode::PropertyOrFieldNotWritable => 1105,
            MessageCode::PropertyOrFieldNotWritableOnNull => 1106,
            MessageCode::MethodNotFound => 1107,
            MessageCode::MethodCallOnNullObjectNotAllowed => 1108,
            MessageCode::ExceptionDuringMethodInvocation => 1109,
            MessageCode::ConstructorNotFound => 1110,
            MessageCode::ConstructorInvocationProblem => 1111,
            MessageCode::TypeNotFound => 1112,
            MessageCode::TypeConversionError => 1113,
            MessageCode::NotComparable => 1114,
            MessageCode::CollectionIndexOutOfBounds => 1115,
            MessageCode::StringIndexOutOfBounds => 1116,
            MessageCode::IndexingNotSupportedForType => 1117,
            MessageCode::CannotIndexIntoNullValue => 1118,
            MessageCode::UnableToGrowCollection => 1119,
            MessageCode::NotAssignable => 1120,
            MessageCode::DivisionByZero => 1121,
            MessageCode::InvalidPattern => 1122,
            MessageCode::InvalidFirstOperandForMatches => 1123,
            MessageCode::ResultOfSelectionCriteriaIsNotBoolean => 1124,
            MessageCode::InvalidTypeForSelection => 1125,
            MessageCode::ProjectionNotSupportedOnType => 1126,
            MessageCode::NoBeanResolverRegistered => 1127,
            MessageCode::ExceptionDuringBeanResolution => 1128,
        }
    }

    /// Message template with `{n}` placeholders.
    pub fn template(self) -> &'static str {
        match self {
            MessageCode::MaxExpressionLengthExceeded => {
                "The expression exceeds the maximum length of {0} characters"
            }
            MessageCode::UnexpectedEndOfInput => "Unexpectedly ran out of input",
            MessageCode::UnexpectedToken => "Unexpected token '{0}'",
            MessageCode::MissingExpectedToken => "Expected '{0}' but found '{1}'",
            MessageCode::UnterminatedStringLiteral => "Cannot find terminating quote for string",
            MessageCode::UnexpectedCharacter => "Unrecognized character '{0}'",
            MessageCode::NotAnInteger => "The value '{0}' cannot be parsed as an int",
            MessageCode::NotALong => "The value '{0}' cannot be parsed as a long",
            MessageCode::InvalidRealLiteral => "The value '{0}' cannot be parsed as a real number",
            MessageCode::MoreInput => {
                "After parsing a valid expression, there is still more data in the expression: '{0}'"
            }
            MessageCode::MissingTemplateSuffix => {
                "No ending suffix '{0}' for expression starting at character {1}"
            }
            MessageCode::EmptyTemplateExpression => {
                "No expression defined within delimiter '{0}' at character {1}"
            }
            MessageCode::OperatorNotSupportedBetweenTypes => {
                "Operator '{0}' is not supported between objects of type '{1}' and '{2}'"
            }
            MessageCode::OperatorNotSupportedOnType => {
                "Operator '{0}' is not supported on an object of type '{1}'"
            }
            MessageCode::PropertyOrFieldNotReadable => {
                "Property or field '{0}' cannot be found on object of type '{1}'"
            }
            MessageCode::PropertyOrFieldNotReadableOnNull => {
                "Property or field '{0}' cannot be found on null"
            }
            MessageCode::PropertyOrFieldNotWritable => {
                "Property or field '{0}' cannot be set on object of type '{1}'"
            }
            MessageCode::PropertyOrFieldNotWritableOnNull => {
                "Property or field '{0}' cannot be set on null"
            }
            MessageCode::MethodNotFound => "Method call: Method {0} cannot be found on type '{1}'",
            MessageCode::MethodCallOnNullObjectNotAllowed => {
                "Method call: Attempted to call method {0} on null context object"
            }
            MessageCode::ExceptionDuringMethodInvocation => {
                "A problem occurred whilst attempting to invoke method '{0}' on type '{1}': '{2}'"
            }
            MessageCode::ConstructorNotFound => {
                "Constructor call: No suitable constructor found on type '{0}' for arguments {1}"
            }
            MessageCode::ConstructorInvocationProblem => {
                "A problem occurred whilst attempting to construct an object of type '{0}': '{1}'"
            }
            MessageCode::TypeNotFound => "Type cannot be found '{0}'",
            MessageCode::TypeConversionError => {
                "Type conversion problem, cannot convert from '{0}' to '{1}'"
            }
            MessageCode::NotComparable => "Cannot compare instances of '{0}' and '{1}'",
            MessageCode::CollectionIndexOutOfBounds => {
                "The collection has '{0}' elements, index '{1}' is invalid"
            }
            MessageCode::StringIndexOutOfBounds => {
                "The string has '{0}' characters, index '{1}' is invalid"
            }
            MessageCode::IndexingNotSupportedForType => {
                "Indexing into type '{0}' is not supported"
            }
            MessageCode::CannotIndexIntoNullValue => "Cannot index into a null value",
            MessageCode::UnableToGrowCollection => "Unable to grow collection: {0}",
            MessageCode::NotAssignable => "Cannot assign to the expression '{0}'",
            MessageCode::DivisionByZero => "Division by zero",
            MessageCode::InvalidPattern => "Pattern '{0}' is not valid: {1}",
            MessageCode::InvalidFirstOperandForMatches => {
                "First operand to matches operator must be a string. '{0}' is not"
            }
            MessageCode::ResultOfSelectionCriteriaIsNotBoolean => {
                "Result of selection criteria is not boolean"
            }
            MessageCode::InvalidTypeForSelection => {
                "Cannot perform selection on input data of type '{0}'"
            }
            MessageCode::ProjectionNotSupportedOnType => {
                "Projection is not supported on the type '{0}'"
            }
            MessageCode::NoBeanResolverRegistered => {
                "No bean resolver registered in the context to resolve access to bean '{0}'"
            }
            MessageCode::ExceptionDuringBeanResolution => {
                "A problem occurred whilst attempting to access the bean '{0}': '{1}'"
            }
        }
    }
}

impl fmt::Display for MessageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.id())
    }
}

/// Fill a message template with inserts.
///
/// # Examples
///
/// ```
/// use core_types::{format_message, MessageCode};
///
/// let message = format_message(
///     MessageCode::OperatorNotSupportedBetweenTypes,
///     &["+".to_string(), "Money".to_string(), "Money".to_string()],
/// );
/// assert_eq!(
///     message,
///     "Operator '+' is not supported between objects of type 'Money' and 'Money'"
/// );
/// ```
pub fn format_message(code: MessageCode, inserts: &[String]) -> String {
    let mut message = code.template().to_string();
    for (i, insert) in inserts.iter().enumerate() {
        message = message.replace(&format!("{{{}}}", i), insert);
    }
    message
}

/// Evaluation-time failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationError {
    /// Message code
    pub code: MessageCode,
    /// Ordered format arguments
    pub inserts: Vec<String>,
    /// Span of the node that failed, if known
    pub span: Option<SourceSpan>,
}

impl EvaluationError {
    /// Create an error with inserts
    pub fn new<I, S>(code: MessageCode, inserts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        Self {
            code,
            inserts: inserts.into_iter().map(|s| s.to_string()).collect(),
            span: None,
        }
    }

    /// Create an error without inserts
    pub fn of(code: MessageCode) -> Self {
        Self {
            code,
            inserts: Vec::new(),
            span: None,
        }
    }

    /// Attach a span unless an inner node already did
    pub fn at(mut self, span: SourceSpan) -> Self {
        if self.span.is_none() {
            self.span = Some(span);
        }
        self
    }

    /// Rendered message without code or position
    pub fn message(&self) -> String {
        format_message(self.code, &self.inserts)
    }
}

impl fmt::Display for EvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.span {
            Some(span) => write!(f, "{}: ({}): {}", self.code, span, self.message()),
            None => write!(f, "{}: {}", self.code, self.message()),
        }
    }
}

impl std::error::Error for EvaluationError {}

/// Parse-time failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Message code
    pub code: MessageCode,
    /// Ordered format arguments
    pub inserts: Vec<String>,
    /// Character offset in the source
    pub position: usize,
}

impl ParseError {
    /// Create a parse error
    pub fn new<I, S>(code: MessageCode, position: usize, inserts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        Self {
            code,
            inserts: inserts.into_iter().map(|s| s.to_string()).collect(),
            position,
        }
    }

    /// Rendered message without code or position
    pub fn message(&self) -> String {
        format_message(self.code, &self.inserts)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: (pos {}): {}", self.code, self.position, self.message())
    }
}

impl std::error::Error for ParseError {}

/// Either kind of failure, as surfaced by the public API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    /// Malformed source
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// Failure while evaluating
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

impl ExpressionError {
    /// Message code of the underlying failure
    pub fn code(&self) -> MessageCode {
        match self {
            ExpressionError::Parse(e) => e.code,
            ExpressionError::Evaluation(e) => e.code,
        }
    }

    /// Unwrap a parse failure
    pub fn into_parse_error(self) -> Option<ParseError> {
        match self {
            ExpressionError::Parse(e) => Some(e),
            ExpressionError::Evaluation(_) => None,
        }
    }

    /// Unwrap an evaluation failure
    pub fn into_evaluation_error(self) -> Option<EvaluationError> {
        match self {
            ExpressionError::Evaluation(e) => Some(e),
            ExpressionError::Parse(_) => None,
        }
    }
}
