//! Unit tests for the error taxonomy

use core_types::{format_message, EvaluationError, ExpressionError, MessageCode, ParseError};

#[cfg(test)]
mod message_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_operator_message_names_both_types() {
        let error = EvaluationError::new(
            MessageCode::OperatorNotSupportedBetweenTypes,
            ["+", "Money", "Money"],
        );
        assert_eq!(
            error.to_string(),
            "E1101: Operator '+' is not supported between objects of type 'Money' and 'Money'"
        );
    }

    #[test]
    fn test_missing_inserts_leave_placeholders() {
        assert_eq!(
            format_message(MessageCode::TypeConversionError, &["Int".to_string()]),
            "Type conversion problem, cannot convert from 'Int' to '{1}'"
        );
    }

    #[test]
    fn test_ids_are_unique() {
        let codes = [
            MessageCode::MaxExpressionLengthExceeded,
            MessageCode::UnexpectedToken,
            MessageCode::OperatorNotSupportedBetweenTypes,
            MessageCode::PropertyOrFieldNotReadable,
            MessageCode::MethodNotFound,
            MessageCode::ConstructorNotFound,
            MessageCode::TypeConversionError,
            MessageCode::CollectionIndexOutOfBounds,
            MessageCode::NotAssignable,
        ];
        let mut ids: Vec<u16> = codes.iter().map(|c| c.id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), codes.len());
    }
}

#[cfg(test)]
mod carrier_tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let error = ParseError::new(MessageCode::UnterminatedStringLiteral, 4, Vec::<String>::new());
        assert_eq!(
            error.to_string(),
            "E1005: (pos 4): Cannot find terminating quote for string"
        );
    }

    #[test]
    fn test_evaluation_error_passes_through() {
        let error: ExpressionError = EvaluationError::of(MessageCode::DivisionByZero).into();
        assert_eq!(error.to_string(), "E1121: Division by zero");
        assert!(error.clone().into_parse_error().is_none());
        assert_eq!(
            error.into_evaluation_error().map(|e| e.code),
            Some(MessageCode::DivisionByZero)
        );
    }
}
