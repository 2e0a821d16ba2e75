//! Unit tests for TypedValue

use core_types::{TypeDescriptor, TypedValue, Value};

#[cfg(test)]
mod typed_value_tests {
    use super::*;

    #[test]
    fn test_type_is_inferred_lazily() {
        let value = TypedValue::new(Value::Long(5));
        assert_eq!(value.type_descriptor(), Some(&TypeDescriptor::Long));
        assert_eq!(value.type_descriptor(), Some(&TypeDescriptor::Long));
    }

    #[test]
    fn test_null_has_no_type() {
        assert!(TypedValue::null().is_null());
        assert_eq!(TypedValue::null().type_descriptor(), None);
    }

    #[test]
    fn test_into_value() {
        let value = TypedValue::from(Value::from("hello"));
        assert_eq!(value.to_string(), "hello");
        assert_eq!(value.into_value(), Value::from("hello"));
    }
}
