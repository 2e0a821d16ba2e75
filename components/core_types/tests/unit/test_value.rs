//! Unit tests for Value and host objects

use core_types::{HostObject, Record, TypeDescriptor, Value};

#[cfg(test)]
mod value_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_numeric_widening_helpers() {
        assert_eq!(Value::Byte(-3).as_i64(), Some(-3));
        assert_eq!(Value::Float(1.5).as_f64(), Some(1.5));
        assert_eq!(Value::Double(2.9).as_i64(), Some(2));
        assert_eq!(Value::from("x").as_f64(), None);
    }

    #[test]
    fn test_is_number() {
        assert!(Value::Short(1).is_number());
        assert!(Value::Long(1).is_number());
        assert!(!Value::Char('a').is_number());
        assert!(!Value::Null.is_number());
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::Int(1).type_name(), "Int");
        assert_eq!(Record::new("Money").into_value().type_name(), "Money");
        assert_eq!(
            Value::Type(TypeDescriptor::Long).type_descriptor(),
            Some(TypeDescriptor::Type)
        );
    }

    #[test]
    fn test_shared_list_mutation_is_visible() {
        let list = Value::list(vec![Value::Int(1)]);
        if let Value::List(items) = &list {
            items.write().push(Value::Int(2));
        }
        assert_eq!(list.to_string(), "[1, 2]");
    }

    #[test]
    fn test_display_of_scalars() {
        assert_eq!(Value::Boolean(true).to_string(), "true");
        assert_eq!(Value::Char('z').to_string(), "z");
        assert_eq!(Value::Long(-7).to_string(), "-7");
        assert_eq!(Value::Double(0.25).to_string(), "0.25");
        assert_eq!(Value::Double(f64::NAN).to_string(), "NaN");
    }
}

#[cfg(test)]
mod record_tests {
    use super::*;

    #[test]
    fn test_record_is_open() {
        let record = Record::new("Person");
        assert!(record.write_property("name", Value::from("b")));
        assert_eq!(record.read_property("name"), Some(Value::from("b")));
        assert_eq!(record.property_names(), vec!["name".to_string()]);
    }

    #[test]
    fn test_record_has_no_methods() {
        let record = Record::new("Person");
        assert!(!record.responds_to("size", 0));
        assert!(record.invoke("size", &[]).is_err());
    }

    #[test]
    fn test_downcast() {
        let value = Record::new("Person").with("age", 3).into_value();
        let object = value.as_object().unwrap();
        assert!(object.as_any().downcast_ref::<Record>().is_some());
    }
}
