//! Runtime type tags.

use crate::Value;
use std::fmt;

/// Runtime type of a value.
///
/// Used by type converters, comparators and diagnostics. Host object types
/// are identified by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    /// Boolean
    Boolean,
    /// Character
    Char,
    /// 8-bit integer
    Byte,
    /// 16-bit integer
    Short,
    /// 32-bit integer
    Int,
    /// 64-bit integer
    Long,
    /// Single-precision float
    Float,
    /// Double-precision float
    Double,
    /// String
    String,
    /// List
    List,
    /// Map
    Map,
    /// Type value
    Type,
    /// Host object type
    Named(std::string::String),
    /// Any value
    Any,
}

impl TypeDescriptor {
    /// Type of a runtime value, `None` for null.
    pub fn of(value: &Value) -> Option<Self> {
        Some(match value {
            Value::Null => return None,
            Value::Boolean(_) => TypeDescriptor::Boolean,
            Value::Char(_) => TypeDescriptor::Char,
            Value::Byte(_) => TypeDescriptor::Byte,
            Value::Short(_) => TypeDescriptor::Short,
            Value::Int(_) => TypeDescriptor::Int,
            Value::Long(_) => TypeDescriptor::Long,
            Value::Float(_) => TypeDescriptor::Float,
            Value::Double(_) => TypeDescriptor::Double,
            Value::String(_) => TypeDescriptor::String,
            Value::List(_) => TypeDescriptor::List,
            Value::Map(_) => TypeDescriptor::Map,
            Value::Object(o) => TypeDescriptor::Named(o.type_name().to_string()),
            Value::Type(_) => TypeDescriptor::Type,
        })
    }

    /// Look up a built-in type by name.
    pub fn builtin(name: &str) -> Option<Self> {
        Some(match name {
            "Boolean" => TypeDescriptor::Boolean,
            "Char" => TypeDescriptor::Char,
            "Byte" => TypeDescriptor::Byte,
            "Short" => TypeDescriptor::Short,
            "Int" => TypeDescriptor::Int,
            "Long" => TypeDescriptor::Long,
            "Float" => TypeDescriptor::Float,
            "Double" => TypeDescriptor::Double,
            "String" => TypeDescriptor::String,
            "List" => TypeDescriptor::List,
            "Map" => TypeDescriptor::Map,
            "Type" => TypeDescriptor::Type,
            "Object" => TypeDescriptor::Any,
            _ => return None,
        })
    }

    /// Type name.
    pub fn name(&self) -> &str {
        match self {
            TypeDescriptor::Boolean => "Boolean",
            TypeDescriptor::Char => "Char",
            TypeDescriptor::Byte => "Byte",
            TypeDescriptor::Short => "Short",
            TypeDescriptor::Int => "Int",
            TypeDescriptor::Long => "Long",
            TypeDescriptor::Float => "Float",
            TypeDescriptor::Double => "Double",
            TypeDescriptor::String => "String",
            TypeDescriptor::List => "List",
            TypeDescriptor::Map => "Map",
            TypeDescriptor::Type => "Type",
            TypeDescriptor::Named(name) => name,
            TypeDescriptor::Any => "Object",
        }
    }

    /// Numeric types.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TypeDescriptor::Byte
                | TypeDescriptor::Short
                | TypeDescriptor::Int
                | TypeDescriptor::Long
                | TypeDescriptor::Float
                | TypeDescriptor::Double
        )
    }

    /// Whether a value of `other` can be used where `self` is expected
    /// without conversion.
    pub fn is_assignable_from(&self, other: &TypeDescriptor) -> bool {
        matches!(self, TypeDescriptor::Any) || self == other
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
