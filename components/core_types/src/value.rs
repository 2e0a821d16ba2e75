//! Dynamic value representation.
//!
//! This module provides the [`Value`] enum evaluated by expressions and the
//! [`HostObject`] contract through which expressions navigate the host's
//! object graph.

use crate::TypeDescriptor;
use parking_lot::RwLock;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Shared, mutable list storage.
pub type ListRef = Arc<RwLock<Vec<Value>>>;

/// Shared, mutable string-keyed map storage.
pub type MapRef = Arc<RwLock<BTreeMap<String, Value>>>;

/// An object of the host object graph.
///
/// Host objects are the targets of property and method references. The
/// default reflective accessors and resolvers only see what a host object
/// chooses to expose through this trait.
pub trait HostObject: Send + Sync + fmt::Debug {
    /// Name of the host type, used in diagnostics and type checks.
    fn type_name(&self) -> &str;

    /// Reads a property, or `None` if the object has no such property.
    fn read_property(&self, name: &str) -> Option<Value>;

    /// Whether [`HostObject::write_property`] would accept this property.
    fn can_write_property(&self, name: &str) -> bool {
        self.read_property(name).is_some()
    }

    /// Writes a property. Returns `false` if the property cannot be written.
    fn write_property(&self, _name: &str, _value: Value) -> bool {
        false
    }

    /// Names of the readable properties.
    fn property_names(&self) -> Vec<String> {
        Vec::new()
    }

    /// Whether a method with this name and arity can be invoked.
    fn responds_to(&self, _method: &str, _arity: usize) -> bool {
        false
    }

    /// Invokes a method. The error string describes the host failure.
    fn invoke(&self, method: &str, _args: &[Value]) -> Result<Value, String> {
        Err(format!("no method '{}' on {}", method, self.type_name()))
    }

    /// Creates and stores a default value for a null property.
    ///
    /// Called when null references are auto-grown during navigation.
    fn grow_property(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Downcasting support.
    fn as_any(&self) -> &dyn Any;
}

/// An open field bag usable as a host object.
///
/// # Examples
///
/// ```
/// use core_types::{HostObject, Record, Value};
///
/// let person = Record::new("Person").with("name", "a");
/// assert_eq!(person.read_property("name"), Some(Value::from("a")));
/// assert_eq!(person.read_property("age"), None);
/// ```
#[derive(Debug)]
pub struct Record {
    type_name: String,
    fields: RwLock<BTreeMap<String, Value>>,
}

impl Record {
    /// Create an empty record of the given type
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: RwLock::new(BTreeMap::new()),
        }
    }

    /// Builder-style field initialization
    pub fn with(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.write().insert(name.into(), value.into());
        self
    }

    /// Wrap the record as a value
    pub fn into_value(self) -> Value {
        Value::Object(Arc::new(self))
    }
}

impl HostObject for Record {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn read_property(&self, name: &str) -> Option<Value> {
        self.fields.read().get(name).cloned()
    }

    fn can_write_property(&self, _name: &str) -> bool {
        true
    }

    fn write_property(&self, name: &str, value: Value) -> bool {
        self.fields.write().insert(name.to_string(), value);
        true
    }

    fn property_names(&self) -> Vec<String> {
        self.fields.read().keys().cloned().collect()
    }

    fn grow_property(&self, name: &str) -> Option<Value> {
        let mut fields = self.fields.write();
        match fields.get(name) {
            Some(Value::Null) | None => {
                let grown = Record::new("Record").into_value();
                fields.insert(name.to_string(), grown.clone());
                Some(grown)
            }
            Some(_) => None,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Represents any value an expression can produce.
///
/// Primitive values are stored inline. Lists and maps are shared and
/// lockable so that assignments through an expression are visible to the
/// host. Host objects are reference-counted trait objects.
///
/// # Examples
///
/// ```
/// use core_types::Value;
///
/// let list = Value::list(vec![Value::Int(1), Value::Int(2)]);
/// assert_eq!(list.to_string(), "[1, 2]");
/// assert_eq!(Value::Double(3.0).to_string(), "3.0");
/// assert!(Value::Null.is_null());
/// ```
#[derive(Clone)]
pub enum Value {
    /// Absence of a value
    Null,
    /// Boolean value
    Boolean(bool),
    /// Single character
    Char(char),
    /// 8-bit signed integer
    Byte(i8),
    /// 16-bit signed integer
    Short(i16),
    /// 32-bit signed integer
    Int(i32),
    /// 64-bit signed integer
    Long(i64),
    /// Single-precision float
    Float(f32),
    /// Double-precision float
    Double(f64),
    /// String value
    String(std::string::String),
    /// Shared list
    List(ListRef),
    /// Shared string-keyed map
    Map(MapRef),
    /// Host object
    Object(Arc<dyn HostObject>),
    /// A type, as produced by a type reference
    Type(TypeDescriptor),
}

impl Value {
    /// Build a list value
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Arc::new(RwLock::new(items)))
    }

    /// Build a map value
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        let map = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Value::Map(Arc::new(RwLock::new(map)))
    }

    /// Wrap a host object
    pub fn object(object: impl HostObject + 'static) -> Self {
        Value::Object(Arc::new(object))
    }

    /// Returns true for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true for the numeric variants.
    pub fn is_number(&self) -> bool {
        matches!(
            self,
            Value::Byte(_)
                | Value::Short(_)
                | Value::Int(_)
                | Value::Long(_)
                | Value::Float(_)
                | Value::Double(_)
        )
    }

    /// Runtime type tag, `None` for null.
    pub fn type_descriptor(&self) -> Option<TypeDescriptor> {
        TypeDescriptor::of(self)
    }

    /// Type name used in diagnostics.
    pub fn type_name(&self) -> String {
        match self.type_descriptor() {
            Some(td) => td.name().to_string(),
            None => "null".to_string(),
        }
    }

    /// Numeric value widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Byte(n) => Some(f64::from(*n)),
            Value::Short(n) => Some(f64::from(*n)),
            Value::Int(n) => Some(f64::from(*n)),
            Value::Long(n) => Some(*n as f64),
            Value::Float(n) => Some(f64::from(*n)),
            Value::Double(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric value converted to `i64`, truncating fractions.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Byte(n) => Some(i64::from(*n)),
            Value::Short(n) => Some(i64::from(*n)),
            Value::Int(n) => Some(i64::from(*n)),
            Value::Long(n) => Some(*n),
            Value::Float(n) => Some(*n as i64),
            Value::Double(n) => Some(*n as i64),
            _ => None,
        }
    }

    /// Boolean payload.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// String payload.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Host object payload.
    pub fn as_object(&self) -> Option<&Arc<dyn HostObject>> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }
}

fn write_floating(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e16 {
        write!(f, "{:.1}", n)
    } else {
        write!(f, "{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Char(c) => write!(f, "{}", c),
            Value::Byte(n) => write!(f, "{}", n),
            Value::Short(n) => write!(f, "{}", n),
            Value::Int(n) => write!(f, "{}", n),
            Value::Long(n) => write!(f, "{}", n),
            Value::Float(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e7 {
                    write!(f, "{:.1}", n)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Double(n) => write_floating(f, *n),
            Value::String(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.read().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.read().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Object(o) => write!(f, "{:?}", o),
            Value::Type(td) => write!(f, "{}", td),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Boolean(b) => f.debug_tuple("Boolean").field(b).finish(),
            Value::Char(c) => f.debug_tuple("Char").field(c).finish(),
            Value::Byte(n) => f.debug_tuple("Byte").field(n).finish(),
            Value::Short(n) => f.debug_tuple("Short").field(n).finish(),
            Value::Int(n) => f.debug_tuple("Int").field(n).finish(),
            Value::Long(n) => f.debug_tuple("Long").field(n).finish(),
            Value::Float(n) => f.debug_tuple("Float").field(n).finish(),
            Value::Double(n) => f.debug_tuple("Double").field(n).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::List(items) => f.debug_tuple("List").field(&*items.read()).finish(),
            Value::Map(entries) => f.debug_tuple("Map").field(&*entries.read()).finish(),
            Value::Object(o) => f.debug_tuple("Object").field(o).finish(),
            Value::Type(td) => f.debug_tuple("Type").field(td).finish(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Short(a), Value::Short(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => Arc::ptr_eq(a, b) || *a.read() == *b.read(),
            (Value::Map(a), Value::Map(b)) => Arc::ptr_eq(a, b) || *a.read() == *b.read(),
            (Value::Object(a), Value::Object(b)) => {
                std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
            }
            (Value::Type(a), Value::Type(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Char(c)
    }
}

impl From<i8> for Value {
    fn from(n: i8) -> Self {
        Value::Byte(n)
    }
}

impl From<i16> for Value {
    fn from(n: i16) -> Self {
        Value::Short(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Long(n)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Float(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<std::string::String> for Value {
    fn from(s: std::string::String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}
