//! Values paired with a type tag.

use crate::{TypeDescriptor, Value};
use std::fmt;
use std::sync::OnceLock;

/// A value and its type, threaded through evaluation.
///
/// When no type is supplied it is computed from the runtime value on first
/// request and then fixed. A `TypedValue` is never mutated after
/// construction.
///
/// # Examples
///
/// ```
/// use core_types::{TypeDescriptor, TypedValue, Value};
///
/// let declared = TypedValue::with_type(Value::Int(1), TypeDescriptor::Any);
/// assert_eq!(declared.type_descriptor(), Some(&TypeDescriptor::Any));
///
/// let inferred = TypedValue::new(Value::from("a"));
/// assert_eq!(inferred.type_descriptor(), Some(&TypeDescriptor::String));
/// assert_eq!(TypedValue::null().type_descriptor(), None);
/// ```
#[derive(Clone)]
pub struct TypedValue {
    value: Value,
    type_descriptor: OnceLock<Option<TypeDescriptor>>,
}

impl TypedValue {
    /// Wrap a value whose type is inferred lazily
    pub fn new(value: Value) -> Self {
        Self {
            value,
            type_descriptor: OnceLock::new(),
        }
    }

    /// Wrap a value with a declared type
    pub fn with_type(value: Value, type_descriptor: TypeDescriptor) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(Some(type_descriptor));
        Self {
            value,
            type_descriptor: cell,
        }
    }

    /// The null value
    pub fn null() -> Self {
        Self::new(Value::Null)
    }

    /// Borrow the value
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Take the value
    pub fn into_value(self) -> Value {
        self.value
    }

    /// The declared type, or the runtime type of the value
    pub fn type_descriptor(&self) -> Option<&TypeDescriptor> {
        self.type_descriptor
            .get_or_init(|| TypeDescriptor::of(&self.value))
            .as_ref()
    }

    /// Returns true if the value is null
    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }
}

impl PartialEq for TypedValue {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.type_descriptor() == other.type_descriptor()
    }
}

impl fmt::Debug for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypedValue({:?}", self.value)?;
        match self.type_descriptor() {
            Some(td) => write!(f, ": {})", td),
            None => write!(f, ")"),
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

impl From<Value> for TypedValue {
    fn from(value: Value) -> Self {
        TypedValue::new(value)
    }
}
