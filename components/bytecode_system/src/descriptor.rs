//! Compile-time operand descriptors
//!
//! A [`Descriptor`] records what the generated code leaves on the operand
//! stack. Primitive descriptors describe unboxed slots; everything else is a
//! reference slot holding a [`Value`].

use core_types::{TypeDescriptor, Value};
use std::fmt;

/// Primitive kinds of the generated code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// Boolean, carried as an int slot
    Boolean,
    /// Character, carried as an int slot
    Char,
    /// 8-bit integer, carried as an int slot
    Byte,
    /// 16-bit integer, carried as an int slot
    Short,
    /// 32-bit integer
    Int,
    /// 64-bit integer
    Long,
    /// Single-precision float
    Float,
    /// Double-precision float
    Double,
}

impl PrimitiveKind {
    /// All primitive kinds
    pub const ALL: [PrimitiveKind; 8] = [
        PrimitiveKind::Boolean,
        PrimitiveKind::Char,
        PrimitiveKind::Byte,
        PrimitiveKind::Short,
        PrimitiveKind::Int,
        PrimitiveKind::Long,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
    ];

    /// Numeric kinds (everything except boolean and char)
    pub fn is_numeric(self) -> bool {
        !matches!(self, PrimitiveKind::Boolean | PrimitiveKind::Char)
    }

    /// Kinds carried in an int stack slot
    pub fn is_int_like(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Boolean
                | PrimitiveKind::Char
                | PrimitiveKind::Byte
                | PrimitiveKind::Short
                | PrimitiveKind::Int
        )
    }

    /// Kind of the stack slot carrying this primitive
    pub fn stack_kind(self) -> PrimitiveKind {
        if self.is_int_like() {
            PrimitiveKind::Int
        } else {
            self
        }
    }

    /// Runtime type of the boxed form
    pub fn boxed_type(self) -> TypeDescriptor {
        match self {
            PrimitiveKind::Boolean => TypeDescriptor::Boolean,
            PrimitiveKind::Char => TypeDescriptor::Char,
            PrimitiveKind::Byte => TypeDescriptor::Byte,
            PrimitiveKind::Short => TypeDescriptor::Short,
            PrimitiveKind::Int => TypeDescriptor::Int,
            PrimitiveKind::Long => TypeDescriptor::Long,
            PrimitiveKind::Float => TypeDescriptor::Float,
            PrimitiveKind::Double => TypeDescriptor::Double,
        }
    }

    /// Primitive kind whose boxed form is `td`
    pub fn for_boxed_type(td: &TypeDescriptor) -> Option<PrimitiveKind> {
        Some(match td {
            TypeDescriptor::Boolean => PrimitiveKind::Boolean,
            TypeDescriptor::Char => PrimitiveKind::Char,
            TypeDescriptor::Byte => PrimitiveKind::Byte,
            TypeDescriptor::Short => PrimitiveKind::Short,
            TypeDescriptor::Int => PrimitiveKind::Int,
            TypeDescriptor::Long => PrimitiveKind::Long,
            TypeDescriptor::Float => PrimitiveKind::Float,
            TypeDescriptor::Double => PrimitiveKind::Double,
            _ => return None,
        })
    }

    /// Single-letter mnemonic
    pub fn mnemonic(self) -> char {
        match self {
            PrimitiveKind::Boolean => 'Z',
            PrimitiveKind::Char => 'C',
            PrimitiveKind::Byte => 'B',
            PrimitiveKind::Short => 'S',
            PrimitiveKind::Int => 'I',
            PrimitiveKind::Long => 'J',
            PrimitiveKind::Float => 'F',
            PrimitiveKind::Double => 'D',
        }
    }
}

/// Type of the value the generated code leaves on the stack
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Descriptor {
    /// Unboxed primitive slot
    Primitive(PrimitiveKind),
    /// Reference slot holding the boxed form of a primitive
    Boxed(PrimitiveKind),
    /// Reference slot holding a string
    String,
    /// Reference slot holding a list
    List,
    /// Reference slot holding a map
    Map,
    /// Reference slot holding a host object of the named type
    Named(std::string::String),
    /// Reference slot of unknown type
    Object,
}

impl Descriptor {
    /// Descriptor of a runtime value as a reference slot.
    ///
    /// Null maps to [`Descriptor::Object`].
    pub fn of_value(value: &Value) -> Descriptor {
        match TypeDescriptor::of(value) {
            Some(td) => Descriptor::of_type(&td),
            None => Descriptor::Object,
        }
    }

    /// Reference descriptor for a runtime type
    pub fn of_type(td: &TypeDescriptor) -> Descriptor {
        if let Some(kind) = PrimitiveKind::for_boxed_type(td) {
            return Descriptor::Boxed(kind);
        }
        match td {
            TypeDescriptor::String => Descriptor::String,
            TypeDescriptor::List => Descriptor::List,
            TypeDescriptor::Map => Descriptor::Map,
            TypeDescriptor::Named(name) => Descriptor::Named(name.clone()),
            _ => Descriptor::Object,
        }
    }

    /// Unboxed primitive descriptor
    pub fn is_primitive(&self) -> bool {
        matches!(self, Descriptor::Primitive(_))
    }

    /// Boxed primitive descriptor
    pub fn is_boxed(&self) -> bool {
        matches!(self, Descriptor::Boxed(_))
    }

    /// Primitive kind, boxed or not
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self {
            Descriptor::Primitive(k) | Descriptor::Boxed(k) => Some(*k),
            _ => None,
        }
    }

    /// Boolean, boxed or not
    pub fn is_boolean(&self) -> bool {
        self.primitive_kind() == Some(PrimitiveKind::Boolean)
    }

    /// Numeric, boxed or not
    pub fn is_numeric(&self) -> bool {
        self.primitive_kind().is_some_and(PrimitiveKind::is_numeric)
    }

    /// Reference form of this descriptor
    pub fn boxed(&self) -> Descriptor {
        match self {
            Descriptor::Primitive(k) => Descriptor::Boxed(*k),
            other => other.clone(),
        }
    }

    /// Runtime type a reference slot with this descriptor is guaranteed to hold
    pub fn type_descriptor(&self) -> Option<TypeDescriptor> {
        match self {
            Descriptor::Primitive(k) | Descriptor::Boxed(k) => Some(k.boxed_type()),
            Descriptor::String => Some(TypeDescriptor::String),
            Descriptor::List => Some(TypeDescriptor::List),
            Descriptor::Map => Some(TypeDescriptor::Map),
            Descriptor::Named(name) => Some(TypeDescriptor::Named(name.clone())),
            Descriptor::Object => None,
        }
    }

    /// Whether a runtime value satisfies a cast to this descriptor.
    ///
    /// Null satisfies every reference cast.
    pub fn admits(&self, value: &Value) -> bool {
        if value.is_null() {
            return !self.is_primitive();
        }
        match self {
            Descriptor::Object => true,
            Descriptor::Primitive(_) => false,
            other => other.type_descriptor() == TypeDescriptor::of(value),
        }
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Descriptor::Primitive(k) => write!(f, "{}", k.mnemonic()),
            Descriptor::Boxed(k) => write!(f, "L{}", k.boxed_type()),
            Descriptor::String => write!(f, "LString"),
            Descriptor::List => write!(f, "LList"),
            Descriptor::Map => write!(f, "LMap"),
            Descriptor::Named(name) => write!(f, "L{}", name),
            Descriptor::Object => write!(f, "LObject"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_of_value_is_reference_form() {
        assert_eq!(
            Descriptor::of_value(&Value::Int(1)),
            Descriptor::Boxed(PrimitiveKind::Int)
        );
        assert_eq!(Descriptor::of_value(&Value::Null), Descriptor::Object);
        assert_eq!(Descriptor::of_value(&Value::from("a")), Descriptor::String);
    }

    #[test]
    fn test_stack_kinds() {
        assert_eq!(PrimitiveKind::Short.stack_kind(), PrimitiveKind::Int);
        assert_eq!(PrimitiveKind::Boolean.stack_kind(), PrimitiveKind::Int);
        assert_eq!(PrimitiveKind::Long.stack_kind(), PrimitiveKind::Long);
    }

    #[test]
    fn test_admits() {
        let int = Descriptor::Boxed(PrimitiveKind::Int);
        assert!(int.admits(&Value::Int(3)));
        assert!(!int.admits(&Value::from("3")));
        assert!(int.admits(&Value::Null));
        assert!(Descriptor::Object.admits(&Value::Long(1)));
    }

    #[test]
    fn test_display() {
        assert_eq!(Descriptor::Primitive(PrimitiveKind::Long).to_string(), "J");
        assert_eq!(Descriptor::Boxed(PrimitiveKind::Int).to_string(), "LInt");
    }
}
