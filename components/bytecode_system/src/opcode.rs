//! Opcodes of the compiled-expression stack machine
//!
//! Generated code runs with two fixed arguments: the target object and the
//! evaluation context. Booleans, chars, bytes and shorts occupy int slots.

use crate::descriptor::{Descriptor, PrimitiveKind};

/// Identifier of a synthetic field of a compiled unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(pub u32);

/// Scope-local variable slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalSlot(pub u16);

/// Binary arithmetic operation of the typed families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericOp {
    /// Addition
    Add,
    /// Subtraction
    Sub,
    /// Multiplication
    Mul,
    /// Division
    Div,
    /// Remainder
    Rem,
}

/// Comparison operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// ==
    Eq,
    /// !=
    Ne,
    /// <
    Lt,
    /// <=
    Le,
    /// >
    Gt,
    /// >=
    Ge,
}

impl CompareOp {
    /// Apply to an ordering
    pub fn test(self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            CompareOp::Eq => ordering == Equal,
            CompareOp::Ne => ordering != Equal,
            CompareOp::Lt => ordering == Less,
            CompareOp::Le => ordering != Greater,
            CompareOp::Gt => ordering == Greater,
            CompareOp::Ge => ordering != Less,
        }
    }

    /// Operator token
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

/// Stack machine opcodes
#[derive(Debug, Clone, PartialEq)]
pub enum Opcode {
    // Constants
    /// Push reference constant from the constant pool
    PushConst(usize),
    /// Push null
    PushNull,
    /// Push int
    IConst(i32),
    /// Push long
    LConst(i64),
    /// Push float
    FConst(f32),
    /// Push double
    DConst(f64),

    // Arguments and variables
    /// Push the target argument
    LoadTarget,
    /// Push a context variable (null if unbound)
    LoadVariable(String),
    /// Push a scope-local slot
    LoadLocal(LocalSlot),
    /// Pop into a scope-local slot
    StoreLocal(LocalSlot),
    /// Push the value of a synthetic field
    GetField(FieldId),

    // Stack manipulation
    /// Discard top
    Pop,
    /// Duplicate top
    Dup,
    /// Swap top two
    Swap,

    // Typed arithmetic
    /// Int arithmetic (wrapping)
    IArith(NumericOp),
    /// Long arithmetic (wrapping)
    LArith(NumericOp),
    /// Float arithmetic
    FArith(NumericOp),
    /// Double arithmetic
    DArith(NumericOp),
    /// Negate int
    INeg,
    /// Negate long
    LNeg,
    /// Negate float
    FNeg,
    /// Negate double
    DNeg,
    /// Logical not of a boolean int slot
    INot,

    // Typed comparisons, push boolean int slot
    /// Compare ints
    ICmp(CompareOp),
    /// Compare longs
    LCmp(CompareOp),
    /// Compare floats
    FCmp(CompareOp),
    /// Compare doubles
    DCmp(CompareOp),

    // Primitive conversions
    /// int to long
    I2L,
    /// int to float
    I2F,
    /// int to double
    I2D,
    /// long to int
    L2I,
    /// long to float
    L2F,
    /// long to double
    L2D,
    /// float to int
    F2I,
    /// float to long
    F2L,
    /// float to double
    F2D,
    /// double to int
    D2I,
    /// double to long
    D2L,
    /// double to float
    D2F,
    /// int to byte
    I2B,
    /// int to char
    I2C,
    /// int to short
    I2S,

    // Boxing
    /// Box a primitive slot
    Box(PrimitiveKind),
    /// Unbox a reference holding exactly this boxed kind
    Unbox(PrimitiveKind),
    /// Unbox any boxed number, converting to the kind
    UnboxNumber(PrimitiveKind),
    /// Check a reference against a descriptor
    CheckCast(Descriptor),

    // Dynamic helpers
    /// Equality of two references, push boolean
    RefEquals,
    /// Comparison of two references through the type comparator, push boolean
    RefCompare(CompareOp),
    /// Read a property of the reference on top
    GetProperty(String),
    /// Index a list with an int slot
    IndexList,
    /// Index a map with a reference key
    IndexMap,
    /// Index a string with an int slot, push one-character string
    IndexString,
    /// Invoke a method on receiver and `argc` reference arguments
    InvokeMethod {
        /// Method name
        name: String,
        /// Argument count
        argc: usize,
    },
    /// Match the string on top against the pattern in a field
    Matches(FieldId),
    /// Concatenate the string forms of `n` references
    Concat(usize),
    /// Concatenate `n` references, skipping nulls
    Interpolate(usize),

    // Control flow
    /// Unconditional jump
    Jump(usize),
    /// Pop boolean, jump if false
    JumpIfFalse(usize),
    /// Pop boolean, jump if true
    JumpIfTrue(usize),
    /// Pop reference, jump if it is neither null nor an empty string
    JumpIfPresent(usize),
    /// No operation
    Nop,
    /// Return top of stack
    Return,
}

impl Opcode {
    /// Check if this opcode is a terminator (ends basic block)
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Opcode::Return
                | Opcode::Jump(_)
                | Opcode::JumpIfTrue(_)
                | Opcode::JumpIfFalse(_)
                | Opcode::JumpIfPresent(_)
        )
    }

    /// Check if this opcode is an unconditional terminator
    pub fn is_unconditional_terminator(&self) -> bool {
        matches!(self, Opcode::Return | Opcode::Jump(_))
    }

    /// Jump target, if this is a jump
    pub fn jump_target(&self) -> Option<usize> {
        match self {
            Opcode::Jump(t)
            | Opcode::JumpIfFalse(t)
            | Opcode::JumpIfTrue(t)
            | Opcode::JumpIfPresent(t) => Some(*t),
            _ => None,
        }
    }

    /// Replace the jump target. Returns false for non-jumps.
    pub fn set_jump_target(&mut self, target: usize) -> bool {
        match self {
            Opcode::Jump(t)
            | Opcode::JumpIfFalse(t)
            | Opcode::JumpIfTrue(t)
            | Opcode::JumpIfPresent(t) => {
                *t = target;
                true
            }
            _ => false,
        }
    }

    /// Number of slots popped and pushed
    pub fn stack_effect(&self) -> (usize, usize) {
        match self {
            Opcode::PushConst(_)
            | Opcode::PushNull
            | Opcode::IConst(_)
            | Opcode::LConst(_)
            | Opcode::FConst(_)
            | Opcode::DConst(_)
            | Opcode::LoadTarget
            | Opcode::LoadVariable(_)
            | Opcode::LoadLocal(_)
            | Opcode::GetField(_) => (0, 1),
            Opcode::StoreLocal(_) | Opcode::Pop => (1, 0),
            Opcode::Dup => (1, 2),
            Opcode::Swap => (2, 2),
            Opcode::IArith(_)
            | Opcode::LArith(_)
            | Opcode::FArith(_)
            | Opcode::DArith(_)
            | Opcode::ICmp(_)
            | Opcode::LCmp(_)
            | Opcode::FCmp(_)
            | Opcode::DCmp(_)
            | Opcode::RefEquals
            | Opcode::RefCompare(_)
            | Opcode::IndexList
            | Opcode::IndexMap
            | Opcode::IndexString => (2, 1),
            Opcode::INeg
            | Opcode::LNeg
            | Opcode::FNeg
            | Opcode::DNeg
            | Opcode::INot
            | Opcode::I2L
            | Opcode::I2F
            | Opcode::I2D
            | Opcode::L2I
            | Opcode::L2F
            | Opcode::L2D
            | Opcode::F2I
            | Opcode::F2L
            | Opcode::F2D
            | Opcode::D2I
            | Opcode::D2L
            | Opcode::D2F
            | Opcode::I2B
            | Opcode::I2C
            | Opcode::I2S
            | Opcode::Box(_)
            | Opcode::Unbox(_)
            | Opcode::UnboxNumber(_)
            | Opcode::CheckCast(_)
            | Opcode::GetProperty(_)
            | Opcode::Matches(_) => (1, 1),
            Opcode::InvokeMethod { argc, .. } => (argc + 1, 1),
            Opcode::Concat(n) | Opcode::Interpolate(n) => (*n, 1),
            Opcode::Jump(_) | Opcode::Nop => (0, 0),
            Opcode::JumpIfFalse(_) | Opcode::JumpIfTrue(_) | Opcode::JumpIfPresent(_) => (1, 0),
            Opcode::Return => (1, 0),
        }
    }
}
