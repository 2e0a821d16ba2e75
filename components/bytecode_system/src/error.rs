//! Compilation errors
//!
//! These never reach callers of an expression; a failed compilation means
//! the expression keeps being interpreted.

use thiserror::Error;

/// Why an expression tree could not be compiled
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// A node reported itself as not compilable
    #[error("node '{0}' is not compilable")]
    NotCompilable(String),

    /// No conversion exists between two descriptors
    #[error("cannot convert {from} to {to}")]
    InvalidConversion {
        /// Source descriptor
        from: String,
        /// Target descriptor
        to: String,
    },

    /// Cast to a descriptor that cannot be checked on a reference
    #[error("illegal cast to {0}")]
    IllegalCast(String),

    /// A jump placeholder that cannot be patched
    #[error("instruction {0} is not a jump")]
    InvalidJump(usize),

    /// Generated code fails verification
    #[error("invalid code: {0}")]
    InvalidCode(String),

    /// A static initializer failed when the unit was loaded
    #[error("initializer of field {field} failed: {reason}")]
    FieldInitialization {
        /// Field id
        field: u32,
        /// Failure description
        reason: String,
    },

    /// Native code generation failed
    #[error("native backend: {0}")]
    Backend(String),
}
