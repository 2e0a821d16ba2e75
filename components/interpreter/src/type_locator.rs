//! Type lookup for `T(Name)` references

use core_types::{EvalResult, EvaluationError, MessageCode, TypeDescriptor};
use std::collections::HashSet;
use std::fmt;

/// Maps type names to runtime types
pub trait TypeLocator: Send + Sync + fmt::Debug {
    /// Find the type called `name`
    fn find_type(&self, name: &str) -> EvalResult<TypeDescriptor>;
}

/// Locator for the built-in types and registered host type names
#[derive(Debug, Clone, Default)]
pub struct StandardTypeLocator {
    host_types: HashSet<String>,
}

impl StandardTypeLocator {
    /// Locator knowing only the built-in types
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a host type name resolvable
    pub fn register(&mut self, name: impl Into<String>) {
        self.host_types.insert(name.into());
    }
}

impl TypeLocator for StandardTypeLocator {
    fn find_type(&self, name: &str) -> EvalResult<TypeDescriptor> {
        if let Some(td) = TypeDescriptor::builtin(name) {
            return Ok(td);
        }
        if self.host_types.contains(name) {
            return Ok(TypeDescriptor::Named(name.to_string()));
        }
        Err(EvaluationError::new(MessageCode::TypeNotFound, [name]))
    }
}
