//! Bean resolution for `@name` references

use crate::context::EvaluationContext;
use core_types::{EvalResult, EvaluationError, MessageCode, Value};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;

/// Looks up named objects of the host
pub trait BeanResolver: Send + Sync + fmt::Debug {
    /// Resolve the bean called `name`
    fn resolve(&self, context: &dyn EvaluationContext, name: &str) -> EvalResult<Value>;
}

/// Bean resolver over an in-memory registry
#[derive(Debug, Default)]
pub struct MapBeanResolver {
    beans: RwLock<HashMap<String, Value>>,
}

impl MapBeanResolver {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a bean
    pub fn register(&self, name: impl Into<String>, bean: Value) {
        self.beans.write().insert(name.into(), bean);
    }
}

impl BeanResolver for MapBeanResolver {
    fn resolve(&self, _context: &dyn EvaluationContext, name: &str) -> EvalResult<Value> {
        self.beans.read().get(name).cloned().ok_or_else(|| {
            EvaluationError::new(
                MessageCode::ExceptionDuringBeanResolution,
                [name, "no such bean"],
            )
        })
    }
}
