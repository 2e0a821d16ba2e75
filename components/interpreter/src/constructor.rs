//! Constructor resolution
//!
//! `new Name(args)` resolves an executor through the context's constructor
//! resolvers. [`RegisteredConstructorResolver`] holds factories registered
//! by the host.

use crate::context::EvaluationContext;
use core_types::{EvalResult, EvaluationError, MessageCode, TypeDescriptor, TypedValue, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Finds an executor for a constructor call
pub trait ConstructorResolver: Send + Sync + fmt::Debug {
    /// Resolve a constructor of `type_name` for the given argument types
    fn resolve(
        &self,
        context: &dyn EvaluationContext,
        type_name: &str,
        arg_types: &[Option<TypeDescriptor>],
    ) -> EvalResult<Option<Arc<dyn ConstructorExecutor>>>;
}

/// Invokes a resolved constructor
pub trait ConstructorExecutor: Send + Sync + fmt::Debug {
    /// Create the instance
    fn execute(&self, context: &dyn EvaluationContext, args: &[Value]) -> EvalResult<TypedValue>;
}

type Factory = dyn Fn(&[Value]) -> Result<Value, String> + Send + Sync;

/// A registered factory for one type and arity
#[derive(Clone)]
pub struct FactoryExecutor {
    type_name: String,
    factory: Arc<Factory>,
}

impl fmt::Debug for FactoryExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryExecutor")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

impl ConstructorExecutor for FactoryExecutor {
    fn execute(&self, _context: &dyn EvaluationContext, args: &[Value]) -> EvalResult<TypedValue> {
        (self.factory)(args).map(TypedValue::new).map_err(|reason| {
            EvaluationError::new(
                MessageCode::ConstructorInvocationProblem,
                [self.type_name.clone(), reason],
            )
        })
    }
}

/// Resolver over factories keyed by type name and arity.
///
/// `String` is registered for zero and one argument.
///
/// # Examples
///
/// ```
/// use core_types::{Record, Value};
/// use interpreter::RegisteredConstructorResolver;
///
/// let mut resolver = RegisteredConstructorResolver::new();
/// resolver.register("Person", 1, |args| {
///     Ok(Record::new("Person").with("name", args[0].clone()).into_value())
/// });
/// assert!(resolver.is_registered("Person", 1));
/// assert!(!resolver.is_registered("Person", 2));
/// ```
#[derive(Debug, Clone)]
pub struct RegisteredConstructorResolver {
    factories: HashMap<(String, usize), FactoryExecutor>,
}

impl RegisteredConstructorResolver {
    /// Resolver with the built-in factories
    pub fn new() -> Self {
        let mut resolver = Self {
            factories: HashMap::new(),
        };
        resolver.register("String", 0, |_| Ok(Value::from("")));
        resolver.register("String", 1, |args| {
            Ok(Value::from(args.first().map(Value::to_string).unwrap_or_default()))
        });
        resolver
    }

    /// Register a factory for a type and arity
    pub fn register<F>(&mut self, type_name: &str, arity: usize, factory: F)
    where
        F: Fn(&[Value]) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.factories.insert(
            (type_name.to_string(), arity),
            FactoryExecutor {
                type_name: type_name.to_string(),
                factory: Arc::new(factory),
            },
        );
    }

    /// Whether a factory exists
    pub fn is_registered(&self, type_name: &str, arity: usize) -> bool {
        self.factories
            .contains_key(&(type_name.to_string(), arity))
    }
}

impl Default for RegisteredConstructorResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstructorResolver for RegisteredConstructorResolver {
    fn resolve(
        &self,
        _context: &dyn EvaluationContext,
        type_name: &str,
        arg_types: &[Option<TypeDescriptor>],
    ) -> EvalResult<Option<Arc<dyn ConstructorExecutor>>> {
        Ok(self
            .factories
            .get(&(type_name.to_string(), arg_types.len()))
            .map(|executor| Arc::new(executor.clone()) as Arc<dyn ConstructorExecutor>))
    }
}
