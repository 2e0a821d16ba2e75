//! Evaluation context
//!
//! The capability bag an expression is evaluated against: the root object,
//! ordered accessor and resolver lists, the conversion, comparison and
//! operator strategies, and named variables.

use crate::accessor::{MapAccessor, PropertyAccessor, ReflectivePropertyAccessor};
use crate::bean::BeanResolver;
use crate::comparator::{StandardTypeComparator, TypeComparator};
use crate::constructor::{ConstructorResolver, RegisteredConstructorResolver};
use crate::conversion::{StandardTypeConverter, TypeConverter};
use crate::method::{MethodResolver, ReflectiveMethodResolver};
use crate::overloader::{OperatorOverloader, StandardOperatorOverloader};
use crate::type_locator::{StandardTypeLocator, TypeLocator};
use core_types::{TypedValue, Value};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Strategies and state consulted during evaluation.
///
/// Resolution walks each ordered list and the first strategy that claims a
/// request handles it. Variable mutation is visible to every later lookup
/// through the same context; concurrent evaluations sharing a context are not
/// isolated from each other.
pub trait EvaluationContext: Send + Sync {
    /// Default root object
    fn root_object(&self) -> TypedValue;

    /// Property accessors, in resolution order
    fn property_accessors(&self) -> &[Arc<dyn PropertyAccessor>];

    /// Method resolvers, in resolution order
    fn method_resolvers(&self) -> &[Arc<dyn MethodResolver>];

    /// Constructor resolvers, in resolution order
    fn constructor_resolvers(&self) -> &[Arc<dyn ConstructorResolver>];

    /// Type converter
    fn type_converter(&self) -> &dyn TypeConverter;

    /// Type comparator
    fn type_comparator(&self) -> &dyn TypeComparator;

    /// Operator overloader
    fn operator_overloader(&self) -> &dyn OperatorOverloader;

    /// Bean resolver, if one is registered
    fn bean_resolver(&self) -> Option<&dyn BeanResolver>;

    /// Type locator
    fn type_locator(&self) -> &dyn TypeLocator;

    /// Bind a variable
    fn set_variable(&self, name: &str, value: Value);

    /// Look up a variable
    fn lookup_variable(&self, name: &str) -> Option<Value>;
}

/// Context with the standard strategies registered.
///
/// # Examples
///
/// ```
/// use core_types::Value;
/// use interpreter::{EvaluationContext, StandardEvaluationContext};
///
/// let context = StandardEvaluationContext::with_root(Value::from("root"));
/// context.set_variable("x", Value::Int(5));
/// assert_eq!(context.lookup_variable("x"), Some(Value::Int(5)));
/// assert_eq!(context.root_object().value(), &Value::from("root"));
/// ```
pub struct StandardEvaluationContext {
    root_object: TypedValue,
    property_accessors: Vec<Arc<dyn PropertyAccessor>>,
    method_resolvers: Vec<Arc<dyn MethodResolver>>,
    constructor_resolvers: Vec<Arc<dyn ConstructorResolver>>,
    type_converter: Arc<dyn TypeConverter>,
    type_comparator: Arc<dyn TypeComparator>,
    operator_overloader: Arc<dyn OperatorOverloader>,
    bean_resolver: Option<Arc<dyn BeanResolver>>,
    type_locator: Arc<dyn TypeLocator>,
    variables: RwLock<HashMap<String, Value>>,
}

impl StandardEvaluationContext {
    /// Context with a null root
    pub fn new() -> Self {
        Self::with_root(Value::Null)
    }

    /// Context with the given root
    pub fn with_root(root: Value) -> Self {
        Self {
            root_object: TypedValue::new(root),
            property_accessors: vec![
                Arc::new(ReflectivePropertyAccessor),
                Arc::new(MapAccessor),
            ],
            method_resolvers: vec![Arc::new(ReflectiveMethodResolver)],
            constructor_resolvers: vec![Arc::new(RegisteredConstructorResolver::new())],
            type_converter: Arc::new(StandardTypeConverter),
            type_comparator: Arc::new(StandardTypeComparator),
            operator_overloader: Arc::new(StandardOperatorOverloader),
            bean_resolver: None,
            type_locator: Arc::new(StandardTypeLocator::new()),
            variables: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the root object
    pub fn set_root_object(&mut self, root: Value) {
        self.root_object = TypedValue::new(root);
    }

    /// Append a property accessor
    pub fn add_property_accessor(&mut self, accessor: Arc<dyn PropertyAccessor>) {
        self.property_accessors.push(accessor);
    }

    /// Replace the property accessor list
    pub fn set_property_accessors(&mut self, accessors: Vec<Arc<dyn PropertyAccessor>>) {
        self.property_accessors = accessors;
    }

    /// Append a method resolver
    pub fn add_method_resolver(&mut self, resolver: Arc<dyn MethodResolver>) {
        self.method_resolvers.push(resolver);
    }

    /// Append a constructor resolver
    pub fn add_constructor_resolver(&mut self, resolver: Arc<dyn ConstructorResolver>) {
        self.constructor_resolvers.push(resolver);
    }

    /// Replace the type converter
    pub fn set_type_converter(&mut self, converter: Arc<dyn TypeConverter>) {
        self.type_converter = converter;
    }

    /// Replace the type comparator
    pub fn set_type_comparator(&mut self, comparator: Arc<dyn TypeComparator>) {
        self.type_comparator = comparator;
    }

    /// Replace the operator overloader
    pub fn set_operator_overloader(&mut self, overloader: Arc<dyn OperatorOverloader>) {
        self.operator_overloader = overloader;
    }

    /// Register a bean resolver
    pub fn set_bean_resolver(&mut self, resolver: Arc<dyn BeanResolver>) {
        self.bean_resolver = Some(resolver);
    }

    /// Replace the type locator
    pub fn set_type_locator(&mut self, locator: Arc<dyn TypeLocator>) {
        self.type_locator = locator;
    }

    /// Bind several variables at once
    pub fn set_variables<I, K>(&self, variables: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut vars = self.variables.write();
        for (name, value) in variables {
            vars.insert(name.into(), value);
        }
    }

    /// Names of the bound variables, sorted
    pub fn variable_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.variables.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for StandardEvaluationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StandardEvaluationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StandardEvaluationContext")
            .field("root_object", &self.root_object)
            .field("property_accessors", &self.property_accessors.len())
            .field("method_resolvers", &self.method_resolvers.len())
            .field("constructor_resolvers", &self.constructor_resolvers.len())
            .field("variables", &self.variable_names())
            .finish()
    }
}

impl EvaluationContext for StandardEvaluationContext {
    fn root_object(&self) -> TypedValue {
        self.root_object.clone()
    }

    fn property_accessors(&self) -> &[Arc<dyn PropertyAccessor>] {
        &self.property_accessors
    }

    fn method_resolvers(&self) -> &[Arc<dyn MethodResolver>] {
        &self.method_resolvers
    }

    fn constructor_resolvers(&self) -> &[Arc<dyn ConstructorResolver>] {
        &self.constructor_resolvers
    }

    fn type_converter(&self) -> &dyn TypeConverter {
        self.type_converter.as_ref()
    }

    fn type_comparator(&self) -> &dyn TypeComparator {
        self.type_comparator.as_ref()
    }

    fn operator_overloader(&self) -> &dyn OperatorOverloader {
        self.operator_overloader.as_ref()
    }

    fn bean_resolver(&self) -> Option<&dyn BeanResolver> {
        self.bean_resolver.as_deref()
    }

    fn type_locator(&self) -> &dyn TypeLocator {
        self.type_locator.as_ref()
    }

    fn set_variable(&self, name: &str, value: Value) {
        self.variables.write().insert(name.to_string(), value);
    }

    fn lookup_variable(&self, name: &str) -> Option<Value> {
        self.variables.read().get(name).cloned()
    }
}
