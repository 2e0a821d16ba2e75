//! Property or field reference such as `name` or `address?.city`

use crate::accessor::{accessor_applies, PropertyAccessor};
use crate::context::EvaluationContext;
use crate::inline_cache::{InlineCache, ReceiverKey};
use crate::node::{load_receiver, ExitDescriptor, Node, NodeBase};
use crate::state::ExpressionState;
use bytecode_system::{CodeFlow, CompileError, Descriptor};
use core_types::{EvalResult, MessageCode, SourceSpan, TypedValue, Value};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type AccessorCache = RwLock<InlineCache<Arc<dyn PropertyAccessor>>>;

/// Reads or writes a named property of the active context object.
///
/// The accessor that handled each receiver type is cached. Reads compile
/// only while the cache is monomorphic and the accessor supports it.
#[derive(Debug)]
pub struct PropertyOrFieldReference {
    base: NodeBase,
    name: String,
    null_safe: bool,
    read_cache: AccessorCache,
    write_cache: AccessorCache,
    grows: AtomicBool,
    target_exit: ExitDescriptor,
}

impl PropertyOrFieldReference {
    /// Reference to `name`; a null-safe reference yields null on a null target
    pub fn new(name: impl Into<String>, null_safe: bool, span: SourceSpan) -> Self {
        Self {
            base: NodeBase::new(span, Vec::new()),
            name: name.into(),
            null_safe,
            read_cache: RwLock::new(InlineCache::new()),
            write_cache: RwLock::new(InlineCache::new()),
            grows: AtomicBool::new(false),
            target_exit: ExitDescriptor::new(),
        }
    }

    /// Property name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this is a `?.` reference
    pub fn is_null_safe(&self) -> bool {
        self.null_safe
    }

    fn not_readable(&self, target: &Value) -> core_types::EvaluationError {
        if target.is_null() {
            self.base
                .error(MessageCode::PropertyOrFieldNotReadableOnNull, [&self.name])
        } else {
            self.base.error(
                MessageCode::PropertyOrFieldNotReadable,
                [self.name.clone(), target.type_name()],
            )
        }
    }

    fn read_through(
        &self,
        context: &dyn EvaluationContext,
        target: &Value,
        key: &ReceiverKey,
    ) -> EvalResult<TypedValue> {
        let cached = self.read_cache.read().lookup(key);
        if let Some(accessor) = cached {
            if accessor.can_read(context, target, &self.name)? {
                return accessor.read(context, target, &self.name);
            }
        }
        for accessor in context.property_accessors() {
            if accessor_applies(accessor.as_ref(), target)
                && accessor.can_read(context, target, &self.name)?
            {
                let value = accessor.read(context, target, &self.name)?;
                self.read_cache.write().update(key.clone(), Arc::clone(accessor));
                return Ok(value);
            }
        }
        Err(self.not_readable(target))
    }

    fn find_writer(
        &self,
        context: &dyn EvaluationContext,
        target: &Value,
    ) -> EvalResult<Option<Arc<dyn PropertyAccessor>>> {
        let key = target.type_descriptor();
        let cached = self.write_cache.read().lookup(&key);
        if let Some(accessor) = cached {
            if accessor.can_write(context, target, &self.name)? {
                return Ok(Some(accessor));
            }
        }
        for accessor in context.property_accessors() {
            if accessor_applies(accessor.as_ref(), target)
                && accessor.can_write(context, target, &self.name)?
            {
                self.write_cache.write().update(key, Arc::clone(accessor));
                return Ok(Some(Arc::clone(accessor)));
            }
        }
        Ok(None)
    }

    /// Create a default value in place of a null property
    fn grow(&self, target: &Value) -> Option<Value> {
        let grown = match target {
            Value::Object(object) => object.grow_property(&self.name),
            Value::Map(map) => {
                let empty = Value::map(Vec::<(String, Value)>::new());
                map.write().insert(self.name.clone(), empty.clone());
                Some(empty)
            }
            _ => None,
        }?;
        tracing::trace!(property = %self.name, "auto-grew null reference");
        Some(grown)
    }
}

impl Node for PropertyOrFieldReference {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn get_value_internal(&self, state: &mut ExpressionState<'_>) -> EvalResult<TypedValue> {
        let target = state.active_context_object();
        if target.is_null() && self.null_safe {
            return Ok(TypedValue::null());
        }
        let may_grow =
            state.configuration().auto_grow_null_references && self.base.is_navigation_step();
        if may_grow {
            self.grows.store(true, Ordering::Relaxed);
        }
        let context = state.evaluation_context();
        let key = target.type_descriptor().cloned();
        let mut result = self.base.locate(self.read_through(context, target.value(), &key))?;
        if result.is_null() && may_grow {
            if let Some(grown) = self.grow(target.value()) {
                result = TypedValue::new(grown);
            }
        }
        self.target_exit.observe_value(target.value());
        self.base.exit.observe_value(result.value());
        Ok(result)
    }

    fn to_expression_string(&self) -> String {
        if self.null_safe {
            format!("?.{}", self.name)
        } else {
            self.name.clone()
        }
    }

    fn is_writable(&self, state: &mut ExpressionState<'_>) -> EvalResult<bool> {
        let target = state.active_context_object();
        if target.is_null() {
            return Ok(false);
        }
        let context = state.evaluation_context();
        Ok(self.find_writer(context, target.value())?.is_some())
    }

    fn set_value(&self, state: &mut ExpressionState<'_>, value: TypedValue) -> EvalResult<()> {
        let target = state.active_context_object();
        if target.is_null() {
            return Err(self
                .base
                .error(MessageCode::PropertyOrFieldNotWritableOnNull, [&self.name]));
        }
        let context = state.evaluation_context();
        match self.find_writer(context, target.value())? {
            Some(accessor) => self.base.locate(accessor.write(
                context,
                target.value(),
                &self.name,
                value.into_value(),
            )),
            None => Err(self.base.error(
                MessageCode::PropertyOrFieldNotWritable,
                [self.name.clone(), target.value().type_name()],
            )),
        }
    }

    fn is_compilable(&self) -> bool {
        if self.null_safe || self.grows.load(Ordering::Relaxed) {
            return false;
        }
        if self.exit_descriptor().is_none() || self.target_exit.get().is_none() {
            return false;
        }
        self.read_cache
            .read()
            .monomorphic_entry()
            .is_some_and(|(_, accessor)| accessor.is_compilable())
    }

    fn generate_code(&self, cf: &mut CodeFlow) -> Result<(), CompileError> {
        let not_compilable = || CompileError::NotCompilable(self.to_expression_string());
        let accessor = self
            .read_cache
            .read()
            .monomorphic_entry()
            .map(|(_, accessor)| Arc::clone(accessor))
            .ok_or_else(not_compilable)?;
        let target = self.target_exit.get().ok_or_else(not_compilable)?;
        let exit = self.exit_descriptor().ok_or_else(not_compilable)?;
        load_receiver(cf, &target)?;
        accessor.generate_code(&self.name, self.span(), cf)?;
        cf.insert_check_cast(&exit, Some(&Descriptor::Object))?;
        cf.push_descriptor(exit);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompilerConfiguration;
    use crate::context::StandardEvaluationContext;
    use crate::nodes::CompoundExpression;
    use core_types::{EvaluationError, Record};

    fn span() -> SourceSpan {
        SourceSpan::new(0, 4)
    }

    fn person() -> Value {
        Record::new("Person")
            .with("name", "Ada")
            .with("address", Value::Null)
            .into_value()
    }

    #[test]
    fn test_reads_host_property_and_caches_accessor() {
        let ctx = StandardEvaluationContext::with_root(person());
        let config = CompilerConfiguration::default();
        let mut state = ExpressionState::new(&ctx, &config);
        let node = PropertyOrFieldReference::new("name", false, span());
        assert_eq!(node.get_value(&mut state).unwrap(), Value::from("Ada"));
        assert_eq!(node.exit_descriptor(), Some(Descriptor::String));
        assert!(node.is_compilable());
    }

    #[test]
    fn test_missing_property_names_type() {
        let ctx = StandardEvaluationContext::with_root(person());
        let config = CompilerConfiguration::default();
        let mut state = ExpressionState::new(&ctx, &config);
        let node = PropertyOrFieldReference::new("age", false, span());
        let err: EvaluationError = node.get_value(&mut state).unwrap_err();
        assert_eq!(err.code, MessageCode::PropertyOrFieldNotReadable);
        assert_eq!(err.inserts, vec!["age", "Person"]);
        assert_eq!(err.span, Some(span()));
    }

    #[test]
    fn test_null_safe_on_null_target() {
        let ctx = StandardEvaluationContext::new();
        let config = CompilerConfiguration::default();
        let mut state = ExpressionState::new(&ctx, &config);
        let safe = PropertyOrFieldReference::new("name", true, span());
        assert_eq!(safe.get_value(&mut state).unwrap(), Value::Null);
        assert!(!safe.is_compilable());
        let unsafe_ref = PropertyOrFieldReference::new("name", false, span());
        let err = unsafe_ref.get_value(&mut state).unwrap_err();
        assert_eq!(err.code, MessageCode::PropertyOrFieldNotReadableOnNull);
    }

    #[test]
    fn test_auto_grow_null_reference_during_navigation() {
        let root = person();
        let ctx = StandardEvaluationContext::with_root(root.clone());
        let config = CompilerConfiguration::default().with_auto_grow(true, false);
        let mut state = ExpressionState::new(&ctx, &config);
        let node = CompoundExpression::new(
            vec![
                Box::new(PropertyOrFieldReference::new("address", false, span())),
                Box::new(PropertyOrFieldReference::new("city", false, span())),
            ],
            span(),
        );
        node.set_value(&mut state, TypedValue::new(Value::from("Oslo")))
            .unwrap();
        assert_eq!(node.get_value(&mut state).unwrap(), Value::from("Oslo"));
        let grown = root.as_object().and_then(|o| o.read_property("address"));
        assert!(grown.is_some_and(|v| !v.is_null()));
        assert!(!node.is_compilable());
    }

    #[test]
    fn test_navigation_under_auto_grow_stays_interpreted() {
        let address = Record::new("Address").with("city", "Oslo").into_value();
        let root = Record::new("Person").with("address", address).into_value();
        let ctx = StandardEvaluationContext::with_root(root);
        let config = CompilerConfiguration::default().with_auto_grow(true, false);
        let mut state = ExpressionState::new(&ctx, &config);
        let node = CompoundExpression::new(
            vec![
                Box::new(PropertyOrFieldReference::new("address", false, span())),
                Box::new(PropertyOrFieldReference::new("city", false, span())),
            ],
            span(),
        );
        assert_eq!(node.get_value(&mut state).unwrap(), Value::from("Oslo"));
        assert!(!node.is_compilable());
    }

    #[test]
    fn test_write_through_map_accessor() {
        let root = Value::map([("a", Value::Int(1))]);
        let ctx = StandardEvaluationContext::with_root(root.clone());
        let config = CompilerConfiguration::default();
        let mut state = ExpressionState::new(&ctx, &config);
        let node = PropertyOrFieldReference::new("b", false, span());
        assert!(node.is_writable(&mut state).unwrap());
        node.set_value(&mut state, TypedValue::new(Value::Int(2))).unwrap();
        assert_eq!(node.get_value(&mut state).unwrap(), Value::Int(2));
    }
}
