//! Unit tests for interpreter components

use core_types::{MessageCode, Record, TypeDescriptor, TypedValue, Value};
use interpreter::{
    CompilerConfiguration, CompilerMode, EvaluationContext, ExpressionState, InlineCache,
    MapBeanResolver, RegisteredConstructorResolver, StandardEvaluationContext,
};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::Arc;

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_configuration_defaults() {
    let config = CompilerConfiguration::default();
    assert_eq!(config.mode, CompilerMode::Off);
    assert!(!config.auto_grow_null_references);
    assert!(!config.auto_grow_collections);
    assert_eq!(config.maximum_auto_grow_size, usize::MAX);
}

#[test]
fn test_configuration_from_lookup() {
    let config = CompilerConfiguration::from_lookup(|key| match key {
        "CORTEN_EL_COMPILER_MODE" => Some("MIXED".to_string()),
        "CORTEN_EL_WARM_UP" => Some("3".to_string()),
        _ => None,
    })
    .unwrap();
    assert_eq!(config.mode, CompilerMode::Mixed);
    assert_eq!(config.warm_up_threshold, 3);

    let unset = CompilerConfiguration::from_lookup(|_| None).unwrap();
    assert_eq!(unset.mode, CompilerMode::Off);
}

#[test]
fn test_configuration_serde() {
    let config = CompilerConfiguration::new(CompilerMode::Immediate).with_auto_grow(true, false);
    let json = serde_json::to_string(&config).unwrap();
    let back: CompilerConfiguration = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);

    let partial: CompilerConfiguration = serde_json::from_str(r#"{"warm_up_threshold": 7}"#).unwrap();
    assert_eq!(partial.warm_up_threshold, 7);
    assert_eq!(partial.mode, CompilerMode::Off);
}

// ============================================================================
// Inline cache
// ============================================================================

#[test]
fn test_inline_cache_transitions() {
    let mut cache: InlineCache<u32> = InlineCache::new();
    assert_eq!(cache.degree(), Some(0));

    cache.update(Some(TypeDescriptor::String), 1);
    assert_eq!(cache.degree(), Some(1));
    assert_eq!(cache.lookup(&Some(TypeDescriptor::String)), Some(1));
    assert!(cache.monomorphic_entry().is_some());

    cache.update(None, 2);
    assert_eq!(cache.degree(), Some(2));
    assert_eq!(cache.lookup(&None), Some(2));
    assert!(cache.monomorphic_entry().is_none());

    for (i, td) in [TypeDescriptor::Int, TypeDescriptor::Long, TypeDescriptor::List]
        .into_iter()
        .enumerate()
    {
        cache.update(Some(td), 10 + i as u32);
    }
    assert_eq!(cache.degree(), None);
    assert_eq!(cache.lookup(&Some(TypeDescriptor::String)), None);
}

// ============================================================================
// Expression state
// ============================================================================

#[test]
fn test_active_object_defaults_to_root() {
    let ctx = StandardEvaluationContext::with_root(Value::from("root"));
    let config = CompilerConfiguration::default();
    let mut state = ExpressionState::new(&ctx, &config);
    assert_eq!(state.active_context_object().value(), &Value::from("root"));

    state.push_active_context_object(TypedValue::new(Value::Int(1)));
    assert_eq!(state.active_context_object().value(), &Value::Int(1));
    state.pop_active_context_object();
    assert_eq!(state.active_context_object().value(), &Value::from("root"));
}

#[test]
fn test_guards_restore_stacks() {
    let ctx = StandardEvaluationContext::new();
    let config = CompilerConfiguration::default();
    let mut state = ExpressionState::new(&ctx, &config);
    {
        let mut active = state.scoped_active_context_object(TypedValue::new(Value::Int(7)));
        let scope = active.scoped(HashMap::from([(
            "x".to_string(),
            TypedValue::new(Value::Int(1)),
        )]));
        assert_eq!(scope.scope_depth(), 1);
        assert_eq!(scope.context_object_depth(), 1);
        assert_eq!(scope.scope_root_context_object().value(), &Value::Int(7));
        assert_eq!(scope.lookup_local_variable("x").map(TypedValue::into_value), Some(Value::Int(1)));
    }
    assert_eq!(state.scope_depth(), 0);
    assert_eq!(state.context_object_depth(), 0);
    assert_eq!(state.lookup_local_variable("x"), None);
}

#[test]
fn test_local_variables_shadow_outer_scopes() {
    let ctx = StandardEvaluationContext::new();
    let config = CompilerConfiguration::default();
    let mut state = ExpressionState::new(&ctx, &config);
    state.enter_scope_with("x", TypedValue::new(Value::Int(1)));
    state.enter_scope_with("x", TypedValue::new(Value::Int(2)));
    assert_eq!(state.lookup_local_variable("x").unwrap().value(), &Value::Int(2));

    // updates the innermost scope that defines the name
    state.set_local_variable("x", TypedValue::new(Value::Int(3)));
    state.exit_scope();
    assert_eq!(state.lookup_local_variable("x").unwrap().value(), &Value::Int(1));
    state.exit_scope();
    assert_eq!(state.scope_depth(), 0);

    // with no scope open the variable outlives scope changes
    state.set_local_variable("y", TypedValue::new(Value::Int(9)));
    assert_eq!(state.scope_depth(), 0);
    state.enter_scope();
    assert_eq!(state.lookup_local_variable("y").unwrap().value(), &Value::Int(9));
    state.exit_scope();
    assert_eq!(state.lookup_local_variable("y").unwrap().value(), &Value::Int(9));
    assert_eq!(state.scope_depth(), 0);
}

#[test]
fn test_unbound_context_variable_is_null() {
    let ctx = StandardEvaluationContext::new();
    let config = CompilerConfiguration::default();
    let state = ExpressionState::new(&ctx, &config);
    assert!(state.lookup_variable("missing").is_null());
    state.set_variable("n", Value::Long(4));
    assert_eq!(ctx.lookup_variable("n"), Some(Value::Long(4)));
}

#[test]
fn test_convert_value_uses_context_converter() {
    let ctx = StandardEvaluationContext::new();
    let config = CompilerConfiguration::default();
    let state = ExpressionState::new(&ctx, &config);
    let converted = state
        .convert_value(&TypedValue::new(Value::Int(3)), &TypeDescriptor::Long)
        .unwrap();
    assert_eq!(converted, Value::Long(3));
    let err = state
        .convert_value(&TypedValue::new(Value::from("x")), &TypeDescriptor::Int)
        .unwrap_err();
    assert_eq!(err.code, MessageCode::TypeConversionError);
}

// ============================================================================
// Context strategies
// ============================================================================

#[test]
fn test_constructor_resolver_registration() {
    let mut resolver = RegisteredConstructorResolver::new();
    resolver.register("Point", 2, |args| {
        Ok(Record::new("Point")
            .with("x", args[0].clone())
            .with("y", args[1].clone())
            .into_value())
    });
    assert!(resolver.is_registered("Point", 2));
    assert!(!resolver.is_registered("Point", 1));

    let mut ctx = StandardEvaluationContext::new();
    ctx.add_constructor_resolver(Arc::new(resolver));
    assert!(ctx.constructor_resolvers().len() >= 2);
}

#[test]
fn test_bean_resolver_lookup() {
    let beans = MapBeanResolver::new();
    beans.register("answer", Value::Int(42));
    let mut ctx = StandardEvaluationContext::new();
    assert!(ctx.bean_resolver().is_none());
    ctx.set_bean_resolver(Arc::new(beans));
    let resolver = ctx.bean_resolver().unwrap();
    assert_eq!(resolver.resolve(&ctx, "answer"), Ok(Value::Int(42)));
    let err = resolver.resolve(&ctx, "question").unwrap_err();
    assert_eq!(err.code, MessageCode::ExceptionDuringBeanResolution);
}

#[test]
fn test_type_locator_finds_builtins() {
    let ctx = StandardEvaluationContext::new();
    assert_eq!(ctx.type_locator().find_type("Long"), Ok(TypeDescriptor::Long));
    assert_eq!(
        ctx.type_locator().find_type("Widget").unwrap_err().code,
        MessageCode::TypeNotFound
    );
}
