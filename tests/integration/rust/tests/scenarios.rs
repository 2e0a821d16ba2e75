//! End-to-end scenarios
//!
//! Each test walks one expression from source text through interpretation
//! and, where the mode allows it, compilation.

use core_types::{MessageCode, Record, TypedValue, Value};
use expression::{CompilationState, ExpressionParser};
use integration_tests::inventor;
use interpreter::{
    CompilerConfiguration, CompilerMode, EvaluationContext, ExpressionState, Node,
    StandardEvaluationContext,
};
use pretty_assertions::assert_eq;

fn mixed(threshold: u32) -> ExpressionParser {
    ExpressionParser::new(CompilerConfiguration::new(CompilerMode::Mixed).with_warm_up_threshold(threshold))
}

/// Test: arithmetic on literals interprets, warms up and then runs compiled
#[test]
fn test_literal_arithmetic_warms_up() {
    let expr = mixed(2).parse_expression("1 + 2").unwrap();
    assert_eq!(expr.compilation_state(), CompilationState::Parsed);

    assert_eq!(expr.get_value(), Ok(Value::Int(3)));
    assert_eq!(expr.compilation_state(), CompilationState::Interpreting);
    assert_eq!(expr.get_value(), Ok(Value::Int(3)));
    assert_eq!(expr.compilation_state(), CompilationState::Compiled);
    assert_eq!(expr.get_value(), Ok(Value::Int(3)));
    assert_eq!(expr.interpreted_count(), 2);
}

/// Test: root and variable references resolve against the context
#[test]
fn test_root_and_variable_references() {
    let ctx = StandardEvaluationContext::with_root(Value::map([("name", Value::from("a"))]));
    ctx.set_variable("x", Value::Int(5));
    let parser = mixed(1);

    let name = parser.parse_expression("#root.name").unwrap();
    let x = parser.parse_expression("#x").unwrap();
    for _ in 0..3 {
        assert_eq!(name.get_value_in(&ctx), Ok(Value::from("a")));
        assert_eq!(x.get_value_in(&ctx), Ok(Value::Int(5)));
    }
    assert_eq!(x.compilation_state(), CompilationState::Compiled);

    let unknown = parser.parse_expression("#missing").unwrap();
    assert_eq!(unknown.get_value_in(&ctx), Ok(Value::Null));
}

/// Test: a literal needs no warm-up to compile
#[test]
fn test_string_literal_compiles_immediately() {
    let parser = ExpressionParser::new(CompilerConfiguration::new(CompilerMode::Immediate));
    let expr = parser.parse_expression("'hello'").unwrap();
    assert!(expr.ast().is_compilable());
    assert_eq!(expr.get_value(), Ok(Value::from("hello")));
    assert_eq!(expr.compilation_state(), CompilationState::Compiled);
    assert_eq!(expr.interpreted_count(), 0);

    let explicit = mixed(100).parse_expression("'hello'").unwrap();
    assert!(explicit.compile());
    assert_eq!(explicit.compilation_state(), CompilationState::Compiled);
    assert_eq!(explicit.get_value(), Ok(Value::from("hello")));
}

/// Test: adding two host objects with no overloader is an operator error
#[test]
fn test_unsupported_operands_report_their_types() {
    let ctx = StandardEvaluationContext::new();
    let money = || Record::new("Money").with("amount", 10).into_value();
    ctx.set_variable("a", money());
    ctx.set_variable("b", money());

    let expr = mixed(1).parse_expression("#a + #b").unwrap();
    let err = expr.get_value_in(&ctx).unwrap_err();
    assert_eq!(err.code, MessageCode::OperatorNotSupportedBetweenTypes);
    assert_eq!(err.inserts[0], "+");
    assert!(err.inserts[1].contains("Money"));
    assert!(err.inserts[2].contains("Money"));
    assert_ne!(expr.compilation_state(), CompilationState::Compiled);
}

/// Test: a scope binds `this` only while it is open
#[test]
fn test_scoped_this_binding() {
    let ctx = StandardEvaluationContext::with_root(Value::from("root"));
    let config = CompilerConfiguration::default();
    let tree = parser::parse_expression("#this", &config).unwrap();
    let mut state = ExpressionState::new(&ctx, &config);

    state.enter_scope_with("this", TypedValue::new(Value::from("element")));
    assert_eq!(tree.get_value(&mut state), Ok(Value::from("element")));
    state.exit_scope();

    assert!(state.lookup_local_variable("this").is_none());
    assert_eq!(state.scope_depth(), 0);
    assert_eq!(tree.get_value(&mut state), Ok(Value::from("root")));
}

/// Test: a compiled unit that meets an unexpected type hands over to the interpreter
#[test]
fn test_type_change_falls_back_to_interpretation() {
    let ctx = StandardEvaluationContext::new();
    let parser = mixed(1);
    let expr = parser.parse_expression("#x - 1").unwrap();

    ctx.set_variable("x", Value::Int(41));
    assert_eq!(expr.get_value_in(&ctx), Ok(Value::Int(40)));
    assert_eq!(expr.compilation_state(), CompilationState::Compiled);

    ctx.set_variable("x", Value::from("forty"));
    let err = expr.get_value_in(&ctx).unwrap_err();
    assert_eq!(err.code, MessageCode::OperatorNotSupportedBetweenTypes);
    assert_eq!(expr.compilation_state(), CompilationState::InterpretingFallback);

    ctx.set_variable("x", Value::Long(100));
    assert_eq!(expr.get_value_in(&ctx), Ok(Value::Long(99)));
    assert_eq!(expr.compilation_state(), CompilationState::InterpretingFallback);
}

/// Test: navigating a host object graph gives the same answer in every mode
#[test]
fn test_inventor_navigation() {
    let ctx = StandardEvaluationContext::with_root(inventor());
    let parser = mixed(1);
    let cases = [
        ("name.toUpperCase()", Value::from("NIKOLA TESLA")),
        ("inventions.size()", Value::Int(3)),
        ("inventions[1]", Value::from("radio")),
        ("born < 1900 and weight > 60", Value::Boolean(true)),
        ("name matches 'Nikola.*'", Value::Boolean(true)),
    ];
    for (source, expected) in cases {
        let expr = parser.parse_expression(source).unwrap();
        for _ in 0..3 {
            assert_eq!(expr.get_value_in(&ctx), Ok(expected.clone()), "{}", source);
        }
    }
}

/// Test: auto-grow navigation behaves the same in interpreted and tiered modes
#[test]
fn test_auto_grow_navigation_agrees_across_tiers() {
    let person = || {
        let address = Record::new("Address").with("city", "Oslo").into_value();
        Record::new("Person").with("address", address).into_value()
    };
    let outcome = |mode: CompilerMode| {
        let root = person();
        let ctx = StandardEvaluationContext::with_root(root.clone());
        let config = CompilerConfiguration::new(mode)
            .with_warm_up_threshold(1)
            .with_auto_grow(true, false);
        let expr = ExpressionParser::new(config).parse_expression("address.city").unwrap();
        assert_eq!(expr.get_value_in(&ctx), Ok(Value::from("Oslo")));
        assert_eq!(expr.get_value_in(&ctx), Ok(Value::from("Oslo")));
        assert_ne!(expr.compilation_state(), CompilationState::Compiled);

        let object = root.as_object().unwrap();
        assert!(object.write_property("address", Value::Null));
        let result = expr.get_value_in(&ctx);
        let grown = object.read_property("address").unwrap();
        (result, grown.is_null())
    };
    let interpreted = outcome(CompilerMode::Off);
    assert!(!interpreted.1);
    assert_eq!(outcome(CompilerMode::Mixed), interpreted);
}

/// Test: errors raised by compiled property reads and method calls carry the node's span
#[test]
fn test_compiled_errors_keep_source_span() {
    let run = |mode: CompilerMode| {
        let ctx = StandardEvaluationContext::new();
        let parser = ExpressionParser::new(
            CompilerConfiguration::new(mode).with_warm_up_threshold(1),
        );
        let read = parser.parse_expression("#p.name").unwrap();
        let call = parser.parse_expression("#s.substring(#i)").unwrap();

        ctx.set_variable("p", Record::new("Person").with("name", "Ada").into_value());
        ctx.set_variable("s", Value::from("abc"));
        ctx.set_variable("i", Value::Int(1));
        for _ in 0..2 {
            assert_eq!(read.get_value_in(&ctx), Ok(Value::from("Ada")));
            assert_eq!(call.get_value_in(&ctx), Ok(Value::from("bc")));
        }

        ctx.set_variable("p", Record::new("Person").with("age", 36).into_value());
        ctx.set_variable("i", Value::Int(9));
        let read_err = read.get_value_in(&ctx).unwrap_err();
        let call_err = call.get_value_in(&ctx).unwrap_err();
        let states = (read.compilation_state(), call.compilation_state());
        (read_err, call_err, states)
    };
    let (read_interpreted, call_interpreted, _) = run(CompilerMode::Off);
    let (read_compiled, call_compiled, states) = run(CompilerMode::Mixed);
    assert_eq!(states, (CompilationState::Compiled, CompilationState::Compiled));

    assert_eq!(read_interpreted.code, MessageCode::PropertyOrFieldNotReadable);
    assert_eq!(read_compiled.code, read_interpreted.code);
    assert_eq!(read_compiled.span, read_interpreted.span);
    assert!(read_compiled.span.is_some());

    assert_eq!(call_compiled, call_interpreted);
    assert!(call_compiled.span.is_some());
}
