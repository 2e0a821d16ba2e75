//! Property tests
//!
//! Compiled and interpreted evaluation must agree, coercions must preserve
//! values, failed compiled runs must settle into interpretation, and
//! evaluation must leave the state's scopes balanced whatever happens.

use bytecode_system::{CodeFlow, Descriptor, Opcode, PrimitiveKind};
use core_types::{MessageCode, TypedValue, Value};
use expression::{CompilationState, ExpressionParser};
use interpreter::{
    CompilerConfiguration, CompilerMode, EvaluationContext, ExpressionState, Node,
    StandardEvaluationContext,
};
use jit_compiler::{verify, CompiledUnit};
use proptest::prelude::*;

const INT_SOURCES: &[&str] = &[
    "#a + #b * 2",
    "#a - #b",
    "#a * #b",
    "#a / #b",
    "#a % #b",
    "-#a + #b",
    "#a > #b",
    "#a != #b",
    "#a == #b ? 'same' : 'different'",
    "(#a + 0.5) * #b",
];

fn tiered_parser(mode: CompilerMode) -> ExpressionParser {
    ExpressionParser::new(CompilerConfiguration::new(mode).with_warm_up_threshold(1))
}

fn bind(ctx: &StandardEvaluationContext, a: i32, b: i32) {
    ctx.set_variable("a", Value::Int(a));
    ctx.set_variable("b", Value::Int(b));
}

/// Run `value` through a unit that unboxes it as `unbox` and boxes it as `kind`
fn coerce(value: Value, unbox: Opcode, kind: PrimitiveKind) -> Value {
    let mut cf = CodeFlow::for_chunk("coerce");
    let constant = cf.add_constant(value);
    cf.emit(Opcode::PushConst(constant));
    cf.emit(unbox);
    cf.insert_boxing(kind);
    cf.emit(Opcode::Return);
    let chunk = cf.finish(Some(Descriptor::Boxed(kind)));
    verify(&chunk).unwrap();
    let unit = CompiledUnit::link(chunk, None).unwrap();
    unit.get_value(&Value::Null, &StandardEvaluationContext::new()).unwrap()
}

#[test]
fn test_boxing_preserves_every_primitive_kind() {
    for kind in PrimitiveKind::ALL {
        let value = match kind {
            PrimitiveKind::Boolean => Value::Boolean(true),
            PrimitiveKind::Char => Value::Char('λ'),
            PrimitiveKind::Byte => Value::Byte(-7),
            PrimitiveKind::Short => Value::Short(-300),
            PrimitiveKind::Int => Value::Int(i32::MIN),
            PrimitiveKind::Long => Value::Long(i64::MAX),
            PrimitiveKind::Float => Value::Float(1.25),
            PrimitiveKind::Double => Value::Double(-0.5),
        };
        assert_eq!(coerce(value.clone(), Opcode::Unbox(kind), kind), value, "{:?}", kind);
    }
}

#[test]
fn test_scopes_balance_after_failed_selection() {
    let ctx = StandardEvaluationContext::new();
    let config = CompilerConfiguration::default();
    let mut state = ExpressionState::new(&ctx, &config);
    state.enter_scope_with("this", TypedValue::new(Value::from("outer")));

    for source in ["{1, 2, 0}.?[10 / #this > 1]", "{1, 2}.![#this.foo]", "{1, 2}.?[#missing.x]"] {
        let tree = parser::parse_expression(source, &config).unwrap();
        let scopes = state.scope_depth();
        let objects = state.context_object_depth();
        assert!(tree.get_value(&mut state).is_err(), "{}", source);
        assert_eq!(state.scope_depth(), scopes, "{}", source);
        assert_eq!(state.context_object_depth(), objects, "{}", source);
    }
    assert_eq!(
        state.lookup_local_variable("this").map(TypedValue::into_value),
        Some(Value::from("outer"))
    );
}

#[test]
fn test_division_by_zero_in_selection() {
    let ctx = StandardEvaluationContext::new();
    let config = CompilerConfiguration::default();
    let mut state = ExpressionState::new(&ctx, &config);
    let tree = parser::parse_expression("{1, 2, 0}.?[10 / #this > 1]", &config).unwrap();
    let err = tree.get_value(&mut state).unwrap_err();
    assert_eq!(err.code, MessageCode::DivisionByZero);
    assert_eq!(state.scope_depth(), 0);
}

#[test]
fn test_long_float_literal_agrees_across_tiers() {
    let source = "1152921573326323713L + 1.0f";
    let compiled = tiered_parser(CompilerMode::Immediate).parse_expression(source).unwrap();
    let interpreted = tiered_parser(CompilerMode::Off).parse_expression(source).unwrap();
    let expected = interpreted.get_value().unwrap();
    assert_eq!(expected, Value::Float(1_152_921_573_326_323_713i64 as f32 + 1.0));
    assert_eq!(compiled.get_value(), Ok(expected.clone()));
    assert_eq!(compiled.compilation_state(), CompilationState::Compiled);
    assert_eq!(compiled.get_value(), Ok(expected));
}

proptest! {
    #[test]
    fn test_compiled_agrees_with_interpreted(
        source in prop::sample::select(INT_SOURCES.to_vec()),
        warm in (-1000i32..1000, 1i32..100),
        runs in prop::collection::vec((-10_000i32..10_000, 1i32..1000), 1..8),
    ) {
        let ctx = StandardEvaluationContext::new();
        let compiled = tiered_parser(CompilerMode::Mixed).parse_expression(source).unwrap();
        let interpreted = tiered_parser(CompilerMode::Off).parse_expression(source).unwrap();

        bind(&ctx, warm.0, warm.1);
        prop_assert_eq!(compiled.get_value_in(&ctx), interpreted.get_value_in(&ctx));
        prop_assert_eq!(compiled.compilation_state(), CompilationState::Compiled);

        for (a, b) in runs {
            bind(&ctx, a, b);
            prop_assert_eq!(compiled.get_value_in(&ctx), interpreted.get_value_in(&ctx), "{} a={} b={}", source, a, b);
        }
        prop_assert_eq!(interpreted.compilation_state(), CompilationState::Interpreting);
    }

    #[test]
    fn test_doubles_agree_across_tiers(x in -1.0e6f64..1.0e6, y in -1.0e6f64..1.0e6) {
        let ctx = StandardEvaluationContext::new();
        let source = "#x * 2.5 - #y / 4";
        let compiled = tiered_parser(CompilerMode::Immediate).parse_expression(source).unwrap();
        let interpreted = tiered_parser(CompilerMode::Off).parse_expression(source).unwrap();

        ctx.set_variable("x", Value::Double(1.0));
        ctx.set_variable("y", Value::Double(2.0));
        compiled.get_value_in(&ctx).unwrap();

        ctx.set_variable("x", Value::Double(x));
        ctx.set_variable("y", Value::Double(y));
        prop_assert_eq!(compiled.compilation_state(), CompilationState::Compiled);
        prop_assert_eq!(compiled.get_value_in(&ctx), interpreted.get_value_in(&ctx));
    }

    #[test]
    fn test_long_float_mix_agrees_across_tiers(
        source in prop::sample::select(vec!["#l + #f", "#l * #f", "#f - #l", "#l > #f", "#l == #f"]),
        l in any::<i64>(),
        f in -1.0e6f32..1.0e6,
    ) {
        let ctx = StandardEvaluationContext::new();
        let compiled = tiered_parser(CompilerMode::Mixed).parse_expression(source).unwrap();
        let interpreted = tiered_parser(CompilerMode::Off).parse_expression(source).unwrap();

        ctx.set_variable("l", Value::Long(1));
        ctx.set_variable("f", Value::Float(2.0));
        compiled.get_value_in(&ctx).unwrap();
        prop_assert_eq!(compiled.compilation_state(), CompilationState::Compiled);

        ctx.set_variable("l", Value::Long(l));
        ctx.set_variable("f", Value::Float(f));
        prop_assert_eq!(compiled.get_value_in(&ctx), interpreted.get_value_in(&ctx), "{} l={} f={}", source, l, f);
    }

    #[test]
    fn test_numeric_unboxing_widens_ints(n in any::<i32>()) {
        let widened = coerce(Value::Int(n), Opcode::UnboxNumber(PrimitiveKind::Long), PrimitiveKind::Long);
        prop_assert_eq!(widened, Value::Long(i64::from(n)));
        let doubled = coerce(Value::Int(n), Opcode::UnboxNumber(PrimitiveKind::Double), PrimitiveKind::Double);
        prop_assert_eq!(doubled, Value::Double(f64::from(n)));
    }

    #[test]
    fn test_type_changes_settle_into_interpretation(
        inputs in prop::collection::vec(prop_oneof![
            any::<i16>().prop_map(|n| Value::Int(i32::from(n))),
            "[a-z]{1,4}".prop_map(Value::String),
        ], 1..12),
    ) {
        let ctx = StandardEvaluationContext::new();
        let tiered = tiered_parser(CompilerMode::Mixed);
        let compiled = tiered.parse_expression("#x - 1").unwrap();
        let interpreted = tiered_parser(CompilerMode::Off).parse_expression("#x - 1").unwrap();

        let mut was_compiled = false;
        for input in inputs {
            let is_string = matches!(input, Value::String(_));
            ctx.set_variable("x", input);
            let expected = interpreted.get_value_in(&ctx);
            prop_assert_eq!(compiled.get_value_in(&ctx), expected);

            let state = compiled.compilation_state();
            if was_compiled && is_string {
                prop_assert_eq!(state, CompilationState::InterpretingFallback);
            }
            was_compiled |= state == CompilationState::Compiled;
            prop_assert!(!(state == CompilationState::Compiled && compiled.compiled_unit().is_none()));
        }
        prop_assert!(tiered.compiler_stats().units_compiled <= 1);
    }
}
