//! Compiler tests for jit_compiler
//!
//! Parses expressions, warms them up through the interpreter, then checks
//! that the compiled unit agrees with interpretation.

use core_types::{EvalResult, MessageCode, Record, Value};
use interpreter::{
    CompilerConfiguration, EvaluationContext, ExpressionState, Node, StandardEvaluationContext,
};
use jit_compiler::{CompiledUnit, Deoptimizer, ExpressionCompiler, UnitFailure};
use pretty_assertions::assert_eq;

fn inventor() -> Value {
    Record::new("Inventor")
        .with("name", "Nikola Tesla")
        .with("born", 1856)
        .with(
            "inventions",
            Value::list(vec![Value::from("induction motor"), Value::from("radio")]),
        )
        .into_value()
}

fn parse(source: &str) -> Box<dyn Node> {
    parser::parse_expression(source, &CompilerConfiguration::default()).unwrap()
}

fn interpret(node: &dyn Node, ctx: &StandardEvaluationContext) -> EvalResult<Value> {
    let config = CompilerConfiguration::default();
    let mut state = ExpressionState::new(ctx, &config);
    node.get_value(&mut state)
}

fn run(unit: &CompiledUnit, ctx: &StandardEvaluationContext) -> Result<Value, UnitFailure> {
    unit.get_value(&ctx.root_object().into_value(), ctx)
}

/// Interpret once, compile, and check both agree
fn warm_and_compile(source: &str, ctx: &StandardEvaluationContext) -> (Box<dyn Node>, CompiledUnit) {
    let node = parse(source);
    let interpreted = interpret(node.as_ref(), ctx).unwrap();
    let unit = ExpressionCompiler::new(false)
        .compile(node.as_ref())
        .unwrap_or_else(|e| panic!("'{}' did not compile: {}", source, e));
    assert_eq!(run(&unit, ctx), Ok(interpreted), "{}", source);
    (node, unit)
}

#[test]
fn test_compiled_matches_interpreted() {
    let ctx = StandardEvaluationContext::with_root(inventor());
    for source in [
        "born + 1",
        "born * 2L",
        "born / 2.0",
        "born > 1800 and born < 1900",
        "name.length()",
        "name.toUpperCase()",
        "inventions[1]",
        "inventions.size() == 2",
        "name matches 'Nik.*'",
        "{1, 2, 3}.size()",
        "'Mr ' + name",
        "born > 1900 ? 'modern' : 'classic'",
        "!(born == 1856)",
        "-born",
    ] {
        warm_and_compile(source, &ctx);
    }
}

#[test]
fn test_unwarmed_tree_does_not_compile() {
    let compiler = ExpressionCompiler::new(false);
    assert!(compiler.compile(parse("born + 1").as_ref()).is_err());
    assert_eq!(compiler.stats().compile_failures, 1);
}

#[test]
fn test_literal_arithmetic_is_native_on_supported_hosts() {
    let ctx = StandardEvaluationContext::new();
    let node = parse("2 * 3 + 1.5");
    assert_eq!(interpret(node.as_ref(), &ctx), Ok(Value::Double(7.5)));
    let compiler = ExpressionCompiler::new(true);
    let unit = compiler.compile(node.as_ref()).unwrap();
    assert_eq!(run(&unit, &ctx), Ok(Value::Double(7.5)));
    if cfg!(any(target_arch = "x86_64", target_arch = "aarch64")) {
        assert!(unit.is_native());
        assert_eq!(compiler.stats().native_units, 1);
    }
}

#[test]
fn test_changed_variable_type_is_a_coercion_failure() {
    let ctx = StandardEvaluationContext::new();
    ctx.set_variable("x", Value::Int(41));
    let (_, unit) = warm_and_compile("#x + 1", &ctx);

    ctx.set_variable("x", Value::from("forty-one"));
    let failure = run(&unit, &ctx).unwrap_err();
    assert!(matches!(failure, UnitFailure::Coercion { .. }), "{:?}", failure);

    let deopt = Deoptimizer::new();
    assert!(deopt.record("#x + 1", &failure));
}

#[test]
fn test_evaluation_errors_pass_through() {
    let ctx = StandardEvaluationContext::new();
    ctx.set_variable("d", Value::Int(2));
    let (node, unit) = warm_and_compile("10 / #d", &ctx);

    ctx.set_variable("d", Value::Int(0));
    let compiled = run(&unit, &ctx).unwrap_err();
    let interpreted = interpret(node.as_ref(), &ctx).unwrap_err();
    assert!(!compiled.is_disqualifying());
    let UnitFailure::Evaluation(err) = compiled else {
        unreachable!()
    };
    assert_eq!(err.code, MessageCode::DivisionByZero);
    assert_eq!(err.code, interpreted.code);
}

#[test]
fn test_compiled_units_are_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<CompiledUnit>();
    assert_send_sync::<ExpressionCompiler>();
}
