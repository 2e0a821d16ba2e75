//! Integration tests for interpreter
//!
//! Builds node trees by hand, evaluates them against host object graphs and
//! checks the code each tree generates once it has been warmed up.

use bytecode_system::{CodeFlow, CompareOp, Descriptor, Opcode, PrimitiveKind};
use core_types::{EvalResult, MessageCode, Record, SourceSpan, Value};
use interpreter::nodes::{
    ArithmeticKind, Assign, CompoundExpression, Indexer, Literal, MethodReference, OpArithmetic,
    OpRelational, PropertyOrFieldReference, Selection, SelectionKind, VariableReference,
};
use interpreter::{
    CompilerConfiguration, EvaluationContext, ExpressionState, Node, OperatorOverloader,
    Operation, StandardEvaluationContext,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn span() -> SourceSpan {
    SourceSpan::new(0, 1)
}

fn prop(name: &str) -> Box<dyn Node> {
    Box::new(PropertyOrFieldReference::new(name, false, span()))
}

fn chain(steps: Vec<Box<dyn Node>>) -> CompoundExpression {
    CompoundExpression::new(steps, span())
}

fn eval(node: &dyn Node, ctx: &StandardEvaluationContext) -> EvalResult<Value> {
    let config = CompilerConfiguration::default();
    let mut state = ExpressionState::new(ctx, &config);
    node.get_value(&mut state)
}

fn inventor() -> Value {
    let address = Record::new("Address").with("city", "Smiljan");
    Record::new("Inventor")
        .with("name", "Nikola Tesla")
        .with("born", 1856)
        .with("address", address.into_value())
        .with(
            "inventions",
            Value::list(vec![
                Value::from("induction motor"),
                Value::from("radio"),
            ]),
        )
        .into_value()
}

#[test]
fn test_navigation_reads_nested_property() {
    let ctx = StandardEvaluationContext::with_root(inventor());
    let node = chain(vec![prop("address"), prop("city")]);
    assert_eq!(eval(&node, &ctx), Ok(Value::from("Smiljan")));
    assert_eq!(node.to_expression_string(), "address.city");
}

#[test]
fn test_navigation_compiles_to_property_reads() {
    let ctx = StandardEvaluationContext::with_root(inventor());
    let node = chain(vec![prop("address"), prop("city")]);
    eval(&node, &ctx).unwrap();
    assert!(node.is_compilable());
    assert_eq!(node.exit_descriptor(), Some(Descriptor::String));

    let mut cf = CodeFlow::for_chunk("unit");
    node.generate_code(&mut cf).unwrap();
    let ops: Vec<Opcode> = cf.finish(None).opcodes().cloned().collect();
    assert_eq!(ops.first(), Some(&Opcode::LoadTarget));
    assert!(ops.contains(&Opcode::GetProperty("address".to_string())));
    assert!(ops.contains(&Opcode::GetProperty("city".to_string())));
    assert_eq!(ops.last(), Some(&Opcode::CheckCast(Descriptor::String)));
}

#[test]
fn test_indexing_then_method_call() {
    let ctx = StandardEvaluationContext::with_root(inventor());
    let node = chain(vec![
        prop("inventions"),
        Box::new(Indexer::new(Box::new(Literal::int(1, span())), span())),
        Box::new(MethodReference::new("toUpperCase", false, vec![], span())),
    ]);
    assert_eq!(eval(&node, &ctx), Ok(Value::from("RADIO")));
}

#[test]
fn test_comparison_on_property() {
    let ctx = StandardEvaluationContext::with_root(inventor());
    let node = OpRelational::new(
        CompareOp::Lt,
        prop("born"),
        Box::new(Literal::int(1900, span())),
        span(),
    );
    assert_eq!(eval(&node, &ctx), Ok(Value::Boolean(true)));
    assert!(node.is_compilable());
    let mut cf = CodeFlow::for_chunk("unit");
    node.generate_code(&mut cf).unwrap();
    let ops: Vec<Opcode> = cf.finish(None).opcodes().cloned().collect();
    assert!(ops.contains(&Opcode::ICmp(CompareOp::Lt)));
}

#[test]
fn test_assignment_is_visible_to_host() {
    let root = inventor();
    let ctx = StandardEvaluationContext::with_root(root.clone());
    let node = Assign::new(prop("born"), Box::new(Literal::int(1857, span())), span());
    assert_eq!(eval(&node, &ctx), Ok(Value::Int(1857)));
    let object = root.as_object().unwrap();
    assert_eq!(object.read_property("born"), Some(Value::Int(1857)));
}

#[test]
fn test_variable_assignment_and_read() {
    let ctx = StandardEvaluationContext::new();
    let assign = Assign::new(
        Box::new(VariableReference::new("total", span())),
        Box::new(OpArithmetic::new(
            ArithmeticKind::Plus,
            Box::new(Literal::int(40, span())),
            Box::new(Literal::int(2, span())),
            span(),
        )),
        span(),
    );
    assert_eq!(eval(&assign, &ctx), Ok(Value::Int(42)));
    assert_eq!(ctx.lookup_variable("total"), Some(Value::Int(42)));
    let read = VariableReference::new("total", span());
    assert_eq!(eval(&read, &ctx), Ok(Value::Int(42)));
}

#[test]
fn test_selection_over_property() {
    let ctx = StandardEvaluationContext::with_root(inventor());
    let criterion = Box::new(MethodReference::new(
        "startsWith",
        false,
        vec![Box::new(Literal::string("r", span()))],
        span(),
    ));
    let node = chain(vec![
        prop("inventions"),
        Box::new(Selection::new(SelectionKind::All, false, criterion, span())),
    ]);
    assert_eq!(eval(&node, &ctx).unwrap().to_string(), "[radio]");
}

#[derive(Debug)]
struct MoneyOverloader;

fn cents(value: &Value) -> Option<i64> {
    value
        .as_object()
        .filter(|o| o.type_name() == "Money")
        .and_then(|o| o.read_property("cents"))
        .and_then(|c| c.as_i64())
}

impl OperatorOverloader for MoneyOverloader {
    fn overrides_operation(&self, op: Operation, left: &Value, right: &Value) -> EvalResult<bool> {
        Ok(op == Operation::Add && cents(left).is_some() && cents(right).is_some())
    }

    fn operate(&self, _op: Operation, left: &Value, right: &Value) -> EvalResult<Value> {
        let total = cents(left).unwrap_or(0) + cents(right).unwrap_or(0);
        Ok(Record::new("Money").with("cents", total).into_value())
    }
}

#[test]
fn test_overloaded_operator_stays_interpreted() {
    let money = |c: i64| Record::new("Money").with("cents", c).into_value();
    let mut ctx = StandardEvaluationContext::new();
    ctx.set_variables([("a", money(150)), ("b", money(250))]);
    let node = OpArithmetic::new(
        ArithmeticKind::Plus,
        Box::new(VariableReference::new("a", span())),
        Box::new(VariableReference::new("b", span())),
        span(),
    );

    let err = eval(&node, &ctx).unwrap_err();
    assert_eq!(err.code, MessageCode::OperatorNotSupportedBetweenTypes);

    ctx.set_operator_overloader(Arc::new(MoneyOverloader));
    let sum = eval(&node, &ctx).unwrap();
    assert_eq!(cents(&sum), Some(400));
    assert!(!node.is_compilable());
}

#[test]
fn test_mixed_numeric_exit_is_promoted() {
    let ctx = StandardEvaluationContext::new();
    let node = OpArithmetic::new(
        ArithmeticKind::Multiply,
        Box::new(Literal::long(3, span())),
        Box::new(Literal::int(4, span())),
        span(),
    );
    assert_eq!(eval(&node, &ctx), Ok(Value::Long(12)));
    assert_eq!(
        node.exit_descriptor(),
        Some(Descriptor::Primitive(PrimitiveKind::Long))
    );
}

#[test]
fn test_error_carries_innermost_span() {
    let ctx = StandardEvaluationContext::with_root(inventor());
    let node = CompoundExpression::new(
        vec![
            Box::new(PropertyOrFieldReference::new("address", false, SourceSpan::new(0, 7))),
            Box::new(PropertyOrFieldReference::new("zip", false, SourceSpan::new(8, 11))),
        ],
        SourceSpan::new(0, 11),
    );
    let err = eval(&node, &ctx).unwrap_err();
    assert_eq!(err.code, MessageCode::PropertyOrFieldNotReadable);
    assert_eq!(err.inserts, vec!["zip", "Address"]);
    assert_eq!(err.span, Some(SourceSpan::new(8, 11)));
}
