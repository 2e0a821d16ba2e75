//! CLI pipeline tests
//!
//! Drives the command line surface the way the binary does: parsed
//! arguments configure a runtime, which then evaluates through the full
//! parse, interpret and compile pipeline.

use clap::Parser;
use core_types::{MessageCode, Value};
use expr_cli::repl::{handle_command, Step};
use expr_cli::{format_value, Cli, CliError, Runtime};
use expression::CompilationState;
use interpreter::{CompilerConfiguration, CompilerMode};
use pretty_assertions::assert_eq;

/// Configure a runtime from arguments, as the binary does
fn runtime_for(cli: &Cli) -> Result<Runtime, CliError> {
    let mut configuration = CompilerConfiguration::default();
    if let Some(mode) = cli.mode {
        configuration.mode = mode;
    }
    let mut runtime = Runtime::new(configuration.with_warm_up_threshold(2));
    if let Some(root) = &cli.root {
        runtime.set_root_json(root)?;
    }
    for binding in &cli.vars {
        runtime.bind(binding)?;
    }
    Ok(runtime)
}

/// Test: eval with root, bindings and repeat compiles the expression
#[test]
fn test_eval_arguments_end_to_end() {
    let cli = Cli::try_parse_from([
        "corten-el",
        "--eval",
        "items.?[#this > #min].size() + #bonus",
        "--mode",
        "mixed",
        "--root",
        r#"{"items": [3, 8, 13, 21]}"#,
        "--var",
        "min=10",
        "--var",
        "bonus=#min / 5",
        "--repeat",
        "4",
    ])
    .unwrap();
    let mut runtime = runtime_for(&cli).unwrap();
    let source = cli.eval.as_deref().unwrap();

    let value = runtime.evaluate_repeated(source, cli.repeat).unwrap();
    assert_eq!(format_value(&value), "4");
    assert_eq!(runtime.mode(), CompilerMode::Mixed);
}

/// Test: a numeric expression reaches the compiled tier through the CLI
#[test]
fn test_numeric_eval_compiles() {
    let cli = Cli::try_parse_from(["corten-el", "-e", "#r * #r * 3.14", "-m", "immediate", "--var", "r=2.0"])
        .unwrap();
    let mut runtime = runtime_for(&cli).unwrap();
    // the `r=2.0` binding is itself evaluated, and compiled, in immediate mode
    assert!(runtime.stats_line().starts_with("compiled 1,"));
    let value = runtime.evaluate_repeated("#r * #r * 3.14", cli.repeat).unwrap();
    assert_eq!(value, Value::Double(2.0 * 2.0 * 3.14));
    assert_eq!(runtime.compilation_state("#r * #r * 3.14"), Some(CompilationState::Compiled));
    assert!(runtime.stats_line().starts_with("compiled 2,"));
}

/// Test: templates render strings with the bound variables
#[test]
fn test_template_arguments() {
    let cli = Cli::try_parse_from([
        "corten-el",
        "--template",
        "#{#user.toUpperCase()} has #{#count} items",
        "--var",
        "user='ada'",
        "--var",
        "count=1 + 2",
    ])
    .unwrap();
    let mut runtime = runtime_for(&cli).unwrap();
    let text = cli.template.as_deref().unwrap();
    assert_eq!(runtime.evaluate_template(text).unwrap(), Value::from("ADA has 3 items"));
}

/// Test: bad arguments surface as the right error class
#[test]
fn test_argument_errors() {
    assert!(Cli::try_parse_from(["corten-el", "--mode", "eventually"]).is_err());
    assert!(Cli::try_parse_from(["corten-el", "-e", "1", "-t", "x"]).is_err());

    let bad_root = Cli::try_parse_from(["corten-el", "--root", "[1,"]).unwrap();
    assert!(matches!(runtime_for(&bad_root), Err(CliError::InvalidRoot(_))));

    let bad_var = Cli::try_parse_from(["corten-el", "--var", "x"]).unwrap();
    assert!(matches!(runtime_for(&bad_var), Err(CliError::InvalidBinding(_))));

    let failing_var = Cli::try_parse_from(["corten-el", "--var", "x=1 / 0"]).unwrap();
    match runtime_for(&failing_var) {
        Err(CliError::Evaluation(err)) => assert_eq!(err.code, MessageCode::DivisionByZero),
        other => panic!("expected an evaluation error, got {:?}", other.err()),
    }
}

/// Test: REPL commands steer the same runtime the evaluations use
#[test]
fn test_repl_session() {
    let mut runtime = runtime_for(&Cli::try_parse_from(["corten-el", "--repl"]).unwrap()).unwrap();
    assert_eq!(handle_command(".let n=7", &mut runtime), Step::Continue);
    assert_eq!(handle_command(".mode mixed", &mut runtime), Step::Continue);
    assert_eq!(runtime.mode(), CompilerMode::Mixed);

    for _ in 0..3 {
        assert_eq!(runtime.evaluate("#n * 6").unwrap(), Value::Int(42));
    }
    assert_eq!(runtime.compilation_state("#n * 6"), Some(CompilationState::Compiled));
    assert_eq!(runtime.variables(), vec![("n".to_string(), Value::Int(7))]);
    assert_eq!(handle_command(".quit", &mut runtime), Step::Exit);
}
