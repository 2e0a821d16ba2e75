//! Corten expression language CLI
//!
//! Parses CLI arguments and delegates to the Runtime for evaluation.

use clap::Parser as ClapParser;
use expr_cli::{format_value, repl, Cli, CliResult, Runtime};
use interpreter::CompilerConfiguration;
use tracing_subscriber::EnvFilter;

fn run(cli: Cli) -> CliResult<()> {
    let mut configuration = CompilerConfiguration::from_env()?;
    if let Some(mode) = cli.mode {
        configuration.mode = mode;
    }

    let mut runtime = Runtime::new(configuration);
    if let Some(root) = &cli.root {
        runtime.set_root_json(root)?;
    }
    for binding in &cli.vars {
        runtime.bind(binding)?;
    }

    if let Some(source) = &cli.eval {
        let value = runtime.evaluate_repeated(source, cli.repeat)?;
        println!("{}", format_value(&value));
        if cli.verbose {
            if let Some(state) = runtime.compilation_state(source) {
                eprintln!("state: {}", state);
            }
        }
    } else if let Some(text) = &cli.template {
        println!("{}", runtime.evaluate_template(text)?);
    } else if cli.repl {
        repl::run_repl(&mut runtime)?;
    } else {
        println!("Corten expression language v{}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("Usage:");
        println!("  corten-el --eval <EXPR>       Evaluate an expression");
        println!("  corten-el --template <TEXT>   Evaluate template text");
        println!("  corten-el --repl              Start interactive shell");
        println!();
        println!("Run 'corten-el --help' for more options.");
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
