//! REPL (Read-Eval-Print Loop) implementation

use crate::error::{CliError, CliResult};
use crate::runtime::{format_value, Runtime};
use interpreter::CompilerMode;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// What the loop does after a command
#[derive(Debug, PartialEq, Eq)]
pub enum Step {
    /// Read the next line
    Continue,
    /// Leave the REPL
    Exit,
}

/// Run the interactive REPL
pub fn run_repl(runtime: &mut Runtime) -> CliResult<()> {
    let mut editor = DefaultEditor::new()
        .map_err(|e| CliError::Repl(format!("failed to initialize editor: {}", e)))?;

    println!("Corten expression shell v{}", env!("CARGO_PKG_VERSION"));
    println!("Type an expression, or .help for commands.");
    println!();

    loop {
        match editor.readline("el> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(trimmed);

                if trimmed.starts_with('.') {
                    if handle_command(trimmed, runtime) == Step::Exit {
                        break;
                    }
                    continue;
                }

                match runtime.evaluate(trimmed) {
                    Ok(value) => println!("{}", format_value(&value)),
                    Err(e) => eprintln!("{}", e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Press Ctrl-D or type .exit to quit");
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(CliError::Repl(format!("readline error: {}", err))),
        }
    }
    Ok(())
}

/// Handle a dot command, printing its output
pub fn handle_command(command: &str, runtime: &mut Runtime) -> Step {
    let mut words = command.split_whitespace();
    let name = words.next().unwrap_or_default();
    let argument = words.collect::<Vec<_>>().join(" ");

    match name {
        ".help" => {
            println!("Commands:");
            println!("  .help              Show this help message");
            println!("  .mode [MODE]       Show or set the compiler mode (off, immediate, mixed)");
            println!("  .vars              List bound variables");
            println!("  .let NAME=EXPR     Bind a variable");
            println!("  .state EXPR        Show the compilation state of an evaluated expression");
            println!("  .stats             Show compiler counters");
            println!("  .exit              Exit the REPL");
        }
        ".mode" if argument.is_empty() => println!("{}", runtime.mode()),
        ".mode" => match argument.parse::<CompilerMode>() {
            Ok(mode) => {
                runtime.set_mode(mode);
                println!("{}", mode);
            }
            Err(e) => eprintln!("{}", e),
        },
        ".vars" => {
            for (name, value) in runtime.variables() {
                println!("#{} = {}", name, format_value(&value));
            }
        }
        ".let" => {
            if let Err(e) = runtime.bind(&argument) {
                eprintln!("{}", e);
            }
        }
        ".state" => match runtime.compilation_state(&argument) {
            Some(state) => println!("{}", state),
            None => println!("not evaluated yet"),
        },
        ".stats" => println!("{}", runtime.stats_line()),
        ".exit" | ".quit" => return Step::Exit,
        _ => {
            println!("Unknown command: {}", name);
            println!("Type .help for available commands");
        }
    }
    Step::Continue
}
