//! Integration test suite for the Corten expression engine
//!
//! Verifies that the components work together across crate boundaries:
//! parsing, interpretation, compilation and the public expression API.

/// Re-export components for test convenience
pub mod components {
    pub use bytecode_system;
    pub use core_types;
    pub use expr_cli;
    pub use expression;
    pub use interpreter;
    pub use jit_compiler;
    pub use parser;
}

use core_types::{Record, Value};

/// Host object graph shared by the suites
pub fn inventor() -> Value {
    Record::new("Inventor")
        .with("name", "Nikola Tesla")
        .with("born", 1856)
        .with("weight", 65.5)
        .with(
            "inventions",
            Value::list(vec![
                Value::from("induction motor"),
                Value::from("radio"),
                Value::from("tesla coil"),
            ]),
        )
        .into_value()
}
