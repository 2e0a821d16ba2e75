//! Unit tests for bytecode_system

mod test_codeflow;
mod test_optimizer;
