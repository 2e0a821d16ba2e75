//! Compilation state of an expression

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Where an expression is in its compilation lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CompilationState {
    /// Parsed, never evaluated
    Parsed = 0,
    /// Every evaluation walks the tree
    Interpreting = 1,
    /// A compilation is in progress
    CompilationAttempted = 2,
    /// A compiled unit exists and is preferred
    Compiled = 3,
    /// Compilation failed or the unit was disqualified; tree-walking for good
    InterpretingFallback = 4,
}

impl CompilationState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => CompilationState::Parsed,
            1 => CompilationState::Interpreting,
            2 => CompilationState::CompilationAttempted,
            3 => CompilationState::Compiled,
            _ => CompilationState::InterpretingFallback,
        }
    }

    /// Whether no further compilation will be attempted automatically
    pub fn is_final(self) -> bool {
        matches!(
            self,
            CompilationState::Compiled | CompilationState::InterpretingFallback
        )
    }
}

impl fmt::Display for CompilationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompilationState::Parsed => "parsed",
            CompilationState::Interpreting => "interpreting",
            CompilationState::CompilationAttempted => "compilation attempted",
            CompilationState::Compiled => "compiled",
            CompilationState::InterpretingFallback => "interpreting (fallback)",
        };
        f.write_str(name)
    }
}

/// Atomic cell holding a [`CompilationState`]
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(CompilationState::Parsed as u8))
    }

    pub(crate) fn get(&self) -> CompilationState {
        CompilationState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, state: CompilationState) {
        self.0.store(state as u8, Ordering::Release);
    }

    /// Move from `from` to `to`; false if the state was something else
    pub(crate) fn transition(&self, from: CompilationState, to: CompilationState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        let cell = StateCell::new();
        assert_eq!(cell.get(), CompilationState::Parsed);
        assert!(cell.transition(CompilationState::Parsed, CompilationState::Interpreting));
        assert!(!cell.transition(CompilationState::Parsed, CompilationState::Interpreting));
        cell.set(CompilationState::InterpretingFallback);
        assert!(cell.get().is_final());
        assert_eq!(cell.get().to_string(), "interpreting (fallback)");
    }

    #[test]
    fn test_round_trip_through_raw() {
        for state in [
            CompilationState::Parsed,
            CompilationState::Interpreting,
            CompilationState::CompilationAttempted,
            CompilationState::Compiled,
            CompilationState::InterpretingFallback,
        ] {
            assert_eq!(CompilationState::from_u8(state as u8), state);
        }
    }
}
