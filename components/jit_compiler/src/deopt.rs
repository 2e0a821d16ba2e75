//! Deoptimization tracking
//!
//! Records compiled-code failures that invalidate a unit's assumptions and
//! decides when the unit must be abandoned for interpretation.

use crate::compiled_unit::UnitFailure;
use parking_lot::Mutex;

/// Reason for deoptimization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeoptReason {
    /// A value did not have the type baked into the code
    Coercion,
    /// The code reached a state verification should have excluded
    InvalidState,
}

/// Information about a deoptimization event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeoptInfo {
    /// Reason for deoptimization
    pub reason: DeoptReason,
    /// Instruction offset of the failure
    pub offset: usize,
    /// Failure description
    pub detail: String,
}

impl DeoptInfo {
    /// Deopt info for a failure, `None` when the failure is an ordinary
    /// evaluation error that interpretation would raise as well
    pub fn from_failure(failure: &UnitFailure) -> Option<Self> {
        let (reason, offset) = match failure {
            UnitFailure::Coercion { offset, .. } => (DeoptReason::Coercion, *offset),
            UnitFailure::InvalidState { offset, .. } => (DeoptReason::InvalidState, *offset),
            UnitFailure::Evaluation(_) => return None,
        };
        Some(Self {
            reason,
            offset,
            detail: failure.to_string(),
        })
    }
}

/// Deoptimizer for one compiled expression.
///
/// Shared between evaluating threads; once the limit is reached the
/// expression stops using compiled code for good.
#[derive(Debug)]
pub struct Deoptimizer {
    /// History of deoptimizations
    deopt_history: Mutex<Vec<DeoptInfo>>,
    /// Number of deoptimizations before compiled code is abandoned
    max_deopt_count: usize,
}

impl Deoptimizer {
    /// Deoptimizer that gives up after the first failure
    pub fn new() -> Self {
        Self::with_max_count(1)
    }

    /// Create deoptimizer with custom max deopt count
    pub fn with_max_count(max_count: usize) -> Self {
        Self {
            deopt_history: Mutex::new(Vec::new()),
            max_deopt_count: max_count.max(1),
        }
    }

    /// Record a failure of compiled code.
    ///
    /// Returns whether compiled code must be abandoned. Evaluation errors
    /// are not recorded and never abandon the code.
    pub fn record(&self, expression: &str, failure: &UnitFailure) -> bool {
        let Some(info) = DeoptInfo::from_failure(failure) else {
            return false;
        };
        tracing::warn!(
            expression,
            reason = ?info.reason,
            offset = info.offset,
            detail = %info.detail,
            "compiled expression failed, falling back to interpretation"
        );
        let mut history = self.deopt_history.lock();
        history.push(info);
        history.len() >= self.max_deopt_count
    }

    /// Check if too many deoptimizations have occurred
    pub fn should_disable_optimization(&self) -> bool {
        self.deopt_history.lock().len() >= self.max_deopt_count
    }

    /// Get the deoptimization count
    pub fn deopt_count(&self) -> usize {
        self.deopt_history.lock().len()
    }

    /// Copy of the deoptimization history
    pub fn history(&self) -> Vec<DeoptInfo> {
        self.deopt_history.lock().clone()
    }
}

impl Default for Deoptimizer {
    fn default() -> Self {
        Self::new()
    }
}
