//! System state machine.
//!
//! Four states, two of them absorbing. Transitions are a total function
//! from `(state, hazard)` so the absorbing invariant holds by
//! construction: once the supervisor is in FAILSAFE or EMERGENCY_DESCENT
//! there is no path back to NORMAL or WARNING within a power cycle, and
//! the only edge out of FAILSAFE is the descent escalation.

use crate::frame::SensorFrame;
use crate::hazard::Hazard;

/// Supervisor state.
///
/// Boot state is [`Normal`](Self::Normal) with the latch commanded LOCKED
/// and descent DISABLED. [`Warning`](Self::Warning) is reserved for soft
/// alerts; the current core never enters it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SystemState {
    /// All checks passing; harness retained.
    Normal,
    /// Soft-alert state, reserved for future use.
    Warning,
    /// Defensive absorbing state: latch released, descent untouched.
    Failsafe {
        /// Hazard that caused entry.
        cause: Hazard,
    },
    /// Escalated absorbing state: latch released, descent enabled.
    EmergencyDescent {
        /// Primary frame that triggered the escalation.
        trigger: SensorFrame,
    },
}

impl SystemState {
    /// Total transition function.
    ///
    /// `frame` is the iteration's primary frame, retained by the
    /// EMERGENCY_DESCENT variant when a sudden drop escalates.
    #[must_use]
    pub fn on_hazard(self, hazard: Hazard, frame: &SensorFrame) -> Self {
        match (self, hazard) {
            // EMERGENCY_DESCENT has no outgoing edges.
            (state @ Self::EmergencyDescent { .. }, _) => state,
            // A sudden drop escalates from any other state.
            (_, Hazard::SuddenDrop) => Self::EmergencyDescent { trigger: *frame },
            // FAILSAFE absorbs everything but the drop escalation,
            // retaining the hazard that caused entry.
            (state @ Self::Failsafe { .. }, _) => state,
            (_, hazard) => Self::Failsafe { cause: hazard },
        }
    }

    /// True for states with no path back to NORMAL within a power cycle.
    #[inline]
    pub const fn is_absorbing(&self) -> bool {
        matches!(self, Self::Failsafe { .. } | Self::EmergencyDescent { .. })
    }

    /// Display label used in diagnostics.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Warning => "WARNING",
            Self::Failsafe { .. } => "FAILSAFE",
            Self::EmergencyDescent { .. } => "EMERGENCY_DESCENT",
        }
    }
}

impl Default for SystemState {
    fn default() -> Self {
        Self::Normal
    }
}
