//! Per-roll handles, states, and outcomes.

use tokio::sync::oneshot;

use super::DiceType;

/// Identifies one requested roll for its whole lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RollHandle(pub u64);

impl std::fmt::Display for RollHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of an active roll. Transitions only move forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum RollState {
    Rolling,
    Settled,
    Resolved,
}

impl RollState {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(self, next: RollState) -> bool {
        matches!(
            (self, next),
            (RollState::Rolling, RollState::Settled) | (RollState::Settled, RollState::Resolved)
        )
    }
}

/// Which policy produced a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolutionPolicy {
    Geometric,
    Statistical,
}

/// The value delivered once per resolved die.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RollOutcome {
    pub handle: RollHandle,
    pub die_type: DiceType,
    pub value: u32,
    pub policy: ResolutionPolicy,
    /// True when the maximum roll duration forced the resolution.
    pub forced: bool,
    /// Ticks spent in flight, including the resolving tick.
    pub ticks: u32,
}

/// Returned by a successful roll request. The receiver yields the outcome
/// exactly once, or reports closure when the roll is cancelled.
#[derive(Debug)]
pub struct RollTicket {
    pub handle: RollHandle,
    pub receiver: oneshot::Receiver<RollOutcome>,
}

impl RollTicket {
    /// Non-blocking poll for the outcome.
    pub fn try_outcome(&mut self) -> Option<RollOutcome> {
        self.receiver.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roll_state_is_monotonic() {
        assert!(RollState::Rolling.can_advance_to(RollState::Settled));
        assert!(RollState::Settled.can_advance_to(RollState::Resolved));
        assert!(!RollState::Rolling.can_advance_to(RollState::Resolved));
        assert!(!RollState::Settled.can_advance_to(RollState::Rolling));
        assert!(!RollState::Resolved.can_advance_to(RollState::Rolling));
        assert!(!RollState::Resolved.can_advance_to(RollState::Settled));
    }

    #[test]
    fn test_roll_handle_display() {
        assert_eq!(RollHandle(7).to_string(), "#7");
    }
}
