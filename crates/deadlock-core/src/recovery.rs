//! Deadlock recovery by reclaiming a victim's resources.

use std::fmt;

use serde::Serialize;

use crate::detect::detect;
use crate::matrix::Units;
use crate::state::SystemState;

/// What [`recover`] did to the state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecoveryAction {
    pub victim: usize,
    /// The victim's allocation row before it was zeroed.
    pub released: Vec<Units>,
    pub available_after: Vec<Units>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecoveryOutcome {
    /// No cycle was found; the state was not touched.
    NoDeadlock,
    Recovered(RecoveryAction),
}

impl RecoveryOutcome {
    #[must_use]
    pub fn victim(&self) -> Option<usize> {
        match self {
            Self::NoDeadlock => None,
            Self::Recovered(action) => Some(action.victim),
        }
    }
}

impl fmt::Display for RecoveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDeadlock => f.write_str("No deadlock to recover from."),
            Self::Recovered(action) => write!(f, "Recovered: Terminated P{}", action.victim),
        }
    }
}

/// Process with the smallest total allocation; ties go to the lowest id.
///
/// Every process is a candidate, including ones outside any detected cycle.
/// Returns `None` only for a state with no processes.
#[must_use]
pub fn select_victim(state: &SystemState) -> Option<usize> {
    let allocation = state.allocation();
    (0..state.num_processes()).min_by_key(|&p| (allocation.row_sum(p), p))
}

/// If the state is deadlocked, reclaim every unit held by the victim.
///
/// The victim's requests are left in place and detection is not re-run;
/// callers re-analyse when they need fresh status.
pub fn recover(state: &mut SystemState) -> RecoveryOutcome {
    if !detect(state).has_deadlock {
        return RecoveryOutcome::NoDeadlock;
    }
    let Some(victim) = select_victim(state) else {
        return RecoveryOutcome::NoDeadlock;
    };
    let released = state.release_allocation(victim);
    RecoveryOutcome::Recovered(RecoveryAction {
        victim,
        released,
        available_after: state.available().to_vec(),
    })
}
