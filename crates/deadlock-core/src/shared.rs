//! Lock-guarded state for callers that share one [`SystemState`].
//!
//! Every method holds the lock for its whole body, so an analysis never sees
//! `available` updated without the matching `allocation` change.

use parking_lot::Mutex;

use crate::detect::{DeadlockReport, detect};
use crate::error::{InvariantWarning, ToolkitError};
use crate::matrix::Units;
use crate::recovery::{RecoveryOutcome, recover};
use crate::safety::{SafetyReport, check_safety};
use crate::state::SystemState;

pub struct SharedState {
    inner: Mutex<SystemState>,
}

impl SharedState {
    #[must_use]
    pub fn new(state: SystemState) -> Self {
        Self {
            inner: Mutex::new(state),
        }
    }

    pub fn load(
        &self,
        allocation: &[Vec<Units>],
        max_demand: &[Vec<Units>],
        available: &[Units],
    ) -> Result<Vec<InvariantWarning>, ToolkitError> {
        self.inner
            .lock()
            .set_initial_state(allocation, max_demand, available)
    }

    pub fn post_request(&self, process: usize, units: &[Units]) -> Result<(), ToolkitError> {
        self.inner.lock().set_request(process, units)
    }

    #[must_use]
    pub fn check_safety(&self) -> SafetyReport {
        check_safety(&self.inner.lock())
    }

    #[must_use]
    pub fn detect(&self) -> DeadlockReport {
        detect(&self.inner.lock())
    }

    pub fn recover(&self) -> RecoveryOutcome {
        recover(&mut self.inner.lock())
    }

    /// Clone of the current state.
    #[must_use]
    pub fn snapshot(&self) -> SystemState {
        self.inner.lock().clone()
    }

    /// Run `f` with exclusive access, for "mutate then analyse" sequences.
    pub fn transact<T>(&self, f: impl FnOnce(&mut SystemState) -> T) -> T {
        f(&mut *self.inner.lock())
    }

    pub fn into_inner(self) -> SystemState {
        self.inner.into_inner()
    }
}
