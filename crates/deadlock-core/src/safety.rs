//! Banker's Algorithm safety check.
//!
//! Works on private copies of `available` and the derived need table; the
//! state passed in is never modified.

use serde::Serialize;

use crate::matrix::{Matrix, Units};
use crate::state::SystemState;

/// One completion in a safe-sequence replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SafetyStep {
    pub process: usize,
    /// `work` after the process released its allocation.
    pub work_after: Vec<u64>,
}

/// Outcome of [`check_safety`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SafetyReport {
    pub is_safe: bool,
    /// Completion order found. Covers every process when `is_safe`.
    pub safe_sequence: Vec<usize>,
    /// Processes that could never finish, ascending. Empty when `is_safe`.
    pub unfinished: Vec<usize>,
    pub steps: Vec<SafetyStep>,
}

/// Classify `state` as safe or unsafe.
///
/// Each pass scans processes in ascending id order and finishes every
/// process whose need fits the current `work`, adding its allocation back.
/// Passes repeat until all processes finish or a pass finishes none, so the
/// sequence for a given state is fixed.
#[must_use]
pub fn check_safety(state: &SystemState) -> SafetyReport {
    bankers(state.allocation(), state.max_demand(), state.available())
}

pub(crate) fn bankers(allocation: &Matrix, max_demand: &Matrix, available: &[Units]) -> SafetyReport {
    let processes = allocation.rows();
    let mut work: Vec<u64> = available.iter().map(|&v| u64::from(v)).collect();
    let mut finished = vec![false; processes];
    let mut safe_sequence = Vec::with_capacity(processes);
    let mut steps = Vec::with_capacity(processes);

    while safe_sequence.len() < processes {
        let mut progressed = false;
        for p in 0..processes {
            if finished[p] || !need_fits(allocation.row(p), max_demand.row(p), &work) {
                continue;
            }
            for (w, &held) in work.iter_mut().zip(allocation.row(p)) {
                *w += u64::from(held);
            }
            finished[p] = true;
            safe_sequence.push(p);
            steps.push(SafetyStep {
                process: p,
                work_after: work.clone(),
            });
            progressed = true;
        }
        if !progressed {
            break;
        }
    }

    let unfinished: Vec<usize> = (0..processes).filter(|&p| !finished[p]).collect();
    SafetyReport {
        is_safe: unfinished.is_empty(),
        safe_sequence,
        unfinished,
        steps,
    }
}

/// `max - held <= work` componentwise; a negative need always fits.
fn need_fits(held: &[Units], max: &[Units], work: &[u64]) -> bool {
    held.iter().zip(max).zip(work).all(|((&h, &m), &w)| {
        let need = i64::from(m) - i64::from(h);
        need <= 0 || need.unsigned_abs() <= w
    })
}
