//! Report generation for analysis results.

use deadlock_core::{
    DeadlockReport, InvariantWarning, Matrix, RecoveryOutcome, SafetyReport, SystemState, Units,
    check_safety, detect, recover,
};
use serde::Serialize;

use crate::config::InvariantPolicy;

/// Available units and the allocation/request tables at report time.
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub available: Vec<Units>,
    pub allocation: Matrix,
    pub request: Matrix,
}

impl StateSnapshot {
    #[must_use]
    pub fn of(state: &SystemState) -> Self {
        Self {
            available: state.available().to_vec(),
            allocation: state.allocation().clone(),
            request: state.request().clone(),
        }
    }
}

/// Safety, detection and (optionally) recovery results for one scenario.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub scenario: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    pub mode: String,
    pub warnings: Vec<InvariantWarning>,
    pub safety: SafetyReport,
    pub deadlock: DeadlockReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery: Option<RecoveryOutcome>,
    /// Detection re-run after a recovery that changed the state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_recovery: Option<DeadlockReport>,
    pub state: StateSnapshot,
}

impl AnalysisReport {
    /// Analyse `state`, recovering first-found deadlocks when `attempt_recovery`
    /// is set. The snapshot reflects the state after any recovery.
    pub fn build(
        scenario: impl Into<String>,
        policy: InvariantPolicy,
        state: &mut SystemState,
        warnings: Vec<InvariantWarning>,
        attempt_recovery: bool,
    ) -> Self {
        let safety = check_safety(state);
        let deadlock = detect(state);
        let (recovery, after_recovery) = if attempt_recovery {
            let outcome = recover(state);
            let after = outcome.victim().map(|_| detect(state));
            (Some(outcome), after)
        } else {
            (None, None)
        };
        Self {
            scenario: scenario.into(),
            sha256: None,
            mode: policy.as_str().to_string(),
            warnings,
            safety,
            deadlock,
            recovery,
            after_recovery,
            state: StateSnapshot::of(state),
        }
    }

    #[must_use]
    pub fn with_sha256(mut self, sha256: impl Into<String>) -> Self {
        self.sha256 = Some(sha256.into());
        self
    }

    /// Render the report as markdown.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("# Analysis: {}\n\n", self.scenario));
        if let Some(sha) = &self.sha256 {
            out.push_str(&format!("- Source SHA-256: `{sha}`\n"));
        }
        out.push_str(&format!("- Mode: {}\n", self.mode));
        out.push_str(&format!("- Invariant warnings: {}\n\n", self.warnings.len()));
        for w in &self.warnings {
            out.push_str(&format!("  - {w}\n"));
        }
        if !self.warnings.is_empty() {
            out.push('\n');
        }

        out.push_str("## Safety\n\n");
        if self.safety.is_safe {
            out.push_str(&format!(
                "System is safe. Safe sequence: {}\n\n",
                process_list(&self.safety.safe_sequence)
            ));
        } else {
            out.push_str(&format!(
                "System is unsafe: no safe sequence exists. Never finish: {}\n\n",
                process_list(&self.safety.unfinished)
            ));
        }

        out.push_str("## Deadlock detection\n\n");
        push_detection(&mut out, &self.deadlock);

        if let Some(recovery) = &self.recovery {
            out.push_str("## Recovery\n\n");
            out.push_str(&format!("{recovery}\n\n"));
            if let Some(after) = &self.after_recovery {
                out.push_str("After recovery: ");
                push_detection(&mut out, after);
            }
        }

        out.push_str("## State\n\n");
        out.push_str(&format!("Available: {:?}\n\n", self.state.available));
        out.push_str("| Process | Allocation | Request |\n");
        out.push_str("|---------|------------|---------|\n");
        for (p, (alloc, req)) in self
            .state
            .allocation
            .iter_rows()
            .zip(self.state.request.iter_rows())
            .enumerate()
        {
            out.push_str(&format!("| P{p} | {alloc:?} | {req:?} |\n"));
        }
        out
    }

    /// Render the report as JSON.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }
}

fn push_detection(out: &mut String, report: &DeadlockReport) {
    if !report.has_deadlock {
        out.push_str("No cycles detected.\n\n");
        return;
    }
    out.push_str(&format!(
        "Deadlock detected: {} cycle(s).\n\n",
        report.cycles.len()
    ));
    for cycle in &report.cycles {
        let path: Vec<String> = cycle.iter().map(ToString::to_string).collect();
        out.push_str(&format!("- {}\n", path.join(" -> ")));
    }
    out.push('\n');
}

fn process_list(ids: &[usize]) -> String {
    let names: Vec<String> = ids.iter().map(|p| format!("P{p}")).collect();
    format!("[{}]", names.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deadlocked() -> SystemState {
        let mut state = SystemState::new(2, 2).unwrap();
        state
            .set_initial_state(&[vec![1, 0], vec![0, 1]], &[vec![1, 1], vec![1, 1]], &[0, 0])
            .unwrap();
        state.set_request(0, &[0, 1]).unwrap();
        state.set_request(1, &[1, 0]).unwrap();
        state
    }

    #[test]
    fn markdown_includes_cycles_and_recovery() {
        let mut state = deadlocked();
        let report = AnalysisReport::build("cycle", InvariantPolicy::Lenient, &mut state, Vec::new(), true)
            .with_sha256("abc");
        let md = report.to_markdown();
        assert!(md.contains("# Analysis: cycle"));
        assert!(md.contains("- Source SHA-256: `abc`"));
        assert!(md.contains("- P0 -> R1 -> P1 -> R0"));
        assert!(md.contains("Recovered: Terminated P0"));
        assert!(md.contains("After recovery: No cycles detected."));
        assert!(md.contains("| P0 | [0, 0] | [0, 1] |"));
    }

    #[test]
    fn without_recovery_state_is_untouched() {
        let mut state = deadlocked();
        let before = state.clone();
        let report = AnalysisReport::build("cycle", InvariantPolicy::Strict, &mut state, Vec::new(), false);
        assert_eq!(state, before);
        assert!(report.recovery.is_none());
        assert_eq!(report.mode, "strict");
    }

    #[test]
    fn json_is_structured() {
        let mut state = deadlocked();
        let report = AnalysisReport::build("cycle", InvariantPolicy::Lenient, &mut state, Vec::new(), true);
        let value: serde_json::Value = serde_json::from_str(&report.to_json()).unwrap();
        assert_eq!(value["deadlock"]["has_deadlock"], true);
        assert_eq!(value["deadlock"]["cycles"][0][0], "P0");
        assert_eq!(value["recovery"]["kind"], "recovered");
        assert_eq!(value["recovery"]["victim"], 0);
        assert_eq!(value["state"]["available"], serde_json::json!([1, 0]));
        assert!(value.get("sha256").is_none());
    }

    #[test]
    fn unsafe_markdown_lists_stuck_processes() {
        let mut state = SystemState::new(2, 1).unwrap();
        state
            .set_initial_state(&[vec![0], vec![0]], &[vec![2], vec![3]], &[1])
            .unwrap();
        let report = AnalysisReport::build("stuck", InvariantPolicy::Lenient, &mut state, Vec::new(), false);
        assert!(report
            .to_markdown()
            .contains("System is unsafe: no safe sequence exists. Never finish: [P0, P1]"));
    }
}
