//! Scenario execution engine.

use std::io::Write;
use std::time::Instant;

use crate::config::HarnessConfig;
use crate::report::AnalysisReport;
use crate::scenario::{ScenarioError, ScenarioFile};
use crate::structured_log::{LogEmitter, LogLevel, Outcome};
use crate::verify::{VerificationResult, VerificationSummary, check_field};

/// Runs scenarios under one configuration, logging as it goes.
pub struct ScenarioRunner {
    pub config: HarnessConfig,
}

impl ScenarioRunner {
    #[must_use]
    pub fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    /// Load the scenario, analyse it and optionally recover.
    pub fn analyze<W: Write>(
        &self,
        file: &ScenarioFile,
        attempt_recovery: bool,
        log: &mut LogEmitter<W>,
    ) -> Result<AnalysisReport, ScenarioError> {
        let scenario = &file.scenario;
        let mode = self.config.policy.as_str();
        let started = Instant::now();

        let (mut state, warnings) = match scenario.load_state(self.config.policy) {
            Ok(loaded) => loaded,
            Err(err) => {
                let entry = log
                    .entry(LogLevel::Error, "scenario_rejected")
                    .with_scenario(&scenario.name)
                    .with_mode(mode)
                    .with_details(serde_json::json!({ "error": err.to_string() }));
                log.emit_entry(entry)?;
                return Err(err);
            }
        };

        let entry = log
            .entry(LogLevel::Info, "scenario_loaded")
            .with_scenario(&scenario.name)
            .with_mode(mode)
            .with_details(serde_json::json!({
                "path": file.path.display().to_string(),
                "sha256": file.sha256,
                "num_processes": scenario.num_processes,
                "num_resources": scenario.num_resources,
                "requests": scenario.requests.len(),
            }));
        log.emit_entry(entry)?;

        for warning in &warnings {
            let entry = log
                .entry(LogLevel::Warn, "invariant_warning")
                .with_scenario(&scenario.name)
                .with_mode(mode)
                .with_process(warning.process)
                .with_details(serde_json::json!({
                    "resource": warning.resource,
                    "allocation": warning.allocation,
                    "max_demand": warning.max_demand,
                }));
            log.emit_entry(entry)?;
        }

        let report = AnalysisReport::build(
            scenario.name.clone(),
            self.config.policy,
            &mut state,
            warnings,
            attempt_recovery,
        )
        .with_sha256(file.sha256.clone());

        let entry = log
            .entry(LogLevel::Info, "safety_checked")
            .with_scenario(&scenario.name)
            .with_details(serde_json::json!({
                "is_safe": report.safety.is_safe,
                "safe_sequence": report.safety.safe_sequence,
                "unfinished": report.safety.unfinished,
            }));
        log.emit_entry(entry)?;

        let level = if report.deadlock.has_deadlock {
            LogLevel::Warn
        } else {
            LogLevel::Info
        };
        let entry = log
            .entry(level, "deadlock_checked")
            .with_scenario(&scenario.name)
            .with_details(serde_json::json!({
                "has_deadlock": report.deadlock.has_deadlock,
                "cycles": report.deadlock.cycles.len(),
                "processes_in_cycles": report.deadlock.processes_in_cycles,
            }));
        log.emit_entry(entry)?;

        if let Some(victim) = report.recovery.as_ref().and_then(|r| r.victim()) {
            let entry = log
                .entry(LogLevel::Info, "recovery_applied")
                .with_scenario(&scenario.name)
                .with_process(victim)
                .with_details(serde_json::json!({
                    "available_after": report.state.available,
                    "deadlock_remaining": report
                        .after_recovery
                        .as_ref()
                        .is_some_and(|d| d.has_deadlock),
                }));
            log.emit_entry(entry)?;
        }

        let elapsed = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        let entry = log
            .entry(LogLevel::Debug, "scenario_analyzed")
            .with_scenario(&scenario.name)
            .with_duration_us(elapsed);
        log.emit_entry(entry)?;
        Ok(report)
    }

    /// Analyse (with recovery) and compare against the scenario's `expect`.
    ///
    /// Load, analysis and log-write failures all come back as an errored
    /// result for this scenario.
    pub fn verify<W: Write>(
        &self,
        file: &ScenarioFile,
        log: &mut LogEmitter<W>,
    ) -> VerificationResult {
        let name = file.scenario.name.clone();
        let mut result = match self.analyze(file, true, log) {
            Ok(report) => {
                let expect = file.scenario.expect.clone().unwrap_or_default();
                let mut mismatches = Vec::new();
                check_field(&mut mismatches, "safe", expect.safe.as_ref(), &report.safety.is_safe);
                check_field(
                    &mut mismatches,
                    "safe_sequence",
                    expect.safe_sequence.as_ref(),
                    &report.safety.safe_sequence,
                );
                check_field(
                    &mut mismatches,
                    "deadlock",
                    expect.deadlock.as_ref(),
                    &report.deadlock.has_deadlock,
                );
                check_field(
                    &mut mismatches,
                    "cycle_count",
                    expect.cycle_count.as_ref(),
                    &report.deadlock.cycles.len(),
                );
                let victim = report.recovery.as_ref().and_then(|r| r.victim());
                check_field(
                    &mut mismatches,
                    "victim",
                    expect.victim.map(Some).as_ref(),
                    &victim,
                );
                VerificationResult::from_mismatches(name.clone(), mismatches)
            }
            Err(err) => VerificationResult::errored(name.clone(), err.to_string()),
        };

        let outcome = if result.passed {
            Outcome::Pass
        } else if result.error.is_some() {
            Outcome::Error
        } else {
            Outcome::Fail
        };
        let entry = log
            .entry(LogLevel::Info, "scenario_verified")
            .with_scenario(&name)
            .with_outcome(outcome)
            .with_details(serde_json::json!({ "mismatches": result.mismatches }));
        if let Err(err) = log.emit_entry(entry)
            && result.error.is_none()
        {
            result = VerificationResult::errored(name, format!("log write failed: {err}"));
        }
        result
    }

    /// Verify every scenario and aggregate.
    pub fn verify_all<W: Write>(
        &self,
        files: &[ScenarioFile],
        log: &mut LogEmitter<W>,
    ) -> VerificationSummary {
        let results = files.iter().map(|file| self.verify(file, log)).collect();
        VerificationSummary::from_results(results)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::InvariantPolicy;
    use crate::scenario::Scenario;
    use crate::structured_log::validate_log_line;

    fn file(json: &str) -> ScenarioFile {
        ScenarioFile {
            path: PathBuf::from("inline.json"),
            sha256: crate::scenario::sha256_hex(json.as_bytes()),
            scenario: Scenario::from_json(json).unwrap(),
        }
    }

    const CYCLE: &str = r#"{
        "version": "v1", "name": "cycle",
        "num_processes": 2, "num_resources": 2,
        "allocation": [[1, 0], [0, 1]], "max_demand": [[1, 1], [1, 1]], "available": [0, 0],
        "requests": [{"process": 0, "units": [0, 1]}, {"process": 1, "units": [1, 0]}],
        "expect": {"safe": false, "deadlock": true, "cycle_count": 1, "victim": 0}
    }"#;

    const OVER_MAX: &str = r#"{
        "version": "v1", "name": "over_max",
        "num_processes": 1, "num_resources": 1,
        "allocation": [[2]], "max_demand": [[1]], "available": [0],
        "expect": {"safe": true, "deadlock": false}
    }"#;

    #[test]
    fn passing_scenario_logs_valid_jsonl() {
        let runner = ScenarioRunner::new(HarnessConfig::default());
        let mut log = LogEmitter::to_buffer("harness", "test");
        let result = runner.verify(&file(CYCLE), &mut log);
        assert!(result.passed, "{:?}", result.mismatches);

        let out = log.contents();
        let events: Vec<String> = out
            .lines()
            .enumerate()
            .map(|(i, line)| validate_log_line(line, i + 1).unwrap().event)
            .collect();
        assert_eq!(
            events,
            vec![
                "scenario_loaded",
                "safety_checked",
                "deadlock_checked",
                "recovery_applied",
                "scenario_analyzed",
                "scenario_verified",
            ]
        );
    }

    #[test]
    fn mismatches_are_reported() {
        let json = CYCLE.replace("\"victim\": 0", "\"victim\": 1");
        let runner = ScenarioRunner::new(HarnessConfig::default());
        let mut log = LogEmitter::to_buffer("harness", "test");
        let result = runner.verify(&file(&json), &mut log);
        assert!(!result.passed);
        assert_eq!(
            result.mismatches,
            vec!["victim: expected Some(1), got Some(0)".to_string()]
        );
    }

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn log_write_failure_errors_each_scenario_without_aborting() {
        let runner = ScenarioRunner::new(HarnessConfig::default());
        let mut log = LogEmitter::new(BrokenSink, "harness", "test");
        assert!(runner.analyze(&file(CYCLE), true, &mut log).is_err());

        let files = [file(CYCLE), file(OVER_MAX)];
        let summary = runner.verify_all(&files, &mut log);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.failed, 2);
        for result in &summary.results {
            assert!(!result.passed);
            assert!(result.error.as_deref().is_some_and(|e| e.contains("disk full")));
        }
    }

    #[test]
    fn lenient_mode_warns_and_continues() {
        let runner = ScenarioRunner::new(HarnessConfig::default());
        let mut log = LogEmitter::to_buffer("harness", "test");
        let result = runner.verify(&file(OVER_MAX), &mut log);
        assert!(result.passed);
        assert!(log.contents().contains("\"event\":\"invariant_warning\""));
    }

    #[test]
    fn strict_mode_rejects_before_analysis() {
        let config = HarnessConfig {
            policy: InvariantPolicy::Strict,
            ..HarnessConfig::default()
        };
        let runner = ScenarioRunner::new(config);
        let mut log = LogEmitter::to_buffer("harness", "test");
        let result = runner.verify(&file(OVER_MAX), &mut log);
        assert!(!result.passed);
        assert!(result.error.unwrap().contains("exceeds declared maximum demand"));
        let out = log.contents();
        assert!(out.contains("\"event\":\"scenario_rejected\""));
        assert!(!out.contains("\"event\":\"safety_checked\""));
    }
}
