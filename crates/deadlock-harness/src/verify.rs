//! Expectation checking and aggregation.

use serde::{Deserialize, Serialize};

/// Result of checking one scenario's expectations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    pub scenario: String,
    pub passed: bool,
    /// One line per failed check; empty when `passed`.
    pub mismatches: Vec<String>,
    /// Set when the scenario could not be loaded at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerificationResult {
    #[must_use]
    pub fn from_mismatches(scenario: impl Into<String>, mismatches: Vec<String>) -> Self {
        Self {
            scenario: scenario.into(),
            passed: mismatches.is_empty(),
            mismatches,
            error: None,
        }
    }

    #[must_use]
    pub fn errored(scenario: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            scenario: scenario.into(),
            passed: false,
            mismatches: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// Aggregate verification summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub results: Vec<VerificationResult>,
}

impl VerificationSummary {
    #[must_use]
    pub fn from_results(results: Vec<VerificationResult>) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.passed).count();
        Self {
            total,
            passed,
            failed: total - passed,
            results,
        }
    }

    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Render as a markdown table.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# Scenario verification\n\n");
        out.push_str(&format!("- Total: {}\n", self.total));
        out.push_str(&format!("- Passed: {}\n", self.passed));
        out.push_str(&format!("- Failed: {}\n\n", self.failed));
        out.push_str("| Scenario | Status | Notes |\n");
        out.push_str("|----------|--------|-------|\n");
        for r in &self.results {
            let status = if r.passed { "PASS" } else { "FAIL" };
            let notes = match &r.error {
                Some(err) => err.clone(),
                None => r.mismatches.join("; "),
            };
            out.push_str(&format!("| {} | {} | {} |\n", r.scenario, status, notes));
        }
        out
    }
}

/// Record a mismatch when `expected` is set and differs from `actual`.
pub(crate) fn check_field<T: PartialEq + std::fmt::Debug>(
    mismatches: &mut Vec<String>,
    field: &str,
    expected: Option<&T>,
    actual: &T,
) {
    if let Some(expected) = expected
        && expected != actual
    {
        mismatches.push(format!("{field}: expected {expected:?}, got {actual:?}"));
    }
}
