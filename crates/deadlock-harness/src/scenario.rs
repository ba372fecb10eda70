//! Scenario files: a state to load plus optional expected outcomes.

use std::path::{Path, PathBuf};

use deadlock_core::{InvariantWarning, SystemState, ToolkitError, Units};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::InvariantPolicy;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Toolkit(#[from] ToolkitError),
    #[error("scenario '{scenario}' exceeds declared maximum demand: {}", join_warnings(.warnings))]
    Invariant {
        scenario: String,
        warnings: Vec<InvariantWarning>,
    },
}

/// A pending request to post after the initial load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEntry {
    pub process: usize,
    pub units: Vec<Units>,
}

/// Expected analysis results. Absent fields are not checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expectation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safe: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safe_sequence: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadlock: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle_count: Option<usize>,
    /// Victim chosen by recovery; `null`/absent when none is expected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub victim: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub version: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub num_processes: usize,
    pub num_resources: usize,
    pub allocation: Vec<Vec<Units>>,
    pub max_demand: Vec<Vec<Units>>,
    pub available: Vec<Units>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requests: Vec<RequestEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect: Option<Expectation>,
}

/// A scenario read from disk with the digest of its source bytes.
#[derive(Debug, Clone)]
pub struct ScenarioFile {
    pub path: PathBuf,
    pub sha256: String,
    pub scenario: Scenario,
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_file(path: &Path) -> Result<ScenarioFile, ScenarioError> {
        let bytes = std::fs::read(path)?;
        let scenario = serde_json::from_slice(&bytes)?;
        Ok(ScenarioFile {
            path: path.to_path_buf(),
            sha256: sha256_hex(&bytes),
            scenario,
        })
    }

    /// Every `*.json` scenario in `dir`, sorted by file name.
    pub fn load_dir(dir: &Path) -> Result<Vec<ScenarioFile>, ScenarioError> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();
        paths.iter().map(|p| Self::from_file(p)).collect()
    }

    /// Construct the state, load it and post every request.
    ///
    /// Returns the invariant warnings found at load; they do not fail the
    /// build.
    pub fn build_state(&self) -> Result<(SystemState, Vec<InvariantWarning>), ScenarioError> {
        let mut state = SystemState::new(self.num_processes, self.num_resources)?;
        let warnings = state.set_initial_state(&self.allocation, &self.max_demand, &self.available)?;
        for request in &self.requests {
            state.set_request(request.process, &request.units)?;
        }
        Ok((state, warnings))
    }

    /// [`Scenario::build_state`], failing under a strict policy when any
    /// warning was found.
    pub fn load_state(
        &self,
        policy: InvariantPolicy,
    ) -> Result<(SystemState, Vec<InvariantWarning>), ScenarioError> {
        let (state, warnings) = self.build_state()?;
        if policy.rejects_warnings() && !warnings.is_empty() {
            return Err(ScenarioError::Invariant {
                scenario: self.name.clone(),
                warnings,
            });
        }
        Ok((state, warnings))
    }
}

fn join_warnings(warnings: &[InvariantWarning]) -> String {
    warnings
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Lower-case hex SHA-256.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
