//! Harness configuration.
//!
//! Read from the environment:
//! - `DEADLOCK_TOOLKIT_MODE`: `lenient` (default) logs allocation-over-maximum
//!   cells and analyses anyway; `strict` rejects such scenarios before any
//!   analysis runs.
//! - `DEADLOCK_TOOLKIT_LOG_LEVEL`: minimum structured-log level written
//!   (default `info`).
//!
//! The CLI `--mode` flag overrides the environment and only accepts the exact
//! policy names.

use clap::ValueEnum;

use crate::structured_log::LogLevel;

pub const MODE_ENV: &str = "DEADLOCK_TOOLKIT_MODE";
pub const LOG_LEVEL_ENV: &str = "DEADLOCK_TOOLKIT_LOG_LEVEL";

/// How invariant warnings found at load are treated.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum InvariantPolicy {
    /// Log each warning and continue.
    #[default]
    Lenient,
    /// Fail the scenario on the first warning.
    Strict,
}

impl InvariantPolicy {
    /// Parse from string (case-insensitive). Unknown values fall back to
    /// `Lenient`.
    #[must_use]
    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" | "reject" | "deny" => Self::Strict,
            _ => Self::Lenient,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lenient => "lenient",
            Self::Strict => "strict",
        }
    }

    #[must_use]
    pub const fn rejects_warnings(self) -> bool {
        matches!(self, Self::Strict)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarnessConfig {
    pub policy: InvariantPolicy,
    pub min_log_level: LogLevel,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            policy: InvariantPolicy::default(),
            min_log_level: LogLevel::Info,
        }
    }
}

impl HarnessConfig {
    /// Resolve from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve through an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            policy: lookup(MODE_ENV)
                .map(|v| InvariantPolicy::from_str_loose(&v))
                .unwrap_or(defaults.policy),
            min_log_level: lookup(LOG_LEVEL_ENV)
                .and_then(|v| LogLevel::from_str_loose(&v))
                .unwrap_or(defaults.min_log_level),
        }
    }

    /// Override the policy when a CLI flag was given.
    #[must_use]
    pub fn with_mode(mut self, mode: Option<InvariantPolicy>) -> Self {
        if let Some(mode) = mode {
            self.policy = mode;
        }
        self
    }
}
