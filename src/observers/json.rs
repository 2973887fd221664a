//! JSON observer for serializing stress runs.
//!
//! This module provides [`JsonObserver`], which serializes run reports and
//! trial summaries to JSON through the [`snapshot`](crate::snapshot) types.
//!
//! # Feature Flag
//!
//! This module requires the `json` feature:
//!
//! ```toml
//! [dependencies]
//! contesa = { version = "0.1", features = ["json"] }
//! ```
//!
//! # Examples
//!
//! ```rust,ignore
//! use contesa::counters::CounterKind;
//! use contesa::driver::StressDriver;
//! use contesa::observers::json::JsonObserver;
//!
//! let reports = StressDriver::new().compare(&CounterKind::ALL)?;
//! let json = JsonObserver::new().to_json(&reports)?;
//!
//! println!("{}", json);
//! // [{"counter":"unsync","kind":"unsync","tasks":1000,...,"elapsed_ns":41200931},...]
//! ```

use std::io::Write;

use crate::driver::{RunReport, TrialSummary};
use crate::observers::Result;
use crate::snapshot::{RunSnapshot, SessionSnapshot, TrialSnapshot};
use serde::Serialize;

/// Configuration for the JSON observer.
#[derive(Debug, Clone, Default)]
pub struct JsonConfig {
    /// Whether to pretty-print the JSON output.
    pub pretty: bool,
    /// Whether to include a timestamp in the output.
    pub include_timestamp: bool,
    /// Whether to wrap runs in a [`SessionSnapshot`] object.
    pub wrap_in_session: bool,
}

/// An observer that serializes runs to JSON format.
///
/// # Examples
///
/// Basic usage (array of runs):
///
/// ```rust
/// use contesa::counters::locked::Locked;
/// use contesa::driver::StressDriver;
/// use contesa::observers::json::JsonObserver;
///
/// let report = StressDriver::new().with_tasks(3).run(&Locked::new()).unwrap();
/// let json = JsonObserver::new().to_json([&report]).unwrap();
///
/// assert!(json.contains(r#""kind":"locked""#));
/// assert!(json.contains(r#""value":3"#));
/// ```
///
/// With session wrapper and timestamp:
///
/// ```rust
/// use contesa::observers::json::JsonObserver;
///
/// let observer = JsonObserver::new()
///     .wrap_in_session(true)
///     .include_timestamp(true);
/// ```
#[derive(Debug, Clone, Default)]
pub struct JsonObserver {
    config: JsonConfig,
}

impl JsonObserver {
    /// Creates a new JSON observer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new JSON observer with the specified configuration.
    pub fn with_config(config: JsonConfig) -> Self {
        Self { config }
    }

    /// Enables or disables pretty-printing.
    pub fn pretty(mut self, enabled: bool) -> Self {
        self.config.pretty = enabled;
        self
    }

    /// Enables or disables timestamp inclusion.
    ///
    /// Only has effect when `wrap_in_session` is also enabled.
    pub fn include_timestamp(mut self, enabled: bool) -> Self {
        self.config.include_timestamp = enabled;
        self
    }

    /// Enables or disables wrapping the output in a [`SessionSnapshot`].
    pub fn wrap_in_session(mut self, enabled: bool) -> Self {
        self.config.wrap_in_session = enabled;
        self
    }

    /// Collects reports into a vector of [`RunSnapshot`].
    pub fn collect<'a>(&self, reports: impl IntoIterator<Item = &'a RunReport>) -> Vec<RunSnapshot> {
        reports.into_iter().map(RunSnapshot::from).collect()
    }

    fn session(&self, runs: Vec<RunSnapshot>, trials: Vec<TrialSnapshot>) -> SessionSnapshot {
        let session = SessionSnapshot::new(runs).with_trials(trials);
        if self.config.include_timestamp {
            session.with_timestamp(current_timestamp_ms())
        } else {
            session
        }
    }

    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        let json = if self.config.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(json)
    }

    /// Serializes reports to a JSON string.
    pub fn to_json<'a>(&self, reports: impl IntoIterator<Item = &'a RunReport>) -> Result<String> {
        let runs = self.collect(reports);

        if self.config.wrap_in_session {
            self.serialize(&self.session(runs, Vec::new()))
        } else {
            self.serialize(&runs)
        }
    }

    /// Serializes trial summaries to a JSON string.
    pub fn trials_to_json<'a>(
        &self,
        summaries: impl IntoIterator<Item = &'a TrialSummary>,
    ) -> Result<String> {
        let trials: Vec<TrialSnapshot> = summaries.into_iter().map(TrialSnapshot::from).collect();

        if self.config.wrap_in_session {
            self.serialize(&self.session(Vec::new(), trials))
        } else {
            self.serialize(&trials)
        }
    }

    /// Writes the reports as JSON to `writer`, followed by a newline.
    pub fn write_to<'a, W: Write>(
        &self,
        writer: &mut W,
        reports: impl IntoIterator<Item = &'a RunReport>,
    ) -> Result<()> {
        let json = self.to_json(reports)?;
        writeln!(writer, "{}", json)?;
        Ok(())
    }
}

/// Returns the current timestamp in milliseconds since Unix epoch.
fn current_timestamp_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
