//! Snapshot types for serializing stress-run results.
//!
//! This module provides serializable images of
//! [`RunReport`](crate::driver::RunReport) and
//! [`TrialSummary`](crate::driver::TrialSummary). Durations are flattened to
//! nanoseconds so every serde format can carry them.
//!
//! # Feature Flag
//!
//! This module requires the `serde` feature:
//!
//! ```toml
//! [dependencies]
//! contesa = { version = "0.1", features = ["serde"] }
//! ```
//!
//! # Examples
//!
//! ```rust,ignore
//! use contesa::counters::atomic::Atomic;
//! use contesa::driver::StressDriver;
//! use contesa::snapshot::RunSnapshot;
//!
//! let report = StressDriver::new().run(&Atomic::new())?;
//! let snapshot = RunSnapshot::from(&report);
//!
//! // Serialize with any serde-compatible format
//! let json = serde_json::to_string(&snapshot)?;
//! ```

use crate::counters::CounterKind;
use crate::driver::{RunReport, TrialSummary};
use serde::{Deserialize, Serialize};

/// A serializable image of one stress run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSnapshot {
    /// Label of the counter under test.
    pub counter: String,
    /// Variant of the counter under test.
    pub kind: CounterKind,
    /// Number of tasks launched.
    pub tasks: usize,
    /// Increments performed by each task.
    pub increments_per_task: usize,
    /// Total increments issued.
    pub expected: i64,
    /// Value read after every task completed.
    pub value: i64,
    /// Increments missing from `value`.
    pub lost: i64,
    /// Elapsed time in nanoseconds.
    pub elapsed_ns: u64,
}

impl From<&RunReport> for RunSnapshot {
    fn from(report: &RunReport) -> Self {
        Self {
            counter: report.counter.clone(),
            kind: report.kind,
            tasks: report.tasks,
            increments_per_task: report.increments_per_task,
            expected: report.expected,
            value: report.value,
            lost: report.lost_updates(),
            elapsed_ns: duration_ns(report.elapsed),
        }
    }
}

/// A serializable image of a trial series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrialSnapshot {
    /// Label of the counters under test.
    pub counter: String,
    /// Variant of the counters under test.
    pub kind: CounterKind,
    /// Number of runs aggregated.
    pub trials: usize,
    /// Increments issued per run.
    pub expected: i64,
    /// Runs whose final value matched `expected`.
    pub exact_runs: usize,
    /// Lowest final value observed.
    pub min_value: i64,
    /// Highest final value observed.
    pub max_value: i64,
    /// Shortest run in nanoseconds.
    pub fastest_ns: u64,
    /// Longest run in nanoseconds.
    pub slowest_ns: u64,
    /// Mean run in nanoseconds.
    pub mean_ns: u64,
}

impl From<&TrialSummary> for TrialSnapshot {
    fn from(summary: &TrialSummary) -> Self {
        Self {
            counter: summary.counter.clone(),
            kind: summary.kind,
            trials: summary.trials,
            expected: summary.expected,
            exact_runs: summary.exact_runs,
            min_value: summary.min_value,
            max_value: summary.max_value,
            fastest_ns: duration_ns(summary.fastest),
            slowest_ns: duration_ns(summary.slowest),
            mean_ns: duration_ns(summary.mean_elapsed()),
        }
    }
}

/// A collection of run and trial snapshots, typically one invocation of the
/// harness.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionSnapshot {
    /// Optional timestamp in milliseconds since Unix epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<u64>,
    /// Single-run snapshots.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub runs: Vec<RunSnapshot>,
    /// Trial-series snapshots.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trials: Vec<TrialSnapshot>,
}

impl SessionSnapshot {
    /// Creates a session from the given runs.
    pub fn new(runs: Vec<RunSnapshot>) -> Self {
        Self {
            runs,
            ..Self::default()
        }
    }

    /// Sets the timestamp, returning `self` for method chaining.
    pub fn with_timestamp(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = Some(timestamp_ms);
        self
    }

    /// Sets the trial snapshots, returning `self` for method chaining.
    pub fn with_trials(mut self, trials: Vec<TrialSnapshot>) -> Self {
        self.trials = trials;
        self
    }

    /// Finds a run by counter label.
    pub fn get(&self, counter: &str) -> Option<&RunSnapshot> {
        self.runs.iter().find(|r| r.counter == counter)
    }

    /// Collects snapshots from an iterator of reports.
    pub fn collect<'a>(reports: impl IntoIterator<Item = &'a RunReport>) -> Self {
        Self::new(reports.into_iter().map(RunSnapshot::from).collect())
    }
}

/// Converts a duration to nanoseconds, saturating at `u64::MAX`.
fn duration_ns(d: std::time::Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}
