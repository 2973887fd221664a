//! Plain-text observer.
//!
//! [`TextObserver`] prints one line per run. In terse mode the line is just
//! `value elapsed`, which is handy when piping several runs into other tools.

use std::io::Write;

use crate::driver::{RunReport, TrialSummary};
use crate::observers::Result;

/// An observer that renders runs as one line each.
///
/// # Examples
///
/// ```rust
/// use contesa::counters::atomic::Atomic;
/// use contesa::driver::StressDriver;
/// use contesa::observers::text::TextObserver;
///
/// let report = StressDriver::new().with_tasks(5).run(&Atomic::new()).unwrap();
/// let line = TextObserver::new().render(&[report]);
///
/// assert!(line.starts_with("atomic: 5/5 in "));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TextObserver {
    terse: bool,
}

impl TextObserver {
    /// Creates a new text observer printing full lines.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables terse `value elapsed` lines.
    pub fn terse(mut self, enabled: bool) -> Self {
        self.terse = enabled;
        self
    }

    fn line(&self, report: &RunReport) -> String {
        if self.terse {
            format!("{} {:?}", report.value, report.elapsed)
        } else {
            report.to_string()
        }
    }

    /// Renders the reports, one per line, without a trailing newline.
    pub fn render<'a>(&self, reports: impl IntoIterator<Item = &'a RunReport>) -> String {
        reports
            .into_iter()
            .map(|report| self.line(report))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Renders trial summaries, one per line.
    pub fn render_trials<'a>(
        &self,
        summaries: impl IntoIterator<Item = &'a TrialSummary>,
    ) -> String {
        summaries
            .into_iter()
            .map(|summary| {
                if self.terse {
                    format!(
                        "{} {} {:?}",
                        summary.exact_runs,
                        summary.trials,
                        summary.mean_elapsed()
                    )
                } else {
                    summary.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Writes the reports to `writer`, one line each.
    pub fn write_to<'a, W: Write>(
        &self,
        writer: &mut W,
        reports: impl IntoIterator<Item = &'a RunReport>,
    ) -> Result<()> {
        for report in reports {
            writeln!(writer, "{}", self.line(report))?;
        }
        Ok(())
    }
}
