//! Table observer for pretty-printing stress runs.
//!
//! This module provides [`TableObserver`], which renders run reports and
//! trial summaries as formatted tables using the `tabled` crate.
//!
//! # Feature Flag
//!
//! This module requires the `table` feature:
//!
//! ```toml
//! [dependencies]
//! contesa = { version = "0.1", features = ["table"] }
//! ```
//!
//! # Examples
//!
//! ```rust,ignore
//! use contesa::counters::CounterKind;
//! use contesa::driver::StressDriver;
//! use contesa::observers::table::{TableObserver, TableStyle};
//!
//! let reports = StressDriver::new().compare(&CounterKind::ALL)?;
//!
//! let observer = TableObserver::new().with_style(TableStyle::Rounded);
//! println!("{}", observer.render(&reports));
//! // ╭─────────┬───────┬──────────┬───────┬──────┬───────────╮
//! // │ Counter │ Tasks │ Expected │ Value │ Lost │ Elapsed   │
//! // ├─────────┼───────┼──────────┼───────┼──────┼───────────┤
//! // │ unsync  │ 1000  │ 1000     │ 998   │ 2    │ 41.2ms    │
//! // │ locked  │ 1000  │ 1000     │ 1000  │ 0    │ 39.8ms    │
//! // ...
//! ```

use crate::driver::{RunReport, TrialSummary};
use tabled::{settings::Style, Table, Tabled};

/// Available table styles for rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TableStyle {
    /// ASCII table with simple characters: +, -, |
    Ascii,
    /// Modern rounded corners (default)
    #[default]
    Rounded,
    /// Sharp corners with box-drawing characters
    Sharp,
    /// Modern style with clean lines
    Modern,
    /// Extended ASCII characters
    Extended,
    /// GitHub-flavored Markdown table
    Markdown,
    /// ReStructuredText table
    ReStructuredText,
    /// Dots for borders
    Dots,
    /// No borders, just spacing
    Blank,
}

/// Configuration for the table observer.
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// The style to use for rendering.
    pub style: TableStyle,
    /// Whether to show the header row.
    pub show_header: bool,
    /// Custom title printed above the table (optional).
    pub title: Option<String>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            style: TableStyle::default(),
            show_header: true,
            title: None,
        }
    }
}

#[derive(Tabled)]
struct RunRow {
    #[tabled(rename = "Counter")]
    counter: String,
    #[tabled(rename = "Tasks")]
    tasks: String,
    #[tabled(rename = "Expected")]
    expected: i64,
    #[tabled(rename = "Value")]
    value: i64,
    #[tabled(rename = "Lost")]
    lost: i64,
    #[tabled(rename = "Elapsed")]
    elapsed: String,
}

impl From<&RunReport> for RunRow {
    fn from(report: &RunReport) -> Self {
        Self {
            counter: report.counter.clone(),
            tasks: if report.increments_per_task == 1 {
                report.tasks.to_string()
            } else {
                format!("{}x{}", report.tasks, report.increments_per_task)
            },
            expected: report.expected,
            value: report.value,
            lost: report.lost_updates(),
            elapsed: format!("{:?}", report.elapsed),
        }
    }
}

#[derive(Tabled)]
struct TrialRow {
    #[tabled(rename = "Counter")]
    counter: String,
    #[tabled(rename = "Trials")]
    trials: usize,
    #[tabled(rename = "Exact")]
    exact: usize,
    #[tabled(rename = "Min")]
    min: i64,
    #[tabled(rename = "Max")]
    max: i64,
    #[tabled(rename = "Expected")]
    expected: i64,
    #[tabled(rename = "Mean")]
    mean: String,
}

impl From<&TrialSummary> for TrialRow {
    fn from(summary: &TrialSummary) -> Self {
        Self {
            counter: summary.counter.clone(),
            trials: summary.trials,
            exact: summary.exact_runs,
            min: summary.min_value,
            max: summary.max_value,
            expected: summary.expected,
            mean: format!("{:?}", summary.mean_elapsed()),
        }
    }
}

/// An observer that renders runs as a formatted table.
///
/// # Examples
///
/// ```rust,ignore
/// use contesa::observers::table::{TableObserver, TableStyle};
///
/// let output = TableObserver::new()
///     .with_style(TableStyle::Markdown)
///     .with_title("1000 tasks")
///     .render(&reports);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TableObserver {
    config: TableConfig,
}

impl TableObserver {
    /// Creates a new table observer with default settings.
    ///
    /// Default style is [`TableStyle::Rounded`] with a header row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new table observer with the specified configuration.
    pub fn with_config(config: TableConfig) -> Self {
        Self { config }
    }

    /// Sets the table style.
    pub fn with_style(mut self, style: TableStyle) -> Self {
        self.config.style = style;
        self
    }

    /// Sets whether to show the header row.
    pub fn with_header(mut self, show: bool) -> Self {
        self.config.show_header = show;
        self
    }

    /// Sets an optional title for the table.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.config.title = Some(title.into());
        self
    }

    /// Applies the configured style to a table.
    fn apply_style(&self, table: &mut Table) {
        match self.config.style {
            TableStyle::Ascii => {
                table.with(Style::ascii());
            }
            TableStyle::Rounded => {
                table.with(Style::rounded());
            }
            TableStyle::Sharp => {
                table.with(Style::sharp());
            }
            TableStyle::Modern => {
                table.with(Style::modern());
            }
            TableStyle::Extended => {
                table.with(Style::extended());
            }
            TableStyle::Markdown => {
                table.with(Style::markdown());
            }
            TableStyle::ReStructuredText => {
                table.with(Style::re_structured_text());
            }
            TableStyle::Dots => {
                table.with(Style::dots());
            }
            TableStyle::Blank => {
                table.with(Style::blank());
            }
        }
    }

    /// Styles the table, drops the header if configured, prepends the title.
    fn finish(&self, mut table: Table) -> String {
        self.apply_style(&mut table);

        if !self.config.show_header {
            table.with(tabled::settings::Remove::row(
                tabled::settings::object::Rows::first(),
            ));
        }

        if let Some(ref title) = self.config.title {
            format!("{}\n{}", title, table)
        } else {
            table.to_string()
        }
    }

    /// Renders run reports, one row per run.
    pub fn render<'a>(&self, reports: impl IntoIterator<Item = &'a RunReport>) -> String {
        let rows: Vec<RunRow> = reports.into_iter().map(RunRow::from).collect();
        self.finish(Table::new(&rows))
    }

    /// Renders trial summaries, one row per series.
    pub fn render_trials<'a>(
        &self,
        summaries: impl IntoIterator<Item = &'a TrialSummary>,
    ) -> String {
        let rows: Vec<TrialRow> = summaries.into_iter().map(TrialRow::from).collect();
        self.finish(Table::new(&rows))
    }
}
