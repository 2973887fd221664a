//! Demo application racing the counter variants against each other.
//!
//! Run with:
//! ```bash
//! cargo run --example race --features demo -- --help
//! RUST_LOG=contesa=trace cargo run --example race --features demo -- --tasks 8
//! ```

use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use contesa::counters::CounterKind;
use contesa::driver::StressDriver;
use contesa::observers::json::JsonObserver;
use contesa::observers::table::{TableObserver, TableStyle};
use contesa::observers::text::TextObserver;
use log::info;

/// Output format for run reports.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Pretty table
    Table,
    /// One line per run
    Text,
    /// Bare `value elapsed` lines
    Terse,
    /// JSON format
    Json,
}

/// Counter variant selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KindChoice {
    Unsync,
    Locked,
    Atomic,
    Sharded,
}

impl From<KindChoice> for CounterKind {
    fn from(choice: KindChoice) -> Self {
        match choice {
            KindChoice::Unsync => CounterKind::Unsync,
            KindChoice::Locked => CounterKind::Locked,
            KindChoice::Atomic => CounterKind::Atomic,
            KindChoice::Sharded => CounterKind::Sharded,
        }
    }
}

/// Table style selection.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum StyleChoice {
    Ascii,
    #[default]
    Rounded,
    Sharp,
    Modern,
    Extended,
    Markdown,
    Restructured,
    Dots,
    Blank,
}

impl From<StyleChoice> for TableStyle {
    fn from(choice: StyleChoice) -> Self {
        match choice {
            StyleChoice::Ascii => TableStyle::Ascii,
            StyleChoice::Rounded => TableStyle::Rounded,
            StyleChoice::Sharp => TableStyle::Sharp,
            StyleChoice::Modern => TableStyle::Modern,
            StyleChoice::Extended => TableStyle::Extended,
            StyleChoice::Markdown => TableStyle::Markdown,
            StyleChoice::Restructured => TableStyle::ReStructuredText,
            StyleChoice::Dots => TableStyle::Dots,
            StyleChoice::Blank => TableStyle::Blank,
        }
    }
}

/// Races shared-counter implementations under concurrent increments.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Counter variants to run (default: all)
    #[arg(short, long, value_enum, value_delimiter = ',')]
    kinds: Vec<KindChoice>,

    /// Number of concurrent tasks per run
    #[arg(short, long, default_value = "1000")]
    tasks: usize,

    /// Number of increments each task performs
    #[arg(short, long, default_value = "1")]
    increments: usize,

    /// Repeat each run N times against fresh counters and summarize
    #[arg(long)]
    trials: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Table style (for table format)
    #[arg(short, long, value_enum, default_value = "rounded")]
    style: StyleChoice,

    /// Pretty print JSON output
    #[arg(long)]
    pretty: bool,

    /// Include timestamp in JSON output
    #[arg(long)]
    timestamp: bool,
}

impl Args {
    fn kinds(&self) -> Vec<CounterKind> {
        if self.kinds.is_empty() {
            CounterKind::ALL.to_vec()
        } else {
            self.kinds.iter().copied().map(CounterKind::from).collect()
        }
    }

    fn title(&self) -> String {
        format!("{} tasks x {} increments", self.tasks, self.increments)
    }
}

fn run(args: &Args) -> Result<String, Box<dyn std::error::Error>> {
    let driver = StressDriver::new()
        .with_tasks(args.tasks)
        .with_increments_per_task(args.increments);
    let kinds = args.kinds();

    if let Some(trials) = args.trials {
        info!("running {} trials per counter", trials);
        let summaries = kinds
            .iter()
            .map(|kind| driver.trials(trials, || kind.new_counter()))
            .collect::<Result<Vec<_>, _>>()?;

        return Ok(match args.format {
            OutputFormat::Table => TableObserver::new()
                .with_style(args.style.into())
                .with_title(args.title())
                .render_trials(&summaries),
            OutputFormat::Text => TextObserver::new().render_trials(&summaries),
            OutputFormat::Terse => TextObserver::new().terse(true).render_trials(&summaries),
            OutputFormat::Json => JsonObserver::new()
                .pretty(args.pretty)
                .wrap_in_session(args.timestamp)
                .include_timestamp(args.timestamp)
                .trials_to_json(&summaries)?,
        });
    }

    let reports = driver.compare(&kinds)?;
    Ok(match args.format {
        OutputFormat::Table => TableObserver::new()
            .with_style(args.style.into())
            .with_title(args.title())
            .render(&reports),
        OutputFormat::Text => TextObserver::new().render(&reports),
        OutputFormat::Terse => TextObserver::new().terse(true).render(&reports),
        OutputFormat::Json => JsonObserver::new()
            .pretty(args.pretty)
            .wrap_in_session(args.timestamp)
            .include_timestamp(args.timestamp)
            .to_json(&reports)?,
    })
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
