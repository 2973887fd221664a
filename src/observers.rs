//! Reporting sinks for stress-run results.
//!
//! Each observer turns [`RunReport`](crate::driver::RunReport)s (and, where it
//! makes sense, [`TrialSummary`](crate::driver::TrialSummary)s) into text:
//!
//! - [`text`] - One line per run, always available
//! - [`table`] - Pretty-print runs as tables using the `tabled` crate
//! - [`json`] - Serialize runs to JSON format
//!
//! # Unified Error Handling
//!
//! All observers use a unified [`ObserverError`] type, allowing you to switch
//! between observers without changing error handling code.
//!
//! # Feature Flags
//!
//! - `table` - Enables the [`table`] module
//! - `json` - Enables the [`json`] module
//! - `full` - Enables all observer modules
//!
//! # Example
//!
//! ```rust
//! use contesa::counters::CounterKind;
//! use contesa::driver::StressDriver;
//! use contesa::observers::text::TextObserver;
//!
//! fn report() -> Result<(), Box<dyn std::error::Error>> {
//!     let reports = StressDriver::new().with_tasks(10).compare(&CounterKind::ALL)?;
//!     TextObserver::new().write_to(&mut std::io::stdout(), &reports)?;
//!     Ok(())
//! }
//! # report().unwrap();
//! ```

mod error;

pub use error::{ObserverError, Result};

pub mod text;

#[cfg(feature = "table")]
pub mod table;

#[cfg(feature = "json")]
pub mod json;
