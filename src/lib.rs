//! # Contesa - Concurrent Counters Under Contention
//!
//! A small harness that compares implementations of a shared counter under
//! concurrent increment load, and times them.
//!
//! ## The Problem
//!
//! `value = value + 1` is three steps: read, add, write. When many threads run
//! it against the same memory location without coordination, two of them can
//! read the same prior value and both write the same successor: one increment
//! is silently lost. Coordination fixes this, at a cost that depends on how it
//! is done.
//!
//! ## Counter Variants
//!
//! | Type | Discipline | Exact under contention |
//! |------|------------|------------------------|
//! | [`Unsync`](counters::unsync::Unsync) | none | no, loses updates |
//! | [`Locked`](counters::locked::Locked) | `Mutex<i64>` | yes |
//! | [`Atomic`](counters::atomic::Atomic) | `AtomicI64::fetch_add` | yes |
//! | [`Sharded`](counters::sharded::Sharded) | per-thread cache-padded slots | yes |
//!
//! All of them implement the [`Counter`](counters::Counter) trait.
//!
//! ## Stress Driver
//!
//! [`StressDriver`](driver::StressDriver) launches a fixed batch of
//! concurrent tasks (1000 by default), each performing one increment on a
//! shared counter, waits for all of them on a counted completion barrier, and
//! reports the final value with the elapsed time.
//!
//! ```rust
//! use contesa::counters::{Counter, CounterKind};
//! use contesa::counters::locked::Locked;
//! use contesa::driver::StressDriver;
//!
//! let driver = StressDriver::new();
//!
//! // One run against a borrowed counter.
//! let counter = Locked::new();
//! let report = driver.run(&counter).unwrap();
//! assert_eq!(report.value, 1000);
//! assert_eq!(counter.load(), 1000);
//!
//! // One run per variant, each against a fresh counter.
//! for report in driver.compare(&CounterKind::ALL).unwrap() {
//!     println!("{report}");
//! }
//! ```
//!
//! ## Observers
//!
//! Reports can be rendered by the observers in [`observers`]:
//!
//! | Feature | Module | Description |
//! |---------|--------|-------------|
//! | (none) | [`observers::text`] | One line per run |
//! | `table` | `observers::table` | Pretty-print runs as tables |
//! | `json` | `observers::json` | Serialize runs to JSON |
//! | `full` | All observers | Enables all observer modules |
//!
//! ## Logging
//!
//! The driver logs through the [`log`] facade: each run at `debug` level and
//! each protocol phase at `trace` level. Install any logger to see them.

pub mod counters;
pub mod driver;
pub mod observers;

#[cfg(feature = "serde")]
pub mod snapshot;
