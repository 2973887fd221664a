//! Concurrent stress driver.
//!
//! [`StressDriver`] fans a fixed batch of increment tasks out over OS threads,
//! waits for every one of them on a counted completion barrier, and reports
//! the final value together with the elapsed wall-clock time.
//!
//! # Protocol
//!
//! ```text
//!   INIT ──► LAUNCHING ──► AWAITING_COMPLETION ──► REPORTING ──► DONE
//!             spawn N        WaitGroup::wait()      load() once
//!             tasks
//! ```
//!
//! The counter under test is borrowed for the duration of the run and shared
//! by reference with every task; tasks are scoped threads and cannot outlive
//! the run. The driver does no locking of its own.
//!
//! # Examples
//!
//! ```rust
//! use contesa::counters::atomic::Atomic;
//! use contesa::driver::StressDriver;
//!
//! let counter = Atomic::new();
//! let report = StressDriver::new().with_tasks(100).run(&counter).unwrap();
//!
//! assert_eq!(report.value, 100);
//! assert!(report.is_exact());
//! ```

use std::fmt::{self, Display};
use std::thread::{self, ScopedJoinHandle};
use std::time::{Duration, Instant};

use crossbeam_utils::sync::WaitGroup;
use log::{debug, trace};
use thiserror::Error;

use crate::counters::{Counter, CounterKind};

/// Number of tasks launched per run unless configured otherwise.
pub const DEFAULT_TASKS: usize = 1000;

/// Default stack size of task threads; a task only loops over `increment()`.
pub const DEFAULT_STACK_SIZE: usize = 256 * 1024;

/// Errors that abort a stress run.
///
/// A run either reports a complete result or fails; there is no partial
/// report.
#[derive(Debug, Error)]
pub enum StressError {
    /// The operating system refused to start a task thread.
    #[error("failed to spawn task {index}: {source}")]
    Spawn {
        /// Index of the task that could not be spawned.
        index: usize,
        /// Underlying error from the thread builder.
        #[source]
        source: std::io::Error,
    },

    /// One or more tasks panicked before signalling completion.
    #[error("{panicked} of {tasks} tasks panicked")]
    TaskPanicked {
        /// Number of tasks that panicked.
        panicked: usize,
        /// Number of tasks launched.
        tasks: usize,
    },

    /// A trial series was requested with zero trials.
    #[error("at least one trial is required")]
    NoTrials,
}

/// Result type for driver operations.
pub type Result<T> = std::result::Result<T, StressError>;

/// Phases of a single run, logged at `trace` level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Init,
    Launching,
    AwaitingCompletion,
    Reporting,
    Done,
}

impl Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Init => "INIT",
            Phase::Launching => "LAUNCHING",
            Phase::AwaitingCompletion => "AWAITING_COMPLETION",
            Phase::Reporting => "REPORTING",
            Phase::Done => "DONE",
        })
    }
}

/// Configuration of the stress driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Number of concurrent tasks per run.
    pub tasks: usize,
    /// Number of `increment()` calls each task performs.
    pub increments_per_task: usize,
    /// Stack size in bytes of each task thread.
    pub stack_size: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tasks: DEFAULT_TASKS,
            increments_per_task: 1,
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

/// Runs batches of concurrent increments against a counter and times them.
#[derive(Debug, Clone, Default)]
pub struct StressDriver {
    config: DriverConfig,
}

impl StressDriver {
    /// Creates a driver launching [`DEFAULT_TASKS`] tasks of one increment each.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a driver with the specified configuration.
    pub fn with_config(config: DriverConfig) -> Self {
        Self { config }
    }

    /// Sets the number of concurrent tasks per run.
    pub fn with_tasks(mut self, tasks: usize) -> Self {
        self.config.tasks = tasks;
        self
    }

    /// Sets the number of increments each task performs.
    pub fn with_increments_per_task(mut self, increments: usize) -> Self {
        self.config.increments_per_task = increments;
        self
    }

    /// Sets the stack size of task threads.
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.config.stack_size = bytes;
        self
    }

    /// Returns the current configuration.
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Total number of increments a run issues.
    pub fn expected(&self) -> i64 {
        (self.config.tasks as i64).saturating_mul(self.config.increments_per_task as i64)
    }

    /// Runs one batch against `counter` and reports the outcome.
    ///
    /// The final value is read exactly once, strictly after every task has
    /// signalled completion.
    ///
    /// # Errors
    ///
    /// Returns [`StressError::Spawn`] if a task thread cannot be started and
    /// [`StressError::TaskPanicked`] if any task panicked. In both cases every
    /// task that did start has finished before this returns.
    pub fn run<C: Counter + ?Sized>(&self, counter: &C) -> Result<RunReport> {
        let tasks = self.config.tasks;
        let per_task = self.config.increments_per_task;
        trace!(
            "{}: {} tasks x {} increments on {}",
            Phase::Init,
            tasks,
            per_task,
            counter.label()
        );

        thread::scope(|s| {
            let start = Instant::now();
            let barrier = WaitGroup::new();
            let mut handles: Vec<ScopedJoinHandle<'_, ()>> = Vec::with_capacity(tasks);

            trace!("{}", Phase::Launching);
            for index in 0..tasks {
                let done = barrier.clone();
                let spawned = thread::Builder::new()
                    .name(format!("stress-{index}"))
                    .stack_size(self.config.stack_size)
                    .spawn_scoped(s, move || {
                        for _ in 0..per_task {
                            counter.increment();
                        }
                        drop(done);
                    });

                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(source) => {
                        debug!("spawning task {index} failed: {source}");
                        drop(barrier);
                        for handle in handles {
                            let _ = handle.join();
                        }
                        return Err(StressError::Spawn { index, source });
                    }
                }
            }

            trace!("{}", Phase::AwaitingCompletion);
            barrier.wait();
            let elapsed = start.elapsed();

            trace!("{}", Phase::Reporting);
            let value = counter.load();

            let panicked = handles
                .into_iter()
                .map(ScopedJoinHandle::join)
                .filter(std::result::Result::is_err)
                .count();
            if panicked > 0 {
                return Err(StressError::TaskPanicked { panicked, tasks });
            }

            let report = RunReport {
                counter: counter.label().to_string(),
                kind: counter.kind(),
                tasks,
                increments_per_task: per_task,
                expected: self.expected(),
                value,
                elapsed,
            };
            debug!("{report}");
            trace!("{}", Phase::Done);
            Ok(report)
        })
    }

    /// Runs `trials` batches, each against a fresh counter from `make_counter`.
    ///
    /// # Errors
    ///
    /// Returns [`StressError::NoTrials`] if `trials` is zero, or the first
    /// error of any run.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use contesa::counters::locked::Locked;
    /// use contesa::driver::StressDriver;
    ///
    /// let summary = StressDriver::new()
    ///     .with_tasks(50)
    ///     .trials(5, Locked::new)
    ///     .unwrap();
    ///
    /// assert_eq!(summary.exact_runs, 5);
    /// assert!(!summary.any_lost());
    /// ```
    pub fn trials<C, F>(&self, trials: usize, mut make_counter: F) -> Result<TrialSummary>
    where
        C: Counter,
        F: FnMut() -> C,
    {
        if trials == 0 {
            return Err(StressError::NoTrials);
        }

        let first = self.run(&make_counter())?;
        debug!("trial 1/{}: {}", trials, first);
        let mut summary = TrialSummary::from_report(&first);

        for trial in 1..trials {
            let report = self.run(&make_counter())?;
            debug!("trial {}/{}: {}", trial + 1, trials, report);
            summary.record(&report);
        }
        Ok(summary)
    }

    /// Runs one batch per kind, each against a fresh counter, in order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use contesa::counters::CounterKind;
    /// use contesa::driver::StressDriver;
    ///
    /// let reports = StressDriver::new()
    ///     .with_tasks(10)
    ///     .compare(&[CounterKind::Locked, CounterKind::Atomic])
    ///     .unwrap();
    ///
    /// assert!(reports.iter().all(|r| r.value == 10));
    /// ```
    pub fn compare(&self, kinds: &[CounterKind]) -> Result<Vec<RunReport>> {
        kinds
            .iter()
            .map(|kind| self.run(kind.new_counter().as_ref()))
            .collect()
    }
}

/// Outcome of one stress run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
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
    /// Time from before the first spawn to the barrier release.
    pub elapsed: Duration,
}

impl RunReport {
    /// Number of increments that did not show up in the final value.
    pub fn lost_updates(&self) -> i64 {
        (self.expected - self.value).max(0)
    }

    /// Returns `true` if the final value equals the increments issued.
    pub fn is_exact(&self) -> bool {
        self.value == self.expected
    }

    /// Issued increments per second, or `None` for an instantaneous run.
    pub fn throughput(&self) -> Option<f64> {
        let secs = self.elapsed.as_secs_f64();
        (secs > 0.0).then(|| self.expected as f64 / secs)
    }
}

impl Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}/{} in {:?}",
            self.counter, self.value, self.expected, self.elapsed
        )?;
        if !self.is_exact() {
            write!(f, " ({} lost)", self.lost_updates())?;
        }
        Ok(())
    }
}

/// Aggregate of repeated runs against fresh counters.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialSummary {
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
    /// Shortest run.
    pub fastest: Duration,
    /// Longest run.
    pub slowest: Duration,
    /// Sum of all run durations.
    pub total_elapsed: Duration,
}

impl TrialSummary {
    fn from_report(report: &RunReport) -> Self {
        Self {
            counter: report.counter.clone(),
            kind: report.kind,
            trials: 1,
            expected: report.expected,
            exact_runs: usize::from(report.is_exact()),
            min_value: report.value,
            max_value: report.value,
            fastest: report.elapsed,
            slowest: report.elapsed,
            total_elapsed: report.elapsed,
        }
    }

    fn record(&mut self, report: &RunReport) {
        self.trials += 1;
        self.exact_runs += usize::from(report.is_exact());
        self.min_value = self.min_value.min(report.value);
        self.max_value = self.max_value.max(report.value);
        self.fastest = self.fastest.min(report.elapsed);
        self.slowest = self.slowest.max(report.elapsed);
        self.total_elapsed += report.elapsed;
    }

    /// Returns `true` if at least one run lost an update.
    pub fn any_lost(&self) -> bool {
        self.exact_runs < self.trials
    }

    /// Mean run duration.
    pub fn mean_elapsed(&self) -> Duration {
        // trials is never zero: a summary is built from at least one report
        match u32::try_from(self.trials) {
            Ok(trials) => self.total_elapsed / trials,
            Err(_) => Duration::from_secs_f64(self.total_elapsed.as_secs_f64() / self.trials as f64),
        }
    }
}

impl Display for TrialSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}/{} exact runs, values {}..={} of {}, mean {:?}",
            self.counter,
            self.exact_runs,
            self.trials,
            self.min_value,
            self.max_value,
            self.expected,
            self.mean_elapsed()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counters::atomic::Atomic;
    use crate::counters::locked::Locked;
    use crate::counters::sharded::Sharded;
    use crate::counters::unsync::Unsync;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counter that sleeps before delegating each increment.
    #[derive(Debug)]
    struct Slow<C> {
        inner: C,
        delay: Duration,
    }

    impl<C: Counter> Counter for Slow<C> {
        fn increment(&self) {
            thread::sleep(self.delay);
            self.inner.increment();
        }

        fn load(&self) -> i64 {
            self.inner.load()
        }

        fn name(&self) -> &str {
            "slow"
        }

        fn kind(&self) -> CounterKind {
            self.inner.kind()
        }
    }

    /// Counter that panics on every increment after the first `healthy` ones.
    #[derive(Debug, Default)]
    struct Flaky {
        calls: AtomicUsize,
        healthy: usize,
    }

    impl Counter for Flaky {
        fn increment(&self) {
            if self.calls.fetch_add(1, Ordering::SeqCst) >= self.healthy {
                panic!("flaky increment");
            }
        }

        fn load(&self) -> i64 {
            self.calls.load(Ordering::SeqCst) as i64
        }

        fn name(&self) -> &str {
            "flaky"
        }

        fn kind(&self) -> CounterKind {
            CounterKind::Atomic
        }
    }

    #[test]
    fn test_default_config() {
        let driver = StressDriver::new();
        assert_eq!(driver.config().tasks, DEFAULT_TASKS);
        assert_eq!(driver.config().increments_per_task, 1);
        assert_eq!(driver.config().stack_size, DEFAULT_STACK_SIZE);
        assert_eq!(driver.expected(), 1000);
    }

    #[test]
    fn test_locked_thousand_tasks() {
        let counter = Locked::new();
        let report = StressDriver::new().run(&counter).unwrap();
        assert_eq!(report.value, 1000);
        assert_eq!(counter.load(), 1000);
        assert!(report.is_exact());
        assert_eq!(report.lost_updates(), 0);
        assert_eq!(report.kind, CounterKind::Locked);
        assert_eq!(report.counter, "locked");
    }

    #[test]
    fn test_atomic_thousand_tasks() {
        let counter = Atomic::new();
        let report = StressDriver::new().run(&counter).unwrap();
        assert_eq!(report.value, 1000);
        assert_eq!(counter.load(), 1000);
    }

    #[test]
    fn test_sharded_thousand_tasks() {
        let counter = Sharded::new();
        let report = StressDriver::new().run(&counter).unwrap();
        assert_eq!(report.value, 1000);
    }

    #[test]
    fn test_unsync_never_exceeds_issued() {
        let counter = Unsync::new();
        let report = StressDriver::new().run(&counter).unwrap();
        assert!(report.value <= 1000);
        assert!(report.value > 0);
        assert_eq!(report.lost_updates(), 1000 - report.value);
    }

    #[test]
    fn test_synchronized_kinds_exact_for_many_batch_sizes() {
        for tasks in [1, 2, 3, 17, 64, 129] {
            let driver = StressDriver::new()
                .with_tasks(tasks)
                .with_increments_per_task(100);
            for kind in CounterKind::ALL.into_iter().filter(CounterKind::is_synchronized) {
                let report = driver.run(kind.new_counter().as_ref()).unwrap();
                assert_eq!(report.value, tasks as i64 * 100, "{kind} with {tasks} tasks");
            }
        }
    }

    #[test]
    fn test_zero_tasks_reports_zero() {
        let driver = StressDriver::new().with_tasks(0);
        for kind in CounterKind::ALL {
            let report = driver.run(kind.new_counter().as_ref()).unwrap();
            assert_eq!(report.value, 0);
            assert_eq!(report.expected, 0);
            assert!(report.is_exact());
        }
    }

    #[test]
    fn test_barrier_waits_for_slow_tasks() {
        let driver = StressDriver::new().with_tasks(32);

        let locked = Slow {
            inner: Locked::new(),
            delay: Duration::from_millis(20),
        };
        let report = driver.run(&locked).unwrap();
        assert_eq!(report.value, 32);
        assert!(report.elapsed >= Duration::from_millis(20));
        assert_eq!(report.counter, "slow");

        let atomic = Slow {
            inner: Atomic::new(),
            delay: Duration::from_millis(20),
        };
        assert_eq!(driver.run(&atomic).unwrap().value, 32);
    }

    #[test]
    fn test_panicking_task_is_reported() {
        let counter = Flaky {
            healthy: 5,
            ..Default::default()
        };
        let err = StressDriver::new().with_tasks(10).run(&counter).unwrap_err();
        match err {
            StressError::TaskPanicked { panicked, tasks } => {
                assert_eq!(panicked, 5);
                assert_eq!(tasks, 10);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_runs_through_trait_object() {
        let counter: Box<dyn Counter> = CounterKind::Atomic.new_counter();
        let report = StressDriver::new().with_tasks(10).run(counter.as_ref()).unwrap();
        assert_eq!(report.value, 10);
    }

    #[test]
    fn test_trials_use_fresh_counters() {
        let summary = StressDriver::new()
            .with_tasks(20)
            .trials(10, Atomic::new)
            .unwrap();
        assert_eq!(summary.trials, 10);
        assert_eq!(summary.exact_runs, 10);
        assert_eq!(summary.min_value, 20);
        assert_eq!(summary.max_value, 20);
        assert!(summary.fastest <= summary.slowest);
        assert!(!summary.any_lost());
    }

    #[test]
    fn test_trials_with_boxed_counters() {
        let summary = StressDriver::new()
            .with_tasks(16)
            .trials(3, || CounterKind::Sharded.new_counter())
            .unwrap();
        assert_eq!(summary.kind, CounterKind::Sharded);
        assert_eq!(summary.counter, "sharded");
        assert_eq!(summary.exact_runs, 3);
    }

    #[test]
    fn test_unsync_trials_never_exceed_issued() {
        let summary = StressDriver::new()
            .with_tasks(8)
            .with_increments_per_task(1_000)
            .trials(20, Unsync::new)
            .unwrap();
        assert!(summary.max_value <= 8_000);
        assert!(summary.min_value > 0);
    }

    #[test]
    fn test_unsync_loses_updates_under_contention() {
        let parallel = thread::available_parallelism().map_or(1, |n| n.get());
        if parallel < 2 {
            // A single core rarely preempts between the read and the write.
            return;
        }

        let summary = StressDriver::new()
            .with_tasks(8)
            .with_increments_per_task(100_000)
            .trials(20, Unsync::new)
            .unwrap();
        assert!(summary.max_value <= 800_000);
        assert!(summary.any_lost(), "{summary}");
        assert!(summary.min_value < summary.expected);
    }

    #[test]
    fn test_synchronized_trials_never_lose_under_contention() {
        let driver = StressDriver::new()
            .with_tasks(8)
            .with_increments_per_task(10_000);
        let locked = driver.trials(5, Locked::new).unwrap();
        let atomic = driver.trials(5, Atomic::new).unwrap();
        assert!(!locked.any_lost());
        assert!(!atomic.any_lost());
        assert_eq!(atomic.min_value, 80_000);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_mean_elapsed_with_huge_trial_count() {
        let summary = TrialSummary {
            counter: "atomic".to_string(),
            kind: CounterKind::Atomic,
            trials: u32::MAX as usize + 1,
            expected: 1,
            exact_runs: 0,
            min_value: 1,
            max_value: 1,
            fastest: Duration::from_nanos(1),
            slowest: Duration::from_nanos(1),
            total_elapsed: Duration::from_secs(1 << 32),
        };
        assert_eq!(summary.mean_elapsed(), Duration::from_secs(1));
    }

    #[test]
    fn test_spawn_failure_is_reported_without_report() {
        let counter = Atomic::new();
        let err = StressDriver::new()
            .with_tasks(4)
            .with_stack_size(usize::MAX / 4)
            .run(&counter)
            .unwrap_err();
        match err {
            StressError::Spawn { index, .. } => assert_eq!(index, 0),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(counter.load(), 0);
    }

    #[test]
    fn test_zero_trials_is_an_error() {
        let err = StressDriver::new().trials(0, Locked::new).unwrap_err();
        assert!(matches!(err, StressError::NoTrials));
    }

    #[test]
    fn test_compare_runs_each_kind_in_order() {
        let reports = StressDriver::new()
            .with_tasks(50)
            .compare(&CounterKind::ALL)
            .unwrap();
        let kinds: Vec<CounterKind> = reports.iter().map(|r| r.kind).collect();
        assert_eq!(kinds, CounterKind::ALL);
        for report in reports.iter().filter(|r| r.kind.is_synchronized()) {
            assert_eq!(report.value, 50);
        }
    }

    #[test]
    fn test_report_display() {
        let report = RunReport {
            counter: "unsync".to_string(),
            kind: CounterKind::Unsync,
            tasks: 1000,
            increments_per_task: 1,
            expected: 1000,
            value: 997,
            elapsed: Duration::from_millis(3),
        };
        assert_eq!(report.to_string(), "unsync: 997/1000 in 3ms (3 lost)");
        assert_eq!(report.lost_updates(), 3);
        assert!(!report.is_exact());
    }

    #[test]
    fn test_throughput() {
        let mut report = RunReport {
            counter: "atomic".to_string(),
            kind: CounterKind::Atomic,
            tasks: 1000,
            increments_per_task: 1,
            expected: 1000,
            value: 1000,
            elapsed: Duration::from_millis(500),
        };
        assert_eq!(report.throughput(), Some(2000.0));
        report.elapsed = Duration::ZERO;
        assert_eq!(report.throughput(), None);
    }
}
