//! Lock-free counter on a single atomic integer.

use std::fmt::Debug;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::counters::{Counter, CounterKind};

/// A counter updated with a hardware atomic add.
///
/// Increments are linearizable and never lost, reads are never torn, and no
/// thread ever blocks. All writers share one memory location, so under
/// contention every increment bounces the cache line between cores (see
/// [`Sharded`](super::sharded::Sharded) for the alternative).
///
/// `Relaxed` ordering is enough: the counter publishes no other memory, and
/// the driver's completion barrier provides the happens-before edge between
/// the last increment and the final `load()`.
///
/// # Examples
///
/// ```rust
/// use contesa::counters::Counter;
/// use contesa::counters::atomic::Atomic;
///
/// static EVENTS: Atomic = Atomic::new().with_name("events");
///
/// EVENTS.increment();
/// assert_eq!(EVENTS.load(), 1);
/// ```
pub struct Atomic {
    name: &'static str,
    value: AtomicI64,
}

impl Atomic {
    /// Creates a new counter initialized to zero.
    pub const fn new() -> Self {
        Atomic {
            name: "",
            value: AtomicI64::new(0),
        }
    }

    /// Sets the name of this counter, returning `self` for method chaining.
    pub const fn with_name(self, name: &'static str) -> Self {
        Self { name, ..self }
    }
}

impl Counter for Atomic {
    #[inline]
    fn increment(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn load(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }

    #[inline]
    fn name(&self) -> &'static str {
        self.name
    }

    fn kind(&self) -> CounterKind {
        CounterKind::Atomic
    }
}

impl Default for Atomic {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Atomic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{{ {} }}", self.name, self.load())
    }
}
