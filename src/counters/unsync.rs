//! Counter without coordination between concurrent increments.
//!
//! This module provides [`Unsync`], the control case of the harness: an
//! increment is a plain read followed by a plain write, so two threads that
//! read the same value both write the same successor and one update is lost.

use std::fmt::Debug;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::counters::{Counter, CounterKind};

/// A counter whose increment is a non-atomic read-modify-write.
///
/// The value lives in an `AtomicI64` so that concurrent access stays free of
/// undefined behavior, but `increment()` deliberately splits the update into a
/// relaxed `load` and a relaxed `store`. Nothing orders the two halves of
/// different increments, which reproduces the lost-update race of an
/// unsynchronized `value = value + 1`.
///
/// Sequential use is always exact. Under contention the final value is at
/// most the number of increments, and usually lower.
///
/// # Examples
///
/// ```rust
/// use contesa::counters::Counter;
/// use contesa::counters::unsync::Unsync;
///
/// let counter = Unsync::new();
/// for _ in 0..10 {
///     counter.increment();
/// }
/// assert_eq!(counter.load(), 10);
/// ```
pub struct Unsync {
    name: &'static str,
    value: AtomicI64,
}

impl Unsync {
    /// Creates a new counter initialized to zero.
    pub const fn new() -> Self {
        Unsync {
            name: "",
            value: AtomicI64::new(0),
        }
    }

    /// Sets the name of this counter, returning `self` for method chaining.
    pub const fn with_name(self, name: &'static str) -> Self {
        Self { name, ..self }
    }

    /// Read half of an increment.
    #[inline]
    fn read(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }

    /// Write half of an increment.
    #[inline]
    fn write(&self, value: i64) {
        self.value.store(value, Ordering::Relaxed);
    }
}

impl Counter for Unsync {
    #[inline]
    fn increment(&self) {
        let current = self.read();
        self.write(current.wrapping_add(1));
    }

    #[inline]
    fn load(&self) -> i64 {
        self.read()
    }

    #[inline]
    fn name(&self) -> &'static str {
        self.name
    }

    fn kind(&self) -> CounterKind {
        CounterKind::Unsync
    }
}

impl Default for Unsync {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Unsync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{{ {} }}", self.name, self.read())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_new() {
        let counter = Unsync::new();
        assert_eq!(counter.load(), 0);
        assert_eq!(counter.name(), "");
        assert_eq!(counter.kind(), CounterKind::Unsync);
    }

    #[test]
    fn test_sequential_increments() {
        let counter = Unsync::new();
        for _ in 0..1000 {
            counter.increment();
        }
        assert_eq!(counter.load(), 1000);
    }

    #[test]
    fn test_interleaved_increments_lose_an_update() {
        let counter = Unsync::new();
        counter.increment();

        // The two halves of `increment()`, scheduled the way a preempted
        // thread would see them: both read before either writes.
        let first = counter.read();
        let second = counter.read();
        counter.write(first + 1);
        counter.write(second + 1);

        assert_eq!(counter.load(), 2);
    }

    #[test]
    fn test_concurrent_increments_never_exceed_issued() {
        let counter = Unsync::new();
        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..10_000 {
                        counter.increment();
                    }
                });
            }
        });
        let value = counter.load();
        assert!(value > 0);
        assert!(value <= 80_000);
    }

    #[test]
    fn test_increment_wraps_at_max() {
        let counter = Unsync::new();
        counter.write(i64::MAX);
        counter.increment();
        assert_eq!(counter.load(), i64::MIN);
    }

    #[test]
    fn test_with_name() {
        let counter = Unsync::new().with_name("racy");
        counter.increment();
        assert_eq!(counter.name(), "racy");
        assert_eq!(counter.label(), "racy");
        assert_eq!(counter.load(), 1);
    }

    #[test]
    fn test_debug() {
        let counter = Unsync::new().with_name("racy");
        counter.increment();
        assert_eq!(format!("{:?}", counter), "racy{ 1 }");
    }

    #[test]
    fn test_default() {
        let counter = Unsync::default();
        assert_eq!(counter.load(), 0);
    }
}
