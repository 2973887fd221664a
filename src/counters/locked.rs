//! Mutex-guarded counter.
//!
//! [`Locked`] serializes every access to its value through a `Mutex` owned by
//! the counter. The lock guard is dropped on every exit path, so the lock can
//! never be left held.

use std::fmt::Debug;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::counters::{Counter, CounterKind};

/// A counter guarded by a mutual-exclusion lock.
///
/// All increments are totally ordered, at most one thread mutates the value
/// at a time, and `load()` always sees a fully applied state. Under heavy
/// contention throughput is bounded by lock hand-off; correctness is not
/// affected.
///
/// # Examples
///
/// ```rust
/// use std::thread;
/// use contesa::counters::Counter;
/// use contesa::counters::locked::Locked;
///
/// let counter = Locked::new();
/// thread::scope(|s| {
///     for _ in 0..4 {
///         s.spawn(|| counter.increment());
///     }
/// });
/// assert_eq!(counter.load(), 4);
/// ```
pub struct Locked {
    name: &'static str,
    value: Mutex<i64>,
}

impl Locked {
    /// Creates a new counter initialized to zero.
    pub const fn new() -> Self {
        Locked {
            name: "",
            value: Mutex::new(0),
        }
    }

    /// Sets the name of this counter, returning `self` for method chaining.
    pub fn with_name(self, name: &'static str) -> Self {
        Self { name, ..self }
    }

    /// Acquires the lock.
    ///
    /// A panic while holding the guard cannot leave an `i64` half-written,
    /// so a poisoned lock is recovered rather than propagated.
    #[inline]
    fn lock(&self) -> MutexGuard<'_, i64> {
        self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Counter for Locked {
    #[inline]
    fn increment(&self) {
        let mut value = self.lock();
        *value = value.wrapping_add(1);
    }

    #[inline]
    fn load(&self) -> i64 {
        *self.lock()
    }

    #[inline]
    fn name(&self) -> &'static str {
        self.name
    }

    fn kind(&self) -> CounterKind {
        CounterKind::Locked
    }
}

impl Default for Locked {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Locked {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{{ {} }}", self.name, self.load())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_new() {
        let counter = Locked::new();
        assert_eq!(counter.load(), 0);
        assert_eq!(counter.kind(), CounterKind::Locked);
    }

    #[test]
    fn test_incr() {
        let counter = Locked::new();
        counter.increment();
        assert_eq!(counter.load(), 1);
        counter.increment();
        counter.increment();
        assert_eq!(counter.load(), 3);
    }

    #[test]
    fn test_multiple_threads() {
        let counter = Arc::new(Locked::new());
        let mut handles = vec![];

        for _ in 0..8 {
            let counter_clone = Arc::clone(&counter);
            let handle = thread::spawn(move || {
                for _ in 0..10_000 {
                    counter_clone.increment();
                }
            });
            handles.push(handle);
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counter.load(), 80_000);
    }

    #[test]
    fn test_recovers_from_poisoned_lock() {
        let counter = Arc::new(Locked::new());
        counter.increment();

        let poisoner = Arc::clone(&counter);
        let result = thread::spawn(move || {
            let _guard = poisoner.value.lock().unwrap();
            panic!("poison the lock");
        })
        .join();
        assert!(result.is_err());
        assert!(counter.value.is_poisoned());

        counter.increment();
        assert_eq!(counter.load(), 2);
    }

    #[test]
    fn test_increment_wraps_at_max() {
        let counter = Locked {
            name: "",
            value: Mutex::new(i64::MAX),
        };
        counter.increment();
        assert_eq!(counter.load(), i64::MIN);
    }

    #[test]
    fn test_with_name() {
        let counter = Locked::new().with_name("guarded");
        assert_eq!(counter.name(), "guarded");
    }

    #[test]
    fn test_debug() {
        let counter = Locked::new().with_name("guarded");
        counter.increment();
        counter.increment();
        assert_eq!(format!("{:?}", counter), "guarded{ 2 }");
    }
}
