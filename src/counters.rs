//! The counter contract and its implementations.
//!
//! Every counter stores one signed 64-bit value starting at zero, is mutated
//! only through [`Counter::increment`] and read through [`Counter::load`].
//! The variants differ in the discipline they use to coordinate concurrent
//! increments:
//!
//! | Type | Discipline | Exact under contention |
//! |------|------------|------------------------|
//! | [`Unsync`](unsync::Unsync) | none (split load/store) | no |
//! | [`Locked`](locked::Locked) | `Mutex<i64>` | yes |
//! | [`Atomic`](atomic::Atomic) | `AtomicI64::fetch_add` | yes |
//! | [`Sharded`](sharded::Sharded) | per-thread cache-padded slots | yes, once writers finish |
//!
//! # Sharding
//!
//! The sharded variant assigns each thread a slot on first use:
//!
//! 1. A global atomic counter (`NEXT_SLOT_ID`) hands out sequential IDs
//! 2. Each thread stores its ID in thread-local storage
//! 3. The ID modulo `NUM_COMPONENTS` (64) selects the slot a thread writes to
//!
//! ```text
//!                          ┌─────────────────────────────────────┐
//!                          │          Sharded Counter            │
//!                          ├─────────────────────────────────────┤
//!   Thread 0 ──writes──►   │ [Slot 0] ████████ (CachePadded)     │
//!   Thread 1 ──writes──►   │ [Slot 1] ████████ (CachePadded)     │
//!        ...               │    ...                              │
//!   Thread 63 ─writes──►   │ [Slot 63] ███████ (CachePadded)     │
//!                          └─────────────────────────────────────┘
//!                                          │
//!                                          ▼
//!                                   load() sums all slots
//! ```

pub mod atomic;
pub mod locked;
pub mod sharded;
pub mod unsync;

use atomic_traits::Atomic as AtomicCell;
use std::{
    fmt::{Debug, Display},
    str::FromStr,
    sync::atomic::{AtomicUsize, Ordering},
};

/// Number of slots used by the sharded counter.
///
/// A power of two, large enough that 64 threads never share a slot.
pub(crate) const NUM_COMPONENTS: usize = 64;

/// Global counter for assigning slot IDs to threads.
static NEXT_SLOT_ID: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    /// Slot index assigned to the current thread, stable for its lifetime.
    pub(crate) static THREAD_SLOT_INDEX: usize = get_next_slot_id();
}

/// Assigns the next slot ID to a thread, in the range `[0, NUM_COMPONENTS)`.
pub(crate) fn get_next_slot_id() -> usize {
    NEXT_SLOT_ID.fetch_add(1, Ordering::Relaxed) % NUM_COMPONENTS
}

/// The operations every counter variant supports.
///
/// Implementors must be `Send + Sync` so a single instance can be borrowed by
/// every task of a stress run. Whether concurrent increments are *exact* is a
/// property of the variant, see [`CounterKind::is_synchronized`].
///
/// Every variant wraps on overflow: incrementing `i64::MAX` yields `i64::MIN`.
///
/// # Examples
///
/// ```rust
/// use contesa::counters::Counter;
/// use contesa::counters::atomic::Atomic;
///
/// let counter = Atomic::new().with_name("hits");
/// counter.increment();
/// counter.increment();
///
/// assert_eq!(counter.load(), 2);
/// assert_eq!(counter.name(), "hits");
/// ```
pub trait Counter: Send + Sync + Debug {
    /// Adds one to the counter.
    fn increment(&self);

    /// Returns a snapshot of the current value.
    fn load(&self) -> i64;

    /// Returns the name given with `with_name()`, or an empty string.
    fn name(&self) -> &str;

    /// Returns the variant of this counter.
    fn kind(&self) -> CounterKind;

    /// Returns the name if set, the variant label otherwise.
    fn label(&self) -> &str {
        if self.name().is_empty() {
            self.kind().as_str()
        } else {
            self.name()
        }
    }
}

impl<C: Counter + ?Sized> Counter for Box<C> {
    #[inline]
    fn increment(&self) {
        (**self).increment()
    }

    #[inline]
    fn load(&self) -> i64 {
        (**self).load()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn kind(&self) -> CounterKind {
        (**self).kind()
    }
}

impl Display for dyn Counter + '_ {
    /// Formats the counter as `label:value`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.label(), self.load())
    }
}

/// Tag identifying a counter variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CounterKind {
    /// No coordination; loses updates under contention.
    Unsync,
    /// Guarded by a mutex.
    Locked,
    /// Single atomic read-modify-write.
    Atomic,
    /// Per-thread atomic slots summed on read.
    Sharded,
}

impl CounterKind {
    /// Every variant, in comparison order.
    pub const ALL: [CounterKind; 4] = [
        CounterKind::Unsync,
        CounterKind::Locked,
        CounterKind::Atomic,
        CounterKind::Sharded,
    ];

    /// Returns the lowercase label of the variant.
    pub const fn as_str(&self) -> &'static str {
        match self {
            CounterKind::Unsync => "unsync",
            CounterKind::Locked => "locked",
            CounterKind::Atomic => "atomic",
            CounterKind::Sharded => "sharded",
        }
    }

    /// Returns `true` if concurrent increments never get lost.
    ///
    /// ```rust
    /// use contesa::counters::CounterKind;
    ///
    /// assert!(!CounterKind::Unsync.is_synchronized());
    /// assert!(CounterKind::Locked.is_synchronized());
    /// ```
    pub const fn is_synchronized(&self) -> bool {
        !matches!(self, CounterKind::Unsync)
    }

    /// Builds a fresh, zeroed counter of this variant.
    pub fn new_counter(&self) -> Box<dyn Counter> {
        match self {
            CounterKind::Unsync => Box::new(unsync::Unsync::new()),
            CounterKind::Locked => Box::new(locked::Locked::new()),
            CounterKind::Atomic => Box::new(atomic::Atomic::new()),
            CounterKind::Sharded => Box::new(sharded::Sharded::new()),
        }
    }
}

impl Display for CounterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown counter kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown counter kind `{0}` (expected one of: unsync, locked, atomic, sharded)")]
pub struct ParseKindError(String);

impl FromStr for CounterKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CounterKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseKindError(s.to_string()))
    }
}

/// Access to the current thread's slot of a sharded counter.
pub(crate) trait GetComponentCounter {
    /// The atomic type used for individual slots.
    type CounterType: AtomicCell;

    /// Returns a reference to the current thread's slot.
    fn get_component_counter(&self) -> &Self::CounterType;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        let labels: Vec<&str> = CounterKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(labels, ["unsync", "locked", "atomic", "sharded"]);
        assert_eq!(CounterKind::Sharded.to_string(), "sharded");
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("atomic".parse::<CounterKind>(), Ok(CounterKind::Atomic));
        assert_eq!(" Locked ".parse::<CounterKind>(), Ok(CounterKind::Locked));
        assert!("spinlock".parse::<CounterKind>().is_err());
    }

    #[test]
    fn test_only_unsync_is_unsynchronized() {
        for kind in CounterKind::ALL {
            assert_eq!(kind.is_synchronized(), kind != CounterKind::Unsync);
        }
    }

    #[test]
    fn test_new_counter_is_zeroed() {
        for kind in CounterKind::ALL {
            let counter = kind.new_counter();
            assert_eq!(counter.kind(), kind);
            assert_eq!(counter.load(), 0);
            assert_eq!(counter.label(), kind.as_str());
        }
    }

    #[test]
    fn test_sequential_increments_are_exact_for_every_kind() {
        for kind in CounterKind::ALL {
            let counter = kind.new_counter();
            for _ in 0..500 {
                counter.increment();
            }
            assert_eq!(counter.load(), 500, "{kind}");
        }
    }

    #[test]
    fn test_load_is_idempotent() {
        for kind in CounterKind::ALL {
            let counter = kind.new_counter();
            counter.increment();
            counter.increment();
            let first = counter.load();
            assert_eq!(counter.load(), first);
            assert_eq!(counter.load(), first);
        }
    }

    #[test]
    fn test_dyn_format() {
        let counter = atomic::Atomic::new().with_name("hits");
        counter.increment();
        assert_eq!(format!("{}", &counter as &dyn Counter), "hits:1");

        let unnamed = CounterKind::Locked.new_counter();
        assert_eq!(format!("{}", unnamed.as_ref()), "locked:0");
    }

    #[test]
    fn test_slot_ids_in_range() {
        for _ in 0..(NUM_COMPONENTS * 2) {
            assert!(get_next_slot_id() < NUM_COMPONENTS);
        }
    }
}
