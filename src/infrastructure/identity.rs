//! Identity and time capabilities injected into stores and the sync client.
//!
//! Production code uses [`UuidIdGenerator`] and [`SystemClock`]; tests swap in
//! [`SequentialIdGenerator`] and [`ManualClock`] for deterministic ids and
//! ordering.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use uuid::Uuid;

use crate::domain::Timestamp;

// =============================================================================
// Id Generation
// =============================================================================

/// Source of globally unique record identifiers.
pub trait IdGenerator: Send + Sync {
    /// Returns a fresh identifier never returned before by this generator.
    fn next_id(&self) -> String;
}

/// Generates time-ordered UUID v7 identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&self) -> String {
        Uuid::now_v7().to_string()
    }
}

/// Generates `"<prefix>-<n>"` identifiers from a counter.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialIdGenerator {
    /// Creates a generator whose first id is `"<prefix>-1"`.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> String {
        let next = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}-{next}", self.prefix)
    }
}

// =============================================================================
// Clock
// =============================================================================

/// Source of creation timestamps.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> Timestamp;
}

/// Reads the system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock that only moves when told to.
///
/// Each call to [`Clock::now`] advances the clock by `step` milliseconds
/// after reading it, so consecutive creations get increasing timestamps
/// unless `step` is zero.
#[derive(Debug)]
pub struct ManualClock {
    current: AtomicI64,
    step: i64,
}

impl ManualClock {
    /// Creates a clock starting at `start` that advances by `step` per read.
    #[must_use]
    pub const fn new(start: i64, step: i64) -> Self {
        Self {
            current: AtomicI64::new(start),
            step,
        }
    }

    /// Creates a clock frozen at `at`.
    #[must_use]
    pub const fn frozen(at: i64) -> Self {
        Self::new(at, 0)
    }

    /// Moves the clock forward without reading it.
    pub fn advance(&self, millis: i64) {
        self.current.fetch_add(millis, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.current.fetch_add(self.step, Ordering::Relaxed))
    }
}
