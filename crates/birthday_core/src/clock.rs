//! Wall-clock source abstraction.
//!
//! # Responsibility
//! - Provide "now" to countdown, age and session logic through injection.
//! - Resolve local wall-clock times to absolute instants in the clock's zone.
//! - Allow tests to pin time and zone without touching the system clock.
//!
//! # Invariants
//! - `now` is a local wall-clock value; elapsed time is only ever measured
//!   between instants returned by `resolve`.

use chrono::{DateTime, Local, NaiveDateTime, TimeDelta, TimeZone, Utc};
use std::sync::{Arc, Mutex, MutexGuard};

/// Source of the current time in one time zone.
pub trait Clock: Send + Sync {
    /// Current local wall-clock time.
    fn now(&self) -> NaiveDateTime;

    /// Absolute instant of the local wall-clock time `local` in this
    /// clock's zone.
    fn resolve(&self, local: NaiveDateTime) -> Option<DateTime<Utc>>;
}

/// Resolves `local` in `zone`.
///
/// Ambiguous times (clocks turned back) take the earlier instant. Times
/// skipped by a forward transition map to the instant the gap starts at,
/// so a missing midnight counts as the first moment of that day.
pub fn resolve_local<Z: TimeZone>(zone: &Z, local: NaiveDateTime) -> Option<DateTime<Utc>> {
    if let Some(instant) = zone.from_local_datetime(&local).earliest() {
        return Some(instant.with_timezone(&Utc));
    }
    let after_gap = local.checked_add_signed(TimeDelta::hours(1))?;
    zone.from_local_datetime(&after_gap)
        .earliest()
        .map(|instant| instant.with_timezone(&Utc))
}

/// Clock backed by the operating system local time and zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn resolve(&self, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        resolve_local(&Local, local)
    }
}

/// Manually driven clock for tests and replay tooling.
///
/// Clones share the same underlying instant. Defaults to UTC, where wall
/// time and elapsed time never diverge.
#[derive(Debug, Clone)]
pub struct FixedClock<Z: TimeZone = Utc> {
    zone: Z,
    instant: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    /// Creates a UTC clock reading `now`.
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            zone: Utc,
            instant: Arc::new(Mutex::new(now.and_utc())),
        }
    }
}

impl<Z: TimeZone> FixedClock<Z> {
    /// Creates a clock in `zone` whose wall clock reads `now`.
    ///
    /// Returns `None` only when `now` cannot be placed in `zone`.
    pub fn in_zone(zone: Z, now: NaiveDateTime) -> Option<Self> {
        let instant = resolve_local(&zone, now)?;
        Some(Self {
            zone,
            instant: Arc::new(Mutex::new(instant)),
        })
    }

    /// Moves the wall clock to `now`. Times the zone cannot place leave
    /// the clock unchanged.
    pub fn set(&self, now: NaiveDateTime) {
        if let Some(instant) = resolve_local(&self.zone, now) {
            *self.lock() = instant;
        }
    }

    /// Lets `delta` of real time pass.
    pub fn advance(&self, delta: TimeDelta) {
        let mut guard = self.lock();
        *guard += delta;
    }

    fn lock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        // A poisoned guard still holds a valid timestamp.
        self.instant
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<Z: TimeZone + Send + Sync> Clock for FixedClock<Z> {
    fn now(&self) -> NaiveDateTime {
        self.lock().with_timezone(&self.zone).naive_local()
    }

    fn resolve(&self, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        resolve_local(&self.zone, local)
    }
}
