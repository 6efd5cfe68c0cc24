//! Per-record countdown timers.
//!
//! # Responsibility
//! - Re-evaluate one record's countdown once per second on Tokio.
//! - Reconcile the set of live timers with the records currently shown.
//!
//! # Invariants
//! - A ticker owns exactly one periodic task; the task is aborted when the
//!   ticker is cancelled or dropped, whichever happens first.
//! - A `TickerSet` holds at most one ticker per person id.
//! - A ticker stops scheduling ticks once its countdown froze on the
//!   birthday; the last published value stays readable.

use crate::clock::Clock;
use crate::countdown::{BirthdayTarget, Countdown, CountdownSession};
use crate::model::person::{Person, PersonId};
use log::debug;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Refresh cadence of a displayed countdown.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Raised when a ticker is created outside a Tokio runtime.
#[derive(Debug)]
pub struct NoRuntimeError;

impl Display for NoRuntimeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "countdown tickers require a running tokio runtime")
    }
}

impl Error for NoRuntimeError {}

/// Live countdown for one record.
pub struct CountdownTicker {
    target: BirthdayTarget,
    updates: watch::Receiver<Countdown>,
    task: Option<JoinHandle<()>>,
}

impl CountdownTicker {
    /// Starts a ticker on the current Tokio runtime.
    pub fn spawn(target: BirthdayTarget, clock: Arc<dyn Clock>) -> Result<Self, NoRuntimeError> {
        let handle = Handle::try_current().map_err(|_| NoRuntimeError)?;
        Ok(Self::spawn_on(&handle, target, clock))
    }

    /// Starts a ticker on `handle`.
    ///
    /// The first value is computed synchronously so readers never observe
    /// an empty countdown.
    pub fn spawn_on(handle: &Handle, target: BirthdayTarget, clock: Arc<dyn Clock>) -> Self {
        let mut session = CountdownSession::new(target);
        let (tx, updates) = watch::channel(session.tick(&*clock));

        let task = if session.is_frozen() {
            None
        } else {
            Some(handle.spawn(async move {
                let mut interval = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
                interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    interval.tick().await;
                    let countdown = session.tick(&*clock);
                    if tx.send(countdown).is_err() || session.is_frozen() {
                        break;
                    }
                }
            }))
        };

        Self {
            target,
            updates,
            task,
        }
    }

    /// Day/month this ticker counts towards.
    pub fn target(&self) -> BirthdayTarget {
        self.target
    }

    /// Most recently published countdown.
    pub fn latest(&self) -> Countdown {
        *self.updates.borrow()
    }

    /// Receiver notified on every tick.
    pub fn subscribe(&self) -> watch::Receiver<Countdown> {
        self.updates.clone()
    }

    /// Whether the periodic task is still scheduled.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stops the periodic task. Later calls are no-ops.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for CountdownTicker {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Counts returned by [`TickerSet::sync_visible`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub started: usize,
    pub stopped: usize,
    pub kept: usize,
}

/// Live tickers keyed by the records currently on screen.
pub struct TickerSet {
    handle: Handle,
    clock: Arc<dyn Clock>,
    tickers: HashMap<PersonId, CountdownTicker>,
}

impl TickerSet {
    /// Creates an empty set bound to the current Tokio runtime.
    pub fn new(clock: Arc<dyn Clock>) -> Result<Self, NoRuntimeError> {
        let handle = Handle::try_current().map_err(|_| NoRuntimeError)?;
        Ok(Self::with_handle(handle, clock))
    }

    /// Creates an empty set spawning onto `handle`.
    pub fn with_handle(handle: Handle, clock: Arc<dyn Clock>) -> Self {
        Self {
            handle,
            clock,
            tickers: HashMap::new(),
        }
    }

    /// Makes the live tickers match `visible`.
    ///
    /// Records without a birth date get no ticker. A record whose birth
    /// date changed gets a fresh ticker, which also resets a frozen
    /// birthday countdown.
    pub fn sync_visible(&mut self, visible: &[Person]) -> SyncReport {
        let mut report = SyncReport::default();
        let wanted: HashMap<&PersonId, BirthdayTarget> = visible
            .iter()
            .filter_map(|person| person.birthday_target().map(|target| (&person.id, target)))
            .collect();

        let before = self.tickers.len();
        self.tickers.retain(|id, ticker| wanted.get(id) == Some(&ticker.target()));
        report.stopped = before - self.tickers.len();

        for (id, target) in wanted {
            if self.tickers.contains_key(id) {
                report.kept += 1;
                continue;
            }
            let ticker = CountdownTicker::spawn_on(&self.handle, target, Arc::clone(&self.clock));
            self.tickers.insert(id.clone(), ticker);
            report.started += 1;
        }

        debug!(
            "event=tickers_sync module=ticker status=ok started={} stopped={} kept={}",
            report.started, report.stopped, report.kept
        );
        report
    }

    /// Live ticker for `id`, if the record is visible and dated.
    pub fn get(&self, id: &PersonId) -> Option<&CountdownTicker> {
        self.tickers.get(id)
    }

    /// Latest countdown for `id`, when it has a ticker.
    pub fn latest(&self, id: &PersonId) -> Option<Countdown> {
        self.tickers.get(id).map(CountdownTicker::latest)
    }

    /// Number of live tickers.
    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    /// Cancels every ticker.
    pub fn clear(&mut self) {
        self.tickers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{CountdownTicker, TickerSet};
    use crate::clock::{Clock, FixedClock};
    use crate::countdown::BirthdayTarget;
    use crate::model::person::{Person, PersonDraft, PersonId};
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use std::sync::Arc;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(23, 59, 57)
            .unwrap()
    }

    fn person(id: &str, month: u32, day: u32) -> Person {
        let draft = PersonDraft::new(
            id,
            "data:image/png;base64,AA==",
            NaiveDate::from_ymd_opt(1990, month, day).unwrap(),
        );
        Person::from_draft_with_id(PersonId::from(id), &draft, start()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_publishes_once_per_second_and_freezes_on_birthday() {
        let clock = FixedClock::new(start());
        let shared: Arc<dyn Clock> = Arc::new(clock.clone());
        let ticker = CountdownTicker::spawn(BirthdayTarget::new(11, 3).unwrap(), shared).unwrap();
        let mut updates = ticker.subscribe();

        assert_eq!(ticker.latest().total_seconds(), 3);

        for expected in [2, 1] {
            clock.advance(Duration::seconds(1));
            updates.changed().await.unwrap();
            assert_eq!(updates.borrow_and_update().total_seconds(), expected);
        }

        clock.advance(Duration::seconds(1));
        updates.changed().await.unwrap();
        assert!(updates.borrow_and_update().is_birthday_today);

        clock.advance(Duration::days(1));
        assert!(updates.changed().await.is_err() || !ticker.is_running());
        assert!(ticker.latest().is_birthday_today);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_ticker_stops_updates() {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(start()));
        let ticker = CountdownTicker::spawn(BirthdayTarget::new(1, 1).unwrap(), clock).unwrap();
        let mut updates = ticker.subscribe();

        drop(ticker);

        assert!(updates.changed().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn sync_visible_tracks_records_one_ticker_each() {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(start()));
        let mut tickers = TickerSet::new(clock).unwrap();

        let ada = person("ada", 12, 10);
        let bob = person("bob", 1, 1);
        let report = tickers.sync_visible(&[ada.clone(), bob.clone()]);
        assert_eq!((report.started, report.stopped, report.kept), (2, 0, 0));

        let report = tickers.sync_visible(&[ada.clone(), bob.clone()]);
        assert_eq!((report.started, report.stopped, report.kept), (0, 0, 2));
        assert_eq!(tickers.len(), 2);

        let mut moved = bob.clone();
        moved.date = NaiveDate::from_ymd_opt(1990, 3, 11);
        let report = tickers.sync_visible(&[moved]);
        assert_eq!((report.started, report.stopped, report.kept), (1, 2, 0));
        assert_eq!(tickers.len(), 1);
        assert!(tickers.latest(&ada.id).is_none());
        assert_eq!(tickers.latest(&bob.id).unwrap().total_seconds(), 3);
        let restarted = tickers.get(&bob.id).unwrap();
        assert_eq!(restarted.target(), BirthdayTarget::new(11, 3).unwrap());
        assert!(restarted.is_running());

        tickers.clear();
        assert!(tickers.is_empty());
    }

    #[test]
    fn spawn_outside_runtime_is_rejected() {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(start()));
        assert!(CountdownTicker::spawn(BirthdayTarget::new(1, 1).unwrap(), clock).is_err());
    }
}
