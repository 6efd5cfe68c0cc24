//! Birthday countdown engine.
//!
//! # Responsibility
//! - Decide whether "now" is a person's birthday (year ignored).
//! - Compute the remaining time to the next anniversary as
//!   days/hours/minutes/seconds.
//!
//! # Invariants
//! - `hours < 24`, `minutes < 60`, `seconds < 60`, `days >= 0`.
//! - `days * 86400 + hours * 3600 + minutes * 60 + seconds` equals the
//!   truncated number of seconds between the instants of now and of the
//!   anniversary's local midnight, so daylight-saving shifts in between
//!   are counted.
//! - An anniversary strictly before now always rolls over to next year.
//! - Once a session observes the birthday it stays frozen until recreated.

use crate::clock::Clock;
use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime};
use std::error::Error;
use std::fmt::{Display, Formatter};

const SECONDS_PER_MINUTE: i64 = 60;
const MINUTES_PER_HOUR: i64 = 60;
const HOURS_PER_DAY: i64 = 24;

/// Error returned for out-of-range day/month input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetError {
    InvalidDay(u32),
    InvalidMonth(u32),
}

impl Display for TargetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDay(day) => write!(f, "day must be within 1..=31, got {day}"),
            Self::InvalidMonth(month) => write!(f, "month must be within 1..=12, got {month}"),
        }
    }
}

impl Error for TargetError {}

/// Birth day/month pair a countdown runs towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BirthdayTarget {
    day: u32,
    month: u32,
}

impl BirthdayTarget {
    /// Creates a target from a 1-based day and month.
    ///
    /// # Errors
    /// - `InvalidDay` when `day` is outside `1..=31`.
    /// - `InvalidMonth` when `month` is outside `1..=12`.
    pub fn new(day: u32, month: u32) -> Result<Self, TargetError> {
        if !(1..=31).contains(&day) {
            return Err(TargetError::InvalidDay(day));
        }
        if !(1..=12).contains(&month) {
            return Err(TargetError::InvalidMonth(month));
        }
        Ok(Self { day, month })
    }

    /// Takes the day and month of a birth date.
    pub fn from_birth_date(date: NaiveDate) -> Self {
        Self {
            day: date.day(),
            month: date.month(),
        }
    }

    /// Day of month, 1-based.
    pub fn day(&self) -> u32 {
        self.day
    }

    /// Month, 1-based.
    pub fn month(&self) -> u32 {
        self.month
    }

    /// Returns whether `now` falls on this day/month in any year.
    pub fn is_today(&self, now: NaiveDateTime) -> bool {
        now.day() == self.day && now.month() == self.month
    }

    /// Local midnight of the anniversary in `year`.
    ///
    /// Days past the end of the month overflow into the next month, so
    /// 29 February resolves to 1 March in non-leap years.
    pub fn anniversary_in(&self, year: i32) -> Option<NaiveDateTime> {
        let first = NaiveDate::from_ymd_opt(year, self.month, 1)?;
        first
            .checked_add_days(Days::new(u64::from(self.day - 1)))
            .map(|date| date.and_time(NaiveTime::MIN))
    }

    /// Next anniversary at or after `now`.
    pub fn next_anniversary(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        let this_year = self.anniversary_in(now.year())?;
        if this_year < now {
            return self.anniversary_in(now.year() + 1);
        }
        Some(this_year)
    }
}

/// One countdown evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Countdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub is_birthday_today: bool,
}

impl Countdown {
    /// Splits a non-negative number of seconds into countdown fields.
    pub fn from_total_seconds(total: i64) -> Self {
        let total = total.max(0);
        let minutes_total = total / SECONDS_PER_MINUTE;
        let hours_total = minutes_total / MINUTES_PER_HOUR;
        Self {
            days: hours_total / HOURS_PER_DAY,
            hours: hours_total % HOURS_PER_DAY,
            minutes: minutes_total % MINUTES_PER_HOUR,
            seconds: total % SECONDS_PER_MINUTE,
            is_birthday_today: false,
        }
    }

    fn birthday() -> Self {
        Self {
            is_birthday_today: true,
            ..Self::default()
        }
    }

    /// Recombines the duration fields into seconds.
    pub fn total_seconds(&self) -> i64 {
        ((self.days * HOURS_PER_DAY + self.hours) * MINUTES_PER_HOUR + self.minutes)
            * SECONDS_PER_MINUTE
            + self.seconds
    }
}

impl Display for Countdown {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_birthday_today {
            return write!(f, "happy birthday!");
        }
        write!(
            f,
            "{}d {:02}h {:02}m {:02}s",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

/// Evaluates the countdown for `target` at the local time `now`.
///
/// The today-match uses the wall-clock day and month; the remaining time
/// is the difference of the two instants `clock` resolves.
pub fn countdown_at(target: BirthdayTarget, now: NaiveDateTime, clock: &dyn Clock) -> Countdown {
    if target.is_today(now) {
        return Countdown::birthday();
    }

    // `None` only at the edge of the representable calendar.
    let Some(anniversary) = target.next_anniversary(now) else {
        return Countdown::default();
    };
    let remaining = match (clock.resolve(anniversary), clock.resolve(now)) {
        (Some(anniversary), Some(now)) => anniversary - now,
        _ => anniversary - now,
    };
    Countdown::from_total_seconds(remaining.num_seconds())
}

/// Countdown evaluation state for one displayed record.
///
/// Mirrors one mounted countdown view: after the birthday is observed the
/// session keeps returning the frozen birthday state.
#[derive(Debug, Clone)]
pub struct CountdownSession {
    target: BirthdayTarget,
    frozen: bool,
}

impl CountdownSession {
    /// Creates an unfrozen session.
    pub fn new(target: BirthdayTarget) -> Self {
        Self {
            target,
            frozen: false,
        }
    }

    /// Day/month this session counts towards.
    pub fn target(&self) -> BirthdayTarget {
        self.target
    }

    /// Whether the birthday has been observed.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Performs one countdown tick at the clock's current time.
    pub fn tick(&mut self, clock: &dyn Clock) -> Countdown {
        if self.frozen {
            return Countdown::birthday();
        }

        let countdown = countdown_at(self.target, clock.now(), clock);
        if countdown.is_birthday_today {
            self.frozen = true;
        }
        countdown
    }
}
