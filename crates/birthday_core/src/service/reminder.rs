//! Reminder screen session.
//!
//! # Responsibility
//! - Hold the draft form, edit mode, alert banner and countdown toggle.
//! - Turn user actions into store mutations plus the matching alert.
//! - Build the list view rendered by front-ends.
//!
//! # Invariants
//! - A failed submit leaves the list and the draft untouched.
//! - A successful submit resets the draft and leaves edit mode.
//! - Every alert-producing action replaces the previous alert.
//! - Draft dates are never later than today.

use crate::clock::Clock;
use crate::countdown::{countdown_at, Countdown};
use crate::model::alert::{
    Alert, MSG_DETAILS_CHANGED, MSG_LIST_CLEARED, MSG_MISSING_DETAILS, MSG_PERSON_ADDED,
    MSG_PERSON_REMOVED,
};
use crate::model::person::{Person, PersonDraft, PersonId, PersonValidationError};
use crate::repo::storage::KeyValueStorage;
use crate::service::person_store::{PersonStore, StoreResult};
use chrono::{NaiveDate, NaiveDateTime};
use log::{info, warn};
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

/// Rejected draft date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FutureDateError {
    pub date: NaiveDate,
    pub today: NaiveDate,
}

impl Display for FutureDateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "birth date {} is after today ({})",
            self.date, self.today
        )
    }
}

impl Error for FutureDateError {}

/// Result of submitting the draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created(PersonId),
    Updated(PersonId),
    Rejected(PersonValidationError),
}

/// List ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Insertion,
    /// Case-insensitive by name.
    Name,
    /// Soonest next birthday first; birthdays today lead.
    Upcoming,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "insertion" => Ok(Self::Insertion),
            "name" => Ok(Self::Name),
            "upcoming" => Ok(Self::Upcoming),
            other => Err(format!(
                "unsupported sort order `{other}`; expected insertion|name|upcoming"
            )),
        }
    }
}

/// One rendered list entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRow {
    pub person: Person,
    /// Present only while countdowns are toggled on.
    pub countdown: Option<Countdown>,
}

/// Rendered list state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListView {
    /// `None` when the list is empty and the section is hidden.
    pub heading: Option<String>,
    /// Badge count of birthdays falling today.
    pub today_count: usize,
    pub rows: Vec<ListRow>,
}

/// Single-screen session over an injected store and clock.
pub struct ReminderSession<S: KeyValueStorage> {
    store: PersonStore<S>,
    clock: Arc<dyn Clock>,
    draft: PersonDraft,
    editing: Option<PersonId>,
    alert: Alert,
    show_countdowns: bool,
}

impl<S: KeyValueStorage> ReminderSession<S> {
    /// Starts a session with an empty draft and no alert.
    pub fn new(store: PersonStore<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            draft: PersonDraft::default(),
            editing: None,
            alert: Alert::hidden(),
            show_countdowns: false,
        }
    }

    /// Backing list.
    pub fn store(&self) -> &PersonStore<S> {
        &self.store
    }

    /// Shared handle to the session clock.
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Form contents as currently entered.
    pub fn draft(&self) -> &PersonDraft {
        &self.draft
    }

    /// Current alert banner.
    pub fn alert(&self) -> &Alert {
        &self.alert
    }

    /// Id of the record being edited, if any.
    pub fn editing(&self) -> Option<&PersonId> {
        self.editing.as_ref()
    }

    /// Whether list rows carry countdowns.
    pub fn show_countdowns(&self) -> bool {
        self.show_countdowns
    }

    /// Replaces the draft name as typed.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.draft.name = name.into();
    }

    /// Replaces the draft photo (a data URL).
    pub fn set_image(&mut self, image: impl Into<String>) {
        self.draft.image = image.into();
    }

    /// Drops the draft photo.
    pub fn clear_image(&mut self) {
        self.draft.image.clear();
    }

    /// Sets or clears the draft birth date.
    ///
    /// # Errors
    /// - `FutureDateError` when `date` is after today; the draft keeps its
    ///   previous date.
    pub fn set_date(&mut self, date: Option<NaiveDate>) -> Result<(), FutureDateError> {
        let today = self.clock.now().date();
        if let Some(date) = date {
            if date > today {
                return Err(FutureDateError { date, today });
            }
        }
        self.draft.date = date;
        Ok(())
    }

    /// Loads a record into the draft and enters edit mode.
    ///
    /// Returns `false` when `id` is unknown; nothing changes then.
    pub fn begin_edit(&mut self, id: &PersonId) -> bool {
        let Some(person) = self.store.get(id) else {
            return false;
        };
        self.draft = person.to_draft();
        self.editing = Some(id.clone());
        true
    }

    /// Leaves edit mode and resets the draft.
    pub fn cancel_edit(&mut self) {
        self.editing = None;
        self.draft = PersonDraft::default();
    }

    /// Creates or updates a record from the draft.
    ///
    /// Validation failures are reported through the alert and
    /// `SubmitOutcome::Rejected`, not as errors.
    ///
    /// # Errors
    /// - Storage errors from persisting the list; the draft is kept.
    pub fn submit(&mut self) -> StoreResult<SubmitOutcome> {
        if let Err(reason) = self.draft.validate() {
            warn!("event=submit module=session status=rejected reason={reason}");
            self.alert = Alert::error(MSG_MISSING_DETAILS);
            return Ok(SubmitOutcome::Rejected(reason));
        }

        let now = self.clock.now();
        let outcome = match self.editing.clone() {
            Some(id) => {
                self.store.update(&id, &self.draft, now)?;
                SubmitOutcome::Updated(id)
            }
            None => SubmitOutcome::Created(self.store.add(&self.draft, now)?),
        };

        self.alert = match outcome {
            SubmitOutcome::Updated(_) => Alert::success(MSG_DETAILS_CHANGED),
            _ => Alert::success(MSG_PERSON_ADDED),
        };
        self.cancel_edit();
        Ok(outcome)
    }

    /// Removes one record. Unknown ids change nothing.
    pub fn remove(&mut self, id: &PersonId) -> StoreResult<bool> {
        if !self.store.remove(id)? {
            return Ok(false);
        }
        if self.editing.as_ref() == Some(id) {
            self.cancel_edit();
        }
        self.alert = Alert::error(MSG_PERSON_REMOVED);
        Ok(true)
    }

    /// Removes every record.
    pub fn clear(&mut self) -> StoreResult<()> {
        self.store.clear()?;
        self.cancel_edit();
        self.alert = Alert::error(MSG_LIST_CLEARED);
        Ok(())
    }

    /// Hides the alert banner.
    pub fn dismiss_alert(&mut self) {
        self.alert = Alert::hidden();
    }

    /// Flips the countdown toggle and returns the new state.
    pub fn toggle_countdowns(&mut self) -> bool {
        self.show_countdowns = !self.show_countdowns;
        info!(
            "event=countdowns_toggle module=session status=ok enabled={}",
            self.show_countdowns
        );
        self.show_countdowns
    }

    /// Re-derives stored ages against the current clock.
    pub fn refresh_ages(&mut self) -> StoreResult<usize> {
        let now = self.clock.now();
        self.store.refresh_ages(now)
    }

    /// Builds the list view at the current clock time.
    pub fn list_view(&self, order: SortOrder) -> ListView {
        let clock = &*self.clock;
        let now = clock.now();
        let mut rows: Vec<ListRow> = self
            .store
            .people()
            .iter()
            .map(|person| ListRow {
                person: person.clone(),
                countdown: if self.show_countdowns {
                    person
                        .birthday_target()
                        .map(|target| countdown_at(target, now, clock))
                } else {
                    None
                },
            })
            .collect();

        match order {
            SortOrder::Insertion => {}
            SortOrder::Name => rows.sort_by_cached_key(|row| row.person.name.to_lowercase()),
            SortOrder::Upcoming => rows.sort_by(|a, b| {
                compare_upcoming(
                    seconds_until(&a.person, now, clock),
                    seconds_until(&b.person, now, clock),
                )
            }),
        }

        let count = self.store.len();
        ListView {
            heading: (count > 0).then(|| list_heading(count)),
            today_count: self.store.birthdays_today(now),
            rows,
        }
    }
}

fn seconds_until(person: &Person, now: NaiveDateTime, clock: &dyn Clock) -> Option<i64> {
    person
        .birthday_target()
        .map(|target| countdown_at(target, now, clock).total_seconds())
}

/// Undated records sort last.
fn compare_upcoming(a: Option<i64>, b: Option<i64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn list_heading(count: usize) -> String {
    if count > 1 {
        format!("{count} birthdays in the list")
    } else {
        format!("{count} birthday in the list")
    }
}

#[cfg(test)]
mod tests {
    use super::{compare_upcoming, list_heading, SortOrder};
    use std::cmp::Ordering;

    #[test]
    fn heading_pluralizes() {
        assert_eq!(list_heading(1), "1 birthday in the list");
        assert_eq!(list_heading(3), "3 birthdays in the list");
    }

    #[test]
    fn undated_sorts_last() {
        assert_eq!(compare_upcoming(Some(5), None), Ordering::Less);
        assert_eq!(compare_upcoming(None, Some(5)), Ordering::Greater);
        assert_eq!(compare_upcoming(Some(1), Some(5)), Ordering::Less);
    }

    #[test]
    fn sort_order_parses_case_insensitively() {
        assert_eq!(" Upcoming ".parse::<SortOrder>().unwrap(), SortOrder::Upcoming);
        assert!("random".parse::<SortOrder>().is_err());
    }
}
