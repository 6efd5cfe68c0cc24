//! Core domain logic for the birthday reminder.
//! This crate is the single source of truth for list and countdown invariants.

pub mod age;
pub mod clock;
pub mod countdown;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod ticker;

pub use age::{humanize_age, humanize_delta};
pub use clock::{resolve_local, Clock, FixedClock, SystemClock};
pub use countdown::{countdown_at, BirthdayTarget, Countdown, CountdownSession, TargetError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::alert::{Alert, AlertSeverity};
pub use model::person::{Person, PersonDraft, PersonId, PersonValidationError};
pub use repo::storage::{KeyValueStorage, SqliteStorage, StorageError, StorageResult};
pub use service::person_store::{PersonStore, StoreError, StoreResult, PEOPLE_KEY};
pub use service::reminder::{
    FutureDateError, ListRow, ListView, ReminderSession, SortOrder, SubmitOutcome,
};
pub use ticker::{CountdownTicker, NoRuntimeError, SyncReport, TickerSet, TICK_PERIOD};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
