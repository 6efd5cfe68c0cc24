//! Person list store.
//!
//! # Responsibility
//! - Provide add/update/remove/clear over the in-memory person list.
//! - Rewrite the whole list to storage after every mutation.
//!
//! # Invariants
//! - The in-memory list is the only source for rendering.
//! - A mutation is visible in memory only after its write succeeded.
//! - Ids are unique within the list.

use crate::model::person::{Person, PersonDraft, PersonId, PersonValidationError};
use crate::repo::storage::{KeyValueStorage, StorageError};
use chrono::NaiveDateTime;
use log::{error, info};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage key holding the JSON array of people.
pub const PEOPLE_KEY: &str = "people";

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    Validation(PersonValidationError),
    NotFound(PersonId),
    Storage(StorageError),
    /// Persisted payload could not be decoded.
    Corrupt(serde_json::Error),
    /// Persisted payload decoded but breaks a list invariant.
    InvalidData(String),
    Encode(serde_json::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "person not found: {id}"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::Corrupt(err) => write!(f, "persisted people list is malformed: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted people list: {message}"),
            Self::Encode(err) => write!(f, "failed to encode people list: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::Corrupt(err) | Self::Encode(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<PersonValidationError> for StoreError {
    fn from(value: PersonValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StorageError> for StoreError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// Owned person list backed by key/value storage.
pub struct PersonStore<S: KeyValueStorage> {
    storage: S,
    people: Vec<Person>,
}

impl<S: KeyValueStorage> PersonStore<S> {
    /// Loads the list from storage.
    ///
    /// An absent key yields an empty list.
    ///
    /// # Errors
    /// - `Corrupt` when the stored JSON does not decode.
    /// - `InvalidData` when two records share an id.
    pub fn load(storage: S) -> StoreResult<Self> {
        let people = match storage.get_item(PEOPLE_KEY)? {
            Some(raw) => decode_people(&raw)?,
            None => Vec::new(),
        };
        info!(
            "event=people_load module=store status=ok count={}",
            people.len()
        );
        Ok(Self { storage, people })
    }

    /// Records in insertion order.
    pub fn people(&self) -> &[Person] {
        &self.people
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    /// Record with `id`, if present.
    pub fn get(&self, id: &PersonId) -> Option<&Person> {
        self.people.iter().find(|person| &person.id == id)
    }

    /// Underlying key/value storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Appends a new person built from `draft`.
    pub fn add(&mut self, draft: &PersonDraft, now: NaiveDateTime) -> StoreResult<PersonId> {
        let person = Person::from_draft(draft, now)?;
        let id = person.id.clone();

        let mut next = self.people.clone();
        next.push(person);
        self.commit(next, "add")?;

        info!(
            "event=person_add module=store status=ok id={} count={}",
            id,
            self.people.len()
        );
        Ok(id)
    }

    /// Replaces name, image and date of an existing person.
    pub fn update(
        &mut self,
        id: &PersonId,
        draft: &PersonDraft,
        now: NaiveDateTime,
    ) -> StoreResult<()> {
        let index = self
            .position(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        let mut next = self.people.clone();
        next[index].apply_draft(draft, now)?;
        self.commit(next, "update")?;

        info!("event=person_update module=store status=ok id={id}");
        Ok(())
    }

    /// Removes one person. Returns `false` without writing when absent.
    pub fn remove(&mut self, id: &PersonId) -> StoreResult<bool> {
        let Some(index) = self.position(id) else {
            return Ok(false);
        };

        let mut next = self.people.clone();
        next.remove(index);
        self.commit(next, "remove")?;

        info!(
            "event=person_remove module=store status=ok id={} count={}",
            id,
            self.people.len()
        );
        Ok(true)
    }

    /// Empties the list.
    pub fn clear(&mut self) -> StoreResult<()> {
        let previous = self.people.len();
        self.commit(Vec::new(), "clear")?;
        info!("event=people_clear module=store status=ok removed={previous}");
        Ok(())
    }

    /// Number of people whose birthday falls on `now` (year ignored).
    pub fn birthdays_today(&self, now: NaiveDateTime) -> usize {
        self.people
            .iter()
            .filter_map(Person::birthday_target)
            .filter(|target| target.is_today(now))
            .count()
    }

    /// Re-derives stored age strings. Writes only when something changed.
    pub fn refresh_ages(&mut self, now: NaiveDateTime) -> StoreResult<usize> {
        let mut next = self.people.clone();
        let changed = next
            .iter_mut()
            .map(|person| person.refresh_age(now))
            .filter(|changed| *changed)
            .count();
        if changed > 0 {
            self.commit(next, "refresh_ages")?;
        }
        Ok(changed)
    }

    fn position(&self, id: &PersonId) -> Option<usize> {
        self.people.iter().position(|person| &person.id == id)
    }

    fn commit(&mut self, next: Vec<Person>, action: &'static str) -> StoreResult<()> {
        let result = serde_json::to_string(&next)
            .map_err(StoreError::Encode)
            .and_then(|payload| Ok(self.storage.set_item(PEOPLE_KEY, &payload)?));

        if let Err(err) = &result {
            error!(
                "event=people_persist module=store status=error action={} error={}",
                action, err
            );
            return result;
        }

        self.people = next;
        Ok(())
    }
}

fn decode_people(raw: &str) -> StoreResult<Vec<Person>> {
    let people: Vec<Person> = serde_json::from_str(raw).map_err(StoreError::Corrupt)?;

    let mut seen = HashSet::with_capacity(people.len());
    for person in &people {
        if !seen.insert(&person.id) {
            return Err(StoreError::InvalidData(format!(
                "duplicate person id `{}`",
                person.id
            )));
        }
    }
    Ok(people)
}

#[cfg(test)]
mod tests {
    use super::{decode_people, StoreError};

    #[test]
    fn decode_rejects_duplicate_ids() {
        let raw = r#"[
            {"id": "1", "image": "", "name": "a", "age": "", "date": null},
            {"id": "1", "image": "", "name": "b", "age": "", "date": null}
        ]"#;

        let err = decode_people(raw).unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(message) if message.contains("`1`")));
    }

    #[test]
    fn decode_rejects_malformed_json() {
        let err = decode_people("[{\"id\": ").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }
}
