//! Person record and draft models.
//!
//! # Responsibility
//! - Define the canonical record stored in the `people` list.
//! - Validate user drafts before they become records.
//! - Keep the wire shape compatible with the browser-era payload.
//!
//! # Invariants
//! - `id` is stable for the lifetime of a record.
//! - `age` is always derived from `date`, never entered directly.
//! - `date` carries no time component.

use crate::age::humanize_age;
use crate::countdown::BirthdayTarget;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of one person record.
///
/// Kept as an opaque string so ids written by older hosts (epoch
/// milliseconds) load unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(String);

impl PersonId {
    /// Generates a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrowed id text.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for PersonId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PersonId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Display for PersonId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validation error for drafts missing a required field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonValidationError {
    MissingName,
    MissingImage,
    MissingDate,
}

impl Display for PersonValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingName => write!(f, "name is required"),
            Self::MissingImage => write!(f, "image is required"),
            Self::MissingDate => write!(f, "birth date is required"),
        }
    }
}

impl Error for PersonValidationError {}

/// Form input for creating or editing a person.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonDraft {
    pub name: String,
    /// Encoded photo, normally a `data:` URL.
    pub image: String,
    pub date: Option<NaiveDate>,
}

impl PersonDraft {
    /// Complete draft with the given fields.
    pub fn new(name: impl Into<String>, image: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            date: Some(date),
        }
    }

    /// Checks required fields and returns the birth date on success.
    ///
    /// Whitespace-only names count as missing.
    pub fn validate(&self) -> Result<NaiveDate, PersonValidationError> {
        if self.name.trim().is_empty() {
            return Err(PersonValidationError::MissingName);
        }
        if self.image.is_empty() {
            return Err(PersonValidationError::MissingImage);
        }
        self.date.ok_or(PersonValidationError::MissingDate)
    }

    /// Whether nothing has been entered.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.image.is_empty() && self.date.is_none()
    }
}

/// Persisted person record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub image: String,
    pub name: String,
    /// Relative age text derived from `date` when last written.
    pub age: String,
    #[serde(default, with = "birth_date_format")]
    pub date: Option<NaiveDate>,
}

impl Person {
    /// Builds a new record from a validated draft with a generated id.
    pub fn from_draft(
        draft: &PersonDraft,
        now: NaiveDateTime,
    ) -> Result<Self, PersonValidationError> {
        Self::from_draft_with_id(PersonId::generate(), draft, now)
    }

    /// Builds a record from a validated draft with a caller-provided id.
    pub fn from_draft_with_id(
        id: PersonId,
        draft: &PersonDraft,
        now: NaiveDateTime,
    ) -> Result<Self, PersonValidationError> {
        let date = draft.validate()?;
        Ok(Self {
            id,
            image: draft.image.clone(),
            name: draft.name.clone(),
            age: humanize_age(date, now),
            date: Some(date),
        })
    }

    /// Replaces editable fields from a validated draft and re-derives age.
    pub fn apply_draft(
        &mut self,
        draft: &PersonDraft,
        now: NaiveDateTime,
    ) -> Result<(), PersonValidationError> {
        let date = draft.validate()?;
        self.name = draft.name.clone();
        self.image = draft.image.clone();
        self.date = Some(date);
        self.age = humanize_age(date, now);
        Ok(())
    }

    /// Loads this record back into an editable draft.
    pub fn to_draft(&self) -> PersonDraft {
        PersonDraft {
            name: self.name.clone(),
            image: self.image.clone(),
            date: self.date,
        }
    }

    /// Countdown target, when the record has a birth date.
    pub fn birthday_target(&self) -> Option<BirthdayTarget> {
        self.date.map(BirthdayTarget::from_birth_date)
    }

    /// Recomputes the age text for `now`. Returns whether it changed.
    pub fn refresh_age(&mut self, now: NaiveDateTime) -> bool {
        let Some(date) = self.date else {
            return false;
        };
        let age = humanize_age(date, now);
        if age == self.age {
            return false;
        }
        self.age = age;
        true
    }
}

/// Serde adapter for the `date` field.
///
/// Writes `YYYY-MM-DD`. Reads that form, RFC 3339 timestamps (reduced to
/// the local calendar date), or `null`.
mod birth_date_format {
    use chrono::{DateTime, Local, NaiveDate};
    use serde::{Deserialize, Deserializer, Serializer};

    const DATE_FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_str(&date.format(DATE_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        parse(&raw).map(Some).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse(raw: &str) -> Result<NaiveDate, String> {
        let trimmed = raw.trim();
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
            return Ok(date);
        }
        DateTime::parse_from_rfc3339(trimmed)
            .map(|timestamp| timestamp.with_timezone(&Local).date_naive())
            .map_err(|_| format!("invalid birth date `{trimmed}`"))
    }
}
