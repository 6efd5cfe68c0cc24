//! Domain model for the birthday list.
//!
//! # Responsibility
//! - Define the persisted person record and the draft used to create/edit it.
//! - Define the transient alert shown after list actions.
//!
//! # Invariants
//! - Every record is identified by a `PersonId` unique within the list.
//! - A record is valid only when name, image and birth date are present.

pub mod alert;
pub mod person;
