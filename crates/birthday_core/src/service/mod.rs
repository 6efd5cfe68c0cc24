//! Core use-case services.
//!
//! # Responsibility
//! - Own the person list and keep durable storage in sync with it.
//! - Model the single reminder screen (draft form, edit mode, alerts,
//!   list view) on top of the store.
//!
//! # Invariants
//! - Services never bypass draft validation.
//! - Storage backends are injected; no service reaches for global state.

pub mod person_store;
pub mod reminder;
