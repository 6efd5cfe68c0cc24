//! Durable storage contracts and implementations.
//!
//! # Responsibility
//! - Define the local-storage style key/value contract used by services.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - A written value is returned verbatim by the next read of its key.
//! - Absent keys read as `None`, never as an empty string.

pub mod storage;
