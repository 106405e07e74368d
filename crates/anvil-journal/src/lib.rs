//! Anvil Journal - renderer-facing record of everything the simulation did.
//!
//! The simulation core is headless. Whatever a presentation layer needs to
//! animate is appended to an [`EventJournal`](journal::EventJournal) and
//! drained once per frame; nothing flows back.
//!
//! # Modules
//!
//! - [`journal`]: typed simulation events, journal entries stamped with frame
//!   and sequence number, and the journal with its query API.

#![deny(unsafe_code)]

pub mod journal;

pub use journal::{EffectKind, EventJournal, JournalEntry, SimEvent};
