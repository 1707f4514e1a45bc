//! Shared types, adapter traits, and host contract for the guildset settings store.
//!
//! This crate holds everything the persistence adapters and the provider crate
//! have to agree on, so adapter crates compile without pulling in the
//! synchronization logic.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod error;
pub mod event_bus;
pub mod host;
pub mod prelude;
pub mod settings_adapter;
pub mod types;

// vim: ts=4
