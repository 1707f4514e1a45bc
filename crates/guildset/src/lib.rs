//! Per-tenant settings store with lazy schema growth.
//!
//! Settings live in one wide table: one row per tenant (plus a sentinel row for
//! the global scope), one column per setting key. Columns are added the first
//! time a key is written. [`SettingsProvider`] exposes get/set/remove/clear per
//! scope and keeps a host's live state (prefixes, command and group switches)
//! in step with what is persisted, in both directions.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod format;
mod lifecycle;
pub mod memory;
pub mod prelude;
pub mod provider;
pub mod schema;
pub mod store;
mod sync;

pub use format::format_row;
pub use memory::{MemoryAdapter, MemoryHost};
pub use provider::{DEFAULT_CACHE_SIZE, ProviderBuilder, ProviderOpts, SettingsProvider};

pub use guildset_types::error::{Error, GsResult};
pub use guildset_types::event_bus::{EventBus, ListenerId};
pub use guildset_types::host::{EventKind, Host, HostEvent};
pub use guildset_types::settings_adapter::SettingsAdapter;
pub use guildset_types::types::{Scope, SettingsMap, TnId};

// vim: ts=4
