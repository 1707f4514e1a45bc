pub use guildset_types::error::{Error, GsResult};
pub use guildset_types::types::{Scope, SettingsMap, Timestamp, TnId};

pub use tracing::{debug, debug_span, error, error_span, info, info_span, warn, warn_span};

// vim: ts=4
