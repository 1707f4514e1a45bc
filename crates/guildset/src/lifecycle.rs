//! Lifecycle controller: binds the sync engine to the host's event bus.
//!
//! Listeners hold a weak reference to the provider, so a provider dropped
//! without `shutdown()` leaves inert listeners behind instead of a reference cycle.

use std::sync::{Arc, Weak};

use guildset_types::event_bus::{EventBus, ListenerId};
use guildset_types::host::{EventKind, HostEvent};

use crate::prelude::*;
use crate::provider::Inner;
use crate::sync::SyncEngine;

async fn dispatch(inner: Weak<Inner>, event: HostEvent) -> GsResult<()> {
	let Some(inner) = inner.upgrade() else {
		return Ok(());
	};
	let Some(host) = inner.host() else {
		debug!(event = event.kind().name(), "Event after shutdown ignored");
		return Ok(());
	};
	SyncEngine::new(&inner, host.as_ref()).handle(event).await
}

/// Bind one listener per event kind. Returns the ids needed to unbind them.
pub(crate) fn bind(inner: &Arc<Inner>, bus: &EventBus) -> Vec<ListenerId> {
	let ids: Vec<ListenerId> = EventKind::ALL
		.into_iter()
		.map(|kind| {
			let weak = Arc::downgrade(inner);
			bus.on(kind, move |event| dispatch(weak.clone(), event))
		})
		.collect();
	info!("Settings provider bound {} host event listeners", ids.len());
	ids
}

/// Unbind listeners; ids that are no longer bound are skipped
pub(crate) fn unbind(bus: &EventBus, ids: impl IntoIterator<Item = ListenerId>) -> usize {
	let removed = ids.into_iter().filter(|id| bus.off(*id)).count();
	info!("Settings provider unbound {} host event listeners", removed);
	removed
}

// vim: ts=4
