//! Host event bus
//!
//! Named-event listener registry. Listeners are async and are awaited in
//! registration order by `emit`, so every store operation a listener issues has
//! completed when `emit` returns.

use futures::future::BoxFuture;
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::host::{EventKind, HostEvent};
use crate::prelude::*;

pub type Listener = Arc<dyn Fn(HostEvent) -> BoxFuture<'static, GsResult<()>> + Send + Sync>;

/// Handle returned by [`EventBus::on`], used to unbind the listener
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Registration {
	id: ListenerId,
	kind: EventKind,
	listener: Listener,
}

pub struct EventBus {
	listeners: RwLock<Vec<Registration>>,
	next_id: AtomicU64,
}

impl EventBus {
	pub fn new() -> Self {
		Self { listeners: RwLock::new(Vec::new()), next_id: AtomicU64::new(1) }
	}

	/// Bind a listener to one event kind
	pub fn on<F, Fut>(&self, kind: EventKind, f: F) -> ListenerId
	where
		F: Fn(HostEvent) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = GsResult<()>> + Send + 'static,
	{
		let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
		let listener: Listener = Arc::new(move |event| Box::pin(f(event)));
		self.listeners.write().push(Registration { id, kind, listener });
		debug!(event = kind.name(), id = id.0, "Listener bound");
		id
	}

	/// Unbind a listener. Returns false if it was not bound.
	pub fn off(&self, id: ListenerId) -> bool {
		let mut listeners = self.listeners.write();
		let before = listeners.len();
		listeners.retain(|reg| reg.id != id);
		before != listeners.len()
	}

	pub fn listener_count(&self, kind: EventKind) -> usize {
		self.listeners.read().iter().filter(|reg| reg.kind == kind).count()
	}

	/// Dispatch an event to every listener bound to its kind.
	///
	/// All listeners run even if one fails; the first failure is returned.
	pub async fn emit(&self, event: HostEvent) -> GsResult<()> {
		let kind = event.kind();
		let listeners: Vec<Listener> = self
			.listeners
			.read()
			.iter()
			.filter(|reg| reg.kind == kind)
			.map(|reg| reg.listener.clone())
			.collect();

		let mut result = Ok(());
		for listener in listeners {
			if let Err(err) = listener(event.clone()).await {
				warn!(event = kind.name(), "Listener failed: {}", err);
				if result.is_ok() {
					result = Err(err);
				}
			}
		}
		result
	}
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for EventBus {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("EventBus").field("listeners", &self.listeners.read().len()).finish()
	}
}


// vim: ts=4
