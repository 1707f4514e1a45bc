//! Read cache of formatted settings maps, keyed by scope
//!
//! Every invalidation bumps a generation counter. A reader records the
//! generation before going to the store and only fills the cache if nothing was
//! invalidated meanwhile, so a slow read can never re-insert a map that a
//! concurrent write already made stale.

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::prelude::*;

struct Inner {
	lru: LruCache<Scope, Arc<SettingsMap>>,
	generation: u64,
}

pub struct SettingsCache {
	/// `None` when caching is disabled
	inner: Option<Mutex<Inner>>,
}

impl SettingsCache {
	/// A capacity of zero disables the cache
	pub fn new(capacity: usize) -> Self {
		let inner = NonZeroUsize::new(capacity)
			.map(|cap| Mutex::new(Inner { lru: LruCache::new(cap), generation: 0 }));
		Self { inner }
	}

	pub fn is_enabled(&self) -> bool {
		self.inner.is_some()
	}

	pub fn get(&self, scope: &Scope) -> Option<Arc<SettingsMap>> {
		self.inner.as_ref()?.lock().lru.get(scope).cloned()
	}

	pub fn generation(&self) -> u64 {
		self.inner.as_ref().map_or(0, |inner| inner.lock().generation)
	}

	/// Insert unless an invalidation happened since `generation` was read
	pub fn put_if_current(&self, scope: Scope, settings: Arc<SettingsMap>, generation: u64) -> bool {
		let Some(inner) = &self.inner else {
			return false;
		};
		let mut inner = inner.lock();
		if inner.generation != generation {
			return false;
		}
		inner.lru.put(scope, settings);
		true
	}

	/// Drop exactly this scope's entry
	pub fn invalidate(&self, scope: &Scope) {
		if let Some(inner) = &self.inner {
			let mut inner = inner.lock();
			inner.generation += 1;
			inner.lru.pop(scope);
		}
	}

	pub fn clear(&self) {
		if let Some(inner) = &self.inner {
			let mut inner = inner.lock();
			inner.generation += 1;
			inner.lru.clear();
		}
	}

	pub fn len(&self) -> usize {
		self.inner.as_ref().map_or(0, |inner| inner.lock().lru.len())
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}


// vim: ts=4
