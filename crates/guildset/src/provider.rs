//! Settings provider - the public surface
//!
//! `init` prepares the table, plays persisted settings into the host and binds
//! the event listeners; `shutdown` unbinds them. `get`/`set`/`remove`/`clear`
//! work on one scope at a time and keep the read cache exact.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use guildset_types::event_bus::ListenerId;
use guildset_types::host::Host;
use guildset_types::settings_adapter::SettingsAdapter;
use guildset_types::types::validate_key;

use crate::cache::SettingsCache;
use crate::lifecycle;
use crate::prelude::*;
use crate::store::ValueStore;
use crate::sync::SyncEngine;

pub const DEFAULT_CACHE_SIZE: usize = 128;

#[derive(Clone, Debug)]
pub struct ProviderOpts {
	/// Number of scopes kept in the read cache; 0 disables it
	pub cache_size: usize,
}

impl Default for ProviderOpts {
	fn default() -> Self {
		Self { cache_size: DEFAULT_CACHE_SIZE }
	}
}

/// State shared between the provider handle and its event listeners
pub(crate) struct Inner {
	pub(crate) store: ValueStore,
	pub(crate) cache: SettingsCache,
	ready: AtomicBool,
	host: RwLock<Option<Arc<dyn Host>>>,
	listeners: Mutex<Vec<ListenerId>>,
}

impl Inner {
	pub(crate) fn host(&self) -> Option<Arc<dyn Host>> {
		self.host.read().clone()
	}

	fn ensure_ready(&self) -> GsResult<()> {
		if self.ready.load(Ordering::Acquire) { Ok(()) } else { Err(Error::NotInitialized) }
	}

	/// Formatted settings of a scope, through the read cache
	pub(crate) async fn settings(&self, scope: &Scope) -> GsResult<Arc<SettingsMap>> {
		self.ensure_ready()?;
		if let Some(settings) = self.cache.get(scope) {
			debug!("Settings cache hit: {}", scope);
			return Ok(settings);
		}

		let generation = self.cache.generation();
		let settings = Arc::new(self.store.get(scope).await?);
		self.cache.put_if_current(scope.clone(), settings.clone(), generation);
		Ok(settings)
	}

	pub(crate) async fn set(&self, scope: &Scope, key: &str, value: &str) -> GsResult<()> {
		self.ensure_ready()?;
		validate_key(key)?;
		let res = self.store.upsert(scope, key, Some(value)).await;
		self.cache.invalidate(scope);
		res
	}

	pub(crate) async fn remove(&self, scope: &Scope, key: &str) -> GsResult<Option<String>> {
		self.ensure_ready()?;
		validate_key(key)?;
		let Some(previous) = self.settings(scope).await?.get(key).cloned() else {
			return Ok(None);
		};
		let res = self.store.upsert(scope, key, None).await;
		self.cache.invalidate(scope);
		res.map(|()| Some(previous))
	}

	pub(crate) async fn clear(&self, scope: &Scope) -> GsResult<()> {
		self.ensure_ready()?;
		let res = self.store.delete_tenant(scope).await;
		self.cache.invalidate(scope);
		res.map(|_| ())
	}
}

pub struct SettingsProvider {
	inner: Arc<Inner>,
}

impl SettingsProvider {
	pub fn new(adapter: Arc<dyn SettingsAdapter>) -> Self {
		Self::with_opts(adapter, ProviderOpts::default())
	}

	pub fn with_opts(adapter: Arc<dyn SettingsAdapter>, opts: ProviderOpts) -> Self {
		Self {
			inner: Arc::new(Inner {
				store: ValueStore::new(adapter),
				cache: SettingsCache::new(opts.cache_size),
				ready: AtomicBool::new(false),
				host: RwLock::new(None),
				listeners: Mutex::new(Vec::new()),
			}),
		}
	}

	pub fn builder(adapter: Arc<dyn SettingsAdapter>) -> ProviderBuilder {
		ProviderBuilder { adapter, opts: ProviderOpts::default() }
	}

	// Lifecycle
	//***********

	/// Prepare storage, apply persisted settings to the host and start listening
	/// to host events. A failure leaves the host without listeners.
	pub async fn init(&self, host: Arc<dyn Host>) -> GsResult<()> {
		if !self.inner.listeners.lock().is_empty() {
			warn!("Settings provider initialized twice, shutting down the previous binding");
			self.shutdown();
		}

		self.inner.ready.store(false, Ordering::Release);

		let schema = self.inner.store.schema();
		schema.ensure_table().await.inspect_err(|err| error!("Settings table init failed: {}", err))?;
		schema.load_columns().await?;

		let applied = SyncEngine::new(&self.inner, host.as_ref())
			.startup()
			.await
			.inspect_err(|err| error!("Settings startup scan failed: {}", err))?;
		info!("Settings applied for {} scopes", applied);
		self.inner.ready.store(true, Ordering::Release);

		let ids = lifecycle::bind(&self.inner, host.events());
		*self.inner.host.write() = Some(host);
		self.inner.listeners.lock().extend(ids);
		Ok(())
	}

	/// Unbind every listener bound by `init`. Safe to call more than once.
	pub fn shutdown(&self) {
		let ids: Vec<ListenerId> = self.inner.listeners.lock().drain(..).collect();
		let host = self.inner.host.write().take();
		if let Some(host) = host {
			lifecycle::unbind(host.events(), ids);
		}
		self.inner.cache.clear();
	}

	pub fn is_initialized(&self) -> bool {
		self.inner.host.read().is_some()
	}

	// Settings
	//**********

	/// Value of `key` in `scope`, or `None` if unset
	pub async fn get(&self, scope: &Scope, key: &str) -> GsResult<Option<String>> {
		Ok(self.inner.settings(scope).await?.get(key).cloned())
	}

	/// Value of `key` in `scope`, or `default` if unset
	pub async fn get_or(&self, scope: &Scope, key: &str, default: &str) -> GsResult<String> {
		Ok(self.get(scope, key).await?.unwrap_or_else(|| default.to_string()))
	}

	/// All settings of one scope
	pub async fn get_all(&self, scope: &Scope) -> GsResult<SettingsMap> {
		Ok(self.inner.settings(scope).await?.as_ref().clone())
	}

	/// Every persisted scope, bypassing the cache
	pub async fn all(&self) -> GsResult<HashMap<Scope, SettingsMap>> {
		self.inner.ensure_ready()?;
		self.inner.store.all().await
	}

	/// Store a value and return it
	pub async fn set(&self, scope: &Scope, key: &str, value: impl Into<String>) -> GsResult<String> {
		let value = value.into();
		self.inner.set(scope, key, &value).await?;
		Ok(value)
	}

	/// Unset a key, returning its previous value
	pub async fn remove(&self, scope: &Scope, key: &str) -> GsResult<Option<String>> {
		self.inner.remove(scope, key).await
	}

	/// Remove every setting of a scope
	pub async fn clear(&self, scope: &Scope) -> GsResult<()> {
		self.inner.clear(scope).await
	}
}

impl std::fmt::Debug for SettingsProvider {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SettingsProvider")
			.field("initialized", &self.is_initialized())
			.field("schema", self.inner.store.schema())
			.field("cached", &self.inner.cache.len())
			.finish()
	}
}

pub struct ProviderBuilder {
	adapter: Arc<dyn SettingsAdapter>,
	opts: ProviderOpts,
}

impl ProviderBuilder {
	pub fn cache_size(mut self, cache_size: usize) -> Self {
		self.opts.cache_size = cache_size;
		self
	}

	pub fn opts(mut self, opts: ProviderOpts) -> Self {
		self.opts = opts;
		self
	}

	pub fn build(self) -> SettingsProvider {
		SettingsProvider::with_opts(self.adapter, self.opts)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::memory::{MemoryAdapter, MemoryHost};
	use guildset_types::host::{EventKind, HostEvent};

	fn tenant(id: &str) -> Scope {
		Scope::parse(id).unwrap()
	}

	fn tn(id: &str) -> TnId {
		TnId::new(id).unwrap()
	}

	async fn provider() -> (SettingsProvider, Arc<MemoryAdapter>, Arc<MemoryHost>) {
		let adapter = Arc::new(MemoryAdapter::new());
		let host = Arc::new(MemoryHost::new());
		let provider = SettingsProvider::new(adapter.clone());
		provider.init(host.clone()).await.unwrap();
		(provider, adapter, host)
	}

	#[tokio::test]
	async fn test_not_initialized() {
		let provider = SettingsProvider::new(Arc::new(MemoryAdapter::new()));

		assert_eq!(provider.get(&tenant("g1"), "prefix").await, Err(Error::NotInitialized));
		assert_eq!(provider.set(&tenant("g1"), "prefix", "!").await, Err(Error::NotInitialized));
		assert!(!provider.is_initialized());
	}

	#[tokio::test]
	async fn test_set_then_get() {
		let (provider, _adapter, _host) = provider().await;
		let g1 = tenant("g1");

		assert_eq!(provider.set(&g1, "prefix", "!").await.unwrap(), "!");
		assert_eq!(provider.get(&g1, "prefix").await.unwrap().as_deref(), Some("!"));
		assert_eq!(provider.get_or(&g1, "missing", "x").await.unwrap(), "x");

		provider.set(&g1, "prefix", "?").await.unwrap();
		assert_eq!(provider.get(&g1, "prefix").await.unwrap().as_deref(), Some("?"));
	}

	#[tokio::test]
	async fn test_remove_returns_previous() {
		let (provider, adapter, _host) = provider().await;
		let g1 = tenant("g1");
		provider.set(&g1, "prefix", "!").await.unwrap();

		assert_eq!(provider.remove(&g1, "prefix").await.unwrap().as_deref(), Some("!"));
		assert_eq!(provider.get(&g1, "prefix").await.unwrap(), None);

		// Absent key: no column, no row
		assert_eq!(provider.remove(&tenant("g2"), "other").await.unwrap(), None);
		assert!(adapter.read_row("g2").await.unwrap().is_none());
		assert_eq!(adapter.add_column_calls(), 1);
	}

	#[tokio::test]
	async fn test_clear_is_isolated() {
		let (provider, _adapter, _host) = provider().await;
		provider.set(&tenant("a"), "prefix", "a!").await.unwrap();
		provider.set(&tenant("b"), "prefix", "b!").await.unwrap();
		provider.set(&Scope::Global, "prefix", "g!").await.unwrap();

		provider.clear(&tenant("a")).await.unwrap();

		assert!(provider.get_all(&tenant("a")).await.unwrap().is_empty());
		assert_eq!(provider.get(&tenant("b"), "prefix").await.unwrap().as_deref(), Some("b!"));
		assert_eq!(provider.get(&Scope::Global, "prefix").await.unwrap().as_deref(), Some("g!"));
	}

	#[tokio::test]
	async fn test_invalid_key_rejected() {
		let (provider, adapter, _host) = provider().await;

		let result = provider.set(&tenant("g1"), "Drop Table", "x").await;

		assert_eq!(result, Err(Error::InvalidKey("Drop Table".into())));
		assert_eq!(adapter.add_column_calls(), 0);
	}

	#[tokio::test]
	async fn test_cache_sees_writes() {
		let adapter = Arc::new(MemoryAdapter::new());
		let provider = SettingsProvider::builder(adapter.clone()).cache_size(1).build();
		provider.init(Arc::new(MemoryHost::new())).await.unwrap();
		let g1 = tenant("g1");

		provider.set(&g1, "prefix", "!").await.unwrap();
		assert_eq!(provider.get(&g1, "prefix").await.unwrap().as_deref(), Some("!"));
		provider.set(&g1, "prefix", "?").await.unwrap();
		assert_eq!(provider.get(&g1, "prefix").await.unwrap().as_deref(), Some("?"));
		provider.clear(&g1).await.unwrap();
		assert_eq!(provider.get(&g1, "prefix").await.unwrap(), None);
	}

	#[tokio::test]
	async fn test_startup_applies_persisted_settings() {
		let adapter = Arc::new(MemoryAdapter::new());
		{
			let seed = SettingsProvider::new(adapter.clone());
			seed.init(Arc::new(MemoryHost::new())).await.unwrap();
			seed.set(&Scope::Global, "prefix", "!").await.unwrap();
			seed.set(&tenant("g1"), "prefix", "?").await.unwrap();
			seed.set(&tenant("g1"), "cmd-ping", "0").await.unwrap();
			seed.set(&tenant("g1"), "grp-util", "1").await.unwrap();
			seed.set(&tenant("gone"), "prefix", "x").await.unwrap();
			seed.shutdown();
		}

		let host = Arc::new(MemoryHost::new());
		host.add_tenant(tn("g1"));
		host.add_command("ping");
		host.add_command("help");
		host.add_group("util");
		let provider = SettingsProvider::new(adapter);
		provider.init(host.clone()).await.unwrap();

		assert_eq!(host.prefix(&Scope::Global).as_deref(), Some("!"));
		assert_eq!(host.prefix(&tenant("g1")).as_deref(), Some("?"));
		assert_eq!(host.command_enabled(&tenant("g1"), "ping"), Some(false));
		assert_eq!(host.command_enabled(&tenant("g1"), "help"), None);
		assert_eq!(host.group_enabled(&tenant("g1"), "util"), Some(true));
		// Unknown tenant never leaks into the global default
		assert_eq!(host.prefix(&tenant("other")).as_deref(), Some("!"));
	}

	#[tokio::test]
	async fn test_startup_aborts_when_storage_unavailable() {
		let adapter = Arc::new(MemoryAdapter::new());
		adapter.set_offline(true);
		let host = Arc::new(MemoryHost::new());
		let provider = SettingsProvider::new(adapter);

		assert_eq!(provider.init(host.clone()).await, Err(Error::StorageUnavailable));
		assert!(!provider.is_initialized());
		for kind in EventKind::ALL {
			assert_eq!(host.events().listener_count(kind), 0);
		}
	}

	/// Table and columns work, the row scan does not
	#[derive(Debug, Default)]
	struct ScanFailingAdapter {
		inner: MemoryAdapter,
	}

	#[async_trait::async_trait]
	impl SettingsAdapter for ScanFailingAdapter {
		async fn ensure_table(&self) -> GsResult<()> {
			self.inner.ensure_table().await
		}

		async fn list_columns(&self) -> GsResult<Vec<Box<str>>> {
			self.inner.list_columns().await
		}

		async fn add_column(&self, name: &str) -> GsResult<()> {
			self.inner.add_column(name).await
		}

		async fn list_rows(&self) -> GsResult<Vec<guildset_types::types::RawRow>> {
			Err(Error::StorageUnavailable)
		}

		async fn read_row(&self, tn_id: &str) -> GsResult<Option<guildset_types::types::RawRow>> {
			self.inner.read_row(tn_id).await
		}

		async fn count_rows(&self, tn_id: &str) -> GsResult<u64> {
			self.inner.count_rows(tn_id).await
		}

		async fn insert_row(&self, tn_id: &str, column: &str, value: Option<&str>) -> GsResult<()> {
			self.inner.insert_row(tn_id, column, value).await
		}

		async fn update_column(&self, tn_id: &str, column: &str, value: Option<&str>) -> GsResult<()> {
			self.inner.update_column(tn_id, column, value).await
		}

		async fn delete_row(&self, tn_id: &str) -> GsResult<u64> {
			self.inner.delete_row(tn_id).await
		}
	}

	#[tokio::test]
	async fn test_failed_startup_scan_keeps_provider_unusable() {
		let host = Arc::new(MemoryHost::new());
		let provider = SettingsProvider::new(Arc::new(ScanFailingAdapter::default()));

		assert_eq!(provider.init(host.clone()).await, Err(Error::StorageUnavailable));

		assert!(!provider.is_initialized());
		assert_eq!(provider.set(&tenant("g1"), "prefix", "!").await, Err(Error::NotInitialized));
		assert_eq!(provider.get(&tenant("g1"), "prefix").await, Err(Error::NotInitialized));
		assert_eq!(provider.all().await, Err(Error::NotInitialized));
		assert_eq!(host.events().listener_count(EventKind::PrefixChanged), 0);
	}

	#[tokio::test]
	async fn test_failed_reinit_drops_previous_readiness() {
		let adapter = Arc::new(MemoryAdapter::new());
		let provider = SettingsProvider::new(adapter.clone());
		provider.init(Arc::new(MemoryHost::new())).await.unwrap();
		provider.set(&tenant("g1"), "prefix", "!").await.unwrap();

		adapter.set_offline(true);
		assert_eq!(provider.init(Arc::new(MemoryHost::new())).await, Err(Error::StorageUnavailable));
		adapter.set_offline(false);

		assert!(!provider.is_initialized());
		assert_eq!(provider.get(&tenant("g1"), "prefix").await, Err(Error::NotInitialized));
	}

	#[tokio::test]
	async fn test_host_changes_are_persisted() {
		let (provider, _adapter, host) = provider().await;
		let g1 = tenant("g1");

		host.events()
			.emit(HostEvent::PrefixChanged { scope: g1.clone(), prefix: Some("$".into()) })
			.await
			.unwrap();
		host.events()
			.emit(HostEvent::CommandStatusChanged { scope: g1.clone(), command: "ping".into(), enabled: false })
			.await
			.unwrap();
		host.events()
			.emit(HostEvent::GroupStatusChanged {
				scope: Scope::Global,
				group: "util".into(),
				enabled: true,
			})
			.await
			.unwrap();

		assert_eq!(provider.get(&g1, "prefix").await.unwrap().as_deref(), Some("$"));
		assert_eq!(provider.get(&g1, "cmd-ping").await.unwrap().as_deref(), Some("0"));
		assert_eq!(provider.get(&Scope::Global, "grp-util").await.unwrap().as_deref(), Some("1"));

		host.events().emit(HostEvent::PrefixChanged { scope: g1.clone(), prefix: None }).await.unwrap();
		assert_eq!(provider.get(&g1, "prefix").await.unwrap(), None);
	}

	#[tokio::test]
	async fn test_registration_applies_to_live_scopes() {
		let (provider, _adapter, host) = provider().await;
		host.add_tenant(tn("g1"));
		provider.set(&tenant("g1"), "cmd-ping", "0").await.unwrap();
		provider.set(&tenant("g2"), "cmd-ping", "0").await.unwrap();

		host.register_command("ping").await.unwrap();

		assert_eq!(host.command_enabled(&tenant("g1"), "ping"), Some(false));
		assert_eq!(host.command_enabled(&tenant("g2"), "ping"), None);
	}

	#[tokio::test]
	async fn test_group_registration_covers_global_and_live_tenants() {
		let (provider, _adapter, host) = provider().await;
		host.add_tenant(tn("g1"));
		host.add_tenant(tn("g3"));
		provider.set(&Scope::Global, "grp-util", "1").await.unwrap();
		provider.set(&tenant("g1"), "grp-util", "0").await.unwrap();
		provider.set(&tenant("g2"), "grp-util", "1").await.unwrap();
		provider.set(&tenant("g3"), "prefix", "?").await.unwrap();

		host.register_group("util").await.unwrap();

		assert_eq!(host.group_enabled(&Scope::Global, "util"), Some(true));
		assert_eq!(host.group_enabled(&tenant("g1"), "util"), Some(false));
		assert_eq!(host.group_enabled(&tenant("g2"), "util"), None);
		assert_eq!(host.group_enabled(&tenant("g3"), "util"), None);
	}

	#[tokio::test]
	async fn test_command_registration_enabled_flag() {
		let (provider, _adapter, host) = provider().await;
		host.add_tenant(tn("g1"));
		host.add_tenant(tn("g2"));
		provider.set(&Scope::Global, "cmd-ping", "0").await.unwrap();
		provider.set(&tenant("g1"), "cmd-ping", "1").await.unwrap();
		provider.set(&tenant("g2"), "cmd-help", "0").await.unwrap();

		host.register_command("ping").await.unwrap();

		assert_eq!(host.command_enabled(&Scope::Global, "ping"), Some(false));
		assert_eq!(host.command_enabled(&tenant("g1"), "ping"), Some(true));
		assert_eq!(host.command_enabled(&tenant("g2"), "ping"), None);
	}

	#[tokio::test]
	async fn test_tenant_created_applies_settings() {
		let (provider, _adapter, host) = provider().await;
		provider.set(&tenant("g7"), "prefix", "?").await.unwrap();

		host.join_tenant(tn("g7")).await.unwrap();

		assert_eq!(host.prefix(&tenant("g7")).as_deref(), Some("?"));
	}

	#[tokio::test]
	async fn test_shutdown_unbinds_listeners() {
		let (provider, _adapter, host) = provider().await;
		assert_eq!(host.events().listener_count(EventKind::PrefixChanged), 1);

		provider.shutdown();
		provider.shutdown();

		for kind in EventKind::ALL {
			assert_eq!(host.events().listener_count(kind), 0);
		}
		host.events()
			.emit(HostEvent::PrefixChanged { scope: tenant("g1"), prefix: Some("!".into()) })
			.await
			.unwrap();
		assert_eq!(provider.get(&tenant("g1"), "prefix").await.unwrap(), None);
	}

	#[tokio::test]
	async fn test_reinit_rebinds_once() {
		let (provider, _adapter, host) = provider().await;

		provider.init(host.clone()).await.unwrap();

		assert_eq!(host.events().listener_count(EventKind::TenantCreated), 1);
	}
}

// vim: ts=4
