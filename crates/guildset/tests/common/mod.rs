//! Shared setup for provider integration tests
//!
//! Every fixture returns its `TempDir` so the database file lives exactly as long
//! as the test holding it.

#![allow(dead_code)]

use std::sync::Arc;
use tempfile::TempDir;

use guildset::{MemoryHost, Scope, SettingsProvider, TnId};
use guildset_settings_adapter_sqlite::SettingsAdapterSqlite;

pub fn setup_test_logging() {
	let _ = tracing_subscriber::fmt()
		.with_test_writer()
		.with_max_level(tracing::Level::DEBUG)
		.try_init();
}

pub async fn create_test_adapter() -> (Arc<SettingsAdapterSqlite>, TempDir) {
	let tmp_dir = TempDir::new().unwrap();
	let adapter = SettingsAdapterSqlite::new(tmp_dir.path().join("settings.db")).await.unwrap();
	(Arc::new(adapter), tmp_dir)
}

/// Provider bound to an empty host, on a fresh database
pub async fn create_test_provider() -> (SettingsProvider, Arc<MemoryHost>, Arc<SettingsAdapterSqlite>, TempDir)
{
	setup_test_logging();
	let (adapter, tmp_dir) = create_test_adapter().await;
	let host = Arc::new(MemoryHost::new());
	let provider = SettingsProvider::new(adapter.clone());
	provider.init(host.clone()).await.unwrap();
	(provider, host, adapter, tmp_dir)
}

pub fn tenant(id: &str) -> Scope {
	Scope::parse(id).unwrap()
}

pub fn tn(id: &str) -> TnId {
	TnId::new(id).unwrap()
}

// vim: ts=4
