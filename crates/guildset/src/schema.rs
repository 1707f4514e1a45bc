//! Schema manager
//!
//! Owns the column cache: the set of column names known to exist in the settings
//! table. The cache is seeded once from the backend and then grows as new keys
//! are written, so a write to a known key never costs a schema round-trip.

use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

use guildset_types::settings_adapter::SettingsAdapter;
use guildset_types::types::validate_key;

use crate::prelude::*;

pub struct SchemaManager {
	adapter: Arc<dyn SettingsAdapter>,
	columns: RwLock<HashSet<Box<str>>>,
	/// Serializes column creation so two writers never ALTER for the same key
	create_lock: Mutex<()>,
}

impl SchemaManager {
	pub fn new(adapter: Arc<dyn SettingsAdapter>) -> Self {
		Self { adapter, columns: RwLock::new(HashSet::new()), create_lock: Mutex::new(()) }
	}

	pub async fn ensure_table(&self) -> GsResult<()> {
		self.adapter.ensure_table().await
	}

	/// Read the column list from the backend and replace the cache with it
	pub async fn load_columns(&self) -> GsResult<Vec<Box<str>>> {
		let columns = self.adapter.list_columns().await?;
		*self.columns.write() = columns.iter().cloned().collect();
		debug!("Loaded {} settings columns", columns.len());
		Ok(columns)
	}

	pub fn has_column(&self, name: &str) -> bool {
		self.columns.read().contains(name)
	}

	pub fn column_count(&self) -> usize {
		self.columns.read().len()
	}

	/// Make sure a column exists for `key`. Returns true if this call created it.
	pub async fn ensure_column(&self, key: &str) -> GsResult<bool> {
		validate_key(key)?;
		if self.has_column(key) {
			return Ok(false);
		}

		let _guard = self.create_lock.lock().await;
		if self.has_column(key) {
			return Ok(false);
		}

		match self.adapter.add_column(key).await {
			Ok(()) => {
				self.columns.write().insert(key.into());
				Ok(true)
			}
			Err(Error::SchemaConflict(_)) => {
				// Someone else created it; the end state is what we wanted
				warn!("Settings column '{}' was created concurrently, reloading columns", key);
				self.load_columns().await?;
				if self.has_column(key) {
					Ok(false)
				} else {
					Err(Error::SchemaConflict(key.into()))
				}
			}
			Err(err) => Err(err),
		}
	}
}

impl std::fmt::Debug for SchemaManager {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SchemaManager").field("columns", &self.column_count()).finish()
	}
}


// vim: ts=4
