//! Value store: CRUD over settings rows keyed by tenant scope
//!
//! Scopes are translated to their stored id on the way in (`Scope::Global` is
//! stored as `"0"`) and back on the way out. Upserts are serialized per tenant
//! so the row-exists check and the following insert/update cannot interleave
//! with another writer in this process.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use guildset_types::settings_adapter::SettingsAdapter;

use crate::format::format_row;
use crate::prelude::*;
use crate::schema::SchemaManager;

type RowLock = Arc<tokio::sync::Mutex<()>>;

pub struct ValueStore {
	adapter: Arc<dyn SettingsAdapter>,
	schema: SchemaManager,
	row_locks: Mutex<HashMap<Box<str>, RowLock>>,
}

impl ValueStore {
	pub fn new(adapter: Arc<dyn SettingsAdapter>) -> Self {
		Self { schema: SchemaManager::new(adapter.clone()), adapter, row_locks: Mutex::new(HashMap::new()) }
	}

	pub fn schema(&self) -> &SchemaManager {
		&self.schema
	}

	/// Every persisted row, formatted, by scope
	pub async fn all(&self) -> GsResult<HashMap<Scope, SettingsMap>> {
		let rows = self.adapter.list_rows().await?;

		let mut settings = HashMap::with_capacity(rows.len());
		for row in rows {
			let Some(scope) = row.scope() else {
				warn!("Settings row without tenant id skipped");
				continue;
			};
			settings.insert(scope, format_row(&row));
		}
		Ok(settings)
	}

	/// Formatted settings of one scope; empty if the scope has no row
	pub async fn get(&self, scope: &Scope) -> GsResult<SettingsMap> {
		let row = self.adapter.read_row(scope.storage_id()).await?;
		Ok(row.as_ref().map(format_row).unwrap_or_default())
	}

	/// Write one field, creating its column and the scope's row as needed.
	/// `None` stores NULL, i.e. unsets the key.
	pub async fn upsert(&self, scope: &Scope, key: &str, value: Option<&str>) -> GsResult<()> {
		self.schema.ensure_column(key).await?;

		let tn_id = scope.storage_id();
		let lock = self.row_lock(tn_id);
		let res = {
			let _guard = lock.lock().await;
			self.upsert_locked(tn_id, key, value).await
		};
		self.release_row_lock(tn_id, lock);
		res
	}

	async fn upsert_locked(&self, tn_id: &str, key: &str, value: Option<&str>) -> GsResult<()> {
		if self.adapter.count_rows(tn_id).await? > 0 {
			return self.adapter.update_column(tn_id, key, value).await;
		}

		match self.adapter.insert_row(tn_id, key, value).await {
			Err(Error::DuplicateRowRace) => {
				// Lost the first write to another process; the row exists now
				warn!("Settings row for tn_id={} inserted concurrently, updating instead", tn_id);
				self.adapter.update_column(tn_id, key, value).await
			}
			res => res,
		}
	}

	/// Delete the scope's whole row. Returns true if a row existed.
	pub async fn delete_tenant(&self, scope: &Scope) -> GsResult<bool> {
		let tn_id = scope.storage_id();
		let lock = self.row_lock(tn_id);
		let res = {
			let _guard = lock.lock().await;
			self.adapter.delete_row(tn_id).await
		};
		self.release_row_lock(tn_id, lock);
		Ok(res? > 0)
	}

	fn row_lock(&self, tn_id: &str) -> RowLock {
		self.row_locks.lock().entry(tn_id.into()).or_default().clone()
	}

	/// Drop the lock entry once nobody else holds or waits for it
	fn release_row_lock(&self, tn_id: &str, lock: RowLock) {
		let mut locks = self.row_locks.lock();
		// map + ours
		if Arc::strong_count(&lock) <= 2 {
			locks.remove(tn_id);
		}
	}

	#[cfg(test)]
	pub(crate) fn row_lock_count(&self) -> usize {
		self.row_locks.lock().len()
	}
}


// vim: ts=4
