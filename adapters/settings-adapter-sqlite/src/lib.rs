//! SQLite settings adapter.
//!
//! Stores one row per tenant scope in a single table whose setting columns are
//! created on demand. All SQL runs through an `sqlx` connection pool in WAL mode.

use async_trait::async_trait;
use sqlx::sqlite::{self, SqlitePool};
use std::path::{Path, PathBuf};

use guildset_types::prelude::*;
use guildset_types::settings_adapter::SettingsAdapter;
use guildset_types::types::{RawRow, is_valid_identifier};

mod row;
mod schema;
mod utils;

pub const DEFAULT_TABLE: &str = "settings";

/// Connection options for [`SettingsAdapterSqlite`]
#[derive(Clone, Debug)]
pub struct SqliteOpts {
	pub path: PathBuf,
	pub table: Box<str>,
	pub max_connections: u32,
}

impl SqliteOpts {
	pub fn new(path: impl AsRef<Path>) -> Self {
		Self { path: path.as_ref().to_path_buf(), table: DEFAULT_TABLE.into(), max_connections: 5 }
	}

	pub fn table(mut self, table: impl Into<Box<str>>) -> Self {
		self.table = table.into();
		self
	}

	pub fn max_connections(mut self, max_connections: u32) -> Self {
		self.max_connections = max_connections;
		self
	}
}

#[derive(Debug)]
pub struct SettingsAdapterSqlite {
	db: SqlitePool,
	table: Box<str>,
}

impl SettingsAdapterSqlite {
	/// Open (or create) the database file at `path` using the default table name
	pub async fn new(path: impl AsRef<Path>) -> GsResult<Self> {
		Self::with_opts(SqliteOpts::new(path)).await
	}

	pub async fn with_opts(opts: SqliteOpts) -> GsResult<Self> {
		if !is_valid_identifier(&opts.table) {
			return Err(Error::InvalidKey(opts.table));
		}

		if let Some(dir) = opts.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
			tokio::fs::create_dir_all(dir).await.map_err(|err| {
				error!("Cannot create database directory {}: {}", dir.display(), err);
				Error::StorageUnavailable
			})?;
		}

		let conn_opts = sqlite::SqliteConnectOptions::new()
			.filename(&opts.path)
			.create_if_missing(true)
			.journal_mode(sqlite::SqliteJournalMode::Wal);
		let db = sqlite::SqlitePoolOptions::new()
			.max_connections(opts.max_connections.max(1))
			.connect_with(conn_opts)
			.await
			.inspect_err(|err| error!("DbError: {:#?}", err))
			.map_err(|_| Error::StorageUnavailable)?;

		info!("Settings database opened at {} (table '{}')", opts.path.display(), opts.table);
		Ok(Self { db, table: opts.table })
	}

	pub fn table(&self) -> &str {
		&self.table
	}

	/// Close the pool, waiting for checked-out connections to be returned
	pub async fn close(&self) {
		self.db.close().await;
	}
}

#[async_trait]
impl SettingsAdapter for SettingsAdapterSqlite {
	// Schema
	//********
	async fn ensure_table(&self) -> GsResult<()> {
		schema::ensure_table(&self.db, &self.table).await
	}

	async fn list_columns(&self) -> GsResult<Vec<Box<str>>> {
		schema::list_columns(&self.db, &self.table).await
	}

	async fn add_column(&self, name: &str) -> GsResult<()> {
		schema::add_column(&self.db, &self.table, name).await
	}

	// Rows
	//******
	async fn list_rows(&self) -> GsResult<Vec<RawRow>> {
		row::list(&self.db, &self.table).await
	}

	async fn read_row(&self, tn_id: &str) -> GsResult<Option<RawRow>> {
		row::read(&self.db, &self.table, tn_id).await
	}

	async fn count_rows(&self, tn_id: &str) -> GsResult<u64> {
		row::count(&self.db, &self.table, tn_id).await
	}

	async fn insert_row(&self, tn_id: &str, column: &str, value: Option<&str>) -> GsResult<()> {
		row::insert(&self.db, &self.table, tn_id, column, value).await
	}

	async fn update_column(
		&self,
		tn_id: &str,
		column: &str,
		value: Option<&str>,
	) -> GsResult<()> {
		row::update(&self.db, &self.table, tn_id, column, value).await
	}

	async fn delete_row(&self, tn_id: &str) -> GsResult<u64> {
		let deleted = row::delete(&self.db, &self.table, tn_id).await?;
		if deleted > 0 {
			info!("Settings row deleted for tn_id={}", tn_id);
		}
		Ok(deleted)
	}
}

// vim: ts=4
