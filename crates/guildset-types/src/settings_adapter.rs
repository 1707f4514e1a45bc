//! Persistence backend contract for the settings table.
//!
//! The table has a fixed primary key column (`tn_id`), two timestamp columns and
//! one nullable text column per setting key. Column management is exposed so the
//! schema manager can grow the table lazily; row operations work on a single
//! column at a time.
//!
//! Error mapping expected from implementations:
//! - `add_column` on an existing column: `Error::SchemaConflict`
//! - `insert_row` for an existing tenant: `Error::DuplicateRowRace`
//! - anything the backend cannot complete: `Error::StorageUnavailable`

use async_trait::async_trait;
use std::fmt::Debug;

use crate::prelude::*;
use crate::types::RawRow;

#[async_trait]
pub trait SettingsAdapter: Debug + Send + Sync {
	/// # Schema
	///
	/// Create the settings table if it does not exist yet
	async fn ensure_table(&self) -> GsResult<()>;
	/// Full column list of the settings table, metadata columns included
	async fn list_columns(&self) -> GsResult<Vec<Box<str>>>;
	/// Add a nullable text column. The name is already validated.
	async fn add_column(&self, name: &str) -> GsResult<()>;

	/// # Rows
	async fn list_rows(&self) -> GsResult<Vec<RawRow>>;
	async fn read_row(&self, tn_id: &str) -> GsResult<Option<RawRow>>;
	async fn count_rows(&self, tn_id: &str) -> GsResult<u64>;
	/// Insert a new row with only `tn_id` and `column` populated
	async fn insert_row(&self, tn_id: &str, column: &str, value: Option<&str>) -> GsResult<()>;
	/// Update one column of an existing row, touching `updated_at`
	async fn update_column(&self, tn_id: &str, column: &str, value: Option<&str>)
	-> GsResult<()>;
	/// Returns the number of deleted rows
	async fn delete_row(&self, tn_id: &str) -> GsResult<u64>;
}

// vim: ts=4
