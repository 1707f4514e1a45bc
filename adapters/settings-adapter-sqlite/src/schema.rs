//! Settings table creation and column management
//!
//! The table starts with the primary key and the two timestamp columns; setting
//! columns are added one by one as new keys are written.

use sqlx::{Row, SqlitePool};

use crate::utils::*;
use guildset_types::prelude::*;

/// Create the settings table if it is missing
pub(crate) async fn ensure_table(db: &SqlitePool, table: &str) -> GsResult<()> {
	let query = format!(
		"CREATE TABLE IF NOT EXISTS {} (
		tn_id text NOT NULL,
		created_at datetime DEFAULT (unixepoch()),
		updated_at datetime DEFAULT (unixepoch()),
		PRIMARY KEY(tn_id)
	)",
		quote_ident(table)?
	);
	sqlx::query(&query).execute(db).await.map_err(db_err)?;

	Ok(())
}

/// List every column of the settings table in declaration order
pub(crate) async fn list_columns(db: &SqlitePool, table: &str) -> GsResult<Vec<Box<str>>> {
	let rows = sqlx::query("SELECT name FROM pragma_table_info(?) ORDER BY cid")
		.bind(table)
		.fetch_all(db)
		.await
		.map_err(db_err)?;

	rows.iter()
		.map(|row| row.try_get::<String, _>("name").map(String::into_boxed_str).map_err(db_err))
		.collect()
}

/// Add one nullable text column
pub(crate) async fn add_column(db: &SqlitePool, table: &str, column: &str) -> GsResult<()> {
	let query = format!("ALTER TABLE {} ADD COLUMN {} text", quote_ident(table)?, quote_ident(column)?);
	sqlx::query(&query).execute(db).await.map_err(|err| add_column_err(err, column))?;

	info!("Settings column '{}' added to '{}'", column, table);
	Ok(())
}

// vim: ts=4
