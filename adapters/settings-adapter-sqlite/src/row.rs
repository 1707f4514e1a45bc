//! Settings row CRUD
//!
//! One row per tenant scope, keyed by the stored tenant id (`"0"` for global).

use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, SqlitePool};

use crate::utils::*;
use guildset_types::prelude::*;
use guildset_types::types::RawRow;

/// Read every cell as text. Integer timestamps come back in their text form.
fn to_raw_row(row: &SqliteRow) -> GsResult<RawRow> {
	let mut columns = Vec::with_capacity(row.columns().len());
	for col in row.columns() {
		let value: Option<String> = row.try_get_unchecked(col.ordinal()).map_err(db_err)?;
		columns.push((col.name().into(), value));
	}
	Ok(RawRow { columns })
}

// `SELECT *` statements are never cached: the column set changes whenever a
// setting column is added, and a cached statement keeps the old column count.

pub(crate) async fn list(db: &SqlitePool, table: &str) -> GsResult<Vec<RawRow>> {
	let query = format!("SELECT * FROM {}", quote_ident(table)?);
	let rows = sqlx::query(&query).persistent(false).fetch_all(db).await.map_err(db_err)?;

	rows.iter().map(to_raw_row).collect()
}

pub(crate) async fn read(db: &SqlitePool, table: &str, tn_id: &str) -> GsResult<Option<RawRow>> {
	let query = format!("SELECT * FROM {} WHERE tn_id = ?", quote_ident(table)?);
	let row = sqlx::query(&query)
		.persistent(false)
		.bind(tn_id)
		.fetch_optional(db)
		.await
		.map_err(db_err)?;

	row.as_ref().map(to_raw_row).transpose()
}

pub(crate) async fn count(db: &SqlitePool, table: &str, tn_id: &str) -> GsResult<u64> {
	let query = format!("SELECT COUNT(*) AS count FROM {} WHERE tn_id = ?", quote_ident(table)?);
	let row = sqlx::query(&query).bind(tn_id).fetch_one(db).await.map_err(db_err)?;
	let count: i64 = row.try_get("count").map_err(db_err)?;

	Ok(u64::try_from(count).unwrap_or_default())
}

pub(crate) async fn insert(
	db: &SqlitePool,
	table: &str,
	tn_id: &str,
	column: &str,
	value: Option<&str>,
) -> GsResult<()> {
	let query =
		format!("INSERT INTO {} (tn_id, {}) VALUES (?, ?)", quote_ident(table)?, quote_ident(column)?);
	sqlx::query(&query).bind(tn_id).bind(value).execute(db).await.map_err(insert_err)?;

	Ok(())
}

pub(crate) async fn update(
	db: &SqlitePool,
	table: &str,
	tn_id: &str,
	column: &str,
	value: Option<&str>,
) -> GsResult<()> {
	let query = format!(
		"UPDATE {} SET {} = ?, updated_at = unixepoch() WHERE tn_id = ?",
		quote_ident(table)?,
		quote_ident(column)?
	);
	sqlx::query(&query).bind(value).bind(tn_id).execute(db).await.map_err(db_err)?;

	Ok(())
}

pub(crate) async fn delete(db: &SqlitePool, table: &str, tn_id: &str) -> GsResult<u64> {
	let query = format!("DELETE FROM {} WHERE tn_id = ?", quote_ident(table)?);
	let res = sqlx::query(&query).bind(tn_id).execute(db).await.map_err(db_err)?;

	Ok(res.rows_affected())
}

// vim: ts=4
