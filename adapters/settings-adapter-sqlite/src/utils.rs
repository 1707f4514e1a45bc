//! Shared utilities for the SQLite adapter
//!
//! Error mapping and identifier quoting used by the schema and row modules.

use guildset_types::prelude::*;
use guildset_types::types::is_valid_identifier;

/// Log database error for debugging
pub(crate) fn inspect(err: &sqlx::Error) {
	warn!("DB: {:#?}", err);
}

/// Generic backend failure mapping
pub(crate) fn db_err(err: sqlx::Error) -> Error {
	inspect(&err);
	Error::StorageUnavailable
}

/// ALTER TABLE ADD COLUMN: an existing column is a schema race, not a failure
pub(crate) fn add_column_err(err: sqlx::Error, column: &str) -> Error {
	match &err {
		sqlx::Error::Database(db) if db.message().contains("duplicate column name") => {
			debug!("Column '{}' already exists", column);
			Error::SchemaConflict(column.into())
		}
		_ => db_err(err),
	}
}

/// INSERT: a primary key violation means another writer created the row first
pub(crate) fn insert_err(err: sqlx::Error) -> Error {
	match &err {
		sqlx::Error::Database(db) if db.is_unique_violation() => {
			debug!("DB: duplicate settings row: {}", db.message());
			Error::DuplicateRowRace
		}
		_ => db_err(err),
	}
}

/// Double-quote an identifier. Callers pass names that passed `is_valid_identifier`,
/// which never contain quotes; this still refuses anything else.
pub(crate) fn quote_ident(name: &str) -> GsResult<String> {
	if !is_valid_identifier(name) {
		return Err(Error::InvalidKey(name.into()));
	}
	Ok(format!("\"{}\"", name))
}


// vim: ts=4
