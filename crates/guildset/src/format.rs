//! Row formatter: persisted row -> flat settings map

use guildset_types::types::{RESERVED_COLUMNS, RawRow};

use crate::prelude::*;

/// Drop the id/timestamp columns and treat NULL cells as unset.
pub fn format_row(row: &RawRow) -> SettingsMap {
	row.columns
		.iter()
		.filter(|(col, _)| !RESERVED_COLUMNS.contains(&&**col))
		.filter_map(|(col, value)| value.as_ref().map(|v| (col.to_string(), v.clone())))
		.collect()
}


// vim: ts=4
