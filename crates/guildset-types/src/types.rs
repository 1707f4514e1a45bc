//! Common types used throughout the settings store.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::SystemTime;

use crate::prelude::*;

/// On-disk stand-in for the global scope in the primary key column
pub const GLOBAL_SENTINEL: &str = "0";
/// In-memory and API name of the global scope
pub const GLOBAL_SCOPE: &str = "global";

pub const TN_ID_COLUMN: &str = "tn_id";
pub const CREATED_AT_COLUMN: &str = "created_at";
pub const UPDATED_AT_COLUMN: &str = "updated_at";
pub const RESERVED_COLUMNS: [&str; 3] = [TN_ID_COLUMN, CREATED_AT_COLUMN, UPDATED_AT_COLUMN];

pub const PREFIX_KEY: &str = "prefix";
pub const COMMAND_KEY_PREFIX: &str = "cmd-";
pub const GROUP_KEY_PREFIX: &str = "grp-";

pub const FLAG_ENABLED: &str = "1";
pub const FLAG_DISABLED: &str = "0";

const MAX_IDENT_LEN: usize = 64;

/// Flat settings map: key -> value, storage metadata removed, unset keys absent
pub type SettingsMap = HashMap<String, String>;

// TnId //
//******//
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TnId(Box<str>);

impl TnId {
	/// Validates a concrete tenant id. The global sentinel and the global scope
	/// name are not valid tenant ids.
	pub fn new(id: impl Into<Box<str>>) -> GsResult<Self> {
		let id = id.into();
		if id.is_empty()
			|| id.len() > MAX_IDENT_LEN
			|| id.chars().any(char::is_control)
			|| &*id == GLOBAL_SENTINEL
			|| &*id == GLOBAL_SCOPE
		{
			return Err(Error::InvalidTenant(id));
		}
		Ok(TnId(id))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl std::fmt::Display for TnId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

// Scope //
//*******//
/// Unit of settings isolation: one tenant, or the global default scope
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
	Global,
	Tenant(TnId),
}

impl Scope {
	/// Parse an API-level scope: `"global"` or a concrete tenant id
	pub fn parse(s: &str) -> GsResult<Self> {
		if s == GLOBAL_SCOPE { Ok(Scope::Global) } else { Ok(Scope::Tenant(TnId::new(s)?)) }
	}

	/// Value stored in the primary key column
	pub fn storage_id(&self) -> &str {
		match self {
			Scope::Global => GLOBAL_SENTINEL,
			Scope::Tenant(tn_id) => tn_id.as_str(),
		}
	}

	/// Inverse of [`Scope::storage_id`]. Rows are trusted as written by this crate.
	pub fn from_storage_id(id: &str) -> Self {
		if id == GLOBAL_SENTINEL { Scope::Global } else { Scope::Tenant(TnId(id.into())) }
	}

	pub fn is_global(&self) -> bool {
		matches!(self, Scope::Global)
	}

	pub fn tn_id(&self) -> Option<&TnId> {
		match self {
			Scope::Global => None,
			Scope::Tenant(tn_id) => Some(tn_id),
		}
	}
}

impl From<TnId> for Scope {
	fn from(tn_id: TnId) -> Self {
		Scope::Tenant(tn_id)
	}
}

impl std::str::FromStr for Scope {
	type Err = Error;

	fn from_str(s: &str) -> GsResult<Self> {
		Scope::parse(s)
	}
}

impl std::fmt::Display for Scope {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Scope::Global => write!(f, "{}", GLOBAL_SCOPE),
			Scope::Tenant(tn_id) => write!(f, "{}", tn_id),
		}
	}
}

impl Serialize for Scope {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.collect_str(self)
	}
}

impl<'de> Deserialize<'de> for Scope {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		Scope::parse(&s).map_err(serde::de::Error::custom)
	}
}

// Timestamp //
//***********//
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(pub i64);

impl std::fmt::Display for Timestamp {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

pub fn now() -> Timestamp {
	let res = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default();
	Timestamp(i64::try_from(res.as_secs()).unwrap_or(i64::MAX))
}

// RawRow //
//********//
/// A persisted settings row as the backend returns it, metadata columns included.
/// Every cell is read as text; NULL is `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawRow {
	pub columns: Vec<(Box<str>, Option<String>)>,
}

impl RawRow {
	pub fn get(&self, name: &str) -> Option<&str> {
		self.columns.iter().find(|(col, _)| &**col == name).and_then(|(_, v)| v.as_deref())
	}

	/// Scope the row belongs to, decoded from the primary key column
	pub fn scope(&self) -> Option<Scope> {
		self.get(TN_ID_COLUMN).map(Scope::from_storage_id)
	}
}

// Identifiers //
//*************//
/// Whether `name` can be used unchanged as a column or table identifier
pub fn is_valid_identifier(name: &str) -> bool {
	let Some(first) = name.chars().next() else {
		return false;
	};
	name.len() <= MAX_IDENT_LEN
		&& (first.is_ascii_lowercase() || first.is_ascii_digit())
		&& name.chars().all(|c| {
			c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '-' | '.' | ':')
		})
}

/// Check that a setting key maps to a dynamic column
pub fn validate_key(key: &str) -> GsResult<()> {
	if !is_valid_identifier(key) || RESERVED_COLUMNS.contains(&key) {
		return Err(Error::InvalidKey(key.into()));
	}
	Ok(())
}

pub fn command_key(name: &str) -> String {
	format!("{}{}", COMMAND_KEY_PREFIX, name)
}

pub fn group_key(id: &str) -> String {
	format!("{}{}", GROUP_KEY_PREFIX, id)
}

pub fn encode_flag(enabled: bool) -> &'static str {
	if enabled { FLAG_ENABLED } else { FLAG_DISABLED }
}

/// Stored flags compare by value: only the enabled sentinel counts as enabled
pub fn decode_flag(value: &str) -> bool {
	value == FLAG_ENABLED
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_scope_sentinel_roundtrip() {
		assert_eq!(Scope::Global.storage_id(), "0");
		assert_eq!(Scope::from_storage_id("0"), Scope::Global);

		let scope = Scope::parse("1234").unwrap();
		assert_eq!(scope.storage_id(), "1234");
		assert_eq!(Scope::from_storage_id(scope.storage_id()), scope);
	}

	#[test]
	fn test_scope_parse_global() {
		assert_eq!(Scope::parse("global").unwrap(), Scope::Global);
		assert_eq!(Scope::Global.to_string(), "global");
	}

	#[test]
	fn test_tenant_cannot_use_sentinel() {
		assert_eq!(Scope::parse("0"), Err(Error::InvalidTenant("0".into())));
		assert!(TnId::new("").is_err());
		assert!(TnId::new("global").is_err());
		assert!(TnId::new("bad\nid").is_err());
	}

	#[test]
	fn test_scope_serde() {
		let json = serde_json::to_string(&Scope::Global).unwrap();
		assert_eq!(json, "\"global\"");
		let scope: Scope = serde_json::from_str("\"g1\"").unwrap();
		assert_eq!(scope, Scope::Tenant(TnId::new("g1").unwrap()));
		assert!(serde_json::from_str::<Scope>("\"0\"").is_err());
	}

	#[test]
	fn test_validate_key() {
		assert!(validate_key("prefix").is_ok());
		assert!(validate_key("cmd-ping").is_ok());
		assert!(validate_key("grp-util").is_ok());
		assert!(validate_key("ui.theme:dark").is_ok());

		assert_eq!(validate_key(""), Err(Error::InvalidKey("".into())));
		assert!(validate_key("Prefix").is_err());
		assert!(validate_key("bad key").is_err());
		assert!(validate_key("x\"; DROP TABLE settings; --").is_err());
		assert!(validate_key("-leading").is_err());
		assert!(validate_key("tn_id").is_err());
		assert!(validate_key("updated_at").is_err());
		assert!(validate_key(&"k".repeat(65)).is_err());
	}

	#[test]
	fn test_flags() {
		assert!(decode_flag(encode_flag(true)));
		assert!(!decode_flag(encode_flag(false)));
		assert!(!decode_flag("true"));
		assert_eq!(command_key("ping"), "cmd-ping");
		assert_eq!(group_key("util"), "grp-util");
	}

	#[test]
	fn test_raw_row_scope() {
		let row = RawRow {
			columns: vec![("tn_id".into(), Some("0".into())), ("prefix".into(), None)],
		};
		assert_eq!(row.scope(), Some(Scope::Global));
		assert_eq!(row.get("prefix"), None);
	}
}

// vim: ts=4
