//! In-memory implementations of the two collaborator contracts.
//!
//! `MemoryAdapter` behaves like a settings table (including the schema race and
//! duplicate-row errors) without a database. `MemoryHost` is a minimal live
//! object graph: tenants, registered commands and groups, prefix overrides and
//! enabled flags.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap, HashSet};

use guildset_types::event_bus::EventBus;
use guildset_types::host::{Host, HostEvent};
use guildset_types::settings_adapter::SettingsAdapter;
use guildset_types::types::{
	CREATED_AT_COLUMN, RESERVED_COLUMNS, RawRow, TN_ID_COLUMN, UPDATED_AT_COLUMN, now,
};

use crate::prelude::*;

// MemoryAdapter //
//***************//
#[derive(Debug, Default)]
struct Table {
	exists: bool,
	columns: Vec<Box<str>>,
	rows: BTreeMap<String, HashMap<Box<str>, Option<String>>>,
}

#[derive(Debug, Default)]
pub struct MemoryAdapter {
	table: Mutex<Table>,
	offline: RwLock<bool>,
	add_column_calls: Mutex<usize>,
}

impl MemoryAdapter {
	pub fn new() -> Self {
		Self::default()
	}

	/// Make every call fail with `StorageUnavailable` while set
	pub fn set_offline(&self, offline: bool) {
		*self.offline.write() = offline;
	}

	/// Number of `add_column` calls that reached the table, successful or not
	pub fn add_column_calls(&self) -> usize {
		*self.add_column_calls.lock()
	}

	/// Add a column behind the caller's back, as another process would
	pub fn add_column_externally(&self, name: &str) {
		let mut table = self.table.lock();
		if !table.columns.iter().any(|c| c.as_ref() == name) {
			table.columns.push(name.into());
		}
	}

	fn check(&self) -> GsResult<()> {
		if *self.offline.read() { Err(Error::StorageUnavailable) } else { Ok(()) }
	}

	fn to_raw(table: &Table, tn_id: &str, cells: &HashMap<Box<str>, Option<String>>) -> RawRow {
		let columns = table
			.columns
			.iter()
			.map(|col| {
				let value = if col.as_ref() == TN_ID_COLUMN {
					Some(tn_id.to_string())
				} else {
					cells.get(col).cloned().flatten()
				};
				(col.clone(), value)
			})
			.collect();
		RawRow { columns }
	}
}

#[async_trait]
impl SettingsAdapter for MemoryAdapter {
	async fn ensure_table(&self) -> GsResult<()> {
		self.check()?;
		let mut table = self.table.lock();
		if !table.exists {
			table.exists = true;
			table.columns = RESERVED_COLUMNS.iter().map(|c| (*c).into()).collect();
		}
		Ok(())
	}

	async fn list_columns(&self) -> GsResult<Vec<Box<str>>> {
		self.check()?;
		Ok(self.table.lock().columns.clone())
	}

	async fn add_column(&self, name: &str) -> GsResult<()> {
		self.check()?;
		*self.add_column_calls.lock() += 1;
		let mut table = self.table.lock();
		if table.columns.iter().any(|c| c.as_ref() == name) {
			return Err(Error::SchemaConflict(name.into()));
		}
		table.columns.push(name.into());
		Ok(())
	}

	async fn list_rows(&self) -> GsResult<Vec<RawRow>> {
		self.check()?;
		let table = self.table.lock();
		Ok(table.rows.iter().map(|(tn_id, cells)| Self::to_raw(&table, tn_id, cells)).collect())
	}

	async fn read_row(&self, tn_id: &str) -> GsResult<Option<RawRow>> {
		self.check()?;
		let table = self.table.lock();
		Ok(table.rows.get(tn_id).map(|cells| Self::to_raw(&table, tn_id, cells)))
	}

	async fn count_rows(&self, tn_id: &str) -> GsResult<u64> {
		self.check()?;
		Ok(u64::from(self.table.lock().rows.contains_key(tn_id)))
	}

	async fn insert_row(&self, tn_id: &str, column: &str, value: Option<&str>) -> GsResult<()> {
		self.check()?;
		let mut table = self.table.lock();
		if !table.columns.iter().any(|c| c.as_ref() == column) {
			return Err(Error::StorageUnavailable);
		}
		if table.rows.contains_key(tn_id) {
			return Err(Error::DuplicateRowRace);
		}
		let ts = Some(now().to_string());
		let mut cells = HashMap::new();
		cells.insert(CREATED_AT_COLUMN.into(), ts.clone());
		cells.insert(UPDATED_AT_COLUMN.into(), ts);
		cells.insert(column.into(), value.map(ToString::to_string));
		table.rows.insert(tn_id.to_string(), cells);
		Ok(())
	}

	async fn update_column(
		&self,
		tn_id: &str,
		column: &str,
		value: Option<&str>,
	) -> GsResult<()> {
		self.check()?;
		let mut table = self.table.lock();
		if !table.columns.iter().any(|c| c.as_ref() == column) {
			return Err(Error::StorageUnavailable);
		}
		if let Some(cells) = table.rows.get_mut(tn_id) {
			cells.insert(column.into(), value.map(ToString::to_string));
			cells.insert(UPDATED_AT_COLUMN.into(), Some(now().to_string()));
		}
		Ok(())
	}

	async fn delete_row(&self, tn_id: &str) -> GsResult<u64> {
		self.check()?;
		Ok(u64::from(self.table.lock().rows.remove(tn_id).is_some()))
	}
}

// MemoryHost //
//************//
#[derive(Debug, Default)]
struct HostState {
	tenants: HashSet<TnId>,
	commands: Vec<Box<str>>,
	groups: Vec<Box<str>>,
	default_prefix: Option<String>,
	prefixes: HashMap<TnId, String>,
	command_global: HashMap<Box<str>, bool>,
	group_global: HashMap<Box<str>, bool>,
	commands_enabled: HashMap<(TnId, Box<str>), bool>,
	groups_enabled: HashMap<(TnId, Box<str>), bool>,
}

#[derive(Debug, Default)]
pub struct MemoryHost {
	state: RwLock<HostState>,
	events: EventBus,
}

impl MemoryHost {
	pub fn new() -> Self {
		Self::default()
	}

	/// Load a tenant without announcing it
	pub fn add_tenant(&self, tn_id: TnId) {
		self.state.write().tenants.insert(tn_id);
	}

	/// Register a command without announcing it
	pub fn add_command(&self, name: &str) {
		let mut state = self.state.write();
		if !state.commands.iter().any(|c| c.as_ref() == name) {
			state.commands.push(name.into());
		}
	}

	/// Register a group without announcing it
	pub fn add_group(&self, id: &str) {
		let mut state = self.state.write();
		if !state.groups.iter().any(|g| g.as_ref() == id) {
			state.groups.push(id.into());
		}
	}

	/// Load a tenant and emit `TenantCreated`
	pub async fn join_tenant(&self, tn_id: TnId) -> GsResult<()> {
		self.add_tenant(tn_id.clone());
		self.events.emit(HostEvent::TenantCreated { tn_id }).await
	}

	/// Register a command and emit `CommandRegistered`
	pub async fn register_command(&self, name: &str) -> GsResult<()> {
		self.add_command(name);
		self.events.emit(HostEvent::CommandRegistered { command: name.into() }).await
	}

	/// Register a group and emit `GroupRegistered`
	pub async fn register_group(&self, id: &str) -> GsResult<()> {
		self.add_group(id);
		self.events.emit(HostEvent::GroupRegistered { group: id.into() }).await
	}

	/// Effective prefix for a scope: tenant override, else process default
	pub fn prefix(&self, scope: &Scope) -> Option<String> {
		let state = self.state.read();
		scope
			.tn_id()
			.and_then(|tn_id| state.prefixes.get(tn_id).cloned())
			.or_else(|| state.default_prefix.clone())
	}

	/// Live enabled flag for a command, `None` if nothing set it
	pub fn command_enabled(&self, scope: &Scope, command: &str) -> Option<bool> {
		let state = self.state.read();
		match scope {
			Scope::Global => state.command_global.get(command).copied(),
			Scope::Tenant(tn_id) => {
				state.commands_enabled.get(&(tn_id.clone(), Box::<str>::from(command))).copied()
			}
		}
	}

	/// Live enabled flag for a group, `None` if nothing set it
	pub fn group_enabled(&self, scope: &Scope, group: &str) -> Option<bool> {
		let state = self.state.read();
		match scope {
			Scope::Global => state.group_global.get(group).copied(),
			Scope::Tenant(tn_id) => state.groups_enabled.get(&(tn_id.clone(), Box::<str>::from(group))).copied(),
		}
	}
}

impl Host for MemoryHost {
	fn has_tenant(&self, tn_id: &TnId) -> bool {
		self.state.read().tenants.contains(tn_id)
	}

	fn command_names(&self) -> Vec<Box<str>> {
		self.state.read().commands.clone()
	}

	fn group_ids(&self) -> Vec<Box<str>> {
		self.state.read().groups.clone()
	}

	fn set_prefix(&self, scope: &Scope, prefix: &str) {
		let mut state = self.state.write();
		match scope {
			Scope::Global => state.default_prefix = Some(prefix.to_string()),
			Scope::Tenant(tn_id) => {
				state.prefixes.insert(tn_id.clone(), prefix.to_string());
			}
		}
	}

	fn set_command_enabled(&self, scope: &Scope, command: &str, enabled: bool) {
		let mut state = self.state.write();
		match scope {
			Scope::Global => {
				state.command_global.insert(command.into(), enabled);
			}
			Scope::Tenant(tn_id) => {
				state.commands_enabled.insert((tn_id.clone(), command.into()), enabled);
			}
		}
	}

	fn set_group_enabled(&self, scope: &Scope, group: &str, enabled: bool) {
		let mut state = self.state.write();
		match scope {
			Scope::Global => {
				state.group_global.insert(group.into(), enabled);
			}
			Scope::Tenant(tn_id) => {
				state.groups_enabled.insert((tn_id.clone(), group.into()), enabled);
			}
		}
	}

	fn events(&self) -> &EventBus {
		&self.events
	}
}

// vim: ts=4
