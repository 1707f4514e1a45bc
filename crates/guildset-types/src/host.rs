//! Host application contract.
//!
//! The host owns the live object graph (tenants, commands, groups). The settings
//! provider only needs to look tenants up and flip a few well-known switches on
//! them, so that is all this trait exposes.

use crate::event_bus::EventBus;
use crate::prelude::*;

pub trait Host: Send + Sync {
	/// Whether the host currently has this tenant loaded
	fn has_tenant(&self, tn_id: &TnId) -> bool;
	/// Names of all registered commands
	fn command_names(&self) -> Vec<Box<str>>;
	/// Ids of all registered command groups
	fn group_ids(&self) -> Vec<Box<str>>;

	/// Prefix override for a tenant, or the process-wide default for `Scope::Global`
	fn set_prefix(&self, scope: &Scope, prefix: &str);
	/// Per-tenant enabled flag, or the command's global flag for `Scope::Global`
	fn set_command_enabled(&self, scope: &Scope, command: &str, enabled: bool);
	/// Per-tenant enabled flag, or the group's global flag for `Scope::Global`
	fn set_group_enabled(&self, scope: &Scope, group: &str, enabled: bool);

	fn events(&self) -> &EventBus;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
	PrefixChanged,
	CommandStatusChanged,
	GroupStatusChanged,
	TenantCreated,
	CommandRegistered,
	GroupRegistered,
}

impl EventKind {
	pub const ALL: [EventKind; 6] = [
		EventKind::PrefixChanged,
		EventKind::CommandStatusChanged,
		EventKind::GroupStatusChanged,
		EventKind::TenantCreated,
		EventKind::CommandRegistered,
		EventKind::GroupRegistered,
	];

	pub fn name(self) -> &'static str {
		match self {
			EventKind::PrefixChanged => "prefix_changed",
			EventKind::CommandStatusChanged => "command_status_changed",
			EventKind::GroupStatusChanged => "group_status_changed",
			EventKind::TenantCreated => "tenant_created",
			EventKind::CommandRegistered => "command_registered",
			EventKind::GroupRegistered => "group_registered",
		}
	}
}

/// Host lifecycle events the provider reacts to
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostEvent {
	/// `None` means the override was reset
	PrefixChanged { scope: Scope, prefix: Option<Box<str>> },
	CommandStatusChanged { scope: Scope, command: Box<str>, enabled: bool },
	GroupStatusChanged { scope: Scope, group: Box<str>, enabled: bool },
	TenantCreated { tn_id: TnId },
	CommandRegistered { command: Box<str> },
	GroupRegistered { group: Box<str> },
}

impl HostEvent {
	pub fn kind(&self) -> EventKind {
		match self {
			HostEvent::PrefixChanged { .. } => EventKind::PrefixChanged,
			HostEvent::CommandStatusChanged { .. } => EventKind::CommandStatusChanged,
			HostEvent::GroupStatusChanged { .. } => EventKind::GroupStatusChanged,
			HostEvent::TenantCreated { .. } => EventKind::TenantCreated,
			HostEvent::CommandRegistered { .. } => EventKind::CommandRegistered,
			HostEvent::GroupRegistered { .. } => EventKind::GroupRegistered,
		}
	}
}

// vim: ts=4
