//! Synchronization engine
//!
//! Plays persisted settings forward into the host's live objects and writes
//! host-side changes back to the store. Unset keys never force a default: a
//! command without a `cmd-<name>` entry keeps whatever state the host gave it.

use std::collections::HashMap;

use guildset_types::host::{Host, HostEvent};
use guildset_types::types::{PREFIX_KEY, command_key, decode_flag, encode_flag, group_key};

use crate::prelude::*;
use crate::provider::Inner;

pub(crate) struct SyncEngine<'a> {
	inner: &'a Inner,
	host: &'a dyn Host,
}

impl<'a> SyncEngine<'a> {
	pub(crate) fn new(inner: &'a Inner, host: &'a dyn Host) -> Self {
		Self { inner, host }
	}

	/// Whether settings for this scope have a live target right now
	fn is_live(&self, scope: &Scope) -> bool {
		match scope {
			Scope::Global => true,
			Scope::Tenant(tn_id) => self.host.has_tenant(tn_id),
		}
	}

	/// Load every persisted scope and apply it. Returns the number of scopes applied.
	pub(crate) async fn startup(&self) -> GsResult<usize> {
		let all = self.inner.store.all().await?;
		Ok(self.apply_all(&all))
	}

	fn apply_all(&self, all: &HashMap<Scope, SettingsMap>) -> usize {
		all.iter().filter(|(scope, settings)| self.setup_scope(scope, settings)).count()
	}

	/// Apply a scope's settings to its live object. Returns false if the host does
	/// not know the tenant yet.
	pub(crate) fn setup_scope(&self, scope: &Scope, settings: &SettingsMap) -> bool {
		if !self.is_live(scope) {
			debug!("Skipping settings of tenant {} (not loaded)", scope);
			return false;
		}

		if let Some(prefix) = settings.get(PREFIX_KEY) {
			self.host.set_prefix(scope, prefix);
		}
		for command in self.host.command_names() {
			self.setup_command(scope, &command, settings);
		}
		for group in self.host.group_ids() {
			self.setup_group(scope, &group, settings);
		}
		true
	}

	pub(crate) fn setup_command(&self, scope: &Scope, command: &str, settings: &SettingsMap) {
		if let Some(value) = settings.get(&command_key(command)) {
			self.host.set_command_enabled(scope, command, decode_flag(value));
		}
	}

	pub(crate) fn setup_group(&self, scope: &Scope, group: &str, settings: &SettingsMap) {
		if let Some(value) = settings.get(&group_key(group)) {
			self.host.set_group_enabled(scope, group, decode_flag(value));
		}
	}

	pub(crate) async fn handle(&self, event: HostEvent) -> GsResult<()> {
		debug!(event = event.kind().name(), "Settings sync event");
		match event {
			HostEvent::PrefixChanged { scope, prefix: Some(prefix) } => {
				self.inner.set(&scope, PREFIX_KEY, &prefix).await
			}
			HostEvent::PrefixChanged { scope, prefix: None } => {
				self.inner.remove(&scope, PREFIX_KEY).await.map(|_| ())
			}
			HostEvent::CommandStatusChanged { scope, command, enabled } => {
				self.inner.set(&scope, &command_key(&command), encode_flag(enabled)).await
			}
			HostEvent::GroupStatusChanged { scope, group, enabled } => {
				self.inner.set(&scope, &group_key(&group), encode_flag(enabled)).await
			}
			HostEvent::TenantCreated { tn_id } => {
				let scope = Scope::Tenant(tn_id);
				let settings = self.inner.settings(&scope).await?;
				self.setup_scope(&scope, &settings);
				Ok(())
			}
			HostEvent::CommandRegistered { command } => {
				let all = self.inner.store.all().await?;
				for (scope, settings) in all.iter().filter(|(scope, _)| self.is_live(scope)) {
					self.setup_command(scope, &command, settings);
				}
				Ok(())
			}
			HostEvent::GroupRegistered { group } => {
				let all = self.inner.store.all().await?;
				for (scope, settings) in all.iter().filter(|(scope, _)| self.is_live(scope)) {
					self.setup_group(scope, &group, settings);
				}
				Ok(())
			}
		}
	}
}

// vim: ts=4
