//! Demo host: an in-memory bot wired to a SQLite settings table.
//!
//! Environment:
//! - `DB_DIR`: database directory (default `./data`)
//! - `SETTINGS_TABLE`: table name (default `settings`)
//! - `SETTINGS_CACHE_SIZE`: scopes kept in the read cache (default 128, 0 disables)
//! - `RUST_LOG`: log filter

use std::sync::Arc;
use std::{env, path, process};

use guildset::{GsResult, Host, HostEvent, MemoryHost, ProviderOpts, Scope, SettingsProvider, TnId};
use guildset_settings_adapter_sqlite::{DEFAULT_TABLE, SettingsAdapterSqlite, SqliteOpts};
use tracing::{error, info};

pub struct Config {
	pub db_dir: path::PathBuf,
	pub table: String,
	pub cache_size: usize,
}

impl Config {
	fn from_env() -> Self {
		let defaults = ProviderOpts::default();
		Config {
			db_dir: path::PathBuf::from(env::var("DB_DIR").unwrap_or_else(|_| "./data".to_string())),
			table: env::var("SETTINGS_TABLE").unwrap_or_else(|_| DEFAULT_TABLE.to_string()),
			cache_size: env::var("SETTINGS_CACHE_SIZE")
				.ok()
				.and_then(|size| size.parse().ok())
				.unwrap_or(defaults.cache_size),
		}
	}
}

async fn run(config: Config) -> GsResult<()> {
	let opts = SqliteOpts::new(config.db_dir.join("settings.db")).table(config.table);
	let adapter = Arc::new(SettingsAdapterSqlite::with_opts(opts).await?);

	let host = Arc::new(MemoryHost::new());
	let home = TnId::new("home")?;
	host.add_tenant(home.clone());
	host.add_command("ping");
	host.add_group("util");

	let provider = SettingsProvider::builder(adapter.clone()).cache_size(config.cache_size).build();
	provider.init(host.clone()).await?;

	let scope = Scope::Tenant(home);
	info!("Prefix of {}: {:?}", scope, host.prefix(&scope));

	// Changes made on the host side are written back
	host.events()
		.emit(HostEvent::PrefixChanged { scope: scope.clone(), prefix: Some("?".into()) })
		.await?;
	host.events()
		.emit(HostEvent::CommandStatusChanged { scope: scope.clone(), command: "ping".into(), enabled: false })
		.await?;
	info!("Stored settings of {}: {:?}", scope, provider.get_all(&scope).await?);

	// A tenant that shows up later picks up whatever is already stored for it
	let late = TnId::new("late")?;
	provider.set(&Scope::Tenant(late.clone()), "prefix", "$").await?;
	host.join_tenant(late.clone()).await?;
	info!("Prefix of {}: {:?}", late, host.prefix(&Scope::Tenant(late.clone())));

	provider.shutdown();
	adapter.close().await;
	Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
	tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_target(false)
		.init();

	if let Err(err) = run(Config::from_env()).await {
		error!("basic-host failed: {}", err);
		process::exit(1);
	}
}

// vim: ts=4
