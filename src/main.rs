//! Wallet gateway service entry point.
//!
//! Loads the ledger configuration, mounts an adapter per ledger and per auxiliary
//! currency, and schedules one change observer per observed ledger. Runs until Ctrl+C,
//! then stops the observers and lets the adapters shut down.
//!
//! # Flow
//! 1. Loads ledger configurations from `config/ledgers` (or `--config-path`)
//! 2. Opens the file store under `data` (or `--data-path`)
//! 3. Connects to each node and mounts its adapters
//! 4. Starts the observers and waits for a shutdown signal

use wallet_gateway::{
	bootstrap::{initialize_gateway, initialize_ledgers, GatewayStorage, Result},
	services::observer::FileLedgerStorage,
	utils::{constants::DEFAULT_DATA_DIR, logging::setup_logging},
};

use clap::{Arg, Command};
use dotenvy::dotenv;
use std::{
	env::{set_var, var},
	path::PathBuf,
	sync::Arc,
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
	let matches = Command::new("wallet-gateway")
		.version(env!("CARGO_PKG_VERSION"))
		.about(
			"A ledger-agnostic wallet gateway that serves accounts, balances and withdrawals \
			 across chains and reports incoming deposits to a callback endpoint.",
		)
		.arg(
			Arg::new("log-file")
				.long("log-file")
				.help("Write logs to file instead of stdout")
				.action(clap::ArgAction::SetTrue),
		)
		.arg(
			Arg::new("log-level")
				.long("log-level")
				.help("Set log level (trace, debug, info, warn, error)")
				.value_name("LEVEL"),
		)
		.arg(
			Arg::new("log-path")
				.long("log-path")
				.help("Path to store log files (default: logs/)")
				.value_name("PATH"),
		)
		.arg(
			Arg::new("config-path")
				.long("config-path")
				.help("Directory holding one JSON file per ledger (default: config/ledgers)")
				.value_name("PATH"),
		)
		.arg(
			Arg::new("data-path")
				.long("data-path")
				.help("Directory for cursors, transaction logs and generated accounts (default: data/)")
				.value_name("PATH"),
		)
		.get_matches();

	// Load environment variables from .env file
	dotenv().ok();

	// CLI options only apply when the environment does not already set them
	if matches.get_flag("log-file") && var("LOG_MODE").is_err() {
		set_var("LOG_MODE", "file");
	}

	if let Some(level) = matches.get_one::<String>("log-level") {
		if var("LOG_LEVEL").is_err() {
			set_var("LOG_LEVEL", level);
		}
	}

	if let Some(path) = matches.get_one::<String>("log-path") {
		if var("LOG_DATA_DIR").is_err() {
			set_var("LOG_DATA_DIR", path);
		}
	}

	setup_logging().unwrap_or_else(|e| {
		error!("Failed to setup logging: {}", e);
	});

	let config_path = matches.get_one::<String>("config-path").map(PathBuf::from);
	let data_path = matches
		.get_one::<String>("data-path")
		.map(PathBuf::from)
		.unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

	let ledgers = initialize_ledgers(config_path.as_deref()).map_err(|e| {
		error!("Failed to load ledger configuration: {}", e);
		e
	})?;
	if ledgers.is_empty() {
		info!("No ledgers configured. Exiting...");
		return Ok(());
	}

	let storage = GatewayStorage::shared(Arc::new(FileLedgerStorage::with_path(&data_path)));
	let gateway = initialize_gateway(&ledgers, storage).await?;

	info!(
		routes = ?gateway.registry.routes().await,
		"Service started. Press Ctrl+C to shutdown"
	);

	if let Err(e) = tokio::signal::ctrl_c().await {
		error!("Error waiting for Ctrl+C: {}", e);
	}
	info!("Shutdown signal received, stopping services...");

	gateway.shutdown().await;

	info!("Shutdown complete");
	Ok(())
}
