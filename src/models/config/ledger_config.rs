//! Ledger configuration loading and validation.
//!
//! This module implements the ConfigLoader trait for Ledger configurations,
//! allowing ledgers to be loaded from JSON files.

use alloy::primitives::Address;
use cron::Schedule;
use rust_decimal::Decimal;
use std::{collections::HashSet, fs, path::Path, str::FromStr};

use crate::{
	models::{config::error::ConfigError, ConfigLoader, Ledger, LedgerSettings},
	utils::{
		address::{is_trc10_asset_id, tron_address_to_evm},
		constants::DEFAULT_LEDGER_CONFIG_DIR,
	},
};

const SUPPORTED_RPC_TYPES: [&str; 1] = ["rpc"];

fn is_valid_identifier(value: &str) -> bool {
	!value.is_empty()
		&& value
			.chars()
			.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

impl ConfigLoader for Ledger {
	/// Load all ledger configurations from a directory
	///
	/// Ledgers are keyed by slug, which is also the route of their native currency.
	fn load_all<T>(path: Option<&Path>) -> Result<T, ConfigError>
	where
		T: FromIterator<(String, Self)>,
	{
		let ledger_dir = path.unwrap_or(Path::new(DEFAULT_LEDGER_CONFIG_DIR));
		let mut pairs = Vec::new();

		if !ledger_dir.exists() {
			return Err(ConfigError::file_error("ledgers directory not found"));
		}

		for entry in fs::read_dir(ledger_dir)? {
			let entry = entry?;
			let path = entry.path();

			if !Self::is_json_file(&path) {
				continue;
			}

			let ledger = Self::load_from_path(&path).map_err(|e| {
				ConfigError::validation_error(format!("{}: {}", path.display(), e))
			})?;
			pairs.push((ledger.slug.clone(), ledger));
		}

		Ok(T::from_iter(pairs))
	}

	fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
		let file = fs::File::open(path)?;
		let config: Ledger = serde_json::from_reader(file)?;

		config.validate()?;

		Ok(config)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if !is_valid_identifier(&self.slug) {
			return Err(ConfigError::validation_error(
				"Slug must contain only lowercase letters, numbers, and underscores",
			));
		}

		if self.name.trim().is_empty() {
			return Err(ConfigError::validation_error("Ledger name is required"));
		}

		if self.rpc_urls.is_empty() {
			return Err(ConfigError::validation_error(
				"At least one RPC URL is required",
			));
		}

		if !self
			.rpc_urls
			.iter()
			.all(|rpc_url| SUPPORTED_RPC_TYPES.contains(&rpc_url.type_.as_str()))
		{
			return Err(ConfigError::validation_error(format!(
				"RPC URL type must be one of: {}",
				SUPPORTED_RPC_TYPES.join(", ")
			)));
		}

		if !self.rpc_urls.iter().all(|rpc_url| {
			rpc_url.url.starts_with("http://") || rpc_url.url.starts_with("https://")
		}) {
			return Err(ConfigError::validation_error(
				"All RPC URLs must start with http:// or https://",
			));
		}

		if !self.rpc_urls.iter().all(|rpc_url| rpc_url.weight <= 100) {
			return Err(ConfigError::validation_error(
				"All RPC URL weights must be between 0 and 100",
			));
		}

		if let Some(observer) = &self.observer {
			Schedule::from_str(&observer.cron_schedule).map_err(|e| {
				ConfigError::validation_error(format!(
					"Invalid cron schedule '{}': {}",
					observer.cron_schedule, e
				))
			})?;
		}

		if let Some(callback) = &self.callback {
			if callback.enabled {
				let base_uri = callback.base_uri.as_deref().ok_or_else(|| {
					ConfigError::validation_error("Callback base_uri is required when enabled")
				})?;
				url::Url::parse(base_uri).map_err(|e| {
					ConfigError::validation_error(format!(
						"Invalid callback base_uri '{}': {}",
						base_uri, e
					))
				})?;
			}
		}

		self.validate_tokens()?;
		self.validate_settings()
	}
}

impl Ledger {
	fn validate_tokens(&self) -> Result<(), ConfigError> {
		if self.tokens.is_empty() {
			return Ok(());
		}

		if matches!(
			self.settings,
			LedgerSettings::Utxo(_) | LedgerSettings::Xrp(_)
		) {
			return Err(ConfigError::validation_error(format!(
				"Ledger type {} does not support auxiliary currencies",
				self.ledger_type()
			)));
		}

		let mut routes = HashSet::new();
		for token in &self.tokens {
			if !is_valid_identifier(&token.route) {
				return Err(ConfigError::validation_error(format!(
					"Invalid token route: {}",
					token.route
				)));
			}
			if token.route == self.slug || !routes.insert(token.route.as_str()) {
				return Err(ConfigError::validation_error(format!(
					"Duplicate route: {}",
					token.route
				)));
			}
			if token.contract.is_empty() {
				return Err(ConfigError::validation_error(format!(
					"Token {} requires a contract",
					token.route
				)));
			}
			match &self.settings {
				LedgerSettings::Evm(_) => {
					Address::from_str(&token.contract).map_err(|_| {
						ConfigError::validation_error(format!(
							"Token {} has an invalid contract address",
							token.route
						))
					})?;
				}
				LedgerSettings::Tron(_)
					if !is_trc10_asset_id(&token.contract)
						&& tron_address_to_evm(&token.contract).is_none() =>
				{
					return Err(ConfigError::validation_error(format!(
						"Token {} needs a TRC10 asset id or a TRC20 contract address",
						token.route
					)));
				}
				LedgerSettings::Eosio(_) if token.symbol.is_none() => {
					return Err(ConfigError::validation_error(format!(
						"Token {} requires a symbol",
						token.route
					)));
				}
				_ => {}
			}
		}

		Ok(())
	}

	fn validate_settings(&self) -> Result<(), ConfigError> {
		match &self.settings {
			LedgerSettings::Utxo(settings) => {
				if settings.precision > 18 {
					return Err(ConfigError::validation_error(
						"UTXO precision must be at most 18",
					));
				}
				let targets = settings.confirmation_targets;
				if targets.high == 0 || targets.medium == 0 || targets.low == 0 {
					return Err(ConfigError::validation_error(
						"Confirmation targets must be greater than 0",
					));
				}
				if settings.flat_fee_rate <= Decimal::ZERO {
					return Err(ConfigError::validation_error(
						"flat_fee_rate must be greater than 0",
					));
				}
			}
			LedgerSettings::Evm(settings) => {
				Address::from_str(&settings.main_account).map_err(|_| {
					ConfigError::validation_error("main_account is not a valid EVM address")
				})?;
				if settings.gas_limit == 0 || settings.token_gas_limit == 0 {
					return Err(ConfigError::validation_error(
						"Gas limits must be greater than 0",
					));
				}
			}
			LedgerSettings::Xrp(settings) => {
				let multipliers = settings.fee_multipliers;
				if [multipliers.high, multipliers.medium, multipliers.low]
					.iter()
					.any(|m| *m <= Decimal::ZERO)
				{
					return Err(ConfigError::validation_error(
						"Fee multipliers must be greater than 0",
					));
				}
				if !settings.main_account.starts_with('r') {
					return Err(ConfigError::validation_error(
						"main_account is not a classic XRP address",
					));
				}
			}
			LedgerSettings::Tron(settings) => {
				if !settings.main_account.starts_with('T') {
					return Err(ConfigError::validation_error(
						"main_account is not a base58 TRON address",
					));
				}
			}
			LedgerSettings::Eosio(settings) => {
				if settings.main_account.is_empty() || settings.main_account.len() > 12 {
					return Err(ConfigError::validation_error(
						"main_account must be an EOSIO account name",
					));
				}
			}
		}
		Ok(())
	}
}

/// Checks that no route is claimed twice across ledgers and their tokens
pub fn validate_unique_routes<'a>(
	ledgers: impl IntoIterator<Item = &'a Ledger>,
) -> Result<(), ConfigError> {
	let mut routes = HashSet::new();
	for ledger in ledgers {
		let own = std::iter::once(ledger.slug.as_str());
		let tokens = ledger.tokens.iter().map(|t| t.route.as_str());
		for route in own.chain(tokens) {
			if !routes.insert(route.to_string()) {
				return Err(ConfigError::validation_error(format!(
					"Route {} is configured more than once",
					route
				)));
			}
		}
	}
	Ok(())
}
