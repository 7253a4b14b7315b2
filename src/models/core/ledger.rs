//! Ledger configuration model.
//!
//! One `Ledger` describes a single chain the gateway serves: how to reach its node,
//! how the change observer polls it, where callbacks go and which auxiliary currencies
//! ride on it. Chain-specific settings live in the tagged `LedgerSettings` enum.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::models::{LedgerType, PriorityTable};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RpcUrl {
	pub type_: String,
	pub url: String,
	pub weight: u32,
}

/// Basic auth credentials for node RPC
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RpcCredentials {
	pub username: String,
	pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ObserverConfig {
	#[serde(default = "default_true")]
	pub enabled: bool,
	pub cron_schedule: String,
	/// Height used when no cursor has been stored yet
	#[serde(default)]
	pub start_height: Option<u64>,
	#[serde(default)]
	pub confirmation_blocks: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CallbackConfig {
	#[serde(default)]
	pub enabled: bool,
	#[serde(default)]
	pub base_uri: Option<String>,
	#[serde(default)]
	pub timeout_ms: Option<u64>,
}

/// Auxiliary currency mounted on a parent ledger
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TokenConfig {
	pub route: String,
	#[serde(default)]
	pub name: Option<String>,
	/// ERC20 contract address, TRC10 asset id, TRC20 contract address or EOSIO token contract account
	pub contract: String,
	/// Currency symbol (EOSIO)
	#[serde(default)]
	pub symbol: Option<String>,
	/// Overrides the precision read from the chain
	#[serde(default)]
	pub decimals: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UtxoSettings {
	#[serde(default = "default_utxo_precision")]
	pub precision: u32,
	#[serde(default)]
	pub change_address: Option<String>,
	/// Confirmation target in blocks per priority
	#[serde(default = "default_confirmation_targets")]
	pub confirmation_targets: PriorityTable<u16>,
	#[serde(default = "default_true")]
	pub use_smart_fee: bool,
	/// Fee rate per kvB used when smart fee estimation is off or unavailable
	#[serde(default = "default_flat_fee_rate")]
	pub flat_fee_rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EvmSettings {
	pub main_account: String,
	#[serde(default)]
	pub main_account_password: Option<String>,
	/// Gas price in gwei per priority
	#[serde(default = "default_gas_prices")]
	pub gas_prices: PriorityTable<u64>,
	#[serde(default = "default_gas_limit")]
	pub gas_limit: u64,
	#[serde(default = "default_token_gas_limit")]
	pub token_gas_limit: u64,
	/// Seconds an account stays unlocked for one withdrawal
	#[serde(default = "default_unlock_seconds")]
	pub unlock_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct XrpSettings {
	pub main_account: String,
	#[serde(default)]
	pub main_account_secret: Option<String>,
	#[serde(default)]
	pub require_destination_tag: bool,
	#[serde(default = "default_fee_multipliers")]
	pub fee_multipliers: PriorityTable<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TronSettings {
	pub main_account: String,
	#[serde(default)]
	pub main_account_private_key: Option<String>,
	/// Most sun a TRC20 transfer may burn for energy
	#[serde(default = "default_trc20_fee_limit")]
	pub trc20_fee_limit: u64,
}

/// Stake and RAM given to accounts created by the gateway
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EosioAccountResources {
	pub ram_bytes: u64,
	pub stake_net: String,
	pub stake_cpu: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EosioSettings {
	pub main_account: String,
	/// Active public key of the main account, held by keosd
	#[serde(default)]
	pub main_account_public_key: Option<String>,
	#[serde(default)]
	pub wallet_url: Option<String>,
	#[serde(default)]
	pub owned_accounts: Vec<String>,
	#[serde(default = "default_eosio_contract")]
	pub contract: String,
	#[serde(default = "default_eosio_symbol")]
	pub symbol: String,
	#[serde(default)]
	pub require_memo: bool,
	#[serde(default = "default_expire_seconds")]
	pub expire_seconds: u64,
	#[serde(default)]
	pub new_account: Option<EosioAccountResources>,
}

/// Chain specific settings, tagged by `ledger_type`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "ledger_type", rename_all = "lowercase")]
pub enum LedgerSettings {
	Utxo(UtxoSettings),
	Evm(EvmSettings),
	Xrp(XrpSettings),
	Tron(TronSettings),
	Eosio(EosioSettings),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Ledger {
	/// Route of the native currency, e.g. `btc`
	pub slug: String,
	pub name: String,
	pub rpc_urls: Vec<RpcUrl>,
	#[serde(default)]
	pub rpc_credentials: Option<RpcCredentials>,
	#[serde(default)]
	pub observer: Option<ObserverConfig>,
	#[serde(default)]
	pub callback: Option<CallbackConfig>,
	/// Keep a local seen-transaction log for this ledger
	#[serde(default)]
	pub explorer: bool,
	#[serde(default)]
	pub tokens: Vec<TokenConfig>,
	#[serde(flatten)]
	pub settings: LedgerSettings,
}

impl Ledger {
	pub fn ledger_type(&self) -> LedgerType {
		match self.settings {
			LedgerSettings::Utxo(_) => LedgerType::Utxo,
			LedgerSettings::Evm(_) => LedgerType::Evm,
			LedgerSettings::Xrp(_) => LedgerType::Xrp,
			LedgerSettings::Tron(_) => LedgerType::Tron,
			LedgerSettings::Eosio(_) => LedgerType::Eosio,
		}
	}

	/// True when the observer should be scheduled
	pub fn observer_enabled(&self) -> bool {
		self.observer.as_ref().is_some_and(|o| o.enabled)
	}

	/// Callback base URI when dispatch is enabled
	pub fn callback_uri(&self) -> Option<&str> {
		self.callback
			.as_ref()
			.filter(|c| c.enabled)
			.and_then(|c| c.base_uri.as_deref())
	}
}

fn default_true() -> bool {
	true
}

fn default_utxo_precision() -> u32 {
	8
}

fn default_confirmation_targets() -> PriorityTable<u16> {
	PriorityTable {
		high: 1,
		medium: 5,
		low: 10,
	}
}

fn default_flat_fee_rate() -> Decimal {
	dec!(0.0001)
}

fn default_gas_prices() -> PriorityTable<u64> {
	PriorityTable {
		high: 30,
		medium: 20,
		low: 10,
	}
}

fn default_gas_limit() -> u64 {
	21_000
}

fn default_token_gas_limit() -> u64 {
	100_000
}

fn default_unlock_seconds() -> u64 {
	30
}

fn default_trc20_fee_limit() -> u64 {
	30_000_000
}

fn default_fee_multipliers() -> PriorityTable<Decimal> {
	PriorityTable {
		high: dec!(1.5),
		medium: dec!(1.2),
		low: dec!(1.0),
	}
}

fn default_eosio_contract() -> String {
	"eosio.token".to_string()
}

fn default_eosio_symbol() -> String {
	"EOS".to_string()
}

fn default_expire_seconds() -> u64 {
	30
}
