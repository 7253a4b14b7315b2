//! EOSIO nodeos and keosd payloads.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// Result of `/v1/chain/get_info`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EosioInfo {
	pub chain_id: String,
	pub head_block_num: u64,
	pub last_irreversible_block_num: u64,
	#[serde(default)]
	pub last_irreversible_block_id: Option<String>,
	#[serde(default)]
	pub head_block_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EosioPermissionLevel {
	pub actor: String,
	pub permission: String,
}

/// Contract action with JSON data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EosioAction {
	pub account: String,
	pub name: String,
	#[serde(default)]
	pub authorization: Vec<EosioPermissionLevel>,
	#[serde(default)]
	pub data: Value,
}

/// Data of an `eosio.token` style `transfer` or `issue` action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EosioTransferData {
	#[serde(default)]
	pub from: Option<String>,
	pub to: String,
	pub quantity: String,
	#[serde(default)]
	pub memo: String,
}

/// An asset quantity such as `1.0000 EOS`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EosioAsset {
	pub amount: Decimal,
	pub symbol: String,
}

impl EosioAsset {
	/// Formats an amount with the currency precision
	pub fn format(amount: Decimal, precision: u32, symbol: &str) -> String {
		let mut rounded = amount.round_dp(precision);
		rounded.rescale(precision);
		format!("{} {}", rounded, symbol)
	}
}

impl FromStr for EosioAsset {
	type Err = String;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		let mut parts = value.split_whitespace();
		let amount = parts
			.next()
			.ok_or_else(|| format!("Empty quantity: {}", value))?;
		let symbol = parts
			.next()
			.ok_or_else(|| format!("Quantity without symbol: {}", value))?;
		let amount = Decimal::from_str(amount).map_err(|e| e.to_string())?;
		Ok(Self {
			amount,
			symbol: symbol.to_string(),
		})
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EosioTransactionReceipt {
	pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EosioTransactionBody {
	#[serde(default)]
	pub actions: Vec<EosioAction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EosioSignedTransaction {
	pub receipt: EosioTransactionReceipt,
	pub trx: EosioTransactionBody,
}

/// Result of `/v1/history/get_transaction`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EosioTransaction {
	pub id: String,
	#[serde(default)]
	pub block_num: Option<u64>,
	pub trx: EosioSignedTransaction,
}

impl EosioTransaction {
	pub fn executed(&self) -> bool {
		self.trx.receipt.status == "executed"
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EosioActionTraceBody {
	pub trx_id: String,
	pub act: EosioAction,
	#[serde(default)]
	pub receipt: Option<Value>,
}

/// Entry of `/v1/history/get_actions`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EosioActionTrace {
	pub account_action_seq: i64,
	pub block_num: u64,
	pub action_trace: EosioActionTraceBody,
}

/// Result of `/v1/history/get_actions`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EosioActions {
	#[serde(default)]
	pub actions: Vec<EosioActionTrace>,
	#[serde(default)]
	pub last_irreversible_block: Option<u64>,
}

/// Entry of `/v1/chain/get_currency_stats`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EosioCurrencyStats {
	pub supply: String,
	pub max_supply: String,
	pub issuer: String,
}

impl EosioCurrencyStats {
	/// Number of decimal places of the currency
	pub fn precision(&self) -> u32 {
		self.max_supply
			.split_whitespace()
			.next()
			.and_then(|amount| amount.split('.').nth(1))
			.map(|fraction| fraction.len() as u32)
			.unwrap_or(0)
	}
}

/// Result of `/v1/chain/push_transaction`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EosioPushResult {
	pub transaction_id: String,
	#[serde(default)]
	pub processed: Option<Value>,
}
