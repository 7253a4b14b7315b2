//! XRP ledger (rippled JSON-RPC) payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Transaction object as returned by `tx` and inside `account_tx`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XrpTransaction {
	#[serde(default)]
	pub hash: String,
	#[serde(rename = "TransactionType")]
	pub transaction_type: String,
	#[serde(rename = "Account")]
	pub account: String,
	#[serde(rename = "Destination", default)]
	pub destination: Option<String>,
	/// Drops as a string for XRP, an object for issued currencies
	#[serde(rename = "Amount", default)]
	pub amount: Option<Value>,
	#[serde(rename = "DestinationTag", default)]
	pub destination_tag: Option<u32>,
	#[serde(rename = "Fee", default)]
	pub fee: Option<String>,
	#[serde(default)]
	pub ledger_index: Option<u64>,
	#[serde(default)]
	pub validated: Option<bool>,
	#[serde(default)]
	pub meta: Option<Value>,
}

impl XrpTransaction {
	/// Amount in drops when the payment moves native XRP
	pub fn native_drops(&self) -> Option<u64> {
		self.amount
			.as_ref()
			.and_then(|a| a.as_str())
			.and_then(|s| s.parse().ok())
	}

	/// Engine result recorded in the transaction metadata
	pub fn result(&self) -> Option<&str> {
		self.meta
			.as_ref()
			.and_then(|m| m.get("TransactionResult"))
			.and_then(|r| r.as_str())
	}
}

/// Entry of `account_tx`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XrpAccountTransaction {
	pub tx: XrpTransaction,
	#[serde(default)]
	pub meta: Option<Value>,
	#[serde(default)]
	pub validated: bool,
}

/// Result of `account_tx`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XrpAccountTransactions {
	#[serde(default)]
	pub transactions: Vec<XrpAccountTransaction>,
	#[serde(default)]
	pub marker: Option<Value>,
}

/// Fee levels reported by the `fee` method, in drops
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XrpFeeDrops {
	pub base_fee: String,
	#[serde(default)]
	pub open_ledger_fee: Option<String>,
}

/// Result of the `fee` method
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XrpFee {
	pub drops: XrpFeeDrops,
	#[serde(default)]
	pub current_queue_size: Option<String>,
}

/// Result of `wallet_propose`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XrpWallet {
	pub account_id: String,
	pub master_seed: String,
	#[serde(default)]
	pub public_key: Option<String>,
}

/// Result of sign-and-submit `submit`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XrpSubmitResult {
	pub engine_result: String,
	#[serde(default)]
	pub engine_result_message: Option<String>,
	#[serde(default)]
	pub tx_json: Option<Value>,
}

impl XrpSubmitResult {
	pub fn hash(&self) -> Option<String> {
		self.tx_json
			.as_ref()
			.and_then(|tx| tx.get("hash"))
			.and_then(|h| h.as_str())
			.map(str::to_string)
	}

	/// True when the transaction was applied or queued for a later ledger
	pub fn accepted(&self) -> bool {
		matches!(self.engine_result.as_str(), "tesSUCCESS" | "terQUEUED")
	}
}
