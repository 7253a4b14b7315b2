//! UTXO wallet payloads as returned by Bitcoin Core style nodes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An unspent output owned by the node wallet (`listunspent`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnspentOutput {
	pub txid: String,
	pub vout: u32,
	#[serde(default)]
	pub address: Option<String>,
	/// Wallet label; older nodes report it as `account`
	#[serde(default, alias = "account")]
	pub label: Option<String>,
	pub amount: Decimal,
	#[serde(default)]
	pub confirmations: u64,
	#[serde(default = "default_spendable")]
	pub spendable: bool,
}

fn default_spendable() -> bool {
	true
}

/// Reference to a previous output used as a raw transaction input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInput {
	pub txid: String,
	pub vout: u32,
}

impl From<&UnspentOutput> for RawInput {
	fn from(output: &UnspentOutput) -> Self {
		Self {
			txid: output.txid.clone(),
			vout: output.vout,
		}
	}
}

/// Wallet view of a transaction (`gettransaction`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletTransaction {
	pub txid: String,
	/// Net effect on the wallet, negative for outgoing transactions
	pub amount: Decimal,
	#[serde(default)]
	pub fee: Option<Decimal>,
	/// Negative when the transaction conflicts with the best chain
	#[serde(default)]
	pub confirmations: i64,
	#[serde(default)]
	pub blockhash: Option<String>,
	#[serde(default)]
	pub details: Vec<WalletTransactionDetail>,
}

/// One wallet-relevant output of a transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletTransactionDetail {
	#[serde(default)]
	pub address: Option<String>,
	#[serde(default, alias = "account")]
	pub label: Option<String>,
	/// `send`, `receive`, `generate`, `immature` or `orphan`
	pub category: String,
	pub amount: Decimal,
	#[serde(default)]
	pub vout: Option<u32>,
}

impl WalletTransactionDetail {
	/// Returns true if the detail belongs to the given address or label
	pub fn belongs_to(&self, account: &str) -> bool {
		self.address
			.as_deref()
			.is_some_and(|a| a.eq_ignore_ascii_case(account))
			|| self.label.as_deref() == Some(account)
	}
}

/// Entry of `listtransactions`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListedTransaction {
	pub txid: String,
	#[serde(default)]
	pub address: Option<String>,
	#[serde(default, alias = "account")]
	pub label: Option<String>,
	pub category: String,
	pub amount: Decimal,
	#[serde(default)]
	pub confirmations: i64,
	#[serde(default)]
	pub time: Option<u64>,
}

/// Result of `estimatesmartfee`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmartFeeEstimate {
	/// Fee rate in coin per kvB
	#[serde(default)]
	pub feerate: Option<Decimal>,
	#[serde(default)]
	pub errors: Option<Vec<String>>,
	#[serde(default)]
	pub blocks: Option<u32>,
}

/// Result of `fundrawtransaction`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundedTransaction {
	pub hex: String,
	pub fee: Decimal,
	pub changepos: i64,
}

/// Result of `signrawtransactionwithwallet`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedTransaction {
	pub hex: String,
	pub complete: bool,
}

/// Result of `validateaddress`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressValidation {
	pub isvalid: bool,
	#[serde(default)]
	pub address: Option<String>,
}
