//! Normalized wallet types shared by every ledger adapter.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Direction of a transaction relative to one observer account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionCategory {
	Send,
	Receive,
	Other,
}

/// Ledger-independent representation of a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedTransaction {
	pub id: String,
	/// Always non-negative, in the display unit of the currency
	pub amount: Decimal,
	/// None while the transaction is pending
	pub confirmations: Option<u64>,
	pub category: TransactionCategory,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub from: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub to: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub extra: Option<Value>,
}

/// Balance of one account, or of the whole wallet when `account` is `<ALL>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
	pub account: Option<String>,
	pub balance: Decimal,
}

/// Account label used for wallet-wide balances
pub const GLOBAL_ACCOUNT: &str = "<ALL>";

/// Parameters accepted by account generation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateAccountParams {
	/// Logical account name (UTXO label, EOSIO account name)
	#[serde(default)]
	pub name: Option<String>,
	/// Password protecting a node-managed key (EVM)
	#[serde(default)]
	pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedAccount {
	pub address: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub extra: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressCheck {
	pub address: String,
	pub valid: bool,
}

/// One-based page selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
	pub page: u32,
	pub page_size: u32,
}

pub const DEFAULT_TRANSACTIONS_PAGE_SIZE: u32 = 20;
pub const DEFAULT_DEPOSITS_PAGE_SIZE: u32 = 100;

impl Page {
	pub fn new(page: u32, page_size: u32) -> Self {
		Self {
			page: page.max(1),
			page_size: page_size.max(1),
		}
	}

	pub fn transactions(page: Option<u32>, page_size: Option<u32>) -> Self {
		Self::new(
			page.unwrap_or(1),
			page_size.unwrap_or(DEFAULT_TRANSACTIONS_PAGE_SIZE),
		)
	}

	pub fn deposits(page: Option<u32>, page_size: Option<u32>) -> Self {
		Self::new(
			page.unwrap_or(1),
			page_size.unwrap_or(DEFAULT_DEPOSITS_PAGE_SIZE),
		)
	}

	pub fn offset(&self) -> usize {
		(self.page.saturating_sub(1) as usize) * self.page_size as usize
	}

	pub fn limit(&self) -> usize {
		self.page_size as usize
	}

	/// Cuts the page out of an already ordered list
	pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
		items
			.into_iter()
			.skip(self.offset())
			.take(self.limit())
			.collect()
	}
}

impl Default for Page {
	fn default() -> Self {
		Self::transactions(None, None)
	}
}

/// What moved in a logged transaction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Asset {
	/// The chain's own currency
	Native,
	/// Smart-contract token: ERC20 address lower-cased, TRC20 address in base58
	Contract(String),
	/// TRC10 asset id
	Token(String),
	/// EOSIO token contract and symbol
	Currency { contract: String, symbol: String },
}

impl Asset {
	/// Builds an ERC20 contract asset with a normalized address
	pub fn contract(address: &str) -> Self {
		Self::Contract(address.to_lowercase())
	}
}

/// Seen-transaction log record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedTransaction {
	pub txid: String,
	/// None while unconfirmed
	pub block_number: Option<u64>,
	pub from: Option<String>,
	pub to: Option<String>,
	pub amount: Decimal,
	pub asset: Asset,
	#[serde(default)]
	pub extra: Option<Value>,
	#[serde(default = "Utc::now")]
	pub observed_at: DateTime<Utc>,
	/// Set once an observer cycle has logged the record and considered it for a callback
	#[serde(default)]
	pub observed: bool,
}

impl LoggedTransaction {
	/// True when either endpoint belongs to the lower-cased account set
	pub fn touches(&self, accounts: &HashSet<String>) -> bool {
		let matches = |party: &Option<String>| {
			party
				.as_ref()
				.is_some_and(|p| accounts.contains(&p.to_lowercase()))
		};
		matches(&self.from) || matches(&self.to)
	}

	/// True when the given account is one of the endpoints
	pub fn involves(&self, account: &str) -> bool {
		let matches = |party: &Option<String>| {
			party
				.as_deref()
				.is_some_and(|p| p.eq_ignore_ascii_case(account))
		};
		matches(&self.from) || matches(&self.to)
	}
}

/// Generated keypair or address kept in the durable store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
	pub address: String,
	#[serde(default)]
	pub secret: Option<String>,
	#[serde(default)]
	pub label: Option<String>,
	#[serde(default = "Utc::now")]
	pub created_at: DateTime<Utc>,
}
