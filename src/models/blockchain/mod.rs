//! Ledger-specific model implementations.
//!
//! This module contains the native payload types returned by each supported ledger
//! node. Adapters translate these into the normalized wallet models in `core`.

use serde::{Deserialize, Serialize};

pub mod eosio;
pub mod evm;
pub mod tron;
pub mod utxo;
pub mod xrp;

/// Supported ledger types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LedgerType {
	/// Bitcoin Core style wallets (BTC, LTC, BCH, ...)
	Utxo,
	/// Ethereum Virtual Machine based chains
	Evm,
	/// XRP ledger
	Xrp,
	/// TRON
	Tron,
	/// EOSIO based chains
	Eosio,
}

/// Transaction model family a ledger belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LedgerFamily {
	/// Spendable outputs consumed as inputs
	Utxo,
	/// Per-account balances moved by single value-transfer calls
	AccountBalance,
	/// Account balances with contract-metered resources (CPU, NET, RAM)
	ResourceMetered,
}

impl LedgerType {
	/// Returns the transaction model family of the ledger
	pub fn family(&self) -> LedgerFamily {
		match self {
			Self::Utxo => LedgerFamily::Utxo,
			Self::Evm | Self::Xrp | Self::Tron => LedgerFamily::AccountBalance,
			Self::Eosio => LedgerFamily::ResourceMetered,
		}
	}
}

impl std::fmt::Display for LedgerType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let name = match self {
			Self::Utxo => "utxo",
			Self::Evm => "evm",
			Self::Xrp => "xrp",
			Self::Tron => "tron",
			Self::Eosio => "eosio",
		};
		write!(f, "{}", name)
	}
}
