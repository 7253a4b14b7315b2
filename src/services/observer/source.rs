//! What the observer needs from a ledger.

use async_trait::async_trait;
use std::collections::HashSet;

use crate::{models::LoggedTransaction, services::ledger::LedgerError};

/// Transactions of one block that touch a managed account
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedBlock {
	pub height: u64,
	pub transactions: Vec<LoggedTransaction>,
}

/// Changes found between two heights
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeSet {
	/// Block-model ledgers: every block of the range, ascending, including empty ones
	Blocks(Vec<ObservedBlock>),
	/// Account-history ledgers: transactions of the managed accounts in the range
	Accounts(Vec<LoggedTransaction>),
}

#[async_trait]
pub trait ChangeSource: Send + Sync {
	/// Latest height the ledger considers final enough to scan
	async fn current_height(&self) -> Result<u64, LedgerError>;

	/// Lower-cased addresses owned by the wallet
	async fn managed_accounts(&self) -> Result<HashSet<String>, LedgerError>;

	/// Changes in `(from_exclusive, to_inclusive]` touching `accounts`
	async fn scan(
		&self,
		from_exclusive: u64,
		to_inclusive: u64,
		accounts: &HashSet<String>,
	) -> Result<ChangeSet, LedgerError>;

	/// Height a transaction was included at, None while it is still pending
	///
	/// Fails with `NotFound` once the node has forgotten the transaction.
	async fn transaction_height(&self, txid: &str) -> Result<Option<u64>, LedgerError>;
}
