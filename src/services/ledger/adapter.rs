//! The ledger adapter contract.
//!
//! Every supported chain, and every auxiliary currency mounted on one, implements
//! [`LedgerAdapter`]. Transaction categories are always resolved from one point of view:
//! a single queried account, or the adapter's own managed account set.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

use crate::{
	models::{
		AddressCheck, Balance, GenerateAccountParams, GeneratedAccount, NormalizedTransaction,
		Page, TransactionCategory, WithdrawalReceipt, WithdrawalRequest,
	},
	services::ledger::LedgerError,
};

/// Optional behaviour a ledger supports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
	/// Withdrawals accept a destination tag or memo
	pub destination_tags: bool,
	/// The fee can be taken out of the transferred amount
	pub sub_fee: bool,
	/// Listings are served from the local transaction log
	pub explorer: bool,
	/// Generating an account twice with the same name yields the same address
	pub idempotent_accounts: bool,
}

fn same_account(party: Option<&str>, account: &str) -> bool {
	party.is_some_and(|p| p.eq_ignore_ascii_case(account))
}

/// Category of a transfer from the point of view of one account
///
/// Both endpoints matching is `OTHER`, never `SEND` plus `RECEIVE`.
pub fn categorize_for_account(
	from: Option<&str>,
	to: Option<&str>,
	account: &str,
) -> TransactionCategory {
	match (same_account(from, account), same_account(to, account)) {
		(true, true) => TransactionCategory::Other,
		(true, false) => TransactionCategory::Send,
		(false, true) => TransactionCategory::Receive,
		(false, false) => TransactionCategory::Other,
	}
}

/// Category of a transfer from the point of view of a managed account set
///
/// The set is expected to hold lower-cased addresses.
pub fn categorize_for_managed_set(
	from: Option<&str>,
	to: Option<&str>,
	managed: &HashSet<String>,
) -> TransactionCategory {
	let is_managed = |party: Option<&str>| party.is_some_and(|p| managed.contains(&p.to_lowercase()));
	match (is_managed(from), is_managed(to)) {
		(true, true) => TransactionCategory::Other,
		(true, false) => TransactionCategory::Send,
		(false, true) => TransactionCategory::Receive,
		(false, false) => TransactionCategory::Other,
	}
}

/// Confirmations of a transaction included at `height`, None while pending
pub fn confirmations(current_height: u64, height: Option<u64>) -> Option<u64> {
	height.map(|h| current_height.saturating_sub(h))
}

/// Lower-cases a list of addresses into a lookup set
pub fn managed_set<I, S>(accounts: I) -> HashSet<String>
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	accounts
		.into_iter()
		.map(|a| a.as_ref().to_lowercase())
		.collect()
}

#[async_trait]
pub trait LedgerAdapter: Send + Sync {
	/// Currency code this adapter is mounted under
	fn route(&self) -> &str;

	fn capabilities(&self) -> Capabilities;

	/// Runs once at startup
	async fn on_init(&self) -> Result<(), LedgerError> {
		Ok(())
	}

	/// Runs once at shutdown
	async fn on_destroy(&self) -> Result<(), LedgerError> {
		Ok(())
	}

	async fn list_accounts(&self) -> Result<Vec<String>, LedgerError>;

	async fn get_account_balance(&self, account: &str) -> Result<Balance, LedgerError>;

	async fn get_global_balance(&self) -> Result<Balance, LedgerError>;

	/// Transactions of an account, most recent first
	async fn list_account_transactions(
		&self,
		account: &str,
		page: Page,
	) -> Result<Vec<NormalizedTransaction>, LedgerError>;

	/// Incoming transactions of an account, most recent first
	async fn list_account_deposits(
		&self,
		account: &str,
		page: Page,
	) -> Result<Vec<NormalizedTransaction>, LedgerError> {
		let wanted = page.offset() + page.limit();
		let mut deposits = Vec::new();
		let mut batch_number = 1;

		loop {
			let batch = self
				.list_account_transactions(account, Page::new(batch_number, page.page_size))
				.await?;
			let exhausted = batch.len() < page.limit();
			deposits.extend(
				batch
					.into_iter()
					.filter(|tx| tx.category == TransactionCategory::Receive),
			);
			if exhausted || deposits.len() >= wanted {
				break;
			}
			batch_number += 1;
		}

		Ok(page.slice(deposits))
	}

	/// A transaction categorized from the perspective of `account`
	async fn get_account_transaction(
		&self,
		account: &str,
		txid: &str,
	) -> Result<NormalizedTransaction, LedgerError>;

	/// A transaction categorized against the managed account set
	async fn get_transaction(&self, txid: &str) -> Result<NormalizedTransaction, LedgerError>;

	/// The transaction exactly as the node returns it
	async fn get_native_transaction(&self, txid: &str) -> Result<Value, LedgerError>;

	async fn generate_account(
		&self,
		params: GenerateAccountParams,
	) -> Result<GeneratedAccount, LedgerError>;

	async fn is_address(&self, value: &str) -> Result<AddressCheck, LedgerError>;

	async fn perform_withdraw(
		&self,
		request: WithdrawalRequest,
	) -> Result<WithdrawalReceipt, LedgerError>;
}
