//! Ledger adapters.
//!
//! [`WalletAdapter`] is the closed set of adapters the gateway can mount. Parent adapters
//! own a node client and may expose auxiliary currencies that reuse that client, their
//! managed accounts and their observer loop.

mod eosio;
mod eosio_token;
mod erc20;
mod evm;
mod trc10;
mod trc20;
mod tron;
mod utxo;
mod xrp;

use rust_decimal::Decimal;
use std::sync::Arc;

use crate::{
	models::{
		Asset, Balance, LedgerFamily, LoggedTransaction, NormalizedTransaction, Page,
		GLOBAL_ACCOUNT,
	},
	utils::address::is_trc10_asset_id,
	services::{
		ledger::{categorize_for_account, confirmations, LedgerAdapter, LedgerError},
		observer::{resolve_pending, AccountStore, ChangeSource, TransactionLog},
	},
};

pub use eosio::EosioAdapter;
pub use eosio_token::EosioTokenAdapter;
pub use erc20::Erc20Adapter;
pub use evm::EvmAdapter;
pub use trc10::Trc10Adapter;
pub use trc20::Trc20Adapter;
pub use tron::TronAdapter;
pub use utxo::UtxoAdapter;
pub use xrp::XrpAdapter;

/// Stores and settings shared by a parent adapter and its auxiliary currencies
#[derive(Clone)]
pub struct AdapterContext {
	pub slug: String,
	/// Serve listings from the seen-transaction log
	pub explorer: bool,
	pub log: Arc<dyn TransactionLog>,
	pub accounts: Arc<dyn AccountStore>,
}

impl AdapterContext {
	pub fn new(
		slug: impl Into<String>,
		explorer: bool,
		log: Arc<dyn TransactionLog>,
		accounts: Arc<dyn AccountStore>,
	) -> Self {
		Self {
			slug: slug.into(),
			explorer,
			log,
			accounts,
		}
	}

	fn require_explorer(&self) -> Result<(), LedgerError> {
		if self.explorer {
			Ok(())
		} else {
			Err(LedgerError::unavailable(format!(
				"Transaction listing on {} needs the explorer log",
				self.slug
			)))
		}
	}

	/// Logged history of one asset from the point of view of `account`
	///
	/// Pending entries are settled against the node on the way out.
	pub(crate) async fn logged_transactions(
		&self,
		source: &dyn ChangeSource,
		account: &str,
		asset: &Asset,
		page: Page,
	) -> Result<Vec<NormalizedTransaction>, LedgerError> {
		self.require_explorer()?;
		let current_height = source.current_height().await?;
		let records = self
			.log
			.list_for_account(&self.slug, account, asset, page)
			.await?;
		let records = resolve_pending(&self.slug, source, self.log.as_ref(), records).await;

		Ok(records
			.into_iter()
			.map(|record| from_record(record, account, current_height))
			.collect())
	}

	/// Keeps a broadcast withdrawal in the log until the observer sees it in a block
	pub(crate) async fn record_withdrawal(&self, record: LoggedTransaction) {
		if !self.explorer {
			return;
		}
		if let Err(e) = self.log.upsert(&self.slug, record).await {
			log::warn!("Failed to log withdrawal on {}: {:#}", self.slug, e);
		}
	}
}

/// Normalizes a log record for one account
pub fn from_record(
	record: LoggedTransaction,
	account: &str,
	current_height: u64,
) -> NormalizedTransaction {
	NormalizedTransaction {
		category: categorize_for_account(record.from.as_deref(), record.to.as_deref(), account),
		confirmations: confirmations(current_height, record.block_number),
		id: record.txid,
		amount: record.amount.abs(),
		from: record.from,
		to: record.to,
		extra: record.extra,
	}
}

/// Adds up per-account balances into the wallet-wide figure
pub(crate) fn global_balance(balances: impl IntoIterator<Item = Balance>) -> Balance {
	Balance {
		account: Some(GLOBAL_ACCOUNT.to_string()),
		balance: balances
			.into_iter()
			.fold(Decimal::ZERO, |sum, b| sum + b.balance),
	}
}

#[derive(Clone)]
pub enum WalletAdapter {
	Utxo(Arc<UtxoAdapter>),
	Evm(Arc<EvmAdapter>),
	Erc20(Arc<Erc20Adapter>),
	Xrp(Arc<XrpAdapter>),
	Tron(Arc<TronAdapter>),
	Trc10(Arc<Trc10Adapter>),
	Trc20(Arc<Trc20Adapter>),
	Eosio(Arc<EosioAdapter>),
	EosioToken(Arc<EosioTokenAdapter>),
}

impl WalletAdapter {
	pub fn inner(&self) -> &dyn LedgerAdapter {
		match self {
			Self::Utxo(adapter) => adapter.as_ref(),
			Self::Evm(adapter) => adapter.as_ref(),
			Self::Erc20(adapter) => adapter.as_ref(),
			Self::Xrp(adapter) => adapter.as_ref(),
			Self::Tron(adapter) => adapter.as_ref(),
			Self::Trc10(adapter) => adapter.as_ref(),
			Self::Trc20(adapter) => adapter.as_ref(),
			Self::Eosio(adapter) => adapter.as_ref(),
			Self::EosioToken(adapter) => adapter.as_ref(),
		}
	}

	pub fn route(&self) -> &str {
		self.inner().route()
	}

	pub fn family(&self) -> LedgerFamily {
		match self {
			Self::Utxo(_) => LedgerFamily::Utxo,
			Self::Evm(_)
			| Self::Erc20(_)
			| Self::Xrp(_)
			| Self::Tron(_)
			| Self::Trc10(_)
			| Self::Trc20(_) => LedgerFamily::AccountBalance,
			Self::Eosio(_) | Self::EosioToken(_) => LedgerFamily::ResourceMetered,
		}
	}

	/// The asset observer events are routed on
	pub fn asset(&self) -> Asset {
		match self {
			Self::Utxo(_) | Self::Evm(_) | Self::Xrp(_) | Self::Tron(_) => Asset::Native,
			Self::Erc20(adapter) => adapter.asset(),
			Self::Trc10(adapter) => adapter.asset(),
			Self::Trc20(adapter) => adapter.asset(),
			Self::Eosio(adapter) => adapter.asset(),
			Self::EosioToken(adapter) => adapter.asset(),
		}
	}

	/// Adapters for the currencies configured on top of this one
	pub fn list_auxiliary_currencies(&self) -> Option<Vec<WalletAdapter>> {
		match self {
			Self::Evm(parent) => Some(
				parent
					.tokens()
					.iter()
					.map(|token| Self::Erc20(Arc::new(Erc20Adapter::new(parent.clone(), token.clone()))))
					.collect(),
			),
			Self::Tron(parent) => Some(
				parent
					.tokens()
					.iter()
					.map(|token| {
						if is_trc10_asset_id(&token.contract) {
							Self::Trc10(Arc::new(Trc10Adapter::new(parent.clone(), token.clone())))
						} else {
							Self::Trc20(Arc::new(Trc20Adapter::new(parent.clone(), token.clone())))
						}
					})
					.collect(),
			),
			Self::Eosio(parent) => Some(
				parent
					.tokens()
					.iter()
					.filter_map(|token| {
						EosioTokenAdapter::new(parent.clone(), token.clone())
							.map(|adapter| Self::EosioToken(Arc::new(adapter)))
					})
					.collect(),
			),
			_ => None,
		}
	}

	/// Observer feed of a parent adapter
	pub fn change_source(&self) -> Option<Arc<dyn ChangeSource>> {
		match self {
			Self::Evm(adapter) => Some(adapter.clone() as Arc<dyn ChangeSource>),
			Self::Xrp(adapter) => Some(adapter.clone() as Arc<dyn ChangeSource>),
			Self::Tron(adapter) => Some(adapter.clone() as Arc<dyn ChangeSource>),
			Self::Eosio(adapter) => Some(adapter.clone() as Arc<dyn ChangeSource>),
			_ => None,
		}
	}
}

impl std::fmt::Debug for WalletAdapter {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("WalletAdapter")
			.field("route", &self.route())
			.field("family", &self.family())
			.finish()
	}
}
