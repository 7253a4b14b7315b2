//! Mock implementations of node clients, stores and observer seams.

use alloy::primitives::U256;
use async_trait::async_trait;
use mockall::mock;
use rust_decimal::Decimal;
use serde_json::Value;
use std::{collections::HashSet, sync::Arc};

use wallet_gateway::{
	models::{
		eosio::{EosioAction, EosioActions, EosioCurrencyStats, EosioInfo, EosioPushResult, EosioTransaction},
		evm::{EvmBlock, EvmReceipt, EvmTransaction},
		tron::{
			TronAccount, TronBlock, TronBroadcastResult, TronGeneratedAddress, TronRawTransaction,
			TronTransaction, TronTransactionInfo,
		},
		utxo::{
			AddressValidation, FundedTransaction, ListedTransaction, RawInput, SignedTransaction,
			SmartFeeEstimate, UnspentOutput, WalletTransaction,
		},
		xrp::{XrpAccountTransactions, XrpFee, XrpSubmitResult, XrpTransaction, XrpWallet},
		AccountRecord, Asset, LoggedTransaction, Page,
	},
	services::{
		callback::CallbackDispatcherTrait,
		ledger::{
			AdapterContext, EosioClientTrait, EvmClientTrait, LedgerError, TronClientTrait,
			UtxoClientTrait, XrpClientTrait,
		},
		observer::{
			AccountStore, ChangeSet, ChangeSource, CursorStorage, FileLedgerStorage, TransactionLog,
		},
	},
};

mock! {
	pub UtxoClient {}

	#[async_trait]
	impl UtxoClientTrait for UtxoClient {
		async fn get_block_count(&self) -> Result<u64, LedgerError>;
		async fn list_unspent(&self, min_confirmations: u32) -> Result<Vec<UnspentOutput>, LedgerError>;
		async fn list_labels(&self) -> Result<Vec<String>, LedgerError>;
		async fn get_addresses_by_label(&self, label: &str) -> Result<Vec<String>, LedgerError>;
		async fn get_new_address(&self, label: &str) -> Result<String, LedgerError>;
		async fn validate_address(&self, address: &str) -> Result<AddressValidation, LedgerError>;
		async fn get_transaction(&self, txid: &str) -> Result<WalletTransaction, LedgerError>;
		async fn get_raw_transaction(&self, txid: &str) -> Result<Value, LedgerError>;
		async fn list_transactions(
			&self,
			label: &str,
			count: usize,
			skip: usize,
		) -> Result<Vec<ListedTransaction>, LedgerError>;
		async fn estimate_smart_fee(&self, target: u16) -> Result<SmartFeeEstimate, LedgerError>;
		async fn create_raw_transaction(
			&self,
			inputs: Vec<RawInput>,
			outputs: Vec<(String, Decimal)>,
		) -> Result<String, LedgerError>;
		async fn fund_raw_transaction(
			&self,
			hex: &str,
			options: Value,
		) -> Result<FundedTransaction, LedgerError>;
		async fn sign_raw_transaction_with_wallet(
			&self,
			hex: &str,
		) -> Result<SignedTransaction, LedgerError>;
		async fn send_raw_transaction(&self, hex: &str) -> Result<String, LedgerError>;
	}
}

mock! {
	pub EvmClient {}

	#[async_trait]
	impl EvmClientTrait for EvmClient {
		async fn block_number(&self) -> Result<u64, LedgerError>;
		async fn syncing(&self) -> Result<bool, LedgerError>;
		async fn accounts(&self) -> Result<Vec<String>, LedgerError>;
		async fn get_balance(&self, address: &str) -> Result<U256, LedgerError>;
		async fn get_transaction(&self, hash: &str) -> Result<EvmTransaction, LedgerError>;
		async fn get_raw_transaction(&self, hash: &str) -> Result<Value, LedgerError>;
		async fn get_receipt(&self, hash: &str) -> Result<Option<EvmReceipt>, LedgerError>;
		async fn get_block(&self, number: u64) -> Result<EvmBlock, LedgerError>;
		async fn call(&self, to: &str, data: &str) -> Result<String, LedgerError>;
		async fn new_account(&self, password: &str) -> Result<String, LedgerError>;
		async fn unlock_account(
			&self,
			address: &str,
			password: &str,
			seconds: u64,
		) -> Result<bool, LedgerError>;
		async fn send_transaction(&self, transaction: Value) -> Result<String, LedgerError>;
	}
}

mock! {
	pub XrpClient {}

	#[async_trait]
	impl XrpClientTrait for XrpClient {
		async fn closed_ledger_index(&self) -> Result<u64, LedgerError>;
		async fn account_balance(&self, account: &str) -> Result<u64, LedgerError>;
		async fn transaction(&self, hash: &str) -> Result<XrpTransaction, LedgerError>;
		async fn raw_transaction(&self, hash: &str) -> Result<Value, LedgerError>;
		async fn account_transactions(
			&self,
			account: &str,
			ledger_min: i64,
			ledger_max: i64,
			limit: u32,
			marker: Option<Value>,
		) -> Result<XrpAccountTransactions, LedgerError>;
		async fn fee(&self) -> Result<XrpFee, LedgerError>;
		async fn load_factor(&self) -> Result<Decimal, LedgerError>;
		async fn wallet_propose(&self) -> Result<XrpWallet, LedgerError>;
		async fn submit(&self, tx_json: Value, secret: &str) -> Result<XrpSubmitResult, LedgerError>;
	}
}

mock! {
	pub TronClient {}

	#[async_trait]
	impl TronClientTrait for TronClient {
		async fn now_block(&self) -> Result<TronBlock, LedgerError>;
		async fn block_by_num(&self, number: u64) -> Result<TronBlock, LedgerError>;
		async fn transaction_by_id(&self, txid: &str) -> Result<TronTransaction, LedgerError>;
		async fn raw_transaction(&self, txid: &str) -> Result<Value, LedgerError>;
		async fn transaction_info(&self, txid: &str) -> Result<TronTransactionInfo, LedgerError>;
		async fn account(&self, address: &str) -> Result<TronAccount, LedgerError>;
		async fn asset_precision(&self, asset_id: &str) -> Result<u32, LedgerError>;
		async fn generate_address(&self) -> Result<TronGeneratedAddress, LedgerError>;
		async fn validate_address(&self, address: &str) -> Result<bool, LedgerError>;
		async fn create_transaction(
			&self,
			owner: &str,
			to: &str,
			amount: u64,
		) -> Result<TronRawTransaction, LedgerError>;
		async fn transfer_asset(
			&self,
			owner: &str,
			to: &str,
			asset_id: &str,
			amount: u64,
		) -> Result<TronRawTransaction, LedgerError>;
		async fn call_constant(
			&self,
			owner: &str,
			contract: &str,
			selector: &str,
			parameter: &str,
		) -> Result<String, LedgerError>;
		async fn trigger_contract(
			&self,
			owner: &str,
			contract: &str,
			selector: &str,
			parameter: &str,
			fee_limit: u64,
		) -> Result<TronRawTransaction, LedgerError>;
		async fn sign_transaction(
			&self,
			transaction: TronRawTransaction,
			private_key: &str,
		) -> Result<TronRawTransaction, LedgerError>;
		async fn broadcast(
			&self,
			transaction: TronRawTransaction,
		) -> Result<TronBroadcastResult, LedgerError>;
	}
}

mock! {
	pub EosioClient {}

	#[async_trait]
	impl EosioClientTrait for EosioClient {
		async fn info(&self) -> Result<EosioInfo, LedgerError>;
		async fn currency_balance(
			&self,
			contract: &str,
			account: &str,
			symbol: &str,
		) -> Result<Vec<String>, LedgerError>;
		async fn currency_stats(
			&self,
			contract: &str,
			symbol: &str,
		) -> Result<EosioCurrencyStats, LedgerError>;
		async fn account(&self, name: &str) -> Result<Value, LedgerError>;
		async fn transaction(&self, id: &str) -> Result<EosioTransaction, LedgerError>;
		async fn raw_transaction(&self, id: &str) -> Result<Value, LedgerError>;
		async fn actions(&self, account: &str, pos: i64, offset: i64) -> Result<EosioActions, LedgerError>;
		async fn push_actions(
			&self,
			actions: Vec<EosioAction>,
			signing_keys: Vec<String>,
			expire_seconds: u64,
		) -> Result<EosioPushResult, LedgerError>;
		async fn public_keys(&self) -> Result<Vec<String>, LedgerError>;
		async fn create_key(&self, wallet_name: &str) -> Result<String, LedgerError>;
	}
}

mock! {
	pub ChangeSource {}

	#[async_trait]
	impl ChangeSource for ChangeSource {
		async fn current_height(&self) -> Result<u64, LedgerError>;
		async fn managed_accounts(&self) -> Result<HashSet<String>, LedgerError>;
		async fn scan(
			&self,
			from_exclusive: u64,
			to_inclusive: u64,
			accounts: &HashSet<String>,
		) -> Result<ChangeSet, LedgerError>;
		async fn transaction_height(&self, txid: &str) -> Result<Option<u64>, LedgerError>;
	}
}

mock! {
	pub Dispatcher {}

	impl CallbackDispatcherTrait for Dispatcher {
		fn dispatch(&self, route: &str, txid: &str);
	}
}

mock! {
	pub CursorStorage {}

	#[async_trait]
	impl CursorStorage for CursorStorage {
		async fn get_last_observed_height(&self, slug: &str) -> Result<Option<u64>, anyhow::Error>;
		async fn save_last_observed_height(&self, slug: &str, height: u64) -> Result<(), anyhow::Error>;
	}
}

mock! {
	pub TransactionLog {}

	#[async_trait]
	impl TransactionLog for TransactionLog {
		async fn replace_block(
			&self,
			slug: &str,
			height: u64,
			transactions: Vec<LoggedTransaction>,
		) -> Result<(), anyhow::Error>;
		async fn upsert(&self, slug: &str, transaction: LoggedTransaction) -> Result<(), anyhow::Error>;
		async fn get(&self, slug: &str, txid: &str) -> Result<Option<LoggedTransaction>, anyhow::Error>;
		async fn list_for_account(
			&self,
			slug: &str,
			account: &str,
			asset: &Asset,
			page: Page,
		) -> Result<Vec<LoggedTransaction>, anyhow::Error>;
		async fn pending(&self, slug: &str) -> Result<Vec<LoggedTransaction>, anyhow::Error>;
		async fn set_block_number(&self, slug: &str, txid: &str, height: u64) -> Result<(), anyhow::Error>;
		async fn remove(&self, slug: &str, txid: &str) -> Result<(), anyhow::Error>;
	}
}

mock! {
	pub AccountStore {}

	#[async_trait]
	impl AccountStore for AccountStore {
		async fn save_account(&self, slug: &str, record: AccountRecord) -> Result<(), anyhow::Error>;
		async fn list_accounts(&self, slug: &str) -> Result<Vec<AccountRecord>, anyhow::Error>;
		async fn get_account(&self, slug: &str, address: &str) -> Result<Option<AccountRecord>, anyhow::Error>;
	}
}

/// File storage in a temporary directory, kept alive by the returned guard
pub fn temp_storage() -> (tempfile::TempDir, Arc<FileLedgerStorage>) {
	let dir = tempfile::tempdir().unwrap();
	let storage = Arc::new(FileLedgerStorage::with_path(dir.path()));
	(dir, storage)
}

/// Adapter context backed by one file storage
pub fn context(slug: &str, explorer: bool, storage: &Arc<FileLedgerStorage>) -> AdapterContext {
	AdapterContext::new(slug, explorer, storage.clone(), storage.clone())
}
