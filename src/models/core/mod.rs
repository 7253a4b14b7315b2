//! Core domain models for the wallet gateway.
//!
//! This module contains the fundamental data structures that represent:
//! - Ledgers: chain definitions, connection details and observer settings
//! - Transactions: the normalized view returned by every adapter
//! - Withdrawals: requests, options and receipts

mod ledger;
mod transaction;
mod withdrawal;

pub use ledger::{
	CallbackConfig, EosioAccountResources, EosioSettings, EvmSettings, Ledger, LedgerSettings,
	ObserverConfig, RpcCredentials, RpcUrl, TokenConfig, TronSettings, UtxoSettings, XrpSettings,
};
pub use transaction::{
	AccountRecord, AddressCheck, Asset, Balance, GenerateAccountParams, GeneratedAccount,
	LoggedTransaction, NormalizedTransaction, Page, TransactionCategory,
	DEFAULT_DEPOSITS_PAGE_SIZE, DEFAULT_TRANSACTIONS_PAGE_SIZE, GLOBAL_ACCOUNT,
};
pub use withdrawal::{Priority, PriorityTable, WithdrawOptions, WithdrawalReceipt, WithdrawalRequest};
