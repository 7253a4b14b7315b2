//! Domain models and data structures for the wallet gateway.
//!
//! This module contains all the core data structures used throughout the application:
//!
//! - `blockchain`: Native payloads of each supported ledger
//! - `config`: Configuration loading and validation
//! - `core`: Core domain models (Ledger, NormalizedTransaction, WithdrawalRequest)

mod blockchain;
mod config;
mod core;

// Re-export blockchain types
pub use blockchain::{eosio, evm, tron, utxo, xrp, LedgerFamily, LedgerType};

// Re-export core types
pub use core::{
	AccountRecord, AddressCheck, Asset, Balance, CallbackConfig, EosioAccountResources,
	EosioSettings, EvmSettings, GenerateAccountParams, GeneratedAccount, Ledger, LedgerSettings,
	LoggedTransaction, NormalizedTransaction, ObserverConfig, Page, Priority, PriorityTable,
	RpcCredentials, RpcUrl, TokenConfig, TransactionCategory, TronSettings, UtxoSettings,
	WithdrawOptions, WithdrawalReceipt, WithdrawalRequest, XrpSettings,
	DEFAULT_DEPOSITS_PAGE_SIZE, DEFAULT_TRANSACTIONS_PAGE_SIZE, GLOBAL_ACCOUNT,
};

// Re-export config types
pub use config::{validate_unique_routes, ConfigError, ConfigLoader};
