//! Ledger adapters and the plumbing beneath them.
//!
//! - `adapter`: the contract every currency implements and its categorization rules
//! - `adapters`: one adapter per chain family plus mounted tokens
//! - `clients`: typed node clients
//! - `transports`: rotating HTTP transports
//! - `registry`: route lookup over mounted adapters

mod adapter;
mod adapters;
mod clients;
mod error;
mod factory;
mod registry;
mod transports;

pub use adapter::{
	categorize_for_account, categorize_for_managed_set, confirmations, managed_set, Capabilities,
	LedgerAdapter,
};
pub use adapters::{
	from_record, AdapterContext, EosioAdapter, EosioTokenAdapter, Erc20Adapter, EvmAdapter,
	Trc10Adapter, Trc20Adapter, TronAdapter, UtxoAdapter, WalletAdapter, XrpAdapter,
};
pub use clients::{
	decode_transfer, decode_trc20_transfer, encode_balance_of, encode_decimals, encode_transfer,
	parse_word, trc20_balance_of_parameter, trc20_transfer_parameter, EosioClient,
	EosioClientTrait, EvmClient, EvmClientTrait, TronClient, TronClientTrait, UtxoClient,
	UtxoClientTrait, XrpClient, XrpClientTrait, TRC20_BALANCE_OF, TRC20_DECIMALS, TRC20_TRANSFER,
};
pub use error::LedgerError;
pub use factory::create_wallet_adapter;
pub use registry::AdapterRegistry;
pub use transports::{
	error_from_body, EndpointManager, HttpTransportClient, LedgerTransport, RestTransportClient,
	RotatingTransport, RpcDialect, TransportError,
};
