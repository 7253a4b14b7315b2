//! Typed ledger node clients.
//!
//! Each chain gets a client trait describing the node calls its adapter needs, and one
//! implementation generic over a [`LedgerTransport`](crate::services::ledger::transports::LedgerTransport).
//! Node error codes are translated into [`LedgerError`] variants here.

mod eosio;
mod evm;
mod tron;
mod utxo;
mod xrp;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::services::ledger::LedgerError;

pub use eosio::{EosioClient, EosioClientTrait};
pub use evm::{
	decode_transfer, encode_balance_of, encode_decimals, encode_transfer, EvmClient, EvmClientTrait,
};
pub use tron::{
	decode_trc20_transfer, parse_word, trc20_balance_of_parameter, trc20_transfer_parameter,
	TronClient, TronClientTrait, TRC20_BALANCE_OF, TRC20_DECIMALS, TRC20_TRANSFER,
};
pub use utxo::{UtxoClient, UtxoClientTrait};
pub use xrp::{XrpClient, XrpClientTrait};

/// Deserializes a node result into a typed payload
pub(crate) fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, LedgerError> {
	serde_json::from_value(value)
		.map_err(|e| LedgerError::internal(format!("Unexpected response shape: {}", e)))
}
