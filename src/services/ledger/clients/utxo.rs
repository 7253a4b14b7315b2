//! Bitcoin Core style wallet RPC client.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::{json, Map, Value};

use crate::{
	models::utxo::{
		AddressValidation, FundedTransaction, ListedTransaction, RawInput, SignedTransaction,
		SmartFeeEstimate, UnspentOutput, WalletTransaction,
	},
	services::ledger::{
		clients::from_value,
		transports::{LedgerTransport, TransportError},
		LedgerError,
	},
};

/// bitcoind RPC_INVALID_ADDRESS_OR_KEY, also used for unknown wallet transactions
const RPC_INVALID_ADDRESS_OR_KEY: i64 = -5;
const RPC_WALLET_INSUFFICIENT_FUNDS: i64 = -6;
const RPC_WALLET_INVALID_LABEL_NAME: i64 = -11;
const RPC_WALLET_UNLOCK_NEEDED: i64 = -13;
const RPC_WALLET_PASSPHRASE_INCORRECT: i64 = -14;
const RPC_IN_WARMUP: i64 = -28;

fn map_rpc_error(err: TransportError) -> LedgerError {
	match err {
		TransportError::Rpc { code, message } => match code {
			RPC_INVALID_ADDRESS_OR_KEY | RPC_WALLET_INVALID_LABEL_NAME => {
				LedgerError::not_found(message)
			}
			RPC_WALLET_INSUFFICIENT_FUNDS => LedgerError::insufficient_funds(message),
			RPC_WALLET_UNLOCK_NEEDED | RPC_WALLET_PASSPHRASE_INCORRECT => {
				LedgerError::unauthorized(message)
			}
			RPC_IN_WARMUP => LedgerError::unavailable(message),
			_ => TransportError::Rpc { code, message }.into(),
		},
		other => other.into(),
	}
}

#[async_trait]
pub trait UtxoClientTrait: Send + Sync {
	async fn get_block_count(&self) -> Result<u64, LedgerError>;

	async fn list_unspent(&self, min_confirmations: u32)
		-> Result<Vec<UnspentOutput>, LedgerError>;

	async fn list_labels(&self) -> Result<Vec<String>, LedgerError>;

	/// Addresses of a label, empty when the label is unknown
	async fn get_addresses_by_label(&self, label: &str) -> Result<Vec<String>, LedgerError>;

	async fn get_new_address(&self, label: &str) -> Result<String, LedgerError>;

	async fn validate_address(&self, address: &str) -> Result<AddressValidation, LedgerError>;

	async fn get_transaction(&self, txid: &str) -> Result<WalletTransaction, LedgerError>;

	async fn get_raw_transaction(&self, txid: &str) -> Result<Value, LedgerError>;

	/// Wallet transactions of a label, oldest first as the node returns them
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

/// Client for a Bitcoin Core compatible node wallet
#[derive(Clone, Debug)]
pub struct UtxoClient<T: LedgerTransport> {
	transport: T,
}

impl<T: LedgerTransport> UtxoClient<T> {
	pub fn new(transport: T) -> Self {
		Self { transport }
	}

	async fn call(&self, method: &str, params: Value) -> Result<Value, LedgerError> {
		self.transport
			.send_raw_request(method, Some(params))
			.await
			.map_err(map_rpc_error)
	}
}

#[async_trait]
impl<T: LedgerTransport> UtxoClientTrait for UtxoClient<T> {
	async fn get_block_count(&self) -> Result<u64, LedgerError> {
		from_value(self.call("getblockcount", json!([])).await?)
	}

	async fn list_unspent(
		&self,
		min_confirmations: u32,
	) -> Result<Vec<UnspentOutput>, LedgerError> {
		from_value(
			self.call("listunspent", json!([min_confirmations, 9_999_999]))
				.await?,
		)
	}

	async fn list_labels(&self) -> Result<Vec<String>, LedgerError> {
		from_value(self.call("listlabels", json!([])).await?)
	}

	async fn get_addresses_by_label(&self, label: &str) -> Result<Vec<String>, LedgerError> {
		match self.call("getaddressesbylabel", json!([label])).await {
			Ok(Value::Object(addresses)) => Ok(addresses.keys().cloned().collect()),
			Ok(other) => Err(LedgerError::internal(format!(
				"Unexpected getaddressesbylabel result: {}",
				other
			))),
			Err(LedgerError::NotFound(_)) => Ok(Vec::new()),
			Err(e) => Err(e),
		}
	}

	async fn get_new_address(&self, label: &str) -> Result<String, LedgerError> {
		from_value(self.call("getnewaddress", json!([label])).await?)
	}

	async fn validate_address(&self, address: &str) -> Result<AddressValidation, LedgerError> {
		from_value(self.call("validateaddress", json!([address])).await?)
	}

	async fn get_transaction(&self, txid: &str) -> Result<WalletTransaction, LedgerError> {
		from_value(self.call("gettransaction", json!([txid])).await?)
	}

	async fn get_raw_transaction(&self, txid: &str) -> Result<Value, LedgerError> {
		self.call("getrawtransaction", json!([txid, true])).await
	}

	async fn list_transactions(
		&self,
		label: &str,
		count: usize,
		skip: usize,
	) -> Result<Vec<ListedTransaction>, LedgerError> {
		from_value(
			self.call("listtransactions", json!([label, count, skip, true]))
				.await?,
		)
	}

	async fn estimate_smart_fee(&self, target: u16) -> Result<SmartFeeEstimate, LedgerError> {
		from_value(self.call("estimatesmartfee", json!([target])).await?)
	}

	async fn create_raw_transaction(
		&self,
		inputs: Vec<RawInput>,
		outputs: Vec<(String, Decimal)>,
	) -> Result<String, LedgerError> {
		let outputs: Map<String, Value> = outputs
			.into_iter()
			.map(|(address, amount)| (address, json!(amount)))
			.collect();
		from_value(
			self.call("createrawtransaction", json!([inputs, outputs]))
				.await?,
		)
	}

	async fn fund_raw_transaction(
		&self,
		hex: &str,
		options: Value,
	) -> Result<FundedTransaction, LedgerError> {
		from_value(self.call("fundrawtransaction", json!([hex, options])).await?)
	}

	async fn sign_raw_transaction_with_wallet(
		&self,
		hex: &str,
	) -> Result<SignedTransaction, LedgerError> {
		from_value(
			self.call("signrawtransactionwithwallet", json!([hex]))
				.await?,
		)
	}

	async fn send_raw_transaction(&self, hex: &str) -> Result<String, LedgerError> {
		from_value(self.call("sendrawtransaction", json!([hex])).await?)
	}
}
