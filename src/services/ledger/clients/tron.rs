//! TRON full node HTTP API client.

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::str::FromStr;

use crate::{
	models::{
		evm::parse_hex_u256,
		tron::{
			TronAccount, TronBlock, TronBroadcastResult, TronGeneratedAddress, TronRawTransaction,
			TronTransaction, TronTransactionInfo, TronTriggerResult,
		},
	},
	services::ledger::{
		clients::{decode_transfer, encode_balance_of, encode_transfer, from_value},
		transports::LedgerTransport,
		LedgerError,
	},
	utils::address::{tron_address_from_evm, tron_address_to_evm},
};

pub const TRC20_BALANCE_OF: &str = "balanceOf(address)";
pub const TRC20_DECIMALS: &str = "decimals()";
pub const TRC20_TRANSFER: &str = "transfer(address,uint256)";

fn evm_address(value: &str) -> Result<Address, LedgerError> {
	tron_address_to_evm(value)
		.ok_or_else(|| LedgerError::invalid_request(format!("Invalid TRON address: {}", value)))
}

/// ABI arguments of calldata, without the 4-byte selector
fn call_parameter(calldata: &str) -> String {
	calldata
		.trim_start_matches("0x")
		.get(8..)
		.unwrap_or_default()
		.to_string()
}

/// Parameter of `balanceOf(owner)`
pub fn trc20_balance_of_parameter(owner: &str) -> Result<String, LedgerError> {
	let owner = evm_address(owner)?;
	Ok(call_parameter(&encode_balance_of(&owner.to_string())?))
}

/// Parameter of `transfer(to, amount)`
pub fn trc20_transfer_parameter(to: &str, amount: U256) -> Result<String, LedgerError> {
	let to = evm_address(to)?;
	Ok(call_parameter(&encode_transfer(&to.to_string(), amount)?))
}

/// Base58 recipient and raw amount of TRC20 `transfer` calldata
pub fn decode_trc20_transfer(data: &str) -> Option<(String, U256)> {
	let (to, amount) = decode_transfer(data)?;
	let to = Address::from_str(&to).ok()?;
	Some((tron_address_from_evm(&to), amount))
}

/// Integer held in a constant call's return word
pub fn parse_word(word: &str) -> Result<U256, LedgerError> {
	parse_hex_u256(word)
		.ok_or_else(|| LedgerError::internal(format!("Unexpected contract result: {}", word)))
}

/// Fails when the node answered with an `Error` field
fn check_error(value: Value) -> Result<Value, LedgerError> {
	match value.get("Error").and_then(|e| e.as_str()) {
		Some(message) => Err(LedgerError::invalid_request(message.to_string())),
		None => Ok(value),
	}
}

fn is_empty(value: &Value) -> bool {
	value.as_object().is_none_or(|o| o.is_empty())
}

#[async_trait]
pub trait TronClientTrait: Send + Sync {
	async fn now_block(&self) -> Result<TronBlock, LedgerError>;

	async fn block_by_num(&self, number: u64) -> Result<TronBlock, LedgerError>;

	async fn transaction_by_id(&self, txid: &str) -> Result<TronTransaction, LedgerError>;

	async fn raw_transaction(&self, txid: &str) -> Result<Value, LedgerError>;

	async fn transaction_info(&self, txid: &str) -> Result<TronTransactionInfo, LedgerError>;

	/// Account state, empty for addresses that were never activated
	async fn account(&self, address: &str) -> Result<TronAccount, LedgerError>;

	/// Decimal places of a TRC10 asset
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

	/// Runs a read-only contract call and returns its first result word
	async fn call_constant(
		&self,
		owner: &str,
		contract: &str,
		selector: &str,
		parameter: &str,
	) -> Result<String, LedgerError>;

	/// Builds an unsigned `TriggerSmartContract` transaction
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

#[derive(Clone, Debug)]
pub struct TronClient<T: LedgerTransport> {
	transport: T,
}

impl<T: LedgerTransport> TronClient<T> {
	pub fn new(transport: T) -> Self {
		Self { transport }
	}

	async fn post(&self, path: &str, body: Value) -> Result<Value, LedgerError> {
		let value = self.transport.send_raw_request(path, Some(body)).await?;
		check_error(value)
	}

	async fn trigger(&self, path: &str, body: Value) -> Result<TronTriggerResult, LedgerError> {
		let result: TronTriggerResult = from_value(self.post(path, body).await?)?;
		if !result.result.result {
			return Err(LedgerError::invalid_request(format!(
				"Contract call rejected: {}",
				result.message()
			)));
		}
		Ok(result)
	}
}

#[async_trait]
impl<T: LedgerTransport> TronClientTrait for TronClient<T> {
	async fn now_block(&self) -> Result<TronBlock, LedgerError> {
		from_value(self.post("wallet/getnowblock", json!({})).await?)
	}

	async fn block_by_num(&self, number: u64) -> Result<TronBlock, LedgerError> {
		let value = self
			.post("wallet/getblockbynum", json!({"num": number}))
			.await?;
		if is_empty(&value) {
			return Err(LedgerError::not_found(format!("Block {} not found", number)));
		}
		from_value(value)
	}

	async fn transaction_by_id(&self, txid: &str) -> Result<TronTransaction, LedgerError> {
		from_value(self.raw_transaction(txid).await?)
	}

	async fn raw_transaction(&self, txid: &str) -> Result<Value, LedgerError> {
		let value = self
			.post("wallet/gettransactionbyid", json!({"value": txid}))
			.await?;
		if is_empty(&value) {
			return Err(LedgerError::not_found(format!("Transaction {} not found", txid)));
		}
		Ok(value)
	}

	async fn transaction_info(&self, txid: &str) -> Result<TronTransactionInfo, LedgerError> {
		from_value(
			self.post("wallet/gettransactioninfobyid", json!({"value": txid}))
				.await?,
		)
	}

	async fn account(&self, address: &str) -> Result<TronAccount, LedgerError> {
		from_value(
			self.post("wallet/getaccount", json!({"address": address}))
				.await?,
		)
	}

	async fn asset_precision(&self, asset_id: &str) -> Result<u32, LedgerError> {
		let value = self
			.post("wallet/getassetissuebyid", json!({"value": asset_id}))
			.await?;
		if is_empty(&value) {
			return Err(LedgerError::not_found(format!("Asset {} not found", asset_id)));
		}
		Ok(value
			.get("precision")
			.and_then(|p| p.as_u64())
			.unwrap_or(0) as u32)
	}

	async fn generate_address(&self) -> Result<TronGeneratedAddress, LedgerError> {
		from_value(self.post("wallet/generateaddress", json!({})).await?)
	}

	async fn validate_address(&self, address: &str) -> Result<bool, LedgerError> {
		let value = self
			.post("wallet/validateaddress", json!({"address": address}))
			.await?;
		Ok(value.get("result").and_then(|r| r.as_bool()).unwrap_or(false))
	}

	async fn create_transaction(
		&self,
		owner: &str,
		to: &str,
		amount: u64,
	) -> Result<TronRawTransaction, LedgerError> {
		self.post(
			"wallet/createtransaction",
			json!({"owner_address": owner, "to_address": to, "amount": amount}),
		)
		.await
	}

	async fn transfer_asset(
		&self,
		owner: &str,
		to: &str,
		asset_id: &str,
		amount: u64,
	) -> Result<TronRawTransaction, LedgerError> {
		self.post(
			"wallet/transferasset",
			json!({
				"owner_address": owner,
				"to_address": to,
				"asset_name": asset_id,
				"amount": amount
			}),
		)
		.await
	}

	async fn call_constant(
		&self,
		owner: &str,
		contract: &str,
		selector: &str,
		parameter: &str,
	) -> Result<String, LedgerError> {
		let result = self
			.trigger(
				"wallet/triggerconstantcontract",
				json!({
					"owner_address": owner,
					"contract_address": contract,
					"function_selector": selector,
					"parameter": parameter
				}),
			)
			.await?;
		result.constant_result.into_iter().next().ok_or_else(|| {
			LedgerError::internal(format!("{} on {} returned nothing", selector, contract))
		})
	}

	async fn trigger_contract(
		&self,
		owner: &str,
		contract: &str,
		selector: &str,
		parameter: &str,
		fee_limit: u64,
	) -> Result<TronRawTransaction, LedgerError> {
		let result = self
			.trigger(
				"wallet/triggersmartcontract",
				json!({
					"owner_address": owner,
					"contract_address": contract,
					"function_selector": selector,
					"parameter": parameter,
					"fee_limit": fee_limit,
					"call_value": 0
				}),
			)
			.await?;
		result
			.transaction
			.ok_or_else(|| LedgerError::internal("Trigger returned no transaction"))
	}

	async fn sign_transaction(
		&self,
		transaction: TronRawTransaction,
		private_key: &str,
	) -> Result<TronRawTransaction, LedgerError> {
		self.post(
			"wallet/gettransactionsign",
			json!({"transaction": transaction, "privateKey": private_key}),
		)
		.await
	}

	async fn broadcast(
		&self,
		transaction: TronRawTransaction,
	) -> Result<TronBroadcastResult, LedgerError> {
		let value = self
			.transport
			.send_raw_request("wallet/broadcasttransaction", Some(transaction))
			.await?;
		from_value(value)
	}
}
