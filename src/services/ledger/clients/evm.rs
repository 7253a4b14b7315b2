//! Ethereum JSON-RPC client.

use alloy::{
	primitives::{Address, U256},
	sol,
	sol_types::SolCall,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::str::FromStr;

use crate::{
	models::evm::{parse_hex_u256, parse_hex_u64, EvmBlock, EvmReceipt, EvmTransaction},
	services::ledger::{clients::from_value, transports::LedgerTransport, LedgerError},
};

sol! {
	function balanceOf(address owner) external view returns (uint256);
	function decimals() external view returns (uint8);
	function transfer(address to, uint256 amount) external returns (bool);
}

fn parse_address(value: &str) -> Result<Address, LedgerError> {
	Address::from_str(value)
		.map_err(|_| LedgerError::invalid_request(format!("Invalid address: {}", value)))
}

fn encode(data: Vec<u8>) -> String {
	format!("0x{}", hex::encode(data))
}

/// Calldata of `balanceOf(owner)`
pub fn encode_balance_of(owner: &str) -> Result<String, LedgerError> {
	let owner = parse_address(owner)?;
	Ok(encode(balanceOfCall { owner }.abi_encode()))
}

/// Calldata of `decimals()`
pub fn encode_decimals() -> String {
	encode(decimalsCall {}.abi_encode())
}

/// Calldata of `transfer(to, amount)`
pub fn encode_transfer(to: &str, amount: U256) -> Result<String, LedgerError> {
	let to = parse_address(to)?;
	Ok(encode(transferCall { to, amount }.abi_encode()))
}

/// Recipient and raw amount of `transfer(to, amount)` calldata
pub fn decode_transfer(input: &str) -> Option<(String, U256)> {
	let bytes = hex::decode(input.trim_start_matches("0x")).ok()?;
	let call = transferCall::abi_decode(&bytes).ok()?;
	Some((call.to.to_string().to_lowercase(), call.amount))
}

#[async_trait]
pub trait EvmClientTrait: Send + Sync {
	async fn block_number(&self) -> Result<u64, LedgerError>;

	/// True while the node is still catching up
	async fn syncing(&self) -> Result<bool, LedgerError>;

	async fn accounts(&self) -> Result<Vec<String>, LedgerError>;

	async fn get_balance(&self, address: &str) -> Result<U256, LedgerError>;

	async fn get_transaction(&self, hash: &str) -> Result<EvmTransaction, LedgerError>;

	async fn get_raw_transaction(&self, hash: &str) -> Result<Value, LedgerError>;

	async fn get_receipt(&self, hash: &str) -> Result<Option<EvmReceipt>, LedgerError>;

	async fn get_block(&self, number: u64) -> Result<EvmBlock, LedgerError>;

	/// `eth_call` against the latest block, returning the hex result
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

#[derive(Clone, Debug)]
pub struct EvmClient<T: LedgerTransport> {
	transport: T,
}

impl<T: LedgerTransport> EvmClient<T> {
	pub fn new(transport: T) -> Self {
		Self { transport }
	}

	async fn call_rpc(&self, method: &str, params: Value) -> Result<Value, LedgerError> {
		Ok(self.transport.send_raw_request(method, Some(params)).await?)
	}

	fn quantity(value: Value, what: &str) -> Result<U256, LedgerError> {
		value
			.as_str()
			.and_then(parse_hex_u256)
			.ok_or_else(|| LedgerError::internal(format!("Invalid {} quantity: {}", what, value)))
	}
}

#[async_trait]
impl<T: LedgerTransport> EvmClientTrait for EvmClient<T> {
	async fn block_number(&self) -> Result<u64, LedgerError> {
		let value = self.call_rpc("eth_blockNumber", json!([])).await?;
		value
			.as_str()
			.and_then(parse_hex_u64)
			.ok_or_else(|| LedgerError::internal(format!("Invalid block number: {}", value)))
	}

	async fn syncing(&self) -> Result<bool, LedgerError> {
		let value = self.call_rpc("eth_syncing", json!([])).await?;
		Ok(!matches!(value, Value::Bool(false) | Value::Null))
	}

	async fn accounts(&self) -> Result<Vec<String>, LedgerError> {
		from_value(self.call_rpc("eth_accounts", json!([])).await?)
	}

	async fn get_balance(&self, address: &str) -> Result<U256, LedgerError> {
		let value = self
			.call_rpc("eth_getBalance", json!([address, "latest"]))
			.await?;
		Self::quantity(value, "balance")
	}

	async fn get_transaction(&self, hash: &str) -> Result<EvmTransaction, LedgerError> {
		let value = self.get_raw_transaction(hash).await?;
		from_value(value)
	}

	async fn get_raw_transaction(&self, hash: &str) -> Result<Value, LedgerError> {
		let value = self
			.call_rpc("eth_getTransactionByHash", json!([hash]))
			.await?;
		if value.is_null() {
			return Err(LedgerError::not_found(format!("Transaction {} not found", hash)));
		}
		Ok(value)
	}

	async fn get_receipt(&self, hash: &str) -> Result<Option<EvmReceipt>, LedgerError> {
		let value = self
			.call_rpc("eth_getTransactionReceipt", json!([hash]))
			.await?;
		if value.is_null() {
			return Ok(None);
		}
		from_value(value).map(Some)
	}

	async fn get_block(&self, number: u64) -> Result<EvmBlock, LedgerError> {
		let value = self
			.call_rpc(
				"eth_getBlockByNumber",
				json!([format!("0x{:x}", number), true]),
			)
			.await?;
		if value.is_null() {
			return Err(LedgerError::not_found(format!("Block {} not found", number)));
		}
		from_value(value)
	}

	async fn call(&self, to: &str, data: &str) -> Result<String, LedgerError> {
		from_value(
			self.call_rpc("eth_call", json!([{"to": to, "data": data}, "latest"]))
				.await?,
		)
	}

	async fn new_account(&self, password: &str) -> Result<String, LedgerError> {
		from_value(self.call_rpc("personal_newAccount", json!([password])).await?)
	}

	async fn unlock_account(
		&self,
		address: &str,
		password: &str,
		seconds: u64,
	) -> Result<bool, LedgerError> {
		match self
			.call_rpc(
				"personal_unlockAccount",
				json!([address, password, seconds]),
			)
			.await
		{
			Ok(value) => Ok(value.as_bool().unwrap_or(false)),
			Err(LedgerError::InvalidRequest(msg)) => Err(LedgerError::unauthorized(format!(
				"Failed to unlock {}: {}",
				address, msg
			))),
			Err(e) => Err(e),
		}
	}

	async fn send_transaction(&self, transaction: Value) -> Result<String, LedgerError> {
		from_value(
			self.call_rpc("eth_sendTransaction", json!([transaction]))
				.await?,
		)
	}
}
