//! TRON full-node HTTP API payloads.
//!
//! All requests are sent with `visible: true`, so addresses are base58 encoded.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const TRANSFER_CONTRACT: &str = "TransferContract";
pub const TRANSFER_ASSET_CONTRACT: &str = "TransferAssetContract";
pub const TRIGGER_SMART_CONTRACT: &str = "TriggerSmartContract";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TronContractValue {
	#[serde(default)]
	pub owner_address: Option<String>,
	#[serde(default)]
	pub to_address: Option<String>,
	#[serde(default)]
	pub amount: Option<u64>,
	#[serde(default)]
	pub asset_name: Option<String>,
	/// Called contract of a `TriggerSmartContract`
	#[serde(default)]
	pub contract_address: Option<String>,
	/// Hex calldata of a `TriggerSmartContract`
	#[serde(default)]
	pub data: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TronContractParameter {
	#[serde(default)]
	pub value: TronContractValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TronContract {
	#[serde(rename = "type")]
	pub contract_type: String,
	pub parameter: TronContractParameter,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TronRawData {
	#[serde(default)]
	pub contract: Vec<TronContract>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TronResult {
	#[serde(rename = "contractRet", default)]
	pub contract_ret: Option<String>,
}

/// Transaction object (`gettransactionbyid`, block bodies, `createtransaction`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TronTransaction {
	#[serde(rename = "txID")]
	pub tx_id: String,
	#[serde(default)]
	pub raw_data: TronRawData,
	#[serde(default)]
	pub ret: Vec<TronResult>,
}

impl TronTransaction {
	/// The first contract of the transaction, which carries the transfer
	pub fn contract(&self) -> Option<&TronContract> {
		self.raw_data.contract.first()
	}

	/// True when the node reports the contract executed successfully
	pub fn succeeded(&self) -> bool {
		self.ret
			.first()
			.and_then(|r| r.contract_ret.as_deref())
			.is_some_and(|r| r == "SUCCESS")
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TronBlockRawData {
	pub number: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TronBlockHeader {
	pub raw_data: TronBlockRawData,
}

/// Block (`getnowblock`, `getblockbynum`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TronBlock {
	#[serde(rename = "blockID")]
	pub block_id: String,
	pub block_header: TronBlockHeader,
	#[serde(default)]
	pub transactions: Vec<TronTransaction>,
}

impl TronBlock {
	pub fn height(&self) -> u64 {
		self.block_header.raw_data.number
	}
}

/// Result of `gettransactioninfobyid`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TronTransactionInfo {
	#[serde(default)]
	pub id: Option<String>,
	#[serde(rename = "blockNumber", default)]
	pub block_number: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TronAssetBalance {
	pub key: String,
	pub value: u64,
}

/// Result of `getaccount`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TronAccount {
	#[serde(default)]
	pub address: Option<String>,
	#[serde(default)]
	pub balance: Option<u64>,
	#[serde(rename = "assetV2", default)]
	pub assets: Vec<TronAssetBalance>,
}

/// Result of `generateaddress`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TronGeneratedAddress {
	pub address: String,
	#[serde(rename = "privateKey")]
	pub private_key: String,
	#[serde(rename = "hexAddress", default)]
	pub hex_address: Option<String>,
}

/// Result of `broadcasttransaction`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TronBroadcastResult {
	#[serde(default)]
	pub result: bool,
	#[serde(default)]
	pub txid: Option<String>,
	#[serde(default)]
	pub code: Option<String>,
	#[serde(default)]
	pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TronTriggerStatus {
	#[serde(default)]
	pub result: bool,
	#[serde(default)]
	pub code: Option<String>,
	/// Hex encoded by the node
	#[serde(default)]
	pub message: Option<String>,
}

/// Result of `triggersmartcontract` and `triggerconstantcontract`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TronTriggerResult {
	#[serde(default)]
	pub result: TronTriggerStatus,
	/// Unsigned transaction, absent for constant calls
	#[serde(default)]
	pub transaction: Option<Value>,
	/// Hex return words of a constant call
	#[serde(default)]
	pub constant_result: Vec<String>,
}

impl TronTriggerResult {
	/// Node message decoded from hex when possible
	pub fn message(&self) -> String {
		let raw = self.result.message.clone().unwrap_or_default();
		hex::decode(&raw)
			.ok()
			.and_then(|bytes| String::from_utf8(bytes).ok())
			.unwrap_or(raw)
	}
}

/// Unsigned or signed transaction returned by the node, kept opaque
pub type TronRawTransaction = Value;
