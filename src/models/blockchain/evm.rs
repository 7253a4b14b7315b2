//! EVM JSON-RPC payloads.
//!
//! Quantities are kept as the hex strings the node returns and decoded on demand.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

/// keccak256("Transfer(address,address,uint256)")
pub const TRANSFER_EVENT_TOPIC: &str =
	"0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";

/// Decodes a `0x` prefixed hex quantity
pub fn parse_hex_u64(value: &str) -> Option<u64> {
	u64::from_str_radix(value.trim_start_matches("0x"), 16).ok()
}

/// Decodes a `0x` prefixed hex quantity into a 256-bit integer
pub fn parse_hex_u256(value: &str) -> Option<U256> {
	let digits = value.trim_start_matches("0x");
	if digits.is_empty() {
		return Some(U256::ZERO);
	}
	U256::from_str_radix(digits, 16).ok()
}

/// Extracts the address stored in the low 20 bytes of a 32-byte topic or word
pub fn address_from_word(word: &str) -> Option<String> {
	let digits = word.trim_start_matches("0x");
	if digits.len() < 40 {
		return None;
	}
	Some(format!("0x{}", &digits[digits.len() - 40..]).to_lowercase())
}

/// Transaction object (`eth_getTransactionByHash`, full blocks)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmTransaction {
	pub hash: String,
	pub from: String,
	#[serde(default)]
	pub to: Option<String>,
	pub value: String,
	#[serde(default)]
	pub block_number: Option<String>,
	#[serde(default)]
	pub input: Option<String>,
	#[serde(default)]
	pub gas_price: Option<String>,
}

impl EvmTransaction {
	/// Transferred value in wei
	pub fn value_wei(&self) -> U256 {
		parse_hex_u256(&self.value).unwrap_or(U256::ZERO)
	}

	/// Height of the including block, if mined
	pub fn block_height(&self) -> Option<u64> {
		self.block_number.as_deref().and_then(parse_hex_u64)
	}
}

/// Block with full transaction objects (`eth_getBlockByNumber`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvmBlock {
	pub number: String,
	pub hash: String,
	#[serde(default)]
	pub transactions: Vec<EvmTransaction>,
}

impl EvmBlock {
	pub fn height(&self) -> Option<u64> {
		parse_hex_u64(&self.number)
	}
}

/// Event log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmLog {
	pub address: String,
	#[serde(default)]
	pub topics: Vec<String>,
	#[serde(default)]
	pub data: String,
	#[serde(default)]
	pub block_number: Option<String>,
	#[serde(default)]
	pub transaction_hash: Option<String>,
}

/// Decoded ERC20 `Transfer` event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTransfer {
	pub contract: String,
	pub from: String,
	pub to: String,
	pub value: U256,
}

impl EvmLog {
	/// Decodes the log as an ERC20 `Transfer` event
	pub fn as_token_transfer(&self) -> Option<TokenTransfer> {
		if self.topics.len() != 3 || !self.topics[0].eq_ignore_ascii_case(TRANSFER_EVENT_TOPIC) {
			return None;
		}
		Some(TokenTransfer {
			contract: self.address.to_lowercase(),
			from: address_from_word(&self.topics[1])?,
			to: address_from_word(&self.topics[2])?,
			value: parse_hex_u256(&self.data)?,
		})
	}
}

/// Transaction receipt (`eth_getTransactionReceipt`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmReceipt {
	pub transaction_hash: String,
	#[serde(default)]
	pub block_number: Option<String>,
	#[serde(default)]
	pub status: Option<String>,
	#[serde(default)]
	pub logs: Vec<EvmLog>,
}
