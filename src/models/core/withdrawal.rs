//! Withdrawal request and result types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Withdrawal urgency
///
/// Maps to a confirmation target on UTXO chains and to a fee price tier elsewhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
	High,
	#[default]
	Medium,
	Low,
}

/// One value per priority level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityTable<T> {
	pub high: T,
	pub medium: T,
	pub low: T,
}

impl<T: Copy> PriorityTable<T> {
	pub fn get(&self, priority: Priority) -> T {
		match priority {
			Priority::High => self.high,
			Priority::Medium => self.medium,
			Priority::Low => self.low,
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WithdrawOptions {
	#[serde(default)]
	pub priority: Priority,
	/// Take the fee out of the transferred amount
	#[serde(default)]
	pub sub_fee: bool,
	#[serde(default)]
	pub destination_tag: Option<u32>,
	#[serde(default)]
	pub memo: Option<String>,
	/// Unlocks a sender whose key is held by the node
	#[serde(default)]
	pub password: Option<String>,
	/// Overrides the configured change address for this withdrawal
	#[serde(default)]
	pub change_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
	/// Account or address to spend from; the wallet default when absent
	#[serde(default)]
	pub sender: Option<String>,
	pub receiver: String,
	pub amount: Decimal,
	#[serde(default)]
	pub options: WithdrawOptions,
}

impl WithdrawalRequest {
	pub fn new(receiver: impl Into<String>, amount: Decimal) -> Self {
		Self {
			sender: None,
			receiver: receiver.into(),
			amount,
			options: WithdrawOptions::default(),
		}
	}

	pub fn from_sender(mut self, sender: impl Into<String>) -> Self {
		self.sender = Some(sender.into());
		self
	}

	pub fn with_options(mut self, options: WithdrawOptions) -> Self {
		self.options = options;
		self
	}
}

/// Outcome of a broadcast withdrawal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalReceipt {
	pub txid: String,
	/// Amount actually sent to the receiver
	pub amount: Decimal,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub fee: Option<Decimal>,
}
