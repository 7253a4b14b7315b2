//! UTXO withdrawal state machine.
//!
//! One run per request, nothing persisted between runs:
//!
//! ```text
//! SELECT_INPUTS -> ESTIMATE_FEE -> BUILD_RAW_TX -> FUND_RAW_TX -> SIGN -> BROADCAST -> DONE
//! ```
//!
//! Any failure aborts the run. Signing is the last step before the single broadcast, so a
//! failed run never leaves a partial broadcast behind.

use rust_decimal::Decimal;
use serde_json::{json, Map, Value};
use std::fmt;

use crate::{
	models::{utxo::RawInput, UtxoSettings, WithdrawalReceipt, WithdrawalRequest},
	services::{
		ledger::{LedgerError, UtxoClientTrait},
		withdrawal::{
			fee::{absolute_fee, estimate_vsize, fee_rate},
			selection::{candidates, select_inputs, SenderFilter},
		},
	},
	utils::amount::round_to_precision,
};

/// Outputs assumed when sizing the transaction: destination plus change
const ASSUMED_OUTPUTS: usize = 2;

/// Label alias for the wallet's default label
pub const DEFAULT_LABEL_ALIAS: &str = "_";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawalStage {
	SelectInputs,
	EstimateFee,
	BuildRawTx,
	FundRawTx,
	Sign,
	Broadcast,
	Done,
}

impl fmt::Display for WithdrawalStage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::SelectInputs => "SELECT_INPUTS",
			Self::EstimateFee => "ESTIMATE_FEE",
			Self::BuildRawTx => "BUILD_RAW_TX",
			Self::FundRawTx => "FUND_RAW_TX",
			Self::Sign => "SIGN",
			Self::Broadcast => "BROADCAST",
			Self::Done => "DONE",
		};
		write!(f, "{}", name)
	}
}

pub struct UtxoWithdrawal<'a> {
	client: &'a dyn UtxoClientTrait,
	settings: &'a UtxoSettings,
	route: &'a str,
}

impl<'a> UtxoWithdrawal<'a> {
	pub fn new(client: &'a dyn UtxoClientTrait, settings: &'a UtxoSettings, route: &'a str) -> Self {
		Self {
			client,
			settings,
			route,
		}
	}

	fn enter(&self, stage: WithdrawalStage) {
		log::debug!("[{}] withdrawal stage {}", self.route, stage);
	}

	fn round(&self, amount: Decimal) -> Decimal {
		round_to_precision(amount, self.settings.precision)
	}

	/// Resolves the sender into an address or a label filter
	async fn sender_filter(&self, sender: Option<&str>) -> Result<SenderFilter, LedgerError> {
		let Some(sender) = sender else {
			return Ok(SenderFilter::Wallet);
		};
		if sender == DEFAULT_LABEL_ALIAS {
			return Ok(SenderFilter::Label(String::new()));
		}
		if self.client.validate_address(sender).await?.isvalid {
			Ok(SenderFilter::Address(sender.to_string()))
		} else {
			Ok(SenderFilter::Label(sender.to_string()))
		}
	}

	pub async fn execute(&self, request: WithdrawalRequest) -> Result<WithdrawalReceipt, LedgerError> {
		let amount = self.round(request.amount);
		if amount <= Decimal::ZERO {
			return Err(LedgerError::invalid_request(format!(
				"Amount must be positive, got {}",
				request.amount
			)));
		}

		self.enter(WithdrawalStage::SelectInputs);
		let sender = self.sender_filter(request.sender.as_deref()).await?;
		let unspent = self.client.list_unspent(1).await?;
		let selection = select_inputs(&candidates(unspent, &sender), amount)?;

		let change_address = request
			.options
			.change_address
			.as_deref()
			.or(self.settings.change_address.as_deref());
		if change_address.is_some_and(|change| change == request.receiver) {
			return Err(LedgerError::conflict(format!(
				"Change address {} cannot receive the withdrawal",
				request.receiver
			)));
		}

		self.enter(WithdrawalStage::EstimateFee);
		let rate = fee_rate(self.client, self.settings, request.options.priority).await;
		let fee = absolute_fee(
			rate,
			estimate_vsize(selection.inputs.len(), ASSUMED_OUTPUTS),
			self.settings.precision,
		);

		let send_amount = if request.options.sub_fee {
			if fee >= amount {
				return Err(LedgerError::invalid_request(format!(
					"Fee {} is not lower than the amount {}",
					fee, amount
				)));
			}
			self.round(amount - fee)
		} else {
			amount
		};

		self.enter(WithdrawalStage::BuildRawTx);
		let inputs: Vec<RawInput> = selection.inputs.iter().map(RawInput::from).collect();
		let raw = self
			.client
			.create_raw_transaction(inputs, vec![(request.receiver.clone(), send_amount)])
			.await?;

		self.enter(WithdrawalStage::FundRawTx);
		let mut options = Map::new();
		if let Some(change) = change_address {
			options.insert("changeAddress".to_string(), json!(change));
		}
		options.insert("feeRate".to_string(), json!(rate));
		let funded = self
			.client
			.fund_raw_transaction(&raw, Value::Object(options))
			.await?;

		self.enter(WithdrawalStage::Sign);
		let signed = self
			.client
			.sign_raw_transaction_with_wallet(&funded.hex)
			.await?;
		if !signed.complete {
			return Err(LedgerError::unauthorized(
				"Wallet could not sign every input",
			));
		}

		self.enter(WithdrawalStage::Broadcast);
		let txid = self.client.send_raw_transaction(&signed.hex).await?;

		self.enter(WithdrawalStage::Done);
		log::info!(
			"[{}] sent {} to {} in {} (fee {})",
			self.route,
			send_amount,
			request.receiver,
			txid,
			funded.fee
		);
		Ok(WithdrawalReceipt {
			txid,
			amount: send_amount,
			fee: Some(funded.fee),
		})
	}
}
