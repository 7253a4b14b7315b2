//! Greedy input selection over wallet outputs.

use rust_decimal::Decimal;

use crate::{models::utxo::UnspentOutput, services::ledger::LedgerError};

/// Whose outputs may be spent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SenderFilter {
	/// Any spendable output of the wallet
	Wallet,
	Address(String),
	/// Outputs carrying a wallet label, `""` being the default label
	Label(String),
}

impl SenderFilter {
	pub fn matches(&self, output: &UnspentOutput) -> bool {
		match self {
			Self::Wallet => true,
			Self::Address(address) => output
				.address
				.as_deref()
				.is_some_and(|a| a.eq_ignore_ascii_case(address)),
			Self::Label(label) => output.label.as_deref().unwrap_or("") == label,
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
	pub inputs: Vec<UnspentOutput>,
	pub total: Decimal,
}

/// Spendable outputs belonging to the sender, in node order
pub fn candidates(outputs: Vec<UnspentOutput>, sender: &SenderFilter) -> Vec<UnspentOutput> {
	outputs
		.into_iter()
		.filter(|output| output.spendable && sender.matches(output))
		.collect()
}

/// Takes outputs in order until their sum covers `target`
pub fn select_inputs(candidates: &[UnspentOutput], target: Decimal) -> Result<Selection, LedgerError> {
	if candidates.is_empty() {
		return Err(LedgerError::insufficient_funds(
			"No unspent transaction available",
		));
	}

	let mut selection = Selection {
		inputs: Vec::new(),
		total: Decimal::ZERO,
	};
	for output in candidates {
		if selection.total >= target {
			break;
		}
		selection.total += output.amount;
		selection.inputs.push(output.clone());
	}

	if selection.total < target {
		return Err(LedgerError::insufficient_funds(format!(
			"Insufficient funds. Requested {}, available {}",
			target, selection.total
		)));
	}

	Ok(selection)
}
