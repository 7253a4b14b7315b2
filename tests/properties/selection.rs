use crate::properties::strategies::{satoshi_strategy, wallet_strategy};

use proptest::{prelude::*, test_runner::Config};
use rust_decimal::Decimal;
use wallet_gateway::services::{
	ledger::LedgerError,
	withdrawal::{candidates, select_inputs, SenderFilter},
};

proptest! {
	#![proptest_config(Config {
		failure_persistence: None,
		..Config::default()
	})]

	#[test]
	fn test_selection_is_minimal_prefix(
		wallet in wallet_strategy(),
		fraction in 1u32..=100,
	) {
		let available: Decimal = wallet.iter().map(|o| o.amount).sum();
		let target = (available * Decimal::from(fraction) / Decimal::from(100u32)).round_dp(8);
		prop_assume!(target > Decimal::ZERO);

		let selection = select_inputs(&wallet, target).unwrap();
		let count = selection.inputs.len();

		prop_assert!(count > 0);
		prop_assert_eq!(&selection.inputs[..], &wallet[..count]);
		prop_assert_eq!(selection.total, selection.inputs.iter().map(|o| o.amount).sum::<Decimal>());
		prop_assert!(selection.total >= target);
		prop_assert!(selection.total - selection.inputs[count - 1].amount < target);
	}

	#[test]
	fn test_selection_beyond_balance_fails(wallet in wallet_strategy(), extra in satoshi_strategy()) {
		let available: Decimal = wallet.iter().map(|o| o.amount).sum();
		prop_assert!(matches!(
			select_inputs(&wallet, available + extra),
			Err(LedgerError::InsufficientFunds(_))
		));
	}

	#[test]
	fn test_candidates_keep_node_order(wallet in wallet_strategy(), label in "[a-z]{0,6}") {
		let filter = SenderFilter::Label(label.clone());
		let kept = candidates(wallet.clone(), &filter);

		let expected: Vec<_> = wallet
			.into_iter()
			.filter(|o| o.spendable && o.label.as_deref().unwrap_or("") == label)
			.collect();
		prop_assert_eq!(kept, expected);
	}
}
