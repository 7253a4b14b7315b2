use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use std::sync::Arc;

use crate::integration::mocks::{context, temp_storage, MockUtxoClient};
use wallet_gateway::{
	models::{
		utxo::{AddressValidation, ListedTransaction, UnspentOutput, WalletTransaction},
		GenerateAccountParams, Page, PriorityTable, TransactionCategory, UtxoSettings,
		GLOBAL_ACCOUNT,
	},
	services::ledger::{LedgerAdapter, LedgerError, UtxoAdapter},
};

fn settings() -> UtxoSettings {
	UtxoSettings {
		precision: 8,
		change_address: None,
		confirmation_targets: PriorityTable {
			high: 1,
			medium: 5,
			low: 10,
		},
		use_smart_fee: true,
		flat_fee_rate: dec!(0.0001),
	}
}

fn output(txid: &str, amount: Decimal, address: &str, label: Option<&str>, spendable: bool) -> UnspentOutput {
	UnspentOutput {
		txid: txid.to_string(),
		vout: 0,
		address: Some(address.to_string()),
		label: label.map(str::to_string),
		amount,
		confirmations: 3,
		spendable,
	}
}

fn wallet() -> Vec<UnspentOutput> {
	vec![
		output("a", dec!(1.5), "bcrt1qalice1", Some("alice"), true),
		output("b", dec!(0.25), "bcrt1qalice2", Some("alice"), true),
		output("c", dec!(2), "bcrt1qdefault", None, true),
		output("d", dec!(9), "bcrt1qlocked", Some("alice"), false),
		output("e", dec!(0.125), "bcrt1qbob", Some("bob"), true),
	]
}

fn validation(valid: bool) -> AddressValidation {
	AddressValidation {
		isvalid: valid,
		address: None,
	}
}

fn adapter(client: MockUtxoClient) -> (tempfile::TempDir, UtxoAdapter) {
	let (dir, storage) = temp_storage();
	let adapter = UtxoAdapter::new("btc", Arc::new(client), settings(), context("btc", false, &storage));
	(dir, adapter)
}

#[tokio::test]
async fn test_balance_by_label_address_and_wallet() {
	let mut client = MockUtxoClient::new();
	client.expect_list_unspent().returning(|_| Ok(wallet()));
	client
		.expect_validate_address()
		.returning(|address| Ok(validation(address.starts_with("bcrt1q"))));
	let (_dir, adapter) = adapter(client);

	let alice = adapter.get_account_balance("alice").await.unwrap();
	assert_eq!(alice.balance, dec!(1.75));

	let default = adapter.get_account_balance("_").await.unwrap();
	assert_eq!(default.balance, dec!(2));

	let by_address = adapter.get_account_balance("bcrt1qbob").await.unwrap();
	assert_eq!(by_address.balance, dec!(0.125));

	let global = adapter.get_global_balance().await.unwrap();
	assert_eq!(global.account.as_deref(), Some(GLOBAL_ACCOUNT));
	assert_eq!(global.balance, dec!(3.875));
}

#[tokio::test]
async fn test_labels_are_listed_with_default_alias() {
	let mut client = MockUtxoClient::new();
	client
		.expect_list_labels()
		.returning(|| Ok(vec!["".to_string(), "alice".to_string()]));
	let (_dir, adapter) = adapter(client);

	assert_eq!(
		adapter.list_accounts().await.unwrap(),
		vec!["_".to_string(), "alice".to_string()]
	);
}

#[tokio::test]
async fn test_generate_account_reuses_label_address() {
	let mut client = MockUtxoClient::new();
	client
		.expect_get_addresses_by_label()
		.withf(|label| label == "alice")
		.returning(|_| Ok(vec!["bcrt1qalice1".to_string()]));
	client
		.expect_get_addresses_by_label()
		.withf(|label| label == "carol")
		.returning(|_| Ok(vec![]));
	client
		.expect_get_new_address()
		.withf(|label| label == "carol")
		.times(1)
		.returning(|_| Ok("bcrt1qcarol".to_string()));
	let (_dir, adapter) = adapter(client);

	let named = |name: &str| GenerateAccountParams {
		name: Some(name.to_string()),
		password: None,
	};

	let alice = adapter.generate_account(named("alice")).await.unwrap();
	assert_eq!(alice.address, "bcrt1qalice1");
	assert_eq!(alice.extra, Some(json!({ "label": "alice" })));

	let carol = adapter.generate_account(named("carol")).await.unwrap();
	assert_eq!(carol.address, "bcrt1qcarol");
}

#[tokio::test]
async fn test_account_transaction_picks_account_details() {
	let mut client = MockUtxoClient::new();
	client.expect_get_transaction().returning(|txid| {
		Ok(serde_json::from_value::<WalletTransaction>(json!({
			"txid": txid,
			"amount": "-0.5",
			"fee": "-0.0001",
			"confirmations": 4,
			"details": [
				{"address": "bcrt1qexternal", "label": "alice", "category": "send", "amount": "-0.5"},
				{"address": "bcrt1qbob", "label": "bob", "category": "receive", "amount": "0.5"}
			]
		}))
		.unwrap())
	});
	let (_dir, adapter) = adapter(client);

	let sent = adapter.get_account_transaction("alice", "tx1").await.unwrap();
	assert_eq!(sent.category, TransactionCategory::Send);
	assert_eq!(sent.amount, dec!(0.5));
	assert_eq!(sent.confirmations, Some(4));
	assert_eq!(sent.extra, Some(json!({ "fee": "0.0001" })));

	let received = adapter.get_account_transaction("bob", "tx1").await.unwrap();
	assert_eq!(received.category, TransactionCategory::Receive);

	assert!(matches!(
		adapter.get_account_transaction("carol", "tx1").await,
		Err(LedgerError::NotFound(_))
	));

	let wallet_view = adapter.get_transaction("tx1").await.unwrap();
	assert_eq!(wallet_view.category, TransactionCategory::Send);
}

#[tokio::test]
async fn test_listing_is_newest_first() {
	let mut client = MockUtxoClient::new();
	client
		.expect_list_transactions()
		.withf(|label, count, skip| label.is_empty() && *count == 2 && *skip == 2)
		.returning(|_, _, _| {
			Ok(vec![
				ListedTransaction {
					txid: "older".to_string(),
					address: Some("bcrt1qdefault".to_string()),
					label: Some("".to_string()),
					category: "receive".to_string(),
					amount: dec!(1),
					confirmations: 0,
					time: None,
				},
				ListedTransaction {
					txid: "newer".to_string(),
					address: Some("bcrt1qexternal".to_string()),
					label: None,
					category: "send".to_string(),
					amount: dec!(-0.3),
					confirmations: 2,
					time: None,
				},
			])
		});
	let (_dir, adapter) = adapter(client);

	let listed = adapter
		.list_account_transactions("_", Page::new(2, 2))
		.await
		.unwrap();
	assert_eq!(listed[0].id, "newer");
	assert_eq!(listed[0].amount, dec!(0.3));
	assert_eq!(listed[0].category, TransactionCategory::Send);
	assert_eq!(listed[1].confirmations, None);
}
