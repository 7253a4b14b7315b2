use alloy::primitives::U256;
use chrono::Utc;
use rust_decimal_macros::dec;
use serde_json::json;
use std::{collections::HashSet, sync::Arc};

use crate::integration::mocks::{context, temp_storage, MockTronClient};
use wallet_gateway::{
	models::{
		tron::{TronAccount, TronBlock, TronBroadcastResult, TronTransaction, TronTransactionInfo},
		AccountRecord, Asset, TokenConfig, TransactionCategory, TronSettings, WithdrawOptions,
		WithdrawalRequest,
	},
	services::{
		ledger::{
			trc20_transfer_parameter, LedgerAdapter, LedgerError, Trc10Adapter, Trc20Adapter,
			TronAdapter, TRC20_BALANCE_OF, TRC20_DECIMALS, TRC20_TRANSFER,
		},
		observer::{AccountStore, ChangeSet, ChangeSource, TransactionLog},
	},
};

const MAIN: &str = "TJRabPrwbZy45sbavfcjinPJC18kjpRTv8";
const USER: &str = "TUserAddress1111111111111111111111";
const OUTSIDER: &str = "TOutsider111111111111111111111111";
const USDT: &str = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t";
const HOLDER: &str = "T9yD14Nj9j7xAB4dbGeiX9h8unkKLxmGkn";
const OTHER_CONTRACT: &str = "T9yD14Nj9j7xAB4dbGeiX9h8unkKT76qbH";

fn settings() -> TronSettings {
	TronSettings {
		main_account: MAIN.to_string(),
		main_account_private_key: Some("mainkey".to_string()),
		trc20_fee_limit: 30_000_000,
	}
}

fn token(asset_id: &str, route: &str) -> TokenConfig {
	TokenConfig {
		route: route.to_string(),
		name: None,
		contract: asset_id.to_string(),
		symbol: None,
		decimals: Some(6),
	}
}

fn transfer(txid: &str, from: &str, to: &str, amount: u64, asset: Option<&str>, ret: &str) -> TronTransaction {
	let (kind, mut value) = match asset {
		Some(id) => ("TransferAssetContract", json!({ "asset_name": id })),
		None => ("TransferContract", json!({})),
	};
	value["owner_address"] = json!(from);
	value["to_address"] = json!(to);
	value["amount"] = json!(amount);
	serde_json::from_value(json!({
		"txID": txid,
		"raw_data": {"contract": [{"type": kind, "parameter": {"value": value}}]},
		"ret": [{"contractRet": ret}],
	}))
	.unwrap()
}

fn trc20_call(txid: &str, from: &str, contract: &str, to: &str, amount: u64) -> TronTransaction {
	let data = format!(
		"a9059cbb{}",
		trc20_transfer_parameter(to, U256::from(amount)).unwrap()
	);
	serde_json::from_value(json!({
		"txID": txid,
		"raw_data": {"contract": [{
			"type": "TriggerSmartContract",
			"parameter": {"value": {
				"owner_address": from,
				"contract_address": contract,
				"data": data,
			}},
		}]},
		"ret": [{"contractRet": "SUCCESS"}],
	}))
	.unwrap()
}

fn word(value: u64) -> String {
	format!("{:064x}", value)
}

fn block(number: u64, transactions: Vec<TronTransaction>) -> TronBlock {
	let mut block: TronBlock = serde_json::from_value(json!({
		"blockID": format!("block-{}", number),
		"block_header": {"raw_data": {"number": number}},
	}))
	.unwrap();
	block.transactions = transactions;
	block
}

fn accepted(txid: &str) -> TronBroadcastResult {
	TronBroadcastResult {
		result: true,
		txid: Some(txid.to_string()),
		code: None,
		message: None,
	}
}

#[tokio::test]
async fn test_withdraw_signs_with_main_key() {
	let (_dir, storage) = temp_storage();
	let mut client = MockTronClient::new();
	client.expect_validate_address().returning(|_| Ok(true));
	client
		.expect_create_transaction()
		.withf(|owner, to, amount| owner == MAIN && to == USER && *amount == 2_500_000)
		.returning(|_, _, _| Ok(json!({ "txID": "unsigned" })));
	client
		.expect_sign_transaction()
		.withf(|_, key| key == "mainkey")
		.returning(|tx, _| {
			let mut signed = tx.clone();
			signed["txID"] = json!("TX1");
			Ok(signed)
		});
	client.expect_broadcast().returning(|_| Ok(accepted("TX1")));

	let adapter = TronAdapter::new("trx", Arc::new(client), settings(), vec![], context("trx", true, &storage));
	let receipt = adapter
		.perform_withdraw(WithdrawalRequest::new(USER, dec!(2.5)))
		.await
		.unwrap();

	assert_eq!(receipt.txid, "TX1");
	assert_eq!(receipt.amount, dec!(2.5));
	assert_eq!(receipt.fee, None);

	let logged = storage.get("trx", "TX1").await.unwrap().unwrap();
	assert_eq!(logged.block_number, None);
	assert_eq!(logged.from.as_deref(), Some(MAIN));
}

#[tokio::test]
async fn test_generated_account_key_signs_its_withdrawals() {
	let (_dir, storage) = temp_storage();
	storage
		.save_account(
			"trx",
			AccountRecord {
				address: USER.to_string(),
				secret: Some("userkey".to_string()),
				label: None,
				created_at: Utc::now(),
			},
		)
		.await
		.unwrap();

	let mut client = MockTronClient::new();
	client.expect_validate_address().returning(|_| Ok(true));
	client
		.expect_create_transaction()
		.withf(|owner, _, _| owner == USER)
		.returning(|_, _, _| Ok(json!({ "txID": "TX2" })));
	client
		.expect_sign_transaction()
		.withf(|_, key| key == "userkey")
		.returning(|tx, _| Ok(tx));
	client.expect_broadcast().returning(|_| {
		Ok(TronBroadcastResult {
			result: true,
			txid: None,
			code: None,
			message: None,
		})
	});

	let adapter = TronAdapter::new("trx", Arc::new(client), settings(), vec![], context("trx", false, &storage));
	let receipt = adapter
		.perform_withdraw(WithdrawalRequest::new(MAIN, dec!(1)).from_sender(USER))
		.await
		.unwrap();
	assert_eq!(receipt.txid, "TX2");

	let accounts = adapter.list_accounts().await.unwrap();
	assert_eq!(accounts, vec![MAIN.to_string(), USER.to_string()]);
}

#[tokio::test]
async fn test_sender_without_key_is_unauthorized() {
	let (_dir, storage) = temp_storage();
	let mut client = MockTronClient::new();
	client.expect_validate_address().returning(|_| Ok(true));
	client
		.expect_create_transaction()
		.returning(|_, _, _| Ok(json!({ "txID": "TX3" })));
	client.expect_sign_transaction().never();
	client.expect_broadcast().never();

	let adapter = TronAdapter::new("trx", Arc::new(client), settings(), vec![], context("trx", false, &storage));
	let result = adapter
		.perform_withdraw(WithdrawalRequest::new(USER, dec!(1)).from_sender(OUTSIDER))
		.await;
	assert!(matches!(result, Err(LedgerError::Unauthorized(_))));
}

#[tokio::test]
async fn test_sub_fee_and_bad_receiver_are_rejected() {
	let (_dir, storage) = temp_storage();
	let mut client = MockTronClient::new();
	client
		.expect_validate_address()
		.returning(|address| Ok(address != "nonsense"));
	client.expect_create_transaction().never();

	let adapter = TronAdapter::new("trx", Arc::new(client), settings(), vec![], context("trx", false, &storage));

	let request = WithdrawalRequest::new(USER, dec!(1)).with_options(WithdrawOptions {
		sub_fee: true,
		..WithdrawOptions::default()
	});
	assert!(matches!(
		adapter.perform_withdraw(request).await,
		Err(LedgerError::InvalidRequest(_))
	));
	assert!(matches!(
		adapter
			.perform_withdraw(WithdrawalRequest::new("nonsense", dec!(1)))
			.await,
		Err(LedgerError::InvalidRequest(_))
	));
}

#[tokio::test]
async fn test_failed_broadcast_reports_txid() {
	let (_dir, storage) = temp_storage();
	let mut client = MockTronClient::new();
	client.expect_validate_address().returning(|_| Ok(true));
	client
		.expect_create_transaction()
		.returning(|_, _, _| Ok(json!({ "txID": "TX4" })));
	client.expect_sign_transaction().returning(|tx, _| Ok(tx));
	client.expect_broadcast().returning(|_| {
		Ok(TronBroadcastResult {
			result: false,
			txid: Some("TX4".to_string()),
			code: Some("BANDWITH_ERROR".to_string()),
			message: Some("not enough bandwidth".to_string()),
		})
	});

	let adapter = TronAdapter::new("trx", Arc::new(client), settings(), vec![], context("trx", true, &storage));
	match adapter.perform_withdraw(WithdrawalRequest::new(USER, dec!(1))).await {
		Err(LedgerError::Broadcast { txid, .. }) => assert_eq!(txid, "TX4"),
		other => panic!("unexpected {:?}", other),
	}
	assert!(storage.get("trx", "TX4").await.unwrap().is_none());
}

#[tokio::test]
async fn test_scan_keeps_mounted_assets_only() {
	let (_dir, storage) = temp_storage();
	let mut client = MockTronClient::new();
	client
		.expect_block_by_num()
		.withf(|number| *number == 6)
		.returning(|_| {
			Ok(block(
				6,
				vec![
					transfer("NATIVE", OUTSIDER, MAIN, 3_000_000, None, "SUCCESS"),
					transfer("MOUNTED", OUTSIDER, MAIN, 7_000_000, Some("1002000"), "SUCCESS"),
					transfer("UNMOUNTED", OUTSIDER, MAIN, 1, Some("1000001"), "SUCCESS"),
					transfer("REVERTED", OUTSIDER, MAIN, 5, None, "REVERT"),
					transfer("FOREIGN", OUTSIDER, USER, 5, None, "SUCCESS"),
				],
			))
		});
	client
		.expect_block_by_num()
		.withf(|number| *number == 7)
		.returning(|_| Ok(block(7, vec![])));

	let adapter = TronAdapter::new(
		"trx",
		Arc::new(client),
		settings(),
		vec![token("1002000", "btt")],
		context("trx", true, &storage),
	);
	let accounts = adapter.managed_accounts().await.unwrap();

	match adapter.scan(5, 7, &accounts).await.unwrap() {
		ChangeSet::Blocks(blocks) => {
			assert_eq!(blocks.len(), 2);
			assert_eq!(blocks[0].height, 6);
			let found = &blocks[0].transactions;
			assert_eq!(found.len(), 2);
			assert_eq!(found[0].txid, "NATIVE");
			assert_eq!(found[0].asset, Asset::Native);
			assert_eq!(found[0].amount, dec!(3));
			assert_eq!(found[1].txid, "MOUNTED");
			assert_eq!(found[1].asset, Asset::Token("1002000".to_string()));
			assert_eq!(found[1].amount, dec!(7));
			assert!(blocks[1].transactions.is_empty());
		}
		other => panic!("unexpected {:?}", other),
	}
}

#[tokio::test]
async fn test_transaction_lookup_matches_asset() {
	let (_dir, storage) = temp_storage();
	let mut client = MockTronClient::new();
	client.expect_transaction_by_id().returning(|txid| {
		Ok(transfer(txid, OUTSIDER, MAIN, 4_000_000, Some("1002000"), "SUCCESS"))
	});
	client.expect_transaction_info().returning(|_| {
		Ok(TronTransactionInfo {
			id: None,
			block_number: Some(40),
		})
	});
	client.expect_now_block().returning(|| Ok(block(45, vec![])));

	let parent = Arc::new(TronAdapter::new(
		"trx",
		Arc::new(client),
		settings(),
		vec![token("1002000", "btt")],
		context("trx", false, &storage),
	));
	let trc10 = Trc10Adapter::new(parent.clone(), token("1002000", "btt"));

	let tx = trc10.get_transaction("TOKEN1").await.unwrap();
	assert_eq!(tx.category, TransactionCategory::Receive);
	assert_eq!(tx.amount, dec!(4));
	assert_eq!(tx.confirmations, Some(5));

	assert!(matches!(
		parent.get_transaction("TOKEN1").await,
		Err(LedgerError::NotFound(_))
	));
}

#[tokio::test]
async fn test_trc10_balance_reads_asset_entry() {
	let (_dir, storage) = temp_storage();
	let mut client = MockTronClient::new();
	client.expect_account().returning(|address| {
		Ok(serde_json::from_value::<TronAccount>(json!({
			"address": address,
			"balance": 9_000_000,
			"assetV2": [
				{"key": "1000001", "value": 5},
				{"key": "1002000", "value": 12_345_000}
			]
		}))
		.unwrap())
	});

	let parent = Arc::new(TronAdapter::new(
		"trx",
		Arc::new(client),
		settings(),
		vec![token("1002000", "btt")],
		context("trx", false, &storage),
	));
	let trc10 = Trc10Adapter::new(parent.clone(), token("1002000", "btt"));

	assert_eq!(trc10.get_account_balance(MAIN).await.unwrap().balance, dec!(12.345));
	assert_eq!(parent.get_account_balance(MAIN).await.unwrap().balance, dec!(9));
}

#[tokio::test]
async fn test_trc10_withdraw_transfers_asset() {
	let (_dir, storage) = temp_storage();
	let mut client = MockTronClient::new();
	client.expect_validate_address().returning(|_| Ok(true));
	client.expect_create_transaction().never();
	client
		.expect_transfer_asset()
		.withf(|owner, to, asset, amount| {
			owner == MAIN && to == USER && asset == "1002000" && *amount == 1_000_000
		})
		.returning(|_, _, _, _| Ok(json!({ "txID": "TX5" })));
	client.expect_sign_transaction().returning(|tx, _| Ok(tx));
	client.expect_broadcast().returning(|_| Ok(accepted("TX5")));

	let parent = Arc::new(TronAdapter::new(
		"trx",
		Arc::new(client),
		settings(),
		vec![token("1002000", "btt")],
		context("trx", true, &storage),
	));
	let trc10 = Trc10Adapter::new(parent, token("1002000", "btt"));

	let receipt = trc10
		.perform_withdraw(WithdrawalRequest::new(USER, dec!(1)))
		.await
		.unwrap();
	assert_eq!(receipt.txid, "TX5");

	let logged = storage.get("trx", "TX5").await.unwrap().unwrap();
	assert_eq!(logged.asset, Asset::Token("1002000".to_string()));
}

#[tokio::test]
async fn test_generated_address_is_stored_with_key() {
	let (_dir, storage) = temp_storage();
	let mut client = MockTronClient::new();
	client.expect_generate_address().returning(|| {
		Ok(serde_json::from_value(json!({
			"address": USER,
			"privateKey": "userkey",
			"hexAddress": "41abcdef",
		}))
		.unwrap())
	});

	let adapter = TronAdapter::new("trx", Arc::new(client), settings(), vec![], context("trx", false, &storage));
	let account = adapter.generate_account(Default::default()).await.unwrap();

	assert_eq!(account.address, USER);
	assert_eq!(account.extra, Some(json!({ "hex_address": "41abcdef" })));

	let stored = storage.get_account("trx", USER).await.unwrap().unwrap();
	assert_eq!(stored.secret.as_deref(), Some("userkey"));
	let managed: HashSet<String> = adapter.managed_accounts().await.unwrap();
	assert!(managed.contains(&USER.to_lowercase()));
}

#[tokio::test]
async fn test_scan_decodes_mounted_trc20_transfers() {
	let (_dir, storage) = temp_storage();
	let mut client = MockTronClient::new();
	client.expect_block_by_num().returning(|_| {
		Ok(block(
			8,
			vec![
				trc20_call("USDT-IN", OUTSIDER, USDT, MAIN, 2_500_000),
				trc20_call("OTHER-IN", OUTSIDER, OTHER_CONTRACT, MAIN, 9),
			],
		))
	});
	client.expect_call_constant().never();

	let adapter = TronAdapter::new(
		"trx",
		Arc::new(client),
		settings(),
		vec![token(USDT, "usdt")],
		context("trx", true, &storage),
	);
	let accounts = adapter.managed_accounts().await.unwrap();

	match adapter.scan(7, 8, &accounts).await.unwrap() {
		ChangeSet::Blocks(blocks) => {
			let found = &blocks[0].transactions;
			assert_eq!(found.len(), 1);
			assert_eq!(found[0].txid, "USDT-IN");
			assert_eq!(found[0].asset, Asset::Contract(USDT.to_string()));
			assert_eq!(found[0].to.as_deref(), Some(MAIN));
			assert_eq!(found[0].amount, dec!(2.5));
		}
		other => panic!("unexpected {:?}", other),
	}
}

#[tokio::test]
async fn test_trc20_reads_decimals_once_and_balance() {
	let (_dir, storage) = temp_storage();
	let mut client = MockTronClient::new();
	client
		.expect_call_constant()
		.withf(|_, contract, selector, _| contract == USDT && selector == TRC20_DECIMALS)
		.times(1)
		.returning(|_, _, _, _| Ok(word(6)));
	client
		.expect_call_constant()
		.withf(|owner, contract, selector, _| {
			owner == MAIN && contract == USDT && selector == TRC20_BALANCE_OF
		})
		.returning(|_, _, _, _| Ok(word(12_345_000)));

	let unconfigured = TokenConfig {
		decimals: None,
		..token(USDT, "usdt")
	};
	let parent = Arc::new(TronAdapter::new(
		"trx",
		Arc::new(client),
		settings(),
		vec![unconfigured.clone()],
		context("trx", false, &storage),
	));
	let trc20 = Trc20Adapter::new(parent, unconfigured);

	trc20.on_init().await.unwrap();
	assert_eq!(trc20.get_account_balance(HOLDER).await.unwrap().balance, dec!(12.345));
	assert!(matches!(
		trc20.get_account_balance(OUTSIDER).await,
		Err(LedgerError::InvalidRequest(_))
	));
}

#[tokio::test]
async fn test_trc20_withdraw_triggers_transfer() {
	let (_dir, storage) = temp_storage();
	let mut client = MockTronClient::new();
	client.expect_validate_address().returning(|_| Ok(true));
	client.expect_create_transaction().never();
	client.expect_transfer_asset().never();
	let expected = trc20_transfer_parameter(HOLDER, U256::from(1_500_000u64)).unwrap();
	client
		.expect_trigger_contract()
		.withf(move |owner, contract, selector, parameter, fee_limit| {
			owner == MAIN
				&& contract == USDT
				&& selector == TRC20_TRANSFER
				&& parameter == expected
				&& *fee_limit == 30_000_000
		})
		.returning(|_, _, _, _, _| Ok(json!({ "txID": "TX6" })));
	client
		.expect_sign_transaction()
		.withf(|_, key| key == "mainkey")
		.returning(|tx, _| Ok(tx));
	client.expect_broadcast().returning(|_| Ok(accepted("TX6")));

	let parent = Arc::new(TronAdapter::new(
		"trx",
		Arc::new(client),
		settings(),
		vec![token(USDT, "usdt")],
		context("trx", true, &storage),
	));
	let trc20 = Trc20Adapter::new(parent, token(USDT, "usdt"));

	let receipt = trc20
		.perform_withdraw(WithdrawalRequest::new(HOLDER, dec!(1.5)))
		.await
		.unwrap();
	assert_eq!(receipt.txid, "TX6");
	assert_eq!(receipt.amount, dec!(1.5));

	let logged = storage.get("trx", "TX6").await.unwrap().unwrap();
	assert_eq!(logged.asset, Asset::Contract(USDT.to_string()));
	assert_eq!(logged.block_number, None);
}

#[tokio::test]
async fn test_trc20_transaction_lookup_matches_contract() {
	let (_dir, storage) = temp_storage();
	let mut client = MockTronClient::new();
	client
		.expect_transaction_by_id()
		.returning(|txid| Ok(trc20_call(txid, MAIN, USDT, HOLDER, 750_000)));
	client.expect_transaction_info().returning(|_| {
		Ok(TronTransactionInfo {
			id: None,
			block_number: Some(90),
		})
	});
	client.expect_now_block().returning(|| Ok(block(100, vec![])));

	let parent = Arc::new(TronAdapter::new(
		"trx",
		Arc::new(client),
		settings(),
		vec![token(USDT, "usdt")],
		context("trx", false, &storage),
	));
	let trc20 = Trc20Adapter::new(parent.clone(), token(USDT, "usdt"));

	let tx = trc20.get_transaction("PAYOUT").await.unwrap();
	assert_eq!(tx.category, TransactionCategory::Send);
	assert_eq!(tx.amount, dec!(0.75));
	assert_eq!(tx.to.as_deref(), Some(HOLDER));
	assert_eq!(tx.confirmations, Some(10));

	assert!(matches!(
		parent.get_transaction("PAYOUT").await,
		Err(LedgerError::NotFound(_))
	));
}
