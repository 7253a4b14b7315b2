use rust_decimal_macros::dec;
use serde_json::json;
use std::sync::Arc;

use crate::integration::mocks::{context, temp_storage, MockEosioClient};
use wallet_gateway::{
	models::{
		eosio::{EosioActions, EosioCurrencyStats, EosioInfo, EosioPushResult, EosioTransaction},
		Asset, EosioAccountResources, EosioSettings, GenerateAccountParams, TokenConfig,
		TransactionCategory, WithdrawOptions, WithdrawalRequest,
	},
	services::{
		ledger::{EosioAdapter, EosioTokenAdapter, LedgerAdapter, LedgerError},
		observer::{AccountStore, ChangeSet, ChangeSource, TransactionLog},
	},
};

const MAIN: &str = "gatewaymain1";
const USER: &str = "gatewayuser1";
const OUTSIDER: &str = "someexchange";
const MAIN_KEY: &str = "EOS6MRyAjQq8ud7hVNYcfnVPJqcVpscN5So8BhtHuGYqET5GDW5CV";

fn settings() -> EosioSettings {
	EosioSettings {
		main_account: MAIN.to_string(),
		main_account_public_key: Some(MAIN_KEY.to_string()),
		wallet_url: None,
		owned_accounts: vec![],
		contract: "eosio.token".to_string(),
		symbol: "EOS".to_string(),
		require_memo: false,
		expire_seconds: 30,
		new_account: Some(EosioAccountResources {
			ram_bytes: 4096,
			stake_net: "0.1000 EOS".to_string(),
			stake_cpu: "0.1000 EOS".to_string(),
		}),
	}
}

fn info(irreversible: u64) -> EosioInfo {
	EosioInfo {
		chain_id: "aca376f2".to_string(),
		head_block_num: irreversible + 300,
		last_irreversible_block_num: irreversible,
		last_irreversible_block_id: None,
		head_block_time: None,
	}
}

fn stats() -> EosioCurrencyStats {
	EosioCurrencyStats {
		supply: "100.0000 EOS".to_string(),
		max_supply: "10000000000.0000 EOS".to_string(),
		issuer: "eosio".to_string(),
	}
}

fn pushed(txid: &str) -> EosioPushResult {
	EosioPushResult {
		transaction_id: txid.to_string(),
		processed: None,
	}
}

fn transfer_trace(seq: i64, block: u64, txid: &str, from: &str, to: &str, quantity: &str) -> serde_json::Value {
	json!({
		"account_action_seq": seq,
		"block_num": block,
		"action_trace": {
			"trx_id": txid,
			"act": {
				"account": "eosio.token",
				"name": "transfer",
				"authorization": [{"actor": from, "permission": "active"}],
				"data": {"from": from, "to": to, "quantity": quantity, "memo": ""}
			}
		}
	})
}

#[tokio::test]
async fn test_withdraw_pushes_transfer_signed_by_main_key() {
	let (_dir, storage) = temp_storage();
	let mut client = MockEosioClient::new();
	client
		.expect_currency_stats()
		.withf(|contract, symbol| contract == "eosio.token" && symbol == "EOS")
		.times(1)
		.returning(|_, _| Ok(stats()));
	client
		.expect_push_actions()
		.withf(|actions, keys, expire| {
			let action = &actions[0];
			actions.len() == 1
				&& action.account == "eosio.token"
				&& action.name == "transfer"
				&& action.authorization[0].actor == MAIN
				&& action.data["from"] == MAIN
				&& action.data["to"] == OUTSIDER
				&& action.data["quantity"] == "1.5000 EOS"
				&& action.data["memo"] == "invoice 7"
				&& keys == &vec![MAIN_KEY.to_string()]
				&& *expire == 30
		})
		.times(2)
		.returning(|_, _, _| Ok(pushed("EOSTX1")));

	let adapter = EosioAdapter::new("eos", Arc::new(client), settings(), vec![], context("eos", true, &storage));
	let request = || {
		WithdrawalRequest::new(OUTSIDER, dec!(1.5)).with_options(WithdrawOptions {
			memo: Some("invoice 7".to_string()),
			..WithdrawOptions::default()
		})
	};

	let receipt = adapter.perform_withdraw(request()).await.unwrap();
	assert_eq!(receipt.txid, "EOSTX1");
	assert_eq!(receipt.amount, dec!(1.5));

	// precision is read from the chain once
	adapter.perform_withdraw(request()).await.unwrap();

	let logged = storage.get("eos", "EOSTX1").await.unwrap().unwrap();
	assert_eq!(logged.extra, Some(json!({ "memo": "invoice 7" })));
	assert_eq!(
		logged.asset,
		Asset::Currency {
			contract: "eosio.token".to_string(),
			symbol: "EOS".to_string(),
		}
	);
}

#[tokio::test]
async fn test_withdraw_validation() {
	let (_dir, storage) = temp_storage();
	let mut client = MockEosioClient::new();
	client.expect_push_actions().never();

	let mut settings = settings();
	settings.require_memo = true;
	let adapter = EosioAdapter::new("eos", Arc::new(client), settings, vec![], context("eos", false, &storage));

	let memo = |memo: &str| WithdrawOptions {
		memo: Some(memo.to_string()),
		..WithdrawOptions::default()
	};

	assert!(matches!(
		adapter
			.perform_withdraw(WithdrawalRequest::new(OUTSIDER, dec!(1)))
			.await,
		Err(LedgerError::InvalidRequest(_))
	));
	assert!(matches!(
		adapter
			.perform_withdraw(WithdrawalRequest::new("Not.Valid", dec!(1)).with_options(memo("m")))
			.await,
		Err(LedgerError::InvalidRequest(_))
	));
	let sub_fee = WithdrawOptions {
		sub_fee: true,
		..memo("m")
	};
	assert!(matches!(
		adapter
			.perform_withdraw(WithdrawalRequest::new(OUTSIDER, dec!(1)).with_options(sub_fee))
			.await,
		Err(LedgerError::InvalidRequest(_))
	));
	assert!(matches!(
		adapter
			.perform_withdraw(
				WithdrawalRequest::new(OUTSIDER, dec!(1))
					.from_sender(USER)
					.with_options(memo("m"))
			)
			.await,
		Err(LedgerError::Unauthorized(_))
	));
}

#[tokio::test]
async fn test_generate_account_rules() {
	let (_dir, storage) = temp_storage();
	let mut client = MockEosioClient::new();
	client
		.expect_account()
		.withf(|name| name == "takenname11")
		.returning(|name| Ok(json!({ "account_name": name })));
	client.expect_create_key().never();

	let adapter = EosioAdapter::new("eos", Arc::new(client), settings(), vec![], context("eos", false, &storage));

	assert!(matches!(
		adapter.generate_account(GenerateAccountParams::default()).await,
		Err(LedgerError::InvalidRequest(_))
	));
	assert!(matches!(
		adapter
			.generate_account(GenerateAccountParams {
				name: Some("takenname11".to_string()),
				password: None,
			})
			.await,
		Err(LedgerError::Conflict(_))
	));

	let mut no_resources = settings();
	no_resources.new_account = None;
	let adapter = EosioAdapter::new(
		"eos",
		Arc::new(MockEosioClient::new()),
		no_resources,
		vec![],
		context("eos", false, &storage),
	);
	assert!(matches!(
		adapter
			.generate_account(GenerateAccountParams {
				name: Some("newaccount11".to_string()),
				password: None,
			})
			.await,
		Err(LedgerError::Unavailable(_))
	));
}

#[tokio::test]
async fn test_generate_account_creates_and_stores() {
	let (_dir, storage) = temp_storage();
	let mut client = MockEosioClient::new();
	client
		.expect_account()
		.returning(|name| Err(LedgerError::NotFound(format!("unknown key {}", name))));
	client
		.expect_create_key()
		.returning(|_| Ok("EOS7newkey".to_string()));
	client
		.expect_push_actions()
		.withf(|actions, keys, _| {
			let names: Vec<&str> = actions.iter().map(|a| a.name.as_str()).collect();
			names == vec!["newaccount", "buyrambytes", "delegatebw"]
				&& actions[0].data["name"] == USER
				&& actions[1].data["bytes"] == 4096
				&& keys.is_empty()
		})
		.returning(|_, _, _| Ok(pushed("CREATE1")));

	let adapter = EosioAdapter::new("eos", Arc::new(client), settings(), vec![], context("eos", false, &storage));
	let account = adapter
		.generate_account(GenerateAccountParams {
			name: Some(USER.to_string()),
			password: None,
		})
		.await
		.unwrap();

	assert_eq!(account.address, USER);
	assert_eq!(
		account.extra,
		Some(json!({ "public_key": "EOS7newkey", "txid": "CREATE1" }))
	);
	assert!(storage.get_account("eos", USER).await.unwrap().is_some());
	assert_eq!(
		adapter.list_accounts().await.unwrap(),
		vec![MAIN.to_string(), USER.to_string()]
	);
}

#[tokio::test]
async fn test_transaction_confirmations_follow_irreversible_block() {
	let (_dir, storage) = temp_storage();
	let mut client = MockEosioClient::new();
	client.expect_transaction().returning(|id| {
		Ok(serde_json::from_value::<EosioTransaction>(json!({
			"id": id,
			"block_num": 40,
			"trx": {
				"receipt": {"status": "executed"},
				"trx": {"actions": [{
					"account": "eosio.token",
					"name": "transfer",
					"authorization": [{"actor": OUTSIDER, "permission": "active"}],
					"data": {"from": OUTSIDER, "to": MAIN, "quantity": "3.2500 EOS", "memo": "deposit"}
				}]}
			}
		}))
		.unwrap())
	});
	client.expect_info().returning(|| Ok(info(50)));

	let adapter = EosioAdapter::new("eos", Arc::new(client), settings(), vec![], context("eos", false, &storage));
	let tx = adapter.get_transaction("EOSTX2").await.unwrap();

	assert_eq!(tx.category, TransactionCategory::Receive);
	assert_eq!(tx.amount, dec!(3.25));
	assert_eq!(tx.confirmations, Some(10));
	assert_eq!(tx.extra, Some(json!({ "memo": "deposit" })));
}

#[tokio::test]
async fn test_scan_walks_history_and_deduplicates() {
	let (_dir, storage) = temp_storage();
	let mut client = MockEosioClient::new();
	client
		.expect_actions()
		.withf(|account, pos, offset| account == MAIN && *pos == -1 && *offset == -99)
		.times(1)
		.returning(|_, _, _| {
			Ok(serde_json::from_value::<EosioActions>(json!({
				"actions": [
					transfer_trace(3, 10, "OLD", OUTSIDER, MAIN, "1.0000 EOS"),
					transfer_trace(4, 25, "INTERNAL", MAIN, USER, "2.0000 EOS"),
					transfer_trace(5, 30, "DEPOSIT", OUTSIDER, MAIN, "4.0000 EOS"),
					transfer_trace(6, 31, "OTHERSYM", OUTSIDER, MAIN, "4.0000 XYZ"),
					transfer_trace(7, 45, "TOONEW", OUTSIDER, MAIN, "4.0000 EOS")
				]
			}))
			.unwrap())
		});
	client
		.expect_actions()
		.withf(|account, pos, _| account == USER && *pos == -1)
		.times(1)
		.returning(|_, _, _| {
			Ok(serde_json::from_value::<EosioActions>(json!({
				"actions": [
					transfer_trace(1, 5, "FIRST", OUTSIDER, USER, "1.0000 EOS"),
					transfer_trace(2, 25, "INTERNAL", MAIN, USER, "2.0000 EOS")
				]
			}))
			.unwrap())
		});

	let mut settings = settings();
	settings.owned_accounts = vec![MAIN.to_string(), USER.to_string()];
	let adapter = EosioAdapter::new("eos", Arc::new(client), settings, vec![], context("eos", true, &storage));
	let accounts = adapter.managed_accounts().await.unwrap();

	match adapter.scan(20, 40, &accounts).await.unwrap() {
		ChangeSet::Accounts(found) => {
			let ids: Vec<&str> = found.iter().map(|tx| tx.txid.as_str()).collect();
			assert_eq!(ids, vec!["INTERNAL", "DEPOSIT"]);
			assert_eq!(found[1].amount, dec!(4));
			assert_eq!(found[1].block_number, Some(30));
		}
		other => panic!("unexpected {:?}", other),
	}
}

#[tokio::test]
async fn test_token_balance_uses_token_pair() {
	let (_dir, storage) = temp_storage();
	let mut client = MockEosioClient::new();
	client
		.expect_currency_balance()
		.withf(|contract, account, symbol| {
			contract == "tethertether" && account == MAIN && symbol == "USDT"
		})
		.returning(|_, _, _| Ok(vec!["12.5000 USDT".to_string()]));

	let token = TokenConfig {
		route: "usdt-eos".to_string(),
		name: None,
		contract: "tethertether".to_string(),
		symbol: Some("USDT".to_string()),
		decimals: Some(4),
	};
	let parent = Arc::new(EosioAdapter::new(
		"eos",
		Arc::new(client),
		settings(),
		vec![token.clone()],
		context("eos", false, &storage),
	));
	let usdt = EosioTokenAdapter::new(parent, token).unwrap();

	assert_eq!(usdt.route(), "usdt-eos");
	assert_eq!(usdt.get_account_balance(MAIN).await.unwrap().balance, dec!(12.5));
	assert_eq!(usdt.get_global_balance().await.unwrap().balance, dec!(12.5));
}
