use rust_decimal_macros::dec;
use std::{collections::HashSet, sync::Arc, time::Duration};

use crate::integration::mocks::{temp_storage, MockChangeSource};
use wallet_gateway::{
	models::Asset,
	services::{
		callback::{CallbackDispatcher, CallbackDispatcherTrait},
		observer::{process_ledger_changes, ChangeSet, CursorStorage, LedgerWatch, ObservedBlock},
	},
	utils::tests::builders::LoggedTransactionBuilder,
};

async fn settle() {
	tokio::time::sleep(Duration::from_millis(300)).await;
}

#[tokio::test]
async fn test_dispatch_sends_get_under_base_path() {
	let mut server = mockito::Server::new_async().await;
	let mock = server
		.mock("GET", "/hooks/xrp/ABC123")
		.with_status(204)
		.expect(1)
		.create_async()
		.await;

	let dispatcher = CallbackDispatcher::new(&format!("{}/hooks", server.url()), None).unwrap();
	dispatcher.dispatch("xrp", "ABC123");
	settle().await;

	mock.assert_async().await;
}

#[tokio::test]
async fn test_failed_delivery_is_not_retried() {
	let mut server = mockito::Server::new_async().await;
	let mock = server
		.mock("GET", "/eth/0xdead")
		.with_status(503)
		.expect(1)
		.create_async()
		.await;

	let dispatcher = CallbackDispatcher::new(&server.url(), Some(500)).unwrap();
	dispatcher.dispatch("eth", "0xdead");
	settle().await;

	mock.assert_async().await;
}

#[tokio::test]
async fn test_unreachable_receiver_is_swallowed() {
	let dispatcher = CallbackDispatcher::new("http://127.0.0.1:1", Some(200)).unwrap();
	dispatcher.dispatch("eth", "0x1");
	settle().await;
}

#[tokio::test]
async fn test_observer_cycle_notifies_receiver() {
	let mut server = mockito::Server::new_async().await;
	let native = server
		.mock("GET", "/trx/native-deposit")
		.with_status(200)
		.expect(1)
		.create_async()
		.await;
	let token = server
		.mock("GET", "/btt/token-deposit")
		.with_status(200)
		.expect(1)
		.create_async()
		.await;

	let (_dir, storage) = temp_storage();
	storage.save_last_observed_height("trx", 9).await.unwrap();

	let mut source = MockChangeSource::new();
	source.expect_current_height().returning(|| Ok(10));
	source
		.expect_managed_accounts()
		.returning(|| Ok(HashSet::from(["tmain".to_string()])));
	source.expect_scan().returning(|_, _, _| {
		Ok(ChangeSet::Blocks(vec![ObservedBlock {
			height: 10,
			transactions: vec![
				LoggedTransactionBuilder::new("native-deposit")
					.from("TSomeone")
					.to("TMain")
					.amount(dec!(12))
					.build(),
				LoggedTransactionBuilder::new("token-deposit")
					.from("TSomeone")
					.to("TMain")
					.amount(dec!(3))
					.asset(Asset::Token("1002000".to_string()))
					.build(),
			],
		}]))
	});

	let dispatcher = CallbackDispatcher::new(&server.url(), None).unwrap();
	let watch = LedgerWatch {
		slug: "trx".to_string(),
		cron_schedule: "0 * * * * *".to_string(),
		source: Arc::new(source),
		routes: vec![
			("trx".to_string(), Asset::Native),
			("btt".to_string(), Asset::Token("1002000".to_string())),
		],
		confirmation_blocks: 0,
		start_height: None,
		dispatcher: Some(Arc::new(dispatcher)),
	};

	let events = process_ledger_changes(&watch, storage.as_ref(), storage.as_ref())
		.await
		.unwrap();
	assert_eq!(events, 2);
	settle().await;

	native.assert_async().await;
	token.assert_async().await;
}
