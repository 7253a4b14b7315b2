use std::sync::Arc;

use crate::integration::mocks::{context, temp_storage, MockEvmClient};
use wallet_gateway::{
	bootstrap::{create_dispatcher, create_watch, initialize_gateway, mount_ledgers, GatewayStorage},
	models::{Asset, Ledger, LedgerSettings},
	services::{
		ledger::{AdapterRegistry, EvmAdapter, WalletAdapter},
		observer::FileLedgerStorage,
	},
	utils::tests::builders::LedgerBuilder,
};

const USDT: &str = "0xdAC17F958D2ee523a2206206994597C13D831ec7";

fn evm_adapter(ledger: &Ledger, storage: &Arc<FileLedgerStorage>) -> WalletAdapter {
	let LedgerSettings::Evm(settings) = ledger.settings.clone() else {
		panic!("expected evm settings");
	};
	let adapter = EvmAdapter::new(
		&ledger.slug,
		Arc::new(MockEvmClient::new()),
		settings,
		ledger.tokens.clone(),
		context(&ledger.slug, ledger.explorer, storage),
	);
	WalletAdapter::Evm(Arc::new(adapter))
}

#[tokio::test]
async fn test_watch_covers_parent_and_tokens() {
	let (_dir, storage) = temp_storage();
	let ledger = LedgerBuilder::evm("eth")
		.observer("*/10 * * * * *")
		.confirmation_blocks(12)
		.start_height(100)
		.callback("http://callback.local/notify")
		.token("usdt", USDT, None)
		.build();
	let parent = evm_adapter(&ledger, &storage);
	let registry = AdapterRegistry::new();
	let auxiliaries = registry.mount(parent.clone()).await.unwrap();

	let watch = create_watch(&ledger, &parent, &auxiliaries)
		.unwrap()
		.expect("observer configured");

	assert_eq!(watch.slug, "eth");
	assert_eq!(watch.cron_schedule, "*/10 * * * * *");
	assert_eq!(watch.confirmation_blocks, 12);
	assert_eq!(watch.start_height, Some(100));
	assert!(watch.dispatcher.is_some());
	assert_eq!(
		watch.routes,
		vec![
			("eth".to_string(), Asset::Native),
			("usdt".to_string(), Asset::contract(USDT)),
		]
	);
}

#[tokio::test]
async fn test_no_watch_without_enabled_observer() {
	let (_dir, storage) = temp_storage();
	let ledger = LedgerBuilder::evm("eth").build();
	let parent = evm_adapter(&ledger, &storage);
	assert!(create_watch(&ledger, &parent, &[]).unwrap().is_none());

	let mut ledger = LedgerBuilder::evm("eth").observer("0 * * * * *").build();
	if let Some(observer) = ledger.observer.as_mut() {
		observer.enabled = false;
	}
	let parent = evm_adapter(&ledger, &storage);
	assert!(create_watch(&ledger, &parent, &[]).unwrap().is_none());
}

#[tokio::test]
async fn test_watch_without_callback_has_no_dispatcher() {
	let (_dir, storage) = temp_storage();
	let ledger = LedgerBuilder::evm("eth").observer("0 * * * * *").build();
	let parent = evm_adapter(&ledger, &storage);

	let watch = create_watch(&ledger, &parent, &[]).unwrap().unwrap();
	assert!(watch.dispatcher.is_none());
	assert!(create_dispatcher(&ledger).unwrap().is_none());
}

#[tokio::test]
async fn test_unreachable_ledger_is_skipped() {
	let (_dir, storage) = temp_storage();
	let ledger = LedgerBuilder::evm("eth")
		.rpc_url("http://127.0.0.1:9")
		.observer("0 * * * * *")
		.build();
	let registry = AdapterRegistry::new();

	let watches = mount_ledgers(&[ledger], &GatewayStorage::shared(storage), &registry)
		.await
		.unwrap();

	assert!(watches.is_empty());
	assert!(registry.routes().await.is_empty());
}

#[tokio::test]
async fn test_gateway_with_no_ledgers_starts_and_stops() {
	let (_dir, storage) = temp_storage();
	let gateway = initialize_gateway(&[], GatewayStorage::shared(storage))
		.await
		.unwrap();

	assert!(gateway.registry.routes().await.is_empty());
	gateway.shutdown().await;
}
