use std::{sync::Arc, time::Duration};

use crate::integration::mocks::{temp_storage, MockChangeSource};
use wallet_gateway::{
	models::Asset,
	services::observer::{CursorStorage, LedgerWatch, ObserverError, ObserverService},
};

fn watch(source: MockChangeSource, cron_schedule: &str) -> LedgerWatch {
	LedgerWatch {
		slug: "xrp".to_string(),
		cron_schedule: cron_schedule.to_string(),
		source: Arc::new(source),
		routes: vec![("xrp".to_string(), Asset::Native)],
		confirmation_blocks: 0,
		start_height: None,
		dispatcher: None,
	}
}

#[tokio::test(flavor = "multi_thread")]
async fn test_start_without_watches_is_a_noop() {
	let (_dir, storage) = temp_storage();
	let service = ObserverService::new(storage.clone(), storage.clone());

	assert!(service.start(Vec::new()).await.is_ok());
	assert!(service.stop().await.is_ok());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_invalid_cron_schedule_fails_to_schedule() {
	let (_dir, storage) = temp_storage();
	let service = ObserverService::new(storage.clone(), storage.clone());

	let source = MockChangeSource::new();
	let result = service.start(vec![watch(source, "every minute")]).await;
	assert!(matches!(result, Err(ObserverError::Scheduler(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_scheduled_cycle_stores_cursor() {
	let (_dir, storage) = temp_storage();
	let service = ObserverService::new(storage.clone(), storage.clone());

	let mut source = MockChangeSource::new();
	source.expect_current_height().returning(|| Ok(77));
	source.expect_transaction_height().never();

	service
		.start(vec![watch(source, "* * * * * *")])
		.await
		.unwrap();
	tokio::time::sleep(Duration::from_millis(2500)).await;
	service.stop().await.unwrap();

	assert_eq!(
		storage.get_last_observed_height("xrp").await.unwrap(),
		Some(77)
	);
}
