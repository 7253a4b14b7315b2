//! Bootstrap module for wiring ledgers into running services.
//!
//! Startup happens in three steps:
//! - `initialize_ledgers`: loads and validates the ledger configuration
//! - `mount_ledgers`: connects to each node, mounts the parent adapter and its auxiliary
//!   currencies into the [`AdapterRegistry`] and describes the observer loop it needs
//! - `initialize_gateway`: runs adapter initialization and schedules the observers
//!
//! A ledger whose node cannot be reached is logged and left out, so one dead node does not
//! keep the other ledgers from being served.

use std::{error::Error, path::Path, sync::Arc};

use crate::{
	models::Ledger,
	repositories::{LedgerRepository, LedgerService},
	services::{
		callback::{CallbackDispatcher, CallbackDispatcherTrait, CallbackError},
		ledger::{create_wallet_adapter, AdapterContext, AdapterRegistry, WalletAdapter},
		observer::{AccountStore, CursorStorage, LedgerWatch, ObserverService, TransactionLog},
	},
};

/// Type alias for handling ServiceResult
pub type Result<T> = std::result::Result<T, Box<dyn Error>>;

/// Durable state shared by every ledger, namespaced by slug
#[derive(Clone)]
pub struct GatewayStorage {
	pub cursor: Arc<dyn CursorStorage>,
	pub log: Arc<dyn TransactionLog>,
	pub accounts: Arc<dyn AccountStore>,
}

impl GatewayStorage {
	/// Uses one store for cursors, the log and generated accounts
	pub fn shared<S>(store: Arc<S>) -> Self
	where
		S: CursorStorage + TransactionLog + AccountStore + 'static,
	{
		Self {
			cursor: store.clone(),
			log: store.clone(),
			accounts: store,
		}
	}
}

/// Running gateway: route lookup plus the scheduled observers
pub struct Gateway {
	pub registry: AdapterRegistry,
	pub observer: ObserverService,
}

impl Gateway {
	/// Stops the observers, then lets every adapter release its resources
	pub async fn shutdown(&self) {
		if let Err(e) = self.observer.stop().await {
			log::error!("Failed to stop observers: {}", e);
		}
		self.registry.destroy_all().await;
	}
}

/// Loads every configured ledger, ordered by slug
pub fn initialize_ledgers(config_path: Option<&Path>) -> Result<Vec<Ledger>> {
	let service = LedgerService::<LedgerRepository>::new(config_path)?;
	Ok(service.get_all())
}

/// Dispatcher for a ledger, None when its callbacks are disabled
pub fn create_dispatcher(
	ledger: &Ledger,
) -> std::result::Result<Option<Arc<dyn CallbackDispatcherTrait>>, CallbackError> {
	let Some(base_uri) = ledger.callback_uri() else {
		return Ok(None);
	};
	let timeout_ms = ledger.callback.as_ref().and_then(|c| c.timeout_ms);
	let dispatcher = CallbackDispatcher::new(base_uri, timeout_ms)?;
	Ok(Some(Arc::new(dispatcher)))
}

/// Observer loop of a mounted ledger, None when it has no observer
pub fn create_watch(
	ledger: &Ledger,
	parent: &WalletAdapter,
	auxiliaries: &[WalletAdapter],
) -> std::result::Result<Option<LedgerWatch>, CallbackError> {
	let Some(observer) = ledger.observer.as_ref().filter(|o| o.enabled) else {
		return Ok(None);
	};
	let Some(source) = parent.change_source() else {
		log::warn!(
			"{} has an observer configured but its ledger type cannot be observed",
			ledger.slug
		);
		return Ok(None);
	};

	let routes = std::iter::once(parent)
		.chain(auxiliaries)
		.map(|adapter| (adapter.route().to_string(), adapter.asset()))
		.collect();

	Ok(Some(LedgerWatch {
		slug: ledger.slug.clone(),
		cron_schedule: observer.cron_schedule.clone(),
		source,
		routes,
		confirmation_blocks: observer.confirmation_blocks,
		start_height: observer.start_height,
		dispatcher: create_dispatcher(ledger)?,
	}))
}

/// Connects every ledger and mounts its adapters
///
/// Returns the observer loops of the ledgers that were mounted.
pub async fn mount_ledgers(
	ledgers: &[Ledger],
	storage: &GatewayStorage,
	registry: &AdapterRegistry,
) -> Result<Vec<LedgerWatch>> {
	let mut watches = Vec::new();

	for ledger in ledgers {
		let ctx = AdapterContext::new(
			ledger.slug.clone(),
			ledger.explorer,
			storage.log.clone(),
			storage.accounts.clone(),
		);
		let parent = match create_wallet_adapter(ledger, ctx).await {
			Ok(adapter) => adapter,
			Err(e) => {
				log::error!("Skipping ledger {}: {}", ledger.slug, e);
				continue;
			}
		};

		let auxiliaries = registry.mount(parent.clone()).await?;
		log::info!(
			"Mounted {} with {} auxiliary currencies",
			ledger.slug,
			auxiliaries.len()
		);

		if let Some(watch) = create_watch(ledger, &parent, &auxiliaries)? {
			watches.push(watch);
		}
	}

	Ok(watches)
}

/// Mounts every ledger, initializes the adapters and starts the observers
pub async fn initialize_gateway(ledgers: &[Ledger], storage: GatewayStorage) -> Result<Gateway> {
	let registry = AdapterRegistry::new();
	let watches = mount_ledgers(ledgers, &storage, &registry).await?;
	registry.init_all().await?;

	let observer = ObserverService::new(storage.cursor.clone(), storage.log.clone());
	observer.start(watches).await?;

	Ok(Gateway { registry, observer })
}
