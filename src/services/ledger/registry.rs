//! Route lookup over mounted adapters.
//!
//! Adapters are mounted once at startup: each parent chain adapter followed by the
//! auxiliary currencies it exposes. Lookups afterwards only take the read lock.

use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

use crate::services::ledger::{LedgerError, WalletAdapter};

/// Mounted adapters keyed by route
#[derive(Clone, Default)]
pub struct AdapterRegistry {
	adapters: Arc<RwLock<HashMap<String, WalletAdapter>>>,
}

impl AdapterRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds one adapter under its route
	pub async fn register(&self, adapter: WalletAdapter) -> Result<(), LedgerError> {
		let route = adapter.route().to_string();
		let mut adapters = self.adapters.write().await;
		if adapters.contains_key(&route) {
			return Err(LedgerError::conflict(format!(
				"Route {} is already mounted",
				route
			)));
		}
		adapters.insert(route, adapter);
		Ok(())
	}

	/// Registers a parent adapter and every auxiliary currency it exposes
	///
	/// Returns the auxiliary adapters that were mounted.
	pub async fn mount(&self, parent: WalletAdapter) -> Result<Vec<WalletAdapter>, LedgerError> {
		let auxiliaries = parent.list_auxiliary_currencies().unwrap_or_default();
		self.register(parent).await?;
		for auxiliary in &auxiliaries {
			self.register(auxiliary.clone()).await?;
		}
		Ok(auxiliaries)
	}

	pub async fn resolve(&self, route: &str) -> Result<WalletAdapter, LedgerError> {
		self.adapters
			.read()
			.await
			.get(route)
			.cloned()
			.ok_or_else(|| LedgerError::not_found(format!("Unknown currency {}", route)))
	}

	/// Mounted routes in alphabetical order
	pub async fn routes(&self) -> Vec<String> {
		let mut routes: Vec<String> = self.adapters.read().await.keys().cloned().collect();
		routes.sort();
		routes
	}

	async fn snapshot(&self) -> Vec<WalletAdapter> {
		let adapters = self.adapters.read().await;
		let mut snapshot: Vec<WalletAdapter> = adapters.values().cloned().collect();
		snapshot.sort_by(|a, b| a.route().cmp(b.route()));
		snapshot
	}

	/// Runs `on_init` on every adapter, stopping at the first failure
	pub async fn init_all(&self) -> Result<(), LedgerError> {
		for adapter in self.snapshot().await {
			adapter.inner().on_init().await.map_err(|e| {
				log::error!("Failed to initialize {}: {}", adapter.route(), e);
				e
			})?;
		}
		Ok(())
	}

	/// Runs `on_destroy` on every adapter in reverse route order, logging failures
	pub async fn destroy_all(&self) {
		for adapter in self.snapshot().await.iter().rev() {
			if let Err(e) = adapter.inner().on_destroy().await {
				log::warn!("Failed to shut down {}: {}", adapter.route(), e);
			}
		}
	}
}
