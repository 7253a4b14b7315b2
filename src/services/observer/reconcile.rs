//! One observer cycle.

use log::{debug, info, warn};
use std::{collections::HashSet, sync::Arc};

use crate::{
	models::{Asset, LoggedTransaction},
	services::{
		callback::CallbackDispatcherTrait,
		ledger::LedgerError,
		observer::{ChangeSet, ChangeSource, CursorStorage, ObserverError, TransactionLog},
	},
};

/// Everything the observer knows about one ledger
#[derive(Clone)]
pub struct LedgerWatch {
	pub slug: String,
	pub cron_schedule: String,
	pub source: Arc<dyn ChangeSource>,
	/// Mounted routes and the asset each one is notified for
	pub routes: Vec<(String, Asset)>,
	pub confirmation_blocks: u64,
	/// Height stored when no cursor exists yet, the current height otherwise
	pub start_height: Option<u64>,
	/// None when callbacks are disabled for the ledger
	pub dispatcher: Option<Arc<dyn CallbackDispatcherTrait>>,
}

impl LedgerWatch {
	fn route_for(&self, asset: &Asset) -> Option<&str> {
		self.routes
			.iter()
			.find(|(_, candidate)| candidate == asset)
			.map(|(route, _)| route.as_str())
	}
}

/// Runs one reconciliation cycle and returns the number of deposit events found
///
/// The cursor only moves once the log is up to date, so a failed cycle is retried from
/// the same height on the next tick.
pub async fn process_ledger_changes(
	watch: &LedgerWatch,
	cursor: &dyn CursorStorage,
	log: &dyn TransactionLog,
) -> Result<usize, ObserverError> {
	let latest = watch.source.current_height().await.map_err(|e| {
		ObserverError::source_error(format!("Failed to get current height: {}", e))
	})?;
	let target = latest.saturating_sub(watch.confirmation_blocks);

	let last_observed = cursor
		.get_last_observed_height(&watch.slug)
		.await
		.map_err(|e| {
			ObserverError::storage_error(format!("Failed to get last observed height: {:#}", e))
		})?;

	let Some(last_observed) = last_observed else {
		let start = watch.start_height.unwrap_or(target);
		info!("No cursor for {}, starting at height {}", watch.slug, start);
		save_cursor(cursor, &watch.slug, start).await?;
		return Ok(0);
	};

	if target <= last_observed {
		debug!(
			"Nothing to observe for {} (cursor {}, confirmed height {})",
			watch.slug, last_observed, target
		);
		return Ok(0);
	}

	info!(
		"Observing {} from {} to {} (waiting {} confirmations)",
		watch.slug,
		last_observed + 1,
		target,
		watch.confirmation_blocks
	);

	let accounts = watch.source.managed_accounts().await.map_err(|e| {
		ObserverError::source_error(format!("Failed to load managed accounts: {}", e))
	})?;
	let changes = watch
		.source
		.scan(last_observed, target, &accounts)
		.await
		.map_err(|e| {
			ObserverError::source_error(format!(
				"Failed to scan {}..={}: {}",
				last_observed + 1,
				target,
				e
			))
		})?;

	let candidates = record_changes(&watch.slug, log, changes).await?;
	let dispatched = dispatch_events(watch, &accounts, candidates);

	save_cursor(cursor, &watch.slug, target).await?;
	Ok(dispatched)
}

/// Writes a change set to the log and returns the transactions that are new
///
/// Newness is judged only by the `observed` flag. Withdrawals and read paths may log or
/// confirm a record earlier, but only a cycle marks it observed.
async fn record_changes(
	slug: &str,
	log: &dyn TransactionLog,
	changes: ChangeSet,
) -> Result<Vec<LoggedTransaction>, ObserverError> {
	let mut fresh = Vec::new();

	match changes {
		ChangeSet::Blocks(mut blocks) => {
			blocks.sort_by_key(|block| block.height);
			for mut block in blocks {
				for transaction in block.transactions.iter_mut() {
					transaction.observed = true;
				}
				log.replace_block(slug, block.height, block.transactions.clone())
					.await
					.map_err(|e| {
						ObserverError::storage_error(format!(
							"Failed to log block {}: {:#}",
							block.height, e
						))
					})?;
				fresh.extend(block.transactions);
			}
		}
		ChangeSet::Accounts(transactions) => {
			for mut transaction in transactions {
				let known = log.get(slug, &transaction.txid).await.map_err(|e| {
					ObserverError::storage_error(format!("Failed to read log: {:#}", e))
				})?;
				if known.is_some_and(|tx| tx.observed) {
					continue;
				}
				transaction.observed = true;
				log.upsert(slug, transaction.clone()).await.map_err(|e| {
					ObserverError::storage_error(format!(
						"Failed to log {}: {:#}",
						transaction.txid, e
					))
				})?;
				fresh.push(transaction);
			}
		}
	}

	Ok(fresh)
}

fn dispatch_events(
	watch: &LedgerWatch,
	accounts: &HashSet<String>,
	candidates: Vec<LoggedTransaction>,
) -> usize {
	let mut sent = HashSet::new();

	for transaction in candidates {
		if transaction.amount.is_zero() || !transaction.touches(accounts) {
			continue;
		}
		let Some(route) = watch.route_for(&transaction.asset) else {
			continue;
		};
		if !sent.insert((route.to_string(), transaction.txid.clone())) {
			continue;
		}
		match &watch.dispatcher {
			Some(dispatcher) => dispatcher.dispatch(route, &transaction.txid),
			None => debug!("Callbacks disabled, not notifying {} {}", route, transaction.txid),
		}
	}

	sent.len()
}

async fn save_cursor(
	cursor: &dyn CursorStorage,
	slug: &str,
	height: u64,
) -> Result<(), ObserverError> {
	cursor
		.save_last_observed_height(slug, height)
		.await
		.map_err(|e| {
			ObserverError::storage_error(format!("Failed to save last observed height: {:#}", e))
		})
}

/// Settles pending records against the node
///
/// Confirmed records get their height, forgotten ones are dropped and the rest are
/// returned unchanged. Failures are logged and leave the record as it was.
pub async fn resolve_pending(
	slug: &str,
	source: &dyn ChangeSource,
	log: &dyn TransactionLog,
	records: Vec<LoggedTransaction>,
) -> Vec<LoggedTransaction> {
	let mut kept = Vec::with_capacity(records.len());

	for mut record in records {
		if record.block_number.is_some() {
			kept.push(record);
			continue;
		}
		match source.transaction_height(&record.txid).await {
			Ok(Some(height)) => {
				if let Err(e) = log.set_block_number(slug, &record.txid, height).await {
					warn!("Failed to confirm {}: {:#}", record.txid, e);
				}
				record.block_number = Some(height);
				kept.push(record);
			}
			Ok(None) => kept.push(record),
			Err(LedgerError::NotFound(_)) => {
				info!("Dropping forgotten transaction {} from {}", record.txid, slug);
				if let Err(e) = log.remove(slug, &record.txid).await {
					warn!("Failed to drop {}: {:#}", record.txid, e);
					kept.push(record);
				}
			}
			Err(e) => {
				warn!("Could not resolve pending {}: {}", record.txid, e);
				kept.push(record);
			}
		}
	}

	kept
}

/// Removes pending records the node no longer knows, run once at startup
pub async fn prune_pending(
	watch: &LedgerWatch,
	log: &dyn TransactionLog,
) -> Result<usize, ObserverError> {
	let pending = log.pending(&watch.slug).await.map_err(|e| {
		ObserverError::storage_error(format!("Failed to read pending transactions: {:#}", e))
	})?;
	let before = pending.len();
	let kept = resolve_pending(&watch.slug, watch.source.as_ref(), log, pending).await;
	let still_pending = kept.iter().filter(|tx| tx.block_number.is_none()).count();
	let settled = before - still_pending;
	if settled > 0 {
		info!("Settled {} pending transactions for {}", settled, watch.slug);
	}
	Ok(settled)
}
