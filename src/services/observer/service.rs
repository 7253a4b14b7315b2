//! Scheduled observer loops, one cron job per ledger.

use log::{error, info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::services::observer::{
	process_ledger_changes, prune_pending, CursorStorage, LedgerWatch, ObserverError,
	TransactionLog,
};

pub struct ObserverService {
	cursor: Arc<dyn CursorStorage>,
	log: Arc<dyn TransactionLog>,
	scheduler: Mutex<Option<JobScheduler>>,
}

impl ObserverService {
	pub fn new(cursor: Arc<dyn CursorStorage>, log: Arc<dyn TransactionLog>) -> Self {
		ObserverService {
			cursor,
			log,
			scheduler: Mutex::new(None),
		}
	}

	pub async fn start(&self, watches: Vec<LedgerWatch>) -> Result<(), ObserverError> {
		if watches.is_empty() {
			info!("No observed ledgers, change observer will not start");
			return Ok(());
		}

		info!("Scheduling change observers for {} ledgers", watches.len());

		let scheduler = JobScheduler::new().await.map_err(|e| {
			ObserverError::scheduler_error(format!("Failed to create scheduler: {}", e))
		})?;

		let pruned = futures::future::join_all(
			watches
				.iter()
				.map(|watch| prune_pending(watch, self.log.as_ref())),
		)
		.await;
		for (watch, result) in watches.iter().zip(pruned) {
			if let Err(e) = result {
				warn!("Skipping pending cleanup for {}: {}", watch.slug, e);
			}
		}

		for watch in watches {
			self.schedule_ledger_observer(&scheduler, watch).await?;
		}

		scheduler.start().await.map_err(|e| {
			ObserverError::scheduler_error(format!("Failed to start scheduler: {}", e))
		})?;

		*self.scheduler.lock().await = Some(scheduler);
		info!("Change observer started successfully");
		Ok(())
	}

	pub async fn stop(&self) -> Result<(), ObserverError> {
		if let Some(mut scheduler) = self.scheduler.lock().await.take() {
			scheduler.shutdown().await.map_err(|e| {
				ObserverError::scheduler_error(format!("Failed to stop scheduler: {}", e))
			})?;
			info!("Change observer stopped");
		}
		Ok(())
	}

	async fn schedule_ledger_observer(
		&self,
		scheduler: &JobScheduler,
		watch: LedgerWatch,
	) -> Result<(), ObserverError> {
		let slug = watch.slug.clone();
		let cron_schedule = watch.cron_schedule.clone();
		let watch = Arc::new(watch);
		let cursor = self.cursor.clone();
		let log = self.log.clone();
		let in_flight = Arc::new(Mutex::new(()));

		let job = Job::new_async(cron_schedule.as_str(), move |_uuid, _l| {
			let watch = watch.clone();
			let cursor = cursor.clone();
			let log = log.clone();
			let in_flight = in_flight.clone();

			Box::pin(async move {
				let Ok(_guard) = in_flight.try_lock() else {
					warn!("Previous cycle for {} still running, skipping tick", watch.slug);
					return;
				};
				match process_ledger_changes(&watch, cursor.as_ref(), log.as_ref()).await {
					Ok(events) => info!(
						"Observed ledger {}: {} new deposit events",
						watch.slug, events
					),
					Err(e) => error!("Error observing ledger {}: {}", watch.slug, e),
				}
			})
		})
		.map_err(|e| ObserverError::scheduler_error(format!("Failed to create job: {}", e)))?;

		scheduler
			.add(job)
			.await
			.map_err(|e| ObserverError::scheduler_error(format!("Failed to add job: {}", e)))?;

		info!("Scheduled change observer for ledger: {}", slug);
		Ok(())
	}
}
