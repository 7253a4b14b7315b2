//! Change observer error types.
//!
//! Every constructor logs the error once, at the point it is raised, so callers that only
//! skip a cycle do not need to log again.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObserverError {
	/// A cron job could not be created, started or stopped
	#[error("Scheduler error: {0}")]
	Scheduler(String),
	/// The ledger node could not report its height, accounts or changes
	#[error("Ledger source error: {0}")]
	Source(String),
	/// Cursor or transaction log could not be read or written
	#[error("Storage error: {0}")]
	Storage(String),
}

impl ObserverError {
	fn logged(self) -> Self {
		log::error!("{}", self);
		self
	}

	pub fn scheduler_error(msg: impl Into<String>) -> Self {
		Self::Scheduler(msg.into()).logged()
	}

	pub fn source_error(msg: impl Into<String>) -> Self {
		Self::Source(msg.into()).logged()
	}

	pub fn storage_error(msg: impl Into<String>) -> Self {
		Self::Storage(msg.into()).logged()
	}
}
