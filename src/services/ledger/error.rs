//! Ledger adapter error types.
//!
//! Every adapter operation fails with one of these variants. `Unavailable` means the node could
//! not answer and must never be read as "the transaction does not exist".

use log::{error, warn};
use thiserror::Error;

use crate::services::ledger::transports::TransportError;

#[derive(Debug, Error)]
pub enum LedgerError {
	/// Unknown transaction id or account
	#[error("Not found: {0}")]
	NotFound(String),

	/// The node is unreachable or still syncing
	#[error("Ledger unavailable: {0}")]
	Unavailable(String),

	#[error("Invalid request: {0}")]
	InvalidRequest(String),

	#[error("Insufficient funds: {0}")]
	InsufficientFunds(String),

	/// A signing credential is missing
	#[error("Unauthorized: {0}")]
	Unauthorized(String),

	#[error("Conflict: {0}")]
	Conflict(String),

	/// Failure after the transaction was handed to the network
	#[error("Broadcast of {txid} failed: {reason}")]
	Broadcast { txid: String, reason: String },

	#[error("Internal error: {0}")]
	Internal(String),
}

impl LedgerError {
	pub fn not_found(msg: impl Into<String>) -> Self {
		let error = Self::NotFound(msg.into());
		warn!("{}", error);
		error
	}

	pub fn unavailable(msg: impl Into<String>) -> Self {
		let error = Self::Unavailable(msg.into());
		error!("{}", error);
		error
	}

	pub fn invalid_request(msg: impl Into<String>) -> Self {
		let error = Self::InvalidRequest(msg.into());
		warn!("{}", error);
		error
	}

	pub fn insufficient_funds(msg: impl Into<String>) -> Self {
		let error = Self::InsufficientFunds(msg.into());
		warn!("{}", error);
		error
	}

	pub fn unauthorized(msg: impl Into<String>) -> Self {
		let error = Self::Unauthorized(msg.into());
		error!("{}", error);
		error
	}

	pub fn conflict(msg: impl Into<String>) -> Self {
		let error = Self::Conflict(msg.into());
		warn!("{}", error);
		error
	}

	pub fn broadcast(txid: impl Into<String>, reason: impl Into<String>) -> Self {
		let error = Self::Broadcast {
			txid: txid.into(),
			reason: reason.into(),
		};
		error!("{}", error);
		error
	}

	pub fn internal(msg: impl Into<String>) -> Self {
		let error = Self::Internal(msg.into());
		error!("{}", error);
		error
	}

	/// Txid of a transaction that may already be on-chain
	pub fn broadcast_txid(&self) -> Option<&str> {
		match self {
			Self::Broadcast { txid, .. } => Some(txid),
			_ => None,
		}
	}
}

impl From<TransportError> for LedgerError {
	fn from(err: TransportError) -> Self {
		match err {
			TransportError::Rpc { code, message } => {
				Self::invalid_request(format!("Node rejected request ({}): {}", code, message))
			}
			TransportError::ResponseParse(msg) | TransportError::RequestSerialization(msg) => {
				Self::internal(msg)
			}
			other => Self::unavailable(other.to_string()),
		}
	}
}

impl From<serde_json::Error> for LedgerError {
	fn from(err: serde_json::Error) -> Self {
		Self::internal(format!("Unexpected response shape: {}", err))
	}
}

impl From<anyhow::Error> for LedgerError {
	fn from(err: anyhow::Error) -> Self {
		Self::internal(format!("Storage failure: {:#}", err))
	}
}
