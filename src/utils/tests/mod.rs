//! Test helper utilities
//!
//! This module contains test helper utilities for the application.
//!
//! - `builders`: Test helper utilities for creating test instances of models

pub mod builders {
	pub mod ledger;
	pub mod transaction;

	pub use ledger::LedgerBuilder;
	pub use transaction::LoggedTransactionBuilder;
}

pub use builders::*;
