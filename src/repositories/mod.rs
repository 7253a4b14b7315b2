//! Configuration repositories.

mod error;
mod ledger;

pub use error::RepositoryError;
pub use ledger::{LedgerRepository, LedgerRepositoryTrait, LedgerService};
