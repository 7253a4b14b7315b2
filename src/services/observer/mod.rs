//! Change observer.
//!
//! A cron-scheduled loop per ledger walks new heights, keeps the seen-transaction log in
//! step with the chain (replacing reorganized blocks) and emits one callback per newly
//! confirmed deposit. Tokens mounted on a ledger share its loop.

mod error;
mod reconcile;
mod service;
mod source;
mod storage;

pub use error::ObserverError;
pub use reconcile::{process_ledger_changes, prune_pending, resolve_pending, LedgerWatch};
pub use service::ObserverService;
pub use source::{ChangeSet, ChangeSource, ObservedBlock};
pub use storage::{AccountStore, CursorStorage, FileLedgerStorage, TransactionLog};
