//! Durable observer state.
//!
//! Three stores live behind async traits so the observer and adapters never touch files
//! directly: the cursor (last observed height), the seen-transaction log and generated
//! account records. [`FileLedgerStorage`] implements all three as JSON files namespaced
//! by ledger slug.

use anyhow::Context;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::{
	models::{AccountRecord, Asset, LoggedTransaction, Page},
	utils::constants::DEFAULT_DATA_DIR,
};

#[async_trait]
pub trait CursorStorage: Send + Sync {
	async fn get_last_observed_height(&self, slug: &str) -> Result<Option<u64>, anyhow::Error>;

	async fn save_last_observed_height(&self, slug: &str, height: u64)
		-> Result<(), anyhow::Error>;
}

/// Seen-transaction log, keyed by transaction hash
#[async_trait]
pub trait TransactionLog: Send + Sync {
	/// Replaces everything known about a block
	///
	/// Entries sharing a hash with `transactions` or recorded at `height` are removed before
	/// the new ones are inserted, so replaying a block is idempotent.
	async fn replace_block(
		&self,
		slug: &str,
		height: u64,
		transactions: Vec<LoggedTransaction>,
	) -> Result<(), anyhow::Error>;

	/// Inserts a record, replacing any record with the same hash
	async fn upsert(&self, slug: &str, transaction: LoggedTransaction)
		-> Result<(), anyhow::Error>;

	async fn get(&self, slug: &str, txid: &str) -> Result<Option<LoggedTransaction>, anyhow::Error>;

	/// Records of one asset involving `account`, newest first
	async fn list_for_account(
		&self,
		slug: &str,
		account: &str,
		asset: &Asset,
		page: Page,
	) -> Result<Vec<LoggedTransaction>, anyhow::Error>;

	/// Records not yet seen in a block
	async fn pending(&self, slug: &str) -> Result<Vec<LoggedTransaction>, anyhow::Error>;

	async fn set_block_number(
		&self,
		slug: &str,
		txid: &str,
		height: u64,
	) -> Result<(), anyhow::Error>;

	async fn remove(&self, slug: &str, txid: &str) -> Result<(), anyhow::Error>;
}

#[async_trait]
pub trait AccountStore: Send + Sync {
	async fn save_account(&self, slug: &str, record: AccountRecord) -> Result<(), anyhow::Error>;

	async fn list_accounts(&self, slug: &str) -> Result<Vec<AccountRecord>, anyhow::Error>;

	async fn get_account(
		&self,
		slug: &str,
		address: &str,
	) -> Result<Option<AccountRecord>, anyhow::Error>;
}

/// Pending first, then by height descending, then most recently observed
fn sort_newest_first(records: &mut [LoggedTransaction]) {
	records.sort_by(|a, b| {
		let height = |tx: &LoggedTransaction| tx.block_number.unwrap_or(u64::MAX);
		height(b)
			.cmp(&height(a))
			.then_with(|| b.observed_at.cmp(&a.observed_at))
	});
}

pub struct FileLedgerStorage {
	storage_path: PathBuf,
	// serializes read-modify-write cycles on the JSON files
	lock: Mutex<()>,
}

impl FileLedgerStorage {
	pub fn new() -> Self {
		Self::with_path(DEFAULT_DATA_DIR)
	}

	pub fn with_path(path: impl AsRef<Path>) -> Self {
		FileLedgerStorage {
			storage_path: path.as_ref().to_path_buf(),
			lock: Mutex::new(()),
		}
	}

	fn cursor_path(&self, slug: &str) -> PathBuf {
		self.storage_path.join(format!("{}_last_block.txt", slug))
	}

	fn log_path(&self, slug: &str) -> PathBuf {
		self.storage_path.join(format!("{}_transactions.json", slug))
	}

	fn accounts_path(&self, slug: &str) -> PathBuf {
		self.storage_path.join(format!("{}_accounts.json", slug))
	}

	async fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, anyhow::Error> {
		if !path.exists() {
			return Ok(Vec::new());
		}
		let content = tokio::fs::read_to_string(path)
			.await
			.with_context(|| format!("Failed to read {}", path.display()))?;
		if content.trim().is_empty() {
			return Ok(Vec::new());
		}
		serde_json::from_str(&content).with_context(|| format!("Corrupt store {}", path.display()))
	}

	/// Writes to a sibling `.tmp` file and renames it over `path`
	///
	/// A crash mid-write leaves either the old content or the new one, never a truncated file.
	async fn write_atomic(path: &Path, contents: String) -> Result<(), anyhow::Error> {
		if let Some(parent) = path.parent() {
			tokio::fs::create_dir_all(parent).await?;
		}
		let mut tmp = path.as_os_str().to_owned();
		tmp.push(".tmp");
		let tmp = PathBuf::from(tmp);
		tokio::fs::write(&tmp, contents)
			.await
			.with_context(|| format!("Failed to write {}", tmp.display()))?;
		tokio::fs::rename(&tmp, path)
			.await
			.with_context(|| format!("Failed to replace {}", path.display()))?;
		Ok(())
	}

	async fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<(), anyhow::Error> {
		let json = serde_json::to_string_pretty(records)?;
		Self::write_atomic(path, json).await
	}

	async fn modify_log<F>(&self, slug: &str, change: F) -> Result<(), anyhow::Error>
	where
		F: FnOnce(&mut Vec<LoggedTransaction>) + Send,
	{
		let _guard = self.lock.lock().await;
		let path = self.log_path(slug);
		let mut records: Vec<LoggedTransaction> = Self::read_records(&path).await?;
		change(&mut records);
		Self::write_records(&path, &records).await
	}

	async fn read_log(&self, slug: &str) -> Result<Vec<LoggedTransaction>, anyhow::Error> {
		let _guard = self.lock.lock().await;
		Self::read_records(&self.log_path(slug)).await
	}
}

impl Default for FileLedgerStorage {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl CursorStorage for FileLedgerStorage {
	async fn get_last_observed_height(&self, slug: &str) -> Result<Option<u64>, anyhow::Error> {
		let file_path = self.cursor_path(slug);

		if !file_path.exists() {
			return Ok(None);
		}

		let content = tokio::fs::read_to_string(&file_path).await?;
		let height = content
			.trim()
			.parse()
			.with_context(|| format!("Invalid cursor in {}", file_path.display()))?;
		Ok(Some(height))
	}

	async fn save_last_observed_height(
		&self,
		slug: &str,
		height: u64,
	) -> Result<(), anyhow::Error> {
		Self::write_atomic(&self.cursor_path(slug), height.to_string()).await
	}
}

#[async_trait]
impl TransactionLog for FileLedgerStorage {
	async fn replace_block(
		&self,
		slug: &str,
		height: u64,
		transactions: Vec<LoggedTransaction>,
	) -> Result<(), anyhow::Error> {
		self.modify_log(slug, move |records| {
			records.retain(|existing| {
				existing.block_number != Some(height)
					&& !transactions.iter().any(|tx| tx.txid == existing.txid)
			});
			records.extend(transactions.into_iter().map(|mut tx| {
				tx.block_number = Some(height);
				tx
			}));
		})
		.await
	}

	async fn upsert(
		&self,
		slug: &str,
		transaction: LoggedTransaction,
	) -> Result<(), anyhow::Error> {
		self.modify_log(slug, move |records| {
			records.retain(|existing| existing.txid != transaction.txid);
			records.push(transaction);
		})
		.await
	}

	async fn get(&self, slug: &str, txid: &str) -> Result<Option<LoggedTransaction>, anyhow::Error> {
		Ok(self
			.read_log(slug)
			.await?
			.into_iter()
			.find(|tx| tx.txid == txid))
	}

	async fn list_for_account(
		&self,
		slug: &str,
		account: &str,
		asset: &Asset,
		page: Page,
	) -> Result<Vec<LoggedTransaction>, anyhow::Error> {
		let mut records: Vec<LoggedTransaction> = self
			.read_log(slug)
			.await?
			.into_iter()
			.filter(|tx| &tx.asset == asset && tx.involves(account))
			.collect();
		sort_newest_first(&mut records);
		Ok(page.slice(records))
	}

	async fn pending(&self, slug: &str) -> Result<Vec<LoggedTransaction>, anyhow::Error> {
		Ok(self
			.read_log(slug)
			.await?
			.into_iter()
			.filter(|tx| tx.block_number.is_none())
			.collect())
	}

	async fn set_block_number(
		&self,
		slug: &str,
		txid: &str,
		height: u64,
	) -> Result<(), anyhow::Error> {
		self.modify_log(slug, |records| {
			for record in records.iter_mut().filter(|tx| tx.txid == txid) {
				record.block_number = Some(height);
			}
		})
		.await
	}

	async fn remove(&self, slug: &str, txid: &str) -> Result<(), anyhow::Error> {
		self.modify_log(slug, |records| records.retain(|tx| tx.txid != txid))
			.await
	}
}

#[async_trait]
impl AccountStore for FileLedgerStorage {
	async fn save_account(&self, slug: &str, record: AccountRecord) -> Result<(), anyhow::Error> {
		let _guard = self.lock.lock().await;
		let path = self.accounts_path(slug);
		let mut records: Vec<AccountRecord> = Self::read_records(&path).await?;
		records.retain(|existing| existing.address != record.address);
		records.push(record);
		Self::write_records(&path, &records).await
	}

	async fn list_accounts(&self, slug: &str) -> Result<Vec<AccountRecord>, anyhow::Error> {
		let _guard = self.lock.lock().await;
		Self::read_records(&self.accounts_path(slug)).await
	}

	async fn get_account(
		&self,
		slug: &str,
		address: &str,
	) -> Result<Option<AccountRecord>, anyhow::Error> {
		Ok(self
			.list_accounts(slug)
			.await?
			.into_iter()
			.find(|record| record.address.eq_ignore_ascii_case(address)))
	}
}
