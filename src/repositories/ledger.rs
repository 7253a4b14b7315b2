//! Ledger configuration repository.
//!
//! Loads every ledger file once at startup and checks that no currency route is
//! claimed twice across ledgers and their mounted tokens.

use std::{collections::HashMap, path::Path};

use crate::{
	models::{validate_unique_routes, ConfigLoader, Ledger},
	repositories::error::RepositoryError,
};

pub struct LedgerRepository {
	pub ledgers: HashMap<String, Ledger>,
}

impl LedgerRepository {
	pub fn new(path: Option<&Path>) -> Result<Self, RepositoryError> {
		let ledgers = Self::load(path)?;
		Ok(LedgerRepository { ledgers })
	}

	fn load(path: Option<&Path>) -> Result<HashMap<String, Ledger>, RepositoryError> {
		let ledgers: HashMap<String, Ledger> = Ledger::load_all(path)
			.map_err(|e| RepositoryError::load_error(format!("Failed to load ledgers: {}", e)))?;
		validate_unique_routes(ledgers.values())?;
		Ok(ledgers)
	}
}

pub trait LedgerRepositoryTrait {
	fn load_all(&self, path: Option<&Path>) -> Result<HashMap<String, Ledger>, RepositoryError>;
	fn get(&self, slug: &str) -> Option<Ledger>;
	fn get_all(&self) -> HashMap<String, Ledger>;
}

impl LedgerRepositoryTrait for LedgerRepository {
	fn load_all(&self, path: Option<&Path>) -> Result<HashMap<String, Ledger>, RepositoryError> {
		Self::load(path)
	}

	fn get(&self, slug: &str) -> Option<Ledger> {
		self.ledgers.get(slug).cloned()
	}

	fn get_all(&self) -> HashMap<String, Ledger> {
		self.ledgers.clone()
	}
}

pub struct LedgerService<T: LedgerRepositoryTrait> {
	repository: T,
}

impl<T: LedgerRepositoryTrait> LedgerService<T> {
	pub fn new(path: Option<&Path>) -> Result<LedgerService<LedgerRepository>, RepositoryError> {
		let repository = LedgerRepository::new(path)?;
		Ok(LedgerService { repository })
	}

	pub fn new_with_repository(repository: T) -> Self {
		LedgerService { repository }
	}

	pub fn get(&self, slug: &str) -> Result<Ledger, RepositoryError> {
		self.repository
			.get(slug)
			.ok_or_else(|| RepositoryError::not_found(format!("ledger {}", slug)))
	}

	/// Every configured ledger ordered by slug
	pub fn get_all(&self) -> Vec<Ledger> {
		let mut ledgers: Vec<Ledger> = self.repository.get_all().into_values().collect();
		ledgers.sort_by(|a, b| a.slug.cmp(&b.slug));
		ledgers
	}
}
