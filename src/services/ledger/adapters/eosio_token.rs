//! Tokens issued by other contracts on an EOSIO ledger.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::{
	models::{
		AddressCheck, Asset, Balance, GenerateAccountParams, GeneratedAccount,
		NormalizedTransaction, Page, TokenConfig, WithdrawalReceipt, WithdrawalRequest,
	},
	services::ledger::{
		adapters::{eosio::EosioCurrency, EosioAdapter},
		categorize_for_account, categorize_for_managed_set, managed_set, Capabilities,
		LedgerAdapter, LedgerError,
	},
};

pub struct EosioTokenAdapter {
	parent: Arc<EosioAdapter>,
	route: String,
	currency: EosioCurrency,
}

impl EosioTokenAdapter {
	/// None when the token has no symbol to look balances up by
	pub fn new(parent: Arc<EosioAdapter>, token: TokenConfig) -> Option<Self> {
		let currency = EosioCurrency {
			contract: token.contract,
			symbol: token.symbol?,
		};
		Some(Self {
			parent,
			route: token.route,
			currency,
		})
	}

	pub fn asset(&self) -> Asset {
		self.currency.asset()
	}
}

#[async_trait]
impl LedgerAdapter for EosioTokenAdapter {
	fn route(&self) -> &str {
		&self.route
	}

	fn capabilities(&self) -> Capabilities {
		self.parent.capabilities()
	}

	async fn on_init(&self) -> Result<(), LedgerError> {
		let precision = self.parent.precision_of(&self.currency).await?;
		log::info!(
			"Mounted {} ({}@{}, precision {})",
			self.route,
			self.currency.symbol,
			self.currency.contract,
			precision
		);
		Ok(())
	}

	async fn list_accounts(&self) -> Result<Vec<String>, LedgerError> {
		self.parent.owned_accounts().await
	}

	async fn get_account_balance(&self, account: &str) -> Result<Balance, LedgerError> {
		self.parent.balance_of(account, &self.currency).await
	}

	async fn get_global_balance(&self) -> Result<Balance, LedgerError> {
		self.parent.global_balance_of(&self.currency).await
	}

	async fn list_account_transactions(
		&self,
		account: &str,
		page: Page,
	) -> Result<Vec<NormalizedTransaction>, LedgerError> {
		self.parent
			.ctx
			.logged_transactions(self.parent.as_ref(), account, &self.asset(), page)
			.await
	}

	async fn get_account_transaction(
		&self,
		account: &str,
		txid: &str,
	) -> Result<NormalizedTransaction, LedgerError> {
		self.parent
			.normalize_transfer(txid, &self.currency, |t| {
				categorize_for_account(t.from.as_deref(), Some(t.to.as_str()), account)
			})
			.await
	}

	async fn get_transaction(&self, txid: &str) -> Result<NormalizedTransaction, LedgerError> {
		let managed = managed_set(self.parent.owned_accounts().await?);
		self.parent
			.normalize_transfer(txid, &self.currency, |t| {
				categorize_for_managed_set(t.from.as_deref(), Some(t.to.as_str()), &managed)
			})
			.await
	}

	async fn get_native_transaction(&self, txid: &str) -> Result<Value, LedgerError> {
		self.parent.get_native_transaction(txid).await
	}

	async fn generate_account(
		&self,
		params: GenerateAccountParams,
	) -> Result<GeneratedAccount, LedgerError> {
		self.parent.generate_account(params).await
	}

	async fn is_address(&self, value: &str) -> Result<AddressCheck, LedgerError> {
		self.parent.is_address(value).await
	}

	async fn perform_withdraw(
		&self,
		request: WithdrawalRequest,
	) -> Result<WithdrawalReceipt, LedgerError> {
		self.parent.withdraw(request, &self.currency).await
	}
}
