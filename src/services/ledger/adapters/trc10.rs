//! TRC10 assets mounted on a TRON ledger.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::{
	models::{
		AddressCheck, Asset, Balance, GenerateAccountParams, GeneratedAccount,
		NormalizedTransaction, Page, TokenConfig, WithdrawalReceipt, WithdrawalRequest,
	},
	services::ledger::{
		adapters::{
			global_balance,
			tron::{from_raw_amount, to_raw_amount},
			TronAdapter,
		},
		categorize_for_account, categorize_for_managed_set, managed_set, Capabilities,
		LedgerAdapter, LedgerError,
	},
};

pub struct Trc10Adapter {
	parent: Arc<TronAdapter>,
	token: TokenConfig,
}

impl Trc10Adapter {
	pub fn new(parent: Arc<TronAdapter>, token: TokenConfig) -> Self {
		Self { parent, token }
	}

	fn asset_id(&self) -> &str {
		&self.token.contract
	}

	pub fn asset(&self) -> Asset {
		Asset::Token(self.token.contract.clone())
	}

	async fn decimals(&self) -> Result<u32, LedgerError> {
		self.parent.asset_decimals(&self.asset()).await
	}
}

#[async_trait]
impl LedgerAdapter for Trc10Adapter {
	fn route(&self) -> &str {
		&self.token.route
	}

	fn capabilities(&self) -> Capabilities {
		Capabilities {
			explorer: self.parent.ctx.explorer,
			..Capabilities::default()
		}
	}

	async fn on_init(&self) -> Result<(), LedgerError> {
		let decimals = self.decimals().await?;
		log::info!(
			"Mounted {} (asset {}, {} decimals)",
			self.token.route,
			self.asset_id(),
			decimals
		);
		Ok(())
	}

	async fn list_accounts(&self) -> Result<Vec<String>, LedgerError> {
		self.parent.owned_accounts().await
	}

	async fn get_account_balance(&self, account: &str) -> Result<Balance, LedgerError> {
		let state = self.parent.client.account(account).await?;
		let raw = state
			.assets
			.iter()
			.find(|a| a.key == self.asset_id())
			.map(|a| a.value)
			.unwrap_or(0);
		Ok(Balance {
			account: Some(account.to_string()),
			balance: from_raw_amount(raw, self.decimals().await?)?,
		})
	}

	async fn get_global_balance(&self) -> Result<Balance, LedgerError> {
		let mut balances = Vec::new();
		for account in self.list_accounts().await? {
			balances.push(self.get_account_balance(&account).await?);
		}
		Ok(global_balance(balances))
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
			.normalize_transfer(txid, &self.asset(), |t| {
				categorize_for_account(Some(t.from.as_str()), Some(t.to.as_str()), account)
			})
			.await
	}

	async fn get_transaction(&self, txid: &str) -> Result<NormalizedTransaction, LedgerError> {
		let managed = managed_set(self.parent.owned_accounts().await?);
		self.parent
			.normalize_transfer(txid, &self.asset(), |t| {
				categorize_for_managed_set(Some(t.from.as_str()), Some(t.to.as_str()), &managed)
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
		let sender = self.parent.prepare(&request).await?;
		let decimals = self.decimals().await?;
		let raw = to_raw_amount(request.amount, decimals)?;

		let unsigned = self
			.parent
			.client
			.transfer_asset(&sender, &request.receiver, self.asset_id(), raw)
			.await?;
		let txid = self.parent.sign_and_broadcast(&sender, unsigned).await?;
		let amount = from_raw_amount(raw, decimals)?;
		self.parent
			.record(&txid, sender, request.receiver, amount, self.asset())
			.await;

		Ok(WithdrawalReceipt {
			txid,
			amount,
			fee: None,
		})
	}
}
