//! TRC20 contracts mounted on a TRON ledger.
//!
//! Calls go through `triggerconstantcontract` for reads and `triggersmartcontract` for
//! transfers; the parent's block scan logs `transfer` calls into the contract.

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
			evm::amount_to_wei,
			global_balance,
			tron::from_raw_amount,
			TronAdapter,
		},
		categorize_for_account, categorize_for_managed_set, managed_set, parse_word,
		trc20_balance_of_parameter, trc20_transfer_parameter, Capabilities, LedgerAdapter,
		LedgerError, TRC20_BALANCE_OF, TRC20_TRANSFER,
	},
};

pub struct Trc20Adapter {
	parent: Arc<TronAdapter>,
	token: TokenConfig,
}

impl Trc20Adapter {
	pub fn new(parent: Arc<TronAdapter>, token: TokenConfig) -> Self {
		Self { parent, token }
	}

	fn contract(&self) -> &str {
		&self.token.contract
	}

	pub fn asset(&self) -> Asset {
		Asset::Contract(self.token.contract.clone())
	}

	async fn decimals(&self) -> Result<u32, LedgerError> {
		self.parent.asset_decimals(&self.asset()).await
	}
}

#[async_trait]
impl LedgerAdapter for Trc20Adapter {
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
			"Mounted {} (contract {}, {} decimals)",
			self.token.route,
			self.contract(),
			decimals
		);
		Ok(())
	}

	async fn list_accounts(&self) -> Result<Vec<String>, LedgerError> {
		self.parent.owned_accounts().await
	}

	async fn get_account_balance(&self, account: &str) -> Result<Balance, LedgerError> {
		let word = self
			.parent
			.client
			.call_constant(
				self.parent.main_account(),
				self.contract(),
				TRC20_BALANCE_OF,
				&trc20_balance_of_parameter(account)?,
			)
			.await?;
		Ok(Balance {
			account: Some(account.to_string()),
			balance: from_raw_amount(parse_word(&word)?, self.decimals().await?)?,
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
		let raw = amount_to_wei(request.amount, decimals)?;
		if raw.is_zero() {
			return Err(LedgerError::invalid_request("Amount must be positive"));
		}

		let unsigned = self
			.parent
			.client
			.trigger_contract(
				&sender,
				self.contract(),
				TRC20_TRANSFER,
				&trc20_transfer_parameter(&request.receiver, raw)?,
				self.parent.trc20_fee_limit(),
			)
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

