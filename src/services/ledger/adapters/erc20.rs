//! ERC20 tokens mounted on an EVM ledger.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
	models::{
		evm::{parse_hex_u256, TokenTransfer},
		AddressCheck, Asset, Balance, GenerateAccountParams, GeneratedAccount, LoggedTransaction,
		NormalizedTransaction, Page, TokenConfig, TransactionCategory, WithdrawalReceipt,
		WithdrawalRequest,
	},
	services::ledger::{
		adapters::{
			evm::{amount_from_wei, amount_to_wei},
			global_balance, EvmAdapter,
		},
		categorize_for_account, categorize_for_managed_set, encode_balance_of, encode_transfer,
		managed_set, Capabilities, LedgerAdapter, LedgerError,
	},
	utils::address::is_valid_evm_address,
};

pub struct Erc20Adapter {
	parent: Arc<EvmAdapter>,
	token: TokenConfig,
	contract: String,
}

impl Erc20Adapter {
	pub fn new(parent: Arc<EvmAdapter>, token: TokenConfig) -> Self {
		let contract = token.contract.to_lowercase();
		Self {
			parent,
			token,
			contract,
		}
	}

	pub fn asset(&self) -> Asset {
		Asset::contract(&self.contract)
	}

	async fn decimals(&self) -> Result<u32, LedgerError> {
		self.parent.token_decimals(&self.contract).await
	}

	/// The `Transfer` event of this token emitted by a transaction
	async fn transfer_of(&self, txid: &str) -> Result<TokenTransfer, LedgerError> {
		let receipt = self
			.parent
			.client
			.get_receipt(txid)
			.await?
			.ok_or_else(|| LedgerError::not_found(format!("No receipt for {} yet", txid)))?;
		receipt
			.logs
			.iter()
			.filter_map(|log| log.as_token_transfer())
			.find(|transfer| transfer.contract == self.contract)
			.ok_or_else(|| {
				LedgerError::not_found(format!(
					"Transaction {} does not transfer {}",
					txid, self.token.route
				))
			})
	}

	async fn normalize_with<F>(
		&self,
		txid: &str,
		categorize: F,
	) -> Result<NormalizedTransaction, LedgerError>
	where
		F: FnOnce(&TokenTransfer) -> TransactionCategory + Send,
	{
		self.parent.ensure_synced().await?;
		let tx = self.parent.client.get_transaction(txid).await?;
		let transfer = self.transfer_of(txid).await?;
		let current_height = self.parent.client.block_number().await?;
		let amount = amount_from_wei(transfer.value, self.decimals().await?)?;

		let mut normalized = self.parent.normalize(
			&tx,
			current_height,
			categorize(&transfer),
			Some(transfer.to.clone()),
			amount,
		);
		normalized.from = Some(transfer.from);
		Ok(normalized)
	}
}

#[async_trait]
impl LedgerAdapter for Erc20Adapter {
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
		log::info!("Mounted {} ({} decimals)", self.token.route, decimals);
		Ok(())
	}

	async fn list_accounts(&self) -> Result<Vec<String>, LedgerError> {
		self.parent.list_accounts().await
	}

	async fn get_account_balance(&self, account: &str) -> Result<Balance, LedgerError> {
		let result = self
			.parent
			.client
			.call(&self.contract, &encode_balance_of(account)?)
			.await?;
		let raw = parse_hex_u256(&result).ok_or_else(|| {
			LedgerError::internal(format!("Bad balanceOf() result: {}", result))
		})?;
		Ok(Balance {
			account: Some(account.to_string()),
			balance: amount_from_wei(raw, self.decimals().await?)?,
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
		self.normalize_with(txid, |transfer| {
			categorize_for_account(Some(transfer.from.as_str()), Some(transfer.to.as_str()), account)
		})
		.await
	}

	async fn get_transaction(&self, txid: &str) -> Result<NormalizedTransaction, LedgerError> {
		let managed = managed_set(self.parent.client.accounts().await?);
		self.normalize_with(txid, |transfer| {
			categorize_for_managed_set(Some(transfer.from.as_str()), Some(transfer.to.as_str()), &managed)
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
		if request.options.sub_fee {
			return Err(LedgerError::invalid_request(
				"Token withdrawals pay gas in the native currency and cannot subtract the fee",
			));
		}
		if !is_valid_evm_address(&request.receiver) {
			return Err(LedgerError::invalid_request(format!(
				"Invalid receiver {}",
				request.receiver
			)));
		}
		self.parent.ensure_synced().await?;
		let (from, password) = self.parent.signer(&request)?;

		let decimals = self.decimals().await?;
		let value = amount_to_wei(request.amount, decimals)?;
		if value.is_zero() {
			return Err(LedgerError::invalid_request("Amount must be positive"));
		}

		let transaction = json!({
			"to": self.contract,
			"value": "0x0",
			"data": encode_transfer(&request.receiver, value)?,
		});
		let txid = self
			.parent
			.send_unlocked(
				&from,
				&password,
				transaction,
				self.parent.settings.token_gas_limit,
				&request.options,
			)
			.await?;
		let amount = amount_from_wei(value, decimals)?;

		self.parent
			.ctx
			.record_withdrawal(LoggedTransaction {
				txid: txid.clone(),
				block_number: None,
				from: Some(from),
				to: Some(request.receiver),
				amount,
				asset: self.asset(),
				extra: None,
				observed_at: Utc::now(),
				observed: false,
			})
			.await;

		Ok(WithdrawalReceipt {
			txid,
			amount,
			fee: None,
		})
	}
}
