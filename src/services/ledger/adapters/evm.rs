//! Ethereum and EVM compatible chains with node-managed keys.

use alloy::primitives::U256;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::{
	collections::{HashMap, HashSet},
	sync::Arc,
};
use tokio::sync::RwLock;

use crate::{
	models::{
		evm::{parse_hex_u64, EvmTransaction},
		AddressCheck, Asset, Balance, EvmSettings, GenerateAccountParams, GeneratedAccount,
		LoggedTransaction, NormalizedTransaction, Page, TokenConfig, TransactionCategory, WithdrawOptions,
		WithdrawalReceipt, WithdrawalRequest,
	},
	services::{
		ledger::{
			adapters::{global_balance, AdapterContext},
			categorize_for_account, categorize_for_managed_set, confirmations, decode_transfer,
			encode_decimals, managed_set, Capabilities, EvmClientTrait, LedgerAdapter, LedgerError,
		},
		observer::{ChangeSet, ChangeSource, ObservedBlock},
	},
	utils::{
		address::is_valid_evm_address,
		amount::{from_base_units, to_base_units},
	},
};

pub(crate) const ETHER_DECIMALS: u32 = 18;
const WEI_PER_GWEI: u64 = 1_000_000_000;

pub(crate) fn amount_from_wei(value: U256, decimals: u32) -> Result<Decimal, LedgerError> {
	from_base_units(value, decimals).map_err(LedgerError::internal)
}

pub(crate) fn amount_to_wei(amount: Decimal, decimals: u32) -> Result<U256, LedgerError> {
	to_base_units(amount, decimals)
		.map(U256::from)
		.map_err(LedgerError::invalid_request)
}

fn hex_quantity(value: impl std::fmt::LowerHex) -> String {
	format!("{:#x}", value)
}

pub struct EvmAdapter {
	route: String,
	pub(crate) client: Arc<dyn EvmClientTrait>,
	pub(crate) settings: EvmSettings,
	tokens: Vec<TokenConfig>,
	pub(crate) ctx: AdapterContext,
	/// Token decimals by lower-cased contract address
	decimals: RwLock<HashMap<String, u32>>,
}

impl EvmAdapter {
	pub fn new(
		route: impl Into<String>,
		client: Arc<dyn EvmClientTrait>,
		settings: EvmSettings,
		tokens: Vec<TokenConfig>,
		ctx: AdapterContext,
	) -> Self {
		let decimals = tokens
			.iter()
			.filter_map(|t| t.decimals.map(|d| (t.contract.to_lowercase(), d)))
			.collect();
		Self {
			route: route.into(),
			client,
			settings,
			tokens,
			ctx,
			decimals: RwLock::new(decimals),
		}
	}

	pub fn tokens(&self) -> &[TokenConfig] {
		&self.tokens
	}

	pub(crate) async fn ensure_synced(&self) -> Result<(), LedgerError> {
		if self.client.syncing().await? {
			return Err(LedgerError::unavailable(format!(
				"{} node is still syncing",
				self.route
			)));
		}
		Ok(())
	}

	/// Decimals of a token contract, read from the chain once
	pub(crate) async fn token_decimals(&self, contract: &str) -> Result<u32, LedgerError> {
		let contract = contract.to_lowercase();
		if let Some(decimals) = self.decimals.read().await.get(&contract) {
			return Ok(*decimals);
		}

		let result = self.client.call(&contract, &encode_decimals()).await?;
		let decimals = parse_hex_u64(&result)
			.map(|d| d as u32)
			.ok_or_else(|| LedgerError::internal(format!("Bad decimals() of {}", contract)))?;
		self.decimals.write().await.insert(contract, decimals);
		Ok(decimals)
	}

	fn gas_price_wei(&self, options: &WithdrawOptions) -> U256 {
		U256::from(self.settings.gas_prices.get(options.priority)) * U256::from(WEI_PER_GWEI)
	}

	/// Account that signs a withdrawal and the password unlocking it
	pub(crate) fn signer(
		&self,
		request: &WithdrawalRequest,
	) -> Result<(String, String), LedgerError> {
		match &request.sender {
			Some(sender) => {
				let password = request.options.password.clone().ok_or_else(|| {
					LedgerError::unauthorized(format!("Password required to spend from {}", sender))
				})?;
				Ok((sender.clone(), password))
			}
			None => {
				let password = self
					.settings
					.main_account_password
					.clone()
					.or_else(|| request.options.password.clone())
					.ok_or_else(|| {
						LedgerError::unauthorized("Main account password is not configured")
					})?;
				Ok((self.settings.main_account.clone(), password))
			}
		}
	}

	/// Unlocks `from` and submits a transaction with the given gas settings
	pub(crate) async fn send_unlocked(
		&self,
		from: &str,
		password: &str,
		mut transaction: Value,
		gas_limit: u64,
		options: &WithdrawOptions,
	) -> Result<String, LedgerError> {
		if !self
			.client
			.unlock_account(from, password, self.settings.unlock_seconds)
			.await?
		{
			return Err(LedgerError::unauthorized(format!("Could not unlock {}", from)));
		}

		transaction["from"] = json!(from);
		transaction["gas"] = json!(hex_quantity(gas_limit));
		transaction["gasPrice"] = json!(hex_quantity(self.gas_price_wei(options)));
		self.client.send_transaction(transaction).await
	}

	pub(crate) fn normalize(
		&self,
		tx: &EvmTransaction,
		current_height: u64,
		category: TransactionCategory,
		to: Option<String>,
		amount: Decimal,
	) -> NormalizedTransaction {
		NormalizedTransaction {
			id: tx.hash.clone(),
			amount,
			confirmations: confirmations(current_height, tx.block_height()),
			category,
			from: Some(tx.from.clone()),
			to,
			extra: None,
		}
	}

	/// Log record for a block transaction, decoding direct transfers of mounted tokens
	async fn observe(&self, tx: &EvmTransaction) -> Result<LoggedTransaction, LedgerError> {
		let token_call = tx.to.as_deref().and_then(|to| {
			let to = to.to_lowercase();
			let mounted = self.tokens.iter().any(|t| t.contract.eq_ignore_ascii_case(&to));
			let decoded = tx.input.as_deref().and_then(decode_transfer);
			mounted.then_some(decoded).flatten().map(|call| (to, call))
		});

		let (to, amount, asset) = match token_call {
			Some((contract, (recipient, raw))) => {
				let decimals = self.token_decimals(&contract).await?;
				(
					Some(recipient),
					amount_from_wei(raw, decimals)?,
					Asset::contract(&contract),
				)
			}
			None => (
				tx.to.clone(),
				amount_from_wei(tx.value_wei(), ETHER_DECIMALS)?,
				Asset::Native,
			),
		};

		Ok(LoggedTransaction {
			txid: tx.hash.clone(),
			block_number: tx.block_height(),
			from: Some(tx.from.clone()),
			to,
			amount,
			asset,
			extra: None,
			observed_at: Utc::now(),
			observed: false,
		})
	}
}

#[async_trait]
impl LedgerAdapter for EvmAdapter {
	fn route(&self) -> &str {
		&self.route
	}

	fn capabilities(&self) -> Capabilities {
		Capabilities {
			sub_fee: true,
			explorer: self.ctx.explorer,
			..Capabilities::default()
		}
	}

	async fn list_accounts(&self) -> Result<Vec<String>, LedgerError> {
		self.ensure_synced().await?;
		self.client.accounts().await
	}

	async fn get_account_balance(&self, account: &str) -> Result<Balance, LedgerError> {
		self.ensure_synced().await?;
		let wei = self.client.get_balance(account).await?;
		Ok(Balance {
			account: Some(account.to_string()),
			balance: amount_from_wei(wei, ETHER_DECIMALS)?,
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
		self.ctx
			.logged_transactions(self, account, &Asset::Native, page)
			.await
	}

	async fn get_account_transaction(
		&self,
		account: &str,
		txid: &str,
	) -> Result<NormalizedTransaction, LedgerError> {
		self.ensure_synced().await?;
		let tx = self.client.get_transaction(txid).await?;
		let current_height = self.client.block_number().await?;
		let category = categorize_for_account(Some(tx.from.as_str()), tx.to.as_deref(), account);
		let amount = amount_from_wei(tx.value_wei(), ETHER_DECIMALS)?;
		Ok(self.normalize(&tx, current_height, category, tx.to.clone(), amount))
	}

	async fn get_transaction(&self, txid: &str) -> Result<NormalizedTransaction, LedgerError> {
		self.ensure_synced().await?;
		let tx = self.client.get_transaction(txid).await?;
		let current_height = self.client.block_number().await?;
		let managed = managed_set(self.client.accounts().await?);
		let category = categorize_for_managed_set(Some(tx.from.as_str()), tx.to.as_deref(), &managed);
		let amount = amount_from_wei(tx.value_wei(), ETHER_DECIMALS)?;
		Ok(self.normalize(&tx, current_height, category, tx.to.clone(), amount))
	}

	async fn get_native_transaction(&self, txid: &str) -> Result<Value, LedgerError> {
		self.client.get_raw_transaction(txid).await
	}

	async fn generate_account(
		&self,
		params: GenerateAccountParams,
	) -> Result<GeneratedAccount, LedgerError> {
		let password = params
			.password
			.filter(|p| !p.is_empty())
			.ok_or_else(|| LedgerError::invalid_request("A password is required"))?;
		let address = self.client.new_account(&password).await?;
		Ok(GeneratedAccount {
			address,
			extra: None,
		})
	}

	async fn is_address(&self, value: &str) -> Result<AddressCheck, LedgerError> {
		Ok(AddressCheck {
			address: value.to_string(),
			valid: is_valid_evm_address(value),
		})
	}

	async fn perform_withdraw(
		&self,
		request: WithdrawalRequest,
	) -> Result<WithdrawalReceipt, LedgerError> {
		if !is_valid_evm_address(&request.receiver) {
			return Err(LedgerError::invalid_request(format!(
				"Invalid receiver {}",
				request.receiver
			)));
		}
		self.ensure_synced().await?;
		let (from, password) = self.signer(&request)?;

		let mut value = amount_to_wei(request.amount, ETHER_DECIMALS)?;
		let fee = self.gas_price_wei(&request.options) * U256::from(self.settings.gas_limit);
		if request.options.sub_fee {
			if fee >= value {
				return Err(LedgerError::invalid_request(format!(
					"Fee {} wei is not lower than the amount",
					fee
				)));
			}
			value -= fee;
		}
		if value.is_zero() {
			return Err(LedgerError::invalid_request("Amount must be positive"));
		}

		let transaction = json!({
			"to": request.receiver,
			"value": hex_quantity(value),
		});
		let txid = self
			.send_unlocked(
				&from,
				&password,
				transaction,
				self.settings.gas_limit,
				&request.options,
			)
			.await?;
		let amount = amount_from_wei(value, ETHER_DECIMALS)?;

		self.ctx
			.record_withdrawal(LoggedTransaction {
				txid: txid.clone(),
				block_number: None,
				from: Some(from),
				to: Some(request.receiver),
				amount,
				asset: Asset::Native,
				extra: None,
				observed_at: Utc::now(),
				observed: false,
			})
			.await;

		Ok(WithdrawalReceipt {
			txid,
			amount,
			fee: Some(amount_from_wei(fee, ETHER_DECIMALS)?),
		})
	}
}

#[async_trait]
impl ChangeSource for EvmAdapter {
	async fn current_height(&self) -> Result<u64, LedgerError> {
		self.client.block_number().await
	}

	async fn managed_accounts(&self) -> Result<HashSet<String>, LedgerError> {
		Ok(managed_set(self.client.accounts().await?))
	}

	async fn scan(
		&self,
		from_exclusive: u64,
		to_inclusive: u64,
		accounts: &HashSet<String>,
	) -> Result<ChangeSet, LedgerError> {
		let mut blocks = Vec::new();
		for height in (from_exclusive + 1)..=to_inclusive {
			let block = self.client.get_block(height).await?;
			let mut transactions = Vec::new();
			for tx in &block.transactions {
				let record = self.observe(tx).await?;
				if record.touches(accounts) {
					transactions.push(record);
				}
			}
			blocks.push(ObservedBlock {
				height,
				transactions,
			});
		}
		Ok(ChangeSet::Blocks(blocks))
	}

	async fn transaction_height(&self, txid: &str) -> Result<Option<u64>, LedgerError> {
		Ok(self.client.get_transaction(txid).await?.block_height())
	}
}
