//! TRON ledger with generated keypairs kept in the account store.
//!
//! Besides TRX the parent adapter recognizes TRC10 transfers of mounted asset ids and
//! TRC20 `transfer` calls into mounted contracts while scanning blocks.

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
		evm::parse_hex_u64,
		tron::{
			TronRawTransaction, TronTransaction, TRANSFER_ASSET_CONTRACT, TRANSFER_CONTRACT,
			TRIGGER_SMART_CONTRACT,
		},
		AccountRecord, AddressCheck, Asset, Balance, GenerateAccountParams, GeneratedAccount,
		LoggedTransaction, NormalizedTransaction, Page, TokenConfig, TransactionCategory,
		TronSettings, WithdrawalReceipt, WithdrawalRequest,
	},
	services::{
		ledger::{
			adapters::{global_balance, AdapterContext},
			categorize_for_account, categorize_for_managed_set, confirmations,
			decode_trc20_transfer, managed_set, Capabilities, LedgerAdapter, LedgerError,
			TronClientTrait, TRC20_DECIMALS,
		},
		observer::{ChangeSet, ChangeSource, ObservedBlock},
	},
	utils::amount::{from_base_units, to_base_units},
};

pub(crate) const SUN_DECIMALS: u32 = 6;

/// Value moved by the first contract of a transaction
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TronTransfer {
	pub from: String,
	pub to: String,
	/// Base units of the moved asset
	pub amount: U256,
	/// `Native` for TRX, `Token` for TRC10, `Contract` for TRC20
	pub asset: Asset,
}

/// Extracts a successful TRX, TRC10 or TRC20 transfer
pub(crate) fn transfer_of(tx: &TronTransaction) -> Option<TronTransfer> {
	if !tx.succeeded() {
		return None;
	}
	let contract = tx.contract()?;
	let value = &contract.parameter.value;
	let from = value.owner_address.clone()?;
	if contract.contract_type == TRIGGER_SMART_CONTRACT {
		let (to, amount) = decode_trc20_transfer(value.data.as_deref()?)?;
		return Some(TronTransfer {
			from,
			to,
			amount,
			asset: Asset::Contract(value.contract_address.clone()?),
		});
	}
	let asset = match contract.contract_type.as_str() {
		TRANSFER_CONTRACT => Asset::Native,
		TRANSFER_ASSET_CONTRACT => Asset::Token(value.asset_name.clone()?),
		_ => return None,
	};
	Some(TronTransfer {
		from,
		to: value.to_address.clone()?,
		amount: U256::from(value.amount?),
		asset,
	})
}

pub(crate) fn to_raw_amount(amount: Decimal, decimals: u32) -> Result<u64, LedgerError> {
	let raw = to_base_units(amount, decimals).map_err(LedgerError::invalid_request)?;
	let raw = u64::try_from(raw).map_err(|_| LedgerError::invalid_request("Amount out of range"))?;
	if raw == 0 {
		return Err(LedgerError::invalid_request("Amount must be positive"));
	}
	Ok(raw)
}

pub(crate) fn from_raw_amount(raw: impl ToString, decimals: u32) -> Result<Decimal, LedgerError> {
	from_base_units(raw, decimals).map_err(LedgerError::internal)
}

pub struct TronAdapter {
	route: String,
	pub(crate) client: Arc<dyn TronClientTrait>,
	settings: TronSettings,
	tokens: Vec<TokenConfig>,
	pub(crate) ctx: AdapterContext,
	/// Token precision by TRC10 asset id or TRC20 contract
	precision: RwLock<HashMap<String, u32>>,
}

impl TronAdapter {
	pub fn new(
		route: impl Into<String>,
		client: Arc<dyn TronClientTrait>,
		settings: TronSettings,
		tokens: Vec<TokenConfig>,
		ctx: AdapterContext,
	) -> Self {
		Self {
			route: route.into(),
			client,
			settings,
			tokens,
			ctx,
			precision: RwLock::new(HashMap::new()),
		}
	}

	pub fn tokens(&self) -> &[TokenConfig] {
		&self.tokens
	}

	pub(crate) fn main_account(&self) -> &str {
		&self.settings.main_account
	}

	pub(crate) fn trc20_fee_limit(&self) -> u64 {
		self.settings.trc20_fee_limit
	}

	/// Mounted token matching a transferred asset
	fn mounted(&self, asset: &Asset) -> Option<&TokenConfig> {
		let id = match asset {
			Asset::Token(id) | Asset::Contract(id) => id,
			_ => return None,
		};
		self.tokens.iter().find(|t| &t.contract == id)
	}

	/// Decimal places of an asset, configured or read once from the chain
	pub(crate) async fn asset_decimals(&self, asset: &Asset) -> Result<u32, LedgerError> {
		let id = match asset {
			Asset::Token(id) | Asset::Contract(id) => id,
			_ => return Ok(SUN_DECIMALS),
		};
		if let Some(decimals) = self.mounted(asset).and_then(|t| t.decimals) {
			return Ok(decimals);
		}
		if let Some(decimals) = self.precision.read().await.get(id) {
			return Ok(*decimals);
		}
		let decimals = match asset {
			Asset::Contract(contract) => {
				let word = self
					.client
					.call_constant(&self.settings.main_account, contract, TRC20_DECIMALS, "")
					.await?;
				parse_hex_u64(&word)
					.map(|d| d as u32)
					.ok_or_else(|| LedgerError::internal(format!("Bad decimals() of {}", contract)))?
			}
			_ => self.client.asset_precision(id).await?,
		};
		self.precision.write().await.insert(id.clone(), decimals);
		Ok(decimals)
	}

	/// Main account followed by every generated address
	pub(crate) async fn owned_accounts(&self) -> Result<Vec<String>, LedgerError> {
		let mut accounts = vec![self.settings.main_account.clone()];
		for record in self.ctx.accounts.list_accounts(&self.ctx.slug).await? {
			if !accounts.contains(&record.address) {
				accounts.push(record.address);
			}
		}
		Ok(accounts)
	}

	async fn signing_key(&self, sender: &str) -> Result<String, LedgerError> {
		if sender == self.settings.main_account {
			return self
				.settings
				.main_account_private_key
				.clone()
				.ok_or_else(|| LedgerError::unauthorized("Main account key is not configured"));
		}
		self.ctx
			.accounts
			.get_account(&self.ctx.slug, sender)
			.await?
			.and_then(|record| record.secret)
			.ok_or_else(|| LedgerError::unauthorized(format!("No key held for {}", sender)))
	}

	/// Validates a withdrawal and resolves the spending account
	pub(crate) async fn prepare(&self, request: &WithdrawalRequest) -> Result<String, LedgerError> {
		if request.options.sub_fee {
			return Err(LedgerError::invalid_request(
				"TRON fees are paid in bandwidth and cannot be subtracted",
			));
		}
		if !self.client.validate_address(&request.receiver).await? {
			return Err(LedgerError::invalid_request(format!(
				"Invalid receiver {}",
				request.receiver
			)));
		}
		Ok(request
			.sender
			.clone()
			.unwrap_or_else(|| self.settings.main_account.clone()))
	}

	/// Signs with the sender's key and broadcasts, returning the transaction id
	pub(crate) async fn sign_and_broadcast(
		&self,
		sender: &str,
		unsigned: TronRawTransaction,
	) -> Result<String, LedgerError> {
		let key = self.signing_key(sender).await?;
		let signed = self.client.sign_transaction(unsigned, &key).await?;
		let signed_id = signed
			.get("txID")
			.and_then(|id| id.as_str())
			.map(str::to_string);

		let result = self.client.broadcast(signed).await?;
		let txid = result.txid.clone().or(signed_id);
		match (result.result, txid) {
			(true, Some(txid)) => Ok(txid),
			(true, None) => Err(LedgerError::internal("Broadcast accepted without a txid")),
			(false, Some(txid)) => Err(LedgerError::broadcast(
				txid,
				format!(
					"{}: {}",
					result.code.unwrap_or_default(),
					result.message.unwrap_or_default()
				),
			)),
			(false, None) => Err(LedgerError::invalid_request(format!(
				"Broadcast rejected: {}",
				result.message.unwrap_or_default()
			))),
		}
	}

	/// Normalizes a transfer of the given asset
	pub(crate) async fn normalize_transfer<F>(
		&self,
		txid: &str,
		asset: &Asset,
		categorize: F,
	) -> Result<NormalizedTransaction, LedgerError>
	where
		F: FnOnce(&TronTransfer) -> TransactionCategory + Send,
	{
		let tx = self.client.transaction_by_id(txid).await?;
		let transfer = transfer_of(&tx)
			.filter(|t| &t.asset == asset)
			.ok_or_else(|| {
				LedgerError::not_found(format!("Transaction {} is not a matching transfer", txid))
			})?;
		let decimals = self.asset_decimals(asset).await?;
		let height = self.client.transaction_info(txid).await?.block_number;
		let current_height = self.client.now_block().await?.height();

		Ok(NormalizedTransaction {
			id: tx.tx_id.clone(),
			amount: from_raw_amount(transfer.amount, decimals)?,
			confirmations: confirmations(current_height, height),
			category: categorize(&transfer),
			from: Some(transfer.from),
			to: Some(transfer.to),
			extra: None,
		})
	}

	/// Log record for a block transaction, None for contracts nobody mounted
	async fn observe(
		&self,
		tx: &TronTransaction,
		height: u64,
	) -> Result<Option<LoggedTransaction>, LedgerError> {
		let Some(transfer) = transfer_of(tx) else {
			return Ok(None);
		};
		if transfer.asset != Asset::Native && self.mounted(&transfer.asset).is_none() {
			return Ok(None);
		}
		let decimals = self.asset_decimals(&transfer.asset).await?;
		Ok(Some(LoggedTransaction {
			txid: tx.tx_id.clone(),
			block_number: Some(height),
			from: Some(transfer.from),
			to: Some(transfer.to),
			amount: from_raw_amount(transfer.amount, decimals)?,
			asset: transfer.asset,
			extra: None,
			observed_at: Utc::now(),
			observed: false,
		}))
	}

	/// Logs a broadcast withdrawal as pending
	pub(crate) async fn record(
		&self,
		txid: &str,
		sender: String,
		receiver: String,
		amount: Decimal,
		asset: Asset,
	) {
		self.ctx
			.record_withdrawal(LoggedTransaction {
				txid: txid.to_string(),
				block_number: None,
				from: Some(sender),
				to: Some(receiver),
				amount,
				asset,
				extra: None,
				observed_at: Utc::now(),
				observed: false,
			})
			.await;
	}
}

#[async_trait]
impl LedgerAdapter for TronAdapter {
	fn route(&self) -> &str {
		&self.route
	}

	fn capabilities(&self) -> Capabilities {
		Capabilities {
			explorer: self.ctx.explorer,
			..Capabilities::default()
		}
	}

	async fn list_accounts(&self) -> Result<Vec<String>, LedgerError> {
		self.owned_accounts().await
	}

	async fn get_account_balance(&self, account: &str) -> Result<Balance, LedgerError> {
		let state = self.client.account(account).await?;
		Ok(Balance {
			account: Some(account.to_string()),
			balance: from_raw_amount(state.balance.unwrap_or(0), SUN_DECIMALS)?,
		})
	}

	async fn get_global_balance(&self) -> Result<Balance, LedgerError> {
		let mut balances = Vec::new();
		for account in self.owned_accounts().await? {
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
		self.normalize_transfer(txid, &Asset::Native, |t| {
			categorize_for_account(Some(t.from.as_str()), Some(t.to.as_str()), account)
		})
		.await
	}

	async fn get_transaction(&self, txid: &str) -> Result<NormalizedTransaction, LedgerError> {
		let managed = managed_set(self.owned_accounts().await?);
		self.normalize_transfer(txid, &Asset::Native, |t| {
			categorize_for_managed_set(Some(t.from.as_str()), Some(t.to.as_str()), &managed)
		})
		.await
	}

	async fn get_native_transaction(&self, txid: &str) -> Result<Value, LedgerError> {
		self.client.raw_transaction(txid).await
	}

	async fn generate_account(
		&self,
		params: GenerateAccountParams,
	) -> Result<GeneratedAccount, LedgerError> {
		let generated = self.client.generate_address().await?;
		self.ctx
			.accounts
			.save_account(
				&self.ctx.slug,
				AccountRecord {
					address: generated.address.clone(),
					secret: Some(generated.private_key),
					label: params.name,
					created_at: Utc::now(),
				},
			)
			.await?;
		Ok(GeneratedAccount {
			address: generated.address,
			extra: generated.hex_address.map(|hex| json!({ "hex_address": hex })),
		})
	}

	async fn is_address(&self, value: &str) -> Result<AddressCheck, LedgerError> {
		Ok(AddressCheck {
			address: value.to_string(),
			valid: self.client.validate_address(value).await?,
		})
	}

	async fn perform_withdraw(
		&self,
		request: WithdrawalRequest,
	) -> Result<WithdrawalReceipt, LedgerError> {
		let sender = self.prepare(&request).await?;
		let raw = to_raw_amount(request.amount, SUN_DECIMALS)?;

		let unsigned = self
			.client
			.create_transaction(&sender, &request.receiver, raw)
			.await?;
		let txid = self.sign_and_broadcast(&sender, unsigned).await?;
		let amount = from_raw_amount(raw, SUN_DECIMALS)?;
		self.record(&txid, sender, request.receiver, amount, Asset::Native)
			.await;

		Ok(WithdrawalReceipt {
			txid,
			amount,
			fee: None,
		})
	}
}

#[async_trait]
impl ChangeSource for TronAdapter {
	async fn current_height(&self) -> Result<u64, LedgerError> {
		Ok(self.client.now_block().await?.height())
	}

	async fn managed_accounts(&self) -> Result<HashSet<String>, LedgerError> {
		Ok(managed_set(self.owned_accounts().await?))
	}

	async fn scan(
		&self,
		from_exclusive: u64,
		to_inclusive: u64,
		accounts: &HashSet<String>,
	) -> Result<ChangeSet, LedgerError> {
		let mut blocks = Vec::new();
		for height in (from_exclusive + 1)..=to_inclusive {
			let block = self.client.block_by_num(height).await?;
			let mut transactions = Vec::new();
			for tx in &block.transactions {
				if let Some(record) = self.observe(tx, height).await? {
					if record.touches(accounts) {
						transactions.push(record);
					}
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
		Ok(self.client.transaction_info(txid).await?.block_number)
	}
}
