//! EOSIO ledgers with keosd-held keys.
//!
//! A currency is a token contract plus symbol. The native currency comes from the
//! ledger settings and mounted tokens reuse every helper here with their own pair.

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
		eosio::{
			EosioAction, EosioActionTrace, EosioAsset, EosioPermissionLevel, EosioTransferData,
		},
		AccountRecord, AddressCheck, Asset, Balance, EosioSettings, GenerateAccountParams,
		GeneratedAccount, LoggedTransaction, NormalizedTransaction, Page, TokenConfig,
		TransactionCategory, WithdrawalReceipt, WithdrawalRequest,
	},
	services::{
		ledger::{
			adapters::{global_balance, AdapterContext},
			categorize_for_account, categorize_for_managed_set, confirmations, managed_set,
			Capabilities, EosioClientTrait, LedgerAdapter, LedgerError,
		},
		observer::{ChangeSet, ChangeSource},
	},
	utils::address::is_valid_eosio_name,
};

const SYSTEM_ACCOUNT: &str = "eosio";
const KEOSD_WALLET: &str = "default";
const ACTIONS_PAGE: i64 = 100;
const TRANSFER_ACTIONS: [&str; 2] = ["transfer", "issue"];

/// Token contract and symbol
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct EosioCurrency {
	pub contract: String,
	pub symbol: String,
}

impl EosioCurrency {
	pub fn asset(&self) -> Asset {
		Asset::Currency {
			contract: self.contract.clone(),
			symbol: self.symbol.clone(),
		}
	}
}

/// A transfer of one currency found in an action
#[derive(Debug, Clone)]
pub(crate) struct EosioTransfer {
	pub from: Option<String>,
	pub to: String,
	pub amount: Decimal,
	pub memo: String,
}

impl EosioTransfer {
	fn extra(&self) -> Option<Value> {
		(!self.memo.is_empty()).then(|| json!({ "memo": self.memo }))
	}
}

/// Reads a `transfer` or `issue` of `currency` out of an action
pub(crate) fn transfer_in(
	action: &EosioAction,
	currency: &EosioCurrency,
) -> Option<EosioTransfer> {
	if action.account != currency.contract || !TRANSFER_ACTIONS.contains(&action.name.as_str()) {
		return None;
	}
	let data: EosioTransferData = serde_json::from_value(action.data.clone()).ok()?;
	let quantity: EosioAsset = data.quantity.parse().ok()?;
	if quantity.symbol != currency.symbol {
		return None;
	}
	let from = data
		.from
		.or_else(|| action.authorization.first().map(|a| a.actor.clone()));
	Some(EosioTransfer {
		from,
		to: data.to,
		amount: quantity.amount,
		memo: data.memo,
	})
}

fn active(actor: &str) -> Vec<EosioPermissionLevel> {
	vec![EosioPermissionLevel {
		actor: actor.to_string(),
		permission: "active".to_string(),
	}]
}

pub struct EosioAdapter {
	route: String,
	pub(crate) client: Arc<dyn EosioClientTrait>,
	settings: EosioSettings,
	tokens: Vec<TokenConfig>,
	pub(crate) ctx: AdapterContext,
	precision: RwLock<HashMap<EosioCurrency, u32>>,
}

impl EosioAdapter {
	pub fn new(
		route: impl Into<String>,
		client: Arc<dyn EosioClientTrait>,
		settings: EosioSettings,
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

	pub(crate) fn native(&self) -> EosioCurrency {
		EosioCurrency {
			contract: self.settings.contract.clone(),
			symbol: self.settings.symbol.clone(),
		}
	}

	pub fn asset(&self) -> Asset {
		self.native().asset()
	}

	/// Native currency followed by every mounted token
	fn observed_currencies(&self) -> Vec<EosioCurrency> {
		let tokens = self.tokens.iter().filter_map(|token| {
			Some(EosioCurrency {
				contract: token.contract.clone(),
				symbol: token.symbol.clone()?,
			})
		});
		std::iter::once(self.native()).chain(tokens).collect()
	}

	/// Configured accounts, the main account when none are, plus generated ones
	pub(crate) async fn owned_accounts(&self) -> Result<Vec<String>, LedgerError> {
		let mut accounts = if self.settings.owned_accounts.is_empty() {
			vec![self.settings.main_account.clone()]
		} else {
			self.settings.owned_accounts.clone()
		};
		for record in self.ctx.accounts.list_accounts(&self.ctx.slug).await? {
			if !accounts.contains(&record.address) {
				accounts.push(record.address);
			}
		}
		Ok(accounts)
	}

	pub(crate) async fn precision_of(&self, currency: &EosioCurrency) -> Result<u32, LedgerError> {
		let configured = self
			.tokens
			.iter()
			.find(|t| {
				t.contract == currency.contract && t.symbol.as_deref() == Some(&currency.symbol)
			})
			.and_then(|t| t.decimals);
		if let Some(decimals) = configured {
			return Ok(decimals);
		}
		if let Some(precision) = self.precision.read().await.get(currency) {
			return Ok(*precision);
		}
		let precision = self
			.client
			.currency_stats(&currency.contract, &currency.symbol)
			.await?
			.precision();
		self.precision
			.write()
			.await
			.insert(currency.clone(), precision);
		Ok(precision)
	}

	pub(crate) async fn balance_of(
		&self,
		account: &str,
		currency: &EosioCurrency,
	) -> Result<Balance, LedgerError> {
		let balances = self
			.client
			.currency_balance(&currency.contract, account, &currency.symbol)
			.await?;
		let mut balance = Decimal::ZERO;
		for entry in balances {
			let asset: EosioAsset = entry.parse().map_err(LedgerError::internal)?;
			if asset.symbol == currency.symbol {
				balance = asset.amount;
				break;
			}
		}
		Ok(Balance {
			account: Some(account.to_string()),
			balance,
		})
	}

	pub(crate) async fn global_balance_of(
		&self,
		currency: &EosioCurrency,
	) -> Result<Balance, LedgerError> {
		let mut balances = Vec::new();
		for account in self.owned_accounts().await? {
			balances.push(self.balance_of(&account, currency).await?);
		}
		Ok(global_balance(balances))
	}

	/// Normalizes the first transfer of `currency` in a transaction
	pub(crate) async fn normalize_transfer<F>(
		&self,
		txid: &str,
		currency: &EosioCurrency,
		categorize: F,
	) -> Result<NormalizedTransaction, LedgerError>
	where
		F: FnOnce(&EosioTransfer) -> TransactionCategory + Send,
	{
		let tx = self.client.transaction(txid).await?;
		if !tx.executed() {
			return Err(LedgerError::not_found(format!(
				"Transaction {} was not executed",
				txid
			)));
		}
		let transfer = tx
			.trx
			.trx
			.actions
			.iter()
			.find_map(|action| transfer_in(action, currency))
			.ok_or_else(|| {
				LedgerError::not_found(format!(
					"Transaction {} does not transfer {}",
					txid, currency.symbol
				))
			})?;
		let irreversible = self.client.info().await?.last_irreversible_block_num;
		let height = tx.block_num.filter(|h| *h <= irreversible);

		Ok(NormalizedTransaction {
			id: tx.id.clone(),
			amount: transfer.amount,
			confirmations: confirmations(irreversible, height),
			category: categorize(&transfer),
			extra: transfer.extra(),
			from: transfer.from,
			to: Some(transfer.to),
		})
	}

	/// Pushes a token transfer of `currency` signed by the sender's active key
	pub(crate) async fn withdraw(
		&self,
		request: WithdrawalRequest,
		currency: &EosioCurrency,
	) -> Result<WithdrawalReceipt, LedgerError> {
		if request.options.sub_fee {
			return Err(LedgerError::invalid_request(
				"EOSIO transfers carry no fee to subtract",
			));
		}
		if self.settings.require_memo && request.options.memo.is_none() {
			return Err(LedgerError::invalid_request("A memo is required"));
		}
		if !is_valid_eosio_name(&request.receiver) {
			return Err(LedgerError::invalid_request(format!(
				"Invalid receiver {}",
				request.receiver
			)));
		}
		let sender = request
			.sender
			.clone()
			.unwrap_or_else(|| self.settings.main_account.clone());
		if !self.owned_accounts().await?.contains(&sender) {
			return Err(LedgerError::unauthorized(format!(
				"{} is not an owned account",
				sender
			)));
		}

		let precision = self.precision_of(currency).await?;
		let amount = request.amount.round_dp(precision);
		if amount <= Decimal::ZERO {
			return Err(LedgerError::invalid_request("Amount must be positive"));
		}
		let memo = request.options.memo.clone().unwrap_or_default();

		let action = EosioAction {
			account: currency.contract.clone(),
			name: "transfer".to_string(),
			authorization: active(&sender),
			data: json!({
				"from": sender,
				"to": request.receiver,
				"quantity": EosioAsset::format(amount, precision, &currency.symbol),
				"memo": memo,
			}),
		};
		let signing_keys: Vec<String> = if sender == self.settings.main_account {
			self.settings.main_account_public_key.iter().cloned().collect()
		} else {
			Vec::new()
		};
		let pushed = self
			.client
			.push_actions(vec![action], signing_keys, self.settings.expire_seconds)
			.await?;

		self.ctx
			.record_withdrawal(LoggedTransaction {
				txid: pushed.transaction_id.clone(),
				block_number: None,
				from: Some(sender),
				to: Some(request.receiver),
				amount,
				asset: currency.asset(),
				extra: (!memo.is_empty()).then(|| json!({ "memo": memo })),
				observed_at: Utc::now(),
				observed: false,
			})
			.await;

		Ok(WithdrawalReceipt {
			txid: pushed.transaction_id,
			amount,
			fee: None,
		})
	}

	/// Transfer records of observed currencies in one page of action traces
	fn observe(
		&self,
		traces: &[EosioActionTrace],
		currencies: &[EosioCurrency],
	) -> Vec<(u64, LoggedTransaction)> {
		traces
			.iter()
			.filter_map(|trace| {
				let action = &trace.action_trace.act;
				currencies.iter().find_map(|currency| {
					transfer_in(action, currency).map(|transfer| {
						let record = LoggedTransaction {
							txid: trace.action_trace.trx_id.clone(),
							block_number: Some(trace.block_num),
							extra: transfer.extra(),
							from: transfer.from,
							to: Some(transfer.to),
							amount: transfer.amount,
							asset: currency.asset(),
							observed_at: Utc::now(),
							observed: false,
						};
						(trace.block_num, record)
					})
				})
			})
			.collect()
	}

	/// Transfers of one account with a block in the range, walking its history backwards
	async fn account_changes(
		&self,
		account: &str,
		from_exclusive: u64,
		to_inclusive: u64,
		currencies: &[EosioCurrency],
	) -> Result<Vec<LoggedTransaction>, LedgerError> {
		let mut found = Vec::new();
		let mut pos = -1;

		loop {
			let page = self
				.client
				.actions(account, pos, -(ACTIONS_PAGE - 1))
				.await?;
			let Some(oldest) = page.actions.iter().map(|a| a.account_action_seq).min() else {
				break;
			};
			let reached_cursor = page.actions.iter().any(|a| a.block_num <= from_exclusive);

			found.extend(
				self.observe(&page.actions, currencies)
					.into_iter()
					.filter(|(height, _)| *height > from_exclusive && *height <= to_inclusive)
					.map(|(_, record)| record),
			);

			if reached_cursor || oldest <= 0 {
				break;
			}
			pos = oldest - 1;
		}

		Ok(found)
	}
}

#[async_trait]
impl LedgerAdapter for EosioAdapter {
	fn route(&self) -> &str {
		&self.route
	}

	fn capabilities(&self) -> Capabilities {
		Capabilities {
			destination_tags: true,
			explorer: self.ctx.explorer,
			..Capabilities::default()
		}
	}

	async fn on_init(&self) -> Result<(), LedgerError> {
		let precision = self.precision_of(&self.native()).await?;
		log::info!(
			"{} uses {}@{} with precision {}",
			self.route,
			self.settings.symbol,
			self.settings.contract,
			precision
		);
		Ok(())
	}

	async fn list_accounts(&self) -> Result<Vec<String>, LedgerError> {
		self.owned_accounts().await
	}

	async fn get_account_balance(&self, account: &str) -> Result<Balance, LedgerError> {
		self.balance_of(account, &self.native()).await
	}

	async fn get_global_balance(&self) -> Result<Balance, LedgerError> {
		self.global_balance_of(&self.native()).await
	}

	async fn list_account_transactions(
		&self,
		account: &str,
		page: Page,
	) -> Result<Vec<NormalizedTransaction>, LedgerError> {
		self.ctx
			.logged_transactions(self, account, &self.asset(), page)
			.await
	}

	async fn get_account_transaction(
		&self,
		account: &str,
		txid: &str,
	) -> Result<NormalizedTransaction, LedgerError> {
		self.normalize_transfer(txid, &self.native(), |t| {
			categorize_for_account(t.from.as_deref(), Some(t.to.as_str()), account)
		})
		.await
	}

	async fn get_transaction(&self, txid: &str) -> Result<NormalizedTransaction, LedgerError> {
		let managed = managed_set(self.owned_accounts().await?);
		self.normalize_transfer(txid, &self.native(), |t| {
			categorize_for_managed_set(t.from.as_deref(), Some(t.to.as_str()), &managed)
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
		let name = params
			.name
			.ok_or_else(|| LedgerError::invalid_request("An account name is required"))?;
		if !is_valid_eosio_name(&name) {
			return Err(LedgerError::invalid_request(format!(
				"Invalid account name {}",
				name
			)));
		}
		let resources = self.settings.new_account.as_ref().ok_or_else(|| {
			LedgerError::unavailable(format!(
				"Account creation is not configured on {}",
				self.route
			))
		})?;
		match self.client.account(&name).await {
			Ok(_) => {
				return Err(LedgerError::conflict(format!(
					"Account {} already exists",
					name
				)))
			}
			Err(LedgerError::NotFound(_)) => {}
			Err(e) => return Err(e),
		}

		let key = self.client.create_key(KEOSD_WALLET).await?;
		let creator = &self.settings.main_account;
		let authority = json!({
			"threshold": 1,
			"keys": [{"key": key, "weight": 1}],
			"accounts": [],
			"waits": [],
		});
		let actions = vec![
			EosioAction {
				account: SYSTEM_ACCOUNT.to_string(),
				name: "newaccount".to_string(),
				authorization: active(creator),
				data: json!({
					"creator": creator,
					"name": name,
					"owner": authority,
					"active": authority,
				}),
			},
			EosioAction {
				account: SYSTEM_ACCOUNT.to_string(),
				name: "buyrambytes".to_string(),
				authorization: active(creator),
				data: json!({
					"payer": creator,
					"receiver": name,
					"bytes": resources.ram_bytes,
				}),
			},
			EosioAction {
				account: SYSTEM_ACCOUNT.to_string(),
				name: "delegatebw".to_string(),
				authorization: active(creator),
				data: json!({
					"from": creator,
					"receiver": name,
					"stake_net_quantity": resources.stake_net,
					"stake_cpu_quantity": resources.stake_cpu,
					"transfer": false,
				}),
			},
		];
		let pushed = self
			.client
			.push_actions(actions, Vec::new(), self.settings.expire_seconds)
			.await?;

		self.ctx
			.accounts
			.save_account(
				&self.ctx.slug,
				AccountRecord {
					address: name.clone(),
					secret: None,
					label: Some(key.clone()),
					created_at: Utc::now(),
				},
			)
			.await?;

		Ok(GeneratedAccount {
			address: name,
			extra: Some(json!({
				"public_key": key,
				"txid": pushed.transaction_id,
			})),
		})
	}

	async fn is_address(&self, value: &str) -> Result<AddressCheck, LedgerError> {
		Ok(AddressCheck {
			address: value.to_string(),
			valid: is_valid_eosio_name(value),
		})
	}

	async fn perform_withdraw(
		&self,
		request: WithdrawalRequest,
	) -> Result<WithdrawalReceipt, LedgerError> {
		self.withdraw(request, &self.native()).await
	}
}

#[async_trait]
impl ChangeSource for EosioAdapter {
	/// The last irreversible block, so only final transfers are reported
	async fn current_height(&self) -> Result<u64, LedgerError> {
		Ok(self.client.info().await?.last_irreversible_block_num)
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
		let currencies = self.observed_currencies();
		let mut seen = HashSet::new();
		let mut found = Vec::new();

		let mut owned: Vec<&String> = accounts.iter().collect();
		owned.sort();
		for account in owned {
			let changes = self
				.account_changes(account, from_exclusive, to_inclusive, &currencies)
				.await?;
			for record in changes {
				if record.touches(accounts) && seen.insert(record.txid.clone()) {
					found.push(record);
				}
			}
		}

		Ok(ChangeSet::Accounts(found))
	}

	async fn transaction_height(&self, txid: &str) -> Result<Option<u64>, LedgerError> {
		let tx = self.client.transaction(txid).await?;
		let irreversible = self.client.info().await?.last_irreversible_block_num;
		Ok(tx.block_num.filter(|h| *h <= irreversible))
	}
}
