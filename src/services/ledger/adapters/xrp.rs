//! XRP ledger with a single main account.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde_json::{json, Value};
use std::{collections::HashSet, str::FromStr, sync::Arc};

use crate::{
	models::{
		xrp::XrpTransaction, AddressCheck, Asset, Balance, GenerateAccountParams,
		GeneratedAccount, LoggedTransaction, NormalizedTransaction, Page, TransactionCategory,
		WithdrawalReceipt, WithdrawalRequest, XrpSettings,
	},
	services::{
		ledger::{
			adapters::{global_balance, AdapterContext},
			categorize_for_account, categorize_for_managed_set, confirmations, managed_set,
			Capabilities, LedgerAdapter, LedgerError, XrpClientTrait,
		},
		observer::{ChangeSet, ChangeSource},
	},
	utils::{
		address::is_valid_xrp_address,
		amount::{from_base_units, to_base_units},
	},
};

const DROPS_DECIMALS: u32 = 6;
const ACCOUNT_TX_PAGE: u32 = 200;

fn drops_to_amount(drops: u64) -> Result<Decimal, LedgerError> {
	from_base_units(drops, DROPS_DECIMALS).map_err(LedgerError::internal)
}

pub struct XrpAdapter {
	route: String,
	client: Arc<dyn XrpClientTrait>,
	settings: XrpSettings,
	ctx: AdapterContext,
}

impl XrpAdapter {
	pub fn new(
		route: impl Into<String>,
		client: Arc<dyn XrpClientTrait>,
		settings: XrpSettings,
		ctx: AdapterContext,
	) -> Self {
		Self {
			route: route.into(),
			client,
			settings,
			ctx,
		}
	}

	/// Fee in drops for a priority, scaled by the current server load
	async fn fee_drops(&self, request: &WithdrawalRequest) -> Result<u64, LedgerError> {
		let fee = self.client.fee().await?;
		let base = Decimal::from_str(&fee.drops.base_fee).map_err(|e| {
			LedgerError::internal(format!("Bad base fee {}: {}", fee.drops.base_fee, e))
		})?;
		let load_factor = self.client.load_factor().await?;
		let multiplier = self.settings.fee_multipliers.get(request.options.priority);

		(base * multiplier * load_factor)
			.ceil()
			.to_u64()
			.ok_or_else(|| LedgerError::internal("Fee out of range"))
	}

	/// Native XRP payments only, everything else is not a wallet transaction
	fn payment(&self, tx: XrpTransaction) -> Result<(XrpTransaction, Decimal), LedgerError> {
		if tx.transaction_type != "Payment" {
			return Err(LedgerError::not_found(format!(
				"Transaction {} is a {}, not a payment",
				tx.hash, tx.transaction_type
			)));
		}
		let drops = tx.native_drops().ok_or_else(|| {
			LedgerError::not_found(format!("Transaction {} does not move XRP", tx.hash))
		})?;
		let amount = drops_to_amount(drops)?;
		Ok((tx, amount))
	}

	async fn normalize(
		&self,
		txid: &str,
		category_of: impl FnOnce(&XrpTransaction) -> TransactionCategory + Send,
	) -> Result<NormalizedTransaction, LedgerError> {
		let (tx, amount) = self.payment(self.client.transaction(txid).await?)?;
		let current_height = self.client.closed_ledger_index().await?;
		let height = tx.validated.unwrap_or(false).then_some(tx.ledger_index).flatten();

		Ok(NormalizedTransaction {
			id: tx.hash.clone(),
			amount,
			confirmations: confirmations(current_height, height),
			category: category_of(&tx),
			from: Some(tx.account.clone()),
			to: tx.destination.clone(),
			extra: tx
				.destination_tag
				.map(|tag| json!({ "destination_tag": tag })),
		})
	}
}

#[async_trait]
impl LedgerAdapter for XrpAdapter {
	fn route(&self) -> &str {
		&self.route
	}

	fn capabilities(&self) -> Capabilities {
		Capabilities {
			destination_tags: true,
			sub_fee: true,
			explorer: self.ctx.explorer,
			..Capabilities::default()
		}
	}

	async fn list_accounts(&self) -> Result<Vec<String>, LedgerError> {
		Ok(vec![self.settings.main_account.clone()])
	}

	async fn get_account_balance(&self, account: &str) -> Result<Balance, LedgerError> {
		let drops = self.client.account_balance(account).await?;
		Ok(Balance {
			account: Some(account.to_string()),
			balance: drops_to_amount(drops)?,
		})
	}

	async fn get_global_balance(&self) -> Result<Balance, LedgerError> {
		let main = self.get_account_balance(&self.settings.main_account).await?;
		Ok(global_balance([main]))
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
		self.normalize(txid, |tx| {
			categorize_for_account(Some(tx.account.as_str()), tx.destination.as_deref(), account)
		})
		.await
	}

	async fn get_transaction(&self, txid: &str) -> Result<NormalizedTransaction, LedgerError> {
		let managed = managed_set([&self.settings.main_account]);
		self.normalize(txid, |tx| {
			categorize_for_managed_set(Some(tx.account.as_str()), tx.destination.as_deref(), &managed)
		})
		.await
	}

	async fn get_native_transaction(&self, txid: &str) -> Result<Value, LedgerError> {
		self.client.raw_transaction(txid).await
	}

	async fn generate_account(
		&self,
		_params: GenerateAccountParams,
	) -> Result<GeneratedAccount, LedgerError> {
		let wallet = self.client.wallet_propose().await?;
		Ok(GeneratedAccount {
			address: wallet.account_id,
			extra: Some(json!({
				"secret": wallet.master_seed,
				"public_key": wallet.public_key,
			})),
		})
	}

	async fn is_address(&self, value: &str) -> Result<AddressCheck, LedgerError> {
		Ok(AddressCheck {
			address: value.to_string(),
			valid: is_valid_xrp_address(value),
		})
	}

	async fn perform_withdraw(
		&self,
		request: WithdrawalRequest,
	) -> Result<WithdrawalReceipt, LedgerError> {
		if self.settings.require_destination_tag && request.options.destination_tag.is_none() {
			return Err(LedgerError::invalid_request(
				"A destination tag is required",
			));
		}
		if !is_valid_xrp_address(&request.receiver) {
			return Err(LedgerError::invalid_request(format!(
				"Invalid receiver {}",
				request.receiver
			)));
		}
		if let Some(sender) = &request.sender {
			if sender != &self.settings.main_account {
				return Err(LedgerError::unauthorized(format!(
					"No secret held for {}",
					sender
				)));
			}
		}
		let secret = self
			.settings
			.main_account_secret
			.as_deref()
			.ok_or_else(|| LedgerError::unauthorized("Main account secret is not configured"))?;

		let fee = self.fee_drops(&request).await?;
		let mut drops = u64::try_from(
			to_base_units(request.amount, DROPS_DECIMALS).map_err(LedgerError::invalid_request)?,
		)
		.map_err(|_| LedgerError::invalid_request("Amount out of range"))?;
		if request.options.sub_fee {
			if fee >= drops {
				return Err(LedgerError::invalid_request(format!(
					"Fee of {} drops is not lower than the amount",
					fee
				)));
			}
			drops -= fee;
		}
		if drops == 0 {
			return Err(LedgerError::invalid_request("Amount must be positive"));
		}

		let mut tx_json = json!({
			"TransactionType": "Payment",
			"Account": self.settings.main_account,
			"Destination": request.receiver,
			"Amount": drops.to_string(),
			"Fee": fee.to_string(),
		});
		if let Some(tag) = request.options.destination_tag {
			tx_json["DestinationTag"] = json!(tag);
		}

		let result = self.client.submit(tx_json, secret).await?;
		let txid = match (result.accepted(), result.hash()) {
			(true, Some(hash)) => hash,
			(false, Some(hash)) => {
				return Err(LedgerError::broadcast(
					hash,
					format!(
						"{}: {}",
						result.engine_result,
						result.engine_result_message.unwrap_or_default()
					),
				))
			}
			(_, None) => {
				return Err(LedgerError::invalid_request(format!(
					"Submission rejected: {}",
					result.engine_result
				)))
			}
		};

		let amount = drops_to_amount(drops)?;
		self.ctx
			.record_withdrawal(LoggedTransaction {
				txid: txid.clone(),
				block_number: None,
				from: Some(self.settings.main_account.clone()),
				to: Some(request.receiver),
				amount,
				asset: Asset::Native,
				extra: request
					.options
					.destination_tag
					.map(|tag| json!({ "destination_tag": tag })),
				observed_at: Utc::now(),
				observed: false,
			})
			.await;

		Ok(WithdrawalReceipt {
			txid,
			amount,
			fee: Some(drops_to_amount(fee)?),
		})
	}
}

#[async_trait]
impl ChangeSource for XrpAdapter {
	async fn current_height(&self) -> Result<u64, LedgerError> {
		self.client.closed_ledger_index().await
	}

	async fn managed_accounts(&self) -> Result<HashSet<String>, LedgerError> {
		Ok(managed_set([&self.settings.main_account]))
	}

	async fn scan(
		&self,
		from_exclusive: u64,
		to_inclusive: u64,
		accounts: &HashSet<String>,
	) -> Result<ChangeSet, LedgerError> {
		let mut found = Vec::new();
		let mut marker = None;

		loop {
			let page = self
				.client
				.account_transactions(
					&self.settings.main_account,
					(from_exclusive + 1) as i64,
					to_inclusive as i64,
					ACCOUNT_TX_PAGE,
					marker.take(),
				)
				.await?;

			for entry in page.transactions {
				let succeeded = entry
					.meta
					.as_ref()
					.and_then(|m| m.get("TransactionResult"))
					.and_then(|r| r.as_str())
					== Some("tesSUCCESS");
				if !entry.validated || !succeeded {
					continue;
				}
				let Ok((tx, amount)) = self.payment(entry.tx) else {
					continue;
				};
				let record = LoggedTransaction {
					txid: tx.hash,
					block_number: tx.ledger_index,
					from: Some(tx.account),
					to: tx.destination,
					amount,
					asset: Asset::Native,
					extra: tx.destination_tag.map(|tag| json!({ "destination_tag": tag })),
					observed_at: Utc::now(),
					observed: false,
				};
				if record.touches(accounts) {
					found.push(record);
				}
			}

			match page.marker {
				Some(next) => marker = Some(next),
				None => break,
			}
		}

		Ok(ChangeSet::Accounts(found))
	}

	async fn transaction_height(&self, txid: &str) -> Result<Option<u64>, LedgerError> {
		let tx = self.client.transaction(txid).await?;
		Ok(tx.validated.unwrap_or(false).then_some(tx.ledger_index).flatten())
	}
}
