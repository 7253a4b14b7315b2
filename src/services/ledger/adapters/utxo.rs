//! Bitcoin Core style wallets.
//!
//! Accounts are wallet labels, `_` standing for the default label. The node tracks its
//! own wallet history, so nothing here depends on the transaction log.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
	models::{
		utxo::{ListedTransaction, UnspentOutput},
		AddressCheck, Balance, GenerateAccountParams, GeneratedAccount, NormalizedTransaction,
		Page, TransactionCategory, UtxoSettings, WithdrawalReceipt, WithdrawalRequest,
	},
	services::{
		ledger::{
			adapters::{global_balance, AdapterContext},
			Capabilities, LedgerAdapter, LedgerError, UtxoClientTrait,
		},
		withdrawal::{candidates, SenderFilter, UtxoWithdrawal, DEFAULT_LABEL_ALIAS},
	},
	utils::amount::round_to_precision,
};

fn label_of(account: &str) -> &str {
	if account == DEFAULT_LABEL_ALIAS {
		""
	} else {
		account
	}
}

fn category_of(node_category: &str) -> TransactionCategory {
	match node_category {
		"send" => TransactionCategory::Send,
		"receive" | "generate" => TransactionCategory::Receive,
		_ => TransactionCategory::Other,
	}
}

/// Node confirmations, with unconfirmed or conflicted transactions reported as pending
fn confirmations_of(node_confirmations: i64) -> Option<u64> {
	(node_confirmations > 0).then_some(node_confirmations as u64)
}

pub struct UtxoAdapter {
	route: String,
	client: Arc<dyn UtxoClientTrait>,
	settings: UtxoSettings,
	ctx: AdapterContext,
}

impl UtxoAdapter {
	pub fn new(
		route: impl Into<String>,
		client: Arc<dyn UtxoClientTrait>,
		settings: UtxoSettings,
		ctx: AdapterContext,
	) -> Self {
		Self {
			route: route.into(),
			client,
			settings,
			ctx,
		}
	}

	fn round(&self, amount: Decimal) -> Decimal {
		round_to_precision(amount, self.settings.precision)
	}

	async fn account_filter(&self, account: &str) -> Result<SenderFilter, LedgerError> {
		if account != DEFAULT_LABEL_ALIAS && self.client.validate_address(account).await?.isvalid {
			Ok(SenderFilter::Address(account.to_string()))
		} else {
			Ok(SenderFilter::Label(label_of(account).to_string()))
		}
	}

	fn sum(&self, outputs: &[UnspentOutput]) -> Decimal {
		self.round(outputs.iter().map(|o| o.amount).sum())
	}

	fn from_listed(&self, listed: ListedTransaction) -> NormalizedTransaction {
		NormalizedTransaction {
			id: listed.txid,
			amount: self.round(listed.amount.abs()),
			confirmations: confirmations_of(listed.confirmations),
			category: category_of(&listed.category),
			from: None,
			to: listed.address,
			extra: listed.label.map(|label| json!({ "label": label })),
		}
	}
}

#[async_trait]
impl LedgerAdapter for UtxoAdapter {
	fn route(&self) -> &str {
		&self.route
	}

	fn capabilities(&self) -> Capabilities {
		Capabilities {
			sub_fee: true,
			idempotent_accounts: true,
			explorer: self.ctx.explorer,
			..Capabilities::default()
		}
	}

	async fn list_accounts(&self) -> Result<Vec<String>, LedgerError> {
		Ok(self
			.client
			.list_labels()
			.await?
			.into_iter()
			.map(|label| {
				if label.is_empty() {
					DEFAULT_LABEL_ALIAS.to_string()
				} else {
					label
				}
			})
			.collect())
	}

	async fn get_account_balance(&self, account: &str) -> Result<Balance, LedgerError> {
		let filter = self.account_filter(account).await?;
		let outputs = candidates(self.client.list_unspent(1).await?, &filter);
		Ok(Balance {
			account: Some(account.to_string()),
			balance: self.sum(&outputs),
		})
	}

	async fn get_global_balance(&self) -> Result<Balance, LedgerError> {
		let outputs = candidates(self.client.list_unspent(1).await?, &SenderFilter::Wallet);
		Ok(global_balance([Balance {
			account: None,
			balance: self.sum(&outputs),
		}]))
	}

	async fn list_account_transactions(
		&self,
		account: &str,
		page: Page,
	) -> Result<Vec<NormalizedTransaction>, LedgerError> {
		let listed = self
			.client
			.list_transactions(label_of(account), page.limit(), page.offset())
			.await?;
		// the node returns the window oldest first
		Ok(listed
			.into_iter()
			.rev()
			.map(|tx| self.from_listed(tx))
			.collect())
	}

	async fn get_account_transaction(
		&self,
		account: &str,
		txid: &str,
	) -> Result<NormalizedTransaction, LedgerError> {
		let tx = self.client.get_transaction(txid).await?;
		let wanted = label_of(account);
		let mine: Vec<_> = tx
			.details
			.iter()
			.filter(|detail| {
				detail.belongs_to(account) || (wanted.is_empty() && detail.label.as_deref() == Some(""))
			})
			.collect();

		let sent = mine.iter().find(|d| d.category == "send");
		let received = mine.iter().find(|d| d.category != "send");
		let (category, detail) = match (sent, received) {
			(Some(_), Some(r)) => (TransactionCategory::Other, r),
			(Some(s), None) => (TransactionCategory::Send, s),
			(None, Some(r)) => (TransactionCategory::Receive, r),
			(None, None) => {
				return Err(LedgerError::not_found(format!(
					"Transaction {} does not involve {}",
					txid, account
				)))
			}
		};

		Ok(NormalizedTransaction {
			id: tx.txid.clone(),
			amount: self.round(detail.amount.abs()),
			confirmations: confirmations_of(tx.confirmations),
			category,
			from: None,
			to: detail.address.clone(),
			extra: tx.fee.map(|fee| json!({ "fee": fee.abs() })),
		})
	}

	async fn get_transaction(&self, txid: &str) -> Result<NormalizedTransaction, LedgerError> {
		let tx = self.client.get_transaction(txid).await?;
		let category = if tx.amount > Decimal::ZERO {
			TransactionCategory::Receive
		} else if tx.amount < Decimal::ZERO {
			TransactionCategory::Send
		} else {
			TransactionCategory::Other
		};

		Ok(NormalizedTransaction {
			id: tx.txid,
			amount: self.round(tx.amount.abs()),
			confirmations: confirmations_of(tx.confirmations),
			category,
			from: None,
			to: tx.details.first().and_then(|d| d.address.clone()),
			extra: tx.fee.map(|fee| json!({ "fee": fee.abs() })),
		})
	}

	async fn get_native_transaction(&self, txid: &str) -> Result<Value, LedgerError> {
		self.client.get_raw_transaction(txid).await
	}

	async fn generate_account(
		&self,
		params: GenerateAccountParams,
	) -> Result<GeneratedAccount, LedgerError> {
		let label = label_of(params.name.as_deref().unwrap_or(DEFAULT_LABEL_ALIAS)).to_string();

		let address = match self
			.client
			.get_addresses_by_label(&label)
			.await?
			.into_iter()
			.next()
		{
			Some(existing) => existing,
			None => self.client.get_new_address(&label).await?,
		};

		Ok(GeneratedAccount {
			address,
			extra: Some(json!({ "label": label })),
		})
	}

	async fn is_address(&self, value: &str) -> Result<AddressCheck, LedgerError> {
		let validation = self.client.validate_address(value).await?;
		Ok(AddressCheck {
			address: value.to_string(),
			valid: validation.isvalid,
		})
	}

	async fn perform_withdraw(
		&self,
		request: WithdrawalRequest,
	) -> Result<WithdrawalReceipt, LedgerError> {
		UtxoWithdrawal::new(self.client.as_ref(), &self.settings, &self.route)
			.execute(request)
			.await
	}
}
