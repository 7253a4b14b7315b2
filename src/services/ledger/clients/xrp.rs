//! rippled JSON-RPC client.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;

use crate::{
	models::xrp::{XrpAccountTransactions, XrpFee, XrpSubmitResult, XrpTransaction, XrpWallet},
	services::ledger::{
		clients::from_value,
		transports::{LedgerTransport, TransportError},
		LedgerError,
	},
};

fn map_rpc_error(err: TransportError) -> LedgerError {
	match err {
		TransportError::Rpc { code, message } => match message.as_str() {
			"txnNotFound" | "actNotFound" | "lgrNotFound" => LedgerError::not_found(message),
			"noNetwork" | "noCurrent" | "noClosed" | "tooBusy" | "amendmentBlocked" => {
				LedgerError::unavailable(message)
			}
			_ => TransportError::Rpc { code, message }.into(),
		},
		other => other.into(),
	}
}

#[async_trait]
pub trait XrpClientTrait: Send + Sync {
	/// Index of the most recently closed ledger
	async fn closed_ledger_index(&self) -> Result<u64, LedgerError>;

	/// Balance of a validated account in drops
	async fn account_balance(&self, account: &str) -> Result<u64, LedgerError>;

	async fn transaction(&self, hash: &str) -> Result<XrpTransaction, LedgerError>;

	async fn raw_transaction(&self, hash: &str) -> Result<Value, LedgerError>;

	async fn account_transactions(
		&self,
		account: &str,
		ledger_min: i64,
		ledger_max: i64,
		limit: u32,
		marker: Option<Value>,
	) -> Result<XrpAccountTransactions, LedgerError>;

	async fn fee(&self) -> Result<XrpFee, LedgerError>;

	/// Current server load factor, 1 when idle
	async fn load_factor(&self) -> Result<Decimal, LedgerError>;

	async fn wallet_propose(&self) -> Result<XrpWallet, LedgerError>;

	/// Sign-and-submit with the account secret
	async fn submit(&self, tx_json: Value, secret: &str) -> Result<XrpSubmitResult, LedgerError>;
}

#[derive(Clone, Debug)]
pub struct XrpClient<T: LedgerTransport> {
	transport: T,
}

impl<T: LedgerTransport> XrpClient<T> {
	pub fn new(transport: T) -> Self {
		Self { transport }
	}

	async fn call(&self, method: &str, params: Value) -> Result<Value, LedgerError> {
		self.transport
			.send_raw_request(method, Some(params))
			.await
			.map_err(map_rpc_error)
	}
}

#[async_trait]
impl<T: LedgerTransport> XrpClientTrait for XrpClient<T> {
	async fn closed_ledger_index(&self) -> Result<u64, LedgerError> {
		let result = self.call("ledger_closed", json!({})).await?;
		result
			.get("ledger_index")
			.and_then(|i| i.as_u64())
			.ok_or_else(|| LedgerError::internal("ledger_closed without ledger_index"))
	}

	async fn account_balance(&self, account: &str) -> Result<u64, LedgerError> {
		let result = self
			.call(
				"account_info",
				json!({"account": account, "ledger_index": "validated"}),
			)
			.await?;
		result
			.pointer("/account_data/Balance")
			.and_then(|b| b.as_str())
			.and_then(|b| b.parse().ok())
			.ok_or_else(|| LedgerError::internal("account_info without Balance"))
	}

	async fn transaction(&self, hash: &str) -> Result<XrpTransaction, LedgerError> {
		from_value(self.raw_transaction(hash).await?)
	}

	async fn raw_transaction(&self, hash: &str) -> Result<Value, LedgerError> {
		self.call("tx", json!({"transaction": hash, "binary": false}))
			.await
	}

	async fn account_transactions(
		&self,
		account: &str,
		ledger_min: i64,
		ledger_max: i64,
		limit: u32,
		marker: Option<Value>,
	) -> Result<XrpAccountTransactions, LedgerError> {
		let mut params = json!({
			"account": account,
			"ledger_index_min": ledger_min,
			"ledger_index_max": ledger_max,
			"limit": limit,
			"forward": true,
		});
		if let Some(marker) = marker {
			params["marker"] = marker;
		}
		from_value(self.call("account_tx", params).await?)
	}

	async fn fee(&self) -> Result<XrpFee, LedgerError> {
		from_value(self.call("fee", json!({})).await?)
	}

	async fn load_factor(&self) -> Result<Decimal, LedgerError> {
		let result = self.call("server_info", json!({})).await?;
		let factor = result
			.pointer("/info/load_factor")
			.map(|f| f.to_string())
			.ok_or_else(|| LedgerError::internal("server_info without load_factor"))?;
		Decimal::from_str(&factor)
			.map_err(|e| LedgerError::internal(format!("Invalid load factor {}: {}", factor, e)))
	}

	async fn wallet_propose(&self) -> Result<XrpWallet, LedgerError> {
		from_value(self.call("wallet_propose", json!({})).await?)
	}

	async fn submit(&self, tx_json: Value, secret: &str) -> Result<XrpSubmitResult, LedgerError> {
		from_value(
			self.call("submit", json!({"tx_json": tx_json, "secret": secret}))
				.await?,
		)
	}
}
