//! nodeos and keosd HTTP API client.
//!
//! Transactions are assembled locally from `get_info`, their action data is serialized
//! by `abi_json_to_bin`, signed by keosd and pushed unpacked to nodeos.

use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime};
use serde_json::{json, Value};

use crate::{
	models::eosio::{
		EosioAction, EosioActions, EosioCurrencyStats, EosioInfo, EosioPushResult, EosioTransaction,
	},
	services::ledger::{
		clients::from_value,
		transports::{LedgerTransport, TransportError},
		LedgerError,
	},
};

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const NOT_FOUND_MARKERS: [&str; 4] = ["not found", "can not be found", "cannot be found", "unknown"];

fn map_error(err: TransportError) -> LedgerError {
	match err {
		TransportError::Rpc { code, message } => {
			let lower = message.to_lowercase();
			if NOT_FOUND_MARKERS.iter().any(|m| lower.contains(m)) {
				LedgerError::not_found(message)
			} else {
				TransportError::Rpc { code, message }.into()
			}
		}
		other => other.into(),
	}
}

/// TaPoS reference fields taken from the last irreversible block
fn tapos(info: &EosioInfo) -> Result<(u64, u32), LedgerError> {
	let block_id = info
		.last_irreversible_block_id
		.as_deref()
		.ok_or_else(|| LedgerError::internal("get_info returned no irreversible block id"))?;
	let bytes = hex::decode(block_id)
		.map_err(|e| LedgerError::internal(format!("Malformed block id {}: {}", block_id, e)))?;
	let prefix: [u8; 4] = bytes
		.get(8..12)
		.and_then(|b| b.try_into().ok())
		.ok_or_else(|| LedgerError::internal(format!("Block id too short: {}", block_id)))?;

	Ok((
		info.last_irreversible_block_num & 0xffff,
		u32::from_le_bytes(prefix),
	))
}

fn expiration(info: &EosioInfo, expire_seconds: u64) -> Result<String, LedgerError> {
	let head_time = info
		.head_block_time
		.as_deref()
		.ok_or_else(|| LedgerError::internal("get_info returned no head block time"))?;
	let head = NaiveDateTime::parse_from_str(head_time, "%Y-%m-%dT%H:%M:%S%.f")
		.map_err(|e| LedgerError::internal(format!("Malformed head block time: {}", e)))?;
	let expires = head + Duration::seconds(expire_seconds as i64);
	Ok(expires.format(TIME_FORMAT).to_string())
}

#[async_trait]
pub trait EosioClientTrait: Send + Sync {
	async fn info(&self) -> Result<EosioInfo, LedgerError>;

	/// Balances such as `["1.0000 EOS"]`, empty when the account holds none
	async fn currency_balance(
		&self,
		contract: &str,
		account: &str,
		symbol: &str,
	) -> Result<Vec<String>, LedgerError>;

	async fn currency_stats(
		&self,
		contract: &str,
		symbol: &str,
	) -> Result<EosioCurrencyStats, LedgerError>;

	async fn account(&self, name: &str) -> Result<Value, LedgerError>;

	async fn transaction(&self, id: &str) -> Result<EosioTransaction, LedgerError>;

	async fn raw_transaction(&self, id: &str) -> Result<Value, LedgerError>;

	async fn actions(&self, account: &str, pos: i64, offset: i64)
		-> Result<EosioActions, LedgerError>;

	/// Builds, signs and pushes a transaction carrying the given actions
	///
	/// When `signing_keys` is empty every key held by the wallet is offered and
	/// nodeos picks the required ones.
	async fn push_actions(
		&self,
		actions: Vec<EosioAction>,
		signing_keys: Vec<String>,
		expire_seconds: u64,
	) -> Result<EosioPushResult, LedgerError>;

	async fn public_keys(&self) -> Result<Vec<String>, LedgerError>;

	/// Creates a K1 key inside the named keosd wallet
	async fn create_key(&self, wallet_name: &str) -> Result<String, LedgerError>;
}

#[derive(Clone, Debug)]
pub struct EosioClient<T: LedgerTransport> {
	transport: T,
	wallet: Option<T>,
}

impl<T: LedgerTransport> EosioClient<T> {
	pub fn new(transport: T, wallet: Option<T>) -> Self {
		Self { transport, wallet }
	}

	async fn chain(&self, path: &str, body: Value) -> Result<Value, LedgerError> {
		self.transport
			.send_raw_request(path, Some(body))
			.await
			.map_err(map_error)
	}

	async fn keosd(&self, path: &str, body: Option<Value>) -> Result<Value, LedgerError> {
		let wallet = self
			.wallet
			.as_ref()
			.ok_or_else(|| LedgerError::unauthorized("No keosd wallet is configured"))?;
		wallet.send_raw_request(path, body).await.map_err(|e| match e {
			TransportError::Rpc { message, .. } => {
				LedgerError::unauthorized(format!("Wallet refused request: {}", message))
			}
			other => other.into(),
		})
	}

	async fn required_keys(
		&self,
		transaction: &Value,
		available: Vec<String>,
	) -> Result<Vec<String>, LedgerError> {
		let value = self
			.chain(
				"v1/chain/get_required_keys",
				json!({"transaction": transaction, "available_keys": available}),
			)
			.await?;
		from_value(value.get("required_keys").cloned().unwrap_or(Value::Null))
	}
}

#[async_trait]
impl<T: LedgerTransport> EosioClientTrait for EosioClient<T> {
	async fn info(&self) -> Result<EosioInfo, LedgerError> {
		from_value(self.chain("v1/chain/get_info", json!({})).await?)
	}

	async fn currency_balance(
		&self,
		contract: &str,
		account: &str,
		symbol: &str,
	) -> Result<Vec<String>, LedgerError> {
		from_value(
			self.chain(
				"v1/chain/get_currency_balance",
				json!({"code": contract, "account": account, "symbol": symbol}),
			)
			.await?,
		)
	}

	async fn currency_stats(
		&self,
		contract: &str,
		symbol: &str,
	) -> Result<EosioCurrencyStats, LedgerError> {
		let mut value = self
			.chain(
				"v1/chain/get_currency_stats",
				json!({"code": contract, "symbol": symbol}),
			)
			.await?;
		let stats = value
			.get_mut(symbol)
			.map(Value::take)
			.ok_or_else(|| {
				LedgerError::not_found(format!("Currency {} not found on {}", symbol, contract))
			})?;
		from_value(stats)
	}

	async fn account(&self, name: &str) -> Result<Value, LedgerError> {
		self.chain("v1/chain/get_account", json!({"account_name": name}))
			.await
	}

	async fn transaction(&self, id: &str) -> Result<EosioTransaction, LedgerError> {
		from_value(self.raw_transaction(id).await?)
	}

	async fn raw_transaction(&self, id: &str) -> Result<Value, LedgerError> {
		self.chain("v1/history/get_transaction", json!({"id": id}))
			.await
	}

	async fn actions(
		&self,
		account: &str,
		pos: i64,
		offset: i64,
	) -> Result<EosioActions, LedgerError> {
		from_value(
			self.chain(
				"v1/history/get_actions",
				json!({"account_name": account, "pos": pos, "offset": offset}),
			)
			.await?,
		)
	}

	async fn push_actions(
		&self,
		actions: Vec<EosioAction>,
		signing_keys: Vec<String>,
		expire_seconds: u64,
	) -> Result<EosioPushResult, LedgerError> {
		let info = self.info().await?;
		let (ref_block_num, ref_block_prefix) = tapos(&info)?;

		let mut packed_actions = Vec::with_capacity(actions.len());
		for action in actions {
			let bin = self
				.chain(
					"v1/chain/abi_json_to_bin",
					json!({"code": action.account, "action": action.name, "args": action.data}),
				)
				.await?;
			let binargs = bin
				.get("binargs")
				.cloned()
				.ok_or_else(|| LedgerError::internal("abi_json_to_bin returned no binargs"))?;
			packed_actions.push(EosioAction {
				data: binargs,
				..action
			});
		}

		let transaction = json!({
			"expiration": expiration(&info, expire_seconds)?,
			"ref_block_num": ref_block_num,
			"ref_block_prefix": ref_block_prefix,
			"max_net_usage_words": 0,
			"max_cpu_usage_ms": 0,
			"delay_sec": 0,
			"context_free_actions": [],
			"actions": packed_actions,
			"transaction_extensions": []
		});

		let available = if signing_keys.is_empty() {
			self.public_keys().await?
		} else {
			signing_keys
		};
		let keys = self.required_keys(&transaction, available).await?;

		let signed = self
			.keosd(
				"v1/wallet/sign_transaction",
				Some(json!([transaction, keys, info.chain_id])),
			)
			.await?;
		let signatures = signed
			.get("signatures")
			.cloned()
			.ok_or_else(|| LedgerError::unauthorized("Wallet returned no signatures"))?;

		log::debug!("Pushing EOSIO transaction expiring {}", transaction["expiration"]);
		from_value(
			self.chain(
				"v1/chain/push_transaction",
				json!({
					"signatures": signatures,
					"compression": "none",
					"packed_context_free_data": "",
					"transaction": transaction
				}),
			)
			.await?,
		)
	}

	async fn public_keys(&self) -> Result<Vec<String>, LedgerError> {
		from_value(self.keosd("v1/wallet/get_public_keys", None).await?)
	}

	async fn create_key(&self, wallet_name: &str) -> Result<String, LedgerError> {
		from_value(
			self.keosd("v1/wallet/create_key", Some(json!([wallet_name, "K1"])))
				.await?,
		)
	}
}
