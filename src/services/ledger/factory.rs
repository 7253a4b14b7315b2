//! Builds the parent adapter of a configured ledger.

use serde_json::json;
use std::sync::Arc;

use crate::{
	models::{Ledger, LedgerSettings, RpcUrl},
	services::ledger::{
		adapters::AdapterContext, EosioAdapter, EosioClient, EvmAdapter, EvmClient,
		HttpTransportClient, LedgerError, RestTransportClient, RpcDialect, TronAdapter,
		TronClient, UtxoAdapter, UtxoClient, WalletAdapter, XrpAdapter, XrpClient,
	},
};

/// bitcoind rejects `net_version`, so UTXO nodes are probed with a call they know
const UTXO_TEST_PAYLOAD: &str =
	r#"{"jsonrpc":"1.0","id":1,"method":"getblockchaininfo","params":[]}"#;
const TRON_HEALTH_PATH: &str = "wallet/getnowblock";
const NODEOS_HEALTH_PATH: &str = "v1/chain/get_info";
const KEOSD_HEALTH_PATH: &str = "v1/wallet/list_wallets";

fn node_unreachable(ledger: &Ledger, e: anyhow::Error) -> LedgerError {
	LedgerError::unavailable(format!("{}: {:#}", ledger.slug, e))
}

/// Connects to the ledger's node and wraps it in the matching adapter
///
/// Auxiliary currencies are not created here, see
/// [`WalletAdapter::list_auxiliary_currencies`].
pub async fn create_wallet_adapter(
	ledger: &Ledger,
	ctx: AdapterContext,
) -> Result<WalletAdapter, LedgerError> {
	let route = ledger.slug.clone();
	match &ledger.settings {
		LedgerSettings::Utxo(settings) => {
			let transport = HttpTransportClient::new(
				ledger,
				RpcDialect::JsonRpc,
				Some(UTXO_TEST_PAYLOAD.to_string()),
			)
			.await
			.map_err(|e| node_unreachable(ledger, e))?;
			let client = Arc::new(UtxoClient::new(transport));
			Ok(WalletAdapter::Utxo(Arc::new(UtxoAdapter::new(
				route,
				client,
				settings.clone(),
				ctx,
			))))
		}
		LedgerSettings::Evm(settings) => {
			let transport = HttpTransportClient::new(ledger, RpcDialect::JsonRpc, None)
				.await
				.map_err(|e| node_unreachable(ledger, e))?;
			let client = Arc::new(EvmClient::new(transport));
			Ok(WalletAdapter::Evm(Arc::new(EvmAdapter::new(
				route,
				client,
				settings.clone(),
				ledger.tokens.clone(),
				ctx,
			))))
		}
		LedgerSettings::Xrp(settings) => {
			let transport = HttpTransportClient::new(ledger, RpcDialect::Rippled, None)
				.await
				.map_err(|e| node_unreachable(ledger, e))?;
			let client = Arc::new(XrpClient::new(transport));
			Ok(WalletAdapter::Xrp(Arc::new(XrpAdapter::new(
				route,
				client,
				settings.clone(),
				ctx,
			))))
		}
		LedgerSettings::Tron(settings) => {
			let transport = RestTransportClient::new(ledger, TRON_HEALTH_PATH)
				.await
				.map_err(|e| node_unreachable(ledger, e))?
				.with_default_fields(json!({"visible": true}));
			let client = Arc::new(TronClient::new(transport));
			Ok(WalletAdapter::Tron(Arc::new(TronAdapter::new(
				route,
				client,
				settings.clone(),
				ledger.tokens.clone(),
				ctx,
			))))
		}
		LedgerSettings::Eosio(settings) => {
			let transport = RestTransportClient::new(ledger, NODEOS_HEALTH_PATH)
				.await
				.map_err(|e| node_unreachable(ledger, e))?;
			let wallet = match &settings.wallet_url {
				Some(url) => {
					let urls = [RpcUrl {
						type_: "rpc".to_string(),
						url: url.clone(),
						weight: 100,
					}];
					let wallet = RestTransportClient::from_urls(&urls, None, KEOSD_HEALTH_PATH)
						.await
						.map_err(|e| node_unreachable(ledger, e))?;
					Some(wallet)
				}
				None => {
					log::warn!("{} has no keosd wallet, withdrawals will be refused", ledger.slug);
					None
				}
			};
			let client = Arc::new(EosioClient::new(transport, wallet));
			Ok(WalletAdapter::Eosio(Arc::new(EosioAdapter::new(
				route,
				client,
				settings.clone(),
				ledger.tokens.clone(),
				ctx,
			))))
		}
	}
}
