//! JSON-RPC transport for ledger nodes.
//!
//! Covers bitcoind style and Ethereum style JSON-RPC, plus the rippled dialect, which wraps
//! params in a one-element array and reports errors inside `result`.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::{sync::Arc, time::Duration};
use url::Url;

use crate::{
	models::{Ledger, RpcCredentials, RpcUrl},
	services::ledger::transports::{
		error_from_body, EndpointManager, LedgerTransport, RotatingTransport, TransportError,
	},
	utils::{
		constants::DEFAULT_RPC_TIMEOUT_SECS,
		http::{create_retryable_http_client, HttpRetryConfig, TransientErrorRetryStrategy},
	},
};

/// Request and response envelope spoken by a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcDialect {
	/// `{"jsonrpc":"2.0","method","params"}`, errors in a top level `error`
	JsonRpc,
	/// `{"method","params":[{..}]}`, errors as `result.status == "error"`
	Rippled,
}

/// HTTP JSON-RPC transport with endpoint rotation
#[derive(Clone, Debug)]
pub struct HttpTransportClient {
	/// Plain client used for connection probes
	pub client: Arc<Client>,
	/// Manages RPC endpoint rotation and request handling for high availability
	endpoint_manager: EndpointManager,
	dialect: RpcDialect,
	credentials: Option<RpcCredentials>,
	/// The stringified payload used for testing the connection
	test_connection_payload: Option<String>,
}

/// Returns usable RPC URLs ordered by descending weight
pub(crate) fn weighted_urls(rpc_urls: &[RpcUrl]) -> Vec<String> {
	let mut urls: Vec<&RpcUrl> = rpc_urls
		.iter()
		.filter(|rpc_url| rpc_url.type_ == "rpc" && rpc_url.weight > 0)
		.collect();
	urls.sort_by(|a, b| b.weight.cmp(&a.weight));
	urls.into_iter().map(|rpc_url| rpc_url.url.clone()).collect()
}

/// Builds the plain client shared by probes and the retrying middleware
pub(crate) fn base_http_client() -> Result<Client, anyhow::Error> {
	reqwest::ClientBuilder::new()
		.pool_idle_timeout(Duration::from_secs(90))
		.pool_max_idle_per_host(32)
		.timeout(Duration::from_secs(DEFAULT_RPC_TIMEOUT_SECS))
		.connect_timeout(Duration::from_secs(20))
		.build()
		.context("Failed to create HTTP client")
}

/// Sends one probe request and reports whether the endpoint answered with a 2xx
pub(crate) async fn probe(
	client: &Client,
	url: &str,
	body: &Value,
	credentials: Option<&RpcCredentials>,
) -> bool {
	let Ok(url) = Url::parse(url) else {
		return false;
	};
	let mut request = client.post(url).json(body);
	if let Some(credentials) = credentials {
		request = request.basic_auth(&credentials.username, Some(&credentials.password));
	}
	match request.send().await {
		Ok(response) => response.status().is_success(),
		Err(_) => false,
	}
}

impl HttpTransportClient {
	/// Creates a transport for a configured ledger
	pub async fn new(
		ledger: &Ledger,
		dialect: RpcDialect,
		test_connection_payload: Option<String>,
	) -> Result<Self, anyhow::Error> {
		Self::from_urls(
			&ledger.rpc_urls,
			ledger.rpc_credentials.clone(),
			dialect,
			test_connection_payload,
		)
		.await
	}

	/// Connects to the heaviest reachable URL and keeps the others as fallbacks
	pub async fn from_urls(
		rpc_urls: &[RpcUrl],
		credentials: Option<RpcCredentials>,
		dialect: RpcDialect,
		test_connection_payload: Option<String>,
	) -> Result<Self, anyhow::Error> {
		let urls = weighted_urls(rpc_urls);
		let http_client = base_http_client()?;
		let client = create_retryable_http_client(
			&HttpRetryConfig::default(),
			http_client.clone(),
			Some(TransientErrorRetryStrategy),
		);

		let test_request = Self::test_request(dialect, test_connection_payload.as_deref())?;

		for url in urls.iter() {
			if !probe(&http_client, url, &test_request, credentials.as_ref()).await {
				continue;
			}

			let fallback_urls: Vec<String> = urls.iter().filter(|u| *u != url).cloned().collect();

			return Ok(Self {
				client: Arc::new(http_client),
				endpoint_manager: EndpointManager::new(client, url, fallback_urls)
					.with_credentials(credentials.clone()),
				dialect,
				credentials,
				test_connection_payload,
			});
		}

		Err(anyhow::anyhow!("All RPC URLs failed to connect"))
	}

	/// Rebuilds the retrying client with a different policy
	pub fn set_retry_config(&mut self, config: &HttpRetryConfig) {
		let client = create_retryable_http_client(
			config,
			(*self.client).clone(),
			Some(TransientErrorRetryStrategy),
		);
		self.endpoint_manager.update_client(client);
	}

	fn test_request(dialect: RpcDialect, payload: Option<&str>) -> Result<Value, anyhow::Error> {
		match payload {
			Some(payload) => {
				serde_json::from_str(payload).context("Failed to parse test payload as JSON")
			}
			None => Ok(match dialect {
				RpcDialect::JsonRpc => json!({"jsonrpc": "2.0", "id": 1, "method": "net_version", "params": []}),
				RpcDialect::Rippled => json!({"method": "server_info", "params": [{}]}),
			}),
		}
	}

	fn unwrap_response(&self, body: Value) -> Result<Value, TransportError> {
		match self.dialect {
			RpcDialect::JsonRpc => {
				if let Some(error) = error_from_body(&body) {
					return Err(error);
				}
				Ok(body.get("result").cloned().unwrap_or(Value::Null))
			}
			RpcDialect::Rippled => {
				let result = body.get("result").cloned().unwrap_or(Value::Null);
				if result.get("status").and_then(|s| s.as_str()) == Some("error") {
					let code = result
						.get("error_code")
						.and_then(|c| c.as_i64())
						.unwrap_or(0);
					let message = result
						.get("error")
						.and_then(|e| e.as_str())
						.unwrap_or("unknown error");
					return Err(TransportError::rpc(code, message));
				}
				Ok(result)
			}
		}
	}
}

#[async_trait]
impl LedgerTransport for HttpTransportClient {
	async fn get_current_url(&self) -> String {
		self.endpoint_manager.active_url.read().await.clone()
	}

	async fn send_raw_request(
		&self,
		method: &str,
		params: Option<Value>,
	) -> Result<Value, TransportError> {
		let body = self
			.endpoint_manager
			.send_raw_request(self, method, params)
			.await?;
		self.unwrap_response(body)
	}

	fn customize_request(&self, method: &str, params: Option<Value>) -> Value {
		match self.dialect {
			RpcDialect::JsonRpc => json!({
				"jsonrpc": "2.0",
				"id": 1,
				"method": method,
				"params": params.unwrap_or_else(|| json!([]))
			}),
			RpcDialect::Rippled => json!({
				"method": method,
				"params": [params.unwrap_or_else(|| json!({}))]
			}),
		}
	}
}

#[async_trait]
impl RotatingTransport for HttpTransportClient {
	async fn try_connect(&self, url: &str) -> Result<(), TransportError> {
		let test_request =
			Self::test_request(self.dialect, self.test_connection_payload.as_deref())
				.map_err(|e| TransportError::request_serialization(e.to_string()))?;

		if probe(&self.client, url, &test_request, self.credentials.as_ref()).await {
			Ok(())
		} else {
			Err(TransportError::connection(format!("Failed to connect to {}", url)))
		}
	}

	async fn update_client(&self, url: &str) -> Result<(), TransportError> {
		let parsed_url = Url::parse(url)
			.map_err(|_| TransportError::connection(format!("Invalid URL: {}", url)))?;
		let normalized_url = parsed_url.as_str().trim_end_matches('/');

		let mut active_url = self.endpoint_manager.active_url.write().await;
		*active_url = normalized_url.to_string();
		Ok(())
	}
}
