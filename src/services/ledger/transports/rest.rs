//! REST style transport where each call is a POST to `{base}/{method}`.
//!
//! Used for the TRON full node (`/wallet/*`), nodeos (`/v1/chain/*`, `/v1/history/*`)
//! and keosd (`/v1/wallet/*`).

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use url::Url;

use crate::{
	models::{Ledger, RpcCredentials, RpcUrl},
	services::ledger::transports::{
		http::{base_http_client, probe, weighted_urls},
		EndpointManager, LedgerTransport, RotatingTransport, TransportError,
	},
	utils::http::{create_retryable_http_client, HttpRetryConfig, TransientErrorRetryStrategy},
};

#[derive(Clone, Debug)]
pub struct RestTransportClient {
	pub client: Arc<Client>,
	endpoint_manager: EndpointManager,
	credentials: Option<RpcCredentials>,
	/// Path probed when connecting, e.g. `wallet/getnowblock`
	health_path: String,
	/// Fields merged into every object body
	default_fields: Map<String, Value>,
}

fn join_url(base_url: &str, path: &str) -> String {
	format!(
		"{}/{}",
		base_url.trim_end_matches('/'),
		path.trim_start_matches('/')
	)
}

impl RestTransportClient {
	pub async fn new(ledger: &Ledger, health_path: &str) -> Result<Self, anyhow::Error> {
		Self::from_urls(&ledger.rpc_urls, ledger.rpc_credentials.clone(), health_path).await
	}

	pub async fn from_urls(
		rpc_urls: &[RpcUrl],
		credentials: Option<RpcCredentials>,
		health_path: &str,
	) -> Result<Self, anyhow::Error> {
		let urls = weighted_urls(rpc_urls);
		let http_client = base_http_client()?;
		let client = create_retryable_http_client(
			&HttpRetryConfig::default(),
			http_client.clone(),
			Some(TransientErrorRetryStrategy),
		);

		for url in urls.iter() {
			let probe_url = join_url(url, health_path);
			if !probe(&http_client, &probe_url, &json!({}), credentials.as_ref()).await {
				continue;
			}

			let fallback_urls: Vec<String> = urls.iter().filter(|u| *u != url).cloned().collect();

			return Ok(Self {
				client: Arc::new(http_client),
				endpoint_manager: EndpointManager::new(client, url, fallback_urls)
					.with_credentials(credentials.clone()),
				credentials,
				health_path: health_path.to_string(),
				default_fields: Map::new(),
			});
		}

		Err(anyhow::anyhow!("All REST URLs failed to connect"))
	}

	/// Adds fields sent with every object body, e.g. `{"visible": true}` for TRON
	pub fn with_default_fields(mut self, fields: Value) -> Self {
		if let Value::Object(fields) = fields {
			self.default_fields = fields;
		}
		self
	}

	pub fn set_retry_config(&mut self, config: &HttpRetryConfig) {
		let client = create_retryable_http_client(
			config,
			(*self.client).clone(),
			Some(TransientErrorRetryStrategy),
		);
		self.endpoint_manager.update_client(client);
	}
}

#[async_trait]
impl LedgerTransport for RestTransportClient {
	async fn get_current_url(&self) -> String {
		self.endpoint_manager.active_url.read().await.clone()
	}

	async fn send_raw_request(
		&self,
		method: &str,
		params: Option<Value>,
	) -> Result<Value, TransportError> {
		self.endpoint_manager
			.send_raw_request(self, method, params)
			.await
	}

	fn customize_request(&self, _method: &str, params: Option<Value>) -> Value {
		match params {
			Some(Value::Object(mut body)) => {
				for (key, value) in &self.default_fields {
					body.entry(key.clone()).or_insert_with(|| value.clone());
				}
				Value::Object(body)
			}
			Some(other) => other,
			None => Value::Object(self.default_fields.clone()),
		}
	}

	fn request_url(&self, base_url: &str, method: &str) -> String {
		join_url(base_url, method)
	}
}

#[async_trait]
impl RotatingTransport for RestTransportClient {
	async fn try_connect(&self, url: &str) -> Result<(), TransportError> {
		let probe_url = join_url(url, &self.health_path);
		if probe(&self.client, &probe_url, &json!({}), self.credentials.as_ref()).await {
			Ok(())
		} else {
			Err(TransportError::connection(format!("Failed to connect to {}", url)))
		}
	}

	async fn update_client(&self, url: &str) -> Result<(), TransportError> {
		let parsed_url = Url::parse(url)
			.map_err(|_| TransportError::connection(format!("Invalid URL: {}", url)))?;
		let mut active_url = self.endpoint_manager.active_url.write().await;
		*active_url = parsed_url.as_str().trim_end_matches('/').to_string();
		Ok(())
	}
}
