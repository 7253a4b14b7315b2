//! Manages the rotation of ledger HTTP endpoints
//!
//! Provides methods for rotating between multiple URLs and sending requests to the active endpoint
//! with automatic fallback to other URLs on failure.
use reqwest_middleware::ClientWithMiddleware;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::{
	models::RpcCredentials,
	services::ledger::transports::{
		error_from_body, RotatingTransport, TransportError, ROTATE_ON_ERROR_CODES,
	},
};

/// Manages the rotation of ledger RPC endpoints
///
/// # Fields
/// * `active_url` - The current active URL
/// * `fallback_urls` - A list of fallback URLs to rotate to
/// * `client` - The retrying client used for every request
/// * `credentials` - Basic auth applied to every request
/// * `rotation_lock` - A lock for managing the rotation process
#[derive(Clone, Debug)]
pub struct EndpointManager {
	pub active_url: Arc<RwLock<String>>,
	pub fallback_urls: Arc<RwLock<Vec<String>>>,
	client: ClientWithMiddleware,
	credentials: Option<RpcCredentials>,
	rotation_lock: Arc<Mutex<()>>,
}

impl EndpointManager {
	pub fn new(client: ClientWithMiddleware, active_url: &str, fallback_urls: Vec<String>) -> Self {
		Self {
			active_url: Arc::new(RwLock::new(active_url.to_string())),
			fallback_urls: Arc::new(RwLock::new(fallback_urls)),
			client,
			credentials: None,
			rotation_lock: Arc::new(Mutex::new(())),
		}
	}

	pub fn with_credentials(mut self, credentials: Option<RpcCredentials>) -> Self {
		self.credentials = credentials;
		self
	}

	/// Replaces the client, e.g. after the retry policy changed
	pub fn update_client(&mut self, client: ClientWithMiddleware) {
		self.client = client;
	}

	/// Rotates to the next available URL
	pub async fn rotate_url<T: RotatingTransport>(
		&self,
		transport: &T,
	) -> Result<(), TransportError> {
		let _guard = self.rotation_lock.lock().await;

		let current_active = self.active_url.read().await.clone();

		let new_url = {
			let mut fallback_urls = self.fallback_urls.write().await;
			match fallback_urls.iter().position(|url| url != &current_active) {
				Some(pos) => fallback_urls.remove(pos),
				None => return Err(TransportError::url_rotation("No fallback URLs available")),
			}
		};

		if transport.try_connect(&new_url).await.is_ok() {
			transport.update_client(&new_url).await?;

			let mut active_url = self.active_url.write().await;
			let mut fallback_urls = self.fallback_urls.write().await;
			tracing::debug!(from = %current_active, to = %new_url, "Rotated RPC endpoint");
			fallback_urls.push(current_active);
			*active_url = new_url;
			Ok(())
		} else {
			let mut fallback_urls = self.fallback_urls.write().await;
			fallback_urls.push(new_url.clone());
			Err(TransportError::url_rotation(format!(
				"Failed to connect to fallback URL {}",
				new_url
			)))
		}
	}

	/// Returns Ok(true) when a rotation happened and the request should be retried
	async fn should_attempt_rotation<T: RotatingTransport>(
		&self,
		transport: &T,
		status: Option<u16>,
	) -> Result<bool, TransportError> {
		let should_rotate = {
			let fallback_urls = self.fallback_urls.read().await;
			!fallback_urls.is_empty()
				&& status.is_none_or(|s| ROTATE_ON_ERROR_CODES.contains(&s))
		};

		if should_rotate {
			self.rotate_url(transport).await.map(|_| true)
		} else {
			Ok(false)
		}
	}

	/// Sends a request to the active endpoint, rotating on network failures and rate limits
	///
	/// Returns the raw JSON body of the first successful response. Error bodies carrying a
	/// node error object are surfaced as `TransportError::Rpc`.
	pub async fn send_raw_request<T: RotatingTransport>(
		&self,
		transport: &T,
		method: &str,
		params: Option<Value>,
	) -> Result<Value, TransportError> {
		loop {
			let current_url = self.active_url.read().await.clone();
			let url = transport.request_url(&current_url, method);
			let request_body = transport.customize_request(method, params.clone());
			let body = serde_json::to_string(&request_body)
				.map_err(|e| TransportError::request_serialization(e.to_string()))?;

			let mut request = self
				.client
				.post(url.as_str())
				.header("Content-Type", "application/json")
				.body(body);
			if let Some(credentials) = &self.credentials {
				request = request.basic_auth(&credentials.username, Some(&credentials.password));
			}

			let response = match request.send().await {
				Ok(response) => response,
				Err(network_error) => {
					tracing::warn!(method, "Network error while sending request: {}", network_error);
					match self.should_attempt_rotation(transport, None).await? {
						true => continue,
						false => return Err(TransportError::network(network_error.to_string())),
					}
				}
			};

			let status = response.status();
			if !status.is_success() {
				let error_body = response.text().await.unwrap_or_default();
				tracing::warn!(method, "Request failed with status {}: {}", status, error_body);

				if self
					.should_attempt_rotation(transport, Some(status.as_u16()))
					.await?
				{
					continue;
				}

				if let Some(rpc_error) = serde_json::from_str::<Value>(&error_body)
					.ok()
					.as_ref()
					.and_then(error_from_body)
				{
					return Err(rpc_error);
				}
				return Err(TransportError::http(status, url, error_body));
			}

			return response
				.json::<Value>()
				.await
				.map_err(|e| TransportError::response_parse(e.to_string()));
		}
	}
}
