//! Fire-and-forget deposit notifications.
//!
//! Each event becomes one `GET {base_uri}/{route}/{txid}`. Nothing is retried and the
//! result only reaches the log.

use reqwest::Client;
use std::time::Duration;
use url::Url;

use crate::{
	services::callback::CallbackError, utils::constants::DEFAULT_CALLBACK_TIMEOUT_MS,
};

pub trait CallbackDispatcherTrait: Send + Sync {
	/// Queues a notification and returns immediately
	fn dispatch(&self, route: &str, txid: &str);
}

#[derive(Clone, Debug)]
pub struct CallbackDispatcher {
	client: Client,
	base_uri: Url,
}

impl CallbackDispatcher {
	pub fn new(base_uri: &str, timeout_ms: Option<u64>) -> Result<Self, CallbackError> {
		let base_uri = Url::parse(base_uri)
			.map_err(|e| CallbackError::config_error(format!("Invalid base URI: {}", e)))?;
		let client = Client::builder()
			.timeout(Duration::from_millis(
				timeout_ms.unwrap_or(DEFAULT_CALLBACK_TIMEOUT_MS),
			))
			.build()?;
		Ok(Self { client, base_uri })
	}

	pub fn callback_url(&self, route: &str, txid: &str) -> String {
		format!(
			"{}/{}/{}",
			self.base_uri.as_str().trim_end_matches('/'),
			urlencoding::encode(route),
			urlencoding::encode(txid)
		)
	}

	/// Sends one notification and waits for the answer
	pub async fn notify(&self, route: &str, txid: &str) -> Result<(), CallbackError> {
		let url = self.callback_url(route, txid);
		let response = self.client.get(&url).send().await?;

		if !response.status().is_success() {
			return Err(CallbackError::status_error(response.status().as_u16(), url));
		}

		log::debug!("Delivered callback {}", url);
		Ok(())
	}
}

impl CallbackDispatcherTrait for CallbackDispatcher {
	fn dispatch(&self, route: &str, txid: &str) {
		let dispatcher = self.clone();
		let route = route.to_string();
		let txid = txid.to_string();

		tokio::spawn(async move {
			if let Err(e) = dispatcher.notify(&route, &txid).await {
				tracing::warn!(route = %route, txid = %txid, "Dropped callback: {}", e);
			}
		});
	}
}
