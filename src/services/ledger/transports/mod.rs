//! Network transports for ledger node clients.
//!
//! Two wire styles are supported over the same rotating endpoint manager:
//! - JSON-RPC over HTTP POST (bitcoind, geth, rippled)
//! - REST style HTTP POST where the method is a URL path (TRON full node, nodeos, keosd)

mod endpoint_manager;
mod error;
mod http;
mod rest;

use async_trait::async_trait;
use serde_json::{json, Value};

pub use endpoint_manager::EndpointManager;
pub use error::{error_from_body, TransportError};
pub use http::{HttpTransportClient, RpcDialect};
pub use rest::RestTransportClient;

/// HTTP status codes that trigger RPC endpoint rotation
/// - 429: Too Many Requests - indicates rate limiting from the current endpoint
pub const ROTATE_ON_ERROR_CODES: [u16; 1] = [429];

/// Base trait for all ledger transport clients
#[async_trait]
pub trait LedgerTransport: Send + Sync {
	/// Get the current URL being used by the transport
	async fn get_current_url(&self) -> String;

	/// Send a request and return the unwrapped result
	async fn send_raw_request(
		&self,
		method: &str,
		params: Option<Value>,
	) -> Result<Value, TransportError>;

	/// Builds the request body for a call
	fn customize_request(&self, method: &str, params: Option<Value>) -> Value {
		json!({
			"jsonrpc": "2.0",
			"id": 1,
			"method": method,
			"params": params.unwrap_or_else(|| json!([]))
		})
	}

	/// Builds the request URL for a call against the active endpoint
	fn request_url(&self, base_url: &str, _method: &str) -> String {
		base_url.to_string()
	}
}

/// Extension trait for transports that support URL rotation
#[async_trait]
pub trait RotatingTransport: LedgerTransport {
	/// Attempts to establish a connection with a new URL
	async fn try_connect(&self, url: &str) -> Result<(), TransportError>;

	/// Updates the client with a new URL
	async fn update_client(&self, url: &str) -> Result<(), TransportError>;
}
