//! Transport error types.

use reqwest::StatusCode;
use thiserror::Error;

/// Failures raised while talking to a ledger node
#[derive(Debug, Error)]
pub enum TransportError {
	/// Non-2xx response without a usable error body
	#[error("HTTP error: status {status} from {url}: {body}")]
	Http {
		status: StatusCode,
		url: String,
		body: String,
	},

	/// Error object returned by the node
	#[error("RPC error {code}: {message}")]
	Rpc { code: i64, message: String },

	/// The request never reached the node
	#[error("Network error: {0}")]
	Network(String),

	#[error("Failed to parse response: {0}")]
	ResponseParse(String),

	#[error("Failed to serialize request: {0}")]
	RequestSerialization(String),

	#[error("URL rotation failed: {0}")]
	UrlRotation(String),

	/// No configured endpoint accepted a connection
	#[error("Connection error: {0}")]
	Connection(String),
}

impl TransportError {
	pub fn http(status: StatusCode, url: impl Into<String>, body: impl Into<String>) -> Self {
		Self::Http {
			status,
			url: url.into(),
			body: body.into(),
		}
	}

	pub fn rpc(code: i64, message: impl Into<String>) -> Self {
		Self::Rpc {
			code,
			message: message.into(),
		}
	}

	pub fn network(msg: impl Into<String>) -> Self {
		Self::Network(msg.into())
	}

	pub fn response_parse(msg: impl Into<String>) -> Self {
		Self::ResponseParse(msg.into())
	}

	pub fn request_serialization(msg: impl Into<String>) -> Self {
		Self::RequestSerialization(msg.into())
	}

	pub fn url_rotation(msg: impl Into<String>) -> Self {
		Self::UrlRotation(msg.into())
	}

	pub fn connection(msg: impl Into<String>) -> Self {
		Self::Connection(msg.into())
	}

	/// Node error code, when the node answered with one
	pub fn rpc_code(&self) -> Option<i64> {
		match self {
			Self::Rpc { code, .. } => Some(*code),
			_ => None,
		}
	}
}

/// Extracts an error object from a node response body
///
/// Understands JSON-RPC `{"error": {"code", "message"}}` and nodeos
/// `{"error": {"code", "name", "what"}}` shapes.
pub fn error_from_body(body: &serde_json::Value) -> Option<TransportError> {
	let error = body.get("error").filter(|e| !e.is_null())?;

	if let Some(message) = error.as_str() {
		return Some(TransportError::rpc(0, message));
	}

	let code = error.get("code").and_then(|c| c.as_i64()).unwrap_or(0);
	let message = ["message", "what", "name"]
		.iter()
		.find_map(|key| error.get(*key).and_then(|m| m.as_str()))
		.map(str::to_string)
		.unwrap_or_else(|| error.to_string());
	// nodeos puts the useful text in the first detail
	let message = match error
		.pointer("/details/0/message")
		.and_then(|m| m.as_str())
	{
		Some(detail) if !detail.is_empty() => format!("{}: {}", message, detail),
		_ => message,
	};

	Some(TransportError::rpc(code, message))
}
