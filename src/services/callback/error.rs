//! Callback delivery error types.

use log::error;
use std::{error::Error, fmt};

#[derive(Debug)]
pub enum CallbackError {
	/// The request could not be sent or timed out
	NetworkError(String),
	/// The receiver answered with a non-success status
	StatusError(u16, String),
	ConfigError(String),
}

impl CallbackError {
	fn format_message(&self) -> String {
		match self {
			Self::NetworkError(msg) => format!("Network error: {}", msg),
			Self::StatusError(status, url) => format!("Callback {} returned {}", url, status),
			Self::ConfigError(msg) => format!("Config error: {}", msg),
		}
	}

	pub fn network_error(msg: impl Into<String>) -> Self {
		let error = Self::NetworkError(msg.into());
		error!("{}", error.format_message());
		error
	}

	pub fn status_error(status: u16, url: impl Into<String>) -> Self {
		let error = Self::StatusError(status, url.into());
		error!("{}", error.format_message());
		error
	}

	pub fn config_error(msg: impl Into<String>) -> Self {
		let error = Self::ConfigError(msg.into());
		error!("{}", error.format_message());
		error
	}
}

impl From<reqwest::Error> for CallbackError {
	fn from(error: reqwest::Error) -> Self {
		Self::network_error(error.to_string())
	}
}

impl fmt::Display for CallbackError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.format_message())
	}
}

impl Error for CallbackError {}
