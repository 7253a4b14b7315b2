//! Error types for repository operations.
//!
//! Raised while ledger configuration is loaded and looked up at startup.

use log::error;
use std::{error::Error, fmt};

use crate::models::ConfigError;

#[derive(Debug)]
pub enum RepositoryError {
	/// Configuration is well formed but inconsistent
	ValidationError(String),

	/// Configuration files could not be read or parsed
	LoadError(String),

	/// No ledger is configured under the requested slug
	NotFound(String),
}

impl RepositoryError {
	fn format_message(&self) -> String {
		match self {
			Self::ValidationError(msg) => format!("Validation error: {}", msg),
			Self::LoadError(msg) => format!("Load error: {}", msg),
			Self::NotFound(msg) => format!("Not found: {}", msg),
		}
	}

	/// Also logs the error message at the error level.
	pub fn validation_error(msg: impl Into<String>) -> Self {
		let error = Self::ValidationError(msg.into());
		error!("{}", error.format_message());
		error
	}

	/// Also logs the error message at the error level.
	pub fn load_error(msg: impl Into<String>) -> Self {
		let error = Self::LoadError(msg.into());
		error!("{}", error.format_message());
		error
	}

	pub fn not_found(msg: impl Into<String>) -> Self {
		let error = Self::NotFound(msg.into());
		error!("{}", error.format_message());
		error
	}
}

impl fmt::Display for RepositoryError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.format_message())
	}
}

impl Error for RepositoryError {}

impl From<std::io::Error> for RepositoryError {
	fn from(err: std::io::Error) -> Self {
		Self::load_error(err.to_string())
	}
}

impl From<ConfigError> for RepositoryError {
	fn from(err: ConfigError) -> Self {
		match err {
			ConfigError::ValidationError(msg) => Self::validation_error(msg),
			other => Self::load_error(other.to_string()),
		}
	}
}
