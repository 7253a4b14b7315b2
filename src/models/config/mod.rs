//! Configuration loading and validation.
//!
//! Ledgers are described by one JSON file each under `config/ledgers`.

use std::path::Path;

mod error;
mod ledger_config;

pub use error::ConfigError;
pub use ledger_config::validate_unique_routes;

/// Common interface for loading configuration files
pub trait ConfigLoader: Sized {
	/// Load all configurations from a directory, keyed by identifier
	fn load_all<T>(path: Option<&Path>) -> Result<T, ConfigError>
	where
		T: FromIterator<(String, Self)>;

	/// Load and validate a single configuration file
	fn load_from_path(path: &Path) -> Result<Self, ConfigError>;

	fn validate(&self) -> Result<(), ConfigError>;

	fn is_json_file(path: &Path) -> bool {
		path.extension()
			.map(|ext| ext.to_string_lossy().to_lowercase() == "json")
			.unwrap_or(false)
	}
}
