//! Constants shared across the application.

/// Directory holding one JSON file per ledger
pub const DEFAULT_LEDGER_CONFIG_DIR: &str = "config/ledgers";

/// Directory of the file-backed durable store
pub const DEFAULT_DATA_DIR: &str = "data";

/// Directory for rolling log files
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Prefix of rolling log files
pub const LOG_FILE_PREFIX: &str = "wallet-gateway.log";

/// Request timeout enforced at the transport boundary
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 30;

/// Timeout of a single callback GET
pub const DEFAULT_CALLBACK_TIMEOUT_MS: u64 = 10_000;
