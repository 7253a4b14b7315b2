//! Logging utilities for the application
//!
//! The `setup_logging` function reads `LOG_MODE` and sends output either to stdout or to a
//! daily rolling file under `LOG_DATA_DIR`.
//!
//! The filter is taken from `RUST_LOG`, then `LOG_LEVEL`, and defaults to `info`.
use std::path::PathBuf;

use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use crate::utils::constants::{DEFAULT_LOG_DIR, LOG_FILE_PREFIX};

type SetupResult = Result<(), Box<dyn std::error::Error + Send + Sync + 'static>>;

/// Setup logging for the application
///
/// `LOG_MODE=file` writes to `{LOG_DATA_DIR}/wallet-gateway.log.YYYY-MM-DD`, anything else
/// writes to stdout.
pub fn setup_logging() -> SetupResult {
	let mode = std::env::var("LOG_MODE").unwrap_or_default();

	if mode.eq_ignore_ascii_case("file") {
		let dir = log_directory();
		std::fs::create_dir_all(&dir)?;
		let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
		init_subscriber(appender, false)
	} else {
		setup_logging_with_writer(std::io::stdout)
	}
}

/// Setup logging for the application with a custom writer
pub fn setup_logging_with_writer<W>(writer: W) -> SetupResult
where
	W: for<'writer> tracing_subscriber::fmt::MakeWriter<'writer> + Send + Sync + 'static,
{
	init_subscriber(writer, true)
}

fn log_directory() -> PathBuf {
	std::env::var("LOG_DATA_DIR")
		.map(PathBuf::from)
		.unwrap_or_else(|_| PathBuf::from(DEFAULT_LOG_DIR))
}

fn env_filter() -> EnvFilter {
	EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
		EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
	})
}

fn init_subscriber<W>(writer: W, ansi: bool) -> SetupResult
where
	W: for<'writer> tracing_subscriber::fmt::MakeWriter<'writer> + Send + Sync + 'static,
{
	tracing_subscriber::registry()
		.with(env_filter())
		.with(
			fmt::layer()
				.with_writer(writer)
				.event_format(
					fmt::format()
						.with_level(true)
						.with_target(true)
						.with_thread_ids(false)
						.with_thread_names(false)
						.with_ansi(ansi)
						.compact(),
				)
				.fmt_fields(fmt::format::PrettyFields::new()),
		)
		.try_init()?;
	Ok(())
}
