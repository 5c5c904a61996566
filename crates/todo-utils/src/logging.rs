//! Logging setup
//!
//! Installs a `tracing-subscriber` fmt subscriber filtered by an
//! [`EnvFilter`]. `RUST_LOG`, when set, takes precedence over the
//! configured level.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
pub enum LoggingError {
	#[error("Invalid log level: {0}")]
	InvalidLevel(String),
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
	/// One of `trace`, `debug`, `info`, `warn`, `error`
	pub level: String,

	/// Use ANSI colors in the output
	pub ansi: bool,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			ansi: true,
		}
	}
}

impl LoggingConfig {
	pub fn with_level(mut self, level: impl Into<String>) -> Self {
		self.level = level.into();
		self
	}

	/// Parse the configured level
	///
	/// # Examples
	///
	/// ```
	/// use todo_utils::LoggingConfig;
	/// use tracing::Level;
	///
	/// let config = LoggingConfig::default().with_level("DEBUG");
	/// assert_eq!(config.parse_level().unwrap(), Level::DEBUG);
	/// ```
	pub fn parse_level(&self) -> Result<Level, LoggingError> {
		match self.level.to_lowercase().as_str() {
			"trace" => Ok(Level::TRACE),
			"debug" => Ok(Level::DEBUG),
			"info" => Ok(Level::INFO),
			"warn" => Ok(Level::WARN),
			"error" => Ok(Level::ERROR),
			_ => Err(LoggingError::InvalidLevel(self.level.clone())),
		}
	}
}

/// Initialize the global subscriber
///
/// Calling this more than once is harmless; only the first call installs
/// a subscriber.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
	let level = config.parse_level()?;
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

	let installed = tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_ansi(config.ansi)
		.with_target(false)
		.try_init()
		.is_ok();

	if installed {
		tracing::debug!(%level, "logging initialized");
	}
	Ok(())
}
