//! Project settings
//!
//! Settings are read from a TOML file and then overridden by environment
//! variables:
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `DATABASE_URL` | `[database]` |
//! | `TODO_LOG_LEVEL` | `logging.level` |
//!
//! ```toml
//! [database]
//! engine = "sqlite"
//! name = "db.sqlite3"
//!
//! [logging]
//! level = "debug"
//! ```

pub mod database_config;

pub use database_config::DatabaseConfig;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use todo_utils::LoggingConfig;

pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const LOG_LEVEL_ENV: &str = "TODO_LOG_LEVEL";

#[derive(Debug, Error)]
pub enum SettingsError {
	#[error("Failed to read settings file {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse settings: {0}")]
	Parse(#[from] toml::de::Error),

	#[error("Invalid database URL: {0}")]
	InvalidDatabaseUrl(String),

	#[error("Unsupported database engine: {0}")]
	UnsupportedEngine(String),
}

/// Project settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	pub database: DatabaseConfig,
	pub logging: LoggingConfig,
}

impl Settings {
	/// Parse settings from TOML text
	///
	/// # Examples
	///
	/// ```
	/// use todo_conf::settings::Settings;
	///
	/// let settings = Settings::from_toml_str(r#"
	/// [database]
	/// engine = "sqlite"
	/// name = "todo.db"
	/// "#).unwrap();
	/// assert_eq!(settings.database.name, "todo.db");
	/// assert_eq!(settings.logging.level, "info");
	/// ```
	pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
		Ok(toml::from_str(content)?)
	}

	/// Read settings from a TOML file without environment overrides
	pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
		let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		Self::from_toml_str(&content)
	}

	/// Load settings from `path` (or defaults) and apply environment overrides
	pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
		let mut settings = match path {
			Some(path) => Self::from_file(path)?,
			None => Self::default(),
		};
		settings.apply_overrides(|key| std::env::var(key).ok())?;
		Ok(settings)
	}

	/// Apply overrides looked up by variable name
	pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), SettingsError>
	where
		F: Fn(&str) -> Option<String>,
	{
		if let Some(url) = lookup(DATABASE_URL_ENV).filter(|v| !v.is_empty()) {
			self.database = DatabaseConfig::from_url(&url)?;
		}
		if let Some(level) = lookup(LOG_LEVEL_ENV).filter(|v| !v.is_empty()) {
			self.logging.level = level;
		}
		Ok(())
	}

	pub fn database_url(&self) -> Result<String, SettingsError> {
		self.database.to_url()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::collections::HashMap;

	#[rstest]
	fn test_defaults() {
		let settings = Settings::default();
		assert_eq!(settings.database_url().unwrap(), "sqlite:db.sqlite3");
		assert_eq!(settings.logging.level, "info");
	}

	#[rstest]
	fn test_empty_file_uses_defaults() {
		assert_eq!(Settings::from_toml_str("").unwrap(), Settings::default());
	}

	#[rstest]
	fn test_overrides() {
		let env: HashMap<&str, &str> = HashMap::from([
			(DATABASE_URL_ENV, "postgresql://app@db/todo"),
			(LOG_LEVEL_ENV, "debug"),
		]);
		let mut settings = Settings::default();
		settings
			.apply_overrides(|key| env.get(key).map(|v| v.to_string()))
			.unwrap();

		assert_eq!(settings.database.engine, "postgresql");
		assert_eq!(settings.database.host.as_deref(), Some("db"));
		assert_eq!(settings.logging.level, "debug");
	}

	#[rstest]
	fn test_empty_override_is_ignored() {
		let mut settings = Settings::default();
		settings
			.apply_overrides(|_| Some(String::new()))
			.unwrap();
		assert_eq!(settings, Settings::default());
	}

	#[rstest]
	fn test_bad_database_url_override() {
		let mut settings = Settings::default();
		let result = settings.apply_overrides(|key| {
			(key == DATABASE_URL_ENV).then(|| "mysql://root@localhost/todo".to_string())
		});
		assert!(matches!(result, Err(SettingsError::UnsupportedEngine(_))));
	}
}
