//! # todo-conf
//!
//! Settings for todo-web: database connection and logging, read from TOML
//! and overridden by environment variables.

pub mod settings;

pub use settings::{DatabaseConfig, Settings, SettingsError};
