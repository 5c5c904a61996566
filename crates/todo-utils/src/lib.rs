//! Shared utilities for todo-web

pub mod logging;

pub use logging::{LoggingConfig, LoggingError, init_logging};
