//! # Todos app
//!
//! The `ToDoItem` model and its migrations.

pub mod migrations;
pub mod models;

pub use migrations::TodoMigrations;
pub use models::{ModelError, NewToDoItem, ToDoItem, ToDoItemManager};

/// App label used in migration records
pub const APP_LABEL: &str = "api";
