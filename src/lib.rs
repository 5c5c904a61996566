//! # todo-web
//!
//! Backend of a to-do list: the `ToDoItem` schema, its migration and the
//! management commands that apply it.
//!
//! ## Crates
//!
//! - [`db`]: database backends and the migration system
//! - [`conf`]: settings loaded from TOML and the environment
//! - [`utils`]: logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use todo_web::apps::{all_migrations, todos::{NewToDoItem, ToDoItemManager}};
//! use todo_web::db::backends::DatabaseConnection;
//! use todo_web::db::migrations::MigrationExecutor;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let connection = DatabaseConnection::connect("sqlite::memory:").await?;
//! MigrationExecutor::new(connection.clone())
//!     .apply_migrations(&all_migrations())
//!     .await?;
//!
//! let item = ToDoItemManager::new(connection)
//!     .create(&NewToDoItem::new("Buy milk"))
//!     .await?;
//! assert!(!item.completed);
//! # Ok(())
//! # }
//! ```

pub mod apps;
pub mod commands;

pub use todo_conf as conf;
pub use todo_db as db;
pub use todo_utils as utils;

pub mod prelude {
	pub use crate::apps::todos::{NewToDoItem, ToDoItem, ToDoItemManager};
	pub use todo_conf::Settings;
	pub use todo_db::backends::DatabaseConnection;
	pub use todo_db::migrations::prelude::*;
}
