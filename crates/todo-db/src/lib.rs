//! # todo-db
//!
//! Database layer for todo-web.
//!
//! - [`backends`]: a small async abstraction over `sqlx` pools for SQLite and
//!   PostgreSQL, with driver errors classified into [`backends::DatabaseError`].
//! - [`migrations`]: migration records, the schema migrator, the applied
//!   migration recorder and the executor that ties them together.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use todo_db::backends::DatabaseConnection;
//! use todo_db::migrations::{
//!     ColumnDefinition, CreateTable, FieldType, Migration, MigrationExecutor, Operation,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let connection = DatabaseConnection::connect("sqlite::memory:").await?;
//!
//! let migration = Migration::new("0001_initial", "api")
//!     .initial(true)
//!     .add_operation(Operation::CreateTable(CreateTable::new(
//!         "ToDoItem",
//!         vec![
//!             ColumnDefinition::new("id", FieldType::BigInteger).primary_key().auto_increment(),
//!             ColumnDefinition::new("content", FieldType::VarChar(125)).not_null(),
//!             ColumnDefinition::new("completed", FieldType::Boolean).not_null().default(false),
//!         ],
//!     )));
//!
//! let mut executor = MigrationExecutor::new(connection);
//! executor.apply_migrations(&[migration]).await?;
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod migrations;
