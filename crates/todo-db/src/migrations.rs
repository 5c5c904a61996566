//! # Migrations
//!
//! Versioned schema evolution for the todo store.
//!
//! A [`Migration`] is a named, ordered list of [`Operation`]s together with
//! the migrations it depends on. Each app collects its migrations through a
//! [`MigrationProvider`]; the [`MigrationExecutor`] sorts them into a
//! [`MigrationPlan`], skips the ones already listed by the
//! [`MigrationRecorder`] and applies the rest, one transaction per
//! migration.
//!
//! Table creation goes through the [`SchemaMigrator`], which refuses to
//! touch a table that already exists and reports it as
//! [`MigrationError::SchemaConflict`].
//!
//! ## Migration files
//!
//! Migrations are Rust modules under `src/apps/<app>/migrations/`:
//!
//! ```rust,ignore
//! // apps/todos/migrations.rs
//! pub mod _0001_initial;
//!
//! pub struct TodoMigrations;
//!
//! impl MigrationProvider for TodoMigrations {
//!     fn migrations() -> Vec<Migration> {
//!         vec![_0001_initial::migration()]
//!     }
//! }
//! ```
//!
//! The same record can be dumped to and loaded from JSON with
//! [`loader::write_migration`] and [`loader::read_migration`].

pub mod executor;
pub mod fields;
pub mod introspection;
pub mod loader;
pub mod migration;
pub mod operations;
pub mod plan;
pub mod recorder;
pub mod schema_migrator;

pub use executor::{ExecutionResult, MigrationExecutor};
pub use fields::FieldType;
pub use introspection::{ColumnInfo, DatabaseIntrospector};
pub use migration::Migration;
pub use operations::{ColumnDefinition, CreateTable, DefaultValue, Operation, SqlDialect};
pub use plan::MigrationPlan;
pub use recorder::{MigrationRecord, MigrationRecorder};
pub use schema_migrator::SchemaMigrator;

use thiserror::Error;

use crate::backends::DatabaseError;

/// Trait for types that provide migrations
///
/// Each app implements this on a marker type so the full set of migrations
/// is known at compile time.
///
/// ```rust,ignore
/// pub struct TodoMigrations;
///
/// impl MigrationProvider for TodoMigrations {
///     fn migrations() -> Vec<Migration> {
///         vec![_0001_initial::migration()]
///     }
/// }
/// ```
pub trait MigrationProvider {
	/// Returns all migrations provided by this type.
	///
	/// Migrations should be returned in dependency order (base migrations first).
	fn migrations() -> Vec<Migration>;
}

#[derive(Debug, Error)]
pub enum MigrationError {
	/// The table to create already exists, or exists with a different shape
	#[error("Schema conflict on {table}: {reason}")]
	SchemaConflict { table: String, reason: String },

	#[error("Connection error: {0}")]
	ConnectionError(String),

	#[error("Permission denied: {0}")]
	PermissionDenied(String),

	#[error("Migration not found: {0}")]
	NotFound(String),

	#[error("Migration already applied: {0}")]
	AlreadyApplied(String),

	#[error("Dependency error: {0}")]
	DependencyError(String),

	#[error("Circular dependency detected: {cycle}")]
	CircularDependency { cycle: String },

	#[error("Invalid migration: {0}")]
	InvalidMigration(String),

	#[error("Database error: {0}")]
	DatabaseError(DatabaseError),

	#[error("Serialization error: {0}")]
	SerializationError(#[from] serde_json::Error),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}

impl From<DatabaseError> for MigrationError {
	fn from(err: DatabaseError) -> Self {
		match err {
			DatabaseError::AlreadyExists(reason) => MigrationError::SchemaConflict {
				table: String::new(),
				reason,
			},
			DatabaseError::ConnectionError(msg) => MigrationError::ConnectionError(msg),
			DatabaseError::PermissionDenied(msg) => MigrationError::PermissionDenied(msg),
			other => MigrationError::DatabaseError(other),
		}
	}
}

impl MigrationError {
	/// Fill in the table name of a [`SchemaConflict`](Self::SchemaConflict)
	/// produced from a driver error
	pub fn on_table(self, name: &str) -> Self {
		match self {
			MigrationError::SchemaConflict { table, reason } if table.is_empty() => {
				MigrationError::SchemaConflict {
					table: name.to_string(),
					reason,
				}
			}
			other => other,
		}
	}
}

pub type Result<T> = std::result::Result<T, MigrationError>;

/// Re-export commonly used types
pub mod prelude {
	pub use super::{
		ColumnDefinition, CreateTable, FieldType, Migration, MigrationError, MigrationExecutor,
		MigrationProvider, Operation, SchemaMigrator,
	};
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_already_exists_becomes_schema_conflict() {
		let err = MigrationError::from(DatabaseError::AlreadyExists(
			"table \"ToDoItem\" already exists".to_string(),
		))
		.on_table("ToDoItem");

		match err {
			MigrationError::SchemaConflict { table, reason } => {
				assert_eq!(table, "ToDoItem");
				assert!(reason.contains("already exists"));
			}
			other => panic!("expected SchemaConflict, got {other:?}"),
		}
	}

	#[rstest]
	#[case(DatabaseError::ConnectionError("refused".into()), "Connection error: refused")]
	#[case(DatabaseError::PermissionDenied("readonly".into()), "Permission denied: readonly")]
	fn test_classified_database_errors(#[case] err: DatabaseError, #[case] expected: &str) {
		assert_eq!(MigrationError::from(err).to_string(), expected);
	}

	#[rstest]
	fn test_other_database_errors_are_wrapped() {
		let err = MigrationError::from(DatabaseError::TypeError("bad".into()));
		assert!(matches!(err, MigrationError::DatabaseError(DatabaseError::TypeError(_))));
	}

	#[rstest]
	fn test_on_table_keeps_existing_table_name() {
		let err = MigrationError::SchemaConflict {
			table: "a".to_string(),
			reason: "r".to_string(),
		}
		.on_table("b");
		assert_eq!(err.to_string(), "Schema conflict on a: r");
	}
}
