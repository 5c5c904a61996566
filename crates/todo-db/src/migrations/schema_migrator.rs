//! Schema migrator
//!
//! Applies a [`CreateTable`] against a live store. An existing table with
//! the same name is always a [`MigrationError::SchemaConflict`]; the reason
//! tells whether the existing shape matches the definition or not.

use tracing::{debug, info, warn};

use super::introspection::DatabaseIntrospector;
use super::{CreateTable, MigrationError, Result, SqlDialect};
use crate::backends::{DatabaseConnection, TransactionExecutor};

/// Reason reported when the table exists with the expected shape
pub const REASON_ALREADY_EXISTS: &str = "table already exists";

/// Applies table-creation operations to a store
#[derive(Debug, Clone)]
pub struct SchemaMigrator {
	connection: DatabaseConnection,
	introspector: DatabaseIntrospector,
}

impl SchemaMigrator {
	pub fn new(connection: DatabaseConnection) -> Self {
		Self {
			introspector: DatabaseIntrospector::new(connection.clone()),
			connection,
		}
	}

	pub fn dialect(&self) -> SqlDialect {
		self.connection.database_type().into()
	}

	/// Create the table described by `create`
	///
	/// # Examples
	///
	/// ```no_run
	/// use todo_db::backends::DatabaseConnection;
	/// use todo_db::migrations::{ColumnDefinition, CreateTable, FieldType, MigrationError, SchemaMigrator};
	///
	/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
	/// let connection = DatabaseConnection::connect("sqlite::memory:").await?;
	/// let migrator = SchemaMigrator::new(connection);
	/// let create = CreateTable::new(
	///     "ToDoItem",
	///     vec![ColumnDefinition::new("id", FieldType::BigInteger).primary_key().auto_increment()],
	/// );
	///
	/// migrator.apply(&create).await?;
	/// assert!(matches!(
	///     migrator.apply(&create).await,
	///     Err(MigrationError::SchemaConflict { .. })
	/// ));
	/// # Ok(())
	/// # }
	/// ```
	pub async fn apply(&self, create: &CreateTable) -> Result<()> {
		create.validate()?;
		self.check_conflict(create).await?;

		let sql = create.to_sql(&self.dialect());
		debug!(table = %create.name, %sql, "creating table");
		self.connection
			.execute(&sql, vec![])
			.await
			.map_err(|e| MigrationError::from(e).on_table(&create.name))?;

		info!(table = %create.name, "created table");
		Ok(())
	}

	/// Create the table inside an open transaction
	///
	/// Call [`check_conflict`](Self::check_conflict) before opening the
	/// transaction; here an existing table is only detected through the
	/// store's own error.
	pub async fn apply_in(&self, tx: &mut dyn TransactionExecutor, create: &CreateTable) -> Result<()> {
		create.validate()?;

		let sql = create.to_sql(&self.dialect());
		debug!(table = %create.name, %sql, "creating table in transaction");
		tx.execute(&sql, vec![])
			.await
			.map_err(|e| MigrationError::from(e).on_table(&create.name))?;

		info!(table = %create.name, "created table");
		Ok(())
	}

	/// Fail with [`MigrationError::SchemaConflict`] if the table already exists
	pub async fn check_conflict(&self, create: &CreateTable) -> Result<()> {
		if !self.introspector.table_exists(&create.name).await? {
			return Ok(());
		}

		let actual = self.introspector.describe_table(&create.name).await?;
		let diffs = create.shape_differences(&actual, &self.dialect());
		let reason = if diffs.is_empty() {
			REASON_ALREADY_EXISTS.to_string()
		} else {
			format!("incompatible shape: {}", diffs.join("; "))
		};

		warn!(table = %create.name, %reason, "schema conflict");
		Err(MigrationError::SchemaConflict {
			table: create.name.clone(),
			reason,
		})
	}
}
