//! Migration executor
//!
//! Applies migrations in dependency order, skipping those already listed by
//! the [`MigrationRecorder`]. An atomic migration runs its operations and
//! its recorder insert in one transaction, so it is either fully applied
//! and recorded or not at all.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use super::{
	Migration, MigrationError, MigrationPlan, MigrationRecord, MigrationRecorder, Operation,
	Result, SchemaMigrator, SqlDialect,
};
use crate::backends::{DatabaseConnection, TransactionExecutor};

/// Outcome of [`MigrationExecutor::apply_migrations`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
	/// Ids (`app.name`) of the migrations applied by this run, in order
	pub applied: Vec<String>,
	/// Ids of the migrations that were already recorded
	pub skipped: Vec<String>,
}

/// Migration executor using DatabaseConnection
pub struct MigrationExecutor {
	connection: DatabaseConnection,
	recorder: MigrationRecorder,
	migrator: SchemaMigrator,
}

impl MigrationExecutor {
	pub fn new(connection: DatabaseConnection) -> Self {
		Self {
			recorder: MigrationRecorder::new(connection.clone()),
			migrator: SchemaMigrator::new(connection.clone()),
			connection,
		}
	}

	pub fn recorder(&self) -> &MigrationRecorder {
		&self.recorder
	}

	fn dialect(&self) -> SqlDialect {
		self.connection.database_type().into()
	}

	/// Apply every pending migration in `migrations`
	///
	/// # Examples
	///
	/// ```no_run
	/// use todo_db::backends::DatabaseConnection;
	/// use todo_db::migrations::{Migration, MigrationExecutor};
	///
	/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
	/// let connection = DatabaseConnection::connect("sqlite::memory:").await?;
	/// let mut executor = MigrationExecutor::new(connection);
	///
	/// let result = executor.apply_migrations(&[Migration::new("0001_initial", "api")]).await?;
	/// assert_eq!(result.applied, vec!["api.0001_initial"]);
	///
	/// let result = executor.apply_migrations(&[Migration::new("0001_initial", "api")]).await?;
	/// assert_eq!(result.skipped, vec!["api.0001_initial"]);
	/// # Ok(())
	/// # }
	/// ```
	pub async fn apply_migrations(&mut self, migrations: &[Migration]) -> Result<ExecutionResult> {
		self.recorder.ensure_schema_table().await?;

		let mut result = ExecutionResult::default();
		let pending = self.pending(migrations).await?;
		for migration in migrations {
			if !pending.iter().any(|m| m.id() == migration.id()) {
				debug!(migration = %migration.id(), "already applied, skipping");
				result.skipped.push(migration.id());
			}
		}

		for migration in &pending {
			self.apply_one(migration).await?;
			result.applied.push(migration.id());
		}

		Ok(result)
	}

	/// Pending migrations in the order [`apply_migrations`](Self::apply_migrations)
	/// would apply them
	pub async fn plan(&self, migrations: &[Migration]) -> Result<Vec<Migration>> {
		self.recorder.ensure_schema_table().await?;
		self.pending(migrations).await
	}

	/// SQL statements a migration would execute on this connection
	pub fn sql_for(&self, migration: &Migration) -> Vec<String> {
		let dialect = self.dialect();
		migration
			.operations
			.iter()
			.map(|operation| operation.to_sql(&dialect))
			.collect()
	}

	/// All migrations recorded as applied
	pub async fn applied(&self) -> Result<Vec<MigrationRecord>> {
		self.recorder.ensure_schema_table().await?;
		self.recorder.applied_migrations().await
	}

	/// Apply a single migration, failing if it is already recorded
	pub async fn apply_one(&mut self, migration: &Migration) -> Result<()> {
		self.recorder.ensure_schema_table().await?;
		if self
			.recorder
			.is_applied(&migration.app_label, &migration.name)
			.await?
		{
			return Err(MigrationError::AlreadyApplied(migration.id()));
		}

		for operation in &migration.operations {
			operation.validate()?;
		}

		// Inspecting the schema inside an open SQLite transaction would need a
		// second connection, so conflicts are checked up front
		for operation in &migration.operations {
			if let Operation::CreateTable(create) = operation {
				self.migrator.check_conflict(create).await?;
			}
		}

		info!(migration = %migration.id(), atomic = migration.atomic, "applying migration");
		if migration.atomic {
			self.apply_atomic(migration).await
		} else {
			self.apply_non_atomic(migration).await
		}
	}

	async fn apply_atomic(&self, migration: &Migration) -> Result<()> {
		let mut tx = self.connection.begin().await?;

		match self.run_in_transaction(tx.as_mut(), migration).await {
			Ok(()) => {
				tx.commit().await?;
				info!(migration = %migration.id(), "applied migration");
				Ok(())
			}
			Err(e) => {
				if let Err(rollback_err) = tx.rollback().await {
					warn!(migration = %migration.id(), error = %rollback_err, "rollback failed");
				}
				Err(e)
			}
		}
	}

	async fn run_in_transaction(
		&self,
		tx: &mut dyn TransactionExecutor,
		migration: &Migration,
	) -> Result<()> {
		for operation in &migration.operations {
			match operation {
				Operation::CreateTable(create) => self.migrator.apply_in(tx, create).await?,
				Operation::RunSql { sql } => {
					tx.execute(sql, vec![]).await?;
				}
			}
		}
		self.recorder
			.record_applied_in(tx, &migration.app_label, &migration.name)
			.await
	}

	async fn apply_non_atomic(&self, migration: &Migration) -> Result<()> {
		for operation in &migration.operations {
			match operation {
				Operation::CreateTable(create) => self.migrator.apply(create).await?,
				Operation::RunSql { sql } => {
					self.connection.execute(sql, vec![]).await?;
				}
			}
		}
		self.recorder
			.record_applied(&migration.app_label, &migration.name)
			.await?;
		info!(migration = %migration.id(), "applied migration");
		Ok(())
	}

	async fn pending(&self, migrations: &[Migration]) -> Result<Vec<Migration>> {
		let applied: HashSet<(String, String)> = self
			.recorder
			.applied_migrations()
			.await?
			.into_iter()
			.map(|record| (record.app, record.name))
			.collect();

		let mut plan = MigrationPlan::new().with_migrations(
			migrations
				.iter()
				.filter(|m| !applied.contains(&(m.app_label.clone(), m.name.clone())))
				.cloned(),
		);
		plan.sort_after(&applied)?;
		Ok(plan.migrations)
	}
}
