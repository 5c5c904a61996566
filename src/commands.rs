//! Management commands
//!
//! The logic behind the `manage` binary. Commands take the migrations of
//! the installed apps and either inspect them or apply them through a
//! [`MigrationExecutor`].

use std::path::{Path, PathBuf};

use todo_db::backends::{DatabaseConnection, DatabaseType};
use todo_db::migrations::loader::{self, MigrationLoader};
use todo_db::migrations::{
	ExecutionResult, Migration, MigrationError, MigrationExecutor, SqlDialect,
};
use tracing::{info, warn};

/// Migration status line for `showmigrations`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
	pub app_label: String,
	pub name: String,
	pub applied: bool,
}

/// Compiled-in migrations followed by those found under `migrations_dir`
///
/// A file whose `app_label.name` matches a compiled-in migration is
/// ignored, so a dumped record can sit next to the app that defines it.
pub fn collect_migrations(
	compiled: Vec<Migration>,
	migrations_dir: Option<&Path>,
) -> Result<Vec<Migration>, MigrationError> {
	let Some(dir) = migrations_dir else {
		return Ok(compiled);
	};

	let mut loader = MigrationLoader::new(dir);
	let count = loader.load_disk()?;
	info!(dir = %dir.display(), count, "loaded migrations from disk");

	let mut migrations = compiled;
	for migration in loader.migrations() {
		if migrations.iter().any(|m| m.id() == migration.id()) {
			warn!(migration = %migration.id(), "ignoring file shadowing a compiled-in migration");
			continue;
		}
		migrations.push(migration);
	}
	Ok(migrations)
}

/// Where `dumpmigration` writes a record inside a migrations directory
pub fn migration_path(migrations_dir: &Path, migration: &Migration) -> PathBuf {
	MigrationLoader::new(migrations_dir).path_for(&migration.app_label, &migration.name)
}

/// Find a migration by app label and name
pub fn find_migration<'a>(
	migrations: &'a [Migration],
	app_label: &str,
	name: &str,
) -> Result<&'a Migration, MigrationError> {
	migrations
		.iter()
		.find(|m| m.app_label == app_label && m.name == name)
		.ok_or_else(|| MigrationError::NotFound(format!("{app_label}.{name}")))
}

/// Apply every pending migration
pub async fn migrate(
	connection: DatabaseConnection,
	migrations: &[Migration],
) -> Result<ExecutionResult, MigrationError> {
	MigrationExecutor::new(connection)
		.apply_migrations(migrations)
		.await
}

/// Pending migrations in application order, without applying them
pub async fn migrate_plan(
	connection: DatabaseConnection,
	migrations: &[Migration],
) -> Result<Vec<Migration>, MigrationError> {
	MigrationExecutor::new(connection).plan(migrations).await
}

/// Applied/pending status of every migration, in declaration order
pub async fn show_migrations(
	connection: DatabaseConnection,
	migrations: &[Migration],
) -> Result<Vec<MigrationStatus>, MigrationError> {
	let applied = MigrationExecutor::new(connection).applied().await?;
	Ok(migrations
		.iter()
		.map(|m| MigrationStatus {
			app_label: m.app_label.clone(),
			name: m.name.clone(),
			applied: applied
				.iter()
				.any(|r| r.app == m.app_label && r.name == m.name),
		})
		.collect())
}

/// SQL a migration would run against a database of `database_type`
///
/// No connection is opened.
pub fn sql_migrate(migration: &Migration, database_type: DatabaseType) -> String {
	let dialect = SqlDialect::from(database_type);
	migration
		.operations
		.iter()
		.map(|op| format!("-- {}\n{}", op.describe(), op.to_sql(&dialect)))
		.collect::<Vec<_>>()
		.join("\n")
}

/// Emit a migration record as JSON, to `output` if given
pub fn dump_migration(migration: &Migration, output: Option<&Path>) -> Result<String, MigrationError> {
	match output {
		Some(path) => {
			loader::write_migration(migration, path)?;
			Ok(format!("Wrote {} to {}", migration.id(), path.display()))
		}
		None => loader::to_json(migration),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::apps::all_migrations;
	use rstest::rstest;
	use tempfile::TempDir;
	use todo_db::migrations::{ColumnDefinition, CreateTable, FieldType, Operation};

	#[rstest]
	fn test_collect_migrations_without_dir() {
		let migrations = collect_migrations(all_migrations(), None).unwrap();
		assert_eq!(migrations, all_migrations());
	}

	#[rstest]
	fn test_collect_migrations_from_dir() {
		let dir = TempDir::new().unwrap();
		let next = Migration::new("0002_tags", "api")
			.add_dependency("api", "0001_initial")
			.add_operation(Operation::CreateTable(CreateTable::new(
				"Tag",
				vec![ColumnDefinition::new("id", FieldType::BigInteger)
					.primary_key()
					.auto_increment()],
			)));

		// A dumped copy of a compiled-in migration is shadowed, not duplicated
		let initial = &all_migrations()[0];
		dump_migration(initial, Some(&migration_path(dir.path(), initial))).unwrap();
		dump_migration(&next, Some(&migration_path(dir.path(), &next))).unwrap();

		let migrations = collect_migrations(all_migrations(), Some(dir.path())).unwrap();
		let ids: Vec<String> = migrations.iter().map(Migration::id).collect();
		assert_eq!(ids, vec!["api.0001_initial", "api.0002_tags"]);
		assert_eq!(migrations[1], next);
	}

	#[rstest]
	fn test_migration_path() {
		let migrations = all_migrations();
		assert_eq!(
			migration_path(Path::new("migrations"), &migrations[0]),
			Path::new("migrations/api/0001_initial.json")
		);
	}

	#[rstest]
	fn test_find_migration() {
		let migrations = all_migrations();
		assert!(find_migration(&migrations, "api", "0001_initial").is_ok());
		assert!(matches!(
			find_migration(&migrations, "api", "9999_missing"),
			Err(MigrationError::NotFound(id)) if id == "api.9999_missing"
		));
	}

	#[rstest]
	#[case(DatabaseType::Sqlite, "AUTOINCREMENT")]
	#[case(DatabaseType::Postgres, "GENERATED BY DEFAULT AS IDENTITY")]
	fn test_sql_migrate(#[case] database_type: DatabaseType, #[case] expected: &str) {
		let migrations = all_migrations();
		let sql = sql_migrate(&migrations[0], database_type);
		assert!(sql.starts_with("-- Create table ToDoItem\nCREATE TABLE"));
		assert!(sql.contains(expected));
	}
}
