//! Migration loader
//!
//! Reads and writes migration records as JSON. On disk, migrations live at
//! `<root>/<app_label>/<name>.json`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use super::{Migration, MigrationError, Result};

/// Parse a migration record from JSON
///
/// # Examples
///
/// ```
/// use todo_db::migrations::loader::from_json;
///
/// let migration = from_json(r#"{
///     "name": "0001_initial",
///     "app_label": "api",
///     "initial": true,
///     "operations": []
/// }"#).unwrap();
/// assert!(migration.is_initial());
/// ```
pub fn from_json(json: &str) -> Result<Migration> {
	let migration: Migration = serde_json::from_str(json)?;
	for operation in &migration.operations {
		operation.validate()?;
	}
	Ok(migration)
}

/// Emit a migration record as pretty-printed JSON
pub fn to_json(migration: &Migration) -> Result<String> {
	Ok(serde_json::to_string_pretty(migration)?)
}

/// Read a single migration file
pub fn read_migration(path: &Path) -> Result<Migration> {
	let content = fs::read_to_string(path)?;
	from_json(&content).map_err(|e| match e {
		MigrationError::SerializationError(e) => {
			MigrationError::InvalidMigration(format!("Failed to parse {}: {}", path.display(), e))
		}
		other => other,
	})
}

/// Write a migration file, creating parent directories as needed
pub fn write_migration(migration: &Migration, path: &Path) -> Result<()> {
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent)?;
	}
	fs::write(path, to_json(migration)? + "\n")?;
	Ok(())
}

/// Migration loader - loads migrations from a directory tree
pub struct MigrationLoader {
	migration_root: PathBuf,
	disk_migrations: BTreeMap<(String, String), Migration>,
}

impl MigrationLoader {
	pub fn new(migration_root: impl Into<PathBuf>) -> Self {
		Self {
			migration_root: migration_root.into(),
			disk_migrations: BTreeMap::new(),
		}
	}

	/// Path of the file holding `app_label.name`
	pub fn path_for(&self, app_label: &str, name: &str) -> PathBuf {
		self.migration_root
			.join(app_label)
			.join(format!("{name}.json"))
	}

	/// Load all migrations from disk
	///
	/// Only files whose name starts with a digit and ends in `.json` are
	/// considered. The file's directory and stem override any `app_label`
	/// or `name` stored inside it.
	pub fn load_disk(&mut self) -> Result<usize> {
		self.disk_migrations.clear();
		if !self.migration_root.exists() {
			return Ok(0);
		}

		for entry in fs::read_dir(&self.migration_root)? {
			let path = entry?.path();
			if !path.is_dir() {
				continue;
			}
			let Some(app_label) = path.file_name().and_then(|n| n.to_str()) else {
				continue;
			};
			let app_label = app_label.to_string();
			self.load_app_migrations(&app_label, &path)?;
		}

		Ok(self.disk_migrations.len())
	}

	fn load_app_migrations(&mut self, app_label: &str, app_path: &Path) -> Result<()> {
		for entry in fs::read_dir(app_path)? {
			let path = entry?.path();
			if !path.is_file() {
				continue;
			}
			let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
				continue;
			};
			if !file_name.starts_with(|c: char| c.is_ascii_digit()) {
				continue;
			}
			let Some(name) = file_name.strip_suffix(".json") else {
				continue;
			};

			match read_migration(&path) {
				Ok(mut migration) => {
					migration.app_label = app_label.to_string();
					migration.name = name.to_string();
					self.disk_migrations
						.insert((app_label.to_string(), name.to_string()), migration);
				}
				Err(e) => {
					warn!(app = app_label, migration = name, error = %e, "skipping unreadable migration");
				}
			}
		}
		Ok(())
	}

	/// All loaded migrations, ordered by app label then name
	pub fn migrations(&self) -> Vec<Migration> {
		self.disk_migrations.values().cloned().collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::migrations::{ColumnDefinition, CreateTable, FieldType, Operation};
	use rstest::*;
	use tempfile::TempDir;

	#[fixture]
	fn migration() -> Migration {
		Migration::new("0001_initial", "api")
			.initial(true)
			.add_operation(Operation::CreateTable(CreateTable::new(
				"ToDoItem",
				vec![
					ColumnDefinition::new("id", FieldType::BigInteger)
						.primary_key()
						.auto_increment(),
					ColumnDefinition::new("content", FieldType::VarChar(125)).not_null(),
				],
			)))
	}

	#[rstest]
	fn test_json_keeps_record(migration: Migration) {
		let json = to_json(&migration).unwrap();
		assert!(json.contains("\"VarChar\": 125"));
		assert_eq!(from_json(&json).unwrap(), migration);
	}

	#[rstest]
	fn test_from_json_rejects_invalid_operation() {
		let json = r#"{
			"name": "0001_initial",
			"app_label": "api",
			"operations": [{"CreateTable": {"name": "t", "columns": []}}]
		}"#;
		assert!(matches!(from_json(json), Err(MigrationError::InvalidMigration(_))));
	}

	#[rstest]
	fn test_load_disk(migration: Migration) {
		let dir = TempDir::new().unwrap();
		let mut loader = MigrationLoader::new(dir.path());
		write_migration(&migration, &loader.path_for("api", "0001_initial")).unwrap();
		fs::write(dir.path().join("api").join("README.md"), "notes").unwrap();
		fs::write(dir.path().join("api").join("0002_broken.json"), "{").unwrap();

		assert_eq!(loader.load_disk().unwrap(), 1);
		assert_eq!(loader.migrations(), vec![migration]);
	}

	#[rstest]
	fn test_read_migration_reports_path() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("0001_initial.json");
		fs::write(&path, "not json").unwrap();

		let err = read_migration(&path).unwrap_err();
		assert!(err.to_string().contains("0001_initial.json"));
	}
}
