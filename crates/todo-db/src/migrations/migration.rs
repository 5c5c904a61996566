//! Migration definition

use super::Operation;
use serde::{Deserialize, Serialize};

/// A database migration
///
/// Once applied to a database a migration must never be edited; schema
/// changes are expressed by adding a new migration that depends on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Migration {
	/// Migration name (e.g., "0001_initial")
	pub name: String,

	/// App label
	pub app_label: String,

	/// Operations to apply, in order
	pub operations: Vec<Operation>,

	/// Dependencies (app_label, migration_name)
	#[serde(default)]
	pub dependencies: Vec<(String, String)>,

	/// Whether this is wrapped in a transaction
	#[serde(default = "default_atomic")]
	pub atomic: bool,

	/// Whether this is an initial migration (explicit or inferred from dependencies)
	/// - `Some(true)`: Explicitly marked as initial
	/// - `Some(false)`: Explicitly marked as non-initial
	/// - `None`: Auto-infer from `dependencies.is_empty()`
	#[serde(default)]
	pub initial: Option<bool>,
}

fn default_atomic() -> bool {
	true
}

impl Migration {
	/// Create a new migration
	///
	/// # Examples
	///
	/// ```
	/// use todo_db::migrations::Migration;
	///
	/// let migration = Migration::new("0001_initial", "api");
	/// assert_eq!(migration.name, "0001_initial");
	/// assert_eq!(migration.app_label, "api");
	/// assert!(migration.atomic);
	/// ```
	pub fn new(name: impl Into<String>, app_label: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			app_label: app_label.into(),
			operations: Vec::new(),
			dependencies: Vec::new(),
			atomic: true,
			initial: None,
		}
	}

	/// Add an operation to this migration
	pub fn add_operation(mut self, operation: Operation) -> Self {
		self.operations.push(operation);
		self
	}

	/// Add a dependency to this migration
	///
	/// # Examples
	///
	/// ```
	/// use todo_db::migrations::Migration;
	///
	/// let migration = Migration::new("0002_add_due_date", "api")
	///     .add_dependency("api", "0001_initial");
	///
	/// assert_eq!(migration.dependencies.len(), 1);
	/// assert_eq!(migration.dependencies[0].0, "api");
	/// assert_eq!(migration.dependencies[0].1, "0001_initial");
	/// ```
	pub fn add_dependency(mut self, app_label: impl Into<String>, name: impl Into<String>) -> Self {
		self.dependencies.push((app_label.into(), name.into()));
		self
	}

	/// Set whether this migration should run in a transaction
	pub fn atomic(mut self, atomic: bool) -> Self {
		self.atomic = atomic;
		self
	}

	/// Set initial attribute explicitly
	pub fn initial(mut self, initial: bool) -> Self {
		self.initial = Some(initial);
		self
	}

	/// Get full migration identifier
	///
	/// # Examples
	///
	/// ```
	/// use todo_db::migrations::Migration;
	///
	/// let migration = Migration::new("0001_initial", "api");
	/// assert_eq!(migration.id(), "api.0001_initial");
	/// ```
	pub fn id(&self) -> String {
		format!("{}.{}", self.app_label, self.name)
	}

	/// Check if this is an initial migration
	///
	/// Returns `true` if:
	/// - `initial` is explicitly set to `Some(true)`, OR
	/// - `initial` is `None` and `dependencies` is empty
	pub fn is_initial(&self) -> bool {
		match self.initial {
			Some(initial) => initial,
			None => self.dependencies.is_empty(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(None, vec![], true)]
	#[case(None, vec![("api", "0001_initial")], false)]
	#[case(Some(true), vec![("api", "0001_initial")], true)]
	#[case(Some(false), vec![], false)]
	fn test_is_initial(
		#[case] initial: Option<bool>,
		#[case] deps: Vec<(&str, &str)>,
		#[case] expected: bool,
	) {
		let mut migration = Migration::new("0002_next", "api");
		migration.initial = initial;
		for (app, name) in deps {
			migration = migration.add_dependency(app, name);
		}
		assert_eq!(migration.is_initial(), expected);
	}

	#[rstest]
	fn test_deserialize_defaults() {
		let json = r#"{"name": "0001_initial", "app_label": "api", "operations": []}"#;
		let migration: Migration = serde_json::from_str(json).unwrap();
		assert!(migration.atomic);
		assert!(migration.dependencies.is_empty());
		assert_eq!(migration.initial, None);
		assert!(migration.is_initial());
	}
}
