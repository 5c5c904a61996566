//! Migration execution plan

use std::collections::HashSet;

use super::{Migration, MigrationError, Result};

/// Migration execution plan
#[derive(Debug, Clone, Default)]
pub struct MigrationPlan {
	pub migrations: Vec<Migration>,
}

impl MigrationPlan {
	/// Create a new empty migration plan
	pub fn new() -> Self {
		Self {
			migrations: Vec::new(),
		}
	}

	/// Add a migration to this plan
	pub fn with_migration(mut self, migration: Migration) -> Self {
		self.migrations.push(migration);
		self
	}

	pub fn with_migrations(mut self, migrations: impl IntoIterator<Item = Migration>) -> Self {
		self.migrations.extend(migrations);
		self
	}

	/// Sort migrations by dependencies (topological sort)
	///
	/// Migrations whose dependencies are all satisfied keep their relative
	/// input order. A dependency that names no migration in the plan is a
	/// [`MigrationError::DependencyError`]; a cycle is a
	/// [`MigrationError::CircularDependency`].
	///
	/// # Examples
	///
	/// ```
	/// use todo_db::migrations::{Migration, MigrationPlan};
	///
	/// let first = Migration::new("0001_initial", "api");
	/// let second = Migration::new("0002_add_due_date", "api")
	///     .add_dependency("api", "0001_initial");
	///
	/// let mut plan = MigrationPlan::new()
	///     .with_migration(second)
	///     .with_migration(first);
	/// plan.sort().unwrap();
	///
	/// assert_eq!(plan.migrations[0].name, "0001_initial");
	/// assert_eq!(plan.migrations[1].name, "0002_add_due_date");
	/// ```
	pub fn sort(&mut self) -> Result<()> {
		self.sort_after(&HashSet::new())
	}

	/// Sort migrations, treating the `(app_label, name)` pairs in `satisfied`
	/// as already applied
	pub fn sort_after(&mut self, satisfied: &HashSet<(String, String)>) -> Result<()> {
		let mut known = HashSet::new();
		for migration in &self.migrations {
			if !known.insert((migration.app_label.as_str(), migration.name.as_str())) {
				return Err(MigrationError::InvalidMigration(format!(
					"duplicate migration {}",
					migration.id()
				)));
			}
		}
		for migration in &self.migrations {
			if let Some((app, name)) = migration
				.dependencies
				.iter()
				.find(|(app, name)| {
					!known.contains(&(app.as_str(), name.as_str()))
						&& !satisfied.contains(&(app.clone(), name.clone()))
				})
			{
				return Err(MigrationError::DependencyError(format!(
					"{} depends on unknown migration {}.{}",
					migration.id(),
					app,
					name
				)));
			}
		}

		let mut sorted: Vec<Migration> = Vec::with_capacity(self.migrations.len());
		let mut remaining: Vec<Migration> = self.migrations.drain(..).collect();

		while !remaining.is_empty() {
			let mut found_any = false;

			let mut i = 0;
			while i < remaining.len() {
				let all_deps_met = remaining[i].dependencies.iter().all(|(app, name)| {
					satisfied.contains(&(app.clone(), name.clone()))
						|| sorted
							.iter()
							.any(|m| m.app_label == *app && m.name == *name)
				});

				if all_deps_met {
					sorted.push(remaining.remove(i));
					found_any = true;
				} else {
					i += 1;
				}
			}

			if !found_any {
				let cycle = remaining
					.iter()
					.map(Migration::id)
					.collect::<Vec<_>>()
					.join(" -> ");
				return Err(MigrationError::CircularDependency { cycle });
			}
		}

		self.migrations = sorted;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_sort_across_apps() {
		let api = Migration::new("0001_initial", "api").add_dependency("auth", "0001_initial");
		let auth = Migration::new("0001_initial", "auth");

		let mut plan = MigrationPlan::new().with_migrations([api, auth]);
		plan.sort().unwrap();

		let ids: Vec<String> = plan.migrations.iter().map(Migration::id).collect();
		assert_eq!(ids, vec!["auth.0001_initial", "api.0001_initial"]);
	}

	#[rstest]
	fn test_sort_detects_cycle() {
		let a = Migration::new("0001_a", "api").add_dependency("api", "0002_b");
		let b = Migration::new("0002_b", "api").add_dependency("api", "0001_a");

		let mut plan = MigrationPlan::new().with_migrations([a, b]);
		let err = plan.sort().unwrap_err();
		assert!(matches!(err, MigrationError::CircularDependency { cycle } if cycle.contains("api.0001_a")));
	}

	#[rstest]
	fn test_sort_rejects_unknown_dependency() {
		let a = Migration::new("0002_next", "api").add_dependency("api", "0001_initial");

		let mut plan = MigrationPlan::new().with_migration(a);
		assert!(matches!(plan.sort(), Err(MigrationError::DependencyError(_))));
	}

	#[rstest]
	fn test_sort_after_accepts_applied_dependency() {
		let a = Migration::new("0002_next", "api").add_dependency("api", "0001_initial");
		let satisfied = HashSet::from([("api".to_string(), "0001_initial".to_string())]);

		let mut plan = MigrationPlan::new().with_migration(a);
		plan.sort_after(&satisfied).unwrap();
		assert_eq!(plan.migrations.len(), 1);
	}

	#[rstest]
	fn test_sort_rejects_duplicates() {
		let mut plan = MigrationPlan::new().with_migrations([
			Migration::new("0001_initial", "api"),
			Migration::new("0001_initial", "api"),
		]);
		assert!(matches!(plan.sort(), Err(MigrationError::InvalidMigration(_))));
	}
}
