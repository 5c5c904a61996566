//! Installed apps

pub mod todos;

use todo_db::migrations::{Migration, MigrationProvider};

/// Migrations of every installed app
pub fn all_migrations() -> Vec<Migration> {
	todos::TodoMigrations::migrations()
}
