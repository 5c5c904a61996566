//! Migrations for the todos app

pub mod _0001_initial;

use todo_db::migrations::{Migration, MigrationProvider};

pub struct TodoMigrations;

impl MigrationProvider for TodoMigrations {
	fn migrations() -> Vec<Migration> {
		vec![_0001_initial::migration()]
	}
}
