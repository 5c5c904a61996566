//! Initial migration for the ToDoItem table

use todo_db::migrations::{ColumnDefinition, CreateTable, FieldType, Migration, Operation};

use crate::apps::todos::models::{CONTENT_MAX_LENGTH, TABLE_NAME};
use crate::apps::todos::APP_LABEL;

pub const NAME: &str = "0001_initial";

/// Initial migration creating the ToDoItem table
pub fn migration() -> Migration {
	Migration::new(NAME, APP_LABEL)
		.initial(true)
		.add_operation(Operation::CreateTable(create_table()))
}

pub fn create_table() -> CreateTable {
	CreateTable::new(
		TABLE_NAME,
		vec![
			ColumnDefinition::new("id", FieldType::BigInteger)
				.primary_key()
				.auto_increment(),
			ColumnDefinition::new("content", FieldType::VarChar(CONTENT_MAX_LENGTH as u32))
				.not_null(),
			ColumnDefinition::new("completed", FieldType::Boolean)
				.not_null()
				.default(false),
		],
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_migration_record() {
		let migration = migration();
		assert_eq!(migration.id(), "api.0001_initial");
		assert!(migration.is_initial());
		assert!(migration.dependencies.is_empty());
		assert!(migration.atomic);
		assert_eq!(migration.operations.len(), 1);
	}

	#[rstest]
	fn test_table_columns() {
		let table = create_table();
		assert_eq!(table.name, "ToDoItem");

		let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
		assert_eq!(names, vec!["id", "content", "completed"]);

		let id = table.column("id").unwrap();
		assert!(id.primary_key && id.auto_increment);
		assert_eq!(table.column("content").unwrap().max_length(), Some(125));
		assert!(!table.column("completed").unwrap().is_nullable());
		assert!(table.validate().is_ok());
	}
}
