//! MigrationExecutor integration tests against in-memory SQLite

use rstest::*;
use todo_db::backends::DatabaseConnection;
use todo_db::migrations::introspection::DatabaseIntrospector;
use todo_db::migrations::{
	ColumnDefinition, CreateTable, FieldType, Migration, MigrationError, MigrationExecutor,
	Operation,
};

fn todo_migration() -> Migration {
	Migration::new("0001_initial", "api")
		.initial(true)
		.add_operation(Operation::CreateTable(CreateTable::new(
			"ToDoItem",
			vec![
				ColumnDefinition::new("id", FieldType::BigInteger)
					.primary_key()
					.auto_increment(),
				ColumnDefinition::new("content", FieldType::VarChar(125)).not_null(),
				ColumnDefinition::new("completed", FieldType::Boolean)
					.not_null()
					.default(false),
			],
		)))
}

#[fixture]
async fn connection() -> DatabaseConnection {
	DatabaseConnection::connect_sqlite("sqlite::memory:")
		.await
		.expect("Failed to connect to in-memory SQLite")
}

#[rstest]
#[tokio::test]
async fn test_apply_records_and_skips(#[future] connection: DatabaseConnection) {
	let connection = connection.await;
	let mut executor = MigrationExecutor::new(connection.clone());

	let result = executor.apply_migrations(&[todo_migration()]).await.unwrap();
	assert_eq!(result.applied, vec!["api.0001_initial"]);
	assert!(result.skipped.is_empty());

	let result = executor.apply_migrations(&[todo_migration()]).await.unwrap();
	assert!(result.applied.is_empty());
	assert_eq!(result.skipped, vec!["api.0001_initial"]);

	let applied = executor.applied().await.unwrap();
	assert_eq!(applied.len(), 1);
	assert_eq!(applied[0].app, "api");
	assert_eq!(applied[0].name, "0001_initial");
}

#[rstest]
#[tokio::test]
async fn test_apply_one_refuses_double_application(#[future] connection: DatabaseConnection) {
	let mut executor = MigrationExecutor::new(connection.await);
	executor.apply_one(&todo_migration()).await.unwrap();

	let err = executor.apply_one(&todo_migration()).await.unwrap_err();
	assert!(matches!(err, MigrationError::AlreadyApplied(id) if id == "api.0001_initial"));
}

#[rstest]
#[tokio::test]
async fn test_dependencies_are_applied_first(#[future] connection: DatabaseConnection) {
	let mut executor = MigrationExecutor::new(connection.await);
	let index = Migration::new("0002_content_index", "api")
		.add_dependency("api", "0001_initial")
		.add_operation(Operation::RunSql {
			sql: "CREATE INDEX todoitem_content ON \"ToDoItem\" (content)".to_string(),
		});

	let result = executor
		.apply_migrations(&[index, todo_migration()])
		.await
		.unwrap();
	assert_eq!(
		result.applied,
		vec!["api.0001_initial", "api.0002_content_index"]
	);
}

#[rstest]
#[tokio::test]
async fn test_dependency_on_applied_migration_is_satisfied(
	#[future] connection: DatabaseConnection,
) {
	let mut executor = MigrationExecutor::new(connection.await);
	executor.apply_migrations(&[todo_migration()]).await.unwrap();

	let next = Migration::new("0002_seed", "api")
		.add_dependency("api", "0001_initial")
		.add_operation(Operation::RunSql {
			sql: "INSERT INTO \"ToDoItem\" (content) VALUES ('seed')".to_string(),
		});
	let plan = executor.plan(std::slice::from_ref(&next)).await.unwrap();
	assert_eq!(plan.len(), 1);

	let result = executor.apply_migrations(&[next]).await.unwrap();
	assert_eq!(result.applied, vec!["api.0002_seed"]);
}

#[rstest]
#[tokio::test]
async fn test_missing_dependency_is_rejected(#[future] connection: DatabaseConnection) {
	let mut executor = MigrationExecutor::new(connection.await);
	let orphan = Migration::new("0002_next", "api").add_dependency("api", "0001_initial");

	let err = executor.apply_migrations(&[orphan]).await.unwrap_err();
	assert!(matches!(err, MigrationError::DependencyError(_)));
}

#[rstest]
#[tokio::test]
async fn test_failed_atomic_migration_leaves_no_trace(#[future] connection: DatabaseConnection) {
	let connection = connection.await;
	let mut executor = MigrationExecutor::new(connection.clone());
	let broken = todo_migration().add_operation(Operation::RunSql {
		sql: "INSERT INTO missing_table VALUES (1)".to_string(),
	});

	assert!(executor.apply_migrations(&[broken]).await.is_err());

	let introspector = DatabaseIntrospector::new(connection);
	assert!(!introspector.table_exists("ToDoItem").await.unwrap());
	assert!(executor.applied().await.unwrap().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_unrecorded_existing_table_is_schema_conflict(
	#[future] connection: DatabaseConnection,
) {
	let connection = connection.await;
	connection
		.execute(
			"CREATE TABLE \"ToDoItem\" (id INTEGER PRIMARY KEY, content TEXT)",
			vec![],
		)
		.await
		.unwrap();

	let mut executor = MigrationExecutor::new(connection);
	let err = executor
		.apply_migrations(&[todo_migration()])
		.await
		.unwrap_err();
	assert!(matches!(err, MigrationError::SchemaConflict { .. }));
	assert!(executor.applied().await.unwrap().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_sql_for_matches_dialect(#[future] connection: DatabaseConnection) {
	let executor = MigrationExecutor::new(connection.await);
	let sql = executor.sql_for(&todo_migration());
	assert_eq!(sql.len(), 1);
	assert!(sql[0].contains("PRIMARY KEY AUTOINCREMENT"));
	assert!(sql[0].contains("<= 125)"));
}
