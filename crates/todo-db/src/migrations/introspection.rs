//! Database schema introspection
//!
//! Reads table existence and column metadata back from the store so that
//! an existing table can be compared against a [`CreateTable`](super::CreateTable)
//! definition before anything is executed.

use std::collections::HashSet;

use pg_escape::quote_identifier;

use super::Result;
use crate::backends::{DatabaseConnection, DatabaseType, Row};

/// Column metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
	/// Column name
	pub name: String,
	/// Declared type as reported by the database (e.g. `VARCHAR(125)`)
	pub data_type: String,
	/// Whether the column is nullable
	pub nullable: bool,
	/// Whether the column is part of the primary key
	pub primary_key: bool,
	/// Whether a single-column UNIQUE constraint or index covers the column
	pub unique: bool,
	/// Default value expression
	pub default: Option<String>,
}

/// Reads schema metadata through a [`DatabaseConnection`]
#[derive(Debug, Clone)]
pub struct DatabaseIntrospector {
	connection: DatabaseConnection,
}

impl DatabaseIntrospector {
	pub fn new(connection: DatabaseConnection) -> Self {
		Self { connection }
	}

	/// Check whether a table exists
	///
	/// SQLite compares names case-insensitively, as it does when resolving
	/// identifiers; PostgreSQL compares the exact (quoted) name in the
	/// current schema.
	pub async fn table_exists(&self, table: &str) -> Result<bool> {
		let sql = match self.connection.database_type() {
			DatabaseType::Sqlite => {
				"SELECT COUNT(*) AS count FROM sqlite_master \
				 WHERE type = 'table' AND lower(name) = lower(?)"
			}
			DatabaseType::Postgres => {
				"SELECT COUNT(*)::int8 AS count FROM information_schema.tables \
				 WHERE table_schema = current_schema() AND table_name = $1"
			}
		};

		let row = self.connection.fetch_one(sql, vec![table.into()]).await?;
		Ok(row.get::<i64>("count")? > 0)
	}

	/// Describe a table's columns in declaration order
	///
	/// Returns an empty list when the table does not exist.
	pub async fn describe_table(&self, table: &str) -> Result<Vec<ColumnInfo>> {
		match self.connection.database_type() {
			DatabaseType::Sqlite => self.describe_sqlite(table).await,
			DatabaseType::Postgres => self.describe_postgres(table).await,
		}
	}

	async fn describe_sqlite(&self, table: &str) -> Result<Vec<ColumnInfo>> {
		// PRAGMA arguments cannot be bound
		let sql = format!("PRAGMA table_info({})", quote_identifier(table));
		let rows = self.connection.fetch_all(&sql, vec![]).await?;
		let unique = self.sqlite_unique_columns(table).await?;

		rows.iter()
			.map(|row| -> Result<ColumnInfo> {
				let name: String = row.get("name")?;
				Ok(ColumnInfo {
					unique: unique.contains(&name),
					name,
					data_type: row.get("type")?,
					nullable: row.get::<i64>("notnull")? == 0,
					primary_key: row.get::<i64>("pk")? > 0,
					default: row.get_opt("dflt_value")?,
				})
			})
			.collect()
	}

	/// Columns covered by a single-column unique index, primary keys excluded
	async fn sqlite_unique_columns(&self, table: &str) -> Result<HashSet<String>> {
		let sql = format!("PRAGMA index_list({})", quote_identifier(table));
		let indexes = self.connection.fetch_all(&sql, vec![]).await?;

		let mut columns = HashSet::new();
		for index in &indexes {
			let origin: String = index.get("origin")?;
			if index.get::<i64>("unique")? == 0 || origin == "pk" {
				continue;
			}

			let name: String = index.get("name")?;
			let sql = format!("PRAGMA index_info({})", quote_identifier(&name));
			let indexed = self.connection.fetch_all(&sql, vec![]).await?;
			if let [column] = indexed.as_slice() {
				columns.insert(column.get::<String>("name")?);
			}
		}
		Ok(columns)
	}

	async fn describe_postgres(&self, table: &str) -> Result<Vec<ColumnInfo>> {
		// information_schema columns use domain types; cast them to plain text
		let sql = "SELECT c.column_name::text AS name, \
		           CASE c.data_type::text \
		             WHEN 'character varying' \
		               THEN 'VARCHAR(' || c.character_maximum_length::text || ')' \
		             ELSE upper(c.data_type::text) \
		           END AS data_type, \
		           (c.is_nullable::text = 'YES') AS nullable, \
		           EXISTS ( \
		             SELECT 1 FROM information_schema.table_constraints tc \
		             JOIN information_schema.key_column_usage kcu \
		               ON tc.constraint_name = kcu.constraint_name \
		              AND tc.table_schema = kcu.table_schema \
		             WHERE tc.constraint_type = 'PRIMARY KEY' \
		               AND tc.table_schema = c.table_schema \
		               AND tc.table_name = c.table_name \
		               AND kcu.column_name = c.column_name \
		           ) AS primary_key, \
		           EXISTS ( \
		             SELECT 1 FROM information_schema.table_constraints tc \
		             JOIN information_schema.key_column_usage kcu \
		               ON tc.constraint_name = kcu.constraint_name \
		              AND tc.table_schema = kcu.table_schema \
		             WHERE tc.constraint_type = 'UNIQUE' \
		               AND tc.table_schema = c.table_schema \
		               AND tc.table_name = c.table_name \
		               AND kcu.column_name = c.column_name \
		               AND ( \
		                 SELECT COUNT(*) FROM information_schema.key_column_usage k \
		                 WHERE k.constraint_name = tc.constraint_name \
		                   AND k.table_schema = tc.table_schema \
		               ) = 1 \
		           ) AS is_unique, \
		           c.column_default::text AS column_default \
		           FROM information_schema.columns c \
		           WHERE c.table_schema = current_schema() AND c.table_name = $1 \
		           ORDER BY c.ordinal_position";

		let rows = self.connection.fetch_all(sql, vec![table.into()]).await?;
		rows.iter().map(postgres_column).collect()
	}
}

fn postgres_column(row: &Row) -> Result<ColumnInfo> {
	Ok(ColumnInfo {
		name: row.get("name")?,
		data_type: row.get("data_type")?,
		nullable: row.get("nullable")?,
		primary_key: row.get("primary_key")?,
		unique: row.get("is_unique")?,
		default: row.get_opt("column_default")?,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::backends::QueryValue;
	use rstest::rstest;

	#[rstest]
	fn test_postgres_column_from_row() {
		let mut row = Row::new();
		row.insert("name".into(), QueryValue::String("content".into()));
		row.insert("data_type".into(), QueryValue::String("VARCHAR(125)".into()));
		row.insert("nullable".into(), QueryValue::Bool(false));
		row.insert("primary_key".into(), QueryValue::Bool(false));
		row.insert("is_unique".into(), QueryValue::Bool(true));
		row.insert("column_default".into(), QueryValue::Null);

		let column = postgres_column(&row).unwrap();
		assert_eq!(
			column,
			ColumnInfo {
				name: "content".into(),
				data_type: "VARCHAR(125)".into(),
				nullable: false,
				primary_key: false,
				unique: true,
				default: None,
			}
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_sqlite_table_exists_is_case_insensitive() {
		let connection = DatabaseConnection::connect_sqlite("sqlite::memory:")
			.await
			.unwrap();
		connection
			.execute("CREATE TABLE \"ToDoItem\" (id INTEGER PRIMARY KEY)", vec![])
			.await
			.unwrap();

		let introspector = DatabaseIntrospector::new(connection);
		assert!(introspector.table_exists("ToDoItem").await.unwrap());
		assert!(introspector.table_exists("todoitem").await.unwrap());
		assert!(!introspector.table_exists("missing").await.unwrap());
	}

	#[rstest]
	#[tokio::test]
	async fn test_sqlite_describe_reports_single_column_unique() {
		let connection = DatabaseConnection::connect_sqlite("sqlite::memory:")
			.await
			.unwrap();
		connection
			.execute(
				"CREATE TABLE \"ToDoItem\" (\
				 id INTEGER PRIMARY KEY, \
				 content TEXT UNIQUE, \
				 a TEXT, b TEXT, \
				 completed BOOLEAN DEFAULT 1, \
				 UNIQUE (a, b))",
				vec![],
			)
			.await
			.unwrap();

		let columns = DatabaseIntrospector::new(connection)
			.describe_table("ToDoItem")
			.await
			.unwrap();
		let unique: Vec<&str> = columns
			.iter()
			.filter(|c| c.unique)
			.map(|c| c.name.as_str())
			.collect();
		assert_eq!(unique, vec!["content"]);
		assert_eq!(columns[4].default.as_deref(), Some("1"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_sqlite_describe_missing_table_is_empty() {
		let connection = DatabaseConnection::connect_sqlite("sqlite::memory:")
			.await
			.unwrap();
		let introspector = DatabaseIntrospector::new(connection);
		assert!(introspector.describe_table("missing").await.unwrap().is_empty());
	}
}
