//! Migration recorder
//!
//! Applied migrations are listed in the `schema_migrations` table, one row
//! per `(app, name)` pair.

use chrono::{DateTime, Utc};
use sea_query::{Alias, ColumnDef, Expr, ExprTrait, Index, Order, Query, Table};
use tracing::debug;

use super::Result;
use crate::backends::{
	DatabaseConnection, DatabaseError, QueryValue, TransactionExecutor, build_schema_statement,
	build_statement,
};

/// Name of the table that lists applied migrations
pub const SCHEMA_MIGRATIONS_TABLE: &str = "schema_migrations";

const APP_NAME_INDEX: &str = "schema_migrations_app_name_unique";

/// Migration record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRecord {
	pub app: String,
	pub name: String,
	pub applied: DateTime<Utc>,
}

/// Database-backed migration recorder
#[derive(Debug, Clone)]
pub struct MigrationRecorder {
	connection: DatabaseConnection,
}

impl MigrationRecorder {
	/// Create a new database-backed migration recorder
	///
	/// # Examples
	///
	/// ```no_run
	/// use todo_db::migrations::MigrationRecorder;
	/// use todo_db::backends::DatabaseConnection;
	///
	/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
	/// let connection = DatabaseConnection::connect("sqlite::memory:").await?;
	/// let recorder = MigrationRecorder::new(connection);
	/// recorder.ensure_schema_table().await?;
	/// assert!(!recorder.is_applied("api", "0001_initial").await?);
	/// # Ok(())
	/// # }
	/// ```
	pub fn new(connection: DatabaseConnection) -> Self {
		Self { connection }
	}

	/// Create the `schema_migrations` table and its `(app, name)` index if
	/// they do not exist yet
	pub async fn ensure_schema_table(&self) -> Result<()> {
		let database_type = self.connection.database_type();

		// Statements are dropped before the first await
		let (create_table_sql, create_index_sql) = {
			let create_table = Table::create()
				.table(Alias::new(SCHEMA_MIGRATIONS_TABLE))
				.if_not_exists()
				.col(
					ColumnDef::new(Alias::new("id"))
						.integer()
						.not_null()
						.auto_increment()
						.primary_key(),
				)
				.col(ColumnDef::new(Alias::new("app")).string_len(255).not_null())
				.col(ColumnDef::new(Alias::new("name")).string_len(255).not_null())
				// RFC 3339 text, decoded the same way on every backend
				.col(ColumnDef::new(Alias::new("applied")).text().not_null())
				.to_owned();

			let create_index = Index::create()
				.if_not_exists()
				.name(APP_NAME_INDEX)
				.table(Alias::new(SCHEMA_MIGRATIONS_TABLE))
				.col(Alias::new("app"))
				.col(Alias::new("name"))
				.unique()
				.to_owned();

			(
				build_schema_statement(&create_table, database_type),
				build_schema_statement(&create_index, database_type),
			)
		};

		self.connection.execute(&create_table_sql, vec![]).await?;
		self.connection.execute(&create_index_sql, vec![]).await?;
		Ok(())
	}

	/// Check if a migration has been applied
	pub async fn is_applied(&self, app: &str, name: &str) -> Result<bool> {
		let (sql, params) = {
			let select = Query::select()
				.column(Alias::new("id"))
				.from(Alias::new(SCHEMA_MIGRATIONS_TABLE))
				.and_where(Expr::col(Alias::new("app")).eq(app))
				.and_where(Expr::col(Alias::new("name")).eq(name))
				.limit(1)
				.to_owned();
			build_statement(&select, self.connection.database_type())
		};

		Ok(self.connection.fetch_optional(&sql, params).await?.is_some())
	}

	/// Record a migration as applied
	pub async fn record_applied(&self, app: &str, name: &str) -> Result<()> {
		let (sql, params) = self.insert_statement(app, name);
		self.connection.execute(&sql, params).await?;
		debug!(app, name, "recorded migration");
		Ok(())
	}

	/// Record a migration as applied inside an open transaction
	///
	/// The record becomes visible only when the transaction commits, so a
	/// rolled-back migration is never listed as applied.
	pub async fn record_applied_in(
		&self,
		tx: &mut dyn TransactionExecutor,
		app: &str,
		name: &str,
	) -> Result<()> {
		let (sql, params) = self.insert_statement(app, name);
		tx.execute(&sql, params).await?;
		debug!(app, name, "recorded migration in transaction");
		Ok(())
	}

	/// All applied migrations, oldest first
	pub async fn applied_migrations(&self) -> Result<Vec<MigrationRecord>> {
		let (sql, params) = {
			let select = Query::select()
				.columns([Alias::new("app"), Alias::new("name"), Alias::new("applied")])
				.from(Alias::new(SCHEMA_MIGRATIONS_TABLE))
				.order_by(Alias::new("id"), Order::Asc)
				.to_owned();
			build_statement(&select, self.connection.database_type())
		};
		let rows = self.connection.fetch_all(&sql, params).await?;

		rows.iter()
			.map(|row| -> Result<MigrationRecord> {
				let applied: String = row.get("applied")?;
				Ok(MigrationRecord {
					app: row.get("app")?,
					name: row.get("name")?,
					applied: parse_timestamp(&applied)?,
				})
			})
			.collect()
	}

	fn insert_statement(&self, app: &str, name: &str) -> (String, Vec<QueryValue>) {
		let insert = Query::insert()
			.into_table(Alias::new(SCHEMA_MIGRATIONS_TABLE))
			.columns([Alias::new("app"), Alias::new("name"), Alias::new("applied")])
			.values_panic([
				app.into(),
				name.into(),
				Utc::now().to_rfc3339().into(),
			])
			.to_owned();
		build_statement(&insert, self.connection.database_type())
	}
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
	DateTime::parse_from_rfc3339(value)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| DatabaseError::TypeError(format!("invalid applied timestamp {value}: {e}")).into())
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::*;

	#[fixture]
	async fn recorder() -> MigrationRecorder {
		let connection = DatabaseConnection::connect_sqlite("sqlite::memory:")
			.await
			.unwrap();
		let recorder = MigrationRecorder::new(connection);
		recorder.ensure_schema_table().await.unwrap();
		recorder
	}

	#[rstest]
	#[tokio::test]
	async fn test_record_and_query(#[future] recorder: MigrationRecorder) {
		let recorder = recorder.await;
		assert!(!recorder.is_applied("api", "0001_initial").await.unwrap());

		recorder.record_applied("api", "0001_initial").await.unwrap();

		assert!(recorder.is_applied("api", "0001_initial").await.unwrap());
		assert!(!recorder.is_applied("auth", "0001_initial").await.unwrap());
	}

	#[rstest]
	#[tokio::test]
	async fn test_ensure_schema_table_is_idempotent(#[future] recorder: MigrationRecorder) {
		let recorder = recorder.await;
		recorder.ensure_schema_table().await.unwrap();
		assert!(recorder.applied_migrations().await.unwrap().is_empty());
	}

	#[rstest]
	#[tokio::test]
	async fn test_applied_migrations_in_order(#[future] recorder: MigrationRecorder) {
		let recorder = recorder.await;
		recorder.record_applied("api", "0001_initial").await.unwrap();
		recorder.record_applied("auth", "0001_initial").await.unwrap();
		recorder.record_applied("api", "0002_next").await.unwrap();

		let names: Vec<(String, String)> = recorder
			.applied_migrations()
			.await
			.unwrap()
			.into_iter()
			.map(|r| (r.app, r.name))
			.collect();
		assert_eq!(
			names,
			vec![
				("api".to_string(), "0001_initial".to_string()),
				("auth".to_string(), "0001_initial".to_string()),
				("api".to_string(), "0002_next".to_string()),
			]
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_duplicate_record_is_rejected(#[future] recorder: MigrationRecorder) {
		let recorder = recorder.await;
		recorder.record_applied("api", "0001_initial").await.unwrap();
		assert!(recorder.record_applied("api", "0001_initial").await.is_err());
	}

	#[rstest]
	#[tokio::test]
	async fn test_rolled_back_record_is_not_listed(#[future] recorder: MigrationRecorder) {
		let recorder = recorder.await;
		let mut tx = recorder.connection.begin().await.unwrap();
		recorder
			.record_applied_in(tx.as_mut(), "api", "0001_initial")
			.await
			.unwrap();
		tx.rollback().await.unwrap();

		assert!(!recorder.is_applied("api", "0001_initial").await.unwrap());
	}

	#[rstest]
	fn test_parse_timestamp_rejects_garbage() {
		assert!(parse_timestamp("yesterday").is_err());
		assert!(parse_timestamp("2026-01-02T03:04:05+00:00").is_ok());
	}
}
