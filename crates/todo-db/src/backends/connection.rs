//! Database connection management

use std::str::FromStr;
use std::sync::Arc;

use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{PgPool, SqlitePool};
use tracing::debug;

use super::{
	backend::{DatabaseBackend, TransactionExecutor},
	error::{DatabaseError, Result},
	postgres::PostgresBackend,
	sqlite::SqliteBackend,
	types::{DatabaseType, QueryResult, QueryValue, Row},
};

/// Database connection wrapper
#[derive(Clone)]
pub struct DatabaseConnection {
	backend: Arc<dyn DatabaseBackend>,
}

impl std::fmt::Debug for DatabaseConnection {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DatabaseConnection")
			.field("database_type", &self.database_type())
			.finish()
	}
}

impl DatabaseConnection {
	pub fn new(backend: Arc<dyn DatabaseBackend>) -> Self {
		Self { backend }
	}

	/// Connect to the database named by `url`, picking the backend from its scheme
	///
	/// # Examples
	///
	/// ```no_run
	/// use todo_db::backends::DatabaseConnection;
	///
	/// # async fn example() -> todo_db::backends::Result<()> {
	/// let connection = DatabaseConnection::connect("sqlite::memory:").await?;
	/// # Ok(())
	/// # }
	/// ```
	pub async fn connect(url: &str) -> Result<Self> {
		match DatabaseType::from_url(url) {
			Some(DatabaseType::Sqlite) => Self::connect_sqlite(url).await,
			Some(DatabaseType::Postgres) => Self::connect_postgres(url).await,
			None => Err(DatabaseError::UnsupportedDatabase(
				url.split(':').next().unwrap_or_default().to_string(),
			)),
		}
	}

	/// Connect to SQLite, creating the database file if it does not exist
	///
	/// `?mode=ro` in the URL opens the file read-only instead.
	pub async fn connect_sqlite(url: &str) -> Result<Self> {
		debug!(backend = "sqlite", "connecting");
		let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
		let pool = SqlitePool::connect_with(options).await?;
		Ok(Self::from_sqlite_pool(pool))
	}

	pub async fn connect_postgres(url: &str) -> Result<Self> {
		debug!(backend = "postgres", "connecting");
		let pool = PgPool::connect(url).await?;
		Ok(Self::from_postgres_pool(pool))
	}

	pub fn from_sqlite_pool(pool: SqlitePool) -> Self {
		Self {
			backend: Arc::new(SqliteBackend::new(pool)),
		}
	}

	pub fn from_postgres_pool(pool: PgPool) -> Self {
		Self {
			backend: Arc::new(PostgresBackend::new(pool)),
		}
	}

	pub fn backend(&self) -> Arc<dyn DatabaseBackend> {
		self.backend.clone()
	}

	/// Get the database type
	pub fn database_type(&self) -> DatabaseType {
		self.backend.database_type()
	}

	pub async fn execute(&self, sql: &str, params: Vec<QueryValue>) -> Result<QueryResult> {
		self.backend.execute(sql, params).await
	}

	pub async fn fetch_one(&self, sql: &str, params: Vec<QueryValue>) -> Result<Row> {
		self.backend.fetch_one(sql, params).await
	}

	pub async fn fetch_all(&self, sql: &str, params: Vec<QueryValue>) -> Result<Vec<Row>> {
		self.backend.fetch_all(sql, params).await
	}

	pub async fn fetch_optional(&self, sql: &str, params: Vec<QueryValue>) -> Result<Option<Row>> {
		self.backend.fetch_optional(sql, params).await
	}

	pub async fn begin(&self) -> Result<Box<dyn TransactionExecutor>> {
		self.backend.begin().await
	}
}
