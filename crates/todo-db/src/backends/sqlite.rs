//! SQLite backend implementation

use async_trait::async_trait;
use sqlx::{Column, Row as SqlxRow, Sqlite, SqlitePool, Transaction, TypeInfo, sqlite::SqliteRow};
use std::sync::Arc;

use super::{
	backend::{DatabaseBackend, TransactionExecutor},
	error::{DatabaseError, Result},
	types::{DatabaseType, QueryResult, QueryValue, Row},
};

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>>;

/// SQLite database backend
pub struct SqliteBackend {
	pool: Arc<SqlitePool>,
}

impl SqliteBackend {
	pub fn new(pool: SqlitePool) -> Self {
		Self {
			pool: Arc::new(pool),
		}
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}
}

fn bind_value<'q>(query: SqliteQuery<'q>, value: &'q QueryValue) -> SqliteQuery<'q> {
	match value {
		QueryValue::Null => query.bind(None::<i64>),
		QueryValue::Bool(b) => query.bind(b),
		QueryValue::Int(i) => query.bind(i),
		QueryValue::Float(f) => query.bind(f),
		QueryValue::String(s) => query.bind(s.as_str()),
	}
}

fn build_query<'q>(sql: &'q str, params: &'q [QueryValue]) -> SqliteQuery<'q> {
	params
		.iter()
		.fold(sqlx::query(sql), |query, param| bind_value(query, param))
}

fn convert_row(sqlite_row: SqliteRow) -> Result<Row> {
	let mut row = Row::new();
	for column in sqlite_row.columns() {
		let column_name = column.name();
		let type_name = column.type_info().name().to_uppercase();

		// try_get::<i64> can yield 0 for NULL in RETURNING rows, so check every
		// storage class through Option first
		let is_null = sqlite_row
			.try_get::<Option<String>, _>(column_name)
			.ok()
			.flatten()
			.is_none() && sqlite_row
			.try_get::<Option<i64>, _>(column_name)
			.ok()
			.flatten()
			.is_none() && sqlite_row
			.try_get::<Option<f64>, _>(column_name)
			.ok()
			.flatten()
			.is_none();

		let value = if is_null {
			QueryValue::Null
		} else if type_name.contains("BOOL") {
			// BOOLEAN columns are stored as 0/1 integers
			match sqlite_row.try_get::<i64, _>(column_name) {
				Ok(value) => QueryValue::Bool(value != 0),
				Err(_) => sqlite_row
					.try_get::<bool, _>(column_name)
					.map(QueryValue::Bool)
					.unwrap_or(QueryValue::Null),
			}
		} else if let Ok(value) = sqlite_row.try_get::<i64, _>(column_name) {
			QueryValue::Int(value)
		} else if let Ok(value) = sqlite_row.try_get::<f64, _>(column_name) {
			QueryValue::Float(value)
		} else if let Ok(value) = sqlite_row.try_get::<String, _>(column_name) {
			QueryValue::String(value)
		} else {
			return Err(DatabaseError::TypeError(format!(
				"Unsupported SQLite value in column {} ({})",
				column_name, type_name
			)));
		};
		row.insert(column_name.to_string(), value);
	}
	Ok(row)
}

#[async_trait]
impl DatabaseBackend for SqliteBackend {
	fn database_type(&self) -> DatabaseType {
		DatabaseType::Sqlite
	}

	async fn execute(&self, sql: &str, params: Vec<QueryValue>) -> Result<QueryResult> {
		let result = build_query(sql, &params)
			.execute(self.pool.as_ref())
			.await?;
		Ok(QueryResult {
			rows_affected: result.rows_affected(),
		})
	}

	async fn fetch_one(&self, sql: &str, params: Vec<QueryValue>) -> Result<Row> {
		let row = build_query(sql, &params)
			.fetch_one(self.pool.as_ref())
			.await?;
		convert_row(row)
	}

	async fn fetch_all(&self, sql: &str, params: Vec<QueryValue>) -> Result<Vec<Row>> {
		let rows = build_query(sql, &params)
			.fetch_all(self.pool.as_ref())
			.await?;
		rows.into_iter().map(convert_row).collect()
	}

	async fn fetch_optional(&self, sql: &str, params: Vec<QueryValue>) -> Result<Option<Row>> {
		let row = build_query(sql, &params)
			.fetch_optional(self.pool.as_ref())
			.await?;
		row.map(convert_row).transpose()
	}

	async fn begin(&self) -> Result<Box<dyn TransactionExecutor>> {
		let tx = self.pool.begin().await?;
		Ok(Box::new(SqliteTransactionExecutor::new(tx)))
	}
}

/// SQLite transaction executor
pub struct SqliteTransactionExecutor {
	tx: Option<Transaction<'static, Sqlite>>,
}

impl SqliteTransactionExecutor {
	pub fn new(tx: Transaction<'static, Sqlite>) -> Self {
		Self { tx: Some(tx) }
	}

	fn take(&mut self) -> Result<Transaction<'static, Sqlite>> {
		self.tx.take().ok_or_else(consumed)
	}
}

fn consumed() -> DatabaseError {
	DatabaseError::TransactionError("Transaction already consumed".to_string())
}

#[async_trait]
impl TransactionExecutor for SqliteTransactionExecutor {
	async fn execute(&mut self, sql: &str, params: Vec<QueryValue>) -> Result<QueryResult> {
		let tx = self.tx.as_mut().ok_or_else(consumed)?;
		let result = build_query(sql, &params).execute(&mut **tx).await?;
		Ok(QueryResult {
			rows_affected: result.rows_affected(),
		})
	}

	async fn fetch_all(&mut self, sql: &str, params: Vec<QueryValue>) -> Result<Vec<Row>> {
		let tx = self.tx.as_mut().ok_or_else(consumed)?;
		let rows = build_query(sql, &params).fetch_all(&mut **tx).await?;
		rows.into_iter().map(convert_row).collect()
	}

	async fn commit(mut self: Box<Self>) -> Result<()> {
		self.take()?.commit().await?;
		Ok(())
	}

	async fn rollback(mut self: Box<Self>) -> Result<()> {
		self.take()?.rollback().await?;
		Ok(())
	}
}
