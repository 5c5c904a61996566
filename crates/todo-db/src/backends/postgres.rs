//! PostgreSQL backend implementation

use async_trait::async_trait;
use sqlx::{Column, PgPool, Postgres, Row as SqlxRow, Transaction, TypeInfo, postgres::PgRow};
use std::sync::Arc;

use super::{
	backend::{DatabaseBackend, TransactionExecutor},
	error::{DatabaseError, Result},
	types::{DatabaseType, QueryResult, QueryValue, Row},
};

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, sqlx::postgres::PgArguments>;

/// PostgreSQL database backend
pub struct PostgresBackend {
	pool: Arc<PgPool>,
}

impl PostgresBackend {
	pub fn new(pool: PgPool) -> Self {
		Self {
			pool: Arc::new(pool),
		}
	}

	pub fn pool(&self) -> &PgPool {
		&self.pool
	}
}

fn bind_value<'q>(query: PgQuery<'q>, value: &'q QueryValue) -> PgQuery<'q> {
	match value {
		QueryValue::Null => query.bind(None::<i64>),
		QueryValue::Bool(b) => query.bind(*b),
		QueryValue::Int(i) => query.bind(*i),
		QueryValue::Float(f) => query.bind(*f),
		QueryValue::String(s) => query.bind(s.as_str()),
	}
}

fn build_query<'q>(sql: &'q str, params: &'q [QueryValue]) -> PgQuery<'q> {
	params
		.iter()
		.fold(sqlx::query(sql), |query, param| bind_value(query, param))
}

fn convert_row(pg_row: PgRow) -> Result<Row> {
	let mut row = Row::new();
	for column in pg_row.columns() {
		let column_name = column.name();
		let type_name = column.type_info().name().to_uppercase();

		let value = match type_name.as_str() {
			"BOOL" => pg_row
				.try_get::<Option<bool>, _>(column_name)?
				.map_or(QueryValue::Null, QueryValue::Bool),
			"INT8" => pg_row
				.try_get::<Option<i64>, _>(column_name)?
				.map_or(QueryValue::Null, QueryValue::Int),
			"INT4" => pg_row
				.try_get::<Option<i32>, _>(column_name)?
				.map_or(QueryValue::Null, |v| QueryValue::Int(v as i64)),
			"INT2" => pg_row
				.try_get::<Option<i16>, _>(column_name)?
				.map_or(QueryValue::Null, |v| QueryValue::Int(v as i64)),
			"FLOAT4" => pg_row
				.try_get::<Option<f32>, _>(column_name)?
				.map_or(QueryValue::Null, |v| QueryValue::Float(v as f64)),
			"FLOAT8" => pg_row
				.try_get::<Option<f64>, _>(column_name)?
				.map_or(QueryValue::Null, QueryValue::Float),
			"TEXT" | "VARCHAR" | "NAME" | "BPCHAR" | "CHAR" => pg_row
				.try_get::<Option<String>, _>(column_name)?
				.map_or(QueryValue::Null, QueryValue::String),
			other => {
				return Err(DatabaseError::TypeError(format!(
					"Unsupported PostgreSQL type {} in column {}",
					other, column_name
				)));
			}
		};
		row.insert(column_name.to_string(), value);
	}
	Ok(row)
}

#[async_trait]
impl DatabaseBackend for PostgresBackend {
	fn database_type(&self) -> DatabaseType {
		DatabaseType::Postgres
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
		Ok(Box::new(PostgresTransactionExecutor { tx: Some(tx) }))
	}
}

/// PostgreSQL transaction executor
pub struct PostgresTransactionExecutor {
	tx: Option<Transaction<'static, Postgres>>,
}

fn consumed() -> DatabaseError {
	DatabaseError::TransactionError("Transaction already consumed".to_string())
}

#[async_trait]
impl TransactionExecutor for PostgresTransactionExecutor {
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
		self.tx.take().ok_or_else(consumed)?.commit().await?;
		Ok(())
	}

	async fn rollback(mut self: Box<Self>) -> Result<()> {
		self.tx.take().ok_or_else(consumed)?.rollback().await?;
		Ok(())
	}
}
