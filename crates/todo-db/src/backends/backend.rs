//! Backend trait definitions

use async_trait::async_trait;

use super::error::Result;
use super::types::{DatabaseType, QueryResult, QueryValue, Row};

/// Operations every database backend provides
#[async_trait]
pub trait DatabaseBackend: Send + Sync {
	fn database_type(&self) -> DatabaseType;

	async fn execute(&self, sql: &str, params: Vec<QueryValue>) -> Result<QueryResult>;

	async fn fetch_one(&self, sql: &str, params: Vec<QueryValue>) -> Result<Row>;

	async fn fetch_all(&self, sql: &str, params: Vec<QueryValue>) -> Result<Vec<Row>>;

	async fn fetch_optional(&self, sql: &str, params: Vec<QueryValue>) -> Result<Option<Row>>;

	async fn begin(&self) -> Result<Box<dyn TransactionExecutor>>;
}

/// Statements executed on a single connection inside an open transaction
///
/// Dropping the executor without calling [`commit`](Self::commit) rolls
/// the transaction back.
#[async_trait]
pub trait TransactionExecutor: Send {
	async fn execute(&mut self, sql: &str, params: Vec<QueryValue>) -> Result<QueryResult>;

	async fn fetch_all(&mut self, sql: &str, params: Vec<QueryValue>) -> Result<Vec<Row>>;

	async fn commit(self: Box<Self>) -> Result<()>;

	async fn rollback(self: Box<Self>) -> Result<()>;
}
