//! ToDoItem model
//!
//! [`ToDoItemManager`] inserts and reads rows of the table created by the
//! `0001_initial` migration.

use sea_query::{Alias, Expr, ExprTrait, Order, Query, ReturningClause};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use todo_db::backends::{DatabaseConnection, DatabaseError, QueryValue, Row, build_statement};
use tracing::debug;

pub const TABLE_NAME: &str = "ToDoItem";

/// Maximum length of `content`, in characters
pub const CONTENT_MAX_LENGTH: usize = 125;

const COLUMNS: [&str; 3] = ["id", "content", "completed"];

fn returning_columns() -> ReturningClause {
	Query::returning().columns(COLUMNS.map(Alias::new))
}

#[derive(Debug, Error)]
pub enum ModelError {
	#[error("Validation error on {field}: {message}")]
	Validation { field: String, message: String },

	#[error("ToDoItem {0} not found")]
	NotFound(i64),

	#[error(transparent)]
	Database(#[from] DatabaseError),
}

pub type Result<T> = std::result::Result<T, ModelError>;

/// A stored to-do item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToDoItem {
	pub id: i64,
	pub content: String,
	pub completed: bool,
}

impl TryFrom<&Row> for ToDoItem {
	type Error = DatabaseError;

	fn try_from(row: &Row) -> std::result::Result<Self, Self::Error> {
		Ok(Self {
			id: row.get("id")?,
			content: row.get("content")?,
			completed: row.get("completed")?,
		})
	}
}

/// Values for a new row
///
/// Leaving `completed` unset lets the store apply its default (`false`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewToDoItem {
	pub content: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub completed: Option<bool>,
}

impl NewToDoItem {
	pub fn new(content: impl Into<String>) -> Self {
		Self {
			content: content.into(),
			completed: None,
		}
	}

	pub fn completed(mut self, completed: bool) -> Self {
		self.completed = Some(completed);
		self
	}

	/// Check the content length
	///
	/// # Examples
	///
	/// ```
	/// use todo_web::apps::todos::NewToDoItem;
	///
	/// assert!(NewToDoItem::new("é".repeat(125)).validate().is_ok());
	/// assert!(NewToDoItem::new("a".repeat(126)).validate().is_err());
	/// ```
	pub fn validate(&self) -> Result<()> {
		let length = self.content.chars().count();
		if length > CONTENT_MAX_LENGTH {
			return Err(ModelError::Validation {
				field: "content".to_string(),
				message: format!(
					"ensure this value has at most {CONTENT_MAX_LENGTH} characters (it has {length})"
				),
			});
		}
		Ok(())
	}
}

/// Reads and writes ToDoItem rows
#[derive(Debug, Clone)]
pub struct ToDoItemManager {
	connection: DatabaseConnection,
}

impl ToDoItemManager {
	pub fn new(connection: DatabaseConnection) -> Self {
		Self { connection }
	}

	/// Insert a row and return it with its generated id
	pub async fn create(&self, item: &NewToDoItem) -> Result<ToDoItem> {
		item.validate()?;

		let (sql, params) = self.insert_statement(item);
		let row = self.connection.fetch_one(&sql, params).await?;
		let created = ToDoItem::try_from(&row)?;
		debug!(id = created.id, "created todo item");
		Ok(created)
	}

	fn insert_statement(&self, item: &NewToDoItem) -> (String, Vec<QueryValue>) {
		// Columns and values are pushed in lockstep
		let mut columns = vec![Alias::new("content")];
		let mut values = vec![Expr::val(item.content.as_str())];
		if let Some(completed) = item.completed {
			columns.push(Alias::new("completed"));
			values.push(Expr::val(completed));
		}

		let insert = Query::insert()
			.into_table(Alias::new(TABLE_NAME))
			.columns(columns)
			.values_panic(values)
			.returning(returning_columns())
			.to_owned();
		build_statement(&insert, self.connection.database_type())
	}

	pub async fn get(&self, id: i64) -> Result<Option<ToDoItem>> {
		let (sql, params) = {
			let select = Query::select()
				.columns(COLUMNS.map(Alias::new))
				.from(Alias::new(TABLE_NAME))
				.and_where(Expr::col(Alias::new("id")).eq(id))
				.to_owned();
			build_statement(&select, self.connection.database_type())
		};

		let row = self.connection.fetch_optional(&sql, params).await?;
		Ok(row.as_ref().map(ToDoItem::try_from).transpose()?)
	}

	/// All rows, ordered by id
	pub async fn all(&self) -> Result<Vec<ToDoItem>> {
		let (sql, params) = {
			let select = Query::select()
				.columns(COLUMNS.map(Alias::new))
				.from(Alias::new(TABLE_NAME))
				.order_by(Alias::new("id"), Order::Asc)
				.to_owned();
			build_statement(&select, self.connection.database_type())
		};

		let rows = self.connection.fetch_all(&sql, params).await?;
		rows.iter()
			.map(|row| ToDoItem::try_from(row).map_err(ModelError::from))
			.collect()
	}

	pub async fn set_completed(&self, id: i64, completed: bool) -> Result<ToDoItem> {
		let (sql, params) = {
			let update = Query::update()
				.table(Alias::new(TABLE_NAME))
				.value(Alias::new("completed"), completed)
				.and_where(Expr::col(Alias::new("id")).eq(id))
				.returning(returning_columns())
				.to_owned();
			build_statement(&update, self.connection.database_type())
		};

		let row = self
			.connection
			.fetch_optional(&sql, params)
			.await?
			.ok_or(ModelError::NotFound(id))?;
		Ok(ToDoItem::try_from(&row)?)
	}
}
