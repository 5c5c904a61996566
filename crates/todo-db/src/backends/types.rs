//! Common type definitions for database abstraction

use super::error::DatabaseError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Database type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabaseType {
	Postgres,
	Sqlite,
}

impl DatabaseType {
	/// Detect the database type from a connection URL scheme
	///
	/// # Examples
	///
	/// ```
	/// use todo_db::backends::DatabaseType;
	///
	/// assert_eq!(DatabaseType::from_url("sqlite::memory:"), Some(DatabaseType::Sqlite));
	/// assert_eq!(
	///     DatabaseType::from_url("postgres://localhost/todo"),
	///     Some(DatabaseType::Postgres)
	/// );
	/// assert_eq!(DatabaseType::from_url("mysql://localhost/todo"), None);
	/// ```
	pub fn from_url(url: &str) -> Option<Self> {
		if url.starts_with("sqlite:") {
			Some(DatabaseType::Sqlite)
		} else if url.starts_with("postgres://") || url.starts_with("postgresql://") {
			Some(DatabaseType::Postgres)
		} else {
			None
		}
	}
}

impl std::fmt::Display for DatabaseType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			DatabaseType::Postgres => write!(f, "postgres"),
			DatabaseType::Sqlite => write!(f, "sqlite"),
		}
	}
}

/// Query value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryValue {
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	String(String),
}

impl From<&str> for QueryValue {
	fn from(s: &str) -> Self {
		QueryValue::String(s.to_string())
	}
}

impl From<String> for QueryValue {
	fn from(s: String) -> Self {
		QueryValue::String(s)
	}
}

impl From<i64> for QueryValue {
	fn from(i: i64) -> Self {
		QueryValue::Int(i)
	}
}

impl From<i32> for QueryValue {
	fn from(i: i32) -> Self {
		QueryValue::Int(i as i64)
	}
}

impl From<f64> for QueryValue {
	fn from(f: f64) -> Self {
		QueryValue::Float(f)
	}
}

impl From<bool> for QueryValue {
	fn from(b: bool) -> Self {
		QueryValue::Bool(b)
	}
}

/// Query result
#[derive(Debug, Clone)]
pub struct QueryResult {
	pub rows_affected: u64,
}

/// Row from query result
#[derive(Debug, Clone, Default)]
pub struct Row {
	pub(crate) data: HashMap<String, QueryValue>,
}

impl Row {
	pub fn new() -> Self {
		Self {
			data: HashMap::new(),
		}
	}

	pub fn insert(&mut self, key: String, value: QueryValue) {
		self.data.insert(key, value);
	}

	pub fn get<T: TryFrom<QueryValue>>(&self, key: &str) -> std::result::Result<T, DatabaseError>
	where
		DatabaseError: From<<T as TryFrom<QueryValue>>::Error>,
	{
		self.data
			.get(key)
			.cloned()
			.ok_or_else(|| DatabaseError::ColumnNotFound(key.to_string()))
			.and_then(|v| v.try_into().map_err(Into::into))
	}

	/// Read a nullable column, mapping SQL NULL to `None`
	pub fn get_opt<T: TryFrom<QueryValue>>(
		&self,
		key: &str,
	) -> std::result::Result<Option<T>, DatabaseError>
	where
		DatabaseError: From<<T as TryFrom<QueryValue>>::Error>,
	{
		match self.data.get(key) {
			None => Err(DatabaseError::ColumnNotFound(key.to_string())),
			Some(QueryValue::Null) => Ok(None),
			Some(value) => value.clone().try_into().map(Some).map_err(Into::into),
		}
	}
}

// Type conversions for QueryValue
impl TryFrom<QueryValue> for i64 {
	type Error = DatabaseError;

	fn try_from(value: QueryValue) -> std::result::Result<Self, Self::Error> {
		match value {
			QueryValue::Int(i) => Ok(i),
			QueryValue::Bool(b) => Ok(b as i64),
			_ => Err(DatabaseError::TypeError(format!(
				"Cannot convert {:?} to i64",
				value
			))),
		}
	}
}

impl TryFrom<QueryValue> for String {
	type Error = DatabaseError;

	fn try_from(value: QueryValue) -> std::result::Result<Self, Self::Error> {
		match value {
			QueryValue::String(s) => Ok(s),
			_ => Err(DatabaseError::TypeError(format!(
				"Cannot convert {:?} to String",
				value
			))),
		}
	}
}

impl TryFrom<QueryValue> for bool {
	type Error = DatabaseError;

	fn try_from(value: QueryValue) -> std::result::Result<Self, Self::Error> {
		match value {
			QueryValue::Bool(b) => Ok(b),
			// SQLite has no boolean storage class; RETURNING and PRAGMA rows carry 0/1
			QueryValue::Int(0) => Ok(false),
			QueryValue::Int(1) => Ok(true),
			_ => Err(DatabaseError::TypeError(format!(
				"Cannot convert {:?} to bool",
				value
			))),
		}
	}
}

impl TryFrom<QueryValue> for f64 {
	type Error = DatabaseError;

	fn try_from(value: QueryValue) -> std::result::Result<Self, Self::Error> {
		match value {
			QueryValue::Float(f) => Ok(f),
			QueryValue::Int(i) => Ok(i as f64),
			_ => Err(DatabaseError::TypeError(format!(
				"Cannot convert {:?} to f64",
				value
			))),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_row_get_typed_values() {
		let mut row = Row::new();
		row.insert("id".to_string(), QueryValue::Int(7));
		row.insert("content".to_string(), QueryValue::from("Buy milk"));
		row.insert("completed".to_string(), QueryValue::Int(0));

		assert_eq!(row.get::<i64>("id").unwrap(), 7);
		assert_eq!(row.get::<String>("content").unwrap(), "Buy milk");
		assert!(!row.get::<bool>("completed").unwrap());
	}

	#[rstest]
	fn test_row_get_missing_column() {
		let row = Row::new();
		let err = row.get::<i64>("id").unwrap_err();
		assert!(matches!(err, DatabaseError::ColumnNotFound(name) if name == "id"));
	}

	#[rstest]
	fn test_row_get_opt_null() {
		let mut row = Row::new();
		row.insert("dflt_value".to_string(), QueryValue::Null);
		assert_eq!(row.get_opt::<String>("dflt_value").unwrap(), None);
	}

	#[rstest]
	#[case(QueryValue::Int(2))]
	#[case(QueryValue::String("true".to_string()))]
	fn test_bool_conversion_rejects_non_boolean(#[case] value: QueryValue) {
		assert!(bool::try_from(value).is_err());
	}
}
