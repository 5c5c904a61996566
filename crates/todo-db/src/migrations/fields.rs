//! Field type definitions for migrations

use serde::{Deserialize, Serialize};

use super::operations::SqlDialect;

/// Represents database field types
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
	// Integer types
	BigInteger,
	Integer,

	// String types
	/// Character-limited string; the limit counts Unicode scalar values
	VarChar(u32),
	Text,

	// Boolean type
	Boolean,
}

impl FieldType {
	/// Convert FieldType to SQL string for a specific dialect
	///
	/// # Examples
	///
	/// ```
	/// use todo_db::migrations::{FieldType, SqlDialect};
	///
	/// assert_eq!(FieldType::VarChar(125).to_sql_for_dialect(&SqlDialect::Sqlite), "VARCHAR(125)");
	/// assert_eq!(FieldType::Boolean.to_sql_for_dialect(&SqlDialect::Postgres), "BOOLEAN");
	/// ```
	pub fn to_sql_for_dialect(&self, _dialect: &SqlDialect) -> String {
		match self {
			FieldType::BigInteger => "BIGINT".to_string(),
			FieldType::Integer => "INTEGER".to_string(),
			FieldType::VarChar(max_length) => format!("VARCHAR({})", max_length),
			FieldType::Text => "TEXT".to_string(),
			// SQLite stores booleans as 0/1 but keeps the declared name, which
			// lets row conversion recognise the column
			FieldType::Boolean => "BOOLEAN".to_string(),
		}
	}

	/// Get max_length if this type has one
	pub fn max_length(&self) -> Option<u32> {
		match self {
			FieldType::VarChar(max_length) => Some(*max_length),
			_ => None,
		}
	}

	pub fn is_integer(&self) -> bool {
		matches!(self, FieldType::BigInteger | FieldType::Integer)
	}

	/// Check a declared type string reported by the database against this type
	///
	/// SQLite reports the declared type verbatim, except that auto-increment
	/// keys are always declared `INTEGER`.
	pub fn matches_declared(&self, declared: &str, dialect: &SqlDialect, auto_increment: bool) -> bool {
		let declared = declared.trim().to_uppercase().replace(' ', "");
		let expected = match (self, dialect) {
			(FieldType::BigInteger, SqlDialect::Sqlite) if auto_increment => "INTEGER".to_string(),
			_ => self.to_sql_for_dialect(dialect).replace(' ', ""),
		};
		declared == expected
	}
}

impl std::fmt::Display for FieldType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			FieldType::BigInteger => write!(f, "BigInteger"),
			FieldType::Integer => write!(f, "Integer"),
			FieldType::VarChar(max_length) => write!(f, "VarChar({})", max_length),
			FieldType::Text => write!(f, "Text"),
			FieldType::Boolean => write!(f, "Boolean"),
		}
	}
}
