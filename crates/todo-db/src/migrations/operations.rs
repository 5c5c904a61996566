//! Migration operations
//!
//! A migration is an ordered list of [`Operation`]s. The schema-creating
//! operation is [`Operation::CreateTable`]; [`Operation::RunSql`] covers
//! hand-written statements.
//!
//! # Example
//!
//! ```rust
//! use todo_db::migrations::{ColumnDefinition, CreateTable, FieldType, Operation, SqlDialect};
//!
//! let create = CreateTable::new(
//!     "ToDoItem",
//!     vec![
//!         ColumnDefinition::new("id", FieldType::BigInteger).primary_key().auto_increment(),
//!         ColumnDefinition::new("content", FieldType::VarChar(125)).not_null(),
//!     ],
//! );
//! let sql = Operation::CreateTable(create).to_sql(&SqlDialect::Sqlite);
//! assert!(sql.starts_with("CREATE TABLE \"ToDoItem\""));
//! ```

use std::collections::HashSet;

use pg_escape::quote_identifier;
use serde::{Deserialize, Serialize};

use super::introspection::ColumnInfo;
use super::{FieldType, MigrationError, Result};
use crate::backends::DatabaseType;

/// SQL dialect for generating database-specific SQL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDialect {
	Sqlite,
	Postgres,
}

impl From<DatabaseType> for SqlDialect {
	fn from(db_type: DatabaseType) -> Self {
		match db_type {
			DatabaseType::Sqlite => SqlDialect::Sqlite,
			DatabaseType::Postgres => SqlDialect::Postgres,
		}
	}
}

/// Column default value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
	Bool(bool),
	Int(i64),
	Text(String),
}

impl DefaultValue {
	pub fn to_sql(&self, dialect: &SqlDialect) -> String {
		match (self, dialect) {
			(DefaultValue::Bool(b), SqlDialect::Sqlite) => i64::from(*b).to_string(),
			(DefaultValue::Bool(b), SqlDialect::Postgres) => b.to_string().to_uppercase(),
			(DefaultValue::Int(i), _) => i.to_string(),
			(DefaultValue::Text(s), _) => format!("'{}'", s.replace('\'', "''")),
		}
	}

	/// Check a default expression read back from the store against this value
	///
	/// Accepts the spellings SQLite and PostgreSQL report: `0`/`1`,
	/// `false`/`true`, and quoted literals with an optional `::type` cast.
	///
	/// # Examples
	///
	/// ```
	/// use todo_db::migrations::DefaultValue;
	///
	/// assert!(DefaultValue::Bool(false).matches_declared("0"));
	/// assert!(DefaultValue::Bool(false).matches_declared("FALSE"));
	/// assert!(!DefaultValue::Bool(false).matches_declared("1"));
	/// assert!(DefaultValue::Text("todo".into()).matches_declared("'todo'::character varying"));
	/// ```
	pub fn matches_declared(&self, declared: &str) -> bool {
		let literal = normalize_default(declared);
		match self {
			DefaultValue::Bool(b) => match literal.to_lowercase().as_str() {
				"1" | "true" | "t" | "'t'" => *b,
				"0" | "false" | "f" | "'f'" => !*b,
				_ => false,
			},
			DefaultValue::Int(i) => literal.parse::<i64>() == Ok(*i),
			DefaultValue::Text(s) => {
				literal.len() >= 2
					&& literal.starts_with('\'')
					&& literal.ends_with('\'')
					&& literal[1..literal.len() - 1].replace("''", "'") == *s
			}
		}
	}
}

/// Strip surrounding parentheses and a trailing `::type` cast
fn normalize_default(declared: &str) -> &str {
	let mut literal = declared.trim();
	while literal.starts_with('(') && literal.ends_with(')') && literal.len() >= 2 {
		literal = literal[1..literal.len() - 1].trim();
	}
	if let Some((value, cast)) = literal.rsplit_once("::")
		&& !cast.contains('\'')
	{
		literal = value.trim();
	}
	literal
}

impl From<bool> for DefaultValue {
	fn from(b: bool) -> Self {
		DefaultValue::Bool(b)
	}
}

impl From<i64> for DefaultValue {
	fn from(i: i64) -> Self {
		DefaultValue::Int(i)
	}
}

impl From<&str> for DefaultValue {
	fn from(s: &str) -> Self {
		DefaultValue::Text(s.to_string())
	}
}

/// Column definition inside a [`CreateTable`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
	pub name: String,
	pub type_definition: FieldType,
	#[serde(default)]
	pub not_null: bool,
	#[serde(default)]
	pub unique: bool,
	#[serde(default)]
	pub primary_key: bool,
	#[serde(default)]
	pub auto_increment: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub default: Option<DefaultValue>,
}

impl ColumnDefinition {
	/// Create a new nullable column definition
	pub fn new(name: impl Into<String>, type_def: FieldType) -> Self {
		Self {
			name: name.into(),
			type_definition: type_def,
			not_null: false,
			unique: false,
			primary_key: false,
			auto_increment: false,
			default: None,
		}
	}

	/// Mark as primary key; primary keys are always NOT NULL
	pub fn primary_key(mut self) -> Self {
		self.primary_key = true;
		self.not_null = true;
		self
	}

	/// Let the store generate values on insert
	pub fn auto_increment(mut self) -> Self {
		self.auto_increment = true;
		self
	}

	pub fn not_null(mut self) -> Self {
		self.not_null = true;
		self
	}

	pub fn unique(mut self) -> Self {
		self.unique = true;
		self
	}

	pub fn default(mut self, value: impl Into<DefaultValue>) -> Self {
		self.default = Some(value.into());
		self
	}

	pub fn max_length(&self) -> Option<u32> {
		self.type_definition.max_length()
	}

	pub fn is_nullable(&self) -> bool {
		!self.not_null
	}

	fn to_sql(&self, dialect: &SqlDialect) -> String {
		let mut parts = vec![quote_identifier(&self.name).into_owned()];

		if self.auto_increment {
			match dialect {
				SqlDialect::Postgres => {
					parts.push(format!(
						"{} GENERATED BY DEFAULT AS IDENTITY",
						self.type_definition.to_sql_for_dialect(dialect)
					));
				}
				// AUTOINCREMENT is only accepted on an INTEGER PRIMARY KEY
				SqlDialect::Sqlite => parts.push("INTEGER".to_string()),
			}
		} else {
			parts.push(self.type_definition.to_sql_for_dialect(dialect));
		}

		if self.not_null {
			parts.push("NOT NULL".to_string());
		}

		if self.primary_key {
			parts.push("PRIMARY KEY".to_string());
			if self.auto_increment && matches!(dialect, SqlDialect::Sqlite) {
				parts.push("AUTOINCREMENT".to_string());
			}
		}

		if self.unique {
			parts.push("UNIQUE".to_string());
		}

		if let Some(default) = &self.default {
			parts.push(format!("DEFAULT {}", default.to_sql(dialect)));
		}

		// SQLite ignores VARCHAR(n); enforce the limit with a CHECK on length(),
		// which counts characters for TEXT values
		if let (SqlDialect::Sqlite, Some(max_length)) = (dialect, self.max_length()) {
			parts.push(format!(
				"CHECK (length({}) <= {})",
				quote_identifier(&self.name),
				max_length
			));
		}

		parts.join(" ")
	}

	/// Describe how an introspected column differs from this definition
	fn differences(&self, actual: &ColumnInfo, dialect: &SqlDialect) -> Vec<String> {
		let mut diffs = Vec::new();
		if !self
			.type_definition
			.matches_declared(&actual.data_type, dialect, self.auto_increment)
		{
			diffs.push(format!(
				"column {} has type {}, expected {}",
				self.name, actual.data_type, self.type_definition
			));
		}
		if actual.nullable == self.not_null && !self.primary_key {
			diffs.push(format!(
				"column {} nullability differs (nullable={}, expected {})",
				self.name,
				actual.nullable,
				self.is_nullable()
			));
		}
		if actual.primary_key != self.primary_key {
			diffs.push(format!(
				"column {} primary key differs (primary_key={}, expected {})",
				self.name, actual.primary_key, self.primary_key
			));
		}
		if actual.unique != self.unique && !self.primary_key {
			diffs.push(format!(
				"column {} uniqueness differs (unique={}, expected {})",
				self.name, actual.unique, self.unique
			));
		}
		// Generated keys carry backend-specific defaults (sequences, identity)
		if !self.auto_increment {
			let matches = match (&self.default, actual.default.as_deref()) {
				(None, None) => true,
				(Some(expected), Some(declared)) => expected.matches_declared(declared),
				_ => false,
			};
			if !matches {
				diffs.push(format!(
					"column {} default differs (default={}, expected {})",
					self.name,
					actual.default.as_deref().unwrap_or("none"),
					self.default
						.as_ref()
						.map_or_else(|| "none".to_string(), |d| d.to_sql(dialect))
				));
			}
		}
		diffs
	}
}

/// Create a table with an ordered list of columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTable {
	pub name: String,
	pub columns: Vec<ColumnDefinition>,
}

impl CreateTable {
	pub fn new(name: impl Into<String>, columns: Vec<ColumnDefinition>) -> Self {
		Self {
			name: name.into(),
			columns,
		}
	}

	pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
		self.columns.iter().find(|c| c.name == name)
	}

	/// Reject definitions no store could create as written
	pub fn validate(&self) -> Result<()> {
		let invalid = |msg: String| Err(MigrationError::InvalidMigration(msg));

		if self.name.trim().is_empty() {
			return invalid("table name must not be empty".to_string());
		}
		if self.columns.is_empty() {
			return invalid(format!("table {} has no columns", self.name));
		}

		let mut seen = HashSet::new();
		for column in &self.columns {
			if !seen.insert(column.name.as_str()) {
				return invalid(format!(
					"duplicate column {} in table {}",
					column.name, self.name
				));
			}
			if column.auto_increment && !(column.primary_key && column.type_definition.is_integer())
			{
				return invalid(format!(
					"auto-increment column {}.{} must be an integer primary key",
					self.name, column.name
				));
			}
			if column.max_length() == Some(0) {
				return invalid(format!(
					"column {}.{} has a zero max_length",
					self.name, column.name
				));
			}
		}

		if self.columns.iter().filter(|c| c.primary_key).count() > 1 {
			return invalid(format!(
				"table {} declares more than one primary key column",
				self.name
			));
		}

		Ok(())
	}

	/// Generate the CREATE TABLE statement
	pub fn to_sql(&self, dialect: &SqlDialect) -> String {
		let columns = self
			.columns
			.iter()
			.map(|col| format!("  {}", col.to_sql(dialect)))
			.collect::<Vec<_>>()
			.join(",\n");
		format!(
			"CREATE TABLE {} (\n{}\n);",
			quote_identifier(&self.name),
			columns
		)
	}

	/// Compare an existing table's columns with this definition
	///
	/// Returns an empty list when the shapes match.
	pub fn shape_differences(&self, actual: &[ColumnInfo], dialect: &SqlDialect) -> Vec<String> {
		let mut diffs = Vec::new();

		let expected_names: Vec<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
		let actual_names: Vec<&str> = actual.iter().map(|c| c.name.as_str()).collect();
		if expected_names != actual_names {
			diffs.push(format!(
				"columns are [{}], expected [{}]",
				actual_names.join(", "),
				expected_names.join(", ")
			));
		}

		for column in &self.columns {
			if let Some(info) = actual.iter().find(|c| c.name == column.name) {
				diffs.extend(column.differences(info, dialect));
			}
		}

		diffs
	}
}

/// A single schema evolution step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
	CreateTable(CreateTable),
	/// Raw SQL executed verbatim
	RunSql { sql: String },
}

impl Operation {
	/// Generate forward SQL
	pub fn to_sql(&self, dialect: &SqlDialect) -> String {
		match self {
			Operation::CreateTable(create) => create.to_sql(dialect),
			Operation::RunSql { sql } => sql.clone(),
		}
	}

	pub fn validate(&self) -> Result<()> {
		match self {
			Operation::CreateTable(create) => create.validate(),
			Operation::RunSql { sql } if sql.trim().is_empty() => Err(
				MigrationError::InvalidMigration("RunSql operation has empty SQL".to_string()),
			),
			Operation::RunSql { .. } => Ok(()),
		}
	}

	/// Short human-readable description, e.g. `Create table ToDoItem`
	pub fn describe(&self) -> String {
		match self {
			Operation::CreateTable(create) => format!("Create table {}", create.name),
			Operation::RunSql { .. } => "Raw SQL operation".to_string(),
		}
	}
}
