//! Rendering sea-query statements for a backend
//!
//! Query statements are built with bound values; the values are converted
//! to [`QueryValue`]s in placeholder order so they can be passed straight to
//! [`DatabaseConnection`](super::DatabaseConnection) methods.

use sea_query::{
	PostgresQueryBuilder, QueryStatementWriter, SchemaStatementBuilder, SqliteQueryBuilder, Value,
	Values,
};

use super::types::{DatabaseType, QueryValue};

/// Build a query statement into SQL and its parameters
///
/// # Examples
///
/// ```
/// use sea_query::{Alias, Expr, ExprTrait, Query};
/// use todo_db::backends::{DatabaseType, QueryValue, build_statement};
///
/// let select = Query::select()
///     .column(Alias::new("id"))
///     .from(Alias::new("ToDoItem"))
///     .and_where(Expr::col(Alias::new("id")).eq(1i64))
///     .to_owned();
///
/// let (sql, params) = build_statement(&select, DatabaseType::Postgres);
/// assert_eq!(sql, r#"SELECT "id" FROM "ToDoItem" WHERE "id" = $1"#);
/// assert_eq!(params, vec![QueryValue::Int(1)]);
/// ```
pub fn build_statement<S>(statement: &S, database_type: DatabaseType) -> (String, Vec<QueryValue>)
where
	S: QueryStatementWriter,
{
	let (sql, values) = match database_type {
		DatabaseType::Postgres => statement.build(PostgresQueryBuilder),
		DatabaseType::Sqlite => statement.build(SqliteQueryBuilder),
	};
	(sql, convert_values(values))
}

/// Render a schema statement (CREATE TABLE, CREATE INDEX, ...)
pub fn build_schema_statement<S>(statement: &S, database_type: DatabaseType) -> String
where
	S: SchemaStatementBuilder,
{
	match database_type {
		DatabaseType::Postgres => statement.to_string(PostgresQueryBuilder),
		DatabaseType::Sqlite => statement.to_string(SqliteQueryBuilder),
	}
}

/// Convert sea-query [`Values`] to `Vec<QueryValue>`
pub fn convert_values(values: Values) -> Vec<QueryValue> {
	values.0.into_iter().map(QueryValue::from).collect()
}

impl From<Value> for QueryValue {
	fn from(value: Value) -> Self {
		fn int<T: Into<i64>>(v: Option<T>) -> QueryValue {
			v.map_or(QueryValue::Null, |v| QueryValue::Int(v.into()))
		}

		match value {
			Value::Bool(v) => v.map_or(QueryValue::Null, QueryValue::Bool),
			Value::TinyInt(v) => int(v),
			Value::SmallInt(v) => int(v),
			Value::Int(v) => int(v),
			Value::BigInt(v) => int(v),
			Value::TinyUnsigned(v) => int(v),
			Value::SmallUnsigned(v) => int(v),
			Value::Unsigned(v) => int(v),
			Value::BigUnsigned(v) => match v {
				None => QueryValue::Null,
				Some(v) => i64::try_from(v)
					.map(QueryValue::Int)
					.unwrap_or_else(|_| QueryValue::String(v.to_string())),
			},
			Value::Float(v) => v.map_or(QueryValue::Null, |v| QueryValue::Float(v.into())),
			Value::Double(v) => v.map_or(QueryValue::Null, QueryValue::Float),
			Value::String(v) => v.map_or(QueryValue::Null, QueryValue::String),
			Value::Char(v) => v.map_or(QueryValue::Null, |c| QueryValue::String(c.to_string())),
			other => QueryValue::String(format!("{other:?}")),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use sea_query::{Alias, ColumnDef, Query, Table};

	#[rstest]
	#[case(Value::Bool(Some(true)), QueryValue::Bool(true))]
	#[case(Value::Int(Some(7)), QueryValue::Int(7))]
	#[case(Value::BigInt(Some(-3)), QueryValue::Int(-3))]
	#[case(Value::BigUnsigned(Some(u64::MAX)), QueryValue::String(u64::MAX.to_string()))]
	#[case(Value::Double(Some(1.5)), QueryValue::Float(1.5))]
	#[case(Value::String(Some("Buy milk".to_string())), QueryValue::String("Buy milk".to_string()))]
	#[case(Value::String(None), QueryValue::Null)]
	fn test_value_conversion(#[case] value: Value, #[case] expected: QueryValue) {
		assert_eq!(QueryValue::from(value), expected);
	}

	#[rstest]
	#[case(DatabaseType::Sqlite, r#"INSERT INTO "t" ("a", "b") VALUES (?, ?)"#)]
	#[case(DatabaseType::Postgres, r#"INSERT INTO "t" ("a", "b") VALUES ($1, $2)"#)]
	fn test_insert_placeholders(#[case] database_type: DatabaseType, #[case] expected: &str) {
		let insert = Query::insert()
			.into_table(Alias::new("t"))
			.columns([Alias::new("a"), Alias::new("b")])
			.values_panic(["x".into(), 2i64.into()])
			.to_owned();

		let (sql, params) = build_statement(&insert, database_type);
		assert_eq!(sql, expected);
		assert_eq!(params, vec![QueryValue::from("x"), QueryValue::Int(2)]);
	}

	#[rstest]
	fn test_schema_statement_if_not_exists() {
		let create = Table::create()
			.table(Alias::new("t"))
			.if_not_exists()
			.col(ColumnDef::new(Alias::new("a")).text().not_null())
			.to_owned();

		let sql = build_schema_statement(&create, DatabaseType::Sqlite);
		assert!(sql.starts_with(r#"CREATE TABLE IF NOT EXISTS "t""#), "{sql}");
	}
}
