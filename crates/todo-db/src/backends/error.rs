//! Database error types
//!
//! Driver errors are classified once, here, so callers can match on
//! connection, privilege and existence failures without inspecting
//! backend-specific codes.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DatabaseError>;

#[derive(Debug, Error)]
pub enum DatabaseError {
	/// The store could not be reached or the connection was lost
	#[error("Connection error: {0}")]
	ConnectionError(String),

	/// The credential lacks the privilege required by the statement
	#[error("Permission denied: {0}")]
	PermissionDenied(String),

	/// A table (or other schema object) with the same name already exists
	#[error("Object already exists: {0}")]
	AlreadyExists(String),

	/// CHECK, NOT NULL, UNIQUE or FOREIGN KEY violation
	#[error("Constraint violation: {0}")]
	ConstraintViolation(String),

	#[error("Column not found: {0}")]
	ColumnNotFound(String),

	#[error("Type error: {0}")]
	TypeError(String),

	#[error("Unsupported database: {0}")]
	UnsupportedDatabase(String),

	#[error("Transaction error: {0}")]
	TransactionError(String),

	#[error("Query error: {0}")]
	QueryError(#[source] sqlx::Error),
}

impl From<sqlx::Error> for DatabaseError {
	fn from(err: sqlx::Error) -> Self {
		if let sqlx::Error::Database(db_err) = &err
			&& let Some(classified) = classify_database_error(db_err.as_ref())
		{
			return classified;
		}

		match err {
			e @ (sqlx::Error::Io(_)
			| sqlx::Error::Tls(_)
			| sqlx::Error::Configuration(_)
			| sqlx::Error::PoolTimedOut
			| sqlx::Error::PoolClosed
			| sqlx::Error::WorkerCrashed) => DatabaseError::ConnectionError(e.to_string()),
			other => DatabaseError::QueryError(other),
		}
	}
}

// PostgreSQL SQLSTATE codes
const PG_DUPLICATE_TABLE: &str = "42P07";
const PG_INSUFFICIENT_PRIVILEGE: &str = "42501";
const PG_STRING_DATA_RIGHT_TRUNCATION: &str = "22001";
const PG_INVALID_AUTHORIZATION_CLASS: &str = "28";
const PG_CONNECTION_EXCEPTION_CLASS: &str = "08";

// SQLite primary result codes
const SQLITE_PERM: i32 = 3;
const SQLITE_READONLY: i32 = 8;
const SQLITE_CANTOPEN: i32 = 14;
const SQLITE_AUTH: i32 = 23;

fn classify_database_error(db_err: &dyn sqlx::error::DatabaseError) -> Option<DatabaseError> {
	let code = db_err.code();
	classify(code.as_deref(), db_err.kind(), db_err.message())
}

fn classify(
	code: Option<&str>,
	kind: sqlx::error::ErrorKind,
	message: &str,
) -> Option<DatabaseError> {
	let message = message.to_string();

	match code {
		// SQLSTATE codes are always five characters
		Some(code) if code.len() == 5 => {
			if code == PG_DUPLICATE_TABLE {
				return Some(DatabaseError::AlreadyExists(message));
			}
			// VARCHAR(n) overflow; SQLite reports the same limit as a CHECK violation
			if code == PG_STRING_DATA_RIGHT_TRUNCATION {
				return Some(DatabaseError::ConstraintViolation(message));
			}
			if code == PG_INSUFFICIENT_PRIVILEGE || code.starts_with(PG_INVALID_AUTHORIZATION_CLASS)
			{
				return Some(DatabaseError::PermissionDenied(message));
			}
			if code.starts_with(PG_CONNECTION_EXCEPTION_CLASS) {
				return Some(DatabaseError::ConnectionError(message));
			}
		}
		// SQLite reports extended result codes; the low byte is the primary code
		Some(code) => {
			if let Ok(extended) = code.parse::<i32>() {
				match extended & 0xff {
					SQLITE_PERM | SQLITE_READONLY | SQLITE_AUTH => {
						return Some(DatabaseError::PermissionDenied(message));
					}
					SQLITE_CANTOPEN => return Some(DatabaseError::ConnectionError(message)),
					_ => {}
				}
			}
		}
		None => {}
	}

	match kind {
		sqlx::error::ErrorKind::CheckViolation
		| sqlx::error::ErrorKind::NotNullViolation
		| sqlx::error::ErrorKind::UniqueViolation
		| sqlx::error::ErrorKind::ForeignKeyViolation => {
			return Some(DatabaseError::ConstraintViolation(message));
		}
		_ => {}
	}

	// SQLite reports "table ... already exists" as a generic SQLITE_ERROR
	if message.to_lowercase().contains("already exists") {
		return Some(DatabaseError::AlreadyExists(message));
	}

	None
}
