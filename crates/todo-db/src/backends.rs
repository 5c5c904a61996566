//! # Database Backends
//!
//! Thin, database-agnostic layer over `sqlx` pools.
//!
//! | Database | Backend Type |
//! |----------|--------------|
//! | PostgreSQL | [`PostgresBackend`] |
//! | SQLite | [`SqliteBackend`] |
//!
//! Statements built with `sea-query` are rendered per backend by
//! [`build_statement`] and [`build_schema_statement`].
//!
//! Every driver error is converted into [`DatabaseError`], which separates
//! connection failures, missing privileges and already-existing objects
//! from ordinary query errors.

pub mod backend;
pub mod connection;
pub mod error;
pub mod postgres;
pub mod sqlite;
pub mod statement;
pub mod types;

pub use backend::{DatabaseBackend, TransactionExecutor};
pub use connection::DatabaseConnection;
pub use error::{DatabaseError, Result};
pub use postgres::PostgresBackend;
pub use sqlite::SqliteBackend;
pub use statement::{build_schema_statement, build_statement};
pub use types::{DatabaseType, QueryResult, QueryValue, Row};
