//! Error types for the persistence layer.
//!
//! All errors are propagated via [`DbError`] which wraps the
//! underlying [`sqlx`] errors with context about which operation
//! failed. Unique-constraint violations are not errors at this layer's
//! surface: the stores inspect them to resolve races (duplicate likes,
//! replayed idempotency keys, repeated badge awards) into their
//! defined outcomes before anything propagates.

/// Errors that can occur in the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A row that the caller asserted exists was not found.
    #[error("row not found: {0}")]
    RowNotFound(String),

    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Whether an error is a unique-constraint violation.
///
/// Used by the stores to turn a lost insert race into its defined
/// outcome instead of surfacing a storage exception.
pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}
