//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`] which wraps the underlying
//! [`sqlx`] errors with additional context about which operation failed.

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored value could not be mapped back onto a league type.
    #[error("Decode error: {0}")]
    Decode(String),

    /// An insert collided with an existing record.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A debit would take a balance below zero.
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    /// A record that must exist was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
