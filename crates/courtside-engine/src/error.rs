//! Error types for the league engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup and shutdown so
//! `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: courtside_core::ConfigError,
    },

    /// The judge could not be configured.
    #[error("judge error: {source}")]
    Judge {
        /// The underlying judge error.
        #[from]
        source: courtside_judge::JudgeError,
    },

    /// Connecting to or migrating the database failed.
    #[error("database error: {source}")]
    Database {
        /// The underlying store error.
        #[from]
        source: courtside_db::DbError,
    },

    /// The HTTP server failed to bind or serve.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: courtside_server::ServerError,
    },
}
