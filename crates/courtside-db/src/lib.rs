//! Persistence for the Courtside league.
//!
//! Two interchangeable backends sit behind the [`LeagueStore`] facade: an
//! in-process store for tests and database-less runs, and a `PostgreSQL`
//! store for durable deployments. The league engine only ever talks to the
//! facade.
//!
//! # Architecture
//!
//! ```text
//! courtside-core
//!     |
//!     +-- LeagueStore ---+-- Memory   (MemoryStore, one mutex over all tables)
//!                        |
//!                        +-- Postgres (PgStore, conditional UPDATEs + transactions)
//! ```
//!
//! Every lifecycle transition (season completion, tournament status, round
//! opening, match completion, placement) is a compare-and-set that reports
//! whether the caller won, so overlapping scheduler ticks cannot double-pay.
//!
//! # Modules
//!
//! - [`store`] -- The backend-agnostic facade and its operation inputs
//! - [`memory`] -- In-process tables
//! - [`pg_store`] -- `PostgreSQL` queries
//! - [`postgres`] -- Pool configuration and migrations
//! - [`error`] -- Shared error types

pub mod error;
pub mod memory;
pub mod pg_store;
pub mod postgres;
mod rows;
pub mod store;

pub use error::DbError;
pub use memory::MemoryStore;
pub use pg_store::PgStore;
pub use postgres::{PostgresConfig, connect, connect_store};
pub use store::{LeagueStore, MatchResult, Overdraft, RoundStart};
