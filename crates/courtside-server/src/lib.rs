//! HTTP API for the Courtside league.
//!
//! An Axum server over a shared [`League`](courtside_core::League):
//!
//! - **Season endpoints** to simulate game batches and read standings
//! - **Tournament endpoints** to inspect and advance tournaments, plus the
//!   cron trigger an external scheduler calls
//! - **Agent endpoints** for registration, reflection and ledger history
//! - **Reaction endpoints** for post-game likes, disdain, provocations and
//!   comments
//!
//! Season and tournament mutations map onto idempotent engine entry points,
//! so clients and cron jobs may retry them freely.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerError, start_server};
pub use state::AppState;
