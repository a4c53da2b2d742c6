//! The Courtside league engine.
//!
//! Everything that changes league state goes through a [`League`]: the
//! season simulator, the Swiss tournament state machine, agent
//! registration and reflection, and the scheduler that drives tournaments
//! on a timer.
//!
//! # Architecture
//!
//! ```text
//! courtside-server / courtside-engine
//!     |
//!     +-- League --+-- LeagueStore  (courtside-db)
//!                  +-- WorldJudge   (courtside-judge, model or fallback)
//!                  +-- courtside-sim  (pure game and duel simulation)
//!                  +-- courtside-ledger (every token movement)
//! ```
//!
//! Entry points are safe to invoke repeatedly and concurrently. Each state
//! change is claimed through a store compare-and-set before any tokens
//! move, so a duplicate call reports a no-op instead of paying twice.
//!
//! # Modules
//!
//! - [`config`] -- YAML configuration with environment overrides
//! - [`league`] -- The engine handle and shared helpers
//! - [`season`] -- Season creation, game batches and salary settlement
//! - [`swiss`] -- Pure Swiss pairing
//! - [`tournament`] -- Tournament creation and the advance state machine
//! - [`registry`] -- Agent registration, deactivation and reflection
//! - [`reactions`] -- Post-game reactions and the answers they draw
//! - [`scheduler`] -- Periodic tournament trigger
//! - [`error`] -- Engine error type

pub mod config;
pub mod error;
pub mod league;
pub mod reactions;
pub mod registry;
pub mod scheduler;
pub mod season;
pub mod swiss;
pub mod tournament;

pub use config::{ConfigError, CourtsideConfig};
pub use error::CoreError;
pub use league::League;
pub use reactions::{NewReaction, ReactionExchange};
pub use registry::NewAgent;
pub use scheduler::run_scheduler;
pub use season::SimulationSummary;
pub use swiss::{PairingEntry, Pairings, swiss_pairing};
pub use tournament::AdvanceOutcome;
