//! World-model judge for the Courtside league.
//!
//! The judge wraps an optional generative model behind a strict contract.
//! Callers hand it structured context (two agents and a simulated game, a
//! season's stats, a reflection) and always receive a complete result whose
//! numeric fields sit inside fixed ranges. When no model is configured, or
//! the model is slow, unreachable or answers with garbage, the judge returns
//! the deterministic local computation instead.
//!
//! # Architecture
//!
//! ```text
//! caller ──► WorldJudge ──► fallback (always computed first)
//!                 │
//!                 ├─► PromptEngine (minijinja) ──► LlmBackend (reqwest)
//!                 │                                   │  tokio timeout
//!                 └─◄ verdict::from_model ◄── parse::extract_json
//! ```
//!
//! # Modules
//!
//! - [`config`] -- Environment-driven backend and timeout configuration
//! - [`context`] -- Agent profiles and game context fed to prompts
//! - [`dialogue`] -- Pre/in/post-game talk for season games
//! - [`error`] -- Error types (always recovered internally)
//! - [`fallback`] -- Deterministic local results
//! - [`judge`] -- The [`WorldJudge`] pipeline
//! - [`llm`] -- Model backends
//! - [`parse`] -- JSON recovery from raw model text
//! - [`prompt`] -- Template loading and rendering
//! - [`verdict`] -- Canonical result types and their bounds

pub mod config;
pub mod context;
pub mod dialogue;
pub mod error;
pub mod fallback;
pub mod judge;
pub mod llm;
pub mod parse;
pub mod prompt;
pub mod verdict;

pub use config::{BackendType, JudgeConfig, LlmBackendConfig};
pub use context::{FREE_AGENT, GameContext, JudgeProfile, RecentGame};
pub use dialogue::DialogueGenerator;
pub use error::JudgeError;
pub use fallback::NPC_GAME_COST;
pub use judge::WorldJudge;
pub use llm::{HttpBackend, LlmBackend, ScriptedBackend};
pub use verdict::{
    GameVerdict, MvpSide, ReflectionAnalysis, SeasonSettlement, SkillBoost, StatBonus,
    TokenAdjust,
};
