//! Shared type definitions for the Courtside league simulation.
//!
//! This crate is the single source of truth for all types used across the
//! Courtside workspace. Types defined here flow downstream to `TypeScript`
//! via `ts-rs` for the league dashboard.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all entity identifiers
//! - [`enums`] -- Positions, skills, lifecycle statuses and ledger tags
//! - [`structs`] -- Agents, seasons, games, tournaments, ledger entries

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{
    ActivityKind, GameEventType, InteractionPhase, MatchOutcome, MatchStatus, Position,
    ReactionKind, ReactionSource, SeasonStatus, Skill, TournamentFormat, TournamentStatus,
    TransactionType,
};
pub use ids::{
    ActivityId, AgentId, GameId, InteractionId, MatchId, ReactionId, ReflectionId, SeasonId,
    TournamentId, TransactionId,
};
pub use structs::{
    ActivityLog, Agent, Attributes, BoxScore, COGNITIVE_MAX, Game, GameInteraction, GameStats,
    Reaction, Reflection, SKILL_MAX, SKILL_MIN, Season, SeasonStats, TokenTransaction, Tournament,
    TournamentMatch, TournamentParticipant, clamp_skill,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // ts-rs writes the bindings for every #[ts(export)] type into
        // `bindings/` relative to the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::AgentId::export_all();
        let _ = crate::ids::SeasonId::export_all();
        let _ = crate::ids::GameId::export_all();
        let _ = crate::ids::TournamentId::export_all();
        let _ = crate::ids::MatchId::export_all();
        let _ = crate::ids::TransactionId::export_all();
        let _ = crate::ids::ActivityId::export_all();
        let _ = crate::ids::InteractionId::export_all();
        let _ = crate::ids::ReflectionId::export_all();
        let _ = crate::ids::ReactionId::export_all();

        // Enums
        let _ = crate::enums::Position::export_all();
        let _ = crate::enums::Skill::export_all();
        let _ = crate::enums::SeasonStatus::export_all();
        let _ = crate::enums::TournamentStatus::export_all();
        let _ = crate::enums::TournamentFormat::export_all();
        let _ = crate::enums::MatchStatus::export_all();
        let _ = crate::enums::MatchOutcome::export_all();
        let _ = crate::enums::TransactionType::export_all();
        let _ = crate::enums::ActivityKind::export_all();
        let _ = crate::enums::GameEventType::export_all();
        let _ = crate::enums::InteractionPhase::export_all();
        let _ = crate::enums::ReactionKind::export_all();
        let _ = crate::enums::ReactionSource::export_all();

        // Structs
        let _ = crate::structs::Attributes::export_all();
        let _ = crate::structs::Agent::export_all();
        let _ = crate::structs::Season::export_all();
        let _ = crate::structs::BoxScore::export_all();
        let _ = crate::structs::Game::export_all();
        let _ = crate::structs::GameStats::export_all();
        let _ = crate::structs::SeasonStats::export_all();
        let _ = crate::structs::Tournament::export_all();
        let _ = crate::structs::TournamentParticipant::export_all();
        let _ = crate::structs::TournamentMatch::export_all();
        let _ = crate::structs::TokenTransaction::export_all();
        let _ = crate::structs::ActivityLog::export_all();
        let _ = crate::structs::GameInteraction::export_all();
        let _ = crate::structs::Reflection::export_all();
        let _ = crate::structs::Reaction::export_all();
    }
}
