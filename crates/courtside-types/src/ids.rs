//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every persisted entity in the league has a strongly-typed ID so that a
//! season id can never be passed where a tournament id is expected. All IDs
//! use UUID v7 (time-ordered) for efficient database indexing.
//!
//! Composite keys (season + agent for season stats, tournament + agent for
//! participants) are expressed as pairs of these IDs rather than their own
//! identifier types.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for an agent (human-linked or NPC).
    AgentId
}

define_id! {
    /// Unique identifier for a league season.
    SeasonId
}

define_id! {
    /// Unique identifier for a single simulated season game.
    GameId
}

define_id! {
    /// Unique identifier for a Swiss tournament.
    TournamentId
}

define_id! {
    /// Unique identifier for one paired encounter within a tournament round.
    MatchId
}

define_id! {
    /// Unique identifier for a token ledger entry.
    TransactionId
}

define_id! {
    /// Unique identifier for an activity log line.
    ActivityId
}

define_id! {
    /// Unique identifier for a generated dialogue line around a game.
    InteractionId
}

define_id! {
    /// Unique identifier for a stored reflection and its analysis.
    ReflectionId
}

define_id! {
    /// Unique identifier for one agent's reaction to another after a game.
    ReactionId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let agent = AgentId::new();
        let season = SeasonId::new();
        assert_ne!(agent.into_inner(), Uuid::nil());
        assert_ne!(season.into_inner(), Uuid::nil());
    }

    #[test]
    fn ids_are_time_ordered() {
        let first = GameId::new();
        let second = GameId::new();
        assert!(first <= second);
    }

    #[test]
    fn id_display_matches_uuid() {
        let uuid = Uuid::now_v7();
        let id = TournamentId::from(uuid);
        assert_eq!(id.to_string(), uuid.to_string());
        assert_eq!(Uuid::from(id), uuid);
    }

    #[test]
    fn id_serializes_as_bare_uuid() {
        let uuid = Uuid::now_v7();
        let id = MatchId(uuid);
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, format!("\"{uuid}\""));
    }
}
