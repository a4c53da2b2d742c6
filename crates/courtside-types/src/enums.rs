//! Enumeration types for the Courtside league.
//!
//! Every enum that is persisted carries an [`as_str`](Position::as_str) /
//! `parse` pair so storage backends can map it to and from a text column
//! without going through serde.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Implements the text round-trip used by storage backends.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Canonical lowercase tag used in storage and on the wire.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }

            /// Parse a canonical tag produced by [`Self::as_str`].
            pub fn parse(text: &str) -> Option<Self> {
                match text {
                    $($text => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// On-court position. Each position carries its own skill weight vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Position {
    /// Point guard.
    #[serde(rename = "PG")]
    PointGuard,
    /// Shooting guard.
    #[serde(rename = "SG")]
    ShootingGuard,
    /// Small forward.
    #[serde(rename = "SF")]
    SmallForward,
    /// Power forward.
    #[serde(rename = "PF")]
    PowerForward,
    /// Center.
    #[serde(rename = "C")]
    Center,
}

text_enum!(Position {
    PointGuard => "PG",
    ShootingGuard => "SG",
    SmallForward => "SF",
    PowerForward => "PF",
    Center => "C",
});

/// One of the seven rated basketball skills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum Skill {
    /// Scoring efficiency.
    Shooting,
    /// On-ball and help defense.
    Defense,
    /// Foot speed and transition play.
    Speed,
    /// Endurance over long minutes.
    Stamina,
    /// Decision making and reads.
    BasketballIq,
    /// Ball movement and vision.
    Passing,
    /// Boxing out and board control.
    Rebounding,
}

text_enum!(Skill {
    Shooting => "shooting",
    Defense => "defense",
    Speed => "speed",
    Stamina => "stamina",
    BasketballIq => "basketball_iq",
    Passing => "passing",
    Rebounding => "rebounding",
});

impl Skill {
    /// Lenient lookup for skill names arriving from model output or user
    /// input, which may use camelCase (`basketballIQ`) or spaces.
    pub fn from_loose(text: &str) -> Option<Self> {
        let normalized: String = text
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "shooting" => Some(Self::Shooting),
            "defense" => Some(Self::Defense),
            "speed" => Some(Self::Speed),
            "stamina" => Some(Self::Stamina),
            "basketballiq" | "iq" => Some(Self::BasketballIq),
            "passing" => Some(Self::Passing),
            "rebounding" | "rebound" => Some(Self::Rebounding),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Lifecycles
// ---------------------------------------------------------------------------

/// Season lifecycle. Moves from `Active` to `Completed` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum SeasonStatus {
    /// Games are still being simulated.
    Active,
    /// The total-games target was reached and salaries were settled.
    Completed,
}

text_enum!(SeasonStatus {
    Active => "active",
    Completed => "completed",
});

/// Tournament lifecycle.
///
/// ```text
/// registering -> in_progress -> settling -> completed
///      |
///      +-> cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// Accepting enrollments until the registration deadline.
    Registering,
    /// Rounds are being paired and played.
    InProgress,
    /// All rounds are complete; prizes are being distributed.
    Settling,
    /// Terminal: prizes paid.
    Completed,
    /// Terminal: not enough participants at the deadline.
    Cancelled,
}

text_enum!(TournamentStatus {
    Registering => "registering",
    InProgress => "in_progress",
    Settling => "settling",
    Completed => "completed",
    Cancelled => "cancelled",
});

impl TournamentStatus {
    /// Whether the lifecycle permits moving from `self` to `next`.
    ///
    /// Transitions are strictly forward; `Cancelled` is only reachable from
    /// `Registering`.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Registering, Self::InProgress | Self::Cancelled)
                | (Self::InProgress, Self::Settling)
                | (Self::Settling, Self::Completed)
        )
    }

    /// Whether the tournament has reached a terminal state.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Tournament pairing format. Only Swiss is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum TournamentFormat {
    /// Swiss system: everyone plays every round, paired by score.
    Swiss,
}

text_enum!(TournamentFormat {
    Swiss => "swiss",
});

/// Status of a single tournament match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Paired but not yet played.
    Pending,
    /// Played; the record is immutable from here on.
    Completed,
}

text_enum!(MatchStatus {
    Pending => "pending",
    Completed => "completed",
});

/// Result of a match from one participant's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    /// Won the match (or received a bye).
    Win,
    /// Neither side won.
    Draw,
    /// Lost the match.
    Loss,
}

impl MatchOutcome {
    /// Swiss score for the outcome: win 3, draw 1, loss 0.
    pub const fn points(self) -> u32 {
        match self {
            Self::Win => 3,
            Self::Draw => 1,
            Self::Loss => 0,
        }
    }

    /// The same match seen from the other side.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Win => Self::Loss,
            Self::Draw => Self::Draw,
            Self::Loss => Self::Win,
        }
    }
}

// ---------------------------------------------------------------------------
// Economy
// ---------------------------------------------------------------------------

/// Type tag of a token ledger entry.
///
/// Credit types carry positive amounts and debit types negative amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Salary and other earned income.
    Earn,
    /// Costs of playing.
    Spend,
    /// Prizes, refunds and per-game rewards.
    Reward,
    /// Incoming side of an agent-to-agent transfer.
    TransferIn,
    /// Outgoing side of an agent-to-agent transfer.
    TransferOut,
    /// Tokens committed to an entry fee.
    Stake,
}

text_enum!(TransactionType {
    Earn => "earn",
    Spend => "spend",
    Reward => "reward",
    TransferIn => "transfer_in",
    TransferOut => "transfer_out",
    Stake => "stake",
});

impl TransactionType {
    /// `true` for types that add tokens to the agent.
    pub const fn is_credit(self) -> bool {
        matches!(self, Self::Earn | Self::Reward | Self::TransferIn)
    }
}

// ---------------------------------------------------------------------------
// Narrative
// ---------------------------------------------------------------------------

/// Category of an activity log line shown on an agent's timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// The agent registered.
    Joined,
    /// A season opened for the agent.
    Season,
    /// A season game was played.
    Game,
    /// End-of-season salary settlement.
    Salary,
    /// Tournament enrollment, cancellation or result.
    Tournament,
    /// The agent submitted a reflection.
    Reflection,
}

text_enum!(ActivityKind {
    Joined => "joined",
    Season => "season",
    Game => "game",
    Salary => "salary",
    Tournament => "tournament",
    Reflection => "reflection",
});

/// Notable event attached to a judged game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum GameEventType {
    /// Nothing out of the ordinary.
    #[default]
    Normal,
    /// The weaker side won.
    Upset,
    /// Lopsided margin.
    Blowout,
    /// Decided on the final possession.
    BuzzerBeater,
    /// Someone picked up a knock.
    InjuryMinor,
}

text_enum!(GameEventType {
    Normal => "normal",
    Upset => "upset",
    Blowout => "blowout",
    BuzzerBeater => "buzzer_beater",
    InjuryMinor => "injury_minor",
});

/// When a generated dialogue line is spoken relative to the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum InteractionPhase {
    /// Before tip-off.
    PreGame,
    /// During play.
    InGame,
    /// After the final whistle.
    PostGame,
}

text_enum!(InteractionPhase {
    PreGame => "pre_game",
    InGame => "in_game",
    PostGame => "post_game",
});

/// How one agent answers another around a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum ReactionKind {
    /// Approval.
    Like,
    /// Contempt.
    Disdain,
    /// A challenge; the target answers back.
    Provoke,
    /// A free-text note; the target answers back.
    Comment,
}

text_enum!(ReactionKind {
    Like => "like",
    Disdain => "disdain",
    Provoke => "provoke",
    Comment => "comment",
});

impl ReactionKind {
    /// Whether the target of this reaction replies to it.
    pub const fn draws_reply(self) -> bool {
        matches!(self, Self::Provoke | Self::Comment)
    }
}

/// Who wrote a reaction's message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum ReactionSource {
    /// Submitted through the API.
    User,
    /// Written by the world model.
    Model,
    /// Picked from the local reply templates.
    Fallback,
}

text_enum!(ReactionSource {
    User => "user",
    Model => "model",
    Fallback => "fallback",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_round_trip_for_every_status() {
        for status in TournamentStatus::ALL {
            assert_eq!(TournamentStatus::parse(status.as_str()), Some(*status));
        }
        for kind in TransactionType::ALL {
            assert_eq!(TransactionType::parse(kind.as_str()), Some(*kind));
        }
    }

    #[test]
    fn only_challenges_and_comments_get_answers() {
        let answered: Vec<ReactionKind> = ReactionKind::ALL
            .iter()
            .copied()
            .filter(|k| k.draws_reply())
            .collect();
        assert_eq!(answered, vec![ReactionKind::Provoke, ReactionKind::Comment]);
        assert_eq!(ReactionKind::parse("disdain"), Some(ReactionKind::Disdain));
        assert_eq!(ReactionKind::parse("cheer"), None);
    }

    #[test]
    fn serde_tag_matches_storage_tag() {
        let json = serde_json::to_string(&TournamentStatus::InProgress).unwrap_or_default();
        assert_eq!(json, "\"in_progress\"");
        let json = serde_json::to_string(&Position::PointGuard).unwrap_or_default();
        assert_eq!(json, "\"PG\"");
    }

    #[test]
    fn tournament_transitions_are_forward_only() {
        use TournamentStatus::*;
        assert!(Registering.can_transition_to(InProgress));
        assert!(Registering.can_transition_to(Cancelled));
        assert!(InProgress.can_transition_to(Settling));
        assert!(Settling.can_transition_to(Completed));

        assert!(!InProgress.can_transition_to(Registering));
        assert!(!InProgress.can_transition_to(Cancelled));
        assert!(!Settling.can_transition_to(Cancelled));
        assert!(!Completed.can_transition_to(Settling));
        assert!(!Cancelled.can_transition_to(Registering));
    }

    #[test]
    fn loose_skill_names_resolve() {
        assert_eq!(Skill::from_loose("basketballIQ"), Some(Skill::BasketballIq));
        assert_eq!(Skill::from_loose("basketball_iq"), Some(Skill::BasketballIq));
        assert_eq!(Skill::from_loose(" Shooting "), Some(Skill::Shooting));
        assert_eq!(Skill::from_loose("dunking"), None);
    }

    #[test]
    fn credit_types_are_classified() {
        assert!(TransactionType::Earn.is_credit());
        assert!(TransactionType::Reward.is_credit());
        assert!(TransactionType::TransferIn.is_credit());
        assert!(!TransactionType::Spend.is_credit());
        assert!(!TransactionType::TransferOut.is_credit());
        assert!(!TransactionType::Stake.is_credit());
    }
}
