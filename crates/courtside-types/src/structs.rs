//! Core entity structs for the Courtside league.
//!
//! Ownership follows the persistence model: a [`Season`] owns its [`Game`]s,
//! a [`Tournament`] owns its [`TournamentParticipant`]s and
//! [`TournamentMatch`]es, and an [`Agent`] is only ever referenced by id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::enums::{
    ActivityKind, GameEventType, InteractionPhase, MatchOutcome, MatchStatus, Position,
    ReactionKind, ReactionSource, SeasonStatus, Skill, TournamentFormat, TournamentStatus,
    TransactionType,
};
use crate::ids::{
    ActivityId, AgentId, GameId, InteractionId, MatchId, ReactionId, ReflectionId, SeasonId,
    TournamentId, TransactionId,
};

/// Lowest value any skill rating may hold.
pub const SKILL_MIN: u8 = 1;

/// Highest value any skill rating may hold.
pub const SKILL_MAX: u8 = 99;

/// Highest value the cognitive score may reach through reflection.
pub const COGNITIVE_MAX: u8 = 100;

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

/// The seven skill ratings of an agent, each within `[1, 99]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Attributes {
    /// Scoring efficiency.
    pub shooting: u8,
    /// On-ball and help defense.
    pub defense: u8,
    /// Foot speed.
    pub speed: u8,
    /// Endurance.
    pub stamina: u8,
    /// Decision making.
    pub basketball_iq: u8,
    /// Ball movement.
    pub passing: u8,
    /// Board control.
    pub rebounding: u8,
}

impl Attributes {
    /// Build an attribute set with every skill at `value` (clamped).
    pub const fn uniform(value: u8) -> Self {
        let v = clamp_skill(value);
        Self {
            shooting: v,
            defense: v,
            speed: v,
            stamina: v,
            basketball_iq: v,
            passing: v,
            rebounding: v,
        }
    }

    /// Read one skill.
    pub const fn get(&self, skill: Skill) -> u8 {
        match skill {
            Skill::Shooting => self.shooting,
            Skill::Defense => self.defense,
            Skill::Speed => self.speed,
            Skill::Stamina => self.stamina,
            Skill::BasketballIq => self.basketball_iq,
            Skill::Passing => self.passing,
            Skill::Rebounding => self.rebounding,
        }
    }

    /// Overwrite one skill, clamping into `[1, 99]`.
    pub const fn set(&mut self, skill: Skill, value: u8) {
        let v = clamp_skill(value);
        match skill {
            Skill::Shooting => self.shooting = v,
            Skill::Defense => self.defense = v,
            Skill::Speed => self.speed = v,
            Skill::Stamina => self.stamina = v,
            Skill::BasketballIq => self.basketball_iq = v,
            Skill::Passing => self.passing = v,
            Skill::Rebounding => self.rebounding = v,
        }
    }

    /// Raise one skill by `amount`, saturating at 99. Returns the new value.
    pub const fn boost(&mut self, skill: Skill, amount: u8) -> u8 {
        let next = self.get(skill).saturating_add(amount);
        self.set(skill, next);
        self.get(skill)
    }

    /// Unweighted mean of the seven skills.
    pub fn average(&self) -> f64 {
        let total: u32 = Skill::ALL.iter().map(|s| u32::from(self.get(*s))).sum();
        f64::from(total) / 7.0
    }

    /// Clamp every skill into `[1, 99]`.
    #[must_use]
    pub fn clamped(mut self) -> Self {
        for skill in Skill::ALL {
            self.set(*skill, self.get(*skill));
        }
        self
    }
}

/// Clamp a raw skill value into `[SKILL_MIN, SKILL_MAX]`.
pub const fn clamp_skill(value: u8) -> u8 {
    if value < SKILL_MIN {
        SKILL_MIN
    } else if value > SKILL_MAX {
        SKILL_MAX
    } else {
        value
    }
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// A competitor: human-linked or synthetic (NPC).
///
/// Agents are never deleted, only deactivated. NPCs take part in games and
/// tournaments but are excluded from every token reward and cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Agent {
    /// Unique identifier.
    pub id: AgentId,
    /// Display name.
    pub nickname: String,
    /// Synthetic roster filler with no economic stake.
    pub is_npc: bool,
    /// Inactive agents are skipped by every simulation.
    pub active: bool,
    /// On-court position.
    pub position: Position,
    /// Skill ratings.
    pub attributes: Attributes,
    /// Luck value in `[0, 100]`.
    pub luck_value: u8,
    /// Cognitive score in `[0, 100]`.
    pub cognitive_score: u8,
    /// Free-text ambition supplied at registration.
    pub life_vision: Option<String>,
    /// Team name, once assigned.
    pub team: Option<String>,
    /// Career wins.
    pub wins: u32,
    /// Career losses.
    pub losses: u32,
    /// Current per-season base salary in tokens.
    pub salary: i64,
    /// Current token balance.
    pub token_balance: i64,
    /// Lifetime tokens credited.
    pub total_earned: i64,
    /// Lifetime tokens debited (stored positive).
    pub total_spent: i64,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

impl Agent {
    /// Total career games.
    pub const fn games_played(&self) -> u32 {
        self.wins.saturating_add(self.losses)
    }

    /// Career win rate in `[0, 1]`; `0.0` before the first game.
    pub fn win_rate(&self) -> f64 {
        let games = self.games_played();
        if games == 0 {
            return 0.0;
        }
        f64::from(self.wins) / f64::from(games)
    }
}

// ---------------------------------------------------------------------------
// Season
// ---------------------------------------------------------------------------

/// A bounded sequence of games for one competitive cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Season {
    /// Unique identifier.
    pub id: SeasonId,
    /// Sequential season number starting at 1.
    pub season_num: u32,
    /// Games simulated so far. Never exceeds `total_games`.
    pub games_played: u32,
    /// Fixed target for the season.
    pub total_games: u32,
    /// Lifecycle status.
    pub status: SeasonStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Set when the season flips to `Completed`.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Season {
    /// Games left before the season completes.
    pub const fn remaining_games(&self) -> u32 {
        self.total_games.saturating_sub(self.games_played)
    }
}

/// Counting stats for one agent in one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BoxScore {
    /// Minutes on court (24 to 40).
    pub minutes: u32,
    /// Points scored.
    pub points: u32,
    /// Rebounds.
    pub rebounds: u32,
    /// Assists.
    pub assists: u32,
    /// Steals.
    pub steals: u32,
    /// Blocks.
    pub blocks: u32,
    /// Turnovers.
    pub turnovers: u32,
    /// Composite game rating in `[1, 99]`.
    pub rating: u8,
}

/// One simulated season game. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Game {
    /// Unique identifier.
    pub id: GameId,
    /// Owning season.
    pub season_id: SeasonId,
    /// Home side.
    pub home_agent_id: AgentId,
    /// Away side.
    pub away_agent_id: AgentId,
    /// Final home score.
    pub home_score: u32,
    /// Final away score.
    pub away_score: u32,
    /// Narrative shown on the game card.
    pub narrative: String,
    /// Notable event tag.
    pub event_type: GameEventType,
    /// Most valuable player of the game.
    pub mvp_agent_id: AgentId,
    /// Time the game was played.
    pub played_at: DateTime<Utc>,
}

impl Game {
    /// Winning agent; ties go to the home side.
    pub const fn winner(&self) -> AgentId {
        if self.home_score >= self.away_score {
            self.home_agent_id
        } else {
            self.away_agent_id
        }
    }
}

/// One agent's box score in one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GameStats {
    /// The game.
    pub game_id: GameId,
    /// The agent.
    pub agent_id: AgentId,
    /// Whether this agent won.
    pub won: bool,
    /// Counting stats.
    pub box_score: BoxScore,
}

/// Running per-agent aggregates for one season, keyed by (season, agent).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SeasonStats {
    /// The season.
    pub season_id: SeasonId,
    /// The agent.
    pub agent_id: AgentId,
    /// Games played this season.
    pub games_played: u32,
    /// Wins this season.
    pub wins: u32,
    /// Losses this season.
    pub losses: u32,
    /// Total points.
    pub points: u32,
    /// Total rebounds.
    pub rebounds: u32,
    /// Total assists.
    pub assists: u32,
    /// Total steals.
    pub steals: u32,
    /// Total blocks.
    pub blocks: u32,
    /// Most recent game rating.
    pub last_rating: u8,
    /// Base salary fixed at season start.
    pub salary: i64,
    /// Tokens credited at settlement.
    pub tokens_earned: i64,
}

impl SeasonStats {
    /// Empty stats row for an agent at season start.
    pub const fn opening(season_id: SeasonId, agent_id: AgentId, salary: i64) -> Self {
        Self {
            season_id,
            agent_id,
            games_played: 0,
            wins: 0,
            losses: 0,
            points: 0,
            rebounds: 0,
            assists: 0,
            steals: 0,
            blocks: 0,
            last_rating: 0,
            salary,
            tokens_earned: 0,
        }
    }

    /// Fold one game into the running totals.
    pub const fn record(&mut self, box_score: &BoxScore, won: bool) {
        self.games_played = self.games_played.saturating_add(1);
        if won {
            self.wins = self.wins.saturating_add(1);
        } else {
            self.losses = self.losses.saturating_add(1);
        }
        self.points = self.points.saturating_add(box_score.points);
        self.rebounds = self.rebounds.saturating_add(box_score.rebounds);
        self.assists = self.assists.saturating_add(box_score.assists);
        self.steals = self.steals.saturating_add(box_score.steals);
        self.blocks = self.blocks.saturating_add(box_score.blocks);
        self.last_rating = box_score.rating;
    }

    /// Season win rate in `[0, 1]`; `0.0` before the first game.
    pub fn win_rate(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        f64::from(self.wins) / f64::from(self.games_played)
    }
}

// ---------------------------------------------------------------------------
// Tournament
// ---------------------------------------------------------------------------

/// A bounded multi-round Swiss competition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Tournament {
    /// Unique identifier.
    pub id: TournamentId,
    /// Display name.
    pub name: String,
    /// Pairing format.
    pub format: TournamentFormat,
    /// Lifecycle status.
    pub status: TournamentStatus,
    /// Tokens charged per paying enrollee.
    pub entry_fee: i64,
    /// Entry fees collected plus the system subsidy.
    pub prize_pool: i64,
    /// Fixed system contribution to the prize pool.
    pub system_subsidy: i64,
    /// Number of Swiss rounds.
    pub total_rounds: u32,
    /// Round currently being played; 0 while registering.
    pub current_round: u32,
    /// Enrollment floor required to start.
    pub min_participants: u32,
    /// Enrollment ceiling.
    pub max_participants: u32,
    /// Moment registration closes.
    pub registration_deadline: DateTime<Utc>,
    /// Closing narrative naming the winner.
    pub narrative: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Set on reaching a terminal status.
    pub completed_at: Option<DateTime<Utc>>,
}

/// One agent's enrollment in one tournament, keyed by (tournament, agent).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TournamentParticipant {
    /// The tournament.
    pub tournament_id: TournamentId,
    /// The agent.
    pub agent_id: AgentId,
    /// Snapshot of the NPC flag at enrollment.
    pub is_npc: bool,
    /// Display name snapshot.
    pub nickname: String,
    /// Wins, byes included.
    pub wins: u32,
    /// Losses.
    pub losses: u32,
    /// Draws.
    pub draws: u32,
    /// Cumulative Swiss score (win 3, draw 1, loss 0).
    pub score: u32,
    /// Rounds in which this participant received a bye.
    pub bye_rounds: Vec<u32>,
    /// Final placement, set exactly once at settlement.
    pub placement: Option<u32>,
    /// Prize credited at settlement.
    pub tokens_won: i64,
    /// Enrollment order within the tournament (0-based).
    pub seed: u32,
}

impl TournamentParticipant {
    /// A fresh enrollment with empty standings.
    pub fn enroll(tournament_id: TournamentId, agent: &Agent, seed: u32) -> Self {
        Self {
            tournament_id,
            agent_id: agent.id,
            is_npc: agent.is_npc,
            nickname: agent.nickname.clone(),
            wins: 0,
            losses: 0,
            draws: 0,
            score: 0,
            bye_rounds: Vec::new(),
            placement: None,
            tokens_won: 0,
            seed,
        }
    }

    /// Apply one match result to the standings.
    pub const fn record(&mut self, outcome: MatchOutcome) {
        match outcome {
            MatchOutcome::Win => self.wins = self.wins.saturating_add(1),
            MatchOutcome::Draw => self.draws = self.draws.saturating_add(1),
            MatchOutcome::Loss => self.losses = self.losses.saturating_add(1),
        }
        self.score = self.score.saturating_add(outcome.points());
    }

    /// Credit a bye for `round` as a win. Returns `false`, changing
    /// nothing, if that round's bye was already credited.
    pub fn record_bye(&mut self, round: u32) -> bool {
        if self.bye_rounds.contains(&round) {
            return false;
        }
        self.bye_rounds.push(round);
        self.record(MatchOutcome::Win);
        true
    }

    /// Matches played plus byes received.
    pub const fn rounds_played(&self) -> u32 {
        self.wins.saturating_add(self.losses).saturating_add(self.draws)
    }
}

/// One paired encounter within a tournament round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TournamentMatch {
    /// Unique identifier.
    pub id: MatchId,
    /// Owning tournament.
    pub tournament_id: TournamentId,
    /// Round number, starting at 1.
    pub round: u32,
    /// First side.
    pub agent1_id: AgentId,
    /// Second side.
    pub agent2_id: AgentId,
    /// Winner, `None` for a draw or while pending.
    pub winner_id: Option<AgentId>,
    /// Sub-rounds won by the first side.
    pub agent1_score: u32,
    /// Sub-rounds won by the second side.
    pub agent2_score: u32,
    /// Match narrative.
    pub narrative: Option<String>,
    /// `Pending` until played.
    pub status: MatchStatus,
}

impl TournamentMatch {
    /// Whether `agent` plays in this match.
    pub fn involves(&self, agent: AgentId) -> bool {
        self.agent1_id == agent || self.agent2_id == agent
    }

    /// The opponent of `agent`, if `agent` plays in this match.
    pub fn opponent_of(&self, agent: AgentId) -> Option<AgentId> {
        if self.agent1_id == agent {
            Some(self.agent2_id)
        } else if self.agent2_id == agent {
            Some(self.agent1_id)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Ledger and timeline
// ---------------------------------------------------------------------------

/// Append-only token ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TokenTransaction {
    /// Unique identifier.
    pub id: TransactionId,
    /// The agent whose balance changed.
    pub agent_id: AgentId,
    /// Signed amount: positive for credits, negative for debits.
    pub amount: i64,
    /// Balance immediately after this entry.
    pub balance_after: i64,
    /// Type tag.
    pub kind: TransactionType,
    /// Human-readable description.
    pub description: String,
    /// Originating game or tournament, if any.
    pub reference_id: Option<Uuid>,
    /// Time recorded.
    pub created_at: DateTime<Utc>,
}

/// One line on an agent's activity timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ActivityLog {
    /// Unique identifier.
    pub id: ActivityId,
    /// The agent.
    pub agent_id: AgentId,
    /// Category.
    pub kind: ActivityKind,
    /// Rendered text.
    pub content: String,
    /// Time recorded.
    pub created_at: DateTime<Utc>,
}

impl ActivityLog {
    /// New timeline entry stamped now.
    pub fn new(agent_id: AgentId, kind: ActivityKind, content: impl Into<String>) -> Self {
        Self {
            id: ActivityId::new(),
            agent_id,
            kind,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// Generated dialogue line around a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GameInteraction {
    /// Unique identifier.
    pub id: InteractionId,
    /// The game.
    pub game_id: GameId,
    /// Speaker.
    pub agent_id: AgentId,
    /// When the line is spoken.
    pub phase: InteractionPhase,
    /// The line itself.
    pub content: String,
    /// Time recorded.
    pub created_at: DateTime<Utc>,
}

/// One agent's reaction to another around a game, or the answer to one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Reaction {
    /// Unique identifier.
    pub id: ReactionId,
    /// The game it concerns.
    pub game_id: GameId,
    /// Dialogue line being answered, if any.
    pub interaction_id: Option<InteractionId>,
    /// Who reacted.
    pub from_agent_id: AgentId,
    /// Who it was aimed at.
    pub to_agent_id: AgentId,
    /// Kind of reaction.
    pub kind: ReactionKind,
    /// Attached text.
    pub message: Option<String>,
    /// Who wrote the text.
    pub source: ReactionSource,
    /// Time recorded.
    pub created_at: DateTime<Utc>,
}

/// A reflection submitted by an agent and the boosts it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Reflection {
    /// Unique identifier.
    pub id: ReflectionId,
    /// The agent.
    pub agent_id: AgentId,
    /// Submitted free text.
    pub content: String,
    /// Requested focus skill, if any.
    pub focus: Option<Skill>,
    /// Skill that received the primary boost.
    pub primary_skill: Skill,
    /// Primary boost amount (1 to 4).
    pub primary_amount: u8,
    /// Skill that received the secondary boost.
    pub secondary_skill: Option<Skill>,
    /// Secondary boost amount (0 to 2).
    pub secondary_amount: u8,
    /// Cognitive score boost (0 to 3).
    pub cognitive_boost: u8,
    /// Analysis summary.
    pub summary: String,
    /// Coaching advice.
    pub advice: String,
    /// Time recorded.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_boost_saturates_at_ceiling() {
        let mut attrs = Attributes::uniform(97);
        assert_eq!(attrs.boost(Skill::Passing, 5), SKILL_MAX);
        assert_eq!(attrs.boost(Skill::Passing, u8::MAX), SKILL_MAX);
        assert_eq!(attrs.shooting, 97);
    }

    #[test]
    fn attribute_set_clamps_both_ends() {
        let mut attrs = Attributes::uniform(50);
        attrs.set(Skill::Defense, 0);
        attrs.set(Skill::Speed, 200);
        assert_eq!(attrs.defense, SKILL_MIN);
        assert_eq!(attrs.speed, SKILL_MAX);
        assert_eq!(Attributes::uniform(0), Attributes::uniform(1));
    }

    #[test]
    fn season_stats_record_accumulates() {
        let mut stats = SeasonStats::opening(SeasonId::new(), AgentId::new(), 80);
        let line = BoxScore {
            minutes: 30,
            points: 22,
            rebounds: 7,
            assists: 4,
            steals: 1,
            blocks: 2,
            turnovers: 3,
            rating: 61,
        };
        stats.record(&line, true);
        stats.record(&BoxScore { rating: 40, ..line }, false);
        assert_eq!(stats.games_played, 2);
        assert_eq!(stats.wins, 1);
        assert_eq!(stats.losses, 1);
        assert_eq!(stats.points, 44);
        assert_eq!(stats.last_rating, 40);
    }

    #[test]
    fn match_opponent_lookup() {
        let a = AgentId::new();
        let b = AgentId::new();
        let m = TournamentMatch {
            id: MatchId::new(),
            tournament_id: TournamentId::new(),
            round: 1,
            agent1_id: a,
            agent2_id: b,
            winner_id: None,
            agent1_score: 0,
            agent2_score: 0,
            narrative: None,
            status: MatchStatus::Pending,
        };
        assert_eq!(m.opponent_of(a), Some(b));
        assert_eq!(m.opponent_of(b), Some(a));
        assert_eq!(m.opponent_of(AgentId::new()), None);
        assert!(m.involves(a));
    }

    #[test]
    fn participant_standings_and_byes() {
        let mut p = TournamentParticipant {
            tournament_id: TournamentId::new(),
            agent_id: AgentId::new(),
            is_npc: false,
            nickname: "Ace".to_owned(),
            wins: 0,
            losses: 0,
            draws: 0,
            score: 0,
            bye_rounds: Vec::new(),
            placement: None,
            tokens_won: 0,
            seed: 0,
        };
        p.record(MatchOutcome::Win);
        p.record(MatchOutcome::Draw);
        p.record(MatchOutcome::Loss);
        assert_eq!((p.wins, p.draws, p.losses, p.score), (1, 1, 1, 4));

        assert!(p.record_bye(4));
        assert!(!p.record_bye(4));
        assert_eq!(p.wins, 2);
        assert_eq!(p.score, 7);
        assert_eq!(p.bye_rounds, vec![4]);
        assert_eq!(p.rounds_played(), 4);
    }
}
