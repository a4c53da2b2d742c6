//! Row structs for the league tables and their mapping onto league types.
//!
//! Unsigned counters are stored as signed `PostgreSQL` integers; enum tags
//! are stored as text. Decoding rejects negative counters and unknown tags
//! with [`DbError::Decode`] rather than guessing.

use chrono::{DateTime, Utc};
use courtside_types::{
    ActivityKind, ActivityLog, Agent, Attributes, BoxScore, Game, GameEventType, GameInteraction,
    GameStats, InteractionPhase, MatchStatus, Position, Reaction, ReactionKind, ReactionSource,
    Season, SeasonStats, SeasonStatus,
    TokenTransaction, Tournament, TournamentFormat, TournamentMatch, TournamentParticipant,
    TournamentStatus, TransactionType,
};
use uuid::Uuid;

use crate::error::DbError;

// ---------------------------------------------------------------------------
// Encoding helpers
// ---------------------------------------------------------------------------

/// Store a `u32` counter in an `INTEGER` column.
pub(crate) fn int(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Store a `u8` attribute in a `SMALLINT` column.
pub(crate) fn small(value: u8) -> i16 {
    i16::from(value)
}

fn counter(column: &str, value: i32) -> Result<u32, DbError> {
    u32::try_from(value).map_err(|_| DbError::Decode(format!("{column} is negative: {value}")))
}

fn byte(column: &str, value: i16) -> Result<u8, DbError> {
    u8::try_from(value).map_err(|_| DbError::Decode(format!("{column} out of range: {value}")))
}

fn tag<T>(column: &str, text: &str, parse: fn(&str) -> Option<T>) -> Result<T, DbError> {
    parse(text).ok_or_else(|| DbError::Decode(format!("unknown {column} tag: {text}")))
}

// ---------------------------------------------------------------------------
// Agents and ledger
// ---------------------------------------------------------------------------

/// A row from the `agents` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AgentRow {
    pub id: Uuid,
    pub nickname: String,
    pub is_npc: bool,
    pub active: bool,
    pub position: String,
    pub shooting: i16,
    pub defense: i16,
    pub speed: i16,
    pub stamina: i16,
    pub basketball_iq: i16,
    pub passing: i16,
    pub rebounding: i16,
    pub luck_value: i16,
    pub cognitive_score: i16,
    pub life_vision: Option<String>,
    pub team: Option<String>,
    pub wins: i32,
    pub losses: i32,
    pub salary: i64,
    pub token_balance: i64,
    pub total_earned: i64,
    pub total_spent: i64,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<AgentRow> for Agent {
    type Error = DbError;

    fn try_from(row: AgentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            nickname: row.nickname,
            is_npc: row.is_npc,
            active: row.active,
            position: tag("position", &row.position, Position::parse)?,
            attributes: Attributes {
                shooting: byte("shooting", row.shooting)?,
                defense: byte("defense", row.defense)?,
                speed: byte("speed", row.speed)?,
                stamina: byte("stamina", row.stamina)?,
                basketball_iq: byte("basketball_iq", row.basketball_iq)?,
                passing: byte("passing", row.passing)?,
                rebounding: byte("rebounding", row.rebounding)?,
            },
            luck_value: byte("luck_value", row.luck_value)?,
            cognitive_score: byte("cognitive_score", row.cognitive_score)?,
            life_vision: row.life_vision,
            team: row.team,
            wins: counter("wins", row.wins)?,
            losses: counter("losses", row.losses)?,
            salary: row.salary,
            token_balance: row.token_balance,
            total_earned: row.total_earned,
            total_spent: row.total_spent,
            created_at: row.created_at,
        })
    }
}

/// A row from the `token_transactions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TransactionRow {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub amount: i64,
    pub balance_after: i64,
    pub kind: String,
    pub description: String,
    pub reference_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for TokenTransaction {
    type Error = DbError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            agent_id: row.agent_id.into(),
            amount: row.amount,
            balance_after: row.balance_after,
            kind: tag("kind", &row.kind, TransactionType::parse)?,
            description: row.description,
            reference_id: row.reference_id,
            created_at: row.created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Seasons and games
// ---------------------------------------------------------------------------

/// A row from the `seasons` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SeasonRow {
    pub id: Uuid,
    pub season_num: i32,
    pub games_played: i32,
    pub total_games: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<SeasonRow> for Season {
    type Error = DbError;

    fn try_from(row: SeasonRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            season_num: counter("season_num", row.season_num)?,
            games_played: counter("games_played", row.games_played)?,
            total_games: counter("total_games", row.total_games)?,
            status: tag("status", &row.status, SeasonStatus::parse)?,
            created_at: row.created_at,
            completed_at: row.completed_at,
        })
    }
}

/// A row from the `season_stats` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SeasonStatsRow {
    pub season_id: Uuid,
    pub agent_id: Uuid,
    pub games_played: i32,
    pub wins: i32,
    pub losses: i32,
    pub points: i32,
    pub rebounds: i32,
    pub assists: i32,
    pub steals: i32,
    pub blocks: i32,
    pub last_rating: i16,
    pub salary: i64,
    pub tokens_earned: i64,
}

impl TryFrom<SeasonStatsRow> for SeasonStats {
    type Error = DbError;

    fn try_from(row: SeasonStatsRow) -> Result<Self, Self::Error> {
        Ok(Self {
            season_id: row.season_id.into(),
            agent_id: row.agent_id.into(),
            games_played: counter("games_played", row.games_played)?,
            wins: counter("wins", row.wins)?,
            losses: counter("losses", row.losses)?,
            points: counter("points", row.points)?,
            rebounds: counter("rebounds", row.rebounds)?,
            assists: counter("assists", row.assists)?,
            steals: counter("steals", row.steals)?,
            blocks: counter("blocks", row.blocks)?,
            last_rating: byte("last_rating", row.last_rating)?,
            salary: row.salary,
            tokens_earned: row.tokens_earned,
        })
    }
}

/// A row from the `games` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GameRow {
    pub id: Uuid,
    pub season_id: Uuid,
    pub home_agent_id: Uuid,
    pub away_agent_id: Uuid,
    pub home_score: i32,
    pub away_score: i32,
    pub narrative: String,
    pub event_type: String,
    pub mvp_agent_id: Uuid,
    pub played_at: DateTime<Utc>,
}

impl TryFrom<GameRow> for Game {
    type Error = DbError;

    fn try_from(row: GameRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            season_id: row.season_id.into(),
            home_agent_id: row.home_agent_id.into(),
            away_agent_id: row.away_agent_id.into(),
            home_score: counter("home_score", row.home_score)?,
            away_score: counter("away_score", row.away_score)?,
            narrative: row.narrative,
            event_type: tag("event_type", &row.event_type, GameEventType::parse)?,
            mvp_agent_id: row.mvp_agent_id.into(),
            played_at: row.played_at,
        })
    }
}

/// A row from the `game_stats` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GameStatsRow {
    pub game_id: Uuid,
    pub agent_id: Uuid,
    pub won: bool,
    pub minutes: i32,
    pub points: i32,
    pub rebounds: i32,
    pub assists: i32,
    pub steals: i32,
    pub blocks: i32,
    pub turnovers: i32,
    pub rating: i16,
}

impl TryFrom<GameStatsRow> for GameStats {
    type Error = DbError;

    fn try_from(row: GameStatsRow) -> Result<Self, Self::Error> {
        Ok(Self {
            game_id: row.game_id.into(),
            agent_id: row.agent_id.into(),
            won: row.won,
            box_score: BoxScore {
                minutes: counter("minutes", row.minutes)?,
                points: counter("points", row.points)?,
                rebounds: counter("rebounds", row.rebounds)?,
                assists: counter("assists", row.assists)?,
                steals: counter("steals", row.steals)?,
                blocks: counter("blocks", row.blocks)?,
                turnovers: counter("turnovers", row.turnovers)?,
                rating: byte("rating", row.rating)?,
            },
        })
    }
}

/// A row from the `game_interactions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InteractionRow {
    pub id: Uuid,
    pub game_id: Uuid,
    pub agent_id: Uuid,
    pub phase: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<InteractionRow> for GameInteraction {
    type Error = DbError;

    fn try_from(row: InteractionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            game_id: row.game_id.into(),
            agent_id: row.agent_id.into(),
            phase: tag("phase", &row.phase, InteractionPhase::parse)?,
            content: row.content,
            created_at: row.created_at,
        })
    }
}

/// A row from the `reactions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReactionRow {
    pub id: Uuid,
    pub game_id: Uuid,
    pub interaction_id: Option<Uuid>,
    pub from_agent_id: Uuid,
    pub to_agent_id: Uuid,
    pub kind: String,
    pub message: Option<String>,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ReactionRow> for Reaction {
    type Error = DbError;

    fn try_from(row: ReactionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            game_id: row.game_id.into(),
            interaction_id: row.interaction_id.map(Into::into),
            from_agent_id: row.from_agent_id.into(),
            to_agent_id: row.to_agent_id.into(),
            kind: tag("kind", &row.kind, ReactionKind::parse)?,
            message: row.message,
            source: tag("source", &row.source, ReactionSource::parse)?,
            created_at: row.created_at,
        })
    }
}

/// A row from the `activity_logs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActivityRow {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub kind: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ActivityRow> for ActivityLog {
    type Error = DbError;

    fn try_from(row: ActivityRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            agent_id: row.agent_id.into(),
            kind: tag("kind", &row.kind, ActivityKind::parse)?,
            content: row.content,
            created_at: row.created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Tournaments
// ---------------------------------------------------------------------------

/// A row from the `tournaments` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TournamentRow {
    pub id: Uuid,
    pub name: String,
    pub format: String,
    pub status: String,
    pub entry_fee: i64,
    pub prize_pool: i64,
    pub system_subsidy: i64,
    pub total_rounds: i32,
    pub current_round: i32,
    pub min_participants: i32,
    pub max_participants: i32,
    pub registration_deadline: DateTime<Utc>,
    pub narrative: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<TournamentRow> for Tournament {
    type Error = DbError;

    fn try_from(row: TournamentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            name: row.name,
            format: tag("format", &row.format, TournamentFormat::parse)?,
            status: tag("status", &row.status, TournamentStatus::parse)?,
            entry_fee: row.entry_fee,
            prize_pool: row.prize_pool,
            system_subsidy: row.system_subsidy,
            total_rounds: counter("total_rounds", row.total_rounds)?,
            current_round: counter("current_round", row.current_round)?,
            min_participants: counter("min_participants", row.min_participants)?,
            max_participants: counter("max_participants", row.max_participants)?,
            registration_deadline: row.registration_deadline,
            narrative: row.narrative,
            created_at: row.created_at,
            completed_at: row.completed_at,
        })
    }
}

/// A row from the `tournament_participants` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ParticipantRow {
    pub tournament_id: Uuid,
    pub agent_id: Uuid,
    pub is_npc: bool,
    pub nickname: String,
    pub wins: i32,
    pub losses: i32,
    pub draws: i32,
    pub score: i32,
    pub bye_rounds: Vec<i32>,
    pub placement: Option<i32>,
    pub tokens_won: i64,
    pub seed: i32,
}

impl TryFrom<ParticipantRow> for TournamentParticipant {
    type Error = DbError;

    fn try_from(row: ParticipantRow) -> Result<Self, Self::Error> {
        Ok(Self {
            tournament_id: row.tournament_id.into(),
            agent_id: row.agent_id.into(),
            is_npc: row.is_npc,
            nickname: row.nickname,
            wins: counter("wins", row.wins)?,
            losses: counter("losses", row.losses)?,
            draws: counter("draws", row.draws)?,
            score: counter("score", row.score)?,
            bye_rounds: row
                .bye_rounds
                .into_iter()
                .map(|r| counter("bye_rounds", r))
                .collect::<Result<_, _>>()?,
            placement: row.placement.map(|p| counter("placement", p)).transpose()?,
            tokens_won: row.tokens_won,
            seed: counter("seed", row.seed)?,
        })
    }
}

/// A row from the `tournament_matches` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MatchRow {
    pub id: Uuid,
    pub tournament_id: Uuid,
    pub round: i32,
    pub agent1_id: Uuid,
    pub agent2_id: Uuid,
    pub winner_id: Option<Uuid>,
    pub agent1_score: i32,
    pub agent2_score: i32,
    pub narrative: Option<String>,
    pub status: String,
}

impl TryFrom<MatchRow> for TournamentMatch {
    type Error = DbError;

    fn try_from(row: MatchRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            tournament_id: row.tournament_id.into(),
            round: counter("round", row.round)?,
            agent1_id: row.agent1_id.into(),
            agent2_id: row.agent2_id.into(),
            winner_id: row.winner_id.map(Into::into),
            agent1_score: counter("agent1_score", row.agent1_score)?,
            agent2_score: counter("agent2_score", row.agent2_score)?,
            narrative: row.narrative,
            status: tag("status", &row.status, MatchStatus::parse)?,
        })
    }
}

/// Decode a batch of rows, failing on the first bad one.
pub(crate) fn decode_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, DbError>
where
    T: TryFrom<R, Error = DbError>,
{
    rows.into_iter().map(T::try_from).collect()
}
