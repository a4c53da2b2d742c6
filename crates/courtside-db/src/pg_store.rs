//! `PostgreSQL` league store.
//!
//! Every compare-and-set is a single conditional `UPDATE` whose
//! `rows_affected` decides the winner. Operations that touch several tables
//! run inside one transaction so a losing or failing caller leaves no
//! partial writes behind.

use courtside_types::{
    ActivityLog, Agent, AgentId, BoxScore, COGNITIVE_MAX, Game, GameId, GameInteraction,
    GameStats, InteractionId, MatchOutcome, MatchStatus, Reaction, Reflection, SKILL_MAX, Season,
    SeasonId, SeasonStats, SeasonStatus, Skill, TokenTransaction, Tournament, TournamentId,
    TournamentMatch, TournamentParticipant, TournamentStatus,
};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::DbError;
use crate::rows::{
    ActivityRow, AgentRow, GameRow, GameStatsRow, InteractionRow, MatchRow, ParticipantRow,
    ReactionRow, SeasonRow, SeasonStatsRow, TournamentRow, TransactionRow, decode_all, int, small,
};
use crate::store::{MatchResult, Overdraft, RoundStart, posting_totals, rebase_postings};

const AGENT_COLUMNS: &str = "id, nickname, is_npc, active, position, shooting, defense, speed, \
    stamina, basketball_iq, passing, rebounding, luck_value, cognitive_score, life_vision, team, \
    wins, losses, salary, token_balance, total_earned, total_spent, created_at";

const SEASON_COLUMNS: &str =
    "id, season_num, games_played, total_games, status, created_at, completed_at";

const SEASON_STATS_COLUMNS: &str = "season_id, agent_id, games_played, wins, losses, points, \
    rebounds, assists, steals, blocks, last_rating, salary, tokens_earned";

const GAME_COLUMNS: &str = "id, season_id, home_agent_id, away_agent_id, home_score, away_score, \
    narrative, event_type, mvp_agent_id, played_at";

const TOURNAMENT_COLUMNS: &str = "id, name, format, status, entry_fee, prize_pool, system_subsidy, \
    total_rounds, current_round, min_participants, max_participants, registration_deadline, \
    narrative, created_at, completed_at";

const PARTICIPANT_COLUMNS: &str = "tournament_id, agent_id, is_npc, nickname, wins, losses, draws, \
    score, bye_rounds, placement, tokens_won, seed";

const MATCH_COLUMNS: &str = "id, tournament_id, round, agent1_id, agent2_id, winner_id, \
    agent1_score, agent2_score, narrative, status";

/// League store backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap a migrated connection pool.
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    // -----------------------------------------------------------------------
    // Agents and ledger
    // -----------------------------------------------------------------------

    pub(crate) async fn insert_agent(&self, agent: &Agent) -> Result<(), DbError> {
        let a = &agent.attributes;
        let result = sqlx::query(
            r"INSERT INTO agents (id, nickname, is_npc, active, position, shooting, defense, speed, stamina, basketball_iq, passing, rebounding, luck_value, cognitive_score, life_vision, team, wins, losses, salary, token_balance, total_earned, total_spent, created_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23)
              ON CONFLICT (id) DO NOTHING",
        )
        .bind(agent.id.into_inner())
        .bind(&agent.nickname)
        .bind(agent.is_npc)
        .bind(agent.active)
        .bind(agent.position.as_str())
        .bind(small(a.shooting))
        .bind(small(a.defense))
        .bind(small(a.speed))
        .bind(small(a.stamina))
        .bind(small(a.basketball_iq))
        .bind(small(a.passing))
        .bind(small(a.rebounding))
        .bind(small(agent.luck_value))
        .bind(small(agent.cognitive_score))
        .bind(&agent.life_vision)
        .bind(&agent.team)
        .bind(int(agent.wins))
        .bind(int(agent.losses))
        .bind(agent.salary)
        .bind(agent.token_balance)
        .bind(agent.total_earned)
        .bind(agent.total_spent)
        .bind(agent.created_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::Conflict(format!("agent {} already exists", agent.id)));
        }
        Ok(())
    }

    pub(crate) async fn get_agent(&self, id: AgentId) -> Result<Option<Agent>, DbError> {
        let row = sqlx::query_as::<_, AgentRow>(&format!(
            "SELECT {AGENT_COLUMNS} FROM agents WHERE id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Agent::try_from).transpose()
    }

    pub(crate) async fn list_agents(&self) -> Result<Vec<Agent>, DbError> {
        let rows = sqlx::query_as::<_, AgentRow>(&format!(
            "SELECT {AGENT_COLUMNS} FROM agents ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        decode_all(rows)
    }

    pub(crate) async fn commit_postings(
        &self,
        agent_id: AgentId,
        entries: &[TokenTransaction],
        overdraft: Overdraft,
    ) -> Result<Vec<TokenTransaction>, DbError> {
        let mut tx = self.pool.begin().await?;
        let balance: Option<i64> =
            sqlx::query_scalar("SELECT token_balance FROM agents WHERE id = $1 FOR UPDATE")
                .bind(agent_id.into_inner())
                .fetch_optional(&mut *tx)
                .await?;
        let balance = balance.ok_or_else(|| DbError::NotFound(format!("agent {agent_id}")))?;

        let committed = rebase_postings(agent_id, balance, entries, overdraft)?;
        if committed.is_empty() {
            return Ok(committed);
        }
        let (earned, spent) = posting_totals(&committed);
        let closing = committed.last().map_or(balance, |e| e.balance_after);
        sqlx::query(
            r"UPDATE agents
              SET token_balance = $2, total_earned = total_earned + $3, total_spent = total_spent + $4
              WHERE id = $1",
        )
        .bind(agent_id.into_inner())
        .bind(closing)
        .bind(earned)
        .bind(spent)
        .execute(&mut *tx)
        .await?;
        insert_transactions(&mut tx, &committed).await?;
        tx.commit().await?;
        Ok(committed)
    }

    pub(crate) async fn record_game_result(
        &self,
        agent_id: AgentId,
        won: bool,
    ) -> Result<(), DbError> {
        let result =
            sqlx::query("UPDATE agents SET wins = wins + $2, losses = losses + $3 WHERE id = $1")
                .bind(agent_id.into_inner())
                .bind(i32::from(won))
                .bind(i32::from(!won))
                .execute(&self.pool)
                .await?;
        found(result.rows_affected(), agent_id)
    }

    pub(crate) async fn apply_training(
        &self,
        agent_id: AgentId,
        boosts: &[(Skill, u8)],
        cognitive_boost: u8,
    ) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "UPDATE agents SET cognitive_score = LEAST(cognitive_score + $2, $3) WHERE id = $1",
        )
        .bind(agent_id.into_inner())
        .bind(small(cognitive_boost))
        .bind(small(COGNITIVE_MAX))
        .execute(&mut *tx)
        .await?;
        found(result.rows_affected(), agent_id)?;

        for (skill, amount) in boosts {
            // Skill tags double as column names.
            let column = skill.as_str();
            sqlx::query(&format!(
                "UPDATE agents SET {column} = LEAST({column} + $2, $3) WHERE id = $1"
            ))
            .bind(agent_id.into_inner())
            .bind(small(*amount))
            .bind(small(SKILL_MAX))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub(crate) async fn set_agent_salary(
        &self,
        agent_id: AgentId,
        salary: i64,
    ) -> Result<(), DbError> {
        let result = sqlx::query("UPDATE agents SET salary = $2 WHERE id = $1")
            .bind(agent_id.into_inner())
            .bind(salary)
            .execute(&self.pool)
            .await?;
        found(result.rows_affected(), agent_id)
    }

    pub(crate) async fn assign_team(&self, agent_id: AgentId, team: &str) -> Result<bool, DbError> {
        let result = sqlx::query("UPDATE agents SET team = $2 WHERE id = $1 AND team IS NULL")
            .bind(agent_id.into_inner())
            .bind(team)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub(crate) async fn deactivate_agent(&self, agent_id: AgentId) -> Result<bool, DbError> {
        let result = sqlx::query("UPDATE agents SET active = FALSE WHERE id = $1 AND active")
            .bind(agent_id.into_inner())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub(crate) async fn list_transactions(
        &self,
        agent_id: AgentId,
    ) -> Result<Vec<TokenTransaction>, DbError> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r"SELECT id, agent_id, amount, balance_after, kind, description, reference_id, created_at
              FROM token_transactions
              WHERE agent_id = $1
              ORDER BY created_at, id",
        )
        .bind(agent_id.into_inner())
        .fetch_all(&self.pool)
        .await?;
        decode_all(rows)
    }

    // -----------------------------------------------------------------------
    // Seasons
    // -----------------------------------------------------------------------

    pub(crate) async fn insert_season(&self, season: &Season) -> Result<(), DbError> {
        let result = sqlx::query(
            r"INSERT INTO seasons (id, season_num, games_played, total_games, status, created_at, completed_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7)
              ON CONFLICT DO NOTHING",
        )
        .bind(season.id.into_inner())
        .bind(int(season.season_num))
        .bind(int(season.games_played))
        .bind(int(season.total_games))
        .bind(season.status.as_str())
        .bind(season.created_at)
        .bind(season.completed_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::Conflict(format!(
                "season {} collides with an existing season",
                season.season_num
            )));
        }
        Ok(())
    }

    pub(crate) async fn get_season(&self, id: SeasonId) -> Result<Option<Season>, DbError> {
        let row = sqlx::query_as::<_, SeasonRow>(&format!(
            "SELECT {SEASON_COLUMNS} FROM seasons WHERE id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Season::try_from).transpose()
    }

    pub(crate) async fn active_season(&self) -> Result<Option<Season>, DbError> {
        let row = sqlx::query_as::<_, SeasonRow>(&format!(
            "SELECT {SEASON_COLUMNS} FROM seasons WHERE status = $1 LIMIT 1"
        ))
        .bind(SeasonStatus::Active.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Season::try_from).transpose()
    }

    pub(crate) async fn latest_season_num(&self) -> Result<u32, DbError> {
        let latest: Option<i32> = sqlx::query_scalar("SELECT MAX(season_num) FROM seasons")
            .fetch_one(&self.pool)
            .await?;
        Ok(latest.and_then(|n| u32::try_from(n).ok()).unwrap_or(0))
    }

    pub(crate) async fn claim_season_game(&self, id: SeasonId) -> Result<Option<u32>, DbError> {
        let played: Option<i32> = sqlx::query_scalar(
            "UPDATE seasons SET games_played = games_played + 1
             WHERE id = $1 AND status = $2 AND games_played < total_games
             RETURNING games_played",
        )
        .bind(id.into_inner())
        .bind(SeasonStatus::Active.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(played.and_then(|n| u32::try_from(n).ok()))
    }

    pub(crate) async fn complete_season(&self, id: SeasonId) -> Result<bool, DbError> {
        let result = sqlx::query(
            "UPDATE seasons SET status = $3, completed_at = NOW() WHERE id = $1 AND status = $2",
        )
        .bind(id.into_inner())
        .bind(SeasonStatus::Active.as_str())
        .bind(SeasonStatus::Completed.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub(crate) async fn open_season_stats(&self, stats: &SeasonStats) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO season_stats (season_id, agent_id, salary)
              VALUES ($1, $2, $3)
              ON CONFLICT (season_id, agent_id) DO UPDATE SET salary = EXCLUDED.salary",
        )
        .bind(stats.season_id.into_inner())
        .bind(stats.agent_id.into_inner())
        .bind(stats.salary)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub(crate) async fn record_season_game(
        &self,
        season_id: SeasonId,
        agent_id: AgentId,
        salary: i64,
        b: &BoxScore,
        won: bool,
    ) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO season_stats (season_id, agent_id, games_played, wins, losses, points, rebounds, assists, steals, blocks, last_rating, salary)
              VALUES ($1, $2, 1, $3, $4, $5, $6, $7, $8, $9, $10, $11)
              ON CONFLICT (season_id, agent_id) DO UPDATE SET
                games_played = season_stats.games_played + 1,
                wins = season_stats.wins + EXCLUDED.wins,
                losses = season_stats.losses + EXCLUDED.losses,
                points = season_stats.points + EXCLUDED.points,
                rebounds = season_stats.rebounds + EXCLUDED.rebounds,
                assists = season_stats.assists + EXCLUDED.assists,
                steals = season_stats.steals + EXCLUDED.steals,
                blocks = season_stats.blocks + EXCLUDED.blocks,
                last_rating = EXCLUDED.last_rating",
        )
        .bind(season_id.into_inner())
        .bind(agent_id.into_inner())
        .bind(i32::from(won))
        .bind(i32::from(!won))
        .bind(int(b.points))
        .bind(int(b.rebounds))
        .bind(int(b.assists))
        .bind(int(b.steals))
        .bind(int(b.blocks))
        .bind(small(b.rating))
        .bind(salary)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub(crate) async fn set_season_tokens_earned(
        &self,
        season_id: SeasonId,
        agent_id: AgentId,
        tokens: i64,
    ) -> Result<(), DbError> {
        sqlx::query(
            "UPDATE season_stats SET tokens_earned = $3 WHERE season_id = $1 AND agent_id = $2",
        )
        .bind(season_id.into_inner())
        .bind(agent_id.into_inner())
        .bind(tokens)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub(crate) async fn get_season_stats(
        &self,
        season_id: SeasonId,
        agent_id: AgentId,
    ) -> Result<Option<SeasonStats>, DbError> {
        let row = sqlx::query_as::<_, SeasonStatsRow>(&format!(
            "SELECT {SEASON_STATS_COLUMNS} FROM season_stats WHERE season_id = $1 AND agent_id = $2"
        ))
        .bind(season_id.into_inner())
        .bind(agent_id.into_inner())
        .fetch_optional(&self.pool)
        .await?;
        row.map(SeasonStats::try_from).transpose()
    }

    pub(crate) async fn list_season_stats(
        &self,
        season_id: SeasonId,
    ) -> Result<Vec<SeasonStats>, DbError> {
        let rows = sqlx::query_as::<_, SeasonStatsRow>(&format!(
            "SELECT {SEASON_STATS_COLUMNS} FROM season_stats WHERE season_id = $1 ORDER BY agent_id"
        ))
        .bind(season_id.into_inner())
        .fetch_all(&self.pool)
        .await?;
        decode_all(rows)
    }

    // -----------------------------------------------------------------------
    // Games
    // -----------------------------------------------------------------------

    pub(crate) async fn insert_game(&self, game: &Game, stats: &[GameStats]) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r"INSERT INTO games (id, season_id, home_agent_id, away_agent_id, home_score, away_score, narrative, event_type, mvp_agent_id, played_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(game.id.into_inner())
        .bind(game.season_id.into_inner())
        .bind(game.home_agent_id.into_inner())
        .bind(game.away_agent_id.into_inner())
        .bind(int(game.home_score))
        .bind(int(game.away_score))
        .bind(&game.narrative)
        .bind(game.event_type.as_str())
        .bind(game.mvp_agent_id.into_inner())
        .bind(game.played_at)
        .execute(&mut *tx)
        .await?;

        for line in stats {
            let b = &line.box_score;
            sqlx::query(
                r"INSERT INTO game_stats (game_id, agent_id, won, minutes, points, rebounds, assists, steals, blocks, turnovers, rating)
                  VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
            )
            .bind(line.game_id.into_inner())
            .bind(line.agent_id.into_inner())
            .bind(line.won)
            .bind(int(b.minutes))
            .bind(int(b.points))
            .bind(int(b.rebounds))
            .bind(int(b.assists))
            .bind(int(b.steals))
            .bind(int(b.blocks))
            .bind(int(b.turnovers))
            .bind(small(b.rating))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub(crate) async fn list_games(&self, season_id: SeasonId) -> Result<Vec<Game>, DbError> {
        let rows = sqlx::query_as::<_, GameRow>(&format!(
            "SELECT {GAME_COLUMNS} FROM games WHERE season_id = $1 ORDER BY played_at, id"
        ))
        .bind(season_id.into_inner())
        .fetch_all(&self.pool)
        .await?;
        decode_all(rows)
    }

    pub(crate) async fn get_game(&self, id: GameId) -> Result<Option<Game>, DbError> {
        let row = sqlx::query_as::<_, GameRow>(&format!(
            "SELECT {GAME_COLUMNS} FROM games WHERE id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Game::try_from).transpose()
    }

    pub(crate) async fn recent_game_stats(
        &self,
        agent_id: AgentId,
        limit: usize,
    ) -> Result<Vec<GameStats>, DbError> {
        let rows = sqlx::query_as::<_, GameStatsRow>(
            r"SELECT s.game_id, s.agent_id, s.won, s.minutes, s.points, s.rebounds, s.assists, s.steals, s.blocks, s.turnovers, s.rating
              FROM game_stats s
              JOIN games g ON g.id = s.game_id
              WHERE s.agent_id = $1
              ORDER BY g.played_at DESC, g.id DESC
              LIMIT $2",
        )
        .bind(agent_id.into_inner())
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;
        decode_all(rows)
    }

    pub(crate) async fn insert_interactions(
        &self,
        lines: &[GameInteraction],
    ) -> Result<(), DbError> {
        if lines.is_empty() {
            return Ok(());
        }
        let len = lines.len();
        let mut ids = Vec::with_capacity(len);
        let mut game_ids = Vec::with_capacity(len);
        let mut agent_ids = Vec::with_capacity(len);
        let mut phases = Vec::with_capacity(len);
        let mut contents = Vec::with_capacity(len);
        let mut timestamps = Vec::with_capacity(len);
        for line in lines {
            ids.push(line.id.into_inner());
            game_ids.push(line.game_id.into_inner());
            agent_ids.push(line.agent_id.into_inner());
            phases.push(line.phase.as_str().to_owned());
            contents.push(line.content.clone());
            timestamps.push(line.created_at);
        }

        sqlx::query(
            r"INSERT INTO game_interactions (id, game_id, agent_id, phase, content, created_at)
              SELECT * FROM UNNEST($1::UUID[], $2::UUID[], $3::UUID[], $4::TEXT[], $5::TEXT[], $6::TIMESTAMPTZ[])",
        )
        .bind(&ids)
        .bind(&game_ids)
        .bind(&agent_ids)
        .bind(&phases)
        .bind(&contents)
        .bind(&timestamps)
        .execute(&self.pool)
        .await?;

        tracing::debug!(count = len, "Inserted game interactions");
        Ok(())
    }

    pub(crate) async fn list_interactions(
        &self,
        game_id: GameId,
    ) -> Result<Vec<GameInteraction>, DbError> {
        let rows = sqlx::query_as::<_, InteractionRow>(
            r"SELECT id, game_id, agent_id, phase, content, created_at
              FROM game_interactions
              WHERE game_id = $1
              ORDER BY created_at, id",
        )
        .bind(game_id.into_inner())
        .fetch_all(&self.pool)
        .await?;
        decode_all(rows)
    }

    pub(crate) async fn insert_reaction(&self, reaction: &Reaction) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO reactions
                (id, game_id, interaction_id, from_agent_id, to_agent_id, kind, message, source, created_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(reaction.id.into_inner())
        .bind(reaction.game_id.into_inner())
        .bind(reaction.interaction_id.map(InteractionId::into_inner))
        .bind(reaction.from_agent_id.into_inner())
        .bind(reaction.to_agent_id.into_inner())
        .bind(reaction.kind.as_str())
        .bind(reaction.message.as_deref())
        .bind(reaction.source.as_str())
        .bind(reaction.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub(crate) async fn list_reactions(&self, game_id: GameId) -> Result<Vec<Reaction>, DbError> {
        let rows = sqlx::query_as::<_, ReactionRow>(
            r"SELECT id, game_id, interaction_id, from_agent_id, to_agent_id, kind, message, source, created_at
              FROM reactions
              WHERE game_id = $1
              ORDER BY created_at, id",
        )
        .bind(game_id.into_inner())
        .fetch_all(&self.pool)
        .await?;
        decode_all(rows)
    }

    // -----------------------------------------------------------------------
    // Timeline
    // -----------------------------------------------------------------------

    pub(crate) async fn insert_activity(&self, entry: &ActivityLog) -> Result<(), DbError> {
        sqlx::query(
            "INSERT INTO activity_logs (id, agent_id, kind, content, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(entry.id.into_inner())
        .bind(entry.agent_id.into_inner())
        .bind(entry.kind.as_str())
        .bind(&entry.content)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub(crate) async fn list_activity(&self, agent_id: AgentId) -> Result<Vec<ActivityLog>, DbError> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            r"SELECT id, agent_id, kind, content, created_at
              FROM activity_logs
              WHERE agent_id = $1
              ORDER BY created_at, id",
        )
        .bind(agent_id.into_inner())
        .fetch_all(&self.pool)
        .await?;
        decode_all(rows)
    }

    pub(crate) async fn insert_reflection(&self, reflection: &Reflection) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO reflections (id, agent_id, content, focus, primary_skill, primary_amount, secondary_skill, secondary_amount, cognitive_boost, summary, advice, created_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(reflection.id.into_inner())
        .bind(reflection.agent_id.into_inner())
        .bind(&reflection.content)
        .bind(reflection.focus.map(Skill::as_str))
        .bind(reflection.primary_skill.as_str())
        .bind(small(reflection.primary_amount))
        .bind(reflection.secondary_skill.map(Skill::as_str))
        .bind(small(reflection.secondary_amount))
        .bind(small(reflection.cognitive_boost))
        .bind(&reflection.summary)
        .bind(&reflection.advice)
        .bind(reflection.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Tournaments
    // -----------------------------------------------------------------------

    pub(crate) async fn insert_tournament(&self, t: &Tournament) -> Result<(), DbError> {
        let result = sqlx::query(
            r"INSERT INTO tournaments (id, name, format, status, entry_fee, prize_pool, system_subsidy, total_rounds, current_round, min_participants, max_participants, registration_deadline, narrative, created_at, completed_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
              ON CONFLICT DO NOTHING",
        )
        .bind(t.id.into_inner())
        .bind(&t.name)
        .bind(t.format.as_str())
        .bind(t.status.as_str())
        .bind(t.entry_fee)
        .bind(t.prize_pool)
        .bind(t.system_subsidy)
        .bind(int(t.total_rounds))
        .bind(int(t.current_round))
        .bind(int(t.min_participants))
        .bind(int(t.max_participants))
        .bind(t.registration_deadline)
        .bind(&t.narrative)
        .bind(t.created_at)
        .bind(t.completed_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::Conflict(format!(
                "tournament {} collides with an existing or running tournament",
                t.id
            )));
        }
        Ok(())
    }

    pub(crate) async fn count_tournaments(&self) -> Result<u32, DbError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tournaments")
            .fetch_one(&self.pool)
            .await?;
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    pub(crate) async fn get_tournament(
        &self,
        id: TournamentId,
    ) -> Result<Option<Tournament>, DbError> {
        let row = sqlx::query_as::<_, TournamentRow>(&format!(
            "SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Tournament::try_from).transpose()
    }

    pub(crate) async fn active_tournament(&self) -> Result<Option<Tournament>, DbError> {
        let row = sqlx::query_as::<_, TournamentRow>(&format!(
            "SELECT {TOURNAMENT_COLUMNS} FROM tournaments
             WHERE status NOT IN ($1, $2)
             ORDER BY created_at
             LIMIT 1"
        ))
        .bind(TournamentStatus::Completed.as_str())
        .bind(TournamentStatus::Cancelled.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Tournament::try_from).transpose()
    }

    pub(crate) async fn latest_tournament(&self) -> Result<Option<Tournament>, DbError> {
        let row = sqlx::query_as::<_, TournamentRow>(&format!(
            "SELECT {TOURNAMENT_COLUMNS} FROM tournaments ORDER BY created_at DESC LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;
        row.map(Tournament::try_from).transpose()
    }

    pub(crate) async fn enroll_participant(
        &self,
        p: &TournamentParticipant,
        contribution: i64,
    ) -> Result<bool, DbError> {
        let mut tx = self.pool.begin().await?;
        let inserted = sqlx::query(
            r"INSERT INTO tournament_participants (tournament_id, agent_id, is_npc, nickname, wins, losses, draws, score, bye_rounds, placement, tokens_won, seed)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
              ON CONFLICT (tournament_id, agent_id) DO NOTHING",
        )
        .bind(p.tournament_id.into_inner())
        .bind(p.agent_id.into_inner())
        .bind(p.is_npc)
        .bind(&p.nickname)
        .bind(int(p.wins))
        .bind(int(p.losses))
        .bind(int(p.draws))
        .bind(int(p.score))
        .bind(p.bye_rounds.iter().copied().map(int).collect::<Vec<_>>())
        .bind(p.placement.map(int))
        .bind(p.tokens_won)
        .bind(int(p.seed))
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query("UPDATE tournaments SET prize_pool = prize_pool + $2 WHERE id = $1")
            .bind(p.tournament_id.into_inner())
            .bind(contribution)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    pub(crate) async fn list_participants(
        &self,
        tournament_id: TournamentId,
    ) -> Result<Vec<TournamentParticipant>, DbError> {
        let rows = sqlx::query_as::<_, ParticipantRow>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM tournament_participants
             WHERE tournament_id = $1
             ORDER BY seed"
        ))
        .bind(tournament_id.into_inner())
        .fetch_all(&self.pool)
        .await?;
        decode_all(rows)
    }

    pub(crate) async fn transition_tournament(
        &self,
        id: TournamentId,
        from: TournamentStatus,
        to: TournamentStatus,
    ) -> Result<bool, DbError> {
        if !from.can_transition_to(to) {
            return Ok(false);
        }
        let result = sqlx::query(
            r"UPDATE tournaments
              SET status = $3, completed_at = CASE WHEN $4 THEN NOW() ELSE completed_at END
              WHERE id = $1 AND status = $2",
        )
        .bind(id.into_inner())
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(to.is_terminal())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub(crate) async fn start_round(&self, start: &RoundStart) -> Result<bool, DbError> {
        let mut tx = self.pool.begin().await?;
        let advanced = sqlx::query(
            r"UPDATE tournaments SET current_round = $3
              WHERE id = $1 AND status = $4 AND current_round = $2 AND $3 <= total_rounds",
        )
        .bind(start.tournament_id.into_inner())
        .bind(int(start.from_round))
        .bind(int(start.to_round))
        .bind(TournamentStatus::InProgress.as_str())
        .execute(&mut *tx)
        .await?;

        if advanced.rows_affected() == 0 {
            return Ok(false);
        }

        for m in &start.matches {
            insert_match(&mut tx, m).await?;
        }

        let bye_ids: Vec<Uuid> = start.byes.iter().copied().map(AgentId::into_inner).collect();
        if !bye_ids.is_empty() {
            sqlx::query(
                r"UPDATE tournament_participants
                  SET bye_rounds = array_append(bye_rounds, $2), wins = wins + 1, score = score + $4
                  WHERE tournament_id = $1 AND agent_id = ANY($3) AND NOT ($2 = ANY(bye_rounds))",
            )
            .bind(start.tournament_id.into_inner())
            .bind(int(start.to_round))
            .bind(&bye_ids)
            .bind(int(MatchOutcome::Win.points()))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    pub(crate) async fn list_matches(
        &self,
        tournament_id: TournamentId,
    ) -> Result<Vec<TournamentMatch>, DbError> {
        let rows = sqlx::query_as::<_, MatchRow>(&format!(
            "SELECT {MATCH_COLUMNS} FROM tournament_matches
             WHERE tournament_id = $1
             ORDER BY round, id"
        ))
        .bind(tournament_id.into_inner())
        .fetch_all(&self.pool)
        .await?;
        decode_all(rows)
    }

    pub(crate) async fn complete_match(&self, result: &MatchResult) -> Result<bool, DbError> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, MatchRow>(&format!(
            "UPDATE tournament_matches
             SET status = $2, winner_id = $3, agent1_score = $4, agent2_score = $5, narrative = $6
             WHERE id = $1 AND status = $7
             RETURNING {MATCH_COLUMNS}"
        ))
        .bind(result.match_id.into_inner())
        .bind(MatchStatus::Completed.as_str())
        .bind(result.winner_id.map(AgentId::into_inner))
        .bind(int(result.agent1_score))
        .bind(int(result.agent2_score))
        .bind(&result.narrative)
        .bind(MatchStatus::Pending.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(false);
        };
        let played = TournamentMatch::try_from(row)?;
        let first = result.outcome_for_first(&played);
        let sides = [
            (played.agent1_id, first),
            (played.agent2_id, first.flipped()),
        ];
        for (agent_id, outcome) in sides {
            let (win, draw, loss) = match outcome {
                MatchOutcome::Win => (1, 0, 0),
                MatchOutcome::Draw => (0, 1, 0),
                MatchOutcome::Loss => (0, 0, 1),
            };
            sqlx::query(
                r"UPDATE tournament_participants
                  SET wins = wins + $3, draws = draws + $4, losses = losses + $5, score = score + $6
                  WHERE tournament_id = $1 AND agent_id = $2",
            )
            .bind(played.tournament_id.into_inner())
            .bind(agent_id.into_inner())
            .bind(win)
            .bind(draw)
            .bind(loss)
            .bind(int(outcome.points()))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    pub(crate) async fn finalize_participant(
        &self,
        tournament_id: TournamentId,
        agent_id: AgentId,
        placement: u32,
        tokens_won: i64,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            r"UPDATE tournament_participants SET placement = $3, tokens_won = $4
              WHERE tournament_id = $1 AND agent_id = $2 AND placement IS NULL",
        )
        .bind(tournament_id.into_inner())
        .bind(agent_id.into_inner())
        .bind(int(placement))
        .bind(tokens_won)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub(crate) async fn set_tournament_narrative(
        &self,
        id: TournamentId,
        narrative: &str,
    ) -> Result<bool, DbError> {
        let result = sqlx::query("UPDATE tournaments SET narrative = $2 WHERE id = $1")
            .bind(id.into_inner())
            .bind(narrative)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// `NotFound` when an agent update touched no row.
fn found(rows_affected: u64, agent_id: AgentId) -> Result<(), DbError> {
    if rows_affected == 0 {
        return Err(DbError::NotFound(format!("agent {agent_id}")));
    }
    Ok(())
}

async fn insert_transactions(
    tx: &mut Transaction<'_, Postgres>,
    entries: &[TokenTransaction],
) -> Result<(), DbError> {
    if entries.is_empty() {
        return Ok(());
    }
    let len = entries.len();
    let mut ids = Vec::with_capacity(len);
    let mut agent_ids = Vec::with_capacity(len);
    let mut amounts = Vec::with_capacity(len);
    let mut balances = Vec::with_capacity(len);
    let mut kinds = Vec::with_capacity(len);
    let mut descriptions = Vec::with_capacity(len);
    let mut reference_ids: Vec<Option<Uuid>> = Vec::with_capacity(len);
    let mut timestamps = Vec::with_capacity(len);
    for entry in entries {
        ids.push(entry.id.into_inner());
        agent_ids.push(entry.agent_id.into_inner());
        amounts.push(entry.amount);
        balances.push(entry.balance_after);
        kinds.push(entry.kind.as_str().to_owned());
        descriptions.push(entry.description.clone());
        reference_ids.push(entry.reference_id);
        timestamps.push(entry.created_at);
    }

    sqlx::query(
        r"INSERT INTO token_transactions (id, agent_id, amount, balance_after, kind, description, reference_id, created_at)
          SELECT * FROM UNNEST($1::UUID[], $2::UUID[], $3::BIGINT[], $4::BIGINT[], $5::TEXT[], $6::TEXT[], $7::UUID[], $8::TIMESTAMPTZ[])",
    )
    .bind(&ids)
    .bind(&agent_ids)
    .bind(&amounts)
    .bind(&balances)
    .bind(&kinds)
    .bind(&descriptions)
    .bind(&reference_ids)
    .bind(&timestamps)
    .execute(&mut **tx)
    .await?;

    tracing::debug!(count = len, "Inserted ledger entries");
    Ok(())
}

async fn insert_match(
    tx: &mut Transaction<'_, Postgres>,
    m: &TournamentMatch,
) -> Result<(), DbError> {
    sqlx::query(
        r"INSERT INTO tournament_matches (id, tournament_id, round, agent1_id, agent2_id, winner_id, agent1_score, agent2_score, narrative, status)
          VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(m.id.into_inner())
    .bind(m.tournament_id.into_inner())
    .bind(int(m.round))
    .bind(m.agent1_id.into_inner())
    .bind(m.agent2_id.into_inner())
    .bind(m.winner_id.map(AgentId::into_inner))
    .bind(int(m.agent1_score))
    .bind(int(m.agent2_score))
    .bind(&m.narrative)
    .bind(m.status.as_str())
    .execute(&mut **tx)
    .await?;
    Ok(())
}
