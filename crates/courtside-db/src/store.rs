//! The league store facade.
//!
//! [`LeagueStore`] dispatches every operation to either the in-memory store
//! or the `PostgreSQL` store. Both backends honor the same contract: the
//! operations returning `bool` are compare-and-set transitions that report
//! whether this caller won, and a caller that loses performs no side
//! effects. That is what keeps a doubled scheduler tick from paying anyone
//! twice.

use courtside_types::{
    ActivityLog, Agent, AgentId, BoxScore, Game, GameId, GameInteraction, GameStats, MatchId,
    MatchOutcome, Reaction, Reflection, Season, SeasonId, SeasonStats, Skill, TokenTransaction, Tournament,
    TournamentId, TournamentMatch, TournamentParticipant, TournamentStatus,
};

use crate::error::DbError;
use crate::memory::MemoryStore;
use crate::pg_store::PgStore;

// ---------------------------------------------------------------------------
// Operation inputs
// ---------------------------------------------------------------------------

/// Everything needed to open a tournament round in one step.
#[derive(Debug, Clone)]
pub struct RoundStart {
    /// Tournament being advanced.
    pub tournament_id: TournamentId,
    /// Round the tournament must currently be on.
    pub from_round: u32,
    /// Round being opened.
    pub to_round: u32,
    /// Pending pairings for the new round.
    pub matches: Vec<TournamentMatch>,
    /// Participants sitting the round out, each credited a win.
    pub byes: Vec<AgentId>,
}

/// The result of a played tournament match.
#[derive(Debug, Clone)]
pub struct MatchResult {
    /// Match being completed.
    pub match_id: MatchId,
    /// Winner, or `None` for a draw.
    pub winner_id: Option<AgentId>,
    /// Final score of the first-listed agent.
    pub agent1_score: u32,
    /// Final score of the second-listed agent.
    pub agent2_score: u32,
    /// One-line match summary.
    pub narrative: String,
}

impl MatchResult {
    /// Outcome of `m` from its first-listed agent's point of view.
    pub fn outcome_for_first(&self, m: &TournamentMatch) -> MatchOutcome {
        match self.winner_id {
            Some(winner) if winner == m.agent1_id => MatchOutcome::Win,
            Some(_) => MatchOutcome::Loss,
            None => MatchOutcome::Draw,
        }
    }
}

/// How [`LeagueStore::commit_postings`] treats a debit larger than the
/// live balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overdraft {
    /// Shrink the debit to what the agent holds. Playing costs use this.
    Cap,
    /// Refuse the whole batch. Entry fees use this.
    Reject,
}

/// Re-apply `entries` on top of `balance`: recompute every snapshot, cap or
/// refuse debits that would go negative, and drop debits capped to zero.
pub(crate) fn rebase_postings(
    agent_id: AgentId,
    mut balance: i64,
    entries: &[TokenTransaction],
    overdraft: Overdraft,
) -> Result<Vec<TokenTransaction>, DbError> {
    let mut committed = Vec::with_capacity(entries.len());
    for entry in entries {
        let mut amount = entry.amount;
        if amount.is_negative() && balance.checked_add(amount).is_none_or(i64::is_negative) {
            match overdraft {
                Overdraft::Cap => amount = 0_i64.saturating_sub(balance.max(0)),
                Overdraft::Reject => {
                    return Err(DbError::InsufficientBalance(format!(
                        "agent {agent_id} holds {balance}, needs {}",
                        amount.unsigned_abs()
                    )));
                }
            }
        }
        if amount == 0 {
            continue;
        }
        balance = balance
            .checked_add(amount)
            .ok_or_else(|| DbError::Conflict(format!("agent {agent_id} balance overflow")))?;
        committed.push(TokenTransaction {
            amount,
            balance_after: balance,
            ..entry.clone()
        });
    }
    Ok(committed)
}

/// Lifetime `(earned, spent)` added by committed entries.
pub(crate) fn posting_totals(entries: &[TokenTransaction]) -> (i64, i64) {
    entries.iter().fold((0_i64, 0_i64), |(earned, spent), e| {
        if e.amount.is_positive() {
            (earned.saturating_add(e.amount), spent)
        } else {
            (earned, spent.saturating_sub(e.amount))
        }
    })
}

// ---------------------------------------------------------------------------
// Facade
// ---------------------------------------------------------------------------

/// Persistence backend for the whole league.
#[derive(Debug)]
pub enum LeagueStore {
    /// Process-local tables, lost on exit.
    Memory(MemoryStore),
    /// Durable tables in `PostgreSQL`.
    Postgres(PgStore),
}

impl LeagueStore {
    /// An empty in-memory store.
    pub fn memory() -> Self {
        Self::Memory(MemoryStore::new())
    }

    /// A store over a migrated `PostgreSQL` pool.
    pub const fn postgres(pool: sqlx::PgPool) -> Self {
        Self::Postgres(PgStore::new(pool))
    }

    /// Short backend name for logs and health output.
    pub const fn backend_name(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Postgres(_) => "postgres",
        }
    }

    // -----------------------------------------------------------------------
    // Agents and ledger
    // -----------------------------------------------------------------------

    /// Insert a newly registered agent.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Conflict`] if the id is taken, or a backend error.
    pub async fn insert_agent(&self, agent: &Agent) -> Result<(), DbError> {
        match self {
            Self::Memory(m) => m.insert_agent(agent),
            Self::Postgres(p) => p.insert_agent(agent).await,
        }
    }

    /// Fetch one agent.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the read fails.
    pub async fn get_agent(&self, id: AgentId) -> Result<Option<Agent>, DbError> {
        match self {
            Self::Memory(m) => Ok(m.get_agent(id)),
            Self::Postgres(p) => p.get_agent(id).await,
        }
    }

    /// Every agent in registration order.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the read fails.
    pub async fn list_agents(&self) -> Result<Vec<Agent>, DbError> {
        match self {
            Self::Memory(m) => Ok(m.list_agents()),
            Self::Postgres(p) => p.list_agents().await,
        }
    }

    /// Apply ledger entries to an agent's live balance and append them, as
    /// one atomic step. Each entry's `balance_after` is recomputed against
    /// the stored balance, so entries built from a stale snapshot still
    /// land correctly. Returns the entries as committed; a debit capped to
    /// nothing is left out.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] for an unknown agent,
    /// [`DbError::InsufficientBalance`] when [`Overdraft::Reject`] refuses a
    /// debit (nothing is applied), or a backend error.
    pub async fn commit_postings(
        &self,
        agent_id: AgentId,
        entries: &[TokenTransaction],
        overdraft: Overdraft,
    ) -> Result<Vec<TokenTransaction>, DbError> {
        match self {
            Self::Memory(m) => m.commit_postings(agent_id, entries, overdraft),
            Self::Postgres(p) => p.commit_postings(agent_id, entries, overdraft).await,
        }
    }

    /// Add one win or one loss to an agent's career record.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] for an unknown agent, or a backend
    /// error.
    pub async fn record_game_result(&self, agent_id: AgentId, won: bool) -> Result<(), DbError> {
        match self {
            Self::Memory(m) => m.record_game_result(agent_id, won),
            Self::Postgres(p) => p.record_game_result(agent_id, won).await,
        }
    }

    /// Raise skills and cognition in place, clamped at their ceilings.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] for an unknown agent, or a backend
    /// error.
    pub async fn apply_training(
        &self,
        agent_id: AgentId,
        boosts: &[(Skill, u8)],
        cognitive_boost: u8,
    ) -> Result<(), DbError> {
        match self {
            Self::Memory(m) => m.apply_training(agent_id, boosts, cognitive_boost),
            Self::Postgres(p) => p.apply_training(agent_id, boosts, cognitive_boost).await,
        }
    }

    /// Set an agent's salary.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] for an unknown agent, or a backend
    /// error.
    pub async fn set_agent_salary(&self, agent_id: AgentId, salary: i64) -> Result<(), DbError> {
        match self {
            Self::Memory(m) => m.set_agent_salary(agent_id, salary),
            Self::Postgres(p) => p.set_agent_salary(agent_id, salary).await,
        }
    }

    /// Put a free agent on `team`. `false` if the agent already has one.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the write fails.
    pub async fn assign_team(&self, agent_id: AgentId, team: &str) -> Result<bool, DbError> {
        match self {
            Self::Memory(m) => Ok(m.assign_team(agent_id, team)),
            Self::Postgres(p) => p.assign_team(agent_id, team).await,
        }
    }

    /// Mark an agent inactive. `false` if it already was, or is unknown.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the write fails.
    pub async fn deactivate_agent(&self, agent_id: AgentId) -> Result<bool, DbError> {
        match self {
            Self::Memory(m) => Ok(m.deactivate_agent(agent_id)),
            Self::Postgres(p) => p.deactivate_agent(agent_id).await,
        }
    }

    /// An agent's ledger, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the read fails.
    pub async fn list_transactions(
        &self,
        agent_id: AgentId,
    ) -> Result<Vec<TokenTransaction>, DbError> {
        match self {
            Self::Memory(m) => Ok(m.list_transactions(agent_id)),
            Self::Postgres(p) => p.list_transactions(agent_id).await,
        }
    }

    // -----------------------------------------------------------------------
    // Seasons
    // -----------------------------------------------------------------------

    /// Insert a season.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Conflict`] if the number is taken or another
    /// season is already active.
    pub async fn insert_season(&self, season: &Season) -> Result<(), DbError> {
        match self {
            Self::Memory(m) => m.insert_season(season),
            Self::Postgres(p) => p.insert_season(season).await,
        }
    }

    /// Fetch one season.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the read fails.
    pub async fn get_season(&self, id: SeasonId) -> Result<Option<Season>, DbError> {
        match self {
            Self::Memory(m) => Ok(m.get_season(id)),
            Self::Postgres(p) => p.get_season(id).await,
        }
    }

    /// The single active season, if any.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the read fails.
    pub async fn active_season(&self) -> Result<Option<Season>, DbError> {
        match self {
            Self::Memory(m) => Ok(m.active_season()),
            Self::Postgres(p) => p.active_season().await,
        }
    }

    /// Highest season number ever created, `0` when none exist.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the read fails.
    pub async fn latest_season_num(&self) -> Result<u32, DbError> {
        match self {
            Self::Memory(m) => Ok(m.latest_season_num()),
            Self::Postgres(p) => p.latest_season_num().await,
        }
    }

    /// Reserve the next game slot of an active season. Returns the claimed
    /// game number, or `None` once the season is full or no longer active.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the write fails.
    pub async fn claim_season_game(&self, id: SeasonId) -> Result<Option<u32>, DbError> {
        match self {
            Self::Memory(m) => Ok(m.claim_season_game(id)),
            Self::Postgres(p) => p.claim_season_game(id).await,
        }
    }

    /// Move an active season to completed. `true` only for the caller that
    /// made the move.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the write fails.
    pub async fn complete_season(&self, id: SeasonId) -> Result<bool, DbError> {
        match self {
            Self::Memory(m) => Ok(m.complete_season(id)),
            Self::Postgres(p) => p.complete_season(id).await,
        }
    }

    /// Open an agent's season line at `stats.salary`. A line that already
    /// exists keeps its totals and only takes the salary.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the write fails.
    pub async fn open_season_stats(&self, stats: &SeasonStats) -> Result<(), DbError> {
        match self {
            Self::Memory(m) => {
                m.open_season_stats(stats);
                Ok(())
            }
            Self::Postgres(p) => p.open_season_stats(stats).await,
        }
    }

    /// Fold one game into an agent's season line, opening it at `salary`
    /// if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the write fails.
    pub async fn record_season_game(
        &self,
        season_id: SeasonId,
        agent_id: AgentId,
        salary: i64,
        box_score: &BoxScore,
        won: bool,
    ) -> Result<(), DbError> {
        match self {
            Self::Memory(m) => {
                m.record_season_game(season_id, agent_id, salary, box_score, won);
                Ok(())
            }
            Self::Postgres(p) => {
                p.record_season_game(season_id, agent_id, salary, box_score, won)
                    .await
            }
        }
    }

    /// Record what an agent was paid at season settlement.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the write fails.
    pub async fn set_season_tokens_earned(
        &self,
        season_id: SeasonId,
        agent_id: AgentId,
        tokens: i64,
    ) -> Result<(), DbError> {
        match self {
            Self::Memory(m) => {
                m.set_season_tokens_earned(season_id, agent_id, tokens);
                Ok(())
            }
            Self::Postgres(p) => p.set_season_tokens_earned(season_id, agent_id, tokens).await,
        }
    }

    /// One agent's season line.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the read fails.
    pub async fn get_season_stats(
        &self,
        season_id: SeasonId,
        agent_id: AgentId,
    ) -> Result<Option<SeasonStats>, DbError> {
        match self {
            Self::Memory(m) => Ok(m.get_season_stats(season_id, agent_id)),
            Self::Postgres(p) => p.get_season_stats(season_id, agent_id).await,
        }
    }

    /// Every season line for a season.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the read fails.
    pub async fn list_season_stats(&self, season_id: SeasonId) -> Result<Vec<SeasonStats>, DbError> {
        match self {
            Self::Memory(m) => Ok(m.list_season_stats(season_id)),
            Self::Postgres(p) => p.list_season_stats(season_id).await,
        }
    }

    // -----------------------------------------------------------------------
    // Games
    // -----------------------------------------------------------------------

    /// Insert a played game together with both box-score lines.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the write fails.
    pub async fn insert_game(&self, game: &Game, stats: &[GameStats]) -> Result<(), DbError> {
        match self {
            Self::Memory(m) => {
                m.insert_game(game, stats);
                Ok(())
            }
            Self::Postgres(p) => p.insert_game(game, stats).await,
        }
    }

    /// Games of a season in play order.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the read fails.
    pub async fn list_games(&self, season_id: SeasonId) -> Result<Vec<Game>, DbError> {
        match self {
            Self::Memory(m) => Ok(m.list_games(season_id)),
            Self::Postgres(p) => p.list_games(season_id).await,
        }
    }

    /// Look up one game.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the read fails.
    pub async fn get_game(&self, id: GameId) -> Result<Option<Game>, DbError> {
        match self {
            Self::Memory(m) => Ok(m.get_game(id)),
            Self::Postgres(p) => p.get_game(id).await,
        }
    }

    /// An agent's most recent box-score lines, newest first.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the read fails.
    pub async fn recent_game_stats(
        &self,
        agent_id: AgentId,
        limit: usize,
    ) -> Result<Vec<GameStats>, DbError> {
        match self {
            Self::Memory(m) => Ok(m.recent_game_stats(agent_id, limit)),
            Self::Postgres(p) => p.recent_game_stats(agent_id, limit).await,
        }
    }

    /// Store generated dialogue lines.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the write fails.
    pub async fn insert_interactions(&self, lines: &[GameInteraction]) -> Result<(), DbError> {
        match self {
            Self::Memory(m) => {
                m.insert_interactions(lines);
                Ok(())
            }
            Self::Postgres(p) => p.insert_interactions(lines).await,
        }
    }

    /// Dialogue lines of one game.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the read fails.
    pub async fn list_interactions(&self, game_id: GameId) -> Result<Vec<GameInteraction>, DbError> {
        match self {
            Self::Memory(m) => Ok(m.list_interactions(game_id)),
            Self::Postgres(p) => p.list_interactions(game_id).await,
        }
    }

    /// Store one reaction.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the write fails.
    pub async fn insert_reaction(&self, reaction: &Reaction) -> Result<(), DbError> {
        match self {
            Self::Memory(m) => {
                m.insert_reaction(reaction);
                Ok(())
            }
            Self::Postgres(p) => p.insert_reaction(reaction).await,
        }
    }

    /// Reactions around one game, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the read fails.
    pub async fn list_reactions(&self, game_id: GameId) -> Result<Vec<Reaction>, DbError> {
        match self {
            Self::Memory(m) => Ok(m.list_reactions(game_id)),
            Self::Postgres(p) => p.list_reactions(game_id).await,
        }
    }

    // -----------------------------------------------------------------------
    // Timeline
    // -----------------------------------------------------------------------

    /// Append an activity line.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the write fails.
    pub async fn insert_activity(&self, entry: &ActivityLog) -> Result<(), DbError> {
        match self {
            Self::Memory(m) => {
                m.insert_activity(entry);
                Ok(())
            }
            Self::Postgres(p) => p.insert_activity(entry).await,
        }
    }

    /// An agent's timeline, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the read fails.
    pub async fn list_activity(&self, agent_id: AgentId) -> Result<Vec<ActivityLog>, DbError> {
        match self {
            Self::Memory(m) => Ok(m.list_activity(agent_id)),
            Self::Postgres(p) => p.list_activity(agent_id).await,
        }
    }

    /// Store a reflection and its analysis.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the write fails.
    pub async fn insert_reflection(&self, reflection: &Reflection) -> Result<(), DbError> {
        match self {
            Self::Memory(m) => {
                m.insert_reflection(reflection);
                Ok(())
            }
            Self::Postgres(p) => p.insert_reflection(reflection).await,
        }
    }

    // -----------------------------------------------------------------------
    // Tournaments
    // -----------------------------------------------------------------------

    /// Insert a tournament.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Conflict`] if the id is taken or another
    /// tournament has not yet completed or been cancelled, or a backend
    /// error.
    pub async fn insert_tournament(&self, tournament: &Tournament) -> Result<(), DbError> {
        match self {
            Self::Memory(m) => m.insert_tournament(tournament),
            Self::Postgres(p) => p.insert_tournament(tournament).await,
        }
    }

    /// Number of tournaments ever created.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the read fails.
    pub async fn count_tournaments(&self) -> Result<u32, DbError> {
        match self {
            Self::Memory(m) => Ok(m.count_tournaments()),
            Self::Postgres(p) => p.count_tournaments().await,
        }
    }

    /// Fetch one tournament.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the read fails.
    pub async fn get_tournament(&self, id: TournamentId) -> Result<Option<Tournament>, DbError> {
        match self {
            Self::Memory(m) => Ok(m.get_tournament(id)),
            Self::Postgres(p) => p.get_tournament(id).await,
        }
    }

    /// The oldest tournament not yet completed or cancelled.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the read fails.
    pub async fn active_tournament(&self) -> Result<Option<Tournament>, DbError> {
        match self {
            Self::Memory(m) => Ok(m.active_tournament()),
            Self::Postgres(p) => p.active_tournament().await,
        }
    }

    /// The most recently created tournament in any state.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the read fails.
    pub async fn latest_tournament(&self) -> Result<Option<Tournament>, DbError> {
        match self {
            Self::Memory(m) => Ok(m.latest_tournament()),
            Self::Postgres(p) => p.latest_tournament().await,
        }
    }

    /// Enroll a participant and add `contribution` to the prize pool in one
    /// step. `false` if the agent was already enrolled.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the write fails.
    pub async fn enroll_participant(
        &self,
        participant: &TournamentParticipant,
        contribution: i64,
    ) -> Result<bool, DbError> {
        match self {
            Self::Memory(m) => Ok(m.enroll_participant(participant, contribution)),
            Self::Postgres(p) => p.enroll_participant(participant, contribution).await,
        }
    }

    /// Participants in seed order.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the read fails.
    pub async fn list_participants(
        &self,
        tournament_id: TournamentId,
    ) -> Result<Vec<TournamentParticipant>, DbError> {
        match self {
            Self::Memory(m) => Ok(m.list_participants(tournament_id)),
            Self::Postgres(p) => p.list_participants(tournament_id).await,
        }
    }

    /// Move a tournament from `from` to `to` if it is still in `from` and the
    /// lifecycle allows it.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the write fails.
    pub async fn transition_tournament(
        &self,
        id: TournamentId,
        from: TournamentStatus,
        to: TournamentStatus,
    ) -> Result<bool, DbError> {
        match self {
            Self::Memory(m) => Ok(m.transition_tournament(id, from, to)),
            Self::Postgres(p) => p.transition_tournament(id, from, to).await,
        }
    }

    /// Advance the round counter, insert the new pairings and credit byes,
    /// all or nothing. `false` if another caller already opened the round.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the write fails.
    pub async fn start_round(&self, start: &RoundStart) -> Result<bool, DbError> {
        match self {
            Self::Memory(m) => Ok(m.start_round(start)),
            Self::Postgres(p) => p.start_round(start).await,
        }
    }

    /// Every match of a tournament, by round.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the read fails.
    pub async fn list_matches(
        &self,
        tournament_id: TournamentId,
    ) -> Result<Vec<TournamentMatch>, DbError> {
        match self {
            Self::Memory(m) => Ok(m.list_matches(tournament_id)),
            Self::Postgres(p) => p.list_matches(tournament_id).await,
        }
    }

    /// Record a played match and update both standings. `false` if the match
    /// was already completed.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the write fails.
    pub async fn complete_match(&self, result: &MatchResult) -> Result<bool, DbError> {
        match self {
            Self::Memory(m) => Ok(m.complete_match(result)),
            Self::Postgres(p) => p.complete_match(result).await,
        }
    }

    /// Assign a final placement and prize. `false` if already placed.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the write fails.
    pub async fn finalize_participant(
        &self,
        tournament_id: TournamentId,
        agent_id: AgentId,
        placement: u32,
        tokens_won: i64,
    ) -> Result<bool, DbError> {
        match self {
            Self::Memory(m) => Ok(m.finalize_participant(tournament_id, agent_id, placement, tokens_won)),
            Self::Postgres(p) => {
                p.finalize_participant(tournament_id, agent_id, placement, tokens_won)
                    .await
            }
        }
    }

    /// Attach the closing narrative to a tournament.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the write fails.
    pub async fn set_tournament_narrative(
        &self,
        id: TournamentId,
        narrative: &str,
    ) -> Result<bool, DbError> {
        match self {
            Self::Memory(m) => Ok(m.set_tournament_narrative(id, narrative)),
            Self::Postgres(p) => p.set_tournament_narrative(id, narrative).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use courtside_types::{TransactionId, TransactionType};

    use super::*;

    fn entry(agent_id: AgentId, kind: TransactionType, amount: i64) -> TokenTransaction {
        TokenTransaction {
            id: TransactionId::new(),
            agent_id,
            amount,
            balance_after: 0,
            kind,
            description: "test".to_owned(),
            reference_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn rebase_recomputes_snapshots_from_the_live_balance() {
        let id = AgentId::new();
        let entries = [
            entry(id, TransactionType::Reward, 12),
            entry(id, TransactionType::Spend, -5),
        ];
        let committed = rebase_postings(id, 40, &entries, Overdraft::Cap);
        let snapshots: Vec<i64> = committed
            .unwrap_or_default()
            .iter()
            .map(|e| e.balance_after)
            .collect();
        assert_eq!(snapshots, vec![52, 47]);
    }

    #[test]
    fn capped_debits_stop_at_zero() {
        let id = AgentId::new();
        let committed =
            rebase_postings(id, 2, &[entry(id, TransactionType::Spend, -5)], Overdraft::Cap)
                .unwrap_or_default();
        assert_eq!(committed.len(), 1);
        assert_eq!(committed.first().map(|e| (e.amount, e.balance_after)), Some((-2, 0)));

        let dropped =
            rebase_postings(id, 0, &[entry(id, TransactionType::Spend, -5)], Overdraft::Cap);
        assert!(dropped.is_ok_and(|c| c.is_empty()));
    }

    #[test]
    fn rejected_overdraft_applies_nothing() {
        let id = AgentId::new();
        let result = rebase_postings(
            id,
            30,
            &[
                entry(id, TransactionType::Reward, 5),
                entry(id, TransactionType::Stake, -50),
            ],
            Overdraft::Reject,
        );
        assert!(matches!(result, Err(DbError::InsufficientBalance(_))));
    }

    #[test]
    fn totals_split_credits_and_debits() {
        let id = AgentId::new();
        let entries = [
            entry(id, TransactionType::Earn, 80),
            entry(id, TransactionType::Spend, -3),
            entry(id, TransactionType::Stake, -50),
        ];
        assert_eq!(posting_totals(&entries), (80, 53));
    }
}
