//! In-process store.
//!
//! Holds every table in plain collections behind one mutex. Each public
//! method takes the lock once, so every compare-and-set and its side
//! effects are atomic with respect to other callers, the same guarantee the
//! `PostgreSQL` store gets from row locks and transactions. The lock is
//! never held across an `.await`.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use courtside_types::{
    ActivityLog, Agent, AgentId, BoxScore, COGNITIVE_MAX, Game, GameId, GameInteraction,
    GameStats, MatchStatus, Reaction, Reflection, Season, SeasonId, SeasonStats, SeasonStatus, Skill,
    TokenTransaction, Tournament, TournamentId, TournamentMatch, TournamentParticipant,
    TournamentStatus,
};

use crate::error::DbError;
use crate::store::{MatchResult, Overdraft, RoundStart, posting_totals, rebase_postings};

#[derive(Debug, Default)]
struct Tables {
    agents: Vec<Agent>,
    transactions: Vec<TokenTransaction>,
    seasons: Vec<Season>,
    season_stats: Vec<SeasonStats>,
    games: Vec<Game>,
    game_stats: Vec<GameStats>,
    interactions: Vec<GameInteraction>,
    reactions: Vec<Reaction>,
    activity: Vec<ActivityLog>,
    reflections: Vec<Reflection>,
    tournaments: Vec<Tournament>,
    participants: Vec<TournamentParticipant>,
    matches: Vec<TournamentMatch>,
}

/// In-memory league store for tests and database-less runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -----------------------------------------------------------------------
    // Agents and ledger
    // -----------------------------------------------------------------------

    pub(crate) fn insert_agent(&self, agent: &Agent) -> Result<(), DbError> {
        let mut t = self.lock();
        if t.agents.iter().any(|a| a.id == agent.id) {
            return Err(DbError::Conflict(format!("agent {} already exists", agent.id)));
        }
        t.agents.push(agent.clone());
        Ok(())
    }

    pub(crate) fn get_agent(&self, id: AgentId) -> Option<Agent> {
        self.lock().agents.iter().find(|a| a.id == id).cloned()
    }

    pub(crate) fn list_agents(&self) -> Vec<Agent> {
        self.lock().agents.clone()
    }

    fn agent_mut(t: &mut Tables, id: AgentId) -> Result<&mut Agent, DbError> {
        t.agents
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| DbError::NotFound(format!("agent {id}")))
    }

    pub(crate) fn commit_postings(
        &self,
        agent_id: AgentId,
        entries: &[TokenTransaction],
        overdraft: Overdraft,
    ) -> Result<Vec<TokenTransaction>, DbError> {
        let mut t = self.lock();
        let agent = Self::agent_mut(&mut t, agent_id)?;
        let committed = rebase_postings(agent_id, agent.token_balance, entries, overdraft)?;
        let (earned, spent) = posting_totals(&committed);
        if let Some(last) = committed.last() {
            agent.token_balance = last.balance_after;
        }
        agent.total_earned = agent.total_earned.saturating_add(earned);
        agent.total_spent = agent.total_spent.saturating_add(spent);
        t.transactions.extend_from_slice(&committed);
        Ok(committed)
    }

    pub(crate) fn record_game_result(&self, agent_id: AgentId, won: bool) -> Result<(), DbError> {
        let mut t = self.lock();
        let agent = Self::agent_mut(&mut t, agent_id)?;
        if won {
            agent.wins = agent.wins.saturating_add(1);
        } else {
            agent.losses = agent.losses.saturating_add(1);
        }
        Ok(())
    }

    pub(crate) fn apply_training(
        &self,
        agent_id: AgentId,
        boosts: &[(Skill, u8)],
        cognitive_boost: u8,
    ) -> Result<(), DbError> {
        let mut t = self.lock();
        let agent = Self::agent_mut(&mut t, agent_id)?;
        for (skill, amount) in boosts {
            agent.attributes.boost(*skill, *amount);
        }
        agent.cognitive_score = agent
            .cognitive_score
            .saturating_add(cognitive_boost)
            .min(COGNITIVE_MAX);
        Ok(())
    }

    pub(crate) fn set_agent_salary(&self, agent_id: AgentId, salary: i64) -> Result<(), DbError> {
        let mut t = self.lock();
        Self::agent_mut(&mut t, agent_id)?.salary = salary;
        Ok(())
    }

    pub(crate) fn assign_team(&self, agent_id: AgentId, team: &str) -> bool {
        let mut t = self.lock();
        match t
            .agents
            .iter_mut()
            .find(|a| a.id == agent_id && a.team.is_none())
        {
            Some(agent) => {
                agent.team = Some(team.to_owned());
                true
            }
            None => false,
        }
    }

    pub(crate) fn deactivate_agent(&self, agent_id: AgentId) -> bool {
        let mut t = self.lock();
        match t.agents.iter_mut().find(|a| a.id == agent_id && a.active) {
            Some(agent) => {
                agent.active = false;
                true
            }
            None => false,
        }
    }

    pub(crate) fn list_transactions(&self, agent_id: AgentId) -> Vec<TokenTransaction> {
        self.lock()
            .transactions
            .iter()
            .filter(|tx| tx.agent_id == agent_id)
            .cloned()
            .collect()
    }

    // -----------------------------------------------------------------------
    // Seasons
    // -----------------------------------------------------------------------

    pub(crate) fn insert_season(&self, season: &Season) -> Result<(), DbError> {
        let mut t = self.lock();
        if t.seasons.iter().any(|s| s.season_num == season.season_num) {
            return Err(DbError::Conflict(format!(
                "season {} already exists",
                season.season_num
            )));
        }
        if season.status == SeasonStatus::Active
            && t.seasons.iter().any(|s| s.status == SeasonStatus::Active)
        {
            return Err(DbError::Conflict("another season is active".to_owned()));
        }
        t.seasons.push(season.clone());
        Ok(())
    }

    pub(crate) fn get_season(&self, id: SeasonId) -> Option<Season> {
        self.lock().seasons.iter().find(|s| s.id == id).cloned()
    }

    pub(crate) fn active_season(&self) -> Option<Season> {
        self.lock()
            .seasons
            .iter()
            .find(|s| s.status == SeasonStatus::Active)
            .cloned()
    }

    pub(crate) fn latest_season_num(&self) -> u32 {
        self.lock()
            .seasons
            .iter()
            .map(|s| s.season_num)
            .max()
            .unwrap_or(0)
    }

    pub(crate) fn claim_season_game(&self, id: SeasonId) -> Option<u32> {
        let mut t = self.lock();
        let season = t.seasons.iter_mut().find(|s| {
            s.id == id && s.status == SeasonStatus::Active && s.games_played < s.total_games
        })?;
        season.games_played = season.games_played.saturating_add(1);
        Some(season.games_played)
    }

    pub(crate) fn complete_season(&self, id: SeasonId) -> bool {
        let mut t = self.lock();
        match t
            .seasons
            .iter_mut()
            .find(|s| s.id == id && s.status == SeasonStatus::Active)
        {
            Some(season) => {
                season.status = SeasonStatus::Completed;
                season.completed_at = Some(Utc::now());
                true
            }
            None => false,
        }
    }

    fn season_line(
        t: &mut Tables,
        season_id: SeasonId,
        agent_id: AgentId,
        salary: i64,
    ) -> Option<&mut SeasonStats> {
        let matches = |s: &SeasonStats| s.season_id == season_id && s.agent_id == agent_id;
        if !t.season_stats.iter().any(matches) {
            t.season_stats
                .push(SeasonStats::opening(season_id, agent_id, salary));
        }
        t.season_stats.iter_mut().find(|s| matches(s))
    }

    pub(crate) fn open_season_stats(&self, stats: &SeasonStats) {
        let mut t = self.lock();
        if let Some(line) = Self::season_line(&mut t, stats.season_id, stats.agent_id, stats.salary)
        {
            line.salary = stats.salary;
        }
    }

    pub(crate) fn record_season_game(
        &self,
        season_id: SeasonId,
        agent_id: AgentId,
        salary: i64,
        box_score: &BoxScore,
        won: bool,
    ) {
        let mut t = self.lock();
        if let Some(line) = Self::season_line(&mut t, season_id, agent_id, salary) {
            line.record(box_score, won);
        }
    }

    pub(crate) fn set_season_tokens_earned(
        &self,
        season_id: SeasonId,
        agent_id: AgentId,
        tokens: i64,
    ) {
        let mut t = self.lock();
        if let Some(line) = Self::season_line(&mut t, season_id, agent_id, 0) {
            line.tokens_earned = tokens;
        }
    }

    pub(crate) fn get_season_stats(
        &self,
        season_id: SeasonId,
        agent_id: AgentId,
    ) -> Option<SeasonStats> {
        self.lock()
            .season_stats
            .iter()
            .find(|s| s.season_id == season_id && s.agent_id == agent_id)
            .cloned()
    }

    pub(crate) fn list_season_stats(&self, season_id: SeasonId) -> Vec<SeasonStats> {
        self.lock()
            .season_stats
            .iter()
            .filter(|s| s.season_id == season_id)
            .cloned()
            .collect()
    }

    // -----------------------------------------------------------------------
    // Games
    // -----------------------------------------------------------------------

    pub(crate) fn insert_game(&self, game: &Game, stats: &[GameStats]) {
        let mut t = self.lock();
        t.games.push(game.clone());
        t.game_stats.extend_from_slice(stats);
    }

    pub(crate) fn list_games(&self, season_id: SeasonId) -> Vec<Game> {
        self.lock()
            .games
            .iter()
            .filter(|g| g.season_id == season_id)
            .cloned()
            .collect()
    }

    pub(crate) fn get_game(&self, id: GameId) -> Option<Game> {
        self.lock().games.iter().find(|g| g.id == id).cloned()
    }

    pub(crate) fn recent_game_stats(&self, agent_id: AgentId, limit: usize) -> Vec<GameStats> {
        self.lock()
            .game_stats
            .iter()
            .rev()
            .filter(|s| s.agent_id == agent_id)
            .take(limit)
            .cloned()
            .collect()
    }

    pub(crate) fn insert_interactions(&self, lines: &[GameInteraction]) {
        self.lock().interactions.extend_from_slice(lines);
    }

    pub(crate) fn list_interactions(&self, game_id: GameId) -> Vec<GameInteraction> {
        self.lock()
            .interactions
            .iter()
            .filter(|i| i.game_id == game_id)
            .cloned()
            .collect()
    }

    pub(crate) fn insert_reaction(&self, reaction: &Reaction) {
        self.lock().reactions.push(reaction.clone());
    }

    pub(crate) fn list_reactions(&self, game_id: GameId) -> Vec<Reaction> {
        self.lock()
            .reactions
            .iter()
            .filter(|r| r.game_id == game_id)
            .cloned()
            .collect()
    }

    // -----------------------------------------------------------------------
    // Timeline
    // -----------------------------------------------------------------------

    pub(crate) fn insert_activity(&self, entry: &ActivityLog) {
        self.lock().activity.push(entry.clone());
    }

    pub(crate) fn list_activity(&self, agent_id: AgentId) -> Vec<ActivityLog> {
        self.lock()
            .activity
            .iter()
            .filter(|a| a.agent_id == agent_id)
            .cloned()
            .collect()
    }

    pub(crate) fn insert_reflection(&self, reflection: &Reflection) {
        self.lock().reflections.push(reflection.clone());
    }

    // -----------------------------------------------------------------------
    // Tournaments
    // -----------------------------------------------------------------------

    pub(crate) fn insert_tournament(&self, tournament: &Tournament) -> Result<(), DbError> {
        let mut t = self.lock();
        if t.tournaments.iter().any(|x| x.id == tournament.id) {
            return Err(DbError::Conflict(format!(
                "tournament {} already exists",
                tournament.id
            )));
        }
        if !tournament.status.is_terminal() && t.tournaments.iter().any(|x| !x.status.is_terminal())
        {
            return Err(DbError::Conflict("another tournament is running".to_owned()));
        }
        t.tournaments.push(tournament.clone());
        Ok(())
    }

    pub(crate) fn count_tournaments(&self) -> u32 {
        u32::try_from(self.lock().tournaments.len()).unwrap_or(u32::MAX)
    }

    pub(crate) fn get_tournament(&self, id: TournamentId) -> Option<Tournament> {
        self.lock().tournaments.iter().find(|x| x.id == id).cloned()
    }

    pub(crate) fn active_tournament(&self) -> Option<Tournament> {
        self.lock()
            .tournaments
            .iter()
            .filter(|x| !x.status.is_terminal())
            .min_by_key(|x| x.created_at)
            .cloned()
    }

    pub(crate) fn latest_tournament(&self) -> Option<Tournament> {
        self.lock()
            .tournaments
            .iter()
            .max_by_key(|x| x.created_at)
            .cloned()
    }

    pub(crate) fn enroll_participant(
        &self,
        participant: &TournamentParticipant,
        contribution: i64,
    ) -> bool {
        let mut t = self.lock();
        if t.participants.iter().any(|p| {
            p.tournament_id == participant.tournament_id && p.agent_id == participant.agent_id
        }) {
            return false;
        }
        let Some(tournament) = t
            .tournaments
            .iter_mut()
            .find(|x| x.id == participant.tournament_id)
        else {
            return false;
        };
        tournament.prize_pool = tournament.prize_pool.saturating_add(contribution);
        t.participants.push(participant.clone());
        true
    }

    pub(crate) fn list_participants(&self, tournament_id: TournamentId) -> Vec<TournamentParticipant> {
        let mut list: Vec<TournamentParticipant> = self
            .lock()
            .participants
            .iter()
            .filter(|p| p.tournament_id == tournament_id)
            .cloned()
            .collect();
        list.sort_by_key(|p| p.seed);
        list
    }

    pub(crate) fn transition_tournament(
        &self,
        id: TournamentId,
        from: TournamentStatus,
        to: TournamentStatus,
    ) -> bool {
        if !from.can_transition_to(to) {
            return false;
        }
        let mut t = self.lock();
        match t
            .tournaments
            .iter_mut()
            .find(|x| x.id == id && x.status == from)
        {
            Some(tournament) => {
                tournament.status = to;
                if to.is_terminal() {
                    tournament.completed_at = Some(Utc::now());
                }
                true
            }
            None => false,
        }
    }

    pub(crate) fn start_round(&self, start: &RoundStart) -> bool {
        let mut t = self.lock();
        let Some(tournament) = t.tournaments.iter_mut().find(|x| {
            x.id == start.tournament_id
                && x.status == TournamentStatus::InProgress
                && x.current_round == start.from_round
                && start.to_round <= x.total_rounds
        }) else {
            return false;
        };
        tournament.current_round = start.to_round;
        t.matches.extend_from_slice(&start.matches);
        for agent_id in &start.byes {
            if let Some(p) = t
                .participants
                .iter_mut()
                .find(|p| p.tournament_id == start.tournament_id && p.agent_id == *agent_id)
            {
                p.record_bye(start.to_round);
            }
        }
        true
    }

    pub(crate) fn list_matches(&self, tournament_id: TournamentId) -> Vec<TournamentMatch> {
        self.lock()
            .matches
            .iter()
            .filter(|m| m.tournament_id == tournament_id)
            .cloned()
            .collect()
    }

    pub(crate) fn complete_match(&self, result: &MatchResult) -> bool {
        let mut t = self.lock();
        let Some(m) = t
            .matches
            .iter_mut()
            .find(|m| m.id == result.match_id && m.status == MatchStatus::Pending)
        else {
            return false;
        };
        m.status = MatchStatus::Completed;
        m.winner_id = result.winner_id;
        m.agent1_score = result.agent1_score;
        m.agent2_score = result.agent2_score;
        m.narrative = Some(result.narrative.clone());

        let first = result.outcome_for_first(m);
        let sides = [(m.agent1_id, first), (m.agent2_id, first.flipped())];
        let tournament_id = m.tournament_id;
        for (agent_id, outcome) in sides {
            if let Some(p) = t
                .participants
                .iter_mut()
                .find(|p| p.tournament_id == tournament_id && p.agent_id == agent_id)
            {
                p.record(outcome);
            }
        }
        true
    }

    pub(crate) fn finalize_participant(
        &self,
        tournament_id: TournamentId,
        agent_id: AgentId,
        placement: u32,
        tokens_won: i64,
    ) -> bool {
        let mut t = self.lock();
        match t.participants.iter_mut().find(|p| {
            p.tournament_id == tournament_id && p.agent_id == agent_id && p.placement.is_none()
        }) {
            Some(p) => {
                p.placement = Some(placement);
                p.tokens_won = tokens_won;
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_tournament_narrative(&self, id: TournamentId, narrative: &str) -> bool {
        let mut t = self.lock();
        match t.tournaments.iter_mut().find(|x| x.id == id) {
            Some(tournament) => {
                tournament.narrative = Some(narrative.to_owned());
                true
            }
            None => false,
        }
    }
}
