//! Season lifecycle: creation, game-by-game simulation and the one-time
//! salary settlement when the last game is played.
//!
//! Game slots are reserved with a store-level claim before any work is
//! done, so overlapping simulate calls can never push a season past its
//! target. Whoever plays the final slot completes the season; the
//! completion itself is a compare-and-set, so settlement runs once.

use chrono::Utc;
use courtside_db::{DbError, Overdraft};
use courtside_judge::fallback::npc_verdict;
use courtside_judge::{DialogueGenerator, GameContext, GameVerdict, JudgeProfile, MvpSide, StatBonus};
use courtside_ledger::Ledger;
use courtside_sim::{
    GameSide, TEAM_NAMES, calculate_ovr, calculate_salary, generate_npc_attributes,
    generate_npc_name, position_for_slot, simulate_game, team_for_slot,
};
use courtside_types::{
    ActivityKind, Agent, AgentId, Game, GameId, GameStats, Season, SeasonId, SeasonStats,
    SeasonStatus,
};
use rand::Rng;
use rand::seq::IndexedRandom;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::league::League;
use crate::registry::build_agent;

/// Result of a simulate request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationSummary {
    /// The season that was advanced.
    pub season_id: SeasonId,
    /// Its sequential number.
    pub season_num: u32,
    /// Games simulated by this request.
    pub games_simulated: u32,
    /// Games played in the season so far.
    pub games_played: u32,
    /// Season target.
    pub total_games: u32,
    /// Season status after the request.
    pub status: SeasonStatus,
}

impl League {
    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    /// Open a new season, or return the one already active.
    ///
    /// Tops the NPC population up to the configured floor, places free
    /// agents on the least-populated team, and opens a stats line for every
    /// active agent at its current salary.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Db`] if a persistence call fails.
    pub async fn create_season(&self) -> Result<Season, CoreError> {
        if let Some(active) = self.store().active_season().await? {
            return Ok(active);
        }

        let created = self.ensure_npc_roster().await?;
        if created > 0 {
            info!(created, "npc roster topped up");
        }
        self.assign_free_agents().await?;

        let season = Season {
            id: SeasonId::new(),
            season_num: self.store().latest_season_num().await?.saturating_add(1),
            games_played: 0,
            total_games: self.config().season.total_games,
            status: SeasonStatus::Active,
            created_at: Utc::now(),
            completed_at: None,
        };
        match self.store().insert_season(&season).await {
            Ok(()) => {}
            Err(DbError::Conflict(reason)) => {
                debug!(%reason, "season creation lost a race");
                return self.store().active_season().await?.ok_or_else(|| {
                    CoreError::Validation(format!("season creation conflicted: {reason}"))
                });
            }
            Err(e) => return Err(e.into()),
        }

        for agent in self.store().list_agents().await? {
            if !agent.active {
                continue;
            }
            let salary = calculate_salary(calculate_ovr(&agent.attributes, agent.position));
            self.store()
                .open_season_stats(&SeasonStats::opening(season.id, agent.id, salary))
                .await?;
            if agent.salary != salary {
                self.store().set_agent_salary(agent.id, salary).await?;
            }
            if !agent.is_npc {
                let event = self.judge().world_event(&JudgeProfile::from(&agent)).await;
                self.log_activity(
                    agent.id,
                    ActivityKind::Season,
                    format!(
                        "Season {} tips off. {} salary: {salary} tokens. {event}",
                        season.season_num,
                        agent.team.as_deref().unwrap_or("Free agent"),
                    ),
                )
                .await?;
            }
        }

        info!(
            season_id = %season.id,
            season_num = season.season_num,
            total_games = season.total_games,
            "season created"
        );
        Ok(season)
    }

    /// Create NPCs until the configured floor is met. Returns how many were
    /// created.
    async fn ensure_npc_roster(&self) -> Result<u32, CoreError> {
        let existing = self
            .store()
            .list_agents()
            .await?
            .iter()
            .filter(|a| a.is_npc)
            .count();
        let floor = usize::try_from(self.config().season.npc_floor).unwrap_or(usize::MAX);

        let mut created = 0_u32;
        for slot in existing..floor {
            let position = position_for_slot(slot);
            let npc = self.with_rng(|rng| {
                let attributes = generate_npc_attributes(position, rng);
                let mut npc = build_agent(
                    generate_npc_name(rng),
                    true,
                    position,
                    attributes,
                    rng.random_range(30..=70),
                    rng.random_range(40..=70),
                    None,
                );
                npc.team = Some(team_for_slot(slot).to_owned());
                npc
            });
            self.store().insert_agent(&npc).await?;
            created = created.saturating_add(1);
        }
        Ok(created)
    }

    /// Give every active real agent without a team the least-populated one.
    async fn assign_free_agents(&self) -> Result<(), CoreError> {
        let mut agents = self.store().list_agents().await?;
        for i in 0..agents.len() {
            let team = least_populated_team(&agents);
            let Some(agent) = agents.get_mut(i) else {
                continue;
            };
            if agent.is_npc || !agent.active || agent.team.is_some() {
                continue;
            }
            if self.store().assign_team(agent.id, team).await? {
                agent.team = Some(team.to_owned());
                info!(agent_id = %agent.id, team, "free agent assigned");
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Simulation
    // -----------------------------------------------------------------------

    /// Simulate up to `count` games of a season. Returns the number
    /// simulated; a missing or completed season, or fewer than two active
    /// agents, yields `0`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Db`] if a persistence call fails. Judge and
    /// dialogue failures never surface here.
    pub async fn simulate_next_games(
        &self,
        season_id: SeasonId,
        count: u32,
    ) -> Result<u32, CoreError> {
        let Some(season) = self.store().get_season(season_id).await? else {
            return Ok(0);
        };
        if season.status == SeasonStatus::Completed {
            return Ok(0);
        }
        if season.remaining_games() == 0 {
            // A previous caller claimed the last slot but did not finish.
            self.finish_season(&season).await?;
            return Ok(0);
        }

        let roster: Vec<(AgentId, Option<String>)> = self
            .store()
            .list_agents()
            .await?
            .into_iter()
            .filter(|a| a.active)
            .map(|a| (a.id, a.team))
            .collect();
        if roster.len() < 2 {
            debug!(season_id = %season.id, "not enough agents to simulate");
            return Ok(0);
        }

        let mut simulated = 0_u32;
        for _ in 0..count {
            let Some((home, away)) = self.with_rng(|rng| pick_matchup(&roster, rng)) else {
                break;
            };
            let Some(game_num) = self.store().claim_season_game(season.id).await? else {
                break;
            };
            self.play_game(&season, game_num, home, away).await?;
            simulated = simulated.saturating_add(1);

            if game_num >= season.total_games {
                self.finish_season(&season).await?;
                break;
            }
        }

        info!(season_id = %season.id, simulated, "games simulated");
        Ok(simulated)
    }

    /// Simulate `count` games of the active season, creating one if none is
    /// active.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Db`] if a persistence call fails.
    pub async fn simulate_active_season(&self, count: u32) -> Result<SimulationSummary, CoreError> {
        let season = match self.store().active_season().await? {
            Some(season) => season,
            None => self.create_season().await?,
        };
        let games_simulated = self.simulate_next_games(season.id, count).await?;
        let current = self.store().get_season(season.id).await?.unwrap_or(season);
        Ok(SimulationSummary {
            season_id: current.id,
            season_num: current.season_num,
            games_simulated,
            games_played: current.games_played,
            total_games: current.total_games,
            status: current.status,
        })
    }

    /// Play one claimed game slot between two agents.
    async fn play_game(
        &self,
        season: &Season,
        game_num: u32,
        home_id: AgentId,
        away_id: AgentId,
    ) -> Result<Game, CoreError> {
        let home = self.require_agent(home_id).await?;
        let away = self.require_agent(away_id).await?;

        let base = self.with_rng(|rng| {
            simulate_game(
                GameSide {
                    name: &home.nickname,
                    attributes: &home.attributes,
                    luck_value: home.luck_value,
                },
                GameSide {
                    name: &away.nickname,
                    attributes: &away.attributes,
                    luck_value: away.luck_value,
                },
                rng,
            )
        });
        let ctx = GameContext {
            season_num: season.season_num,
            game_num,
            total_games: season.total_games,
            home_score: base.home_score,
            away_score: base.away_score,
            narrative: base.narrative.clone(),
        };

        let home_profile = JudgeProfile::from(&home);
        let away_profile = JudgeProfile::from(&away);
        let npc_only = home.is_npc && away.is_npc;
        let verdict = if npc_only {
            npc_verdict(&ctx)
        } else {
            self.judge()
                .judge_game(&home_profile, &away_profile, &ctx)
                .await
        };

        let (home_score, away_score) = final_scores(base.home_score, base.away_score, &verdict);
        let home_won = home_score > away_score;
        let game = Game {
            id: GameId::new(),
            season_id: season.id,
            home_agent_id: home.id,
            away_agent_id: away.id,
            home_score,
            away_score,
            narrative: verdict.narrative.clone(),
            event_type: verdict.event_type,
            mvp_agent_id: match verdict.mvp {
                MvpSide::Home => home.id,
                MvpSide::Away => away.id,
            },
            played_at: Utc::now(),
        };
        let home_line = GameStats {
            game_id: game.id,
            agent_id: home.id,
            won: home_won,
            box_score: base.home,
        };
        let away_line = GameStats {
            game_id: game.id,
            agent_id: away.id,
            won: !home_won,
            box_score: base.away,
        };
        self.store()
            .insert_game(&game, &[home_line.clone(), away_line.clone()])
            .await?;

        let away_name = away.nickname.clone();
        let home_name = home.nickname.clone();
        self.apply_game_result(
            &game,
            game_num,
            &home,
            &home_line,
            SideEffects {
                token_delta: verdict.token_adjust.home,
                bonus: verdict.stat_bonus_home,
                opponent: &away_name,
                my_score: home_score,
                their_score: away_score,
            },
        )
        .await?;
        self.apply_game_result(
            &game,
            game_num,
            &away,
            &away_line,
            SideEffects {
                token_delta: verdict.token_adjust.away,
                bonus: verdict.stat_bonus_away,
                opponent: &home_name,
                my_score: away_score,
                their_score: home_score,
            },
        )
        .await?;

        if !npc_only {
            let final_ctx = GameContext {
                home_score,
                away_score,
                narrative: game.narrative.clone(),
                ..ctx
            };
            let lines = DialogueGenerator::new(self.judge())
                .generate(game.id, &home_profile, &away_profile, &final_ctx)
                .await;
            if let Err(e) = self.store().insert_interactions(&lines).await {
                warn!(game_id = %game.id, error = %e, "failed to store game dialogue");
            }
        }

        debug!(
            game_id = %game.id,
            game_num,
            home_score,
            away_score,
            event = %game.event_type,
            "game played"
        );
        Ok(game)
    }

    /// Fold one side's result into its record, season line and ledger.
    async fn apply_game_result(
        &self,
        game: &Game,
        game_num: u32,
        agent: &Agent,
        line: &GameStats,
        effects: SideEffects<'_>,
    ) -> Result<(), CoreError> {
        self.store().record_game_result(agent.id, line.won).await?;
        self.store()
            .record_season_game(game.season_id, agent.id, agent.salary, &line.box_score, line.won)
            .await?;
        if agent.is_npc {
            return Ok(());
        }

        // A cost never takes more than the agent holds.
        let delta = effects.token_delta.max(agent.token_balance.max(0).saturating_neg());
        let mut snapshot = agent.clone();
        let mut ledger = Ledger::new();
        ledger.record_delta(
            &mut snapshot,
            delta,
            &format!("Game {game_num} vs {}", effects.opponent),
            Some(game.id.into_inner()),
        )?;
        let applied = self
            .commit_journal(agent.id, &mut ledger, Overdraft::Cap)
            .await?
            .iter()
            .fold(0_i64, |acc, e| acc.saturating_add(e.amount));
        if let Some(bonus) = effects.bonus {
            self.store()
                .apply_training(agent.id, &[(bonus.skill, bonus.amount)], 0)
                .await?;
        }

        let box_score = &line.box_score;
        let mut content = format!(
            "Game {game_num}: {} vs {} {}-{}. {} pts, {} reb, {} ast. {}",
            if line.won { "W" } else { "L" },
            effects.opponent,
            effects.my_score,
            effects.their_score,
            box_score.points,
            box_score.rebounds,
            box_score.assists,
            game.narrative,
        );
        if game.mvp_agent_id == agent.id {
            content.push_str(" Named game MVP.");
        }
        if let Some(bonus) = effects.bonus {
            content.push_str(&format!(" {} +{}.", bonus.skill, bonus.amount));
        }
        if applied != 0 {
            content.push_str(&format!(" Tokens {applied:+}."));
        }
        self.log_activity(agent.id, ActivityKind::Game, content).await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Settlement
    // -----------------------------------------------------------------------

    /// Complete a full season and, if this caller won the completion, pay
    /// salaries.
    async fn finish_season(&self, season: &Season) -> Result<(), CoreError> {
        if !self.store().complete_season(season.id).await? {
            debug!(season_id = %season.id, "season already completed elsewhere");
            return Ok(());
        }
        info!(season_id = %season.id, season_num = season.season_num, "season completed");
        self.settle_season_salaries(season).await
    }

    /// Pay every non-NPC agent its settled salary plus bonus. A failure for
    /// one agent is logged and does not stop the others.
    async fn settle_season_salaries(&self, season: &Season) -> Result<(), CoreError> {
        let lines = self.store().list_season_stats(season.id).await?;
        let mut paid = 0_u32;
        for stats in lines {
            let agent_id = stats.agent_id;
            match self.settle_agent_salary(season, stats).await {
                Ok(true) => paid = paid.saturating_add(1),
                Ok(false) => {}
                Err(e) => {
                    warn!(season_id = %season.id, agent_id = %agent_id, error = %e, "salary settlement failed");
                }
            }
        }
        info!(season_id = %season.id, paid, "season salaries settled");
        Ok(())
    }

    async fn settle_agent_salary(
        &self,
        season: &Season,
        stats: SeasonStats,
    ) -> Result<bool, CoreError> {
        let mut agent = self.require_agent(stats.agent_id).await?;
        if agent.is_npc {
            return Ok(false);
        }

        let settlement = self
            .judge()
            .settle_season(&JudgeProfile::from(&agent), &stats, season.season_num)
            .await;
        let final_salary = scale_salary(stats.salary, settlement.salary_multiplier);
        let payout = final_salary.saturating_add(settlement.bonus_tokens);

        let mut ledger = Ledger::new();
        if payout > 0 {
            ledger.record_earn(
                &mut agent,
                payout,
                &format!("Season {} salary", season.season_num),
                Some(season.id.into_inner()),
            )?;
        }
        self.commit_journal(agent.id, &mut ledger, Overdraft::Cap)
            .await?;
        self.store().set_agent_salary(agent.id, final_salary).await?;
        self.store()
            .set_season_tokens_earned(season.id, agent.id, payout.max(0))
            .await?;

        let mut content = format!(
            "Season {} settled: {}-{}, salary {} x{} = {final_salary}, bonus {}. {}",
            season.season_num,
            stats.wins,
            stats.losses,
            stats.salary,
            settlement.salary_multiplier,
            settlement.bonus_tokens,
            settlement.narrative,
        );
        if settlement.mvp_candidate {
            content.push_str(" MVP candidate.");
        }
        if let Some(rumor) = &settlement.trade_rumor {
            content.push_str(&format!(" Rumor: {rumor}"));
        }
        self.log_activity(agent.id, ActivityKind::Salary, content).await?;
        self.audit_agent(agent.id).await?;
        Ok(true)
    }
}

/// What one side of a game takes away from the verdict.
struct SideEffects<'a> {
    token_delta: i64,
    bonus: Option<StatBonus>,
    opponent: &'a str,
    my_score: u32,
    their_score: u32,
}

/// The team with the fewest active agents; ties go to the earlier team.
pub fn least_populated_team(agents: &[Agent]) -> &'static str {
    TEAM_NAMES
        .iter()
        .copied()
        .min_by_key(|team| {
            agents
                .iter()
                .filter(|a| a.active && a.team.as_deref() == Some(*team))
                .count()
        })
        .unwrap_or(TEAM_NAMES[0])
}

/// Pick a random home agent and an away agent from another team, falling
/// back to any other agent when everyone shares a team.
fn pick_matchup(
    roster: &[(AgentId, Option<String>)],
    rng: &mut impl Rng,
) -> Option<(AgentId, AgentId)> {
    if roster.len() < 2 {
        return None;
    }
    let (home, home_team) = roster.get(rng.random_range(0..roster.len()))?;
    let rivals: Vec<AgentId> = roster
        .iter()
        .filter(|(id, team)| id != home && team != home_team)
        .map(|(id, _)| *id)
        .collect();
    let pool = if rivals.is_empty() {
        roster
            .iter()
            .filter(|(id, _)| id != home)
            .map(|(id, _)| *id)
            .collect()
    } else {
        rivals
    };
    pool.choose(rng).map(|away| (*home, *away))
}

/// Base scores plus judge adjustments, floored at zero. A level score goes
/// to the home side by one point.
fn final_scores(home_base: u32, away_base: u32, verdict: &GameVerdict) -> (u32, u32) {
    let adjust = |base: u32, delta: i32| {
        let raw = i64::from(base).saturating_add(i64::from(delta)).max(0);
        u32::try_from(raw).unwrap_or(u32::MAX)
    };
    let home = adjust(home_base, verdict.score_adjust_home);
    let away = adjust(away_base, verdict.score_adjust_away);
    if home == away {
        (home.saturating_add(1), away)
    } else {
        (home, away)
    }
}

/// `round(base * multiplier)`, half away from zero.
fn scale_salary(base: i64, multiplier: Decimal) -> i64 {
    Decimal::from(base)
        .checked_mul(multiplier)
        .map(|d| d.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_i64())
        .unwrap_or(base)
}
