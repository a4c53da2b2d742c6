//! Swiss tournament lifecycle.
//!
//! ```text
//!   registering ──deadline, enough players──► in_progress ──last round──► settling ──► completed
//!        │                                     (rounds 1..=N)
//!        └──deadline, too few players──► cancelled (entry fees refunded)
//! ```
//!
//! [`League::advance_tournament`] performs at most one step per call and
//! is safe under repeated or overlapping invocation: every step is a
//! store-level compare-and-set, and only the caller that wins it applies
//! the step's economy effects. A step that someone else already took
//! reports [`AdvanceOutcome::NoAction`].

use chrono::{DateTime, Duration, Utc};
use courtside_db::{DbError, MatchResult, Overdraft, RoundStart};
use courtside_ledger::Ledger;
use courtside_sim::{DuelContext, simulate_duel};
use courtside_types::{
    ActivityKind, Agent, MatchId, MatchStatus, Tournament, TournamentFormat, TournamentId,
    TournamentMatch, TournamentParticipant, TournamentStatus,
};
use rand::seq::SliceRandom;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::league::League;
use crate::swiss::{pairing_entries, swiss_pairing};

/// Name stems cycled through as tournaments are created.
const TOURNAMENT_NAMES: [&str; 4] = [
    "Swiss Open",
    "Court Kings Invitational",
    "Hoops Masters",
    "Midnight Classic",
];

/// What one call to [`League::advance_tournament`] did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AdvanceOutcome {
    /// No tournament with that id.
    NotFound,
    /// Registration is still open.
    Waiting {
        /// When registration closes.
        deadline: DateTime<Utc>,
    },
    /// Too few players; entry fees were returned.
    Cancelled {
        /// Paying participants refunded.
        refunded: u32,
    },
    /// Registration closed and round one was paired.
    Started {
        /// Enrolled participants.
        participants: u32,
    },
    /// Pending matches of the current round were played.
    RoundExecuted {
        /// The round.
        round: u32,
        /// Matches completed by this call.
        played: u32,
        /// Matches that failed and stay pending.
        failed: u32,
    },
    /// The next round was paired.
    RoundGenerated {
        /// The round just opened.
        round: u32,
    },
    /// All rounds are done; settlement comes next.
    Settling,
    /// Prizes were paid and the tournament closed.
    Completed {
        /// Winner's nickname, if anyone played.
        champion: Option<String>,
    },
    /// Nothing to do, or another caller already took this step.
    NoAction {
        /// Why nothing happened.
        reason: String,
    },
}

impl AdvanceOutcome {
    /// Machine-readable action tag.
    pub const fn action(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Waiting { .. } => "waiting",
            Self::Cancelled { .. } => "cancelled",
            Self::Started { .. } => "started",
            Self::RoundExecuted { .. } => "round_executed",
            Self::RoundGenerated { .. } => "round_generated",
            Self::Settling => "settling",
            Self::Completed { .. } => "completed",
            Self::NoAction { .. } => "no_action",
        }
    }

    /// Whether the call changed tournament state.
    pub const fn is_progress(&self) -> bool {
        !matches!(
            self,
            Self::NotFound | Self::Waiting { .. } | Self::NoAction { .. }
        )
    }

    /// Human-readable detail.
    pub fn detail(&self) -> String {
        match self {
            Self::NotFound => "tournament not found".to_owned(),
            Self::Waiting { deadline } => format!("registration open until {deadline}"),
            Self::Cancelled { refunded } => {
                format!("not enough participants, {refunded} entry fees refunded")
            }
            Self::Started { participants } => {
                format!("{participants} participants, round 1 paired")
            }
            Self::RoundExecuted {
                round,
                played,
                failed,
            } => {
                if *failed == 0 {
                    format!("round {round}: {played} matches played")
                } else {
                    format!("round {round}: {played} matches played, {failed} failed")
                }
            }
            Self::RoundGenerated { round } => format!("round {round} paired"),
            Self::Settling => "all rounds complete, settling".to_owned(),
            Self::Completed { champion } => match champion {
                Some(name) => format!("champion: {name}"),
                None => "closed with no finishers".to_owned(),
            },
            Self::NoAction { reason } => reason.clone(),
        }
    }
}

impl core::fmt::Display for AdvanceOutcome {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.action(), self.detail())
    }
}

fn no_action(reason: impl Into<String>) -> AdvanceOutcome {
    AdvanceOutcome::NoAction {
        reason: reason.into(),
    }
}

impl League {
    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    /// Whether a new tournament is due: none is running and the configured
    /// interval has passed since the last one ended.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Db`] if a read fails.
    pub async fn should_create_tournament(&self) -> Result<bool, CoreError> {
        self.should_create_tournament_at(Utc::now()).await
    }

    /// [`Self::should_create_tournament`] evaluated at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Db`] if a read fails.
    pub async fn should_create_tournament_at(&self, now: DateTime<Utc>) -> Result<bool, CoreError> {
        if self.store().active_tournament().await?.is_some() {
            return Ok(false);
        }
        let Some(last) = self.store().latest_tournament().await? else {
            return Ok(true);
        };
        let ended = last.completed_at.unwrap_or(last.created_at);
        let interval = Duration::hours(self.config().tournament.interval_hours);
        Ok(now.signed_duration_since(ended) >= interval)
    }

    /// Create and populate a tournament, or return the one already
    /// running.
    ///
    /// Eligible agents are charged the entry fee as they are enrolled;
    /// NPCs fill any shortfall up to the minimum without paying.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Db`] if a persistence call fails.
    pub async fn create_auto_tournament(&self) -> Result<Tournament, CoreError> {
        self.create_auto_tournament_at(Utc::now()).await
    }

    /// [`Self::create_auto_tournament`] with `now` as the creation time.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Db`] if a persistence call fails.
    pub async fn create_auto_tournament_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Tournament, CoreError> {
        if let Some(active) = self.store().active_tournament().await? {
            return Ok(active);
        }

        let cfg = &self.config().tournament;
        let number = self.store().count_tournaments().await?.saturating_add(1);
        let tournament = Tournament {
            id: TournamentId::new(),
            name: tournament_name(number),
            format: TournamentFormat::Swiss,
            status: TournamentStatus::Registering,
            entry_fee: cfg.entry_fee,
            prize_pool: cfg.system_subsidy,
            system_subsidy: cfg.system_subsidy,
            total_rounds: cfg.total_rounds,
            current_round: 0,
            min_participants: cfg.min_participants,
            max_participants: cfg.max_participants,
            registration_deadline: now
                .checked_add_signed(Duration::minutes(cfg.registration_minutes))
                .unwrap_or(now),
            narrative: None,
            created_at: now,
            completed_at: None,
        };
        match self.store().insert_tournament(&tournament).await {
            Ok(()) => {}
            Err(DbError::Conflict(reason)) => {
                debug!(%reason, "tournament creation lost a race");
                return self.store().active_tournament().await?.ok_or_else(|| {
                    CoreError::Validation(format!("tournament creation conflicted: {reason}"))
                });
            }
            Err(e) => return Err(e.into()),
        }

        let agents = self.store().list_agents().await?;
        let floor = tournament.entry_fee.max(cfg.min_balance);
        let max = usize::try_from(tournament.max_participants).unwrap_or(usize::MAX);
        let min = usize::try_from(tournament.min_participants).unwrap_or(0);

        let mut enrolled = 0_usize;
        for agent in agents
            .iter()
            .filter(|a| a.active && !a.is_npc && a.token_balance >= floor)
        {
            if enrolled >= max {
                break;
            }
            match self.enroll_paying(&tournament, agent.clone(), enrolled).await {
                Ok(true) => enrolled = enrolled.saturating_add(1),
                Ok(false) => {}
                Err(e) => {
                    warn!(tournament_id = %tournament.id, agent_id = %agent.id, error = %e, "enrollment failed");
                }
            }
        }

        let paying = enrolled;
        if enrolled < min {
            let mut npcs: Vec<&Agent> = agents.iter().filter(|a| a.active && a.is_npc).collect();
            self.with_rng(|rng| npcs.shuffle(rng));
            for npc in npcs.into_iter().take(min.saturating_sub(enrolled)) {
                let entry = TournamentParticipant::enroll(tournament.id, npc, seed_of(enrolled));
                if self.store().enroll_participant(&entry, 0).await? {
                    enrolled = enrolled.saturating_add(1);
                }
            }
        }

        info!(
            tournament_id = %tournament.id,
            name = %tournament.name,
            paying,
            npc_fill = enrolled.saturating_sub(paying),
            "tournament created"
        );
        Ok(self
            .store()
            .get_tournament(tournament.id)
            .await?
            .unwrap_or(tournament))
    }

    /// Charge the fee and enroll one paying agent. `false` if the agent was
    /// already enrolled, in which case the fee is handed back.
    async fn enroll_paying(
        &self,
        tournament: &Tournament,
        mut agent: Agent,
        seed: usize,
    ) -> Result<bool, CoreError> {
        let mut ledger = Ledger::new();
        if tournament.entry_fee > 0 {
            ledger.record_stake(
                &mut agent,
                tournament.entry_fee,
                &format!("Entry fee: {}", tournament.name),
                Some(tournament.id.into_inner()),
            )?;
        }
        self.commit_journal(agent.id, &mut ledger, Overdraft::Reject)
            .await?;

        let entry = TournamentParticipant::enroll(tournament.id, &agent, seed_of(seed));
        if !self
            .store()
            .enroll_participant(&entry, tournament.entry_fee)
            .await?
        {
            if tournament.entry_fee > 0 {
                ledger.record_reward(
                    &mut agent,
                    tournament.entry_fee,
                    &format!("Refund: already entered in {}", tournament.name),
                    Some(tournament.id.into_inner()),
                )?;
                self.commit_journal(agent.id, &mut ledger, Overdraft::Cap)
                    .await?;
            }
            return Ok(false);
        }

        self.log_activity(
            agent.id,
            ActivityKind::Tournament,
            format!(
                "Entered {} for {} tokens. Registration closes {}.",
                tournament.name,
                tournament.entry_fee,
                tournament.registration_deadline.format("%H:%M UTC"),
            ),
        )
        .await?;
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Advancing
    // -----------------------------------------------------------------------

    /// Take the next step of a tournament's lifecycle.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Db`] if a persistence call outside the per-match
    /// and per-participant loops fails. Failures inside those loops are
    /// logged and skipped.
    pub async fn advance_tournament(&self, id: TournamentId) -> Result<AdvanceOutcome, CoreError> {
        self.advance_tournament_at(id, Utc::now()).await
    }

    /// [`Self::advance_tournament`] with `now` as the current time.
    ///
    /// # Errors
    ///
    /// See [`Self::advance_tournament`].
    pub async fn advance_tournament_at(
        &self,
        id: TournamentId,
        now: DateTime<Utc>,
    ) -> Result<AdvanceOutcome, CoreError> {
        let Some(tournament) = self.store().get_tournament(id).await? else {
            return Ok(AdvanceOutcome::NotFound);
        };
        let outcome = match tournament.status {
            TournamentStatus::Registering => self.close_registration(&tournament, now).await?,
            TournamentStatus::InProgress => self.advance_rounds(&tournament).await?,
            TournamentStatus::Settling => self.settle_tournament(&tournament).await?,
            TournamentStatus::Completed | TournamentStatus::Cancelled => {
                no_action(format!("tournament is {}", tournament.status))
            }
        };
        if outcome.is_progress() {
            info!(tournament_id = %id, action = outcome.action(), "{}", outcome.detail());
        } else {
            debug!(tournament_id = %id, action = outcome.action(), "{}", outcome.detail());
        }
        Ok(outcome)
    }

    async fn close_registration(
        &self,
        tournament: &Tournament,
        now: DateTime<Utc>,
    ) -> Result<AdvanceOutcome, CoreError> {
        if now < tournament.registration_deadline {
            return Ok(AdvanceOutcome::Waiting {
                deadline: tournament.registration_deadline,
            });
        }

        let participants = self.store().list_participants(tournament.id).await?;
        let count = u32::try_from(participants.len()).unwrap_or(u32::MAX);

        if count < tournament.min_participants {
            if !self
                .store()
                .transition_tournament(
                    tournament.id,
                    TournamentStatus::Registering,
                    TournamentStatus::Cancelled,
                )
                .await?
            {
                return Ok(no_action("registration already closed"));
            }
            let mut refunded = 0_u32;
            for p in participants.iter().filter(|p| !p.is_npc) {
                match self.refund_entry(tournament, p, count).await {
                    Ok(()) => refunded = refunded.saturating_add(1),
                    Err(e) => {
                        warn!(tournament_id = %tournament.id, agent_id = %p.agent_id, error = %e, "refund failed");
                    }
                }
            }
            return Ok(AdvanceOutcome::Cancelled { refunded });
        }

        if !self
            .store()
            .transition_tournament(
                tournament.id,
                TournamentStatus::Registering,
                TournamentStatus::InProgress,
            )
            .await?
        {
            return Ok(no_action("registration already closed"));
        }
        if !self.open_round(tournament, 0, &participants, &[]).await? {
            return Ok(no_action("round 1 already paired"));
        }
        Ok(AdvanceOutcome::Started {
            participants: count,
        })
    }

    async fn refund_entry(
        &self,
        tournament: &Tournament,
        participant: &TournamentParticipant,
        enrolled: u32,
    ) -> Result<(), CoreError> {
        let mut agent = self.require_agent(participant.agent_id).await?;
        let mut ledger = Ledger::new();
        if tournament.entry_fee > 0 {
            ledger.record_reward(
                &mut agent,
                tournament.entry_fee,
                &format!("Refund: {} cancelled", tournament.name),
                Some(tournament.id.into_inner()),
            )?;
        }
        self.commit_journal(agent.id, &mut ledger, Overdraft::Cap)
            .await?;
        self.log_activity(
            agent.id,
            ActivityKind::Tournament,
            format!(
                "{} was cancelled with {enrolled} of {} required players. Entry fee of {} tokens refunded.",
                tournament.name, tournament.min_participants, tournament.entry_fee,
            ),
        )
        .await
    }

    async fn advance_rounds(&self, tournament: &Tournament) -> Result<AdvanceOutcome, CoreError> {
        if tournament.current_round == 0 {
            // Registration closed but round one was never opened.
            let participants = self.store().list_participants(tournament.id).await?;
            return Ok(if self.open_round(tournament, 0, &participants, &[]).await? {
                AdvanceOutcome::RoundGenerated { round: 1 }
            } else {
                no_action("round 1 already paired")
            });
        }

        let round = tournament.current_round;
        let matches = self.store().list_matches(tournament.id).await?;
        let pending: Vec<&TournamentMatch> = matches
            .iter()
            .filter(|m| m.round == round && m.status == MatchStatus::Pending)
            .collect();

        if !pending.is_empty() {
            let mut played = 0_u32;
            let mut failed = 0_u32;
            for m in pending {
                match self.play_match(tournament, m).await {
                    Ok(true) => played = played.saturating_add(1),
                    Ok(false) => {}
                    Err(e) => {
                        failed = failed.saturating_add(1);
                        warn!(tournament_id = %tournament.id, match_id = %m.id, error = %e, "match failed");
                    }
                }
            }
            if played == 0 && failed == 0 {
                return Ok(no_action(format!("round {round} already played")));
            }
            return Ok(AdvanceOutcome::RoundExecuted {
                round,
                played,
                failed,
            });
        }

        if round < tournament.total_rounds {
            let participants = self.store().list_participants(tournament.id).await?;
            return Ok(
                if self
                    .open_round(tournament, round, &participants, &matches)
                    .await?
                {
                    AdvanceOutcome::RoundGenerated {
                        round: round.saturating_add(1),
                    }
                } else {
                    no_action(format!("round {} already paired", round.saturating_add(1)))
                },
            );
        }

        if self
            .store()
            .transition_tournament(
                tournament.id,
                TournamentStatus::InProgress,
                TournamentStatus::Settling,
            )
            .await?
        {
            Ok(AdvanceOutcome::Settling)
        } else {
            Ok(no_action("settlement already started"))
        }
    }

    /// Pair round `from + 1` from current standings and history and open it.
    /// `false` if another caller opened it first.
    async fn open_round(
        &self,
        tournament: &Tournament,
        from: u32,
        participants: &[TournamentParticipant],
        history: &[TournamentMatch],
    ) -> Result<bool, CoreError> {
        let round = from.saturating_add(1);
        let pairings = swiss_pairing(&pairing_entries(participants, history));
        let start = RoundStart {
            tournament_id: tournament.id,
            from_round: from,
            to_round: round,
            matches: pairings
                .pairs
                .iter()
                .map(|&(agent1_id, agent2_id)| TournamentMatch {
                    id: MatchId::new(),
                    tournament_id: tournament.id,
                    round,
                    agent1_id,
                    agent2_id,
                    winner_id: None,
                    agent1_score: 0,
                    agent2_score: 0,
                    narrative: None,
                    status: MatchStatus::Pending,
                })
                .collect(),
            byes: pairings.bye.into_iter().collect(),
        };
        let opened = self.store().start_round(&start).await?;
        if opened {
            debug!(
                tournament_id = %tournament.id,
                round,
                matches = start.matches.len(),
                bye = ?pairings.bye,
                "round opened"
            );
        }
        Ok(opened)
    }

    /// Play one pending match. `false` if it was already completed.
    async fn play_match(
        &self,
        tournament: &Tournament,
        pending: &TournamentMatch,
    ) -> Result<bool, CoreError> {
        let a = self.require_agent(pending.agent1_id).await?;
        let b = self.require_agent(pending.agent2_id).await?;
        let duel = self.with_rng(|rng| {
            simulate_duel(
                &a,
                &b,
                DuelContext {
                    tournament_name: &tournament.name,
                    round: pending.round,
                },
                rng,
            )
        });
        let result = MatchResult {
            match_id: pending.id,
            winner_id: duel.winner,
            agent1_score: duel.score_a,
            agent2_score: duel.score_b,
            narrative: duel.narrative,
        };
        Ok(self.store().complete_match(&result).await?)
    }

    // -----------------------------------------------------------------------
    // Settlement
    // -----------------------------------------------------------------------

    async fn settle_tournament(&self, tournament: &Tournament) -> Result<AdvanceOutcome, CoreError> {
        let mut standings = self.store().list_participants(tournament.id).await?;
        standings.sort_by(|a, b| b.score.cmp(&a.score));
        let field = u32::try_from(standings.len()).unwrap_or(u32::MAX);
        let distribution = &self.config().tournament.prize_distribution;

        let mut finalized = 0_u32;
        let mut failed = 0_u32;
        for (index, participant) in standings.iter().enumerate() {
            let placement = u32::try_from(index).unwrap_or(u32::MAX).saturating_add(1);
            let prize = if participant.is_npc {
                0
            } else {
                prize_share(tournament.prize_pool, distribution.get(index))
            };
            match self
                .finalize_placement(tournament, participant, placement, prize, field)
                .await
            {
                Ok(true) => finalized = finalized.saturating_add(1),
                Ok(false) => {}
                Err(e) => {
                    failed = failed.saturating_add(1);
                    warn!(tournament_id = %tournament.id, agent_id = %participant.agent_id, error = %e, "placement failed");
                }
            }
        }
        if failed > 0 {
            // Recorded placements are skipped on the retry.
            return Ok(no_action(format!("{failed} placements failed, retrying")));
        }

        let champion = standings.first();
        let narrative = match champion {
            Some(top) => format!(
                "{} wins {} with {} points ({}-{}-{}), taking {} tokens from a {}-token pool. {field} players competed.",
                top.nickname,
                tournament.name,
                top.score,
                top.wins,
                top.draws,
                top.losses,
                if top.is_npc {
                    0
                } else {
                    prize_share(tournament.prize_pool, distribution.first())
                },
                tournament.prize_pool,
            ),
            None => format!("{} closed without finishers.", tournament.name),
        };
        self.store()
            .set_tournament_narrative(tournament.id, &narrative)
            .await?;

        if !self
            .store()
            .transition_tournament(
                tournament.id,
                TournamentStatus::Settling,
                TournamentStatus::Completed,
            )
            .await?
        {
            return Ok(no_action("tournament already completed"));
        }
        debug!(tournament_id = %tournament.id, finalized, "placements recorded");
        Ok(AdvanceOutcome::Completed {
            champion: champion.map(|c| c.nickname.clone()),
        })
    }

    /// Record a placement and pay its prize. `false` if the placement was
    /// already recorded.
    async fn finalize_placement(
        &self,
        tournament: &Tournament,
        participant: &TournamentParticipant,
        placement: u32,
        prize: i64,
        field: u32,
    ) -> Result<bool, CoreError> {
        if !self
            .store()
            .finalize_participant(tournament.id, participant.agent_id, placement, prize)
            .await?
        {
            return Ok(false);
        }
        if participant.is_npc {
            return Ok(true);
        }

        let mut agent = self.require_agent(participant.agent_id).await?;
        let mut ledger = Ledger::new();
        if prize > 0 {
            ledger.record_reward(
                &mut agent,
                prize,
                &format!("Prize: #{placement} in {}", tournament.name),
                Some(tournament.id.into_inner()),
            )?;
        }
        self.commit_journal(agent.id, &mut ledger, Overdraft::Cap)
            .await?;
        self.log_activity(
            agent.id,
            ActivityKind::Tournament,
            format!(
                "Finished #{placement} of {field} in {} with {} points ({}W {}D {}L). Prize: {prize} tokens.",
                tournament.name,
                participant.score,
                participant.wins,
                participant.draws,
                participant.losses,
            ),
        )
        .await?;
        self.audit_agent(agent.id).await?;
        Ok(true)
    }
}

/// Display name of the `number`-th tournament.
fn tournament_name(number: u32) -> String {
    let index = usize::try_from(number.saturating_sub(1))
        .unwrap_or(0)
        .checked_rem(TOURNAMENT_NAMES.len())
        .unwrap_or(0);
    let stem = TOURNAMENT_NAMES.get(index).copied().unwrap_or("Swiss Open");
    format!("{stem} #{number}")
}

/// `floor(pool * share)`; zero for places without a share.
fn prize_share(pool: i64, share: Option<&Decimal>) -> i64 {
    share
        .and_then(|s| Decimal::from(pool).checked_mul(*s))
        .and_then(|d| d.floor().to_i64())
        .unwrap_or(0)
        .max(0)
}

fn seed_of(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prize_shares_floor() {
        assert_eq!(prize_share(333, Some(&Decimal::new(50, 2))), 166);
        assert_eq!(prize_share(333, Some(&Decimal::new(30, 2))), 99);
        assert_eq!(prize_share(333, Some(&Decimal::new(20, 2))), 66);
        assert_eq!(prize_share(333, None), 0);
    }

    #[test]
    fn names_cycle_with_numbers() {
        assert_eq!(tournament_name(1), "Swiss Open #1");
        assert_eq!(tournament_name(2), "Court Kings Invitational #2");
        assert_eq!(tournament_name(5), "Swiss Open #5");
    }

    #[test]
    fn outcomes_serialize_with_action_tag() {
        let outcome = AdvanceOutcome::RoundGenerated { round: 2 };
        let json = serde_json::to_value(&outcome).unwrap_or_default();
        assert_eq!(json["action"], "round_generated");
        assert_eq!(json["round"], 2);
        assert!(outcome.is_progress());

        let idle = no_action("nothing to do");
        assert!(!idle.is_progress());
        assert_eq!(idle.to_string(), "no_action: nothing to do");
    }
}
