//! Agent registration, deactivation and reflection-driven training.

use chrono::Utc;
use courtside_judge::{JudgeProfile, RecentGame};
use courtside_ledger::initial_stake;
use courtside_sim::{calculate_ovr, calculate_salary, generate_attributes};
use courtside_types::{
    ActivityKind, Agent, AgentId, Attributes, COGNITIVE_MAX, Position, Reflection, ReflectionId,
    Skill,
};
use serde::Deserialize;
use tracing::info;

use crate::error::CoreError;
use crate::league::League;
use crate::season::least_populated_team;

/// Longest accepted nickname, in characters.
pub const MAX_NICKNAME_LEN: usize = 32;

/// Longest accepted reflection, in characters.
pub const MAX_REFLECTION_LEN: usize = 2000;

/// Registration request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewAgent {
    /// Display name.
    pub nickname: String,
    /// On-court position.
    pub position: Position,
    /// Cognitive score; values above 100 are clamped.
    pub cognitive_score: u8,
    /// Luck value; values above 100 are clamped.
    pub luck_value: u8,
    /// Optional free-text ambition.
    #[serde(default)]
    pub life_vision: Option<String>,
}

/// A fresh agent with its initial stake and a salary matching its rating.
pub(crate) fn build_agent(
    nickname: String,
    is_npc: bool,
    position: Position,
    attributes: Attributes,
    luck_value: u8,
    cognitive_score: u8,
    life_vision: Option<String>,
) -> Agent {
    Agent {
        id: AgentId::new(),
        nickname,
        is_npc,
        active: true,
        position,
        attributes,
        luck_value: luck_value.min(100),
        cognitive_score: cognitive_score.min(COGNITIVE_MAX),
        life_vision,
        team: None,
        wins: 0,
        losses: 0,
        salary: calculate_salary(calculate_ovr(&attributes, position)),
        token_balance: initial_stake(is_npc),
        total_earned: 0,
        total_spent: 0,
        created_at: Utc::now(),
    }
}

impl League {
    /// Register a player-controlled agent on the least-populated team.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] for an empty or overlong
    /// nickname, or [`CoreError::Db`] if the insert fails.
    pub async fn register_agent(&self, request: NewAgent) -> Result<Agent, CoreError> {
        let nickname = request.nickname.trim().to_owned();
        if nickname.is_empty() {
            return Err(CoreError::Validation("nickname must not be empty".to_owned()));
        }
        if nickname.chars().count() > MAX_NICKNAME_LEN {
            return Err(CoreError::Validation(format!(
                "nickname longer than {MAX_NICKNAME_LEN} characters"
            )));
        }

        let attributes = self.with_rng(|rng| {
            generate_attributes(
                request.cognitive_score,
                request.luck_value,
                request.position,
                rng,
            )
        });
        let mut agent = build_agent(
            nickname,
            false,
            request.position,
            attributes,
            request.luck_value,
            request.cognitive_score,
            request.life_vision.filter(|v| !v.trim().is_empty()),
        );
        let roster = self.store().list_agents().await?;
        agent.team = Some(least_populated_team(&roster).to_owned());
        self.store().insert_agent(&agent).await?;

        self.log_activity(
            agent.id,
            ActivityKind::Joined,
            format!(
                "{} joins {} as a {} with a starting salary of {} tokens.",
                agent.nickname,
                agent.team.as_deref().unwrap_or("the league"),
                agent.position,
                agent.salary,
            ),
        )
        .await?;
        info!(agent_id = %agent.id, nickname = %agent.nickname, "agent registered");
        Ok(agent)
    }

    /// Take an agent out of every future simulation. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for an unknown agent.
    pub async fn deactivate_agent(&self, id: AgentId) -> Result<Agent, CoreError> {
        let mut agent = self.require_agent(id).await?;
        if self.store().deactivate_agent(id).await? {
            info!(agent_id = %agent.id, "agent deactivated");
        }
        agent.active = false;
        Ok(agent)
    }

    /// Turn a free-text reflection into training: the judge picks the
    /// boosted skills, which are applied and clamped.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] for empty or overlong content or
    /// an inactive agent, and [`CoreError::NotFound`] for an unknown one.
    pub async fn reflect(
        &self,
        agent_id: AgentId,
        content: &str,
        focus: Option<Skill>,
    ) -> Result<Reflection, CoreError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(CoreError::Validation("reflection must not be empty".to_owned()));
        }
        if content.chars().count() > MAX_REFLECTION_LEN {
            return Err(CoreError::Validation(format!(
                "reflection longer than {MAX_REFLECTION_LEN} characters"
            )));
        }
        let agent = self.require_agent(agent_id).await?;
        if !agent.active {
            return Err(CoreError::Validation(format!("agent {agent_id} is inactive")));
        }

        let recent: Vec<RecentGame> = self
            .store()
            .recent_game_stats(agent_id, 5)
            .await?
            .iter()
            .map(|line| RecentGame {
                won: line.won,
                points: line.box_score.points,
                rebounds: line.box_score.rebounds,
                assists: line.box_score.assists,
            })
            .collect();
        let analysis = self
            .judge()
            .analyze_reflection(&JudgeProfile::from(&agent), content, focus, &recent)
            .await;

        let boosts: Vec<(Skill, u8)> = core::iter::once(analysis.primary)
            .chain(analysis.secondary)
            .map(|b| (b.skill, b.amount))
            .collect();
        self.store()
            .apply_training(agent_id, &boosts, analysis.cognitive_boost)
            .await?;

        let reflection = Reflection {
            id: ReflectionId::new(),
            agent_id,
            content: content.to_owned(),
            focus,
            primary_skill: analysis.primary.skill,
            primary_amount: analysis.primary.amount,
            secondary_skill: analysis.secondary.map(|b| b.skill),
            secondary_amount: analysis.secondary.map_or(0, |b| b.amount),
            cognitive_boost: analysis.cognitive_boost,
            summary: analysis.summary,
            advice: analysis.advice,
            created_at: Utc::now(),
        };
        self.store().insert_reflection(&reflection).await?;

        let mut line = format!(
            "Training focus: {} +{}.",
            reflection.primary_skill, reflection.primary_amount
        );
        if let Some(skill) = reflection.secondary_skill {
            line.push_str(&format!(" {skill} +{}.", reflection.secondary_amount));
        }
        if reflection.cognitive_boost > 0 {
            line.push_str(&format!(" Cognition +{}.", reflection.cognitive_boost));
        }
        line.push(' ');
        line.push_str(&reflection.summary);
        self.log_activity(agent_id, ActivityKind::Reflection, line).await?;

        info!(agent_id = %agent_id, skill = %reflection.primary_skill, "reflection applied");
        Ok(reflection)
    }
}

#[cfg(test)]
mod tests {
    use courtside_ledger::{NPC_STAKE, REAL_AGENT_STAKE};

    use super::*;

    #[test]
    fn built_agents_carry_their_stake_and_salary() {
        let attrs = Attributes::uniform(72);
        let real = build_agent(
            "Ace".to_owned(),
            false,
            Position::Center,
            attrs,
            140,
            200,
            None,
        );
        assert_eq!(real.token_balance, REAL_AGENT_STAKE);
        assert_eq!(real.salary, 120);
        assert_eq!(real.luck_value, 100);
        assert_eq!(real.cognitive_score, 100);
        assert!(real.active);

        let npc = build_agent("Npc".to_owned(), true, Position::Center, attrs, 50, 50, None);
        assert_eq!(npc.token_balance, NPC_STAKE);
    }
}
