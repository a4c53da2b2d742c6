//! Inputs handed to the judge.
//!
//! The judge never sees storage rows directly; callers project an
//! [`Agent`] into a [`JudgeProfile`] and describe the game with a
//! [`GameContext`]. Both serialize straight into the prompt templates.

use courtside_types::{Agent, AgentId, Attributes, Position};
use serde::Serialize;

/// Team label used for agents without a team assignment.
pub const FREE_AGENT: &str = "Free Agent";

/// What the judge knows about one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JudgeProfile {
    /// Agent identity, used to attribute generated dialogue.
    pub id: AgentId,
    /// Display name.
    pub nickname: String,
    /// Team name, or [`FREE_AGENT`].
    pub team: String,
    /// On-court position.
    pub position: Position,
    /// Current skill ratings.
    pub attributes: Attributes,
    /// Luck value.
    pub luck_value: u8,
    /// Cognitive score.
    pub cognitive_score: u8,
    /// Career wins.
    pub wins: u32,
    /// Career losses.
    pub losses: u32,
    /// Current token balance.
    pub token_balance: i64,
    /// Free-text personal vision, if any.
    pub life_vision: Option<String>,
    /// NPCs never get model-generated dialogue.
    pub is_npc: bool,
}

impl From<&Agent> for JudgeProfile {
    fn from(agent: &Agent) -> Self {
        Self {
            id: agent.id,
            nickname: agent.nickname.clone(),
            team: agent
                .team
                .clone()
                .unwrap_or_else(|| FREE_AGENT.to_owned()),
            position: agent.position,
            attributes: agent.attributes,
            luck_value: agent.luck_value,
            cognitive_score: agent.cognitive_score,
            wins: agent.wins,
            losses: agent.losses,
            token_balance: agent.token_balance,
            life_vision: agent.life_vision.clone(),
            is_npc: agent.is_npc,
        }
    }
}

/// Where a game sits in the season and what the simulator produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameContext {
    /// Season number.
    pub season_num: u32,
    /// One-based index of this game within the season.
    pub game_num: u32,
    /// Season length.
    pub total_games: u32,
    /// Simulated base score for the home side.
    pub home_score: u32,
    /// Simulated base score for the away side.
    pub away_score: u32,
    /// Narrative produced by the simulator.
    pub narrative: String,
}

/// Short summary of a recently played game, fed to reflection analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecentGame {
    /// Whether the agent won.
    pub won: bool,
    /// Points scored.
    pub points: u32,
    /// Rebounds.
    pub rebounds: u32,
    /// Assists.
    pub assists: u32,
}
