//! Agent-to-agent reactions around a played game.
//!
//! A provocation or comment draws an in-character answer from its target,
//! written by the judge. Likes and disdain are recorded silently.

use chrono::Utc;
use courtside_judge::JudgeProfile;
use courtside_types::{
    AgentId, GameId, InteractionId, Reaction, ReactionId, ReactionKind, ReactionSource,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::CoreError;
use crate::league::League;

/// Longest accepted reaction message, in characters.
pub const MAX_REACTION_LEN: usize = 280;

/// A reaction submitted through the API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewReaction {
    /// Who reacts.
    pub from_agent_id: AgentId,
    /// Who it is aimed at.
    pub to_agent_id: AgentId,
    /// Kind of reaction.
    pub kind: ReactionKind,
    /// Optional text.
    #[serde(default)]
    pub message: Option<String>,
    /// Dialogue line being answered, if any.
    #[serde(default)]
    pub interaction_id: Option<InteractionId>,
}

/// A stored reaction and the answer it drew.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReactionExchange {
    /// The submitted reaction.
    pub reaction: Reaction,
    /// The target's answer, for provocations and comments.
    pub reply: Option<Reaction>,
}

impl League {
    /// Record a reaction to `game_id` and, when the kind calls for it, the
    /// target's answer.
    ///
    /// A failure to store the answer is logged; the reaction itself stands.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] for self-reactions, overlong
    /// messages, an inactive sender or a dialogue line from another game,
    /// and [`CoreError::NotFound`] for an unknown game or agent.
    pub async fn react(
        &self,
        game_id: GameId,
        request: NewReaction,
    ) -> Result<ReactionExchange, CoreError> {
        if request.from_agent_id == request.to_agent_id {
            return Err(CoreError::Validation(
                "an agent cannot react to itself".to_owned(),
            ));
        }
        let message = request
            .message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(ToOwned::to_owned);
        if message
            .as_ref()
            .is_some_and(|m| m.chars().count() > MAX_REACTION_LEN)
        {
            return Err(CoreError::Validation(format!(
                "reaction longer than {MAX_REACTION_LEN} characters"
            )));
        }

        if self.store().get_game(game_id).await?.is_none() {
            return Err(CoreError::NotFound(format!("game {game_id}")));
        }
        if let Some(line) = request.interaction_id {
            let on_game = self
                .store()
                .list_interactions(game_id)
                .await?
                .iter()
                .any(|i| i.id == line);
            if !on_game {
                return Err(CoreError::Validation(format!(
                    "interaction {line} is not part of game {game_id}"
                )));
            }
        }
        let sender = self.require_agent(request.from_agent_id).await?;
        if !sender.active {
            return Err(CoreError::Validation(format!(
                "agent {} is inactive",
                sender.id
            )));
        }
        let target = self.require_agent(request.to_agent_id).await?;

        let reaction = Reaction {
            id: ReactionId::new(),
            game_id,
            interaction_id: request.interaction_id,
            from_agent_id: sender.id,
            to_agent_id: target.id,
            kind: request.kind,
            message,
            source: ReactionSource::User,
            created_at: Utc::now(),
        };
        self.store().insert_reaction(&reaction).await?;
        info!(
            game_id = %game_id,
            from = %sender.id,
            to = %target.id,
            kind = %reaction.kind,
            "reaction recorded"
        );

        let answer = self
            .judge()
            .reply_to_reaction(
                &JudgeProfile::from(&target),
                &JudgeProfile::from(&sender),
                reaction.kind,
                reaction.message.as_deref(),
            )
            .await;
        let reply = match answer {
            Some((text, source)) => {
                let reply = Reaction {
                    id: ReactionId::new(),
                    from_agent_id: target.id,
                    to_agent_id: sender.id,
                    kind: ReactionKind::Comment,
                    message: Some(text),
                    source,
                    created_at: Utc::now(),
                    ..reaction.clone()
                };
                match self.store().insert_reaction(&reply).await {
                    Ok(()) => Some(reply),
                    Err(e) => {
                        warn!(game_id = %game_id, error = %e, "failed to store reaction reply");
                        None
                    }
                }
            }
            None => None,
        };

        Ok(ReactionExchange { reaction, reply })
    }

    /// Every reaction around `game_id`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for an unknown game.
    pub async fn list_reactions(&self, game_id: GameId) -> Result<Vec<Reaction>, CoreError> {
        if self.store().get_game(game_id).await?.is_none() {
            return Err(CoreError::NotFound(format!("game {game_id}")));
        }
        Ok(self.store().list_reactions(game_id).await?)
    }
}
