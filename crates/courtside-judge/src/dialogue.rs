//! Pre-game, in-game and post-game talk for season games.
//!
//! Only non-NPC agents speak. Each speaker gets one line per phase, in
//! phase order, produced by the judge (model first, templates second).

use chrono::Utc;
use courtside_types::{GameId, GameInteraction, InteractionId, InteractionPhase};

use crate::context::{GameContext, JudgeProfile};
use crate::judge::WorldJudge;

/// Generates the interaction lines for a finished game.
#[derive(Debug, Clone, Copy)]
pub struct DialogueGenerator<'a> {
    judge: &'a WorldJudge,
}

impl<'a> DialogueGenerator<'a> {
    /// Wrap a judge.
    pub const fn new(judge: &'a WorldJudge) -> Self {
        Self { judge }
    }

    /// Lines for every non-NPC side of the game. Returns an empty list for
    /// an all-NPC game.
    ///
    /// `ctx` carries the final scores.
    pub async fn generate(
        &self,
        game_id: GameId,
        home: &JudgeProfile,
        away: &JudgeProfile,
        ctx: &GameContext,
    ) -> Vec<GameInteraction> {
        let mut lines = Vec::new();
        let sides = [
            (home, away, ctx.home_score, ctx.away_score),
            (away, home, ctx.away_score, ctx.home_score),
        ];

        for (speaker, opponent, mine, theirs) in sides {
            if speaker.is_npc {
                continue;
            }
            for phase in InteractionPhase::ALL {
                let content = self
                    .judge
                    .dialogue_line(*phase, speaker, opponent, mine, theirs)
                    .await;
                lines.push(GameInteraction {
                    id: InteractionId::new(),
                    game_id,
                    agent_id: speaker.id,
                    phase: *phase,
                    content,
                    created_at: Utc::now(),
                });
            }
        }

        lines
    }
}
