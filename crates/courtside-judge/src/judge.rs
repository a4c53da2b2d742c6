//! The world judge: model adjudication with a deterministic safety net.
//!
//! Every public method follows the same pipeline:
//! 1. Compute the local fallback result (no `await` while the RNG is held)
//! 2. If no backend is configured, return the fallback
//! 3. Render the prompt and call the backend under a deadline
//! 4. Extract a JSON object from the reply
//! 5. Merge it field by field over the fallback, clamping every number
//!
//! Any failure in steps 3-4 is logged and answered with the fallback, so
//! callers always get a complete in-bounds result and cannot tell which
//! path produced it.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use courtside_types::{InteractionPhase, ReactionKind, ReactionSource, SeasonStats, Skill};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::JudgeConfig;
use crate::context::{GameContext, JudgeProfile, RecentGame};
use crate::error::JudgeError;
use crate::fallback;
use crate::llm::{LlmBackend, create_backend};
use crate::parse::extract_json;
use crate::prompt::{PromptEngine, PromptTask};
use crate::verdict::{GameVerdict, ReflectionAnalysis, SeasonSettlement};

/// Longest free-text line accepted from the model.
const MAX_TEXT_LEN: usize = 400;

/// Adjudicates games, seasons and reflections.
#[derive(Debug)]
pub struct WorldJudge {
    backend: Option<LlmBackend>,
    prompts: PromptEngine,
    timeout: Duration,
    rng: Mutex<StdRng>,
}

impl WorldJudge {
    /// Build a judge from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`JudgeError::Template`] if the prompt templates fail to load.
    pub fn new(config: &JudgeConfig) -> Result<Self, JudgeError> {
        Ok(Self {
            backend: config.backend.as_ref().map(create_backend),
            prompts: PromptEngine::new(config.templates_dir.as_deref())?,
            timeout: config.timeout,
            rng: Mutex::new(StdRng::from_rng(&mut rand::rng())),
        })
    }

    /// A judge that never calls a model.
    ///
    /// # Errors
    ///
    /// Returns [`JudgeError::Template`] if the embedded templates fail to
    /// compile.
    pub fn fallback_only() -> Result<Self, JudgeError> {
        Self::new(&JudgeConfig::default())
    }

    /// Use `backend` with the given deadline.
    ///
    /// # Errors
    ///
    /// Returns [`JudgeError::Template`] if the embedded templates fail to
    /// compile.
    pub fn with_backend(backend: LlmBackend, deadline: Duration) -> Result<Self, JudgeError> {
        let mut judge = Self::fallback_only()?;
        judge.backend = Some(backend);
        judge.timeout = deadline;
        Ok(judge)
    }

    /// Reseed the fallback random source, making fallback output
    /// reproducible.
    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    /// Whether a model backend is configured.
    pub const fn is_model_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Run `f` against the fallback RNG.
    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut *rng)
    }

    /// Render, call and time-box one model request.
    async fn ask(&self, task: PromptTask, context: &serde_json::Value) -> Result<String, JudgeError> {
        let backend = self.backend.as_ref().ok_or(JudgeError::Disabled)?;
        let prompt = self.prompts.render(task, context)?;

        match timeout(self.timeout, backend.complete(&prompt)).await {
            Ok(result) => result,
            Err(_) => Err(JudgeError::Timeout {
                timeout_ms: self.timeout.as_millis(),
            }),
        }
    }

    /// Ask for a JSON object, logging and returning `None` on any failure.
    async fn ask_json(
        &self,
        task: PromptTask,
        context: &serde_json::Value,
    ) -> Option<serde_json::Value> {
        let result = match self.ask(task, context).await {
            Ok(raw) => extract_json(&raw),
            Err(e) => Err(e),
        };
        match result {
            Ok(value) => Some(value),
            Err(JudgeError::Disabled) => None,
            Err(e) => {
                warn!(
                    error = %e,
                    task = ?task,
                    backend = self.backend.as_ref().map_or("none", LlmBackend::name),
                    "world model call failed, using fallback"
                );
                None
            }
        }
    }

    /// Ask for one line of free text, logging and returning `None` on any
    /// failure or on an empty reply.
    async fn ask_text(&self, task: PromptTask, context: &serde_json::Value) -> Option<String> {
        match self.ask(task, context).await {
            Ok(raw) => {
                let line = raw.trim().trim_matches('"').trim();
                if line.is_empty() {
                    debug!(task = ?task, "world model returned empty text, using fallback");
                    return None;
                }
                Some(line.chars().take(MAX_TEXT_LEN).collect())
            }
            Err(JudgeError::Disabled) => None,
            Err(e) => {
                warn!(error = %e, task = ?task, "world model call failed, using fallback");
                None
            }
        }
    }

    // -----------------------------------------------------------------------
    // Public operations
    // -----------------------------------------------------------------------

    /// Adjudicate one season game.
    pub async fn judge_game(
        &self,
        home: &JudgeProfile,
        away: &JudgeProfile,
        ctx: &GameContext,
    ) -> GameVerdict {
        let fallback = self.with_rng(|rng| fallback::game_verdict(home, away, ctx, rng));
        if !self.is_model_enabled() {
            return fallback;
        }

        let context = serde_json::json!({ "home": home, "away": away, "game": ctx });
        match self.ask_json(PromptTask::Game, &context).await {
            Some(value) => GameVerdict::from_model(&value, fallback),
            None => fallback,
        }
    }

    /// Settle one agent's season.
    pub async fn settle_season(
        &self,
        agent: &JudgeProfile,
        stats: &SeasonStats,
        season_num: u32,
    ) -> SeasonSettlement {
        let fallback = fallback::season_settlement(agent, stats);
        if !self.is_model_enabled() {
            return fallback;
        }

        let games = f64::from(stats.games_played.max(1));
        let context = serde_json::json!({
            "agent": agent,
            "stats": stats,
            "season_num": season_num,
            "win_rate_pct": format!("{:.1}", stats.win_rate() * 100.0),
            "ppg": format!("{:.1}", f64::from(stats.points) / games),
            "rpg": format!("{:.1}", f64::from(stats.rebounds) / games),
            "apg": format!("{:.1}", f64::from(stats.assists) / games),
        });
        match self.ask_json(PromptTask::Season, &context).await {
            Some(value) => SeasonSettlement::from_model(&value, fallback),
            None => fallback,
        }
    }

    /// Turn a free-text reflection into training boosts.
    pub async fn analyze_reflection(
        &self,
        agent: &JudgeProfile,
        content: &str,
        focus: Option<Skill>,
        recent_games: &[RecentGame],
    ) -> ReflectionAnalysis {
        let fallback = self.with_rng(|rng| fallback::reflection_analysis(focus, rng));
        if !self.is_model_enabled() {
            return fallback;
        }

        let context = serde_json::json!({
            "agent": agent,
            "content": content,
            "focus": focus,
            "recent_games": recent_games,
        });
        match self.ask_json(PromptTask::Reflection, &context).await {
            Some(value) => ReflectionAnalysis::from_model(&value, fallback),
            None => fallback,
        }
    }

    /// One line of off-court news about `agent`.
    pub async fn world_event(&self, agent: &JudgeProfile) -> String {
        let fallback = self.with_rng(|rng| fallback::world_event(agent, rng));
        if !self.is_model_enabled() {
            return fallback;
        }

        let context = serde_json::json!({ "agent": agent });
        self.ask_text(PromptTask::WorldEvent, &context)
            .await
            .unwrap_or(fallback)
    }

    /// One line of in-character talk from `speaker` for a game phase.
    ///
    /// `my_score` and `their_score` are from the speaker's point of view.
    pub async fn dialogue_line(
        &self,
        phase: InteractionPhase,
        speaker: &JudgeProfile,
        opponent: &JudgeProfile,
        my_score: u32,
        their_score: u32,
    ) -> String {
        let ahead = my_score > their_score;
        let fallback =
            self.with_rng(|rng| fallback::dialogue_line(phase, speaker, opponent, ahead, rng));
        if !self.is_model_enabled() {
            return fallback;
        }

        let context = serde_json::json!({
            "agent": speaker,
            "opponent": opponent,
            "phase": phase,
            "my_score": my_score,
            "their_score": their_score,
            "leading": ahead,
        });
        self.ask_text(PromptTask::Dialogue, &context)
            .await
            .unwrap_or(fallback)
    }

    /// `replier`'s answer to a reaction from `sender`, with who wrote it.
    /// `None` for kinds that draw no answer.
    pub async fn reply_to_reaction(
        &self,
        replier: &JudgeProfile,
        sender: &JudgeProfile,
        kind: ReactionKind,
        message: Option<&str>,
    ) -> Option<(String, ReactionSource)> {
        let fallback = self.with_rng(|rng| fallback::reaction_reply(kind, replier, sender, rng))?;
        if !self.is_model_enabled() {
            return Some((fallback, ReactionSource::Fallback));
        }

        let context = serde_json::json!({
            "agent": replier,
            "sender": sender,
            "kind": kind,
            "message": message,
        });
        Some(match self.ask_text(PromptTask::Reaction, &context).await {
            Some(line) => (line, ReactionSource::Model),
            None => (fallback, ReactionSource::Fallback),
        })
    }
}
