//! Prompt template loading and rendering via `minijinja`.
//!
//! Every template ships embedded in the binary so the judge works with no
//! files on disk. When a templates directory is configured, any file found
//! there replaces its embedded counterpart, so operators can tune the
//! world model's voice without recompiling.

use minijinja::Environment;

use crate::error::JudgeError;

/// The embedded template set as `(name, file, source)`.
const EMBEDDED: &[(&str, &str, &str)] = &[
    ("system", "system.j2", include_str!("../templates/system.j2")),
    ("game", "game.j2", include_str!("../templates/game.j2")),
    ("season", "season.j2", include_str!("../templates/season.j2")),
    ("reflection", "reflection.j2", include_str!("../templates/reflection.j2")),
    ("world_event", "world_event.j2", include_str!("../templates/world_event.j2")),
    ("persona", "persona.j2", include_str!("../templates/persona.j2")),
    ("dialogue", "dialogue.j2", include_str!("../templates/dialogue.j2")),
    ("reaction", "reaction.j2", include_str!("../templates/reaction.j2")),
];

/// One kind of request sent to the world model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptTask {
    /// Adjudicate one season game.
    Game,
    /// Settle one agent's season.
    Season,
    /// Turn a reflection into training boosts.
    Reflection,
    /// One line of off-court news.
    WorldEvent,
    /// One line of in-character game talk.
    Dialogue,
    /// An agent answering a challenge or note from another.
    Reaction,
}

impl PromptTask {
    const fn templates(self) -> (&'static str, &'static str) {
        match self {
            Self::Game => ("system", "game"),
            Self::Season => ("system", "season"),
            Self::Reflection => ("system", "reflection"),
            Self::WorldEvent => ("system", "world_event"),
            Self::Dialogue => ("persona", "dialogue"),
            Self::Reaction => ("persona", "reaction"),
        }
    }

    /// Whether the task expects a JSON object back.
    pub const fn expects_json(self) -> bool {
        matches!(self, Self::Game | Self::Season | Self::Reflection)
    }

    const fn temperature(self) -> f32 {
        match self {
            Self::Game => 0.9,
            Self::Season | Self::Reflection => 0.7,
            Self::WorldEvent | Self::Dialogue | Self::Reaction => 1.0,
        }
    }

    const fn max_tokens(self) -> u32 {
        match self {
            Self::Game | Self::Season | Self::Reflection => 1024,
            Self::WorldEvent => 200,
            Self::Dialogue | Self::Reaction => 150,
        }
    }
}

/// The complete rendered prompt ready to send to a model backend.
#[derive(Debug, Clone)]
pub struct RenderedPrompt {
    /// System message establishing the world or the speaking persona.
    pub system: String,
    /// User message carrying the task context.
    pub user: String,
    /// Ask the backend for a JSON object response.
    pub json_response: bool,
    /// Sampling temperature.
    pub temperature: f32,
    /// Completion length cap.
    pub max_tokens: u32,
}

impl RenderedPrompt {
    /// A free-text prompt with default sampling settings.
    pub fn plain(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            json_response: false,
            temperature: 1.0,
            max_tokens: 200,
        }
    }
}

/// Manages prompt template loading and rendering.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl std::fmt::Debug for PromptEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptEngine").finish_non_exhaustive()
    }
}

impl PromptEngine {
    /// Create a prompt engine using only the embedded templates.
    ///
    /// # Errors
    ///
    /// Returns [`JudgeError::Template`] if an embedded template fails to
    /// compile.
    pub fn embedded() -> Result<Self, JudgeError> {
        Self::new(None)
    }

    /// Create a prompt engine, preferring files in `templates_dir` over the
    /// embedded templates.
    ///
    /// # Errors
    ///
    /// Returns [`JudgeError::Template`] if an override cannot be read or
    /// any template fails to compile.
    pub fn new(templates_dir: Option<&str>) -> Result<Self, JudgeError> {
        let mut env = Environment::new();

        for (name, file, source) in EMBEDDED {
            let text = match templates_dir {
                Some(dir) if std::path::Path::new(dir).join(file).is_file() => {
                    load_template(dir, file)?
                }
                _ => (*source).to_owned(),
            };
            env.add_template_owned(*name, text).map_err(|e| {
                JudgeError::Template(format!("failed to add {name} template: {e}"))
            })?;
        }

        Ok(Self { env })
    }

    /// Render the prompt for `task` against a JSON context.
    ///
    /// # Errors
    ///
    /// Returns [`JudgeError::Template`] if rendering fails.
    pub fn render(
        &self,
        task: PromptTask,
        context: &serde_json::Value,
    ) -> Result<RenderedPrompt, JudgeError> {
        let (system_name, user_name) = task.templates();
        Ok(RenderedPrompt {
            system: self.render_one(system_name, context)?,
            user: self.render_one(user_name, context)?,
            json_response: task.expects_json(),
            temperature: task.temperature(),
            max_tokens: task.max_tokens(),
        })
    }

    fn render_one(&self, name: &str, context: &serde_json::Value) -> Result<String, JudgeError> {
        self.env
            .get_template(name)
            .map_err(|e| JudgeError::Template(format!("missing {name} template: {e}")))?
            .render(context)
            .map_err(|e| JudgeError::Template(format!("{name} render failed: {e}")))
    }
}

/// Read a template file from disk.
fn load_template(dir: &str, filename: &str) -> Result<String, JudgeError> {
    let path = format!("{dir}/{filename}");
    std::fs::read_to_string(&path)
        .map_err(|e| JudgeError::Template(format!("failed to read {path}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str) -> serde_json::Value {
        serde_json::json!({
            "nickname": name,
            "team": "Harbor Hawks",
            "position": "PG",
            "attributes": {
                "shooting": 70, "defense": 60, "speed": 75, "stamina": 65,
                "basketball_iq": 80, "passing": 85, "rebounding": 40
            },
            "luck_value": 55,
            "cognitive_score": 60,
            "wins": 3,
            "losses": 1,
            "token_balance": 1000,
            "life_vision": null
        })
    }

    #[test]
    fn embedded_game_prompt_renders() {
        let engine = PromptEngine::embedded();
        assert!(engine.is_ok());
        let Ok(engine) = engine else { return };

        let ctx = serde_json::json!({
            "home": profile("Ace"),
            "away": profile("Blaze"),
            "game": {
                "season_num": 2, "game_num": 7, "total_games": 30,
                "home_score": 101, "away_score": 97
            }
        });
        let prompt = engine.render(PromptTask::Game, &ctx);
        assert!(prompt.is_ok());
        let Ok(prompt) = prompt else { return };

        assert!(prompt.system.contains("world model of Courtside"));
        assert!(prompt.user.contains("Nickname: Ace"));
        assert!(prompt.user.contains("Nickname: Blaze"));
        assert!(prompt.user.contains("Season 2, game 7 of 30"));
        assert!(prompt.user.contains("101:97"));
        assert!(prompt.json_response);
    }

    #[test]
    fn dialogue_prompt_uses_persona() {
        let Ok(engine) = PromptEngine::embedded() else {
            return;
        };
        let ctx = serde_json::json!({
            "agent": profile("Ace"),
            "opponent": profile("Blaze"),
            "phase": "post_game",
            "my_score": 110,
            "their_score": 99,
            "leading": true
        });
        let prompt = engine.render(PromptTask::Dialogue, &ctx);
        assert!(prompt.is_ok_and(|p| {
            p.system.contains("You are \"Ace\"")
                && p.user.contains("110:99")
                && p.user.contains("victory speech")
                && !p.json_response
        }));
    }

    #[test]
    fn directory_override_replaces_embedded() {
        let unique = format!(
            "courtside_test_templates_{}_{:?}",
            std::process::id(),
            std::thread::current().id()
        );
        let dir = std::env::temp_dir().join(unique);
        std::fs::create_dir_all(&dir).ok();
        std::fs::write(dir.join("world_event.j2"), "NEWS for {{ agent.nickname }}").ok();

        let engine = PromptEngine::new(dir.to_str());
        assert!(engine.is_ok());
        let Ok(engine) = engine else { return };

        let ctx = serde_json::json!({"agent": profile("Ace")});
        let prompt = engine.render(PromptTask::WorldEvent, &ctx);
        assert!(prompt.is_ok_and(|p| p.user == "NEWS for Ace"
            && p.system.contains("world model of Courtside")));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn task_flags() {
        assert!(PromptTask::Season.expects_json());
        assert!(PromptTask::Reflection.expects_json());
        assert!(!PromptTask::WorldEvent.expects_json());
        assert!(!PromptTask::Dialogue.expects_json());
        assert!(!PromptTask::Reaction.expects_json());
    }

    #[test]
    fn reaction_prompt_quotes_the_sender() {
        let Ok(engine) = PromptEngine::embedded() else {
            return;
        };
        let ctx = serde_json::json!({
            "agent": profile("Blaze"),
            "sender": profile("Ace"),
            "kind": "provoke",
            "message": "You can't guard me",
        });
        let prompt = engine.render(PromptTask::Reaction, &ctx);
        assert!(prompt.is_ok_and(|p| {
            p.system.contains("You are \"Blaze\"")
                && p.user.starts_with("Ace just called you out")
                && p.user.contains("You can't guard me")
        }));

        let ctx = serde_json::json!({
            "agent": profile("Blaze"),
            "sender": profile("Ace"),
            "kind": "comment",
            "message": null,
        });
        let prompt = engine.render(PromptTask::Reaction, &ctx);
        assert!(prompt.is_ok_and(|p| p.user.contains("\"Nice game!\"")));
    }
}
