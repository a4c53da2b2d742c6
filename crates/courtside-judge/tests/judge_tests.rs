//! End-to-end tests for the judge pipeline using scripted backends.
//!
//! A scripted backend stands in for the model so every path -- clean JSON,
//! out-of-range JSON, garbage, backend errors and slow replies -- runs
//! without a network.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use courtside_judge::{
    DialogueGenerator, GameContext, JudgeProfile, LlmBackend, MvpSide, ScriptedBackend,
    WorldJudge,
};
use courtside_types::{
    AgentId, Attributes, GameEventType, GameId, InteractionPhase, Position, ReactionKind,
    ReactionSource, SeasonId, SeasonStats, Skill,
};
use rust_decimal::Decimal;

fn profile(name: &str, skill: u8, is_npc: bool) -> JudgeProfile {
    JudgeProfile {
        id: AgentId::new(),
        nickname: name.to_owned(),
        team: "Harbor Hawks".to_owned(),
        position: Position::PointGuard,
        attributes: Attributes::uniform(skill),
        luck_value: 50,
        cognitive_score: 50,
        wins: 4,
        losses: 2,
        token_balance: 1000,
        life_vision: Some("Win a ring".to_owned()),
        is_npc,
    }
}

fn game_ctx() -> GameContext {
    GameContext {
        season_num: 1,
        game_num: 3,
        total_games: 30,
        home_score: 102,
        away_score: 98,
        narrative: "A regular matchup, final score 102:98.".to_owned(),
    }
}

fn scripted(reply: &str) -> WorldJudge {
    WorldJudge::with_backend(
        LlmBackend::Scripted(ScriptedBackend::reply(reply)),
        Duration::from_secs(5),
    )
    .expect("embedded templates compile")
}

#[tokio::test]
async fn fallback_only_verdicts_stay_in_bounds() {
    let judge = WorldJudge::fallback_only().unwrap().with_seed(1);
    assert!(!judge.is_model_enabled());
    for skill in [20, 50, 80, 99] {
        let verdict = judge
            .judge_game(&profile("Ace", skill, false), &profile("Blaze", 60, false), &game_ctx())
            .await;
        assert!(verdict.is_within_bounds());
    }
}

#[tokio::test]
async fn model_verdict_is_clamped() {
    let judge = scripted(
        r#"```json
{"homeScoreAdjust": 99, "awayScoreAdjust": -2, "homeStatBonus": {"attr": "shooting", "amount": 2},
 "awayStatBonus": null, "narrative": "Ace drains the game winner.", "mvp": "home",
 "eventType": "buzzer_beater", "tokenAdjust": {"home": 80, "away": -4},}
```"#,
    );
    let verdict = judge
        .judge_game(&profile("Ace", 70, false), &profile("Blaze", 70, false), &game_ctx())
        .await;
    assert_eq!(verdict.score_adjust_home, 15);
    assert_eq!(verdict.score_adjust_away, -2);
    assert_eq!(verdict.token_adjust.home, 20);
    assert_eq!(verdict.token_adjust.away, -4);
    assert_eq!(verdict.mvp, MvpSide::Home);
    assert_eq!(verdict.event_type, GameEventType::BuzzerBeater);
    assert_eq!(verdict.narrative, "Ace drains the game winner.");
    assert_eq!(verdict.stat_bonus_home.map(|b| b.skill), Some(Skill::Shooting));
    assert!(verdict.is_within_bounds());
}

#[tokio::test]
async fn garbage_reply_matches_fallback_exactly() {
    let home = profile("Ace", 75, false);
    let away = profile("Blaze", 65, false);

    let local = WorldJudge::fallback_only().unwrap().with_seed(42);
    let garbage = scripted("I think the home team wins, honestly.").with_seed(42);
    let failing = WorldJudge::with_backend(
        LlmBackend::Scripted(ScriptedBackend::failing("503 Service Unavailable")),
        Duration::from_secs(5),
    )
    .unwrap()
    .with_seed(42);

    let expected = local.judge_game(&home, &away, &game_ctx()).await;
    assert_eq!(garbage.judge_game(&home, &away, &game_ctx()).await, expected);
    assert_eq!(failing.judge_game(&home, &away, &game_ctx()).await, expected);
}

#[tokio::test(start_paused = true)]
async fn slow_model_times_out_to_fallback() {
    let slow = WorldJudge::with_backend(
        LlmBackend::Scripted(
            ScriptedBackend::reply(r#"{"homeScoreAdjust": 15}"#)
                .delayed(Duration::from_secs(30)),
        ),
        Duration::from_millis(50),
    )
    .unwrap()
    .with_seed(9);
    let local = WorldJudge::fallback_only().unwrap().with_seed(9);

    let home = profile("Ace", 70, false);
    let away = profile("Blaze", 70, false);
    let expected = local.judge_game(&home, &away, &game_ctx()).await;
    assert_eq!(slow.judge_game(&home, &away, &game_ctx()).await, expected);
}

#[tokio::test]
async fn season_settlement_from_model() {
    let judge = scripted(
        r#"{"salaryMultiplier": 1.5, "bonusTokens": 120, "narrative": "A breakout year.",
            "mvpCandidate": true, "tradeRumor": null, "nextSeasonOutlook": "Contender."}"#,
    );
    let mut stats = SeasonStats::opening(SeasonId::new(), AgentId::new(), 200);
    stats.games_played = 10;
    stats.wins = 7;
    stats.losses = 3;

    let settlement = judge.settle_season(&profile("Ace", 80, false), &stats, 2).await;
    assert_eq!(settlement.salary_multiplier, Decimal::new(15, 1));
    assert_eq!(settlement.bonus_tokens, 120);
    assert!(settlement.mvp_candidate);
    assert_eq!(settlement.trade_rumor, None);
    assert_eq!(settlement.outlook, "Contender.");
}

#[tokio::test]
async fn reflection_fallback_honors_focus() {
    let judge = WorldJudge::fallback_only().unwrap().with_seed(3);
    let analysis = judge
        .analyze_reflection(&profile("Ace", 60, false), "Need to finish better", Some(Skill::Shooting), &[])
        .await;
    assert_eq!(analysis.primary.skill, Skill::Shooting);
    assert!(analysis.is_within_bounds());
}

#[tokio::test]
async fn world_event_uses_model_text() {
    let judge = scripted("  \"Ace signs a sneaker deal.\"\n");
    let line = judge.world_event(&profile("Ace", 60, false)).await;
    assert_eq!(line, "Ace signs a sneaker deal.");

    let empty = scripted("   ");
    let line = empty.world_event(&profile("Ace", 60, false)).await;
    assert!(line.contains("Ace"));
}

#[tokio::test]
async fn dialogue_only_for_non_npc_sides() {
    let judge = WorldJudge::fallback_only().unwrap().with_seed(5);
    let generator = DialogueGenerator::new(&judge);
    let game_id = GameId::new();

    let human = profile("Ace", 70, false);
    let npc = profile("Bot", 70, true);
    let lines = generator.generate(game_id, &human, &npc, &game_ctx()).await;
    assert_eq!(lines.len(), 3);
    assert!(lines.iter().all(|l| l.agent_id == human.id && l.game_id == game_id));
    let phases: Vec<InteractionPhase> = lines.iter().map(|l| l.phase).collect();
    assert_eq!(phases, InteractionPhase::ALL.to_vec());

    let both = generator
        .generate(game_id, &human, &profile("Blaze", 70, false), &game_ctx())
        .await;
    assert_eq!(both.len(), 6);

    let none = generator
        .generate(game_id, &npc, &profile("Bot2", 70, true), &game_ctx())
        .await;
    assert!(none.is_empty());
}

#[tokio::test]
async fn reaction_replies_prefer_the_model() {
    let blaze = profile("Blaze", 70, false);
    let ace = profile("Ace", 70, false);

    let judge = scripted("Talk is cheap, Ace. Scoreboard.");
    let reply = judge
        .reply_to_reaction(&blaze, &ace, ReactionKind::Provoke, Some("You're washed"))
        .await;
    assert_eq!(
        reply,
        Some((
            "Talk is cheap, Ace. Scoreboard.".to_owned(),
            ReactionSource::Model
        ))
    );

    let offline = WorldJudge::fallback_only().unwrap().with_seed(3);
    let (line, source) = offline
        .reply_to_reaction(&blaze, &ace, ReactionKind::Comment, None)
        .await
        .unwrap();
    assert!(line.starts_with("Blaze: "));
    assert_eq!(source, ReactionSource::Fallback);

    // Likes and disdain are never answered, not even by the model.
    assert!(
        judge
            .reply_to_reaction(&blaze, &ace, ReactionKind::Like, None)
            .await
            .is_none()
    );
}

#[tokio::test]
async fn failed_reaction_reply_falls_back() {
    let judge = WorldJudge::with_backend(
        LlmBackend::Scripted(ScriptedBackend::failing("503 Service Unavailable")),
        Duration::from_secs(5),
    )
    .unwrap();
    let reply = judge
        .reply_to_reaction(
            &profile("Blaze", 70, false),
            &profile("Ace", 70, false),
            ReactionKind::Provoke,
            None,
        )
        .await;
    assert!(reply.is_some_and(|(line, source)| {
        line.starts_with("Blaze: ") && source == ReactionSource::Fallback
    }));
}
