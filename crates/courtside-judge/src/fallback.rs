//! Deterministic local stand-ins for every judge call.
//!
//! Each function here produces a complete, in-bounds result from arithmetic
//! on its inputs plus a bounded perturbation drawn from the injected random
//! source. The judge computes the fallback *before* consulting the model so
//! the same value doubles as the default for any field the model gets
//! wrong.

use courtside_types::{GameEventType, InteractionPhase, ReactionKind, SeasonStats, Skill};
use rand::Rng;
use rand::seq::IndexedRandom;
use rust_decimal::Decimal;

use crate::context::{GameContext, JudgeProfile};
use crate::verdict::{
    GameVerdict, MvpSide, ReflectionAnalysis, SCORE_ADJUST_MAX, SCORE_ADJUST_MIN,
    SeasonSettlement, SkillBoost, TokenAdjust,
};

/// Flat action cost charged to both sides of an all-NPC game.
pub const NPC_GAME_COST: i64 = 3;

/// Adjustment gap beyond which a game counts as a blowout.
const BLOWOUT_GAP: i32 = 8;

// ---------------------------------------------------------------------------
// Games
// ---------------------------------------------------------------------------

/// Local game verdict.
///
/// The score adjustment tracks a third of the average-skill gap plus a luck
/// swing in `[-5, 5)`. Both sides pay an action cost of 3-5 tokens; the
/// winner additionally collects a 5-15 token reward. The winner is whoever
/// leads once the adjustments are applied to the simulated base score, with
/// ties going to the home side.
pub fn game_verdict(
    home: &JudgeProfile,
    away: &JudgeProfile,
    ctx: &GameContext,
    rng: &mut impl Rng,
) -> GameVerdict {
    let diff = home.attributes.average() - away.attributes.average();
    let swing: f64 = rng.random_range(-5.0..5.0);
    let home_adj = round_adjust(diff / 3.0 + swing);
    let away_adj = round_adjust(-diff / 3.0 - swing);

    let home_total = i64::from(ctx.home_score).saturating_add(i64::from(home_adj));
    let away_total = i64::from(ctx.away_score).saturating_add(i64::from(away_adj));
    let home_wins = home_total >= away_total;

    let action_cost = round_i64(3.0 + rng.random::<f64>() * 2.0);
    let win_reward = round_i64(5.0 + rng.random::<f64>() * 10.0);
    let winner_delta = win_reward.saturating_sub(action_cost);

    let (narrative, mvp, token_adjust) = if home_wins {
        (
            format!("{} led {} to a convincing win at home.", home.nickname, home.team),
            MvpSide::Home,
            TokenAdjust {
                home: winner_delta,
                away: -action_cost,
            },
        )
    } else {
        (
            format!("{} carried {} to a road victory.", away.nickname, away.team),
            MvpSide::Away,
            TokenAdjust {
                home: -action_cost,
                away: winner_delta,
            },
        )
    };

    let event_type = if home_adj.abs_diff(away_adj) > BLOWOUT_GAP.unsigned_abs() {
        GameEventType::Blowout
    } else {
        GameEventType::Normal
    };

    GameVerdict {
        score_adjust_home: home_adj,
        score_adjust_away: away_adj,
        stat_bonus_home: None,
        stat_bonus_away: None,
        narrative,
        mvp,
        event_type,
        token_adjust,
    }
}

/// Verdict for a game between two NPCs. No model call, no adjustments and
/// no bonuses; the simulator's narrative stands.
pub fn npc_verdict(ctx: &GameContext) -> GameVerdict {
    GameVerdict {
        score_adjust_home: 0,
        score_adjust_away: 0,
        stat_bonus_home: None,
        stat_bonus_away: None,
        narrative: ctx.narrative.clone(),
        mvp: if ctx.home_score >= ctx.away_score {
            MvpSide::Home
        } else {
            MvpSide::Away
        },
        event_type: GameEventType::Normal,
        token_adjust: TokenAdjust {
            home: -NPC_GAME_COST,
            away: -NPC_GAME_COST,
        },
    }
}

// ---------------------------------------------------------------------------
// Seasons
// ---------------------------------------------------------------------------

/// Local season settlement, stepped by win rate.
///
/// | Win rate | Multiplier | Bonus |
/// |----------|------------|-------|
/// | > 0.6    | 1.3        | 30% of salary |
/// | > 0.4    | 1.0        | 0 |
/// | else     | 0.8        | 0 |
pub fn season_settlement(agent: &JudgeProfile, stats: &SeasonStats) -> SeasonSettlement {
    let win_rate = stats.win_rate();
    let (multiplier, verdict) = if win_rate > 0.6 {
        (Decimal::new(13, 1), "standout")
    } else if win_rate > 0.4 {
        (Decimal::ONE, "steady")
    } else {
        (Decimal::new(8, 1), "hard-fought")
    };

    let bonus_tokens = if win_rate > 0.6 {
        stats
            .salary
            .max(0)
            .saturating_mul(3)
            .saturating_add(5)
            .checked_div(10)
            .unwrap_or(0)
            .min(crate::verdict::BONUS_TOKENS_MAX)
    } else {
        0
    };

    SeasonSettlement {
        salary_multiplier: multiplier,
        bonus_tokens,
        narrative: format!("{} wrapped up a {verdict} season.", agent.nickname),
        mvp_candidate: win_rate > 0.7,
        trade_rumor: None,
        outlook: "A new season is around the corner and anything can happen.".to_owned(),
    }
}

// ---------------------------------------------------------------------------
// Reflection
// ---------------------------------------------------------------------------

/// Local reflection analysis.
///
/// The primary boost goes to `focus` when given, otherwise to a random
/// skill, for 1-4 points. Half the time a second, different skill gains one
/// point. Cognition rises by 0-2.
pub fn reflection_analysis(focus: Option<Skill>, rng: &mut impl Rng) -> ReflectionAnalysis {
    let primary_skill = focus
        .or_else(|| Skill::ALL.choose(rng).copied())
        .unwrap_or(Skill::BasketballIq);
    let primary_amount = round_u8(1.0 + rng.random::<f64>() * 3.0);

    let secondary = if rng.random_bool(0.5) {
        let others: Vec<Skill> = Skill::ALL
            .iter()
            .copied()
            .filter(|s| *s != primary_skill)
            .collect();
        others.choose(rng).map(|skill| SkillBoost {
            skill: *skill,
            amount: 1,
        })
    } else {
        None
    };

    ReflectionAnalysis {
        primary: SkillBoost {
            skill: primary_skill,
            amount: primary_amount.max(1),
        },
        secondary,
        cognitive_boost: round_u8(rng.random::<f64>() * 2.0),
        summary: format!(
            "Reflection and targeted training sharpened {}.",
            skill_label(primary_skill)
        ),
        advice: "Keep the training rhythm and watch the small details in games.".to_owned(),
    }
}

// ---------------------------------------------------------------------------
// Flavor text
// ---------------------------------------------------------------------------

/// One of three off-court news lines.
pub fn world_event(agent: &JudgeProfile, rng: &mut impl Rng) -> String {
    match rng.random_range(0..3_u8) {
        0 => format!("{} put in an intense offseason training block.", agent.nickname),
        1 => format!(
            "The {} front office voiced full confidence in {}.",
            agent.team, agent.nickname
        ),
        _ => format!("Fans can't wait to see what {} does next season.", agent.nickname),
    }
}

const PRE_GAME: &[&str] = &[
    "{me}: {them}? Never heard of them. Tonight I show you what dominance looks like.",
    "{me}: {team}? Get ready to go home early.",
    "{me}: Doesn't matter who shows up. One word: win.",
    "{me}: {them} has been loud lately. Tonight I make it quiet.",
    "{me}: I'm ready. See you on the court.",
];

const IN_GAME_LEADING: &[&str] = &[
    "{me}: That's all you've got, {them}? I haven't even warmed up.",
    "{me}: This court belongs to me tonight!",
    "{me}: {them}, your defense is made of paper.",
];

const IN_GAME_TRAILING: &[&str] = &[
    "{me}: Don't celebrate yet, this isn't over!",
    "{me}: Being down doesn't scare me. I'll turn it around.",
    "{me}: Laugh all you want, {them}. Last one laughing wins.",
];

const POST_GAME_WIN: &[&str] = &[
    "{me}: {them} played well, but there's only one champion. Keep working.",
    "{me}: This is just the beginning. I'm going to the top.",
    "{me}: Winning feels great! Next game I'll be even better.",
    "{me}: Thanks for the game, {them}. Run it back anytime!",
];

const POST_GAME_LOSS: &[&str] = &[
    "{me}: You got this one, {them}, but I'll be back.",
    "{me}: One loss. Quitting isn't in my vocabulary.",
    "{me}: This loss showed me the gap. I'll come back stronger.",
    "{me}: Remember this, {them}. Next time it's different.",
];

/// One line of templated game talk for `speaker`.
///
/// `ahead` means leading for the in-game phase and having won for the
/// post-game phase; it is ignored before tip-off.
pub fn dialogue_line(
    phase: InteractionPhase,
    speaker: &JudgeProfile,
    opponent: &JudgeProfile,
    ahead: bool,
    rng: &mut impl Rng,
) -> String {
    let pool = match (phase, ahead) {
        (InteractionPhase::PreGame, _) => PRE_GAME,
        (InteractionPhase::InGame, true) => IN_GAME_LEADING,
        (InteractionPhase::InGame, false) => IN_GAME_TRAILING,
        (InteractionPhase::PostGame, true) => POST_GAME_WIN,
        (InteractionPhase::PostGame, false) => POST_GAME_LOSS,
    };
    pool.choose(rng)
        .copied()
        .unwrap_or("{me}: See you on the court.")
        .replace("{me}", &speaker.nickname)
        .replace("{them}", &opponent.nickname)
        .replace("{team}", &opponent.team)
}

const PROVOKE_REPLIES: &[&str] = &[
    "{me}: {them}? Not worth an answer. Talk on the court.",
    "{me}: A challenge? I like it. Bring it.",
    "{me}: You haven't earned the right to call me out, {them}.",
];

const COMMENT_REPLIES: &[&str] = &[
    "{me}: Appreciate it. See you on the court.",
    "{me}: Ha, interesting take.",
    "{me}: Noted, {them}. We settle it next time.",
];

/// A templated answer from `replier` to a reaction by `sender`. `None`
/// for kinds that draw no answer.
pub fn reaction_reply(
    kind: ReactionKind,
    replier: &JudgeProfile,
    sender: &JudgeProfile,
    rng: &mut impl Rng,
) -> Option<String> {
    let pool = match kind {
        ReactionKind::Provoke => PROVOKE_REPLIES,
        ReactionKind::Comment => COMMENT_REPLIES,
        ReactionKind::Like | ReactionKind::Disdain => return None,
    };
    let line = pool.choose(rng).copied().unwrap_or("{me}: See you on the court.");
    Some(
        line.replace("{me}", &replier.nickname)
            .replace("{them}", &sender.nickname),
    )
}

/// Human-readable skill name.
pub const fn skill_label(skill: Skill) -> &'static str {
    match skill {
        Skill::Shooting => "shooting",
        Skill::Defense => "defense",
        Skill::Speed => "speed",
        Skill::Stamina => "stamina",
        Skill::BasketballIq => "basketball IQ",
        Skill::Passing => "passing",
        Skill::Rebounding => "rebounding",
    }
}

// ---------------------------------------------------------------------------
// Rounding
// ---------------------------------------------------------------------------

#[allow(clippy::cast_possible_truncation)]
fn round_i64(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    value.round().clamp(-1.0e15, 1.0e15) as i64
}

fn round_adjust(value: f64) -> i32 {
    let clamped = round_i64(value).clamp(i64::from(SCORE_ADJUST_MIN), i64::from(SCORE_ADJUST_MAX));
    i32::try_from(clamped).unwrap_or_default()
}

fn round_u8(value: f64) -> u8 {
    u8::try_from(round_i64(value).clamp(0, i64::from(u8::MAX))).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use courtside_types::{AgentId, Attributes, Position, SeasonId};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn profile(name: &str, skill: u8) -> JudgeProfile {
        JudgeProfile {
            id: AgentId::new(),
            nickname: name.to_owned(),
            team: "Harbor Hawks".to_owned(),
            position: Position::SmallForward,
            attributes: Attributes::uniform(skill),
            luck_value: 50,
            cognitive_score: 50,
            wins: 0,
            losses: 0,
            token_balance: 1000,
            life_vision: None,
            is_npc: false,
        }
    }

    fn ctx(home_score: u32, away_score: u32) -> GameContext {
        GameContext {
            season_num: 1,
            game_num: 1,
            total_games: 30,
            home_score,
            away_score,
            narrative: "A regular matchup.".to_owned(),
        }
    }

    #[test]
    fn game_verdict_always_in_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for i in 0..500_u32 {
            let home = profile("Ace", u8::try_from(i % 99).unwrap_or(1).max(1));
            let away = profile("Blaze", u8::try_from((i * 7) % 99).unwrap_or(1).max(1));
            let verdict = game_verdict(&home, &away, &ctx(100, 100), &mut rng);
            assert!(verdict.is_within_bounds(), "{verdict:?}");
        }
    }

    #[test]
    fn game_verdict_pays_the_winner() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let verdict = game_verdict(&profile("Ace", 60), &profile("Blaze", 60), &ctx(110, 90), &mut rng);
            let home_total = 110 + verdict.score_adjust_home;
            let away_total = 90 + verdict.score_adjust_away;
            if home_total >= away_total {
                assert_eq!(verdict.mvp, MvpSide::Home);
                assert!(verdict.token_adjust.home >= 0);
                assert!((-5..=-3).contains(&verdict.token_adjust.away));
            } else {
                assert_eq!(verdict.mvp, MvpSide::Away);
                assert!(verdict.token_adjust.away >= 0);
                assert!((-5..=-3).contains(&verdict.token_adjust.home));
            }
        }
    }

    #[test]
    fn stronger_side_gets_positive_adjustment_on_average() {
        let mut rng = StdRng::seed_from_u64(3);
        let strong = profile("Ace", 90);
        let weak = profile("Blaze", 45);
        let total: i32 = (0..200)
            .map(|_| game_verdict(&strong, &weak, &ctx(100, 100), &mut rng).score_adjust_home)
            .sum();
        assert!(total > 0);
    }

    #[test]
    fn npc_verdict_is_fixed() {
        let verdict = npc_verdict(&ctx(88, 95));
        assert_eq!(verdict.score_adjust_home, 0);
        assert_eq!(verdict.score_adjust_away, 0);
        assert_eq!(verdict.mvp, MvpSide::Away);
        assert_eq!(verdict.token_adjust, TokenAdjust { home: -3, away: -3 });
        assert_eq!(verdict.narrative, "A regular matchup.");
    }

    fn stats(games: u32, wins: u32, salary: i64) -> SeasonStats {
        let mut stats = SeasonStats::opening(SeasonId::new(), AgentId::new(), salary);
        stats.games_played = games;
        stats.wins = wins;
        stats.losses = games - wins;
        stats
    }

    #[test]
    fn season_settlement_steps() {
        let agent = profile("Ace", 70);

        let hot = season_settlement(&agent, &stats(10, 8, 200));
        assert_eq!(hot.salary_multiplier, Decimal::new(13, 1));
        assert_eq!(hot.bonus_tokens, 60);
        assert!(hot.mvp_candidate);

        let mid = season_settlement(&agent, &stats(10, 5, 200));
        assert_eq!(mid.salary_multiplier, Decimal::ONE);
        assert_eq!(mid.bonus_tokens, 0);
        assert!(!mid.mvp_candidate);

        let cold = season_settlement(&agent, &stats(10, 2, 200));
        assert_eq!(cold.salary_multiplier, Decimal::new(8, 1));

        let empty = season_settlement(&agent, &stats(0, 0, 200));
        assert_eq!(empty.salary_multiplier, Decimal::new(8, 1));
        assert!(empty.is_within_bounds());
    }

    #[test]
    fn reflection_respects_focus_and_ranges() {
        let mut rng = StdRng::seed_from_u64(21);
        for _ in 0..300 {
            let analysis = reflection_analysis(Some(Skill::Stamina), &mut rng);
            assert_eq!(analysis.primary.skill, Skill::Stamina);
            assert!(analysis.is_within_bounds(), "{analysis:?}");
            assert!(analysis.cognitive_boost <= 2);
            if let Some(secondary) = analysis.secondary {
                assert_ne!(secondary.skill, Skill::Stamina);
                assert_eq!(secondary.amount, 1);
            }
        }
        let free = reflection_analysis(None, &mut rng);
        assert!(Skill::ALL.contains(&free.primary.skill));
    }

    #[test]
    fn dialogue_lines_name_the_speaker() {
        let mut rng = StdRng::seed_from_u64(5);
        let me = profile("Ace", 70);
        let them = profile("Blaze", 70);
        for phase in InteractionPhase::ALL {
            for ahead in [true, false] {
                let line = dialogue_line(*phase, &me, &them, ahead, &mut rng);
                assert!(line.starts_with("Ace: "));
                assert!(!line.contains('{'));
            }
        }
    }

    #[test]
    fn only_provocations_and_comments_are_answered() {
        let mut rng = StdRng::seed_from_u64(13);
        let me = profile("Blaze", 70);
        let them = profile("Ace", 70);
        for kind in ReactionKind::ALL {
            let reply = reaction_reply(*kind, &me, &them, &mut rng);
            assert_eq!(reply.is_some(), kind.draws_reply());
            if let Some(line) = reply {
                assert!(line.starts_with("Blaze: "));
                assert!(!line.contains('{'));
            }
        }
    }

    #[test]
    fn world_event_mentions_agent() {
        let mut rng = StdRng::seed_from_u64(9);
        let agent = profile("Ace", 70);
        for _ in 0..20 {
            assert!(world_event(&agent, &mut rng).contains("Ace"));
        }
    }
}
