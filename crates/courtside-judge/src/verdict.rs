//! Canonical result types returned by the judge.
//!
//! Each result has a strict schema with a declared range per numeric field.
//! Model output is never trusted as-is: [`GameVerdict::from_model`] and its
//! siblings read each field individually, clamp numbers that are present,
//! and take the fallback's value for any field that is missing, mistyped or
//! invalid. The output therefore satisfies the same bounds whether it came
//! from the model or from the local computation.

use courtside_types::{GameEventType, Skill};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// Lowest score adjustment per side.
pub const SCORE_ADJUST_MIN: i32 = -15;
/// Highest score adjustment per side.
pub const SCORE_ADJUST_MAX: i32 = 15;
/// Lowest token adjustment per side.
pub const TOKEN_ADJUST_MIN: i64 = -10;
/// Highest token adjustment per side.
pub const TOKEN_ADJUST_MAX: i64 = 20;
/// Largest per-game stat bonus.
pub const STAT_BONUS_MAX: u8 = 3;
/// Largest season bonus.
pub const BONUS_TOKENS_MAX: i64 = 200;
/// Primary reflection boost range.
pub const PRIMARY_BOOST_RANGE: (u8, u8) = (1, 4);
/// Largest secondary reflection boost.
pub const SECONDARY_BOOST_MAX: u8 = 2;
/// Largest cognitive boost from one reflection.
pub const COGNITIVE_BOOST_MAX: u8 = 3;

/// Smallest salary multiplier (0.5).
pub const SALARY_MULTIPLIER_MIN: Decimal = Decimal::from_parts(5, 0, 0, false, 1);
/// Largest salary multiplier (2.0).
pub const SALARY_MULTIPLIER_MAX: Decimal = Decimal::TWO;

// ---------------------------------------------------------------------------
// Game verdict
// ---------------------------------------------------------------------------

/// Which side of a game earned MVP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MvpSide {
    /// The home agent.
    Home,
    /// The away agent.
    Away,
}

/// One-point-or-more raise to a single skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatBonus {
    /// Skill being raised.
    pub skill: Skill,
    /// Raise amount, `1..=STAT_BONUS_MAX`.
    pub amount: u8,
}

/// Token deltas for both sides of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenAdjust {
    /// Home side delta.
    pub home: i64,
    /// Away side delta.
    pub away: i64,
}

/// The judge's ruling on a single season game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameVerdict {
    /// Added to the simulated home score.
    pub score_adjust_home: i32,
    /// Added to the simulated away score.
    pub score_adjust_away: i32,
    /// Optional skill raise for the home agent.
    pub stat_bonus_home: Option<StatBonus>,
    /// Optional skill raise for the away agent.
    pub stat_bonus_away: Option<StatBonus>,
    /// Narrative replacing the simulator's.
    pub narrative: String,
    /// MVP side.
    pub mvp: MvpSide,
    /// Event classification.
    pub event_type: GameEventType,
    /// Token deltas.
    pub token_adjust: TokenAdjust,
}

impl GameVerdict {
    /// Merge a model reply over `fallback`, field by field.
    pub fn from_model(raw: &Value, fallback: Self) -> Self {
        let Some(obj) = raw.as_object() else {
            return fallback;
        };

        let token_adjust = match field(obj, &["tokenAdjust", "token_adjust"]).and_then(Value::as_object) {
            Some(tokens) => TokenAdjust {
                home: int_field(tokens, &["home"])
                    .map_or(fallback.token_adjust.home, |v| {
                        v.clamp(TOKEN_ADJUST_MIN, TOKEN_ADJUST_MAX)
                    }),
                away: int_field(tokens, &["away"])
                    .map_or(fallback.token_adjust.away, |v| {
                        v.clamp(TOKEN_ADJUST_MIN, TOKEN_ADJUST_MAX)
                    }),
            },
            None => fallback.token_adjust,
        };

        Self {
            score_adjust_home: score_adjust(obj, &["homeScoreAdjust", "score_adjust_home"])
                .unwrap_or(fallback.score_adjust_home),
            score_adjust_away: score_adjust(obj, &["awayScoreAdjust", "score_adjust_away"])
                .unwrap_or(fallback.score_adjust_away),
            stat_bonus_home: stat_bonus(obj, &["homeStatBonus", "stat_bonus_home"])
                .unwrap_or(fallback.stat_bonus_home),
            stat_bonus_away: stat_bonus(obj, &["awayStatBonus", "stat_bonus_away"])
                .unwrap_or(fallback.stat_bonus_away),
            narrative: text_field(obj, &["narrative"]).unwrap_or(fallback.narrative),
            mvp: match field(obj, &["mvp"]).and_then(Value::as_str) {
                Some("home") => MvpSide::Home,
                Some("away") => MvpSide::Away,
                _ => fallback.mvp,
            },
            event_type: field(obj, &["eventType", "event_type"])
                .and_then(Value::as_str)
                .and_then(parse_event_type)
                .unwrap_or(fallback.event_type),
            token_adjust,
        }
    }

    /// Whether every numeric field sits inside its declared range.
    pub fn is_within_bounds(&self) -> bool {
        let score_ok = |v: i32| (SCORE_ADJUST_MIN..=SCORE_ADJUST_MAX).contains(&v);
        let token_ok = |v: i64| (TOKEN_ADJUST_MIN..=TOKEN_ADJUST_MAX).contains(&v);
        let bonus_ok =
            |b: Option<StatBonus>| b.is_none_or(|b| (1..=STAT_BONUS_MAX).contains(&b.amount));

        score_ok(self.score_adjust_home)
            && score_ok(self.score_adjust_away)
            && token_ok(self.token_adjust.home)
            && token_ok(self.token_adjust.away)
            && bonus_ok(self.stat_bonus_home)
            && bonus_ok(self.stat_bonus_away)
    }
}

fn score_adjust(obj: &Map<String, Value>, names: &[&str]) -> Option<i32> {
    int_field(obj, names).map(|v| {
        let clamped = v.clamp(i64::from(SCORE_ADJUST_MIN), i64::from(SCORE_ADJUST_MAX));
        i32::try_from(clamped).unwrap_or_default()
    })
}

/// `None` when the key is absent; `Some(None)` when it is null or invalid.
fn stat_bonus(obj: &Map<String, Value>, names: &[&str]) -> Option<Option<StatBonus>> {
    let value = field(obj, names)?;
    let Some(bonus) = value.as_object() else {
        return Some(None);
    };
    let skill = field(bonus, &["attr", "skill"])
        .and_then(Value::as_str)
        .and_then(Skill::from_loose);
    let amount = int_field(bonus, &["amount"])
        .map(|v| v.clamp(0, i64::from(STAT_BONUS_MAX)))
        .and_then(|v| u8::try_from(v).ok());

    Some(match (skill, amount) {
        (Some(skill), Some(amount)) if amount > 0 => Some(StatBonus { skill, amount }),
        _ => None,
    })
}

fn parse_event_type(text: &str) -> Option<GameEventType> {
    GameEventType::parse(text).or(match text {
        "injury" => Some(GameEventType::InjuryMinor),
        "buzzer" | "buzzerbeater" => Some(GameEventType::BuzzerBeater),
        _ => None,
    })
}

// ---------------------------------------------------------------------------
// Season settlement
// ---------------------------------------------------------------------------

/// The judge's end-of-season ruling for one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonSettlement {
    /// Applied to the base salary, `[0.5, 2.0]`.
    pub salary_multiplier: Decimal,
    /// Extra tokens, `[0, 200]`.
    pub bonus_tokens: i64,
    /// Season recap.
    pub narrative: String,
    /// Whether the agent is an MVP candidate.
    pub mvp_candidate: bool,
    /// Trade rumor, if any.
    pub trade_rumor: Option<String>,
    /// Next-season outlook.
    pub outlook: String,
}

impl SeasonSettlement {
    /// Merge a model reply over `fallback`, field by field.
    pub fn from_model(raw: &Value, fallback: Self) -> Self {
        let Some(obj) = raw.as_object() else {
            return fallback;
        };

        let salary_multiplier = field(obj, &["salaryMultiplier", "salary_multiplier"])
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite())
            .and_then(|v| Decimal::try_from(v).ok())
            .map_or(fallback.salary_multiplier, |d| {
                d.round_dp(2)
                    .clamp(SALARY_MULTIPLIER_MIN, SALARY_MULTIPLIER_MAX)
            });

        let trade_rumor = match field(obj, &["tradeRumor", "trade_rumor"]) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_owned()),
            Some(Value::Null | Value::String(_)) => None,
            _ => fallback.trade_rumor,
        };

        Self {
            salary_multiplier,
            bonus_tokens: int_field(obj, &["bonusTokens", "bonus_tokens"])
                .map_or(fallback.bonus_tokens, |v| v.clamp(0, BONUS_TOKENS_MAX)),
            narrative: text_field(obj, &["narrative"]).unwrap_or(fallback.narrative),
            mvp_candidate: field(obj, &["mvpCandidate", "mvp_candidate"])
                .and_then(Value::as_bool)
                .unwrap_or(fallback.mvp_candidate),
            trade_rumor,
            outlook: text_field(obj, &["nextSeasonOutlook", "next_season_outlook", "outlook"])
                .unwrap_or(fallback.outlook),
        }
    }

    /// Whether every numeric field sits inside its declared range.
    pub fn is_within_bounds(&self) -> bool {
        (SALARY_MULTIPLIER_MIN..=SALARY_MULTIPLIER_MAX).contains(&self.salary_multiplier)
            && (0..=BONUS_TOKENS_MAX).contains(&self.bonus_tokens)
    }
}

// ---------------------------------------------------------------------------
// Reflection analysis
// ---------------------------------------------------------------------------

/// A raise to one skill produced by reflection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SkillBoost {
    /// Skill being raised.
    pub skill: Skill,
    /// Raise amount.
    pub amount: u8,
}

/// The judge's reading of a free-text reflection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReflectionAnalysis {
    /// Main training gain, amount in `[1, 4]`.
    pub primary: SkillBoost,
    /// Optional side gain, amount in `[1, 2]`.
    pub secondary: Option<SkillBoost>,
    /// Cognitive score gain, `[0, 3]`.
    pub cognitive_boost: u8,
    /// Short analysis.
    pub summary: String,
    /// Concrete advice.
    pub advice: String,
}

impl ReflectionAnalysis {
    /// Merge a model reply over `fallback`, field by field.
    pub fn from_model(raw: &Value, fallback: Self) -> Self {
        let Some(obj) = raw.as_object() else {
            return fallback;
        };

        let primary = field(obj, &["primaryBoost", "primary_boost"])
            .and_then(Value::as_object)
            .and_then(|boost| {
                let skill = boost_skill(boost)?;
                let amount = int_field(boost, &["amount"]).map_or(fallback.primary.amount, |v| {
                    clamp_u8(v, PRIMARY_BOOST_RANGE.0, PRIMARY_BOOST_RANGE.1)
                });
                Some(SkillBoost { skill, amount })
            })
            .unwrap_or(fallback.primary);

        let secondary = match field(obj, &["secondaryBoost", "secondary_boost"]) {
            None => fallback.secondary,
            Some(value) => value.as_object().and_then(|boost| {
                let skill = boost_skill(boost)?;
                let amount = clamp_u8(int_field(boost, &["amount"])?, 0, SECONDARY_BOOST_MAX);
                (amount > 0).then_some(SkillBoost { skill, amount })
            }),
        };

        Self {
            primary,
            secondary,
            cognitive_boost: int_field(obj, &["cognitiveBoost", "cognitive_boost"])
                .map_or(fallback.cognitive_boost, |v| clamp_u8(v, 0, COGNITIVE_BOOST_MAX)),
            summary: text_field(obj, &["summary"]).unwrap_or(fallback.summary),
            advice: text_field(obj, &["advice"]).unwrap_or(fallback.advice),
        }
    }

    /// Whether every numeric field sits inside its declared range.
    pub fn is_within_bounds(&self) -> bool {
        (PRIMARY_BOOST_RANGE.0..=PRIMARY_BOOST_RANGE.1).contains(&self.primary.amount)
            && self
                .secondary
                .is_none_or(|b| (1..=SECONDARY_BOOST_MAX).contains(&b.amount))
            && self.cognitive_boost <= COGNITIVE_BOOST_MAX
    }
}

fn boost_skill(boost: &Map<String, Value>) -> Option<Skill> {
    field(boost, &["attr", "skill"])
        .and_then(Value::as_str)
        .and_then(Skill::from_loose)
}

// ---------------------------------------------------------------------------
// Field readers
// ---------------------------------------------------------------------------

/// First present, non-missing key among `names`.
fn field<'a>(obj: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| obj.get(*name))
}

/// Integer field. Floats are rounded; anything else is rejected.
#[allow(clippy::cast_possible_truncation)]
fn int_field(obj: &Map<String, Value>, names: &[&str]) -> Option<i64> {
    let value = field(obj, names)?;
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|v| v.is_finite())
            .map(|v| v.round().clamp(i64::MIN as f64, i64::MAX as f64) as i64)
    })
}

/// Non-blank string field, trimmed.
fn text_field(obj: &Map<String, Value>, names: &[&str]) -> Option<String> {
    field(obj, names)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
}

fn clamp_u8(value: i64, lo: u8, hi: u8) -> u8 {
    u8::try_from(value.clamp(i64::from(lo), i64::from(hi))).unwrap_or(lo)
}
