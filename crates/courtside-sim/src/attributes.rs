//! Attribute generation, overall rating and salary tiers.
//!
//! - [`generate_attributes`] rolls a registering agent's skills from its
//!   cognitive score, luck value and position.
//! - [`generate_npc_attributes`] rolls a narrower, lower band for NPC
//!   roster filler.
//! - [`calculate_ovr`] is the position-weighted skill average.
//! - [`calculate_salary`] maps OVR onto a fixed tier table.
//! - [`power_rating`] is the scalar the duel engine rolls against.

use rand::Rng;

use courtside_types::{Agent, Attributes, Position, SKILL_MAX, SKILL_MIN, Skill};

use crate::round_clamped;
use crate::weights::SkillWeights;

/// Floor of a generated skill for a registering agent.
pub const GENERATED_SKILL_MIN: u8 = 30;

/// Ceiling of a generated skill for a registering agent.
pub const GENERATED_SKILL_MAX: u8 = 95;

/// Floor of a generated NPC skill.
pub const NPC_SKILL_MIN: u8 = 35;

/// Ceiling of a generated NPC skill.
pub const NPC_SKILL_MAX: u8 = 85;

/// Roll the seven skills of a registering agent.
///
/// Each skill is computed independently as
///
/// ```text
/// base + U(-10, 10) + U(0, 15) * luck / 100 + (weight - 1) * 8
/// ```
///
/// where `base = 40 + floor(cognitive / 5)`, then clamped to `[30, 95]`.
/// Inputs above 100 are treated as 100.
pub fn generate_attributes(
    cognitive_score: u8,
    luck_value: u8,
    position: Position,
    rng: &mut impl Rng,
) -> Attributes {
    let base = 40.0 + f64::from(cognitive_score.min(100) / 5);
    let luck_factor = f64::from(luck_value.min(100)) / 100.0;
    let weights = SkillWeights::for_position(position);

    let mut attrs = Attributes::uniform(GENERATED_SKILL_MIN);
    for skill in Skill::ALL {
        let swing: f64 = rng.random_range(-10.0..10.0);
        let luck: f64 = rng.random_range(0.0..15.0) * luck_factor;
        let raw = base + swing + luck + (weights.get(*skill) - 1.0) * 8.0;
        attrs.set(
            *skill,
            round_clamped(raw, GENERATED_SKILL_MIN, GENERATED_SKILL_MAX),
        );
    }
    attrs
}

/// Roll the seven skills of an NPC.
///
/// A shared base in `[45, 65]` plus `(weight - 1) * 10` and a `U(-8, 8)`
/// swing per skill, clamped to `[35, 85]`.
pub fn generate_npc_attributes(position: Position, rng: &mut impl Rng) -> Attributes {
    let base = 45.0 + f64::from(rng.random_range(0..=20_u8));
    let weights = SkillWeights::for_position(position);

    let mut attrs = Attributes::uniform(NPC_SKILL_MIN);
    for skill in Skill::ALL {
        let swing: f64 = rng.random_range(-8.0..8.0);
        let raw = base + (weights.get(*skill) - 1.0) * 10.0 + swing;
        attrs.set(*skill, round_clamped(raw, NPC_SKILL_MIN, NPC_SKILL_MAX));
    }
    attrs
}

/// Overall rating: the position-weighted average of the seven skills,
/// rounded, within `[1, 99]`.
pub fn calculate_ovr(attrs: &Attributes, position: Position) -> u8 {
    calculate_ovr_weighted(attrs, &SkillWeights::for_position(position))
}

/// Overall rating against an explicit weight vector.
///
/// Invariant to scaling every weight by the same positive constant.
pub fn calculate_ovr_weighted(attrs: &Attributes, weights: &SkillWeights) -> u8 {
    let total = weights.total();
    if total <= 0.0 {
        return SKILL_MIN;
    }
    let weighted: f64 = Skill::ALL
        .iter()
        .map(|s| f64::from(attrs.get(*s)) * weights.get(*s))
        .sum();
    round_clamped(weighted / total, SKILL_MIN, SKILL_MAX)
}

/// Per-season base salary for an overall rating.
///
/// | OVR | Salary |
/// |-----|--------|
/// | >= 90 | 300 |
/// | >= 80 | 200 |
/// | >= 70 | 120 |
/// | >= 60 | 80 |
/// | >= 50 | 50 |
/// | else | 30 |
pub const fn calculate_salary(ovr: u8) -> i64 {
    match ovr {
        90.. => 300,
        80..=89 => 200,
        70..=79 => 120,
        60..=69 => 80,
        50..=59 => 50,
        _ => 30,
    }
}

/// Duel strength of an agent: OVR plus up to 50 points of form.
///
/// Agents without a recorded game are treated as having a 0.5 win rate.
pub fn power_rating(agent: &Agent) -> f64 {
    let ovr = f64::from(calculate_ovr(&agent.attributes, agent.position));
    let form = if agent.games_played() == 0 {
        0.5
    } else {
        agent.win_rate()
    };
    ovr + form * 50.0
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn all_skills_within(attrs: &Attributes, lo: u8, hi: u8) -> bool {
        Skill::ALL
            .iter()
            .all(|s| (lo..=hi).contains(&attrs.get(*s)))
    }

    #[test]
    fn generated_skills_stay_in_band_at_extremes() {
        for seed in 0..200_u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            for position in Position::ALL {
                for (cog, luck) in [(0, 0), (100, 100), (0, 100), (100, 0), (255, 255)] {
                    let attrs = generate_attributes(cog, luck, *position, &mut rng);
                    assert!(
                        all_skills_within(&attrs, GENERATED_SKILL_MIN, GENERATED_SKILL_MAX),
                        "seed {seed} {position} cog {cog} luck {luck}: {attrs:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn npc_skills_stay_in_band() {
        for seed in 0..200_u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            for position in Position::ALL {
                let attrs = generate_npc_attributes(*position, &mut rng);
                assert!(all_skills_within(&attrs, NPC_SKILL_MIN, NPC_SKILL_MAX));
            }
        }
    }

    #[test]
    fn position_weight_biases_generation() {
        // Over many rolls a point guard's passing should beat their
        // rebounding (weights 1.5 vs 0.3).
        let mut rng = StdRng::seed_from_u64(42);
        let mut passing = 0_u32;
        let mut rebounding = 0_u32;
        for _ in 0..500 {
            let attrs = generate_attributes(50, 50, Position::PointGuard, &mut rng);
            passing += u32::from(attrs.passing);
            rebounding += u32::from(attrs.rebounding);
        }
        assert!(passing > rebounding);
    }

    #[test]
    fn ovr_is_within_bounds_for_random_attributes() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let mut attrs = Attributes::uniform(1);
            for skill in Skill::ALL {
                attrs.set(*skill, rng.random_range(1..=99));
            }
            for position in Position::ALL {
                let ovr = calculate_ovr(&attrs, *position);
                assert!((SKILL_MIN..=SKILL_MAX).contains(&ovr));
            }
        }
    }

    #[test]
    fn ovr_of_uniform_attributes_is_that_value() {
        for value in [1_u8, 37, 64, 99] {
            for position in Position::ALL {
                assert_eq!(calculate_ovr(&Attributes::uniform(value), *position), value);
            }
        }
    }

    #[test]
    fn ovr_is_invariant_to_weight_scaling() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..300 {
            let attrs = generate_attributes(70, 40, Position::SmallForward, &mut rng);
            for position in Position::ALL {
                let weights = SkillWeights::for_position(*position);
                let base = calculate_ovr_weighted(&attrs, &weights);
                for factor in [0.25, 2.0, 4.0] {
                    assert_eq!(calculate_ovr_weighted(&attrs, &weights.scaled(factor)), base);
                }
            }
        }
    }

    #[test]
    fn salary_tiers() {
        assert_eq!(calculate_salary(99), 300);
        assert_eq!(calculate_salary(90), 300);
        assert_eq!(calculate_salary(89), 200);
        assert_eq!(calculate_salary(80), 200);
        assert_eq!(calculate_salary(75), 120);
        assert_eq!(calculate_salary(60), 80);
        assert_eq!(calculate_salary(50), 50);
        assert_eq!(calculate_salary(49), 30);
        assert_eq!(calculate_salary(1), 30);
    }
}
