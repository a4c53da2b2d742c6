//! Per-game individual stat lines.

use rand::Rng;

use courtside_types::{Attributes, BoxScore};

use crate::{round_clamped, round_u32};

/// Simulate one agent's stat line for one game.
///
/// A per-game luck multiplier in `[0.8, 1.2)` scales every counting stat;
/// the agent's luck value adds up to `+0.5` to shooting efficiency. Minutes
/// fall in `[24, 40]`. The composite rating weights points 1.0, rebounds
/// 1.2, assists 1.5, steals and blocks 2.0 and turnovers -1.5, normalized
/// per ten minutes and clamped to `[1, 99]`.
pub fn simulate_player_game_stats(
    attrs: &Attributes,
    luck_value: u8,
    rng: &mut impl Rng,
) -> BoxScore {
    let luck: f64 = rng.random_range(0.8..1.2);
    let luck_boost = f64::from(luck_value.min(100)) / 200.0;

    let pct = |v: u8| f64::from(v) / 100.0;
    let shooting = pct(attrs.shooting);
    let defense = pct(attrs.defense);
    let speed = pct(attrs.speed);
    let iq = pct(attrs.basketball_iq);
    let passing = pct(attrs.passing);
    let rebounding = pct(attrs.rebounding);

    let minutes = round_u32(24.0 + rng.random::<f64>() * 16.0);
    let mins = f64::from(minutes);

    let chances = round_u32(shooting * mins * 0.6 * luck);
    let points = round_u32(f64::from(chances) * (shooting + luck_boost) * 2.2);
    let rebounds = round_u32(rebounding * mins * 0.35 * luck + rng.random::<f64>() * 3.0);
    let assists = round_u32(passing * iq * mins * 0.3 * luck + rng.random::<f64>() * 2.0);
    let steals = round_u32(defense * speed * mins * 0.08 * luck);
    let blocks = round_u32(defense * rebounding * mins * 0.06 * luck);
    let turnovers = round_u32(3.0 - f64::from(attrs.basketball_iq) / 50.0 + rng.random::<f64>() * 3.0);

    let contribution = f64::from(points)
        + f64::from(rebounds) * 1.2
        + f64::from(assists) * 1.5
        + f64::from(steals) * 2.0
        + f64::from(blocks) * 2.0
        - f64::from(turnovers) * 1.5;
    let rating = round_clamped(contribution / (mins / 10.0) * 10.0, 1, 99);

    BoxScore {
        minutes,
        points,
        rebounds,
        assists,
        steals,
        blocks,
        turnovers,
        rating,
    }
}
