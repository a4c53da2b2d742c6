//! Stat generation and match simulation for the Courtside league.
//!
//! Everything in this crate is a pure function of its numeric inputs and an
//! injected random source (`&mut impl Rng`). Nothing here performs I/O,
//! touches the ledger or knows about persistence, so tests drive it with a
//! seeded [`StdRng`](rand::rngs::StdRng).
//!
//! # Modules
//!
//! - [`weights`] -- Per-position skill weight vectors
//! - [`attributes`] -- Attribute generation, OVR, salary tiers, power rating
//! - [`boxscore`] -- Per-game individual stat lines
//! - [`game`] -- Full season game: two stat lines, team bonus, narrative
//! - [`duel`] -- Best-of-three tournament match engine
//! - [`roster`] -- Team names and NPC name generation

pub mod attributes;
pub mod boxscore;
pub mod duel;
pub mod game;
pub mod roster;
pub mod weights;

pub use attributes::{
    calculate_ovr, calculate_ovr_weighted, calculate_salary, generate_attributes,
    generate_npc_attributes, power_rating,
};
pub use boxscore::simulate_player_game_stats;
pub use duel::{DuelContext, DuelOutcome, DuelRound, simulate_duel};
pub use game::{GameSide, SimulatedGame, simulate_game};
pub use roster::{TEAM_NAMES, generate_npc_name, position_for_slot, team_for_slot};
pub use weights::SkillWeights;

// ---------------------------------------------------------------------------
// Rounding helpers
// ---------------------------------------------------------------------------

/// Round a float to the nearest non-negative integer, flooring at zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn round_u32(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    value.round().min(f64::from(u32::MAX)) as u32
}

/// Round a float and clamp it into `[lo, hi]`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn round_clamped(value: f64, lo: u8, hi: u8) -> u8 {
    if !value.is_finite() {
        return lo;
    }
    value.round().clamp(f64::from(lo), f64::from(hi)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_u32_floors_negative_and_nan() {
        assert_eq!(round_u32(-3.7), 0);
        assert_eq!(round_u32(f64::NAN), 0);
        assert_eq!(round_u32(2.5), 3);
        assert_eq!(round_u32(2.49), 2);
    }

    #[test]
    fn round_clamped_respects_bounds() {
        assert_eq!(round_clamped(120.0, 30, 95), 95);
        assert_eq!(round_clamped(-5.0, 30, 95), 30);
        assert_eq!(round_clamped(61.4, 30, 95), 61);
        assert_eq!(round_clamped(f64::INFINITY, 1, 99), 1);
    }
}
