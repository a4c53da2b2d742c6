//! Per-position skill weights.
//!
//! Each position weights the seven skills differently. Weights bias
//! attribute generation (skills weighted above 1.0 start higher) and define
//! the OVR average.
//!
//! | Pos | SHT | DEF | SPD | STA | IQ  | PAS | REB |
//! |-----|-----|-----|-----|-----|-----|-----|-----|
//! | PG  | 0.8 | 0.6 | 1.2 | 0.8 | 1.3 | 1.5 | 0.3 |
//! | SG  | 1.5 | 0.7 | 1.0 | 0.9 | 0.9 | 0.8 | 0.4 |
//! | SF  | 1.0 | 1.0 | 0.9 | 1.0 | 1.0 | 0.8 | 0.8 |
//! | PF  | 0.7 | 1.2 | 0.7 | 1.1 | 0.8 | 0.5 | 1.3 |
//! | C   | 0.4 | 1.4 | 0.5 | 1.2 | 0.7 | 0.4 | 1.5 |

use courtside_types::{Position, Skill};

/// A weight for each of the seven skills.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkillWeights {
    /// Shooting weight.
    pub shooting: f64,
    /// Defense weight.
    pub defense: f64,
    /// Speed weight.
    pub speed: f64,
    /// Stamina weight.
    pub stamina: f64,
    /// Basketball IQ weight.
    pub basketball_iq: f64,
    /// Passing weight.
    pub passing: f64,
    /// Rebounding weight.
    pub rebounding: f64,
}

impl SkillWeights {
    /// Weight table for a position.
    pub const fn for_position(position: Position) -> Self {
        match position {
            Position::PointGuard => Self::new(0.8, 0.6, 1.2, 0.8, 1.3, 1.5, 0.3),
            Position::ShootingGuard => Self::new(1.5, 0.7, 1.0, 0.9, 0.9, 0.8, 0.4),
            Position::SmallForward => Self::new(1.0, 1.0, 0.9, 1.0, 1.0, 0.8, 0.8),
            Position::PowerForward => Self::new(0.7, 1.2, 0.7, 1.1, 0.8, 0.5, 1.3),
            Position::Center => Self::new(0.4, 1.4, 0.5, 1.2, 0.7, 0.4, 1.5),
        }
    }

    #[allow(clippy::too_many_arguments)]
    const fn new(
        shooting: f64,
        defense: f64,
        speed: f64,
        stamina: f64,
        basketball_iq: f64,
        passing: f64,
        rebounding: f64,
    ) -> Self {
        Self {
            shooting,
            defense,
            speed,
            stamina,
            basketball_iq,
            passing,
            rebounding,
        }
    }

    /// Weight of one skill.
    pub const fn get(&self, skill: Skill) -> f64 {
        match skill {
            Skill::Shooting => self.shooting,
            Skill::Defense => self.defense,
            Skill::Speed => self.speed,
            Skill::Stamina => self.stamina,
            Skill::BasketballIq => self.basketball_iq,
            Skill::Passing => self.passing,
            Skill::Rebounding => self.rebounding,
        }
    }

    /// Sum of all seven weights; the OVR normalizing constant.
    pub fn total(&self) -> f64 {
        Skill::ALL.iter().map(|s| self.get(*s)).sum()
    }

    /// Every weight multiplied by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(
            self.shooting * factor,
            self.defense * factor,
            self.speed * factor,
            self.stamina * factor,
            self.basketball_iq * factor,
            self.passing * factor,
            self.rebounding * factor,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_position_has_a_positive_total() {
        for position in Position::ALL {
            let total = SkillWeights::for_position(*position).total();
            assert!(total > 0.0, "{position} total {total}");
        }
    }

    #[test]
    fn position_totals_match_table() {
        let expected = [
            (Position::PointGuard, 6.5),
            (Position::ShootingGuard, 6.2),
            (Position::SmallForward, 6.5),
            (Position::PowerForward, 6.3),
            (Position::Center, 6.1),
        ];
        for (position, total) in expected {
            let actual = SkillWeights::for_position(position).total();
            assert!((actual - total).abs() < 1e-9, "{position}: {actual}");
        }
    }

    #[test]
    fn scaling_scales_total() {
        let weights = SkillWeights::for_position(Position::Center);
        let scaled = weights.scaled(3.0);
        assert!((scaled.total() - weights.total() * 3.0).abs() < 1e-9);
    }
}
