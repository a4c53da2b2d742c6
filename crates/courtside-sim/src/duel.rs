//! Best-of-three tournament duel.
//!
//! Each sub-round both agents roll `floor(U(0,1) * power)`; the higher roll
//! takes the sub-round and equal rolls split it. The duel stops as soon as
//! one side holds two sub-rounds. Equal sub-round counts after three rounds
//! are a draw.

use rand::Rng;

use courtside_types::{Agent, AgentId};

use crate::attributes::power_rating;

/// Sub-rounds needed to take the duel.
const ROUNDS_TO_WIN: u32 = 2;

/// Maximum sub-rounds per duel.
const MAX_ROUNDS: u32 = 3;

/// Context used in the duel narrative.
#[derive(Debug, Clone, Copy)]
pub struct DuelContext<'a> {
    /// Tournament display name.
    pub tournament_name: &'a str,
    /// Swiss round number.
    pub round: u32,
}

/// One sub-round of a duel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuelRound {
    /// Sub-round number, starting at 1.
    pub number: u32,
    /// First side's roll.
    pub roll_a: u32,
    /// Second side's roll.
    pub roll_b: u32,
}

/// Result of a duel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuelOutcome {
    /// Winner, `None` on a draw.
    pub winner: Option<AgentId>,
    /// Sub-rounds won by the first side.
    pub score_a: u32,
    /// Sub-rounds won by the second side.
    pub score_b: u32,
    /// Match narrative.
    pub narrative: String,
    /// Every sub-round played.
    pub rounds: Vec<DuelRound>,
}

impl DuelOutcome {
    /// Whether the duel ended level.
    pub const fn is_draw(&self) -> bool {
        self.winner.is_none()
    }
}

/// Simulate a best-of-three duel between `a` and `b`.
pub fn simulate_duel(
    a: &Agent,
    b: &Agent,
    context: DuelContext<'_>,
    rng: &mut impl Rng,
) -> DuelOutcome {
    let power_a = power_rating(a);
    let power_b = power_rating(b);

    let mut score_a = 0_u32;
    let mut score_b = 0_u32;
    let mut rounds = Vec::new();

    for number in 1..=MAX_ROUNDS {
        let roll_a = roll(power_a, rng);
        let roll_b = roll(power_b, rng);
        rounds.push(DuelRound {
            number,
            roll_a,
            roll_b,
        });

        match roll_a.cmp(&roll_b) {
            core::cmp::Ordering::Greater => score_a = score_a.saturating_add(1),
            core::cmp::Ordering::Less => score_b = score_b.saturating_add(1),
            core::cmp::Ordering::Equal => {}
        }

        if score_a >= ROUNDS_TO_WIN || score_b >= ROUNDS_TO_WIN {
            break;
        }
    }

    let winner = match score_a.cmp(&score_b) {
        core::cmp::Ordering::Greater => Some(a.id),
        core::cmp::Ordering::Less => Some(b.id),
        core::cmp::Ordering::Equal => None,
    };

    let narrative = narrate(a, b, score_a, score_b, context);

    DuelOutcome {
        winner,
        score_a,
        score_b,
        narrative,
        rounds,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn roll(power: f64, rng: &mut impl Rng) -> u32 {
    let value = rng.random::<f64>() * power.max(0.0);
    value.floor().min(f64::from(u32::MAX)) as u32
}

fn narrate(a: &Agent, b: &Agent, score_a: u32, score_b: u32, context: DuelContext<'_>) -> String {
    let header = format!("[{} - Round {}]", context.tournament_name, context.round);
    if score_a == score_b {
        return format!(
            "{header} {} and {} are evenly matched and fight to a draw.",
            a.nickname, b.nickname
        );
    }

    let (winner, loser) = if score_a > score_b { (a, b) } else { (b, a) };
    let high = score_a.max(score_b);
    let low = score_a.min(score_b);

    if low == 0 {
        format!(
            "{header} {} sweeps {} {high}:{low} in a show of overwhelming strength!",
            winner.nickname, loser.nickname
        )
    } else {
        format!(
            "{header} {} edges {} {high}:{low} after a hard-fought battle.",
            winner.nickname, loser.nickname
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use courtside_types::{Attributes, Position};

    use super::*;

    fn agent(name: &str, skill: u8, wins: u32, losses: u32) -> Agent {
        Agent {
            id: AgentId::new(),
            nickname: name.to_owned(),
            is_npc: false,
            active: true,
            position: Position::SmallForward,
            attributes: Attributes::uniform(skill),
            luck_value: 50,
            cognitive_score: 50,
            life_vision: None,
            team: None,
            wins,
            losses,
            salary: 80,
            token_balance: 1000,
            total_earned: 0,
            total_spent: 0,
            created_at: Utc::now(),
        }
    }

    const CTX: DuelContext<'static> = DuelContext {
        tournament_name: "Autumn Open",
        round: 2,
    };

    #[test]
    fn duel_never_exceeds_three_rounds() {
        let a = agent("Ace", 70, 3, 1);
        let b = agent("Bolt", 65, 1, 3);
        for seed in 0..500_u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let outcome = simulate_duel(&a, &b, CTX, &mut rng);
            assert!(outcome.rounds.len() <= 3);
            assert!(outcome.score_a <= 2 && outcome.score_b <= 2);
            match outcome.winner {
                Some(w) if w == a.id => assert!(outcome.score_a > outcome.score_b),
                Some(w) => {
                    assert_eq!(w, b.id);
                    assert!(outcome.score_b > outcome.score_a);
                }
                None => assert_eq!(outcome.score_a, outcome.score_b),
            }
        }
    }

    #[test]
    fn stronger_agent_wins_more_often() {
        let strong = agent("Ace", 95, 10, 0);
        let weak = agent("Bolt", 30, 0, 10);
        let mut rng = StdRng::seed_from_u64(42);
        let strong_wins = (0..400)
            .filter(|_| simulate_duel(&strong, &weak, CTX, &mut rng).winner == Some(strong.id))
            .count();
        assert!(strong_wins > 200);
    }

    #[test]
    fn narratives_by_outcome() {
        let a = agent("Ace", 60, 0, 0);
        let b = agent("Bolt", 60, 0, 0);
        assert!(narrate(&a, &b, 1, 1, CTX).contains("draw"));
        assert!(narrate(&a, &b, 2, 0, CTX).contains("Ace sweeps Bolt 2:0"));
        assert!(narrate(&a, &b, 1, 2, CTX).contains("Bolt edges Ace 2:1"));
        assert!(narrate(&a, &b, 2, 0, CTX).starts_with("[Autumn Open - Round 2]"));
    }
}
