//! Team names and NPC roster generation.

use rand::Rng;

use courtside_types::Position;

/// The eight league teams.
pub const TEAM_NAMES: [&str; 8] = [
    "Dragon City Lightning",
    "Starfall Warriors",
    "Blaze Lions",
    "Frost Wolves",
    "Thunder Hawks",
    "Shadow Blades",
    "Golden Giants",
    "Storm Corsairs",
];

const NPC_FIRST: &[&str] = &[
    "Shadow", "Gale", "Thunder", "Ember", "Frost", "Dusk", "Radiant", "Star", "Iron", "Gold",
    "Silver", "Jade", "Ink", "Rime", "Blaze", "Onyx", "Azure", "Crimson", "Ivory", "Violet",
    "Cobalt", "Phantom", "Proud", "Wild",
];

const NPC_LAST: &[&str] = &[
    "Dragon", "Tiger", "Hawk", "Wolf", "Panther", "Viper", "Bear", "Crane", "Blade", "Fist",
    "Spear", "Shield", "Bow", "Sword", "Hammer", "Axe",
];

/// Random two-word NPC name, e.g. `"Frost Hawk"`.
pub fn generate_npc_name(rng: &mut impl Rng) -> String {
    let first = NPC_FIRST
        .get(rng.random_range(0..NPC_FIRST.len()))
        .copied()
        .unwrap_or("Nameless");
    let last = NPC_LAST
        .get(rng.random_range(0..NPC_LAST.len()))
        .copied()
        .unwrap_or("Rookie");
    format!("{first} {last}")
}

/// Position for the `slot`-th NPC, cycling PG, SG, SF, PF, C.
pub fn position_for_slot(slot: usize) -> Position {
    Position::ALL
        .get(slot % Position::ALL.len())
        .copied()
        .unwrap_or(Position::SmallForward)
}

/// Team for the `slot`-th NPC: five consecutive NPCs share a team.
pub fn team_for_slot(slot: usize) -> &'static str {
    TEAM_NAMES
        .get((slot / 5) % TEAM_NAMES.len())
        .copied()
        .unwrap_or(TEAM_NAMES[0])
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn npc_names_are_two_words() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let name = generate_npc_name(&mut rng);
            assert_eq!(name.split(' ').count(), 2, "{name}");
        }
    }

    #[test]
    fn slots_cycle_positions_and_fill_teams_in_fives() {
        assert_eq!(position_for_slot(0), Position::PointGuard);
        assert_eq!(position_for_slot(4), Position::Center);
        assert_eq!(position_for_slot(5), Position::PointGuard);
        assert_eq!(team_for_slot(0), TEAM_NAMES[0]);
        assert_eq!(team_for_slot(4), TEAM_NAMES[0]);
        assert_eq!(team_for_slot(5), TEAM_NAMES[1]);
        assert_eq!(team_for_slot(40), TEAM_NAMES[0]);
    }
}
