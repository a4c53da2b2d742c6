//! Swiss-system pairing.
//!
//! A pure function of standings and history. Entries are sorted by score
//! (stable, so equal scores keep their input order, which callers supply
//! in enrollment-seed order); each unpaired agent from the top takes the
//! first unpaired agent below it that it has not met yet. When every
//! remaining candidate is a previous opponent the first remaining one is
//! taken anyway: rematches are accepted over leaving players idle. An odd
//! agent out receives the bye.

use std::collections::HashSet;

use courtside_types::{AgentId, TournamentMatch, TournamentParticipant};

/// One agent's standing as seen by the pairing algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingEntry {
    /// The agent.
    pub agent_id: AgentId,
    /// Cumulative Swiss score.
    pub score: u32,
    /// Agents already faced in this tournament.
    pub previous_opponents: HashSet<AgentId>,
}

impl PairingEntry {
    /// An entry with no score and no history, as in round one.
    pub fn fresh(agent_id: AgentId) -> Self {
        Self {
            agent_id,
            score: 0,
            previous_opponents: HashSet::new(),
        }
    }

    fn has_played(&self, other: AgentId) -> bool {
        self.previous_opponents.contains(&other)
    }
}

/// Pairings for one round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pairings {
    /// Matched pairs, higher-ranked agent first.
    pub pairs: Vec<(AgentId, AgentId)>,
    /// The agent sitting out, if the field is odd.
    pub bye: Option<AgentId>,
}

impl Pairings {
    /// Number of matched pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether no pairs were produced.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Pair the next round.
pub fn swiss_pairing(entries: &[PairingEntry]) -> Pairings {
    let mut ranked: Vec<&PairingEntry> = entries.iter().collect();
    ranked.sort_by(|a, b| b.score.cmp(&a.score));

    let mut paired = vec![false; ranked.len()];
    let mut pairings = Pairings::default();

    for (i, entry) in ranked.iter().enumerate() {
        if paired.get(i).copied().unwrap_or(true) {
            continue;
        }
        let open = |j: &usize| !paired.get(*j).copied().unwrap_or(true);
        let fresh = (i.saturating_add(1)..ranked.len())
            .filter(open)
            .find(|&j| ranked.get(j).is_some_and(|c| !entry.has_played(c.agent_id)));
        let partner = fresh.or_else(|| (i.saturating_add(1)..ranked.len()).find(open));

        match partner.and_then(|j| ranked.get(j).map(|c| (j, c.agent_id))) {
            Some((j, opponent)) => {
                mark(&mut paired, i);
                mark(&mut paired, j);
                pairings.pairs.push((entry.agent_id, opponent));
            }
            None => {
                mark(&mut paired, i);
                pairings.bye = Some(entry.agent_id);
            }
        }
    }
    pairings
}

fn mark(paired: &mut [bool], index: usize) {
    if let Some(slot) = paired.get_mut(index) {
        *slot = true;
    }
}

/// Build pairing input from stored standings and every match played so
/// far. Output follows the order of `participants`.
pub fn pairing_entries(
    participants: &[TournamentParticipant],
    matches: &[TournamentMatch],
) -> Vec<PairingEntry> {
    participants
        .iter()
        .map(|p| PairingEntry {
            agent_id: p.agent_id,
            score: p.score,
            previous_opponents: matches
                .iter()
                .filter_map(|m| m.opponent_of(p.agent_id))
                .collect(),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    use super::*;

    fn ids(n: usize) -> Vec<AgentId> {
        (0..n).map(|_| AgentId::new()).collect()
    }

    fn assert_disjoint(pairings: &Pairings, field: usize) {
        let mut seen = HashSet::new();
        for (a, b) in &pairings.pairs {
            assert_ne!(a, b, "agent paired with itself");
            assert!(seen.insert(*a), "agent appears twice");
            assert!(seen.insert(*b), "agent appears twice");
        }
        if let Some(bye) = pairings.bye {
            assert!(seen.insert(bye), "bye agent was also paired");
        }
        assert_eq!(seen.len(), field);
    }

    #[test]
    fn fresh_fields_pair_everyone() {
        for n in 0..=17 {
            let entries: Vec<PairingEntry> =
                ids(n).into_iter().map(PairingEntry::fresh).collect();
            let pairings = swiss_pairing(&entries);
            assert_eq!(pairings.len(), n / 2);
            assert_eq!(pairings.bye.is_some(), n % 2 == 1);
            assert_disjoint(&pairings, n);
        }
    }

    #[test]
    fn single_entrant_gets_the_bye() {
        let solo = AgentId::new();
        let pairings = swiss_pairing(&[PairingEntry::fresh(solo)]);
        assert!(pairings.is_empty());
        assert_eq!(pairings.bye, Some(solo));
    }

    #[test]
    fn ties_keep_input_order() {
        let field = ids(4);
        let entries: Vec<PairingEntry> = field.iter().copied().map(PairingEntry::fresh).collect();
        let pairings = swiss_pairing(&entries);
        assert_eq!(pairings.pairs, vec![(field[0], field[1]), (field[2], field[3])]);
    }

    #[test]
    fn higher_scores_pair_first_and_bye_goes_to_the_bottom() {
        let field = ids(3);
        let entries = vec![
            PairingEntry { score: 0, ..PairingEntry::fresh(field[0]) },
            PairingEntry { score: 6, ..PairingEntry::fresh(field[1]) },
            PairingEntry { score: 3, ..PairingEntry::fresh(field[2]) },
        ];
        let pairings = swiss_pairing(&entries);
        assert_eq!(pairings.pairs, vec![(field[1], field[2])]);
        assert_eq!(pairings.bye, Some(field[0]));
    }

    #[test]
    fn avoids_rematches_when_possible() {
        let field = ids(4);
        let mut entries: Vec<PairingEntry> =
            field.iter().copied().map(PairingEntry::fresh).collect();
        entries[0].previous_opponents.insert(field[1]);
        entries[1].previous_opponents.insert(field[0]);

        let pairings = swiss_pairing(&entries);
        assert_eq!(pairings.pairs, vec![(field[0], field[2]), (field[1], field[3])]);
    }

    #[test]
    fn falls_back_to_rematch() {
        let field = ids(2);
        let mut entries: Vec<PairingEntry> =
            field.iter().copied().map(PairingEntry::fresh).collect();
        entries[0].previous_opponents.insert(field[1]);
        entries[1].previous_opponents.insert(field[0]);

        let pairings = swiss_pairing(&entries);
        assert_eq!(pairings.pairs, vec![(field[0], field[1])]);
        assert!(pairings.bye.is_none());
    }

    #[test]
    fn random_standings_always_yield_a_valid_round() {
        for seed in 0..200_u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let n = rng.random_range(0..20_usize);
            let field = ids(n);
            let entries: Vec<PairingEntry> = field
                .iter()
                .map(|&id| {
                    let mut history: Vec<AgentId> =
                        field.iter().copied().filter(|&o| o != id).collect();
                    history.shuffle(&mut rng);
                    history.truncate(rng.random_range(0..=n));
                    PairingEntry {
                        agent_id: id,
                        score: rng.random_range(0..=9),
                        previous_opponents: history.into_iter().collect(),
                    }
                })
                .collect();

            let pairings = swiss_pairing(&entries);
            assert_eq!(pairings.len(), n / 2, "seed {seed}");
            assert_eq!(pairings.bye.is_some(), n % 2 == 1, "seed {seed}");
            assert_disjoint(&pairings, n);
        }
    }

    #[test]
    fn entries_collect_opponents_from_history() {
        use courtside_types::{MatchId, MatchStatus, TournamentId};

        let tid = TournamentId::new();
        let field = ids(3);
        let game = TournamentMatch {
            id: MatchId::new(),
            tournament_id: tid,
            round: 1,
            agent1_id: field[0],
            agent2_id: field[1],
            winner_id: Some(field[0]),
            agent1_score: 2,
            agent2_score: 1,
            narrative: None,
            status: MatchStatus::Completed,
        };
        let participants: Vec<TournamentParticipant> = field
            .iter()
            .enumerate()
            .map(|(i, &id)| TournamentParticipant {
                tournament_id: tid,
                agent_id: id,
                is_npc: false,
                nickname: format!("p{i}"),
                wins: 0,
                losses: 0,
                draws: 0,
                score: 0,
                bye_rounds: Vec::new(),
                placement: None,
                tokens_won: 0,
                seed: u32::try_from(i).unwrap_or(0),
            })
            .collect();

        let entries = pairing_entries(&participants, &[game]);
        assert!(entries[0].has_played(field[1]));
        assert!(entries[1].has_played(field[0]));
        assert!(entries[2].previous_opponents.is_empty());
    }
}
