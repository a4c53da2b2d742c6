//! Conservation and solvency checks for the token ledger.
//!
//! For every agent the check is:
//!
//! ```text
//! balance == initial_stake + sum(amount for every entry of the agent)
//! ```
//!
//! Additionally, consecutive balance snapshots must chain: each entry's
//! `balance_after` equals the previous snapshot plus its own amount. Both
//! pass by construction for entries produced by the [`Ledger`](crate::Ledger);
//! they exist to catch corruption or concurrent writers that bypassed it.
//!
//! Solvency is not enforced at posting time (balances may dip below zero
//! between two postings of one operation) but must hold once a settlement
//! completes.

use courtside_types::{Agent, AgentId, TokenTransaction};

use crate::{LedgerAnomaly, LedgerError};

/// The result of a conservation check for a single agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConservationResult {
    /// The agent's books balance.
    Balanced,
    /// The balance or a snapshot disagrees with the entries.
    Anomaly(LedgerAnomaly),
}

/// Verify the conservation law for one agent.
///
/// `entries` may contain other agents' entries; they are ignored. Entries
/// are assumed to be in posting order.
pub fn verify_conservation(
    agent_id: AgentId,
    initial_stake: i64,
    balance: i64,
    entries: &[TokenTransaction],
) -> ConservationResult {
    let mut running = initial_stake;

    for entry in entries.iter().filter(|e| e.agent_id == agent_id) {
        running = match running.checked_add(entry.amount) {
            Some(val) => val,
            None => {
                return ConservationResult::Anomaly(LedgerAnomaly {
                    agent_id,
                    expected: running,
                    actual: balance,
                    message: format!("token sum overflow for agent {agent_id}"),
                });
            }
        };

        if entry.balance_after != running {
            return ConservationResult::Anomaly(LedgerAnomaly {
                agent_id,
                expected: running,
                actual: entry.balance_after,
                message: format!(
                    "snapshot mismatch on entry {} for agent {agent_id}: expected {running}, recorded {}",
                    entry.id, entry.balance_after
                ),
            });
        }
    }

    if running == balance {
        ConservationResult::Balanced
    } else {
        ConservationResult::Anomaly(LedgerAnomaly {
            agent_id,
            expected: running,
            actual: balance,
            message: format!(
                "LEDGER_ANOMALY: agent {agent_id} balance {balance} != stake {initial_stake} + entries ({running})"
            ),
        })
    }
}

/// Check that a settled agent is not left with a negative balance.
///
/// NPCs are always solvent: their balance never moves.
///
/// # Errors
///
/// Returns [`LedgerError::Insolvent`] when the balance is negative.
pub const fn verify_solvency(agent: &Agent) -> Result<(), LedgerError> {
    if agent.token_balance < 0 {
        return Err(LedgerError::Insolvent {
            agent_id: agent.id,
            balance: agent.token_balance,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use courtside_types::{TransactionId, TransactionType};

    use super::*;

    fn entry(agent_id: AgentId, amount: i64, balance_after: i64) -> TokenTransaction {
        TokenTransaction {
            id: TransactionId::new(),
            agent_id,
            amount,
            balance_after,
            kind: if amount > 0 {
                TransactionType::Reward
            } else {
                TransactionType::Spend
            },
            description: "test".to_owned(),
            reference_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_history_balances_at_stake() {
        let id = AgentId::new();
        assert_eq!(
            verify_conservation(id, 1000, 1000, &[]),
            ConservationResult::Balanced
        );
    }

    #[test]
    fn chained_entries_balance() {
        let id = AgentId::new();
        let entries = vec![entry(id, -50, 950), entry(id, 120, 1070), entry(id, -3, 1067)];
        assert_eq!(
            verify_conservation(id, 1000, 1067, &entries),
            ConservationResult::Balanced
        );
    }

    #[test]
    fn other_agents_entries_are_ignored() {
        let id = AgentId::new();
        let other = AgentId::new();
        let entries = vec![entry(other, 500, 1500), entry(id, 10, 1010)];
        assert_eq!(
            verify_conservation(id, 1000, 1010, &entries),
            ConservationResult::Balanced
        );
    }

    #[test]
    fn drifted_balance_is_an_anomaly() {
        let id = AgentId::new();
        let entries = vec![entry(id, 10, 1010)];
        let result = verify_conservation(id, 1000, 1020, &entries);
        assert!(matches!(
            result,
            ConservationResult::Anomaly(LedgerAnomaly {
                expected: 1010,
                actual: 1020,
                ..
            })
        ));
    }

    #[test]
    fn broken_snapshot_chain_is_an_anomaly() {
        let id = AgentId::new();
        let entries = vec![entry(id, 10, 1010), entry(id, 10, 1030)];
        let result = verify_conservation(id, 1000, 1030, &entries);
        assert!(matches!(result, ConservationResult::Anomaly(_)));
    }
}
