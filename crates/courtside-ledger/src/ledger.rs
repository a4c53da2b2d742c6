//! The ledger journal: an append-only log of token postings.
//!
//! A [`Ledger`] is opened per operation (one simulated game, one tournament
//! settlement). Each posting validates the entry, mutates the agent's
//! balance and lifetime totals in place, and appends the entry. The caller
//! then [`drain`](Ledger::drain)s the entries and hands them to the store,
//! which commits them against the agent's live balance.
//!
//! # Design
//!
//! - **Append-only**: entries are never modified or deleted.
//! - **Snapshots**: every entry carries the balance immediately after it.
//! - **NPC exclusion**: postings against an NPC are refused.
//! - **Ordering**: agent-to-agent transfers debit before they credit.

use uuid::Uuid;

use courtside_types::{Agent, TokenTransaction, TransactionType};

use crate::{LedgerError, TransactionBuilder};

// ---------------------------------------------------------------------------
// Posting parameters
// ---------------------------------------------------------------------------

/// Parameters for a single posting against one agent.
///
/// Packs the arguments of a posting into a single struct to keep call sites
/// readable.
#[derive(Debug, Clone)]
pub struct PostingParams {
    /// Entry type.
    pub kind: TransactionType,
    /// Signed amount; must agree with `kind`.
    pub amount: i64,
    /// Human-readable description.
    pub description: String,
    /// Originating game or tournament.
    pub reference_id: Option<Uuid>,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Journal of token postings for one operation.
#[derive(Debug, Default)]
pub struct Ledger {
    /// All entries, in posting order.
    entries: Vec<TokenTransaction>,
}

impl Ledger {
    /// Create a new empty journal.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Return the number of entries in the journal.
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return whether the journal has no entries.
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries posted so far.
    pub fn entries(&self) -> &[TokenTransaction] {
        &self.entries
    }

    /// Take every entry out of the journal, leaving it empty.
    pub fn drain(&mut self) -> Vec<TokenTransaction> {
        core::mem::take(&mut self.entries)
    }

    /// Post one entry against `agent`, updating its balance and lifetime
    /// totals.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NpcExcluded`] for NPC agents, and any
    /// validation error from the [`TransactionBuilder`].
    pub fn post(
        &mut self,
        agent: &mut Agent,
        params: PostingParams,
    ) -> Result<&TokenTransaction, LedgerError> {
        if agent.is_npc {
            return Err(LedgerError::NpcExcluded { agent_id: agent.id });
        }

        let mut builder = TransactionBuilder::new(agent.id, params.kind)
            .amount(params.amount)
            .description(params.description);
        if let Some(reference) = params.reference_id {
            builder = builder.reference_id(reference);
        }
        let entry = builder.build(agent.token_balance)?;

        let overflow = LedgerError::Overflow { agent_id: agent.id };
        if entry.amount.is_positive() {
            agent.total_earned = agent
                .total_earned
                .checked_add(entry.amount)
                .ok_or(overflow)?;
        } else {
            agent.total_spent = agent
                .total_spent
                .checked_sub(entry.amount)
                .ok_or(overflow)?;
        }
        agent.token_balance = entry.balance_after;

        self.entries.push(entry);
        self.entries
            .last()
            .ok_or(LedgerError::MissingField("entry"))
    }

    /// Credit salary or other earned income.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the posting fails validation.
    pub fn record_earn(
        &mut self,
        agent: &mut Agent,
        amount: i64,
        description: &str,
        reference_id: Option<Uuid>,
    ) -> Result<&TokenTransaction, LedgerError> {
        self.post(agent, credit(TransactionType::Earn, amount, description, reference_id))
    }

    /// Credit a reward, prize or refund.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the posting fails validation.
    pub fn record_reward(
        &mut self,
        agent: &mut Agent,
        amount: i64,
        description: &str,
        reference_id: Option<Uuid>,
    ) -> Result<&TokenTransaction, LedgerError> {
        self.post(
            agent,
            credit(TransactionType::Reward, amount, description, reference_id),
        )
    }

    /// Debit a playing cost. `cost` is given as a positive number.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the posting fails validation.
    pub fn record_spend(
        &mut self,
        agent: &mut Agent,
        cost: i64,
        description: &str,
        reference_id: Option<Uuid>,
    ) -> Result<&TokenTransaction, LedgerError> {
        self.post(agent, debit(TransactionType::Spend, cost, description, reference_id)?)
    }

    /// Debit an entry fee. `fee` is given as a positive number.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the posting fails validation.
    pub fn record_stake(
        &mut self,
        agent: &mut Agent,
        fee: i64,
        description: &str,
        reference_id: Option<Uuid>,
    ) -> Result<&TokenTransaction, LedgerError> {
        self.post(agent, debit(TransactionType::Stake, fee, description, reference_id)?)
    }

    /// Apply a signed token delta as a reward (positive) or spend
    /// (negative). A zero delta posts nothing and returns `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the posting fails validation.
    pub fn record_delta(
        &mut self,
        agent: &mut Agent,
        delta: i64,
        description: &str,
        reference_id: Option<Uuid>,
    ) -> Result<Option<&TokenTransaction>, LedgerError> {
        match delta.signum() {
            0 => Ok(None),
            1 => self
                .record_reward(agent, delta, description, reference_id)
                .map(Some),
            _ => self
                .record_spend(agent, 0_i64.saturating_sub(delta), description, reference_id)
                .map(Some),
        }
    }

    /// Move tokens between two agents. The debit is posted before the
    /// credit; if the credit fails the debit is already journaled and the
    /// error is returned so the caller can abandon the operation.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::SelfTransfer`] if both sides are the same
    /// agent, or any posting error.
    pub fn record_agent_transfer(
        &mut self,
        from: &mut Agent,
        to: &mut Agent,
        amount: i64,
        reason: &str,
    ) -> Result<(), LedgerError> {
        if from.id == to.id {
            return Err(LedgerError::SelfTransfer { agent_id: from.id });
        }
        let outgoing = debit(
            TransactionType::TransferOut,
            amount,
            &format!("{reason} to {}", to.nickname),
            Some(to.id.into_inner()),
        )?;
        self.post(from, outgoing)?;
        self.post(
            to,
            credit(
                TransactionType::TransferIn,
                amount,
                &format!("{reason} from {}", from.nickname),
                Some(from.id.into_inner()),
            ),
        )?;
        Ok(())
    }
}

fn credit(
    kind: TransactionType,
    amount: i64,
    description: &str,
    reference_id: Option<Uuid>,
) -> PostingParams {
    PostingParams {
        kind,
        amount,
        description: description.to_owned(),
        reference_id,
    }
}

fn debit(
    kind: TransactionType,
    magnitude: i64,
    description: &str,
    reference_id: Option<Uuid>,
) -> Result<PostingParams, LedgerError> {
    let amount = magnitude.checked_neg().ok_or(LedgerError::WrongSign {
        kind,
        amount: magnitude,
        expected: "negative",
    })?;
    Ok(PostingParams {
        kind,
        amount,
        description: description.to_owned(),
        reference_id,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use courtside_types::{AgentId, Attributes, Position};

    use super::*;
    use crate::conservation::{ConservationResult, verify_conservation};
    use crate::{NPC_STAKE, REAL_AGENT_STAKE, initial_stake};

    fn agent(is_npc: bool) -> Agent {
        Agent {
            id: AgentId::new(),
            nickname: if is_npc { "Bot".to_owned() } else { "Ace".to_owned() },
            is_npc,
            active: true,
            position: Position::SmallForward,
            attributes: Attributes::uniform(60),
            luck_value: 50,
            cognitive_score: 50,
            life_vision: None,
            team: None,
            wins: 0,
            losses: 0,
            salary: 80,
            token_balance: initial_stake(is_npc),
            total_earned: 0,
            total_spent: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn new_ledger_is_empty() {
        let ledger = Ledger::new();
        assert!(ledger.is_empty());
        assert_eq!(ledger.len(), 0);
    }

    #[test]
    fn reward_updates_balance_and_totals() {
        let mut ledger = Ledger::new();
        let mut a = agent(false);
        let result = ledger.record_reward(&mut a, 40, "prize", None);
        assert!(result.is_ok());
        assert_eq!(a.token_balance, REAL_AGENT_STAKE + 40);
        assert_eq!(a.total_earned, 40);
        assert_eq!(a.total_spent, 0);
    }

    #[test]
    fn spend_records_negative_amount() {
        let mut ledger = Ledger::new();
        let mut a = agent(false);
        let _ = ledger.record_spend(&mut a, 4, "action cost", None);
        assert_eq!(ledger.entries().first().map(|e| e.amount), Some(-4));
        assert_eq!(a.total_spent, 4);
        assert_eq!(a.token_balance, REAL_AGENT_STAKE - 4);
    }

    #[test]
    fn npc_postings_are_refused() {
        let mut ledger = Ledger::new();
        let mut npc = agent(true);
        let result = ledger.record_reward(&mut npc, 10, "prize", None);
        assert!(matches!(result, Err(LedgerError::NpcExcluded { .. })));
        assert!(ledger.is_empty());
        assert_eq!(npc.token_balance, NPC_STAKE);
    }

    #[test]
    fn zero_delta_posts_nothing() {
        let mut ledger = Ledger::new();
        let mut a = agent(false);
        let result = ledger.record_delta(&mut a, 0, "noop", None);
        assert!(matches!(result, Ok(None)));
        assert!(ledger.is_empty());
    }

    #[test]
    fn delta_picks_type_by_sign() {
        let mut ledger = Ledger::new();
        let mut a = agent(false);
        let _ = ledger.record_delta(&mut a, 12, "win", None);
        let _ = ledger.record_delta(&mut a, -3, "cost", None);
        let kinds: Vec<TransactionType> = ledger.entries().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![TransactionType::Reward, TransactionType::Spend]);
    }

    #[test]
    fn transfer_debits_before_crediting() {
        let mut ledger = Ledger::new();
        let mut a = agent(false);
        let mut b = agent(false);
        let result = ledger.record_agent_transfer(&mut a, &mut b, 25, "Gift");
        assert!(result.is_ok());
        let kinds: Vec<TransactionType> = ledger.entries().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![TransactionType::TransferOut, TransactionType::TransferIn]
        );
        assert_eq!(a.token_balance + b.token_balance, 2 * REAL_AGENT_STAKE);
    }

    #[test]
    fn self_transfer_rejected() {
        let mut ledger = Ledger::new();
        let mut a = agent(false);
        let mut same = a.clone();
        let result = ledger.record_agent_transfer(&mut a, &mut same, 5, "Loop");
        assert!(matches!(result, Err(LedgerError::SelfTransfer { .. })));
    }

    #[test]
    fn drain_empties_journal() {
        let mut ledger = Ledger::new();
        let mut a = agent(false);
        let _ = ledger.record_earn(&mut a, 100, "salary", None);
        let drained = ledger.drain();
        assert_eq!(drained.len(), 1);
        assert!(ledger.is_empty());
    }

    #[test]
    fn random_postings_conserve_balance() {
        // Property: for any sequence of postings, the final balance equals
        // the initial stake plus the sum of amounts, and every snapshot
        // chains from the previous one.
        for seed in 0..50_u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut ledger = Ledger::new();
            let mut a = agent(false);
            for _ in 0..40 {
                let amount: i64 = rng.random_range(1..200);
                let _ = match rng.random_range(0..4_u8) {
                    0 => ledger.record_earn(&mut a, amount, "earn", None),
                    1 => ledger.record_reward(&mut a, amount, "reward", None),
                    2 => ledger.record_spend(&mut a, amount, "spend", None),
                    _ => ledger.record_stake(&mut a, amount, "stake", None),
                };
            }
            assert_eq!(
                verify_conservation(a.id, REAL_AGENT_STAKE, a.token_balance, ledger.entries()),
                ConservationResult::Balanced,
                "seed {seed}"
            );
        }
    }
}
