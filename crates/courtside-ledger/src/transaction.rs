//! Transaction builder and validation for the token ledger.
//!
//! A [`TransactionBuilder`] enforces the sign convention: credit types carry
//! strictly positive amounts, debit types strictly negative ones. The
//! resulting balance snapshot is computed with checked arithmetic.

use chrono::Utc;
use uuid::Uuid;

use courtside_types::{AgentId, TokenTransaction, TransactionId, TransactionType};

use crate::LedgerError;

// ---------------------------------------------------------------------------
// Transaction builder
// ---------------------------------------------------------------------------

/// Builder for constructing validated [`TokenTransaction`] values.
///
/// # Examples
///
/// ```
/// use courtside_ledger::TransactionBuilder;
/// use courtside_types::{AgentId, TransactionType};
///
/// let entry = TransactionBuilder::new(AgentId::new(), TransactionType::Spend)
///     .amount(-3)
///     .description("Game action cost".to_owned())
///     .build(1000);
///
/// assert!(entry.is_ok_and(|e| e.balance_after == 997));
/// ```
#[derive(Debug)]
pub struct TransactionBuilder {
    agent_id: AgentId,
    kind: TransactionType,
    amount: Option<i64>,
    description: Option<String>,
    reference_id: Option<Uuid>,
}

impl TransactionBuilder {
    /// Start building a ledger entry for the given agent and type.
    pub const fn new(agent_id: AgentId, kind: TransactionType) -> Self {
        Self {
            agent_id,
            kind,
            amount: None,
            description: None,
            reference_id: None,
        }
    }

    /// Set the signed amount.
    #[must_use]
    pub const fn amount(mut self, amount: i64) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Set the human-readable description.
    #[must_use]
    pub fn description(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }

    /// Link the entry to the originating game or tournament.
    #[must_use]
    pub const fn reference_id(mut self, id: Uuid) -> Self {
        self.reference_id = Some(id);
        self
    }

    /// Validate inputs and produce a [`TokenTransaction`] whose snapshot is
    /// `balance_before + amount`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::MissingField`] if amount or description is unset,
    /// [`LedgerError::ZeroAmount`] for a zero amount,
    /// [`LedgerError::WrongSign`] if the sign contradicts the entry type, and
    /// [`LedgerError::Overflow`] if the snapshot does not fit in an `i64`.
    pub fn build(self, balance_before: i64) -> Result<TokenTransaction, LedgerError> {
        let amount = self.amount.ok_or(LedgerError::MissingField("amount"))?;
        let description = self
            .description
            .ok_or(LedgerError::MissingField("description"))?;

        validate_sign(self.kind, amount)?;

        let balance_after = balance_before
            .checked_add(amount)
            .ok_or(LedgerError::Overflow {
                agent_id: self.agent_id,
            })?;

        Ok(TokenTransaction {
            id: TransactionId::new(),
            agent_id: self.agent_id,
            amount,
            balance_after,
            kind: self.kind,
            description,
            reference_id: self.reference_id,
            created_at: Utc::now(),
        })
    }
}

/// Check that `amount` is non-zero and signed as `kind` requires.
fn validate_sign(kind: TransactionType, amount: i64) -> Result<(), LedgerError> {
    if amount == 0 {
        return Err(LedgerError::ZeroAmount);
    }
    match (kind.is_credit(), amount.is_positive()) {
        (true, false) => Err(LedgerError::WrongSign {
            kind,
            amount,
            expected: "positive",
        }),
        (false, true) => Err(LedgerError::WrongSign {
            kind,
            amount,
            expected: "negative",
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder(kind: TransactionType, amount: i64) -> TransactionBuilder {
        TransactionBuilder::new(AgentId::new(), kind)
            .amount(amount)
            .description("test".to_owned())
    }

    #[test]
    fn credit_entry_builds_snapshot() {
        let entry = builder(TransactionType::Reward, 15).build(100);
        assert!(entry.is_ok_and(|e| e.balance_after == 115 && e.amount == 15));
    }

    #[test]
    fn debit_entry_may_go_negative() {
        let entry = builder(TransactionType::Spend, -5).build(3);
        assert!(entry.is_ok_and(|e| e.balance_after == -2));
    }

    #[test]
    fn zero_amount_rejected() {
        let entry = builder(TransactionType::Earn, 0).build(0);
        assert!(matches!(entry, Err(LedgerError::ZeroAmount)));
    }

    #[test]
    fn wrong_sign_rejected_both_ways() {
        let credit = builder(TransactionType::Reward, -1).build(0);
        assert!(matches!(
            credit,
            Err(LedgerError::WrongSign {
                expected: "positive",
                ..
            })
        ));
        let debit = builder(TransactionType::Stake, 50).build(0);
        assert!(matches!(
            debit,
            Err(LedgerError::WrongSign {
                expected: "negative",
                ..
            })
        ));
    }

    #[test]
    fn missing_description_rejected() {
        let entry = TransactionBuilder::new(AgentId::new(), TransactionType::Earn)
            .amount(10)
            .build(0);
        assert!(matches!(entry, Err(LedgerError::MissingField("description"))));
    }

    #[test]
    fn overflow_is_an_error() {
        let entry = builder(TransactionType::Earn, 1).build(i64::MAX);
        assert!(matches!(entry, Err(LedgerError::Overflow { .. })));
    }

    #[test]
    fn reference_id_is_carried() {
        let reference = Uuid::now_v7();
        let entry = builder(TransactionType::Reward, 1)
            .reference_id(reference)
            .build(0);
        assert!(entry.is_ok_and(|e| e.reference_id == Some(reference)));
    }
}
