//! Token ledger for the Courtside league.
//!
//! Every token balance mutation is paired with an immutable
//! [`TokenTransaction`](courtside_types::TokenTransaction) carrying the
//! signed amount, the resulting balance snapshot, a type tag and an optional
//! reference to the originating game or tournament. The ledger never panics;
//! it returns errors.
//!
//! # Architecture
//!
//! - [`ledger`] -- The [`Ledger`] journal: posts entries against an agent and
//!   collects them for the store.
//! - [`transaction`] -- The [`TransactionBuilder`] for validated entry
//!   construction.
//! - [`conservation`] -- Conservation, snapshot-chain and solvency checks.
//!
//! # Conservation Law
//!
//! For every agent A:
//!
//! ```text
//! balance(A) == initial_stake(A) + sum(amount for every entry of A)
//! ```
//!
//! The initial stake is [`REAL_AGENT_STAKE`] for human-linked agents and
//! [`NPC_STAKE`] for NPCs. NPCs never receive ledger entries: the journal
//! refuses to post against them.
//!
//! # Sign Convention
//!
//! | Type | Sign |
//! |------|------|
//! | Earn | + |
//! | Reward | + |
//! | `TransferIn` | + |
//! | Spend | - |
//! | `TransferOut` | - |
//! | Stake | - |
//!
//! # Usage
//!
//! ```
//! use courtside_ledger::{Ledger, REAL_AGENT_STAKE};
//! use courtside_ledger::conservation::{verify_conservation, ConservationResult};
//! # use courtside_types::*;
//! # let mut agent = Agent {
//! #     id: AgentId::new(), nickname: "Ace".to_owned(), is_npc: false, active: true,
//! #     position: Position::PointGuard, attributes: Attributes::uniform(60),
//! #     luck_value: 50, cognitive_score: 50, life_vision: None, team: None,
//! #     wins: 0, losses: 0, salary: 80, token_balance: REAL_AGENT_STAKE,
//! #     total_earned: 0, total_spent: 0, created_at: chrono::Utc::now(),
//! # };
//!
//! let mut ledger = Ledger::new();
//! ledger.record_stake(&mut agent, 50, "Tournament entry fee", None).ok();
//! ledger.record_reward(&mut agent, 120, "Tournament prize", None).ok();
//!
//! assert_eq!(agent.token_balance, 1070);
//! assert_eq!(
//!     verify_conservation(agent.id, REAL_AGENT_STAKE, agent.token_balance, ledger.entries()),
//!     ConservationResult::Balanced,
//! );
//! ```

pub mod conservation;
pub mod ledger;
pub mod transaction;

// Re-export primary types at crate root.
pub use conservation::ConservationResult;
pub use ledger::{Ledger, PostingParams};
pub use transaction::TransactionBuilder;

use courtside_types::{AgentId, TransactionType};

/// Initial token stake of a human-linked agent.
pub const REAL_AGENT_STAKE: i64 = 1000;

/// Initial token stake of an NPC. NPC balances never move afterwards.
pub const NPC_STAKE: i64 = 500;

/// Initial stake for an agent given its NPC flag.
pub const fn initial_stake(is_npc: bool) -> i64 {
    if is_npc { NPC_STAKE } else { REAL_AGENT_STAKE }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when posting ledger entries.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Amount must be non-zero.
    #[error("ledger entry amount must be non-zero")]
    ZeroAmount,

    /// The sign of the amount does not match the entry type.
    #[error("{kind} entries must be {expected}, got {amount}")]
    WrongSign {
        /// The entry type being validated.
        kind: TransactionType,
        /// The invalid amount.
        amount: i64,
        /// "positive" or "negative".
        expected: &'static str,
    },

    /// NPC agents have no economic stake and never receive entries.
    #[error("agent {agent_id} is an NPC and is excluded from the token economy")]
    NpcExcluded {
        /// The NPC agent.
        agent_id: AgentId,
    },

    /// A transfer named the same agent on both sides.
    #[error("cannot transfer tokens from agent {agent_id} to itself")]
    SelfTransfer {
        /// The agent.
        agent_id: AgentId,
    },

    /// A required field was not set on the builder.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Balance arithmetic overflowed.
    #[error("token arithmetic overflow for agent {agent_id}")]
    Overflow {
        /// The agent whose balance overflowed.
        agent_id: AgentId,
    },

    /// A settlement left an agent with a negative balance.
    #[error("agent {agent_id} is insolvent with balance {balance}")]
    Insolvent {
        /// The agent.
        agent_id: AgentId,
        /// The negative balance.
        balance: i64,
    },
}

// ---------------------------------------------------------------------------
// Anomaly type
// ---------------------------------------------------------------------------

/// A conservation violation detected for one agent.
///
/// Produced when an agent's stored balance disagrees with its initial stake
/// plus the sum of its entries, or when consecutive balance snapshots do not
/// chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerAnomaly {
    /// The agent whose books do not balance.
    pub agent_id: AgentId,
    /// Balance implied by the ledger.
    pub expected: i64,
    /// Balance actually observed.
    pub actual: i64,
    /// Human-readable description of the anomaly.
    pub message: String,
}

impl core::fmt::Display for LedgerAnomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.message)
    }
}
