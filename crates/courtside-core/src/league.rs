//! The league engine handle.
//!
//! [`League`] bundles the store, the judge, configuration and a random
//! source. Operations live in sibling modules as further `impl League`
//! blocks: seasons in [`crate::season`], tournaments in
//! [`crate::tournament`], agents and reflections in [`crate::registry`],
//! and the periodic trigger in [`crate::scheduler`].

use std::sync::{Mutex, PoisonError};

use courtside_db::{LeagueStore, Overdraft};
use courtside_judge::WorldJudge;
use courtside_ledger::{ConservationResult, Ledger, conservation};
use courtside_types::{ActivityKind, ActivityLog, Agent, AgentId, TokenTransaction};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, warn};

use crate::config::CourtsideConfig;
use crate::error::CoreError;

/// Shared engine state. Cheap to wrap in an `Arc` and call concurrently:
/// every transition is guarded by a store-level compare-and-set.
#[derive(Debug)]
pub struct League {
    store: LeagueStore,
    judge: WorldJudge,
    config: CourtsideConfig,
    rng: Mutex<StdRng>,
}

impl League {
    /// Assemble an engine from its collaborators.
    pub fn new(store: LeagueStore, judge: WorldJudge, config: CourtsideConfig) -> Self {
        Self {
            store,
            judge,
            config,
            rng: Mutex::new(StdRng::from_rng(&mut rand::rng())),
        }
    }

    /// Reseed the engine's random source for reproducible runs.
    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    /// The persistence facade.
    pub const fn store(&self) -> &LeagueStore {
        &self.store
    }

    /// The judge.
    pub const fn judge(&self) -> &WorldJudge {
        &self.judge
    }

    /// Active configuration.
    pub const fn config(&self) -> &CourtsideConfig {
        &self.config
    }

    /// Run `f` against the engine RNG. Never hold the result across an
    /// `.await` that needs the RNG again.
    pub(crate) fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut *rng)
    }

    /// Load an agent or fail with [`CoreError::NotFound`].
    pub(crate) async fn require_agent(&self, id: AgentId) -> Result<Agent, CoreError> {
        self.store
            .get_agent(id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("agent {id}")))
    }

    /// Append one timeline line for `agent_id`.
    pub(crate) async fn log_activity(
        &self,
        agent_id: AgentId,
        kind: ActivityKind,
        content: impl Into<String>,
    ) -> Result<(), CoreError> {
        self.store
            .insert_activity(&ActivityLog::new(agent_id, kind, content))
            .await?;
        Ok(())
    }

    /// Drain a journal and commit its entries against the agent's live
    /// balance. Returns the entries as stored, which may differ from the
    /// journal under [`Overdraft::Cap`].
    pub(crate) async fn commit_journal(
        &self,
        agent_id: AgentId,
        ledger: &mut Ledger,
        overdraft: Overdraft,
    ) -> Result<Vec<TokenTransaction>, CoreError> {
        let entries = ledger.drain();
        if entries.is_empty() {
            return Ok(entries);
        }
        Ok(self
            .store
            .commit_postings(agent_id, &entries, overdraft)
            .await?)
    }

    /// Re-check a paid agent's ledger after a settlement. Anomalies are
    /// logged, never raised: the settlement itself already committed.
    pub(crate) async fn audit_agent(&self, agent_id: AgentId) -> Result<(), CoreError> {
        if !self.config.economy.verify_after_settlement {
            return Ok(());
        }
        let Some(agent) = self.store.get_agent(agent_id).await? else {
            return Ok(());
        };
        let history = self.store.list_transactions(agent_id).await?;
        match conservation::verify_conservation(
            agent.id,
            courtside_ledger::initial_stake(agent.is_npc),
            agent.token_balance,
            &history,
        ) {
            ConservationResult::Balanced => {
                debug!(agent_id = %agent.id, "ledger balanced");
            }
            ConservationResult::Anomaly(anomaly) => {
                warn!(
                    agent_id = %agent.id,
                    expected = anomaly.expected,
                    actual = anomaly.actual,
                    "ledger conservation anomaly: {}",
                    anomaly.message
                );
            }
        }
        if let Err(e) = conservation::verify_solvency(&agent) {
            warn!(agent_id = %agent.id, error = %e, "agent insolvent after settlement");
        }
        Ok(())
    }
}
