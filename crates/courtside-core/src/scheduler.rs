//! Timer-driven tournament trigger.
//!
//! Each tick takes at most one step: advance the running tournament, or
//! create a new one when it is due. Ticks may overlap with an external
//! cron hitting the same entry point; the tournament state machine turns
//! duplicates into no-ops.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::league::League;

impl League {
    /// Run one scheduler step and describe what it did.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError`] if tournament lookup, creation or advancement
    /// fails outright.
    pub async fn scheduler_tick(&self) -> Result<Vec<String>, CoreError> {
        self.scheduler_tick_at(Utc::now()).await
    }

    /// [`Self::scheduler_tick`] evaluated at `now`.
    ///
    /// # Errors
    ///
    /// See [`Self::scheduler_tick`].
    pub async fn scheduler_tick_at(&self, now: DateTime<Utc>) -> Result<Vec<String>, CoreError> {
        if let Some(active) = self.store().active_tournament().await? {
            let outcome = self.advance_tournament_at(active.id, now).await?;
            return Ok(vec![format!("{}: {outcome}", active.name)]);
        }

        if self.should_create_tournament_at(now).await? {
            let created = self.create_auto_tournament_at(now).await?;
            let enrolled = self.store().list_participants(created.id).await?.len();
            return Ok(vec![format!(
                "created {} with {enrolled} participants, registration closes {}",
                created.name, created.registration_deadline
            )]);
        }

        Ok(vec!["idle".to_owned()])
    }
}

/// Tick `league` every `interval` until the task is dropped. Errors are
/// logged and the loop carries on.
pub async fn run_scheduler(league: Arc<League>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(interval_secs = interval.as_secs(), "scheduler started");

    loop {
        ticker.tick().await;
        match league.scheduler_tick().await {
            Ok(actions) => {
                for action in &actions {
                    if action == "idle" {
                        debug!("scheduler idle");
                    } else {
                        info!(action = %action, "scheduler tick");
                    }
                }
            }
            Err(e) => warn!(error = %e, "scheduler tick failed"),
        }
    }
}
