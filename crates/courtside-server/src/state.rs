//! Shared application state for the league API.

use std::sync::Arc;

use courtside_core::League;

/// State shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The league engine.
    pub league: Arc<League>,
    /// Bearer token required by the cron trigger; open when `None`.
    pub cron_secret: Option<String>,
}

impl AppState {
    /// Wrap an engine, taking the cron secret from its configuration.
    pub fn new(league: Arc<League>) -> Self {
        let cron_secret = league
            .config()
            .server
            .cron_secret
            .clone()
            .filter(|s| !s.is_empty());
        Self {
            league,
            cron_secret,
        }
    }
}
