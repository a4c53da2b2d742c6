//! Axum router construction for the league API.
//!
//! Assembles all routes into a single [`Router`] with CORS and request
//! tracing enabled.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete router. See [`crate::handlers`] for the endpoint
/// table.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        // Seasons
        .route("/api/seasons/simulate", post(handlers::simulate_season))
        .route("/api/seasons/{id}", get(handlers::get_season))
        .route("/api/seasons/{id}/games", get(handlers::list_season_games))
        .route(
            "/api/games/{id}/interactions",
            get(handlers::list_game_interactions),
        )
        .route(
            "/api/games/{id}/reactions",
            get(handlers::list_reactions).post(handlers::react),
        )
        // Tournaments
        .route("/api/cron/tournament", post(handlers::cron_tournament))
        .route("/api/tournaments/{id}", get(handlers::get_tournament))
        .route(
            "/api/tournaments/{id}/advance",
            post(handlers::advance_tournament),
        )
        // Agents
        .route(
            "/api/agents",
            get(handlers::list_agents).post(handlers::register_agent),
        )
        .route("/api/agents/{id}", get(handlers::get_agent))
        .route("/api/agents/{id}/reflect", post(handlers::reflect))
        .route(
            "/api/agents/{id}/deactivate",
            post(handlers::deactivate_agent),
        )
        .route(
            "/api/agents/{id}/transactions",
            get(handlers::list_transactions),
        )
        .route("/api/agents/{id}/activity", get(handlers::list_activity))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
