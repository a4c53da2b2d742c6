//! REST API endpoint handlers.
//!
//! Every handler goes through the shared [`League`](courtside_core::League);
//! mutations are the engine's idempotent entry points, reads go straight
//! to the store.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `POST` | `/api/seasons/simulate` | Simulate the next batch of games |
//! | `GET` | `/api/seasons/{id}` | Season record with standings |
//! | `GET` | `/api/seasons/{id}/games` | Games played in a season |
//! | `GET` | `/api/games/{id}/interactions` | Dialogue lines of one game |
//! | `GET` | `/api/games/{id}/reactions` | Reactions to one game |
//! | `POST` | `/api/games/{id}/reactions` | React to a game, drawing an answer |
//! | `POST` | `/api/cron/tournament` | Scheduler trigger |
//! | `GET` | `/api/tournaments/{id}` | Tournament with participants and matches |
//! | `POST` | `/api/tournaments/{id}/advance` | One state-machine step |
//! | `GET` | `/api/agents` | List agents |
//! | `POST` | `/api/agents` | Register an agent |
//! | `GET` | `/api/agents/{id}` | Single agent |
//! | `POST` | `/api/agents/{id}/reflect` | Submit a reflection |
//! | `POST` | `/api/agents/{id}/deactivate` | Retire an agent |
//! | `GET` | `/api/agents/{id}/transactions` | Ledger entries |
//! | `GET` | `/api/agents/{id}/activity` | Activity timeline |

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::response::{Html, IntoResponse};
use courtside_core::{NewAgent, NewReaction};
use courtside_types::{AgentId, GameId, SeasonId, Skill, TournamentId};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request structs
// ---------------------------------------------------------------------------

/// Body of `POST /api/seasons/simulate`. Empty bodies use the configured
/// batch size.
#[derive(Debug, Default, serde::Deserialize)]
pub struct SimulateRequest {
    /// Games to simulate.
    pub count: Option<u32>,
}

/// Body of `POST /api/agents/{id}/reflect`.
#[derive(Debug, serde::Deserialize)]
pub struct ReflectRequest {
    /// Free-text reflection.
    pub content: String,
    /// Skill the agent wants to work on.
    #[serde(default)]
    pub focus: Option<Skill>,
}

/// Query parameters for `GET /api/agents`.
#[derive(Debug, serde::Deserialize)]
pub struct AgentsQuery {
    /// Include NPCs (default `true`).
    pub npc: Option<bool>,
}

// ---------------------------------------------------------------------------
// GET / -- status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page with the league's headline numbers.
pub async fn index(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let store = state.league.store();
    let agents = store.list_agents().await?;
    let season = store.active_season().await?;
    let tournament = store.active_tournament().await?;

    let real = agents.iter().filter(|a| !a.is_npc && a.active).count();
    let npcs = agents.iter().filter(|a| a.is_npc && a.active).count();
    let season_line = season.map_or_else(
        || "no active season".to_owned(),
        |s| format!("Season {}: {} / {} games", s.season_num, s.games_played, s.total_games),
    );
    let tournament_line = tournament.map_or_else(
        || "no tournament running".to_owned(),
        |t| format!("{} ({}, round {}/{})", t.name, t.status, t.current_round, t.total_rounds),
    );

    Ok(Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Courtside</title>
    <style>
        body {{ background: #0d1117; color: #c9d1d9; font-family: monospace; padding: 2rem; max-width: 800px; margin: 0 auto; }}
        h1 {{ color: #f0883e; }}
        li {{ padding: 0.3rem 0; }}
    </style>
</head>
<body>
    <h1>Courtside</h1>
    <ul>
        <li>Agents: {real} ({npcs} NPCs)</li>
        <li>{season_line}</li>
        <li>{tournament_line}</li>
    </ul>
</body>
</html>"#
    )))
}

// ---------------------------------------------------------------------------
// Seasons
// ---------------------------------------------------------------------------

/// Simulate the next batch of games in the active season, opening one if
/// needed.
pub async fn simulate_season(
    State(state): State<AppState>,
    body: Option<Json<SimulateRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let count = body
        .and_then(|Json(req)| req.count)
        .unwrap_or(state.league.config().season.batch_size);
    let summary = state.league.simulate_active_season(count).await?;
    Ok(Json(summary))
}

/// Return a season with its standings.
pub async fn get_season(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = SeasonId::from(parse_uuid(&id_str)?);
    let store = state.league.store();
    let season = store
        .get_season(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("season {id}")))?;
    let mut standings = store.list_season_stats(id).await?;
    standings.sort_by(|a, b| b.wins.cmp(&a.wins).then(a.losses.cmp(&b.losses)));

    Ok(Json(serde_json::json!({
        "season": season,
        "standings": standings,
    })))
}

/// List the games of a season.
pub async fn list_season_games(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = SeasonId::from(parse_uuid(&id_str)?);
    let games = state.league.store().list_games(id).await?;
    Ok(Json(serde_json::json!({
        "count": games.len(),
        "games": games,
    })))
}

/// Dialogue lines generated for one game.
pub async fn list_game_interactions(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = GameId::from(parse_uuid(&id_str)?);
    let lines = state.league.store().list_interactions(id).await?;
    Ok(Json(lines))
}

/// Reactions to one game, oldest first.
pub async fn list_reactions(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = GameId::from(parse_uuid(&id_str)?);
    let reactions = state.league.list_reactions(id).await?;
    Ok(Json(serde_json::json!({
        "count": reactions.len(),
        "reactions": reactions,
    })))
}

/// React to a game. Provocations and comments come back with the target's
/// answer.
pub async fn react(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    Json(request): Json<NewReaction>,
) -> Result<impl IntoResponse, ApiError> {
    let id = GameId::from(parse_uuid(&id_str)?);
    let exchange = state.league.react(id, request).await?;
    Ok((axum::http::StatusCode::CREATED, Json(exchange)))
}

// ---------------------------------------------------------------------------
// Tournaments
// ---------------------------------------------------------------------------

/// Scheduler trigger for an external cron. Requires
/// `Authorization: Bearer <secret>` when a secret is configured.
pub async fn cron_tournament(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(secret) = &state.cron_secret {
        let presented = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        if presented != Some(secret.as_str()) {
            return Err(ApiError::Unauthorized);
        }
    }
    let actions = state.league.scheduler_tick().await?;
    Ok(Json(serde_json::json!({ "actions": actions })))
}

/// Return a tournament with its participants and matches.
pub async fn get_tournament(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = TournamentId::from(parse_uuid(&id_str)?);
    let store = state.league.store();
    let tournament = store
        .get_tournament(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("tournament {id}")))?;
    let participants = store.list_participants(id).await?;
    let matches = store.list_matches(id).await?;

    Ok(Json(serde_json::json!({
        "tournament": tournament,
        "participants": participants,
        "matches": matches,
    })))
}

/// Take one lifecycle step. A no-op is a successful response whose
/// `action` is `no_action` or `waiting`.
pub async fn advance_tournament(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = TournamentId::from(parse_uuid(&id_str)?);
    let outcome = state.league.advance_tournament(id).await?;
    if outcome == courtside_core::AdvanceOutcome::NotFound {
        return Err(ApiError::NotFound(format!("tournament {id}")));
    }
    Ok(Json(serde_json::json!({
        "progressed": outcome.is_progress(),
        "detail": outcome.detail(),
        "outcome": outcome,
    })))
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

/// List agents, optionally without NPCs.
pub async fn list_agents(
    State(state): State<AppState>,
    Query(params): Query<AgentsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let include_npcs = params.npc.unwrap_or(true);
    let agents: Vec<_> = state
        .league
        .store()
        .list_agents()
        .await?
        .into_iter()
        .filter(|a| include_npcs || !a.is_npc)
        .collect();
    Ok(Json(serde_json::json!({
        "count": agents.len(),
        "agents": agents,
    })))
}

/// Register a new agent.
pub async fn register_agent(
    State(state): State<AppState>,
    Json(request): Json<NewAgent>,
) -> Result<impl IntoResponse, ApiError> {
    let agent = state.league.register_agent(request).await?;
    Ok((axum::http::StatusCode::CREATED, Json(agent)))
}

/// Return a single agent.
pub async fn get_agent(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = AgentId::from(parse_uuid(&id_str)?);
    let agent = state
        .league
        .store()
        .get_agent(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("agent {id}")))?;
    Ok(Json(agent))
}

/// Apply a reflection to an agent.
pub async fn reflect(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    Json(request): Json<ReflectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = AgentId::from(parse_uuid(&id_str)?);
    let reflection = state
        .league
        .reflect(id, &request.content, request.focus)
        .await?;
    Ok(Json(reflection))
}

/// Take an agent out of future simulations.
pub async fn deactivate_agent(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = AgentId::from(parse_uuid(&id_str)?);
    let agent = state.league.deactivate_agent(id).await?;
    Ok(Json(agent))
}

/// Ledger entries of one agent, oldest first.
pub async fn list_transactions(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = AgentId::from(parse_uuid(&id_str)?);
    let store = state.league.store();
    let agent = store
        .get_agent(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("agent {id}")))?;
    let transactions = store.list_transactions(id).await?;
    Ok(Json(serde_json::json!({
        "agent_id": id,
        "balance": agent.token_balance,
        "count": transactions.len(),
        "transactions": transactions,
    })))
}

/// Activity timeline of one agent.
pub async fn list_activity(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = AgentId::from(parse_uuid(&id_str)?);
    let entries = state.league.store().list_activity(id).await?;
    Ok(Json(entries))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a UUID string, returning an [`ApiError::InvalidUuid`] on failure.
fn parse_uuid(s: &str) -> Result<Uuid, ApiError> {
    s.parse::<Uuid>()
        .map_err(|e| ApiError::InvalidUuid(format!("{s}: {e}")))
}
