//! Integration tests for the league API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server, over an in-memory store and the deterministic
//! judge.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use courtside_core::{CourtsideConfig, League};
use courtside_db::LeagueStore;
use courtside_judge::WorldJudge;
use courtside_server::{AppState, build_router};
use serde_json::Value;
use tower::ServiceExt;

fn make_state(config: CourtsideConfig) -> AppState {
    let judge = WorldJudge::fallback_only().unwrap().with_seed(9);
    let league = League::new(LeagueStore::memory(), judge, config).with_seed(9);
    AppState::new(Arc::new(league))
}

fn small_config() -> CourtsideConfig {
    let mut config = CourtsideConfig::default();
    config.season.npc_floor = 4;
    config.season.total_games = 10;
    config
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

async fn register(router: &Router, nickname: &str) -> Value {
    let (status, json) = send(
        router,
        post_json(
            "/api/agents",
            &serde_json::json!({
                "nickname": nickname,
                "position": "PG",
                "cognitive_score": 70,
                "luck_value": 40,
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_index_returns_html() {
    let router = build_router(make_state(small_config()));
    let response = router.oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.contains("text/html"));
}

#[tokio::test]
async fn test_register_and_fetch_agent() {
    let router = build_router(make_state(small_config()));
    let agent = register(&router, "Ace").await;
    assert_eq!(agent["nickname"], "Ace");
    assert_eq!(agent["position"], "PG");
    assert_eq!(agent["token_balance"], 1000);
    assert!(agent["team"].is_string());

    let id = agent["id"].as_str().unwrap();
    let (status, fetched) = send(&router, get(&format!("/api/agents/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], agent["id"]);

    let (status, list) = send(&router, get("/api/agents?npc=false")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["count"], 1);
}

#[tokio::test]
async fn test_register_rejects_empty_nickname() {
    let router = build_router(make_state(small_config()));
    let (status, json) = send(
        &router,
        post_json(
            "/api/agents",
            &serde_json::json!({
                "nickname": "   ",
                "position": "C",
                "cognitive_score": 50,
                "luck_value": 50,
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
}

#[tokio::test]
async fn test_unknown_and_malformed_ids() {
    let router = build_router(make_state(small_config()));

    let (status, _) = send(
        &router,
        get("/api/agents/00000000-0000-0000-0000-000000000000"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&router, get("/api/agents/not-a-uuid")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &router,
        Request::post("/api/tournaments/00000000-0000-0000-0000-000000000000/advance")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_simulate_season_and_read_standings() {
    let router = build_router(make_state(small_config()));
    register(&router, "Ace").await;

    let (status, summary) = send(
        &router,
        post_json("/api/seasons/simulate", &serde_json::json!({ "count": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["season_num"], 1);
    assert_eq!(summary["games_simulated"], 3);
    assert_eq!(summary["status"], "active");

    // No body falls back to the configured batch size.
    let (status, summary) = send(
        &router,
        Request::post("/api/seasons/simulate")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["games_simulated"], 5);
    assert_eq!(summary["games_played"], 8);

    let id = summary["season_id"].as_str().unwrap();
    let (status, season) = send(&router, get(&format!("/api/seasons/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(season["season"]["games_played"], 8);
    assert_eq!(season["standings"].as_array().unwrap().len(), 5);

    let (status, games) = send(&router, get(&format!("/api/seasons/{id}/games"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(games["count"], 8);
}

#[tokio::test]
async fn test_reactions_on_a_game() {
    let router = build_router(make_state(small_config()));
    let ace = register(&router, "Ace").await;
    let blaze = register(&router, "Blaze").await;

    let (_, summary) = send(
        &router,
        post_json("/api/seasons/simulate", &serde_json::json!({ "count": 1 })),
    )
    .await;
    let season_id = summary["season_id"].as_str().unwrap();
    let (_, games) = send(&router, get(&format!("/api/seasons/{season_id}/games"))).await;
    let game_id = games["games"][0]["id"].as_str().unwrap();
    let uri = format!("/api/games/{game_id}/reactions");

    let (status, exchange) = send(
        &router,
        post_json(
            &uri,
            &serde_json::json!({
                "from_agent_id": ace["id"],
                "to_agent_id": blaze["id"],
                "kind": "provoke",
                "message": "Bring your A game next time.",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(exchange["reaction"]["kind"], "provoke");
    assert_eq!(exchange["reaction"]["source"], "user");
    assert_eq!(exchange["reply"]["from_agent_id"], blaze["id"]);
    assert_eq!(exchange["reply"]["kind"], "comment");

    let (status, body) = send(
        &router,
        post_json(
            &uri,
            &serde_json::json!({
                "from_agent_id": ace["id"],
                "to_agent_id": ace["id"],
                "kind": "like",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);

    let (status, listed) = send(&router, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["count"], 2);

    let (status, _) = send(
        &router,
        get("/api/games/00000000-0000-0000-0000-000000000000/reactions"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reflection_and_transactions() {
    let router = build_router(make_state(small_config()));
    let agent = register(&router, "Ace").await;
    let id = agent["id"].as_str().unwrap();

    let (status, reflection) = send(
        &router,
        post_json(
            &format!("/api/agents/{id}/reflect"),
            &serde_json::json!({
                "content": "I keep missing open threes, more shooting drills.",
                "focus": "shooting",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reflection["agent_id"], agent["id"]);
    assert!(reflection["primary_amount"].as_u64().unwrap() > 0);

    let (status, ledger) = send(&router, get(&format!("/api/agents/{id}/transactions"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ledger["balance"], 1000);
    assert_eq!(ledger["count"], 0);

    let (status, activity) = send(&router, get(&format!("/api/agents/{id}/activity"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(activity.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_cron_requires_secret_when_configured() {
    let mut config = small_config();
    config.server.cron_secret = Some("hunter2".to_owned());
    let router = build_router(make_state(config));

    let (status, _) = send(
        &router,
        Request::post("/api/cron/tournament")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &router,
        Request::post("/api/cron/tournament")
            .header("authorization", "Bearer wrong")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, json) = send(
        &router,
        Request::post("/api/cron/tournament")
            .header("authorization", "Bearer hunter2")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["actions"][0].as_str().unwrap().starts_with("created"));
}

#[tokio::test]
async fn test_cron_creates_and_tournament_is_readable() {
    let router = build_router(make_state(small_config()));
    register(&router, "Ace").await;

    let (status, _) = send(
        &router,
        Request::post("/api/cron/tournament")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = send(
        &router,
        Request::post("/api/cron/tournament")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert!(json["actions"][0].as_str().unwrap().contains("waiting"));
}
