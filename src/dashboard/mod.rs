use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::neatqueue::{
    ClientError, LeaderboardQuery, MatchQuery, NeatQueueClient, Provenance, QueueQuery, Sourced,
};

#[derive(Clone)]
pub struct AppState {
    pub client: NeatQueueClient,
    /// Rendered once at startup from the process configuration
    pub status_message: String,
}

/// Response body shared by every data route.
#[derive(Debug, Serialize)]
struct Envelope<T> {
    success: bool,
    data: T,
    timestamp: String,
    source: Provenance,
}

impl<T> From<Sourced<T>> for Envelope<T> {
    fn from(sourced: Sourced<T>) -> Self {
        Envelope {
            success: true,
            data: sourced.records,
            timestamp: Utc::now().to_rfc3339(),
            source: sourced.provenance,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct PageParams {
    limit: Option<usize>,
    offset: Option<usize>,
    season: Option<String>,
}

/// Build the Axum router for the JSON API.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/neatqueue", get(leaderboard_handler))
        .route("/api/neatqueue/queue", get(queue_handler))
        .route("/api/neatqueue/player/:id", get(player_handler))
        .route("/api/neatqueue/stats", get(stats_handler))
        .route("/api/neatqueue/seasons", get(seasons_handler))
        .route("/api/neatqueue/matches", get(matches_handler))
        .route("/api/neatqueue/discover", get(discover_handler))
        .route("/api/neatqueue/config", get(config_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// GET /api/neatqueue?limit=50&offset=0&season=
async fn leaderboard_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> impl IntoResponse {
    info!(?params, "Leaderboard request");
    let result = state
        .client
        .leaderboard(LeaderboardQuery {
            limit: params.limit,
            offset: params.offset.unwrap_or(0),
            season: params.season,
        })
        .await;
    Json(Envelope::from(result))
}

/// GET /api/neatqueue/queue?limit=50
async fn queue_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> impl IntoResponse {
    let result = state
        .client
        .queue(QueueQuery {
            limit: params.limit,
        })
        .await;
    Json(Envelope::from(result))
}

/// GET /api/neatqueue/player/:id?season=
async fn player_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let result = state
        .client
        .player_stats(&id, params.season.as_deref())
        .await;
    match result.records {
        Some(player) => Ok(Json(Envelope::from(Sourced {
            records: player,
            provenance: result.provenance,
        }))),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "success": false,
                "error": format!("Player {} not found", id),
                "timestamp": Utc::now().to_rfc3339(),
                "source": result.provenance,
            })),
        )),
    }
}

/// GET /api/neatqueue/stats?season=
async fn stats_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> impl IntoResponse {
    Json(Envelope::from(
        state.client.guild_stats(params.season.as_deref()).await,
    ))
}

/// GET /api/neatqueue/seasons
async fn seasons_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(Envelope::from(state.client.seasons().await))
}

/// GET /api/neatqueue/matches?limit=20&offset=0
async fn matches_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> impl IntoResponse {
    let result = state
        .client
        .recent_matches(MatchQuery {
            limit: params.limit,
            offset: params.offset.unwrap_or(0),
        })
        .await;
    Json(Envelope::from(result))
}

/// GET /api/neatqueue/discover
async fn discover_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let config = state.client.config_status();
    match state.client.discover_endpoints().await {
        Ok(endpoints) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "config": config,
                "endpoints": endpoints,
                "timestamp": Utc::now().to_rfc3339(),
            })),
        ),
        Err(e @ ClientError::NotConfigured) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "success": false,
                "error": e.to_string(),
                "config": config,
                "message": state.status_message,
            })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "success": false,
                "error": e.to_string(),
                "config": config,
                "timestamp": Utc::now().to_rfc3339(),
            })),
        ),
    }
}

/// GET /api/neatqueue/config
async fn config_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": state.client.config_status(),
        "message": state.status_message,
    }))
}
