//! HTTP surface of the bot server
//!
//! | Route                  | Effect                                               |
//! |------------------------|------------------------------------------------------|
//! | `GET /`                | greeting                                             |
//! | `POST /challenge`      | triage an inbound challenge and answer it            |
//! | `GET /gameStart/{id}`  | admit the game and start its session task            |
//! | `POST /resign/{id}`    | resign a game                                        |
//! | `POST /analyze`        | rating series for a finished transcript              |

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use mimicbot::bot::{handle_challenge, spawn_session, AdmissionController, AdmissionError, Challenge, SessionContext, Verdict};
use mimicbot::core::ChallengePolicy;
use mimicbot::engine::{analyze_transcript, PolicyError, RatingSeries};
use mimicbot::game::Variant;
use mimicbot::networking::ChallengeEvent;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<SessionContext>,
    pub admission: Arc<AdmissionController>,
    pub challenge_policy: Arc<ChallengePolicy>,
    /// Wall-clock ceiling per session task
    pub session_time_limit: Duration,
}

#[derive(Serialize)]
pub struct InfoResponse {
    pub info: String,
}

#[derive(Serialize)]
pub struct ChallengeResponse {
    pub info: String,
    pub verdict: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    /// Space-separated UCI moves
    pub moves: String,
    #[serde(default)]
    pub variant: Option<String>,
    #[serde(default)]
    pub initial_fen: Option<String>,
}

/// Handler failures, rendered as `{"error": ...}`
pub enum ApiError {
    Admission(AdmissionError),
    BadRequest(String),
    Upstream(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Admission(e @ AdmissionError::CapacityExceeded { .. }) => {
                (StatusCode::TOO_MANY_REQUESTS, e.to_string())
            }
            ApiError::Admission(e @ AdmissionError::AlreadyActive { .. }) => (StatusCode::CONFLICT, e.to_string()),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Upstream(message) => (StatusCode::BAD_GATEWAY, message),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(say_hello))
        .route("/challenge", post(challenge))
        .route("/gameStart/{game_id}", get(game_start))
        .route("/resign/{game_id}", post(resign))
        .route("/analyze", post(analyze))
        .with_state(state)
}

async fn say_hello() -> &'static str {
    "hello from mimicbot server"
}

async fn challenge(
    State(state): State<AppState>,
    Json(event): Json<ChallengeEvent>,
) -> Result<Json<ChallengeResponse>, ApiError> {
    let challenge = Challenge::from_info(&event.challenge, &state.ctx.bot_id);
    let verdict = handle_challenge(
        state.ctx.platform.as_ref(),
        &challenge,
        &state.challenge_policy,
        state.admission.active_count(),
    )
    .await
    .map_err(|e| ApiError::Upstream(e.to_string()))?;

    let (verdict, reason) = match verdict {
        Verdict::Accept => ("accept", None),
        Verdict::Decline(reason) => ("decline", Some(reason.key())),
        Verdict::Ignore => ("ignore", None),
    };
    Ok(Json(ChallengeResponse {
        info: "received challenge".to_string(),
        verdict,
        reason,
    }))
}

async fn game_start(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<InfoResponse>, ApiError> {
    let slot = state.admission.admit(&game_id).map_err(|e| {
        warn!("[ADMISSION] rejected {}: {}", game_id, e);
        ApiError::Admission(e)
    })?;

    spawn_session(Arc::clone(&state.ctx), slot, state.session_time_limit);
    info!("[SESSION] dispatched {}", game_id);

    Ok(Json(InfoResponse {
        info: "received gameStart".to_string(),
    }))
}

async fn resign(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<InfoResponse>, ApiError> {
    state
        .ctx
        .platform
        .resign(&game_id)
        .await
        .map_err(|e| ApiError::Upstream(e.to_string()))?;
    Ok(Json(InfoResponse {
        info: format!("resigned {game_id}"),
    }))
}

async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<RatingSeries>, ApiError> {
    let variant = Variant::from_key(request.variant.as_deref().unwrap_or("standard"))
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let moves: Vec<String> = request.moves.split_whitespace().map(str::to_string).collect();

    let series = analyze_transcript(
        state.ctx.selector.oracle().as_ref(),
        variant,
        request.initial_fen.as_deref(),
        &moves,
    )
    .await
    .map_err(|e| match e {
        PolicyError::Board(e) => ApiError::BadRequest(e.to_string()),
        other => ApiError::Upstream(other.to_string()),
    })?;
    Ok(Json(series))
}
