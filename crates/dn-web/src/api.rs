//! JSON endpoints

use axum::{
    Json, Router,
    extract::State,
    routing::get,
};
use serde::{Deserialize, Serialize};

use dn_core::{DateKey, StatusReport, date::parse_many, format_remaining, remaining_secs};

use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/status", get(get_status))
        .route("/api/unavailable", get(list_unavailable).put(replace_unavailable))
}

/// Status plus the countdown snapshot at request time
#[derive(Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub report: StatusReport,
    pub countdown_target: Option<DateKey>,
    pub countdown: Option<String>,
}

/// GET /api/status - Today's availability
async fn get_status(State(state): State<AppState>) -> Result<Json<StatusResponse>, AppError> {
    let report = state.status().await?;
    let countdown_target = report.status.countdown_target();
    let countdown = countdown_target.and_then(|target| {
        let remaining = remaining_secs(&**state.clock(), target);
        (remaining > 0).then(|| format_remaining(remaining.unsigned_abs()))
    });

    Ok(Json(StatusResponse {
        report,
        countdown_target,
        countdown,
    }))
}

#[derive(Serialize)]
pub struct DatesResponse {
    pub dates: Vec<DateKey>,
}

/// GET /api/unavailable - List stored dates
async fn list_unavailable(State(state): State<AppState>) -> Result<Json<DatesResponse>, AppError> {
    let dates = state.with_store(|store| store.list_unavailable()).await??;
    Ok(Json(DatesResponse { dates }))
}

/// Request body for replacing the stored dates
#[derive(Deserialize)]
pub struct ReplaceRequest {
    pub dates: Vec<String>,
}

#[derive(Serialize)]
pub struct ReplaceResponse {
    pub accepted: Vec<DateKey>,
    pub rejected: Vec<String>,
}

/// PUT /api/unavailable - Replace the stored dates
async fn replace_unavailable(
    State(state): State<AppState>,
    Json(req): Json<ReplaceRequest>,
) -> Result<Json<ReplaceResponse>, AppError> {
    let (mut accepted, rejected) = parse_many(&req.dates);
    accepted.sort_unstable();
    accepted.dedup();

    let dates = accepted.clone();
    state
        .with_store(move |store| store.replace_all(&dates))
        .await??;
    tracing::info!(count = accepted.len(), rejected = rejected.len(), "dates replaced via API");

    Ok(Json(ReplaceResponse { accepted, rejected }))
}
