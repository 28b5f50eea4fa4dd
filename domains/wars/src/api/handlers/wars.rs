//! Word war API handlers
//!
//! Thin translation between HTTP and the engine. The product's auth framing
//! sits outside this service, so the acting user travels in the request
//! bodies.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use writeclub_common::{Result, ValidatedJson};

use crate::api::middleware::WarsState;
use crate::domain::entities::{WarStatus, WordWar};
use crate::service::ScoreboardEntry;

/// Word war response DTO
#[derive(Debug, Serialize)]
pub struct WarResponse {
    pub id: Uuid,
    pub event_id: Uuid,
    pub requested_by: Uuid,
    pub duration_minutes: i32,
    pub status: WarStatus,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<WordWar> for WarResponse {
    fn from(w: WordWar) -> Self {
        Self {
            id: w.id,
            event_id: w.event_id,
            requested_by: w.requested_by,
            duration_minutes: w.duration_minutes,
            status: w.status,
            starts_at: w.starts_at,
            ends_at: w.ends_at,
            finished_at: w.finished_at,
            created_at: w.created_at,
            updated_at: w.updated_at,
        }
    }
}

/// Request for creating a war inside an event
#[derive(Debug, Deserialize, Validate)]
pub struct CreateWarRequest {
    pub requested_by: Uuid,
    #[validate(range(min = 1))]
    pub duration_minutes: i32,
}

#[derive(Debug, Serialize)]
pub struct CreateWarResponse {
    pub id: Uuid,
}

/// Request for joining a war with one of the caller's projects
#[derive(Debug, Deserialize, Validate)]
pub struct JoinWarRequest {
    pub user_id: Uuid,
    pub project_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct JoinWarResponse {
    pub joined: bool,
}

/// Request for leaving a war
#[derive(Debug, Deserialize, Validate)]
pub struct LeaveWarRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct LeaveWarResponse {
    pub left: bool,
}

/// Request for starting a war
#[derive(Debug, Deserialize, Validate)]
pub struct StartWarRequest {
    pub requested_by: Uuid,
}

/// Request for reporting sprint progress
#[derive(Debug, Deserialize, Validate)]
pub struct CheckpointRequest {
    pub user_id: Uuid,
    #[validate(range(min = 0))]
    pub words_in_round: i32,
}

#[derive(Debug, Serialize)]
pub struct CheckpointResponse {
    pub recorded: bool,
}

/// Scoreboard response DTO
#[derive(Debug, Serialize)]
pub struct ScoreboardResponse {
    pub war: WarResponse,
    pub entries: Vec<ScoreboardEntry>,
}

/// Create a war inside an event
pub async fn create_war(
    State(state): State<WarsState>,
    Path(event_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<CreateWarRequest>,
) -> Result<(StatusCode, Json<CreateWarResponse>)> {
    let id = state
        .wars
        .create_war(event_id, req.requested_by, req.duration_minutes)
        .await?;
    Ok((StatusCode::CREATED, Json(CreateWarResponse { id })))
}

/// Join a waiting war
pub async fn join_war(
    State(state): State<WarsState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<JoinWarRequest>,
) -> Result<Json<JoinWarResponse>> {
    let joined = state.wars.join_war(id, req.user_id, req.project_id).await?;
    Ok(Json(JoinWarResponse { joined }))
}

/// Leave a waiting war
pub async fn leave_war(
    State(state): State<WarsState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<LeaveWarRequest>,
) -> Result<Json<LeaveWarResponse>> {
    let left = state.wars.leave_war(id, req.user_id).await?;
    Ok(Json(LeaveWarResponse { left }))
}

/// Start a waiting war
pub async fn start_war(
    State(state): State<WarsState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<StartWarRequest>,
) -> Result<StatusCode> {
    state.wars.start_war(id, req.requested_by).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Report a participant's word count
pub async fn checkpoint(
    State(state): State<WarsState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<CheckpointRequest>,
) -> Result<Json<CheckpointResponse>> {
    let recorded = state
        .wars
        .checkpoint(id, req.user_id, req.words_in_round)
        .await?;
    Ok(Json(CheckpointResponse { recorded }))
}

/// Finish a running war
pub async fn finish_war(
    State(state): State<WarsState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.wars.finish_war(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Scoreboard for a war
pub async fn scoreboard(
    State(state): State<WarsState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ScoreboardResponse>> {
    let board = state.wars.scoreboard(id).await?;
    Ok(Json(ScoreboardResponse {
        war: board.war.into(),
        entries: board.entries,
    }))
}
