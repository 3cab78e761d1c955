use axum::extract::Path;
use axum::routing::post;
use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::{Actor, ClassRecap, PresenceRecord, PresenceRequest, StudentRecap};
use crate::services::{PresenceReconciler, RecapAggregator};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SetPresenceBody {
    pub actor: Actor,
    pub request: PresenceRequest,
}

#[derive(Debug, Serialize)]
pub struct SetPresenceResponse {
    pub records: Vec<PresenceRecord>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/classes/{id}/presence", post(set_presence))
        .route("/classes/{id}/recap", get(class_recap))
        .route("/students/{id}/recap", get(student_recap))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn set_presence(
    State(state): State<AppState>,
    Path(class_id): Path<String>,
    Json(body): Json<SetPresenceBody>,
) -> Result<Json<SetPresenceResponse>, AppError> {
    let reconciler = PresenceReconciler::new(state.db.clone(), state.clock.clone());
    let records = reconciler
        .set_presence(&class_id, &body.actor, body.request)
        .await?;
    Ok(Json(SetPresenceResponse { records }))
}

async fn student_recap(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> Result<Json<StudentRecap>, AppError> {
    let aggregator = RecapAggregator::new(state.db.clone());
    let recap = aggregator.get_student_recap(&student_id).await?;
    Ok(Json(recap))
}

async fn class_recap(
    State(state): State<AppState>,
    Path(class_id): Path<String>,
) -> Result<Json<ClassRecap>, AppError> {
    let aggregator = RecapAggregator::new(state.db.clone());
    let recap = aggregator.get_class_recap(&class_id).await?;
    Ok(Json(recap))
}
