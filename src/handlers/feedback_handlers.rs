use crate::{
    error::{AppError, Result},
    handlers::note_handlers::parse_id,
    models::feedback::{Feedback, FeedbackForm},
    AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use axum_extra::extract::WithRejection;
use serde_json::json;

pub async fn create_feedback(
    State(state): State<AppState>,
    WithRejection(Json(form), _): WithRejection<Json<FeedbackForm>, AppError>,
) -> Result<impl IntoResponse> {
    let feedback = state.feedback_service.create(form).await?;
    Ok((StatusCode::CREATED, Json(feedback)))
}

pub async fn list_feedback(State(state): State<AppState>) -> Result<Json<Vec<Feedback>>> {
    Ok(Json(state.feedback_service.list().await?))
}

pub async fn get_feedback(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Feedback>> {
    Ok(Json(state.feedback_service.get(parse_id(&id)?).await?))
}

pub async fn update_feedback(
    State(state): State<AppState>,
    Path(id): Path<String>,
    WithRejection(Json(form), _): WithRejection<Json<FeedbackForm>, AppError>,
) -> Result<Json<Feedback>> {
    Ok(Json(
        state.feedback_service.update(parse_id(&id)?, form).await?,
    ))
}

pub async fn delete_feedback(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    state.feedback_service.delete(parse_id(&id)?).await?;
    Ok(Json(json!({ "message": "Feedback deleted successfully" })))
}

pub async fn feedback_count(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let count = state.feedback_service.count().await?;
    Ok(Json(json!({ "count": count })))
}
