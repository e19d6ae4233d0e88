use crate::{
    error::{AppError, Result},
    middleware::AuthUser,
    models::user::{Profile, User},
    services::user_service::{SigninRequest, SigninResponse, SignupRequest},
    AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Default, Deserialize)]
pub struct SignupForm {
    pub fullname: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigninForm {
    pub email_or_username: Option<String>,
    pub password: Option<String>,
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Validation(format!("{} is required", field)))
}

pub async fn signup(
    State(state): State<AppState>,
    WithRejection(Json(form), _): WithRejection<Json<SignupForm>, AppError>,
) -> Result<impl IntoResponse> {
    let request = SignupRequest {
        fullname: required(form.fullname, "fullname")?,
        email: required(form.email, "email")?,
        password: required(form.password, "password")?,
    };

    state.user_service.signup(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Signup successful! Please verify your email to complete registration."
        })),
    ))
}

pub async fn signin(
    State(state): State<AppState>,
    WithRejection(Json(form), _): WithRejection<Json<SigninForm>, AppError>,
) -> Result<Json<SigninResponse>> {
    let request = SigninRequest {
        email_or_username: required(form.email_or_username, "emailOrUsername")?,
        password: required(form.password, "password")?,
    };

    Ok(Json(state.user_service.signin(request).await?))
}

pub async fn verify_email(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<serde_json::Value>> {
    state.user_service.verify_email(&token).await?;
    Ok(Json(json!({ "message": "Email successfully verified" })))
}

pub async fn profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Profile>> {
    Ok(Json(state.user_service.get_profile(user.id).await?))
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<User>>> {
    Ok(Json(state.user_service.list_all_users(user.role).await?))
}
