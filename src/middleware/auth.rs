use crate::{error::AppError, models::user::Role, services::token_service::TokenError, AppState};
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

/// Identity attached to a request by [`require_auth`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub role: Role,
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let auth_header = headers
        .get("authorization")
        .ok_or_else(|| AppError::Unauthorized("Authorization header is required".to_string()))?
        .to_str()
        .map_err(|_| {
            AppError::Unauthorized("Authorization header must be 'Bearer <token>'".to_string())
        })?;

    match auth_header.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AppError::Unauthorized(
            "Authorization header must be 'Bearer <token>'".to_string(),
        )),
    }
}

/// Rejects the request with 401 unless it carries a valid access token.
pub async fn require_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(&headers)?;

    let claims = state
        .token_service
        .verify_access_token(token)
        .map_err(|e| match e {
            TokenError::Expired => AppError::Unauthorized("Access token has expired".to_string()),
            _ => AppError::Unauthorized("Invalid access token".to_string()),
        })?;

    request.extensions_mut().insert(AuthUser {
        id: claims.sub,
        role: claims.role,
    });

    Ok(next.run(request).await)
}
