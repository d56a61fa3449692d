use crate::{
    AppState,
    dto::{LoginRequest, RegisterRequest, TokenResponse},
    errors::ApiError,
};
use axum::{Json, extract::State, http::StatusCode};
use tracing::info;
use validator::Validate;

/// POST /api/v1/users/register
/// Body: { "email": "...", "password": "..." }
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::ValidationError(e.to_string()))?;

    let session = state.db.session().await?;

    // bcrypt blocks; run it on the blocking pool.
    let users = session.users().clone();
    let RegisterRequest { email, password } = payload;
    let user = tokio::task::spawn_blocking(move || users.register(&email, &password))
        .await
        .map_err(|e| ApiError::InternalError(format!("Registration task failed: {}", e)))??;

    let token = state
        .tokens
        .issue(&user.email, user.id, state.tokens.default_ttl())?;

    info!(user_id = user.id, "New user registered: {}", user.email);

    Ok((StatusCode::CREATED, Json(TokenResponse::bearer(token))))
}

/// POST /api/v1/users/login
/// Body: { "email": "...", "password": "..." }
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let session = state.db.session().await?;

    let users = session.users().clone();
    let LoginRequest { email, password } = payload;
    let user = tokio::task::spawn_blocking(move || users.verify(&email, &password))
        .await
        .map_err(|e| ApiError::InternalError(format!("Login task failed: {}", e)))?
        .ok_or(ApiError::UserNotFound)?;

    let token = state
        .tokens
        .issue(&user.email, user.id, state.tokens.default_ttl())?;

    info!(user_id = user.id, "User logged in: {}", user.email);

    Ok(Json(TokenResponse::bearer(token)))
}
