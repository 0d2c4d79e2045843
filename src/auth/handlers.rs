use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, MessageResponse, ProfileResponse, RegisterRequest},
        jwt::{AuthUser, JwtKeys},
        repo_types::User,
        services,
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/test", get(test))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/profile", get(profile))
}

async fn test() -> &'static str {
    "Auth endpoint is up"
}

#[instrument(skip(state, payload))]
async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    payload.username = payload.username.trim().to_string();
    payload.email = payload.email.trim().to_string();

    services::register(&state, &payload).await?;
    Ok(Json(MessageResponse {
        message: "registration successful".into(),
    }))
}

#[instrument(skip(state, payload))]
async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    payload.username = payload.username.trim().to_string();

    let user = services::authenticate(&state, &payload.username, &payload.password).await?;

    let keys = JwtKeys::from_ref(&state);
    let (token, expiration) = keys.sign(&user)?;

    Ok(Json(LoginResponse {
        user: user.into(),
        token,
        token_expiration: expiration,
    }))
}

#[instrument(skip(state, claims))]
async fn profile(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or(ApiError::NotFound("user not found"))?;

    Ok(Json(ProfileResponse { user: user.into() }))
}
