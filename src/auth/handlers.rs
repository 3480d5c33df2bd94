use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{
        AdminUpdateUserRequest, LoginRequest, LoginResponse, MessageResponse, PublicUser,
        RegisterRequest, UpdateProfileRequest,
    },
    middleware::AuthUser,
    services,
};
use crate::{
    error::AppError,
    extract::{extract_json, extract_path},
    state::AppState,
};

/// Routes reachable without a token.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/users/register", post(register))
        .route("/users/login", post(login))
        .route("/users/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/users/me", get(get_me).put(update_me))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/users/:id", put(admin_update_user).delete(admin_delete_user))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PublicUser>), AppError> {
    let payload = extract_json(payload)?;
    let user = services::register(state.users.as_ref(), &payload.email, &payload.password).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let payload = extract_json(payload)?;
    let (token, user) = services::login(
        state.users.as_ref(),
        &state.keys,
        &payload.email,
        &payload.password,
    )
    .await?;
    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer",
        expires_in: state.keys.ttl_seconds(),
        user: user.into(),
    }))
}

/// Tokens are not tracked server-side; the client drops its copy.
pub async fn logout() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Successfully logged out",
    })
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<PublicUser>, AppError> {
    let user = services::get_user(state.users.as_ref(), identity.user_id).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<PublicUser>, AppError> {
    let payload = extract_json(payload)?;
    let user = services::update_profile(
        state.users.as_ref(),
        identity.user_id,
        payload.email,
        payload.password,
    )
    .await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn admin_update_user(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<AdminUpdateUserRequest>, JsonRejection>,
) -> Result<Json<PublicUser>, AppError> {
    let id = extract_path(id)?;
    let payload = extract_json(payload)?;
    let user = services::admin_update_user(
        state.users.as_ref(),
        id,
        payload.email,
        payload.password,
        payload.role,
    )
    .await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn admin_delete_user(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let id = extract_path(id)?;
    services::delete_user(state.users.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
