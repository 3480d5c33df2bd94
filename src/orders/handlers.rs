use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::{delete, get, put},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{PlaceOrderRequest, UpdateStatusRequest},
    repo_types::Order,
    services,
};
use crate::{
    auth::middleware::AuthUser,
    error::AppError,
    extract::{extract_json, extract_path},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders).post(place_order))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/cancel", put(cancel_order))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_all_orders))
        .route("/orders/:id", delete(delete_order))
        .route("/orders/:id/status", put(update_order_status))
}

#[instrument(skip(state))]
pub async fn list_orders(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<Vec<Order>>, AppError> {
    let orders = services::list_orders(state.orders.as_ref(), &identity).await?;
    Ok(Json(orders))
}

#[instrument(skip(state, body))]
pub async fn place_order(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    body: Result<Json<PlaceOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let body = extract_json(body)?;
    let order =
        services::place_order(state.orders.as_ref(), &identity, body.product_id, body.quantity)
            .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

#[instrument(skip(state))]
pub async fn get_order(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Order>, AppError> {
    let id = extract_path(id)?;
    let order = services::get_order(state.orders.as_ref(), &identity, id).await?;
    Ok(Json(order))
}

#[instrument(skip(state))]
pub async fn cancel_order(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Order>, AppError> {
    let id = extract_path(id)?;
    let order = services::cancel_order(state.orders.as_ref(), &identity, id).await?;
    Ok(Json(order))
}

#[instrument(skip(state))]
pub async fn list_all_orders(State(state): State<AppState>) -> Result<Json<Vec<Order>>, AppError> {
    let orders = services::list_all_orders(state.orders.as_ref()).await?;
    Ok(Json(orders))
}

#[instrument(skip(state, body))]
pub async fn update_order_status(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<Order>, AppError> {
    let id = extract_path(id)?;
    let body = extract_json(body)?;
    let order = services::update_order_status(state.orders.as_ref(), id, &body.status).await?;
    Ok(Json(order))
}

#[instrument(skip(state))]
pub async fn delete_order(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let id = extract_path(id)?;
    services::delete_order(state.orders.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
