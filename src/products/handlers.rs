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
    dto::{CreateProductRequest, UpdateProductRequest},
    repo_types::Product,
    services,
};
use crate::{
    error::AppError,
    extract::{extract_json, extract_path},
    state::AppState,
};

/// Catalog reads, open to any authenticated caller.
pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/:id", get(get_product))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/products", post(create_product))
        .route("/products/:id", put(update_product).delete(delete_product))
}

#[instrument(skip(state))]
pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>, AppError> {
    let products = services::list_products(state.products.as_ref()).await?;
    Ok(Json(products))
}

#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Product>, AppError> {
    let id = extract_path(id)?;
    let product = services::get_product(state.products.as_ref(), id).await?;
    Ok(Json(product))
}

#[instrument(skip(state, body))]
pub async fn create_product(
    State(state): State<AppState>,
    body: Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let body = extract_json(body)?;
    let product = services::create_product(state.products.as_ref(), body.into()).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(skip(state, body))]
pub async fn update_product(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<UpdateProductRequest>, JsonRejection>,
) -> Result<Json<Product>, AppError> {
    let id = extract_path(id)?;
    let body = extract_json(body)?;
    let product = services::update_product(state.products.as_ref(), id, body.into()).await?;
    Ok(Json(product))
}

#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let id = extract_path(id)?;
    services::delete_product(state.products.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
