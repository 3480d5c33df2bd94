use serde::Deserialize;

/// Body for `POST /orders`. Owner and status are never read from here.
/// Missing ids and quantities default to zero and fail order validation.
#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    #[serde(default, alias = "productId")]
    pub product_id: i64,
    #[serde(default)]
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}
