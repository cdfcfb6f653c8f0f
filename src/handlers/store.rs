// src/handlers/store.rs

use axum::{http::StatusCode, response::IntoResponse, Json};

use crate::models::store::{catalog, Product};

// GET /api/products
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Loja",
    responses(
        (status = 200, description = "Catálogo da promoção", body = Vec<Product>)
    )
)]
pub async fn get_products() -> impl IntoResponse {
    (StatusCode::OK, Json(catalog()))
}
