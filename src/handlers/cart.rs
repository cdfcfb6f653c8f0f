// src/handlers/cart.rs

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    models::{
        cart::{CartLine, CartTotals},
        checkout::{CheckoutPhase, CheckoutSession},
        store::find_product,
    },
};

async fn fetch_session(
    app_state: &AppState,
    id: Uuid,
) -> Result<Arc<Mutex<CheckoutSession>>, AppError> {
    app_state.sessions.get(id).ok_or(AppError::SessionNotFound)
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub totals: CartTotals,
    pub phase: CheckoutPhase,
}

fn cart_view(session: &CheckoutSession) -> CartView {
    CartView {
        lines: session.cart.lines.clone(),
        totals: session.cart.totals(),
        phase: session.phase,
    }
}

// POST /api/sessions
#[utoipa::path(
    post,
    path = "/api/sessions",
    tag = "Carrinho",
    responses(
        (status = 201, description = "Sessão do funil criada")
    )
)]
pub async fn create_session(State(app_state): State<AppState>) -> impl IntoResponse {
    let id = app_state.sessions.create();
    (StatusCode::CREATED, Json(json!({ "sessionId": id })))
}

// GET /api/sessions/{id}/cart
#[utoipa::path(
    get,
    path = "/api/sessions/{id}/cart",
    tag = "Carrinho",
    params(("id" = Uuid, Path, description = "ID da sessão")),
    responses(
        (status = 200, description = "Linhas e totais do carrinho", body = CartView),
        (status = 404, description = "Sessão não encontrada")
    )
)]
pub async fn get_cart(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = fetch_session(&app_state, id).await?;
    let session = session.lock().await;
    Ok((StatusCode::OK, Json(cart_view(&session))))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddItemPayload {
    #[schema(example = 4)]
    pub product_id: u32,
}

// POST /api/sessions/{id}/cart/items
#[utoipa::path(
    post,
    path = "/api/sessions/{id}/cart/items",
    tag = "Carrinho",
    params(("id" = Uuid, Path, description = "ID da sessão")),
    request_body = AddItemPayload,
    responses(
        (status = 200, description = "Item adicionado", body = CartView),
        (status = 404, description = "Sessão ou produto não encontrado")
    )
)]
pub async fn add_item(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddItemPayload>,
) -> Result<impl IntoResponse, AppError> {
    let product = find_product(payload.product_id).ok_or(AppError::ProductNotFound)?;

    let session = fetch_session(&app_state, id).await?;
    let mut session = session.lock().await;
    session.cart.add_item(product);

    Ok((StatusCode::OK, Json(cart_view(&session))))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuantityPayload {
    // 0 remove a linha do carrinho.
    #[schema(example = 2)]
    pub quantity: u32,
}

// PUT /api/sessions/{id}/cart/items/{productId}
#[utoipa::path(
    put,
    path = "/api/sessions/{id}/cart/items/{product_id}",
    tag = "Carrinho",
    params(
        ("id" = Uuid, Path, description = "ID da sessão"),
        ("product_id" = u32, Path, description = "ID do produto")
    ),
    request_body = UpdateQuantityPayload,
    responses(
        (status = 200, description = "Quantidade atualizada", body = CartView),
        (status = 404, description = "Sessão não encontrada")
    )
)]
pub async fn update_quantity(
    State(app_state): State<AppState>,
    Path((id, product_id)): Path<(Uuid, u32)>,
    Json(payload): Json<UpdateQuantityPayload>,
) -> Result<impl IntoResponse, AppError> {
    let session = fetch_session(&app_state, id).await?;
    let mut session = session.lock().await;
    session.cart.update_quantity(product_id, payload.quantity);

    Ok((StatusCode::OK, Json(cart_view(&session))))
}

// DELETE /api/sessions/{id}/cart/items/{productId}
#[utoipa::path(
    delete,
    path = "/api/sessions/{id}/cart/items/{product_id}",
    tag = "Carrinho",
    params(
        ("id" = Uuid, Path, description = "ID da sessão"),
        ("product_id" = u32, Path, description = "ID do produto")
    ),
    responses(
        (status = 200, description = "Linha removida", body = CartView),
        (status = 404, description = "Sessão não encontrada")
    )
)]
pub async fn remove_item(
    State(app_state): State<AppState>,
    Path((id, product_id)): Path<(Uuid, u32)>,
) -> Result<impl IntoResponse, AppError> {
    let session = fetch_session(&app_state, id).await?;
    let mut session = session.lock().await;
    session.cart.remove_item(product_id);

    Ok((StatusCode::OK, Json(cart_view(&session))))
}
