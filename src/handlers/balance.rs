// src/handlers/balance.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{common::error::AppError, config::AppState, services::gateway_service::GatewayBalance};

// GET /api/balance
#[utoipa::path(
    get,
    path = "/api/balance",
    tag = "Saldo",
    responses(
        (status = 200, description = "Saldo do lojista no gateway", body = GatewayBalance),
        (status = 400, description = "Gateway recusou a consulta"),
        (status = 503, description = "Gateway indisponível")
    )
)]
pub async fn get_balance(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let balance = app_state.gateway.balance().await?;
    Ok((StatusCode::OK, Json(balance)))
}
