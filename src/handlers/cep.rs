// src/handlers/cep.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{common::error::AppError, config::AppState, services::cep_service::CepAddress};

// GET /api/cep/{cep}
#[utoipa::path(
    get,
    path = "/api/cep/{cep}",
    tag = "CEP",
    params(("cep" = String, Path, description = "CEP com 8 dígitos, com ou sem hífen")),
    responses(
        (status = 200, description = "Endereço encontrado", body = CepAddress),
        (status = 400, description = "CEP fora do formato"),
        (status = 404, description = "CEP não encontrado"),
        (status = 503, description = "Diretórios de CEP indisponíveis")
    )
)]
pub async fn lookup_cep(
    State(app_state): State<AppState>,
    Path(cep): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let address = app_state.cep_service.lookup(&cep).await?;
    Ok((StatusCode::OK, Json(address)))
}
