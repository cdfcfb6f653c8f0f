// src/handlers/checkout.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::checkout::{AddressInfo, CustomerInfo, TrackingParameters},
    services::checkout_service::PixGenerationInput,
};

// Mesmo contrato de campos que o frontend do funil sempre mandou:
// dados do cliente achatados em camelCase, UTMs em snake_case.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePixPayload {
    #[serde(default)]
    #[schema(example = "Maria da Silva")]
    pub customer_name: String,

    // Presença é checada pelo orquestrador; aqui só o formato.
    #[validate(email(message = "invalid_email"))]
    #[schema(example = "maria@email.com")]
    pub customer_email: Option<String>,

    #[serde(default)]
    #[schema(example = "111.444.777-35")]
    pub customer_document: String,

    #[schema(example = "(11) 98888-7777")]
    pub customer_phone: Option<String>,

    #[schema(example = "01310-100")]
    pub zip_code: Option<String>,
    pub street: Option<String>,
    pub number: Option<String>,
    pub complement: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    #[schema(example = "SP")]
    pub state: Option<String>,

    #[serde(flatten)]
    pub tracking: TrackingParameters,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePixResponse {
    pub success: bool,
    pub pix_code: Option<String>,
    pub pix_qr_code: Option<String>,
    pub pix_image: Option<String>,
    pub transaction_id: String,
    pub status: String,
    pub order_id: String,
}

// POST /api/sessions/{id}/checkout/pix
#[utoipa::path(
    post,
    path = "/api/sessions/{id}/checkout/pix",
    tag = "Checkout",
    params(("id" = Uuid, Path, description = "ID da sessão")),
    request_body = GeneratePixPayload,
    responses(
        (status = 200, description = "Cobrança PIX criada", body = GeneratePixResponse),
        (status = 400, description = "Dados inválidos ou gateway recusou"),
        (status = 404, description = "Sessão não encontrada"),
        (status = 409, description = "Geração já em andamento"),
        (status = 503, description = "Gateway indisponível")
    )
)]
pub async fn generate_pix(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<GeneratePixPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let session = app_state.sessions.get(id).ok_or(AppError::SessionNotFound)?;
    // try_lock em vez de lock: um clique duplo no "Gerar QR Code" não
    // pode virar duas cobranças.
    let mut session = session.try_lock().map_err(|_| AppError::OperationInFlight)?;

    let input = PixGenerationInput {
        customer: CustomerInfo {
            name: payload.customer_name,
            email: payload.customer_email.unwrap_or_default(),
            cpf: payload.customer_document,
            phone: payload.customer_phone,
        },
        address: AddressInfo {
            zip_code: payload.zip_code,
            street: payload.street,
            number: payload.number,
            complement: payload.complement,
            neighborhood: payload.neighborhood,
            city: payload.city,
            state: payload.state,
        },
        tracking: payload.tracking,
    };

    let charge = app_state
        .checkout_service
        .generate_pix(&mut session, input)
        .await?;

    Ok((
        StatusCode::OK,
        Json(GeneratePixResponse {
            success: true,
            pix_code: charge.pix_code,
            pix_qr_code: charge.pix_qr_code,
            pix_image: charge.pix_image,
            transaction_id: charge.transaction_id,
            status: charge.status,
            order_id: session.order_id.to_string(),
        }),
    ))
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckStatusResponse {
    pub status: String,
    pub is_paid: bool,
    pub paid_at: Option<String>,
    pub payment_method: String,
    pub message: Option<String>,
}

// POST /api/sessions/{id}/checkout/status
#[utoipa::path(
    post,
    path = "/api/sessions/{id}/checkout/status",
    tag = "Checkout",
    params(("id" = Uuid, Path, description = "ID da sessão")),
    responses(
        (status = 200, description = "Status consultado", body = CheckStatusResponse),
        (status = 404, description = "Sessão sem cobrança ativa"),
        (status = 409, description = "Verificação já em andamento"),
        (status = 502, description = "Não foi possível verificar o pagamento")
    )
)]
pub async fn check_status(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = app_state.sessions.get(id).ok_or(AppError::SessionNotFound)?;
    // No máximo uma verificação em voo por transação; a segunda chamada
    // concorrente é rejeitada, não enfileirada.
    let mut session = session.try_lock().map_err(|_| AppError::OperationInFlight)?;

    let status = app_state
        .checkout_service
        .check_payment(&mut session)
        .await?;

    let message = if status.is_paid {
        None
    } else {
        Some("Pagamento ainda não identificado. Tente novamente em instantes.".to_string())
    };

    Ok((
        StatusCode::OK,
        Json(CheckStatusResponse {
            status: status.status,
            is_paid: status.is_paid,
            paid_at: status.paid_at,
            payment_method: "pix".to_string(),
            message,
        }),
    ))
}
