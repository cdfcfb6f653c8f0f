// src/docs.rs

use utoipa::OpenApi;

use crate::{handlers, models, services};

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Loja ---
        handlers::store::get_products,

        // --- Carrinho ---
        handlers::cart::create_session,
        handlers::cart::get_cart,
        handlers::cart::add_item,
        handlers::cart::update_quantity,
        handlers::cart::remove_item,

        // --- Checkout ---
        handlers::checkout::generate_pix,
        handlers::checkout::check_status,

        // --- CEP ---
        handlers::cep::lookup_cep,

        // --- Saldo ---
        handlers::balance::get_balance,
    ),
    components(schemas(
        models::store::Product,
        models::cart::Cart,
        models::cart::CartLine,
        models::cart::CartTotals,
        models::checkout::CheckoutPhase,
        models::checkout::PixCharge,
        models::checkout::ChargeStatus,
        models::checkout::CustomerInfo,
        models::checkout::AddressInfo,
        models::checkout::TrackingParameters,
        services::cep_service::CepAddress,
        services::gateway_service::GatewayBalance,
        handlers::cart::CartView,
        handlers::cart::AddItemPayload,
        handlers::cart::UpdateQuantityPayload,
        handlers::checkout::GeneratePixPayload,
        handlers::checkout::GeneratePixResponse,
        handlers::checkout::CheckStatusResponse,
    )),
    tags(
        (name = "Loja", description = "Catálogo da promoção de Natal"),
        (name = "Carrinho", description = "Sessão do funil e operações de carrinho"),
        (name = "Checkout", description = "Geração de cobrança PIX e verificação de pagamento"),
        (name = "CEP", description = "Consulta de endereço por CEP"),
        (name = "Saldo", description = "Saldo do lojista no gateway de pagamento")
    )
)]
pub struct ApiDoc;
