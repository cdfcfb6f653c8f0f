// src/lib.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// Declaração dos nossos módulos
pub mod common;
pub mod config;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

pub use crate::config::AppState;
use crate::middleware::cors::cors_guard;

// Monta o router completo da aplicação. Fica na lib para os testes de
// integração conseguirem dirigir as rotas sem subir um servidor.
pub fn build_router(app_state: AppState) -> Router {
    // Rotas da loja (catálogo é público e sem estado) e do saldo do lojista
    let store_routes = Router::new()
        .route("/products", get(handlers::store::get_products))
        .route("/balance", get(handlers::balance::get_balance));

    // Sessão do funil + carrinho
    let session_routes = Router::new()
        .route("/sessions", post(handlers::cart::create_session))
        .route("/sessions/{id}/cart", get(handlers::cart::get_cart))
        .route(
            "/sessions/{id}/cart/items",
            post(handlers::cart::add_item),
        )
        .route(
            "/sessions/{id}/cart/items/{product_id}",
            put(handlers::cart::update_quantity).delete(handlers::cart::remove_item),
        );

    // Checkout: geração do PIX e verificação "já paguei"
    let checkout_routes = Router::new()
        .route(
            "/sessions/{id}/checkout/pix",
            post(handlers::checkout::generate_pix),
        )
        .route(
            "/sessions/{id}/checkout/status",
            post(handlers::checkout::check_status),
        );

    let cep_routes = Router::new().route("/cep/{cep}", get(handlers::cep::lookup_cep));

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api", store_routes)
        .nest("/api", session_routes)
        .nest("/api", checkout_routes)
        .nest("/api", cep_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            cors_guard,
        ))
        .with_state(app_state)
}
