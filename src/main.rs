//src/main.rs

use tokio::net::TcpListener;

use loja_natal_backend::{build_router, AppState};

#[tokio::main]
async fn main() {
    // Inicializa o logger.
    tracing_subscriber::fmt().with_target(false).compact().init();

    // .expect() é bom aqui: se a configuração falhar (credencial do
    // gateway ausente, por exemplo), a aplicação não deve iniciar.
    let app_state = AppState::new().expect("Falha ao inicializar o estado da aplicação.");

    tracing::info!(
        "✅ Configuração carregada: mínimo PIX R$ {:.2}, {} origem(ns) autorizada(s)",
        app_state.config.min_pix_amount,
        app_state.config.allowed_origins.len()
    );

    let addr = app_state.config.listen_addr.clone();
    let app = build_router(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
