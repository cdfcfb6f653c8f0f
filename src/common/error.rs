use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// Cobre toda a taxonomia do checkout: validação local, gateway,
// serviço externo fora do ar e recursos não encontrados.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Seu carrinho está vazio")]
    EmptyCart,

    #[error("Preencha nome, e-mail e CPF para continuar")]
    MissingCustomerFields,

    #[error("CPF inválido. Verifique os dados informados.")]
    InvalidCpf,

    #[error("O valor mínimo para pagamento via PIX é de R$ {0:.2}")]
    BelowMinimumAmount(f64),

    #[error("CEP inválido. Deve conter 8 dígitos.")]
    InvalidCep,

    #[error("CEP não encontrado")]
    CepNotFound,

    #[error("Produto não encontrado")]
    ProductNotFound,

    #[error("Sessão não encontrada")]
    SessionNotFound,

    #[error("Nenhuma cobrança PIX ativa para esta sessão")]
    NoActiveCharge,

    #[error("Já existe uma operação em andamento para esta sessão")]
    OperationInFlight,

    #[error("Pagamento já confirmado")]
    AlreadyConfirmed,

    // Mensagem já remapeada para o usuário final; nunca o payload cru do gateway.
    #[error("{0}")]
    Gateway(String),

    // A consulta de status falhou; diferente de "pagamento pendente".
    #[error("Não foi possível verificar o pagamento. Tente novamente.")]
    StatusCheckFailed,

    #[error("Serviço de pagamento indisponível")]
    ServiceUnavailable,

    #[error("Domínio não autorizado")]
    UnauthorizedOrigin,

    // Só aparece em log; nunca vira resposta HTTP para o usuário.
    #[error("Falha ao reportar conversão: {0}")]
    Reporting(String),

    // Falha de rede em qualquer chamada externa (gateway, ViaCEP, Utmify).
    #[error("Falha na comunicação com o serviço externo")]
    Upstream(#[from] reqwest::Error),

    // Variante genérica para qualquer outro erro inesperado.
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }

            AppError::EmptyCart
            | AppError::MissingCustomerFields
            | AppError::InvalidCpf
            | AppError::BelowMinimumAmount(_)
            | AppError::InvalidCep => (StatusCode::BAD_REQUEST, self.to_string()),

            AppError::CepNotFound
            | AppError::ProductNotFound
            | AppError::SessionNotFound
            | AppError::NoActiveCharge => (StatusCode::NOT_FOUND, self.to_string()),

            AppError::OperationInFlight | AppError::AlreadyConfirmed => {
                (StatusCode::CONFLICT, self.to_string())
            }

            AppError::Gateway(ref msg) => (StatusCode::BAD_REQUEST, msg.clone()),

            AppError::StatusCheckFailed => (StatusCode::BAD_GATEWAY, self.to_string()),

            AppError::ServiceUnavailable => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),

            AppError::UnauthorizedOrigin => (StatusCode::FORBIDDEN, self.to_string()),

            AppError::Upstream(ref e) => {
                tracing::error!("Falha na chamada ao serviço externo: {}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    AppError::ServiceUnavailable.to_string(),
                )
            }

            // O `tracing` loga a mensagem detalhada que `thiserror` nos deu.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocorreu um erro inesperado.".to_string(),
                )
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
