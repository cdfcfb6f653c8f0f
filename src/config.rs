// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;

use crate::{
    models::checkout::SessionStore,
    services::{
        cep_service::{BrasilApi, CepService, ViaCep},
        checkout_service::{CheckoutPolicy, CheckoutService},
        gateway_service::{EvolutGateway, PaymentGateway},
        utmify_service::{ConversionReporter, UtmifyReporter},
    },
};

// Toda a configuração carregada uma vez na subida do processo. Nada de
// ler variável de ambiente espalhado pelos handlers: se faltar
// credencial do gateway, a aplicação nem inicia.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: String,

    // Origens autorizadas a chamar a API a partir do navegador.
    pub allowed_origins: Vec<String>,

    // Política de negócio: valor mínimo de um PIX, em reais.
    pub min_pix_amount: f64,

    // Vocabulário de status que conta como "pago"; já mudou entre
    // revisões da API do gateway, então é configuração.
    pub paid_statuses: Vec<String>,

    pub evolutpay_public_key: String,
    pub evolutpay_secret_key: String,
    pub evolutpay_charge_url: String,
    pub evolutpay_status_url: String,
    pub evolutpay_balance_url: String,

    pub viacep_base_url: String,
    pub brasilapi_base_url: String,

    pub utmify_api_url: String,
    // Opcional: sem token, a atribuição é simplesmente pulada.
    pub utmify_api_token: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let evolutpay_public_key =
            env::var("EVOLUTPAY_PUBLIC_KEY").context("EVOLUTPAY_PUBLIC_KEY deve ser definida")?;
        let evolutpay_secret_key =
            env::var("EVOLUTPAY_SECRET_KEY").context("EVOLUTPAY_SECRET_KEY deve ser definida")?;

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173,http://localhost:3000".to_string())
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        let min_pix_amount = env::var("PIX_MIN_AMOUNT")
            .unwrap_or_else(|_| "7.50".to_string())
            .parse::<f64>()
            .context("PIX_MIN_AMOUNT deve ser um número")?;

        let paid_statuses = env::var("PIX_PAID_STATUSES")
            .unwrap_or_else(|_| "paid,completed,approved".to_string())
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            listen_addr: env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            allowed_origins,
            min_pix_amount,
            paid_statuses,
            evolutpay_public_key,
            evolutpay_secret_key,
            evolutpay_charge_url: env::var("EVOLUTPAY_CHARGE_URL").unwrap_or_else(|_| {
                "https://app.evolutpay.com/api/v1/gateway/pix/receive".to_string()
            }),
            evolutpay_status_url: env::var("EVOLUTPAY_STATUS_URL").unwrap_or_else(|_| {
                "https://api.evolutpay.com.br/v1/payment-transaction".to_string()
            }),
            evolutpay_balance_url: env::var("EVOLUTPAY_BALANCE_URL").unwrap_or_else(|_| {
                "https://app.evolutpay.com/api/v1/gateway/producer/balance".to_string()
            }),
            viacep_base_url: env::var("VIACEP_BASE_URL")
                .unwrap_or_else(|_| "https://viacep.com.br".to_string()),
            brasilapi_base_url: env::var("BRASILAPI_BASE_URL")
                .unwrap_or_else(|_| "https://brasilapi.com.br".to_string()),
            utmify_api_url: env::var("UTMIFY_API_URL")
                .unwrap_or_else(|_| "https://api.utmify.com.br/api-credentials/orders".to_string()),
            utmify_api_token: env::var("UTMIFY_API_TOKEN").ok(),
        })
    }
}

// Cada serviço externo ganha o seu client, com o timeout adequado à
// chamada. Falha de construção derruba a subida, não uma requisição.
fn http_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("falha ao construir o cliente HTTP")
}

// O estado compartilhado que será acessível em toda a aplicação.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: Arc<SessionStore>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub checkout_service: Arc<CheckoutService>,
    pub cep_service: Arc<CepService>,
}

impl AppState {
    pub fn new() -> anyhow::Result<Self> {
        let config = Config::from_env()?;

        let gateway: Arc<dyn PaymentGateway> = Arc::new(EvolutGateway::new(
            http_client(Duration::from_secs(15))?,
            config.evolutpay_charge_url.clone(),
            config.evolutpay_status_url.clone(),
            config.evolutpay_balance_url.clone(),
            config.evolutpay_public_key.clone(),
            config.evolutpay_secret_key.clone(),
            config.paid_statuses.clone(),
        ));

        let reporter: Arc<dyn ConversionReporter> = Arc::new(UtmifyReporter::new(
            http_client(Duration::from_secs(10))?,
            config.utmify_api_url.clone(),
            config.utmify_api_token.clone(),
        ));

        let cep_client = http_client(Duration::from_secs(10))?;
        let cep_service = Arc::new(CepService::new(
            Arc::new(ViaCep::new(cep_client.clone(), config.viacep_base_url.clone())),
            Arc::new(BrasilApi::new(cep_client, config.brasilapi_base_url.clone())),
        ));

        Ok(Self::from_parts(config, gateway, reporter, cep_service))
    }

    // Monta o gráfico de dependências. Os testes de integração usam este
    // construtor para injetar gateway e reporter falsos.
    pub fn from_parts(
        config: Config,
        gateway: Arc<dyn PaymentGateway>,
        reporter: Arc<dyn ConversionReporter>,
        cep_service: Arc<CepService>,
    ) -> Self {
        let checkout_service = Arc::new(CheckoutService::new(
            gateway.clone(),
            reporter,
            CheckoutPolicy {
                min_pix_amount: config.min_pix_amount,
            },
        ));

        Self {
            config: Arc::new(config),
            sessions: Arc::new(SessionStore::new()),
            gateway,
            checkout_service,
            cep_service,
        }
    }
}
