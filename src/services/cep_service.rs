// src/services/cep_service.rs

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;

use crate::common::error::AppError;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CepAddress {
    #[schema(example = "Avenida Paulista")]
    pub street: String,
    #[schema(example = "Bela Vista")]
    pub neighborhood: String,
    #[schema(example = "São Paulo")]
    pub city: String,
    #[schema(example = "SP")]
    pub state: String,
}

// Resultado de uma consulta a um provedor: achou, não achou, ou o
// provedor em si falhou (HTTP não-2xx, corpo fora do formato, rede).
#[derive(Debug)]
pub enum ProviderOutcome {
    Found(CepAddress),
    NotFound,
    Failed,
}

// Um diretório de CEPs. Dois concretos abaixo: ViaCEP (primário) e
// BrasilAPI (secundário).
#[async_trait]
pub trait CepProvider: Send + Sync {
    async fn query(&self, cep: &str) -> ProviderOutcome;
}

pub struct ViaCep {
    client: reqwest::Client,
    base_url: String,
}

impl ViaCep {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl CepProvider for ViaCep {
    async fn query(&self, cep: &str) -> ProviderOutcome {
        let url = format!("{}/ws/{}/json/", self.base_url, cep);
        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("ViaCEP indisponível: {}", e);
                return ProviderOutcome::Failed;
            }
        };
        if !response.status().is_success() {
            return ProviderOutcome::Failed;
        }
        let body: serde_json::Value = match response.json().await {
            Ok(b) => b,
            Err(_) => return ProviderOutcome::Failed,
        };
        // ViaCEP sinaliza CEP inexistente com {"erro": true} e status 200.
        if body.get("erro").is_some_and(|e| e.as_bool() == Some(true)) {
            return ProviderOutcome::NotFound;
        }
        ProviderOutcome::Found(CepAddress {
            street: text_field(&body, "logradouro"),
            neighborhood: text_field(&body, "bairro"),
            city: text_field(&body, "localidade"),
            state: text_field(&body, "uf"),
        })
    }
}

pub struct BrasilApi {
    client: reqwest::Client,
    base_url: String,
}

impl BrasilApi {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl CepProvider for BrasilApi {
    async fn query(&self, cep: &str) -> ProviderOutcome {
        let url = format!("{}/api/cep/v1/{}", self.base_url, cep);
        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("BrasilAPI indisponível: {}", e);
                return ProviderOutcome::Failed;
            }
        };
        // BrasilAPI devolve 404 para CEP inexistente.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return ProviderOutcome::NotFound;
        }
        if !response.status().is_success() {
            return ProviderOutcome::Failed;
        }
        let body: serde_json::Value = match response.json().await {
            Ok(b) => b,
            Err(_) => return ProviderOutcome::Failed,
        };
        ProviderOutcome::Found(CepAddress {
            street: text_field(&body, "street"),
            neighborhood: text_field(&body, "neighborhood"),
            city: text_field(&body, "city"),
            state: text_field(&body, "state"),
        })
    }
}

fn text_field(body: &serde_json::Value, key: &str) -> String {
    body.get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

// Consulta de endereço por CEP com fallback: tenta o primário e, em caso
// de falha ou não-encontrado, faz exatamente uma chamada ao secundário.
// Sem cache: consultas repetidas são idempotentes e independentes.
pub struct CepService {
    primary: Arc<dyn CepProvider>,
    secondary: Arc<dyn CepProvider>,
}

impl CepService {
    pub fn new(primary: Arc<dyn CepProvider>, secondary: Arc<dyn CepProvider>) -> Self {
        Self { primary, secondary }
    }

    pub async fn lookup(&self, cep: &str) -> Result<CepAddress, AppError> {
        let clean: String = cep.chars().filter(|c| c.is_ascii_digit()).collect();
        if clean.len() != 8 {
            return Err(AppError::InvalidCep);
        }

        let first = match self.primary.query(&clean).await {
            ProviderOutcome::Found(address) => return Ok(address),
            other => other,
        };

        match self.secondary.query(&clean).await {
            ProviderOutcome::Found(address) => Ok(address),
            ProviderOutcome::NotFound => Err(AppError::CepNotFound),
            ProviderOutcome::Failed => match first {
                // Primário disse "não existe" e o secundário caiu: o CEP
                // não encontrado é a resposta mais honesta.
                ProviderOutcome::NotFound => Err(AppError::CepNotFound),
                _ => Err(AppError::ServiceUnavailable),
            },
        }
    }
}
