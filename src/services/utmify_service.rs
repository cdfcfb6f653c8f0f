// src/services/utmify_service.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{common::error::AppError, models::checkout::TrackingParameters};

// Taxa do gateway usada na quebra de comissão enviada à atribuição.
const GATEWAY_FEE_RATE: f64 = 0.03;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionCustomer {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub document: Option<String>,
    pub country: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionProduct {
    pub id: String,
    pub name: String,
    pub plan_id: Option<String>,
    pub plan_name: Option<String>,
    pub quantity: u32,
    pub price_in_cents: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Commission {
    pub total_price_in_cents: i64,
    pub gateway_fee_in_cents: i64,
    pub user_commission_in_cents: i64,
    pub currency: String,
}

// Pedido confirmado, no formato que o serviço de atribuição espera.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionOrder {
    pub order_id: String,
    pub platform: String,
    pub payment_method: String,
    pub status: String,
    pub created_at: String,
    pub approved_date: Option<String>,
    pub refunded_at: Option<String>,
    pub customer: ConversionCustomer,
    pub products: Vec<ConversionProduct>,
    // Os campos UTM mantêm a grafia snake_case do protocolo de atribuição.
    pub tracking_parameters: TrackingParameters,
    pub commission: Commission,
    pub is_test: bool,
}

impl Commission {
    // total em centavos, taxa do gateway de 3%, o resto é comissão.
    pub fn split(total_in_cents: i64) -> Self {
        let gateway_fee_in_cents = ((total_in_cents as f64) * GATEWAY_FEE_RATE).round() as i64;
        Self {
            total_price_in_cents: total_in_cents,
            gateway_fee_in_cents,
            user_commission_in_cents: total_in_cents - gateway_fee_in_cents,
            currency: "BRL".to_string(),
        }
    }
}

// Formato de data que a atribuição aceita: "YYYY-MM-DD HH:MM:SS" em UTC.
pub fn format_date_utc(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d %H:%M:%S").to_string()
}

// Envio do pedido confirmado à atribuição de marketing. Melhor esforço:
// falha vira log, nunca erro para o usuário, e nunca segura a
// transição do checkout para Confirmed.
#[async_trait]
pub trait ConversionReporter: Send + Sync {
    async fn report(&self, order: ConversionOrder) -> Result<(), AppError>;
}

pub struct UtmifyReporter {
    client: reqwest::Client,
    api_url: String,
    api_token: Option<String>,
}

impl UtmifyReporter {
    pub fn new(client: reqwest::Client, api_url: String, api_token: Option<String>) -> Self {
        Self {
            client,
            api_url,
            api_token,
        }
    }
}

#[async_trait]
impl ConversionReporter for UtmifyReporter {
    async fn report(&self, order: ConversionOrder) -> Result<(), AppError> {
        let Some(token) = self.api_token.as_deref() else {
            tracing::info!("UTMIFY_API_TOKEN não configurado, pulando atribuição");
            return Ok(());
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-token", token)
            .json(&order)
            .send()
            .await
            .map_err(|e| AppError::Reporting(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::Reporting(format!(
                "atribuição respondeu {} para o pedido {}",
                response.status(),
                order.order_id
            )));
        }

        tracing::info!("Conversão reportada para o pedido {}", order.order_id);
        Ok(())
    }
}
