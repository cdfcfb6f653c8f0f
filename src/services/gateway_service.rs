// src/services/gateway_service.rs

use async_trait::async_trait;
use base64::Engine;
use serde::Serialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

use crate::{
    common::error::AppError,
    models::checkout::{AddressInfo, ChargeStatus, CustomerInfo, PixCharge},
};

// Item de pedido encaminhado ao gateway.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeItem {
    pub id: String,
    pub name: String,
    pub quantity: u32,
    pub price: f64,
}

// Pedido de cobrança já validado pelo orquestrador. Este cliente não
// reaplica regras de negócio (mínimo, CPF); só encaminha e traduz a
// resposta do processador.
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub order_id: String,
    pub amount: f64,
    pub customer: CustomerInfo,
    pub address: Option<AddressInfo>,
    pub items: Vec<ChargeItem>,
}

// Saldo do lojista no processador, em reais.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GatewayBalance {
    #[schema(example = 1234.56)]
    pub available: f64,
    #[schema(example = 78.90)]
    pub pending: f64,
    pub fund_lock: f64,
}

// Abstração do processador de pagamento: criar cobrança PIX, consultar
// status e consultar o saldo do lojista. Uma chamada de rede por
// operação, sem retry interno: quem decide repetir é o orquestrador
// (ação explícita do usuário).
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_charge(&self, request: &ChargeRequest) -> Result<PixCharge, AppError>;
    async fn charge_status(&self, transaction_id: &str) -> Result<ChargeStatus, AppError>;
    async fn balance(&self) -> Result<GatewayBalance, AppError>;
}

// Adaptador concreto para a EvolutPay.
pub struct EvolutGateway {
    client: reqwest::Client,
    charge_url: String,
    status_base_url: String,
    balance_url: String,
    public_key: String,
    secret_key: String,
    // Vocabulário de status "pago" vem da configuração: o gateway já
    // mudou esses valores entre revisões da própria API.
    paid_statuses: Vec<String>,
}

impl EvolutGateway {
    // O client vem pronto da subida da aplicação; falha de construção é
    // tratada lá, antes de qualquer requisição.
    pub fn new(
        client: reqwest::Client,
        charge_url: String,
        status_base_url: String,
        balance_url: String,
        public_key: String,
        secret_key: String,
        paid_statuses: Vec<String>,
    ) -> Self {
        Self {
            client,
            charge_url,
            status_base_url,
            balance_url,
            public_key,
            secret_key,
            paid_statuses,
        }
    }
}

#[async_trait]
impl PaymentGateway for EvolutGateway {
    async fn create_charge(&self, request: &ChargeRequest) -> Result<PixCharge, AppError> {
        let mut client_data = json!({
            "name": request.customer.name,
            "email": request.customer.email,
            "phone": request.customer.phone.clone().unwrap_or_default(),
            "document": digits_only(&request.customer.cpf),
        });

        if let Some(address) = request.address.as_ref().and_then(address_payload) {
            client_data["address"] = address;
        }

        let mut payload = json!({
            "identifier": request.order_id,
            "amount": request.amount,
            "client": client_data,
            "metadata": {
                "source": "loja-natal",
                "orderId": request.order_id,
            },
        });

        if !request.items.is_empty() {
            payload["products"] = Value::Array(
                request
                    .items
                    .iter()
                    .map(|item| {
                        json!({
                            "id": item.id,
                            "name": item.name,
                            "quantity": item.quantity,
                            "price": item.price,
                            "physical": true,
                        })
                    })
                    .collect(),
            );
        }

        let response = self
            .client
            .post(&self.charge_url)
            .header("x-public-key", &self.public_key)
            .header("x-secret-key", &self.secret_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await?;

        if !status.is_success() || body.get("errorCode").is_some() {
            tracing::error!(
                "Gateway recusou a cobrança ({}): {:?}",
                status,
                body.get("errorCode")
            );
            return Err(AppError::Gateway(map_create_error(&body)));
        }

        parse_charge(&body)
    }

    async fn charge_status(&self, transaction_id: &str) -> Result<ChargeStatus, AppError> {
        let credentials = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", self.public_key, self.secret_key));

        let url = format!("{}/{}", self.status_base_url, transaction_id);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Basic {}", credentials))
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::warn!(
                "Consulta de status falhou: {} para a transação {}",
                response.status(),
                transaction_id
            );
            return Err(AppError::StatusCheckFailed);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|_| AppError::StatusCheckFailed)?;

        Ok(parse_status(&body, &self.paid_statuses))
    }

    async fn balance(&self) -> Result<GatewayBalance, AppError> {
        let response = self
            .client
            .get(&self.balance_url)
            .header("x-public-key", &self.public_key)
            .header("x-secret-key", &self.secret_key)
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await?;

        if !status.is_success() || body.get("errorCode").is_some() {
            tracing::error!(
                "Consulta de saldo falhou ({}): {:?}",
                status,
                body.get("errorCode")
            );
            return Err(AppError::Gateway(
                "Não foi possível consultar o saldo".to_string(),
            ));
        }

        Ok(parse_balance(&body))
    }
}

fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

// Monta o bloco de endereço só quando CEP (8 dígitos) e UF (2 letras)
// estão presentes. Endereço incompleto é omitido por inteiro para não
// tomar erro de validação do gateway.
pub fn address_payload(address: &AddressInfo) -> Option<Value> {
    let clean_zip = digits_only(address.zip_code.as_deref().unwrap_or(""));
    if clean_zip.len() != 8 {
        return None;
    }
    let formatted_zip = format!("{}-{}", &clean_zip[..5], &clean_zip[5..]);

    let uf = address
        .state
        .as_deref()
        .unwrap_or("")
        .trim()
        .to_uppercase();
    if uf.len() != 2 || !uf.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    Some(json!({
        "zipCode": formatted_zip,
        "country": "BR",
        "state": uf,
        "city": address.city.clone().unwrap_or_default(),
        "neighborhood": address.neighborhood.clone().unwrap_or_default(),
        "street": address.street.clone().unwrap_or_default(),
        "number": address.number.clone().unwrap_or_default(),
        "complement": address.complement.clone().unwrap_or_default(),
    }))
}

// Remapeia o texto do processador para um conjunto pequeno de mensagens
// nossas. O payload cru do gateway nunca chega ao usuário final.
pub fn map_create_error(body: &Value) -> String {
    let message = body
        .get("message")
        .and_then(|m| m.as_str())
        .unwrap_or_default()
        .to_lowercase();

    if message.contains("mínimo") || message.contains("minimo") {
        return "O valor informado está abaixo do mínimo aceito para PIX.".to_string();
    }
    if message.contains("documento") || message.contains("cpf") {
        return "CPF inválido. Verifique os dados informados.".to_string();
    }

    let state_rejected = body
        .get("details")
        .and_then(|d| d.as_array())
        .is_some_and(|details| {
            details.iter().any(|d| {
                d.get("field")
                    .and_then(|f| f.as_str())
                    .is_some_and(|f| f.contains("state"))
            })
        });
    if state_rejected {
        return "Estado inválido. Verifique o CEP informado.".to_string();
    }

    "Erro ao gerar QR Code PIX. Tente novamente.".to_string()
}

pub fn parse_charge(body: &Value) -> Result<PixCharge, AppError> {
    let transaction_id = body
        .get("transactionId")
        .and_then(|t| t.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            AppError::Gateway("Erro ao gerar QR Code PIX. Tente novamente.".to_string())
        })?;

    let pix = body.get("pix").cloned().unwrap_or(Value::Null);
    let field = |key: &str| {
        pix.get(key)
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };

    Ok(PixCharge {
        transaction_id,
        pix_code: field("code"),
        pix_qr_code: field("base64"),
        pix_image: field("image"),
        status: body
            .get("status")
            .and_then(|s| s.as_str())
            .unwrap_or("waiting_payment")
            .to_string(),
    })
}

// Campo ausente vira zero; o gateway omite valores zerados em contas novas.
pub fn parse_balance(body: &Value) -> GatewayBalance {
    let amount = |key: &str| body.get(key).and_then(|v| v.as_f64()).unwrap_or(0.0);
    GatewayBalance {
        available: amount("available"),
        pending: amount("pending"),
        fund_lock: amount("fundLock"),
    }
}

// Status desconhecido é tratado como não pago. Nunca chutamos "pago".
pub fn parse_status(body: &Value, paid_statuses: &[String]) -> ChargeStatus {
    let status = body
        .get("status")
        .and_then(|s| s.as_str())
        .unwrap_or_default()
        .to_lowercase();

    let is_paid = paid_statuses.iter().any(|p| p == &status);

    let paid_at = body
        .get("paid_at")
        .or_else(|| body.get("payedAt"))
        .and_then(|p| p.as_str())
        .map(str::to_string);

    ChargeStatus {
        status,
        is_paid,
        paid_at,
    }
}
