// src/models/checkout.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::cart::Cart;

// --- DADOS DO CLIENTE ---

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    #[schema(example = "Maria da Silva")]
    pub name: String,
    #[schema(example = "maria@email.com")]
    pub email: String,
    // CPF cru, do jeito que veio do formulário ("000.000.000-00" ou só dígitos).
    #[schema(example = "111.444.777-35")]
    pub cpf: String,
    #[schema(example = "(11) 98888-7777")]
    pub phone: Option<String>,
}

// Campos de endereço em texto livre, todos opcionais. O bloco só é
// encaminhado ao gateway quando CEP (8 dígitos) e UF (2 letras) estão
// presentes; endereço parcial é omitido inteiro, nunca enviado pela metade.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddressInfo {
    #[schema(example = "01310-100")]
    pub zip_code: Option<String>,
    pub street: Option<String>,
    pub number: Option<String>,
    pub complement: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    #[schema(example = "SP")]
    pub state: Option<String>,
}

// --- PARÂMETROS DE ATRIBUIÇÃO (UTM) ---

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct TrackingParameters {
    pub src: Option<String>,
    pub sck: Option<String>,
    pub utm_source: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_content: Option<String>,
    pub utm_term: Option<String>,
}

// --- COBRANÇA PIX ---

// Resultado de um create-charge bem-sucedido. Imutável depois de criada;
// gerar de novo substitui a cobrança inteira por uma nova.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PixCharge {
    pub transaction_id: String,
    // Código "copia e cola".
    pub pix_code: Option<String>,
    // QR Code em base64.
    pub pix_qr_code: Option<String>,
    // URL da imagem do QR Code, quando o gateway fornece.
    pub pix_image: Option<String>,
    #[schema(example = "waiting_payment")]
    pub status: String,
}

impl PixCharge {
    // Uma cobrança sem código E sem QR não serve para nada e é tratada
    // como falha de geração.
    pub fn is_usable(&self) -> bool {
        self.pix_code.as_deref().is_some_and(|c| !c.is_empty())
            || self.pix_qr_code.as_deref().is_some_and(|q| !q.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChargeStatus {
    #[schema(example = "paid")]
    pub status: String,
    pub is_paid: bool,
    pub paid_at: Option<String>,
}

// --- MÁQUINA DE ESTADOS DO CHECKOUT ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum CheckoutPhase {
    Idle,
    Generating,
    AwaitingPayment,
    Confirmed,
}

// Estado de uma sessão do funil: carrinho + checkout. Vive só em memória,
// do início da sessão até a confirmação do pagamento (ou abandono).
#[derive(Debug)]
pub struct CheckoutSession {
    pub id: Uuid,
    pub cart: Cart,
    pub phase: CheckoutPhase,
    pub charge: Option<PixCharge>,
    // Foto do carrinho no momento em que a cobrança foi gerada. O usuário
    // pode seguir mexendo no carrinho depois; o que vale para a conversão
    // é o que foi cobrado, não o carrinho do momento da confirmação.
    pub charged_cart: Option<Cart>,
    pub last_error: Option<String>,
    // Garante no máximo um envio ao serviço de atribuição por pagamento.
    pub conversion_reported: bool,
    // Identificador do pedido enviado ao gateway e à atribuição.
    pub order_id: Uuid,
    pub created_at: DateTime<Utc>,
    // Snapshot dos dados informados na geração do PIX, usados depois na
    // confirmação (o reporter precisa deles).
    pub customer: Option<CustomerInfo>,
    pub tracking: TrackingParameters,
}

impl CheckoutSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            cart: Cart::new(),
            phase: CheckoutPhase::Idle,
            charge: None,
            charged_cart: None,
            last_error: None,
            conversion_reported: false,
            order_id: Uuid::new_v4(),
            created_at: Utc::now(),
            customer: None,
            tracking: TrackingParameters::default(),
        }
    }
}

impl Default for CheckoutSession {
    fn default() -> Self {
        Self::new()
    }
}

// --- REGISTRO DE SESSÕES ---

// Uma sessão por usuário do funil. O Mutex por sessão serializa as
// operações de checkout: `try_lock` rejeita chamadas concorrentes em vez
// de duplicar cobranças ou verificações.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<Uuid, Arc<Mutex<CheckoutSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self) -> Uuid {
        let session = CheckoutSession::new();
        let id = session.id;
        self.sessions.insert(id, Arc::new(Mutex::new(session)));
        id
    }

    pub fn get(&self, id: Uuid) -> Option<Arc<Mutex<CheckoutSession>>> {
        self.sessions.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn remove(&self, id: Uuid) {
        self.sessions.remove(&id);
    }
}
