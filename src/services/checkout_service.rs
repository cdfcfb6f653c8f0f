// src/services/checkout_service.rs

use std::sync::Arc;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    models::checkout::{
        AddressInfo, ChargeStatus, CheckoutPhase, CheckoutSession, CustomerInfo, PixCharge,
        TrackingParameters,
    },
    services::{
        cpf::is_valid_cpf,
        gateway_service::{ChargeItem, ChargeRequest, PaymentGateway},
        utmify_service::{
            format_date_utc, Commission, ConversionCustomer, ConversionOrder, ConversionProduct,
            ConversionReporter,
        },
    },
};

// Tolerância para ruído de ponto flutuante na comparação com o mínimo.
// Um total de 7.499999999 (2.4999... × 3) não pode ser rejeitado quando
// o mínimo é 7.50.
const AMOUNT_EPSILON: f64 = 1e-9;

// Política de negócio do checkout. O mínimo vem da configuração: o
// valor já mudou entre campanhas e não é decisão deste módulo.
#[derive(Debug, Clone)]
pub struct CheckoutPolicy {
    pub min_pix_amount: f64,
}

// Dados que chegam junto com o pedido de geração do PIX.
#[derive(Debug, Clone)]
pub struct PixGenerationInput {
    pub customer: CustomerInfo,
    pub address: AddressInfo,
    pub tracking: TrackingParameters,
}

// O orquestrador do checkout: valida a entrada, aplica a política de
// mínimo, chama o gateway e dirige a máquina de estados da sessão
// (Idle → Generating → AwaitingPayment → Confirmed). Falha nunca é
// pegajosa: a sessão volta ao estado anterior à ação que falhou.
pub struct CheckoutService {
    gateway: Arc<dyn PaymentGateway>,
    reporter: Arc<dyn ConversionReporter>,
    policy: CheckoutPolicy,
}

impl CheckoutService {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        reporter: Arc<dyn ConversionReporter>,
        policy: CheckoutPolicy,
    ) -> Self {
        Self {
            gateway,
            reporter,
            policy,
        }
    }

    // Guardas de validação, em ordem, parando na primeira que falha,
    // cada uma com a sua mensagem. Nenhuma delas toca a rede.
    fn run_guards(
        &self,
        session: &CheckoutSession,
        customer: &CustomerInfo,
    ) -> Result<f64, AppError> {
        let totals = session.cart.totals();
        if session.cart.is_empty() || totals.price <= Decimal::ZERO {
            return Err(AppError::EmptyCart);
        }

        if customer.name.trim().is_empty()
            || customer.email.trim().is_empty()
            || customer.cpf.trim().is_empty()
        {
            return Err(AppError::MissingCustomerFields);
        }

        if !is_valid_cpf(&customer.cpf) {
            return Err(AppError::InvalidCpf);
        }

        // Arredonda para 2 casas antes de comparar com o mínimo.
        let total = totals.price.to_f64().unwrap_or(0.0);
        let total = (total * 100.0).round() / 100.0;
        if total + AMOUNT_EPSILON < self.policy.min_pix_amount {
            return Err(AppError::BelowMinimumAmount(self.policy.min_pix_amount));
        }

        Ok(total)
    }

    pub async fn generate_pix(
        &self,
        session: &mut CheckoutSession,
        input: PixGenerationInput,
    ) -> Result<PixCharge, AppError> {
        if session.phase == CheckoutPhase::Confirmed {
            return Err(AppError::AlreadyConfirmed);
        }

        let amount = match self.run_guards(session, &input.customer) {
            Ok(amount) => amount,
            Err(e) => {
                // Guarda reprovou: estado fica exatamente onde estava.
                session.last_error = Some(e.to_string());
                return Err(e);
            }
        };

        let request = ChargeRequest {
            order_id: session.order_id.to_string(),
            amount,
            customer: input.customer.clone(),
            address: Some(input.address.clone()),
            items: session
                .cart
                .lines
                .iter()
                .map(|line| ChargeItem {
                    id: line.product.id.to_string(),
                    name: line.product.name.clone(),
                    quantity: line.quantity,
                    price: line.product.discounted_price.to_f64().unwrap_or(0.0),
                })
                .collect(),
        };

        let prior_phase = session.phase;
        session.phase = CheckoutPhase::Generating;
        tracing::info!("Gerando cobrança PIX para o pedido {}", session.order_id);

        match self.gateway.create_charge(&request).await {
            Ok(charge) if charge.is_usable() => {
                session.customer = Some(input.customer);
                session.tracking = input.tracking;
                session.charged_cart = Some(session.cart.clone());
                session.charge = Some(charge.clone());
                session.phase = CheckoutPhase::AwaitingPayment;
                session.last_error = None;
                Ok(charge)
            }
            Ok(_) => {
                // Resposta "de sucesso" sem código e sem QR não serve.
                session.phase = prior_phase;
                let e = AppError::Gateway("Erro ao gerar QR Code PIX. Tente novamente.".to_string());
                session.last_error = Some(e.to_string());
                Err(e)
            }
            Err(e) => {
                // A cobrança antiga (se houver) continua valendo; a nova
                // nunca chegou a existir.
                session.phase = prior_phase;
                session.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    // A verificação "já paguei": uma chamada independente por clique do
    // usuário, sem polling automático e sem backoff.
    pub async fn check_payment(
        &self,
        session: &mut CheckoutSession,
    ) -> Result<ChargeStatus, AppError> {
        if session.phase == CheckoutPhase::Confirmed {
            // Terminal: responde "pago" sem nova chamada ao gateway e
            // sem novo envio à atribuição.
            return Ok(ChargeStatus {
                status: "paid".to_string(),
                is_paid: true,
                paid_at: None,
            });
        }

        if session.phase != CheckoutPhase::AwaitingPayment {
            return Err(AppError::NoActiveCharge);
        }
        let transaction_id = session
            .charge
            .as_ref()
            .map(|c| c.transaction_id.clone())
            .ok_or(AppError::NoActiveCharge)?;

        match self.gateway.charge_status(&transaction_id).await {
            Ok(status) if status.is_paid => {
                session.phase = CheckoutPhase::Confirmed;
                session.last_error = None;
                tracing::info!("Pagamento confirmado para a transação {}", transaction_id);
                self.fire_conversion_report(session);
                Ok(status)
            }
            Ok(status) => {
                // Pendente não é erro: o usuário pode tentar de novo
                // quantas vezes quiser.
                session.last_error = Some("Pagamento ainda não identificado".to_string());
                Ok(status)
            }
            Err(e) => {
                // A consulta falhou: não dá para afirmar nada sobre o
                // pagamento, então o estado não muda.
                session.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    // Dispara o envio à atribuição em segundo plano, no máximo uma vez
    // por sessão confirmada. Falha vira log e nada mais.
    fn fire_conversion_report(&self, session: &mut CheckoutSession) {
        if session.conversion_reported {
            return;
        }
        session.conversion_reported = true;

        let order = build_conversion_order(session);
        let reporter = Arc::clone(&self.reporter);
        tokio::spawn(async move {
            if let Err(e) = reporter.report(order).await {
                tracing::warn!("{}", e);
            }
        });
    }
}

fn build_conversion_order(session: &CheckoutSession) -> ConversionOrder {
    let customer = session.customer.clone().unwrap_or(CustomerInfo {
        name: String::new(),
        email: String::new(),
        cpf: String::new(),
        phone: None,
    });

    // O que foi cobrado, não o carrinho atual: edições feitas depois da
    // geração do PIX não entram no pedido reportado.
    let cart = session.charged_cart.as_ref().unwrap_or(&session.cart);

    let totals = cart.totals();
    let total_in_cents = (totals.price * Decimal::from(100)).to_i64().unwrap_or(0);

    let products: Vec<ConversionProduct> = cart
        .lines
        .iter()
        .map(|line| ConversionProduct {
            id: line.product.id.to_string(),
            name: line.product.name.clone(),
            plan_id: None,
            plan_name: None,
            quantity: line.quantity,
            price_in_cents: (line.product.discounted_price * Decimal::from(100))
                .to_i64()
                .unwrap_or(0),
        })
        .collect();

    ConversionOrder {
        order_id: session.order_id.to_string(),
        platform: "Loja Natal".to_string(),
        payment_method: "pix".to_string(),
        status: "paid".to_string(),
        created_at: format_date_utc(session.created_at),
        approved_date: Some(format_date_utc(chrono::Utc::now())),
        refunded_at: None,
        customer: ConversionCustomer {
            name: customer.name.trim().to_string(),
            email: customer.email.trim().to_string(),
            phone: customer.phone,
            document: Some(customer.cpf),
            country: "BR".to_string(),
        },
        products,
        tracking_parameters: session.tracking.clone(),
        commission: Commission::split(total_in_cents),
        is_test: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::store::{find_product, Product};
    use crate::services::gateway_service::GatewayBalance;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    struct MockGateway {
        create_calls: AtomicUsize,
        status_calls: AtomicUsize,
        create_result: Mutex<Option<Result<PixCharge, AppError>>>,
        status_result: Mutex<Option<Result<ChargeStatus, AppError>>>,
    }

    impl MockGateway {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                create_calls: AtomicUsize::new(0),
                status_calls: AtomicUsize::new(0),
                create_result: Mutex::new(None),
                status_result: Mutex::new(None),
            })
        }

        fn will_create(self: &Arc<Self>, result: Result<PixCharge, AppError>) {
            *self.create_result.lock().unwrap() = Some(result);
        }

        fn will_report_status(self: &Arc<Self>, result: Result<ChargeStatus, AppError>) {
            *self.status_result.lock().unwrap() = Some(result);
        }
    }

    #[async_trait::async_trait]
    impl PaymentGateway for MockGateway {
        async fn create_charge(&self, _request: &ChargeRequest) -> Result<PixCharge, AppError> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            self.create_result
                .lock()
                .unwrap()
                .take()
                .expect("create_charge não deveria ter sido chamado")
        }

        async fn balance(&self) -> Result<GatewayBalance, AppError> {
            Ok(GatewayBalance::default())
        }

        async fn charge_status(&self, _transaction_id: &str) -> Result<ChargeStatus, AppError> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            self.status_result
                .lock()
                .unwrap()
                .take()
                .expect("charge_status não deveria ter sido chamado")
        }
    }

    struct MockReporter {
        calls: AtomicUsize,
        last_order: Mutex<Option<ConversionOrder>>,
    }

    impl MockReporter {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                last_order: Mutex::new(None),
            })
        }
    }

    #[async_trait::async_trait]
    impl ConversionReporter for MockReporter {
        async fn report(&self, order: ConversionOrder) -> Result<(), AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_order.lock().unwrap() = Some(order);
            Ok(())
        }
    }

    fn service(
        gateway: &Arc<MockGateway>,
        reporter: &Arc<MockReporter>,
        min: f64,
    ) -> CheckoutService {
        CheckoutService::new(
            gateway.clone(),
            reporter.clone(),
            CheckoutPolicy {
                min_pix_amount: min,
            },
        )
    }

    fn customer() -> CustomerInfo {
        CustomerInfo {
            name: "Maria da Silva".to_string(),
            email: "maria@email.com".to_string(),
            cpf: "111.444.777-35".to_string(),
            phone: Some("(11) 98888-7777".to_string()),
        }
    }

    fn input() -> PixGenerationInput {
        PixGenerationInput {
            customer: customer(),
            address: AddressInfo::default(),
            tracking: TrackingParameters::default(),
        }
    }

    fn charge() -> PixCharge {
        PixCharge {
            transaction_id: "tx-1".to_string(),
            pix_code: Some("00020126...6304ABCD".to_string()),
            pix_qr_code: Some("iVBORw0KGgo=".to_string()),
            pix_image: None,
            status: "waiting_payment".to_string(),
        }
    }

    fn priced_product(id: u32, price: Decimal) -> Product {
        let mut product = find_product(1).unwrap();
        product.id = id;
        product.discounted_price = price;
        product
    }

    fn session_with_cart() -> CheckoutSession {
        let mut session = CheckoutSession::new();
        session.cart.add_item(find_product(4).unwrap()); // R$ 8,90
        session
    }

    // Deixa as tasks disparadas com tokio::spawn rodarem.
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn empty_cart_never_reaches_the_gateway() {
        let gateway = MockGateway::new();
        let reporter = MockReporter::new();
        let svc = service(&gateway, &reporter, 7.50);
        let mut session = CheckoutSession::new();

        let result = svc.generate_pix(&mut session, input()).await;

        assert!(matches!(result, Err(AppError::EmptyCart)));
        assert_eq!(session.phase, CheckoutPhase::Idle);
        assert_eq!(gateway.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_fields_and_invalid_cpf_have_distinct_errors() {
        let gateway = MockGateway::new();
        let reporter = MockReporter::new();
        let svc = service(&gateway, &reporter, 7.50);
        let mut session = session_with_cart();

        let mut no_name = input();
        no_name.customer.name = "   ".to_string();
        assert!(matches!(
            svc.generate_pix(&mut session, no_name).await,
            Err(AppError::MissingCustomerFields)
        ));

        let mut bad_cpf = input();
        bad_cpf.customer.cpf = "111.444.777-36".to_string();
        assert!(matches!(
            svc.generate_pix(&mut session, bad_cpf).await,
            Err(AppError::InvalidCpf)
        ));

        assert_eq!(session.phase, CheckoutPhase::Idle);
        assert_eq!(gateway.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn total_below_the_minimum_is_rejected() {
        let gateway = MockGateway::new();
        let reporter = MockReporter::new();
        let svc = service(&gateway, &reporter, 7.50);

        let mut session = CheckoutSession::new();
        session.cart.add_item(priced_product(10, dec!(7.49)));

        let result = svc.generate_pix(&mut session, input()).await;

        assert!(matches!(result, Err(AppError::BelowMinimumAmount(_))));
        assert_eq!(gateway.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn total_exactly_at_the_minimum_is_accepted() {
        let gateway = MockGateway::new();
        gateway.will_create(Ok(charge()));
        let reporter = MockReporter::new();
        let svc = service(&gateway, &reporter, 7.50);

        let mut session = CheckoutSession::new();
        session.cart.add_item(priced_product(10, dec!(2.50)));
        session.cart.update_quantity(10, 3); // 7.50 na conta

        let result = svc.generate_pix(&mut session, input()).await;

        assert!(result.is_ok());
        assert_eq!(session.phase, CheckoutPhase::AwaitingPayment);
    }

    #[tokio::test]
    async fn float_noise_at_the_boundary_is_tolerated() {
        let gateway = MockGateway::new();
        gateway.will_create(Ok(charge()));
        let reporter = MockReporter::new();
        let svc = service(&gateway, &reporter, 7.50);

        // 2.499999999 × 3 = 7.499999997: arredonda para 7.50 e passa.
        let mut session = CheckoutSession::new();
        session.cart.add_item(priced_product(10, dec!(2.499999999)));
        session.cart.update_quantity(10, 3);

        let result = svc.generate_pix(&mut session, input()).await;

        assert!(result.is_ok(), "{:?}", result.err());
    }

    #[tokio::test]
    async fn successful_generation_stores_the_charge() {
        let gateway = MockGateway::new();
        gateway.will_create(Ok(charge()));
        let reporter = MockReporter::new();
        let svc = service(&gateway, &reporter, 7.50);
        let mut session = session_with_cart();

        let returned = svc.generate_pix(&mut session, input()).await.unwrap();

        assert_eq!(session.phase, CheckoutPhase::AwaitingPayment);
        let stored = session.charge.as_ref().unwrap();
        assert_eq!(stored.transaction_id, returned.transaction_id);
        assert!(stored.is_usable());
        assert!(session.customer.is_some());
    }

    #[tokio::test]
    async fn gateway_failure_returns_the_session_to_idle() {
        let gateway = MockGateway::new();
        gateway.will_create(Err(AppError::Gateway(
            "Erro ao gerar QR Code PIX. Tente novamente.".to_string(),
        )));
        let reporter = MockReporter::new();
        let svc = service(&gateway, &reporter, 7.50);
        let mut session = session_with_cart();

        let result = svc.generate_pix(&mut session, input()).await;

        assert!(matches!(result, Err(AppError::Gateway(_))));
        assert_eq!(session.phase, CheckoutPhase::Idle);
        assert!(session.charge.is_none());
        assert!(session.last_error.is_some());
    }

    #[tokio::test]
    async fn charge_without_code_or_qr_counts_as_failure() {
        let gateway = MockGateway::new();
        gateway.will_create(Ok(PixCharge {
            transaction_id: "tx-1".to_string(),
            pix_code: Some(String::new()),
            pix_qr_code: None,
            pix_image: None,
            status: "waiting_payment".to_string(),
        }));
        let reporter = MockReporter::new();
        let svc = service(&gateway, &reporter, 7.50);
        let mut session = session_with_cart();

        let result = svc.generate_pix(&mut session, input()).await;

        assert!(matches!(result, Err(AppError::Gateway(_))));
        assert_eq!(session.phase, CheckoutPhase::Idle);
    }

    #[tokio::test]
    async fn paid_check_confirms_and_reports_exactly_once() {
        let gateway = MockGateway::new();
        gateway.will_create(Ok(charge()));
        let reporter = MockReporter::new();
        let svc = service(&gateway, &reporter, 7.50);
        let mut session = session_with_cart();
        svc.generate_pix(&mut session, input()).await.unwrap();

        gateway.will_report_status(Ok(ChargeStatus {
            status: "paid".to_string(),
            is_paid: true,
            paid_at: Some("2025-12-25 10:00:00".to_string()),
        }));
        let status = svc.check_payment(&mut session).await.unwrap();
        settle().await;

        assert!(status.is_paid);
        assert_eq!(session.phase, CheckoutPhase::Confirmed);
        assert_eq!(reporter.calls.load(Ordering::SeqCst), 1);

        // Confirmado é terminal: nova checagem não chama o gateway nem
        // reporta de novo.
        let again = svc.check_payment(&mut session).await.unwrap();
        settle().await;

        assert!(again.is_paid);
        assert_eq!(gateway.status_calls.load(Ordering::SeqCst), 1);
        assert_eq!(reporter.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn pending_check_keeps_awaiting_and_does_not_report() {
        let gateway = MockGateway::new();
        gateway.will_create(Ok(charge()));
        let reporter = MockReporter::new();
        let svc = service(&gateway, &reporter, 7.50);
        let mut session = session_with_cart();
        svc.generate_pix(&mut session, input()).await.unwrap();

        gateway.will_report_status(Ok(ChargeStatus {
            status: "pending".to_string(),
            is_paid: false,
            paid_at: None,
        }));
        let status = svc.check_payment(&mut session).await.unwrap();
        settle().await;

        assert!(!status.is_paid);
        assert_eq!(session.phase, CheckoutPhase::AwaitingPayment);
        assert_eq!(reporter.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            session.last_error.as_deref(),
            Some("Pagamento ainda não identificado")
        );
    }

    #[tokio::test]
    async fn failed_status_call_is_distinct_from_pending() {
        let gateway = MockGateway::new();
        gateway.will_create(Ok(charge()));
        let reporter = MockReporter::new();
        let svc = service(&gateway, &reporter, 7.50);
        let mut session = session_with_cart();
        svc.generate_pix(&mut session, input()).await.unwrap();

        gateway.will_report_status(Err(AppError::StatusCheckFailed));
        let result = svc.check_payment(&mut session).await;

        assert!(matches!(result, Err(AppError::StatusCheckFailed)));
        // Inverificável não é "não pago": o estado fica como estava.
        assert_eq!(session.phase, CheckoutPhase::AwaitingPayment);
        assert_eq!(reporter.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn check_without_a_charge_is_rejected() {
        let gateway = MockGateway::new();
        let reporter = MockReporter::new();
        let svc = service(&gateway, &reporter, 7.50);
        let mut session = CheckoutSession::new();

        let result = svc.check_payment(&mut session).await;

        assert!(matches!(result, Err(AppError::NoActiveCharge)));
        assert_eq!(gateway.status_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn regeneration_supersedes_the_previous_charge() {
        let gateway = MockGateway::new();
        gateway.will_create(Ok(charge()));
        let reporter = MockReporter::new();
        let svc = service(&gateway, &reporter, 7.50);
        let mut session = session_with_cart();
        svc.generate_pix(&mut session, input()).await.unwrap();

        gateway.will_create(Ok(PixCharge {
            transaction_id: "tx-2".to_string(),
            ..charge()
        }));
        svc.generate_pix(&mut session, input()).await.unwrap();

        assert_eq!(session.charge.as_ref().unwrap().transaction_id, "tx-2");
        assert_eq!(session.phase, CheckoutPhase::AwaitingPayment);
        assert_eq!(gateway.create_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn conversion_report_reflects_the_cart_as_it_was_charged() {
        let gateway = MockGateway::new();
        gateway.will_create(Ok(charge()));
        let reporter = MockReporter::new();
        let svc = service(&gateway, &reporter, 7.50);
        let mut session = session_with_cart(); // 1 × R$ 8,90
        svc.generate_pix(&mut session, input()).await.unwrap();

        // O usuário volta ao carrinho e aumenta a quantidade depois da
        // cobrança já gerada; a conversão reporta o que foi cobrado.
        session.cart.update_quantity(4, 5);

        gateway.will_report_status(Ok(ChargeStatus {
            status: "paid".to_string(),
            is_paid: true,
            paid_at: None,
        }));
        svc.check_payment(&mut session).await.unwrap();
        settle().await;

        let order = reporter.last_order.lock().unwrap().clone().unwrap();
        assert_eq!(order.commission.total_price_in_cents, 890);
        assert_eq!(order.products.len(), 1);
        assert_eq!(order.products[0].quantity, 1);
    }

    #[tokio::test]
    async fn conversion_order_carries_cart_and_tracking_data() {
        let mut session = session_with_cart();
        session.cart.update_quantity(4, 2); // 2 × R$ 8,90 = R$ 17,80
        session.customer = Some(customer());
        session.tracking.utm_source = Some("natal2025".to_string());

        let order = build_conversion_order(&session);

        assert_eq!(order.payment_method, "pix");
        assert_eq!(order.status, "paid");
        assert_eq!(order.products.len(), 1);
        assert_eq!(order.products[0].price_in_cents, 890);
        assert_eq!(order.commission.total_price_in_cents, 1780);
        assert_eq!(order.tracking_parameters.utm_source.as_deref(), Some("natal2025"));
    }
}
