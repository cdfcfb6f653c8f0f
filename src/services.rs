pub mod cep_service;
pub mod checkout_service;
pub mod cpf;
pub mod gateway_service;
pub mod utmify_service;

pub use cep_service::{BrasilApi, CepService, ViaCep};
pub use checkout_service::{CheckoutPolicy, CheckoutService, PixGenerationInput};
pub use gateway_service::{EvolutGateway, PaymentGateway};
pub use utmify_service::{ConversionReporter, UtmifyReporter};
