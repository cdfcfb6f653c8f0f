pub mod cart;
pub mod checkout;
pub mod store;

pub use cart::{Cart, CartLine, CartTotals};
pub use checkout::{
    AddressInfo, ChargeStatus, CheckoutPhase, CheckoutSession, CustomerInfo, PixCharge,
    SessionStore, TrackingParameters,
};
pub use store::Product;
