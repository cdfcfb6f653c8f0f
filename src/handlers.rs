pub mod balance;
pub mod cart;
pub mod cep;
pub mod checkout;
pub mod store;
