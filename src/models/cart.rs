// src/models/cart.rs

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::store::Product;

// Par produto/quantidade. A linha some do carrinho quando a quantidade
// chegaria a zero; nunca existe linha com quantidade 0.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product: Product,
    #[schema(example = 2)]
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    #[schema(example = 3)]
    pub items: u32,
    #[schema(value_type = f64, example = 25.80)]
    pub price: Decimal,
}

// Coleção ordenada de linhas, uma por produto. A ordem de inserção é
// preservada: incrementar uma linha existente não a move de lugar.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    // Se já existe linha para o produto, incrementa; senão anexa no fim.
    pub fn add_item(&mut self, product: Product) {
        if let Some(line) = self.lines.iter_mut().find(|l| l.product.id == product.id) {
            line.quantity += 1;
        } else {
            self.lines.push(CartLine {
                product,
                quantity: 1,
            });
        }
    }

    // No-op se o produto não está no carrinho.
    pub fn remove_item(&mut self, product_id: u32) {
        self.lines.retain(|l| l.product.id != product_id);
    }

    // Quantidade 0 (ou menos, no caso de payloads com inteiro sinalizado
    // no frontend) equivale a remover a linha.
    pub fn update_quantity(&mut self, product_id: u32, quantity: u32) {
        if quantity == 0 {
            self.remove_item(product_id);
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.product.id == product_id) {
            line.quantity = quantity;
        }
    }

    // Sempre recalculado na hora; nada de total em cache ficando velho.
    pub fn totals(&self) -> CartTotals {
        let items = self.lines.iter().map(|l| l.quantity).sum();
        let price = self
            .lines
            .iter()
            .map(|l| l.product.discounted_price * Decimal::from(l.quantity))
            .sum();
        CartTotals { items, price }
    }
}
