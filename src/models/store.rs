// src/models/store.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Entrada imutável do catálogo. Criada em tempo de build a partir dos
// dados estáticos da campanha; nunca é alterada depois disso.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[schema(example = 1)]
    pub id: u32,

    #[schema(example = "Chocottone Recheio Pistache")]
    pub name: String,

    #[schema(example = "Recheio cremoso de pistache com gotas de chocolate")]
    pub description: String,

    // Preço "de" e preço "por". Invariante: discounted_price <= original_price.
    #[schema(value_type = f64, example = 120.00)]
    pub original_price: Decimal,
    #[schema(value_type = f64, example = 12.90)]
    pub discounted_price: Decimal,

    // Avaliação de 0 a 5 estrelas.
    #[schema(example = 5)]
    pub rating: u8,
    #[schema(example = 847)]
    pub reviews: u32,

    // Referência da imagem servida pelo frontend.
    #[schema(example = "chocottone-pistache.jpg")]
    pub image: String,

    // Selo promocional opcional ("Lançamento", "-45%"...).
    #[schema(example = "Lançamento")]
    pub badge: Option<String>,
}

impl Product {
    fn new(
        id: u32,
        name: &str,
        description: &str,
        original_cents: i64,
        discounted_cents: i64,
        rating: u8,
        reviews: u32,
        image: &str,
        badge: Option<&str>,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            description: description.to_string(),
            original_price: Decimal::new(original_cents, 2),
            discounted_price: Decimal::new(discounted_cents, 2),
            rating,
            reviews,
            image: image.to_string(),
            badge: badge.map(|b| b.to_string()),
        }
    }
}

// O catálogo da promoção de Natal. Preços em centavos para não passar
// por float em lugar nenhum.
pub fn catalog() -> Vec<Product> {
    vec![
        Product::new(
            1,
            "Chocottone Recheio Pistache",
            "Recheio cremoso de pistache com gotas de chocolate",
            12000,
            1290,
            5,
            847,
            "chocottone-pistache.jpg",
            Some("Lançamento"),
        ),
        Product::new(
            2,
            "Chocottone Recheio Mousse",
            "Recheio de mousse de chocolate ao leite",
            9000,
            1290,
            5,
            623,
            "chocottone-mousse.jpg",
            Some("-45%"),
        ),
        Product::new(
            3,
            "Chocottone Ovomaltine",
            "Com creme de Ovomaltine e flocos crocantes",
            8500,
            1290,
            5,
            512,
            "chocottone-ovomaltine.jpg",
            Some("-45%"),
        ),
        Product::new(
            4,
            "Chocottone Tradicional 500g",
            "O clássico Chocottone com gotas de chocolate",
            6500,
            890,
            5,
            1247,
            "chocottone-tradicional.jpg",
            Some("-45%"),
        ),
        Product::new(
            5,
            "Panetone Frutas Premium",
            "Com frutas cristalizadas selecionadas",
            7500,
            990,
            4,
            389,
            "panetone-frutas.jpg",
            None,
        ),
        Product::new(
            6,
            "Mini Panetone Gotas",
            "Mini panetone com gotas de chocolate",
            2500,
            490,
            5,
            756,
            "mini-panetone.jpg",
            Some("-45%"),
        ),
    ]
}

pub fn find_product(id: u32) -> Option<Product> {
    catalog().into_iter().find(|p| p.id == id)
}
