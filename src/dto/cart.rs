use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::models::Product;

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

impl Default for AddToCartRequest {
    fn default() -> Self {
        Self {
            quantity: default_quantity(),
        }
    }
}

/// A missing quantity counts as zero and removes the line.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateCartRequest {
    #[serde(default)]
    pub quantity: i32,
}

/// Optional redirect target for browser clients.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CartActionQuery {
    pub next: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartSummary {
    pub cart_count: usize,
    pub cart_total: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_total: Option<Decimal>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLineDto {
    pub product: Product,
    pub quantity: i32,
    /// Unit price captured when the line was added.
    pub price: Decimal,
    pub total_price: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub items: Vec<CartLineDto>,
    pub cart_count: usize,
    pub cart_total: Decimal,
}
