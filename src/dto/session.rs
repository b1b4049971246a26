use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::session::FlashMessage;

/// Values every storefront page needs: badge counts and pending messages.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionContext {
    pub cart_items_count: usize,
    pub cart_total: Decimal,
    pub wishlist_count: i64,
    pub wishlist_product_ids: Vec<Uuid>,
    pub messages: Vec<FlashMessage>,
}
