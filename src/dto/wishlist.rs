use serde::Serialize;
use utoipa::ToSchema;

use crate::models::WishlistEntry;

#[derive(Debug, Serialize, ToSchema)]
pub struct WishlistChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<bool>,
    pub wishlist_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WishlistView {
    pub items: Vec<WishlistEntry>,
    pub wishlist_count: i64,
}
