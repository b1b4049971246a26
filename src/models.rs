use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entity::{
        order_items::Model as OrderItemModel, orders::Model as OrderModel,
        products::Model as ProductModel,
    },
    storage::{ImageStore, resolve_image},
};

pub use crate::entity::products::ProductStatus;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub status: ProductStatus,
    pub image: Option<String>,
    pub image_url: String,
    /// Resolved URL to display, empty when the product has no image.
    pub image_src: String,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn from_entity(model: ProductModel, images: &dyn ImageStore) -> Self {
        let image_src = resolve_image(images, model.image.as_deref(), &model.image_url);
        Self {
            is_available: model.is_available(),
            id: model.id,
            name: model.name,
            description: model.description,
            price: model.price,
            stock: model.stock,
            status: model.status,
            image: model.image,
            image_url: model.image_url,
            image_src,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub shipping_address: String,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<OrderModel> for Order {
    fn from(model: OrderModel) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            customer_name: model.customer_name,
            customer_email: model.customer_email,
            customer_phone: model.customer_phone,
            shipping_address: model.shipping_address,
            total_amount: model.total_amount,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

impl OrderItem {
    pub fn from_entity(model: OrderItemModel, product_name: impl Into<String>) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            product_name: product_name.into(),
            quantity: model.quantity,
            unit_price: model.unit_price,
            subtotal: model.subtotal,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WishlistEntry {
    pub id: Uuid,
    pub product: Product,
    pub added_at: DateTime<Utc>,
}
