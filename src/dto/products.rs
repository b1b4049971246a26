use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::{Product, ProductStatus};

/// Largest value a `NUMERIC(10, 2)` column holds.
const MAX_PRICE: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(invalid("negative_price", "Price cannot be negative"));
    }
    if price.normalize().scale() > 2 {
        return Err(invalid("price_precision", "Price can have at most 2 decimal places"));
    }
    if *price > MAX_PRICE {
        return Err(invalid("price_too_large", "Price is too large"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: String,
    #[validate(custom(function = "validate_price"))]
    pub price: Decimal,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: i32,
    pub status: Option<ProductStatus>,
    /// Reference understood by the configured image backend.
    #[validate(length(max = 255, message = "Image reference is too long"))]
    pub image: Option<String>,
    #[validate(url(message = "Enter a valid URL"), length(max = 255, message = "URL is too long"))]
    pub image_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_price"))]
    pub price: Option<Decimal>,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: Option<i32>,
    pub status: Option<ProductStatus>,
    #[validate(length(max = 255, message = "Image reference is too long"))]
    pub image: Option<String>,
    #[validate(url(message = "Enter a valid URL"), length(max = 255, message = "URL is too long"))]
    pub image_url: Option<String>,
}

impl CreateProductRequest {
    /// Trim the name so a blank one fails validation instead of being stored empty.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self
    }
}

impl UpdateProductRequest {
    pub fn normalized(mut self) -> Self {
        self.name = self.name.map(|name| name.trim().to_string());
        self
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkStatusRequest {
    pub ids: Vec<Uuid>,
    pub status: ProductStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkStatusResult {
    pub updated: u64,
}

#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct ProductStats {
    pub total_products: u64,
    pub available_products: u64,
    pub low_stock: u64,
    pub out_of_stock: u64,
    pub well_stocked: u64,
}

impl ProductStats {
    pub fn new(total: u64, available: u64, low_stock: u64, out_of_stock: u64) -> Self {
        Self {
            total_products: total,
            available_products: available,
            low_stock,
            out_of_stock,
            well_stocked: total.saturating_sub(low_stock + out_of_stock),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<Product>,
}
