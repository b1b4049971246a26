use std::collections::HashMap;

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::{
    cart::Cart,
    dto::cart::{CartLineDto, CartSummary, CartView},
    entity::products::{Column as ProdCol, Entity as Products, Model as ProductModel, ProductStatus},
    error::{AppError, AppResult},
    models::Product,
    response::{ApiResponse, Meta},
    session::Session,
    state::AppState,
};

async fn active_product(state: &AppState, product_id: Uuid) -> AppResult<ProductModel> {
    Products::find_by_id(product_id)
        .filter(ProdCol::Status.eq(ProductStatus::Active))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

fn summary(cart: &Cart, item_total: Option<rust_decimal::Decimal>) -> CartSummary {
    CartSummary {
        cart_count: cart.len(),
        cart_total: cart.total(),
        item_total,
    }
}

/// Message shown when a request would take more than is left on the shelf.
pub fn stock_message(available: i32, name: &str) -> String {
    format!("Only {} left in stock for {}", available.max(0), name)
}

/// Check a requested add against stock minus what is already in the cart.
pub fn check_add(stock: i32, in_cart: i32, quantity: i32, name: &str) -> AppResult<()> {
    if quantity <= 0 {
        return Err(AppError::BadRequest("Please select a valid quantity".into()));
    }
    let available = stock - in_cart;
    if available <= 0 {
        return Err(AppError::BadRequest(format!("Only 0 items left in stock for {name}")));
    }
    if quantity > available {
        return Err(AppError::BadRequest(stock_message(available, name)));
    }
    Ok(())
}

pub async fn view_cart(state: &AppState, session: &Session) -> AppResult<ApiResponse<CartView>> {
    let mut data = session.load().await?;
    let ids = data.cart.product_ids();

    let products: HashMap<Uuid, ProductModel> = if ids.is_empty() {
        HashMap::new()
    } else {
        Products::find()
            .filter(ProdCol::Id.is_in(ids))
            .all(&state.orm)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect()
    };

    let known: Vec<Uuid> = products.keys().copied().collect();
    let pruned = data.cart.retain_products(&known);
    if pruned > 0 {
        tracing::debug!(session_id = %session.id(), pruned, "dropped cart lines for deleted products");
    }

    let items = data
        .cart
        .lines()
        .filter_map(|(id, line)| {
            products.get(&id).map(|model| CartLineDto {
                product: Product::from_entity(model.clone(), state.images.as_ref()),
                quantity: line.quantity,
                price: line.price,
                total_price: line.total(),
            })
        })
        .collect();

    let view = CartView {
        items,
        cart_count: data.cart.len(),
        cart_total: data.cart.total(),
    };

    if pruned > 0 {
        session.save(data).await?;
    }

    Ok(ApiResponse::success("Cart", view, Some(Meta::empty())))
}

pub async fn add_to_cart(
    state: &AppState,
    session: &Session,
    product_id: Uuid,
    quantity: i32,
) -> AppResult<ApiResponse<CartSummary>> {
    let product = active_product(state, product_id).await?;
    let mut data = session.load().await?;

    check_add(
        product.stock,
        data.cart.quantity_of(product.id),
        quantity,
        &product.name,
    )?;

    data.cart.add(product.id, product.price, quantity);
    let body = summary(&data.cart, None);
    session.save(data).await?;

    Ok(ApiResponse::success(
        format!("Added {} x {} to cart", quantity, product.name),
        body,
        Some(Meta::empty()),
    ))
}

pub async fn update_cart(
    state: &AppState,
    session: &Session,
    product_id: Uuid,
    quantity: i32,
) -> AppResult<ApiResponse<CartSummary>> {
    let product = active_product(state, product_id).await?;
    let mut data = session.load().await?;

    if quantity < 1 {
        data.cart.remove(product.id);
        let body = summary(&data.cart, None);
        session.save(data).await?;
        return Ok(ApiResponse::success(
            "Item removed from cart",
            body,
            Some(Meta::empty()),
        ));
    }

    if quantity > product.stock {
        return Err(AppError::BadRequest(stock_message(product.stock, &product.name)));
    }

    data.cart.update(product.id, quantity);
    let item_total = data.cart.line(product.id).map(|line| line.total());
    let body = summary(&data.cart, item_total);
    session.save(data).await?;

    Ok(ApiResponse::success("Cart updated", body, Some(Meta::empty())))
}

pub async fn remove_from_cart(
    session: &Session,
    product_id: Uuid,
) -> AppResult<ApiResponse<CartSummary>> {
    let body = session
        .update(|data| {
            data.cart.remove(product_id);
            summary(&data.cart, None)
        })
        .await?;
    Ok(ApiResponse::success(
        "Item removed from cart",
        body,
        Some(Meta::empty()),
    ))
}

pub async fn clear_cart(session: &Session) -> AppResult<ApiResponse<CartSummary>> {
    let body = session
        .update(|data| {
            data.cart.clear();
            summary(&data.cart, None)
        })
        .await?;
    Ok(ApiResponse::success("Cart cleared", body, Some(Meta::empty())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_within_remaining_stock_is_allowed() {
        assert!(check_add(5, 2, 3, "Mug").is_ok());
    }

    #[test]
    fn add_beyond_remaining_stock_names_what_is_left() {
        let err = check_add(5, 2, 4, "Mug").unwrap_err();
        assert_eq!(err.to_string(), "Only 3 left in stock for Mug");
    }

    #[test]
    fn nothing_left_reports_zero() {
        let err = check_add(2, 3, 1, "Mug").unwrap_err();
        assert_eq!(err.to_string(), "Only 0 items left in stock for Mug");
    }

    #[test]
    fn non_positive_quantity_is_rejected_first() {
        let err = check_add(0, 0, 0, "Mug").unwrap_err();
        assert_eq!(err.to_string(), "Please select a valid quantity");
    }
}
