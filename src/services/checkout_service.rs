use std::collections::HashMap;

use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit::{self, AuditAction},
    cart::Cart,
    dto::{checkout::CheckoutRequest, orders::OrderWithItems},
    entity::{
        order_items::{ActiveModel as OrderItemActive, line_subtotal},
        orders::{ActiveModel as OrderActive, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products, Model as ProductModel, ProductStatus},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem},
    response::{ApiResponse, Meta},
    session::Session,
    state::AppState,
};

/// Create an order from `cart` in a single transaction.
///
/// Product rows are locked in id order before anything is written, so two
/// checkouts competing for the same stock serialize instead of overselling.
/// Any failure drops the transaction and nothing is kept.
pub async fn place_order<C>(
    conn: &C,
    cart: &Cart,
    form: &CheckoutRequest,
    user_id: Option<Uuid>,
) -> AppResult<(OrderModel, Vec<OrderItem>)>
where
    C: ConnectionTrait + TransactionTrait,
{
    if cart.is_empty() {
        return Err(AppError::EmptyCart);
    }

    let txn = conn.begin().await?;

    let products: HashMap<Uuid, ProductModel> = Products::find()
        .filter(ProdCol::Id.is_in(cart.product_ids()))
        .order_by_asc(ProdCol::Id)
        .lock(LockType::Update)
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut total_amount = Decimal::ZERO;
    for (product_id, line) in cart.lines() {
        let product = products
            .get(&product_id)
            .ok_or_else(|| AppError::ProductUnavailable("A product in your cart".into()))?;
        if product.status != ProductStatus::Active {
            return Err(AppError::ProductUnavailable(product.name.clone()));
        }
        if product.stock < line.quantity {
            return Err(AppError::InsufficientStock(product.name.clone()));
        }
        total_amount += line_subtotal(line.quantity, product.price);
    }

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        customer_name: Set(form.name.clone()),
        customer_email: Set(form.email.clone()),
        customer_phone: Set(form.phone.clone()),
        shipping_address: Set(form.address.clone()),
        total_amount: Set(total_amount),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(cart.len());
    for (product_id, line) in cart.lines() {
        let Some(product) = products.get(&product_id) else {
            continue;
        };

        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(product_id),
            quantity: Set(line.quantity),
            unit_price: Set(product.price),
            subtotal: NotSet,
        }
        .insert(&txn)
        .await?;

        // guarded decrement, the CHECK constraint backs it up
        let updated = Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(line.quantity))
            .filter(ProdCol::Id.eq(product_id))
            .filter(ProdCol::Stock.gte(line.quantity))
            .exec(&txn)
            .await?;
        if updated.rows_affected != 1 {
            return Err(AppError::InsufficientStock(product.name.clone()));
        }

        items.push(OrderItem::from_entity(item, product.name.clone()));
    }

    txn.commit().await?;
    Ok((order, items))
}

pub async fn checkout(
    state: &AppState,
    session: &Session,
    user: Option<&AuthUser>,
    form: AppResult<CheckoutRequest>,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let data = session.load().await?;
    if data.cart.is_empty() {
        return Err(AppError::EmptyCart);
    }

    // the body is only looked at once there is something to buy
    let form = form?.normalized();
    form.validate()?;

    let user_id = user.map(|u| u.user_id);
    let (order, items) = place_order(&state.orm, &data.cart, &form, user_id).await?;

    session
        .update(|data| {
            data.cart.clear();
            data.remember_order(order.id);
        })
        .await?;

    tracing::info!(
        order_id = %order.id,
        total = %order.total_amount,
        lines = items.len(),
        "order placed"
    );

    audit::record(
        &state.pool,
        user_id,
        AuditAction::Checkout,
        serde_json::json!({ "order_id": order.id, "total_amount": order.total_amount }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order placed successfully",
        OrderWithItems {
            order: Order::from(order),
            items,
        },
        Some(Meta::empty()),
    ))
}
