use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::{
    dto::orders::{OrderList, OrderWithItems},
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::Entity as Products,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    session::Session,
    state::AppState,
};

/// Orders placed by `user`, plus guest orders under the same email.
fn owned_by(user: &AuthUser) -> Condition {
    let mut condition = Condition::any().add(OrderCol::UserId.eq(user.user_id));
    if !user.email.is_empty() {
        condition = condition.add(
            Condition::all()
                .add(OrderCol::UserId.is_null())
                .add(
                    Expr::expr(Func::lower(Expr::col(OrderCol::CustomerEmail)))
                        .eq(user.email.to_lowercase()),
                ),
        );
    }
    condition
}

/// Whether `user` may see `order` as its owner.
pub fn is_owner(order: &OrderModel, user: &AuthUser) -> bool {
    match order.user_id {
        Some(owner) => owner == user.user_id,
        None => !user.email.is_empty() && order.customer_email.to_lowercase() == user.email.to_lowercase(),
    }
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = pagination.normalize();

    let finder = Orders::find()
        .filter(owned_by(user))
        .order_by_desc(OrderCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

/// Order confirmation. Unknown and foreign orders look the same to the caller.
pub async fn get_order(
    state: &AppState,
    session: &Session,
    user: Option<&AuthUser>,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let placed_here = session.load().await?.placed(order.id);
    let allowed = placed_here || user.is_some_and(|u| u.is_staff() || is_owner(&order, u));
    if !allowed {
        return Err(AppError::NotFound);
    }

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .find_also_related(Products)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(item, product)| {
            let name = product.map(|p| p.name).unwrap_or_default();
            OrderItem::from_entity(item, name)
        })
        .collect();

    Ok(ApiResponse::success(
        "Order",
        OrderWithItems {
            order: Order::from(order),
            items,
        },
        Some(Meta::empty()),
    ))
}
