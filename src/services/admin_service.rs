use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DbErr, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit::{self, AuditAction},
    dto::products::{
        BulkStatusRequest, BulkStatusResult, CreateProductRequest, ProductList, ProductStats,
        UpdateProductRequest,
    },
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        products::{ActiveModel as ProductActive, Column, Entity as Products, ProductStatus},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_staff},
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::AdminProductQuery,
    state::AppState,
};

/// Stock at or below this, but above zero, counts as low.
pub const LOW_STOCK_THRESHOLD: i32 = 10;

pub async fn list_products(
    state: &AppState,
    user: &AuthUser,
    query: AdminProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_staff(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status {
        condition = condition.add(Column::Status.eq(status));
    }
    if let Some(search) = query.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{search}%");
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }

    let finder = Products::find()
        .filter(condition)
        .order_by_desc(Column::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|model| Product::from_entity(model, state.images.as_ref()))
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_staff(user)?;
    let payload = payload.normalized();
    payload.validate()?;

    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        description: Set(payload.description),
        price: Set(payload.price),
        stock: Set(payload.stock),
        status: Set(payload.status.unwrap_or(ProductStatus::Active)),
        image: Set(payload.image.filter(|s| !s.is_empty())),
        image_url: Set(payload.image_url.unwrap_or_default()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(product_id = %product.id, "product created");
    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::ProductCreate,
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created successfully",
        Product::from_entity(product, state.images.as_ref()),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_staff(user)?;
    let payload = payload.normalized();
    payload.validate()?;

    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ProductActive = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(stock) = payload.stock {
        active.stock = Set(stock);
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    if let Some(image) = payload.image {
        active.image = Set(Some(image).filter(|s| !s.is_empty()));
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(image_url);
    }
    let product = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::ProductUpdate,
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product updated successfully",
        Product::from_entity(product, state.images.as_ref()),
        Some(Meta::empty()),
    ))
}

fn referenced_by_orders(name: &str) -> AppError {
    AppError::Conflict(format!(
        "{name} cannot be deleted because it appears in existing orders"
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_staff(user)?;

    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let in_orders = OrderItems::find()
        .filter(OrderItemCol::ProductId.eq(id))
        .count(&state.orm)
        .await?;
    if in_orders > 0 {
        return Err(referenced_by_orders(&product.name));
    }

    let name = product.name.clone();
    // an order may land between the count and the delete
    product.delete(&state.orm).await.map_err(|err: DbErr| {
        match err.sql_err() {
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => referenced_by_orders(&name),
            _ => AppError::from(err),
        }
    })?;

    tracing::info!(product_id = %id, "product deleted");
    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::ProductDelete,
        serde_json::json!({ "product_id": id, "name": name }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product deleted successfully",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub fn bulk_status_message(updated: u64, status: ProductStatus) -> String {
    format!("Marked {} product(s) as {}", updated, status.label())
}

pub async fn bulk_status(
    state: &AppState,
    user: &AuthUser,
    payload: BulkStatusRequest,
) -> AppResult<ApiResponse<BulkStatusResult>> {
    ensure_staff(user)?;
    if payload.ids.is_empty() {
        return Err(AppError::BadRequest("Select at least one product".into()));
    }

    let result = Products::update_many()
        .col_expr(Column::Status, Expr::value(payload.status))
        .filter(Column::Id.is_in(payload.ids.clone()))
        .exec(&state.orm)
        .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::ProductStatusChange,
        serde_json::json!({
            "product_ids": payload.ids,
            "status": payload.status,
            "updated": result.rows_affected,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        bulk_status_message(result.rows_affected, payload.status),
        BulkStatusResult {
            updated: result.rows_affected,
        },
        Some(Meta::empty()),
    ))
}

pub async fn product_stats(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<ProductStats>> {
    ensure_staff(user)?;

    let total = Products::find().count(&state.orm).await?;
    let available = Products::find()
        .filter(Column::Status.eq(ProductStatus::Active))
        .filter(Column::Stock.gt(0))
        .count(&state.orm)
        .await?;
    let low_stock = Products::find()
        .filter(Column::Stock.gt(0))
        .filter(Column::Stock.lte(LOW_STOCK_THRESHOLD))
        .count(&state.orm)
        .await?;
    let out_of_stock = Products::find()
        .filter(Column::Stock.eq(0))
        .count(&state.orm)
        .await?;

    Ok(ApiResponse::success(
        "Product stats",
        ProductStats::new(total, available, low_stock, out_of_stock),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulk_message_uses_lowercase_status() {
        assert_eq!(
            bulk_status_message(3, ProductStatus::Inactive),
            "Marked 3 product(s) as inactive"
        );
        assert_eq!(
            bulk_status_message(1, ProductStatus::Active),
            "Marked 1 product(s) as active"
        );
    }

    #[test]
    fn referenced_products_conflict() {
        let err = referenced_by_orders("Ferris Mug");
        assert_eq!(err.status(), axum::http::StatusCode::CONFLICT);
    }
}
