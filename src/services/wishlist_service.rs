use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use uuid::Uuid;

use crate::{
    audit::{self, AuditAction},
    db::DbPool,
    dto::wishlist::{WishlistChange, WishlistView},
    entity::{
        products::Entity as Products,
        wishlist_entries::{Column as WishCol, Entity as WishlistEntries},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Product, WishlistEntry},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

pub async fn wishlist_count(pool: &DbPool, user_id: Uuid) -> AppResult<i64> {
    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM wishlist_entries WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    Ok(total.0)
}

pub async fn wishlist_product_ids(pool: &DbPool, user_id: Uuid) -> AppResult<Vec<Uuid>> {
    let rows: Vec<(Uuid,)> =
        sqlx::query_as("SELECT product_id FROM wishlist_entries WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(pool)
            .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

async fn product_name(state: &AppState, product_id: Uuid) -> AppResult<String> {
    Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .map(|p| p.name)
        .ok_or(AppError::NotFound)
}

pub async fn add_to_wishlist(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<WishlistChange>> {
    let name = product_name(state, product_id).await?;

    let inserted: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO wishlist_entries (id, user_id, product_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, product_id) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(product_id)
    .fetch_optional(&state.pool)
    .await?;
    let created = inserted.is_some();

    if created {
        audit::record(
            &state.pool,
            Some(user.user_id),
            AuditAction::WishlistAdd,
            serde_json::json!({ "product_id": product_id }),
        )
        .await;
    }

    let wishlist_count = wishlist_count(&state.pool, user.user_id).await?;
    let message = if created {
        format!("Added {name} to your wishlist")
    } else {
        format!("{name} is already in your wishlist")
    };

    Ok(ApiResponse::success(
        message,
        WishlistChange {
            created: Some(created),
            wishlist_count,
        },
        Some(Meta::empty()),
    ))
}

pub async fn remove_from_wishlist(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<WishlistChange>> {
    let name = product_name(state, product_id).await?;

    let result = sqlx::query("DELETE FROM wishlist_entries WHERE user_id = $1 AND product_id = $2")
        .bind(user.user_id)
        .bind(product_id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() > 0 {
        audit::record(
            &state.pool,
            Some(user.user_id),
            AuditAction::WishlistRemove,
            serde_json::json!({ "product_id": product_id }),
        )
        .await;
    }

    let wishlist_count = wishlist_count(&state.pool, user.user_id).await?;
    Ok(ApiResponse::success(
        format!("Removed {name} from your wishlist"),
        WishlistChange {
            created: None,
            wishlist_count,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_wishlist(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<WishlistView>> {
    let (page, limit, offset) = pagination.normalize();

    let finder = WishlistEntries::find()
        .filter(WishCol::UserId.eq(user.user_id))
        .order_by_desc(WishCol::AddedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .find_also_related(Products)
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .filter_map(|(entry, product)| {
            product.map(|product| WishlistEntry {
                id: entry.id,
                product: Product::from_entity(product, state.images.as_ref()),
                added_at: entry.added_at.with_timezone(&chrono::Utc),
            })
        })
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Wishlist",
        WishlistView {
            items,
            wishlist_count: total,
        },
        Some(meta),
    ))
}
