use crate::{
    dto::session::SessionContext,
    error::AppResult,
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    services::wishlist_service,
    session::Session,
    state::AppState,
};

/// Badge counts for the page chrome. Reading drains pending flash messages.
pub async fn context(
    state: &AppState,
    session: &Session,
    user: Option<&AuthUser>,
) -> AppResult<ApiResponse<SessionContext>> {
    let (cart_items_count, cart_total, messages) = session
        .update(|data| {
            (
                data.cart.len(),
                data.cart.total(),
                std::mem::take(&mut data.messages),
            )
        })
        .await?;

    let (wishlist_count, wishlist_product_ids) = match user {
        Some(user) => {
            let ids = wishlist_service::wishlist_product_ids(&state.pool, user.user_id).await?;
            (ids.len() as i64, ids)
        }
        None => (0, Vec::new()),
    };

    Ok(ApiResponse::success(
        "Session",
        SessionContext {
            cart_items_count,
            cart_total,
            wishlist_count,
            wishlist_product_ids,
            messages,
        },
        Some(Meta::empty()),
    ))
}
