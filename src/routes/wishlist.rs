use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        cart::CartActionQuery,
        wishlist::{WishlistChange, WishlistView},
    },
    error::{AppError, AppResult},
    middleware::{
        auth::{AuthUser, MaybeUser},
        client::Client,
    },
    pages,
    response::ApiResponse,
    routes::params::Pagination,
    services::wishlist_service,
    session::{FlashLevel, Session},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_wishlist))
        .route("/add/{product_id}", post(add_to_wishlist))
        .route("/remove/{product_id}", post(remove_from_wishlist))
}

#[utoipa::path(
    get,
    path = "/api/wishlist",
    params(Pagination),
    responses(
        (status = 200, description = "Wishlist entries, newest first", body = ApiResponse<WishlistView>),
        (status = 401, description = "Login required"),
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn list_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<WishlistView>>> {
    let resp = wishlist_service::list_wishlist(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/wishlist/add/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product ID"), CartActionQuery),
    responses(
        (status = 200, description = "Added, or already present", body = ApiResponse<WishlistChange>),
        (status = 303, description = "Browser redirect, to the login page when anonymous"),
        (status = 401, description = "Login required"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn add_to_wishlist(
    State(state): State<AppState>,
    session: Session,
    client: Client,
    MaybeUser(user): MaybeUser,
    Path(product_id): Path<Uuid>,
    Query(query): Query<CartActionQuery>,
) -> Response {
    let location = client.back_to(query.next.as_deref(), pages::HOME);
    let Some(user) = user else {
        return client.failure(&session, AppError::LoginRequired, &location).await;
    };
    match wishlist_service::add_to_wishlist(&state, &user, product_id).await {
        Ok(resp) => {
            let level = match resp.data.as_ref().and_then(|change| change.created) {
                Some(false) => FlashLevel::Info,
                _ => FlashLevel::Success,
            };
            client.success(&session, level, resp, &location).await
        }
        Err(err) => client.failure(&session, err, &location).await,
    }
}

#[utoipa::path(
    post,
    path = "/api/wishlist/remove/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product ID"), CartActionQuery),
    responses(
        (status = 200, description = "Removed, or was not present", body = ApiResponse<WishlistChange>),
        (status = 303, description = "Browser redirect, to the login page when anonymous"),
        (status = 401, description = "Login required"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    session: Session,
    client: Client,
    MaybeUser(user): MaybeUser,
    Path(product_id): Path<Uuid>,
    Query(query): Query<CartActionQuery>,
) -> Response {
    let location = client.back_to(query.next.as_deref(), pages::WISHLIST);
    let Some(user) = user else {
        return client.failure(&session, AppError::LoginRequired, &location).await;
    };
    match wishlist_service::remove_from_wishlist(&state, &user, product_id).await {
        Ok(resp) => client.success(&session, FlashLevel::Success, resp, &location).await,
        Err(err) => client.failure(&session, err, &location).await,
    }
}
