use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, CartActionQuery, CartSummary, CartView, UpdateCartRequest},
    error::AppResult,
    middleware::{client::Client, payload::Payload},
    pages,
    response::ApiResponse,
    services::cart_service,
    session::{FlashLevel, Session},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(view_cart))
        .route("/add/{product_id}", post(add_to_cart))
        .route("/update/{product_id}", post(update_cart))
        .route("/remove/{product_id}", post(remove_from_cart))
        .route("/clear", post(clear_cart))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Cart lines with live product data", body = ApiResponse<CartView>)
    ),
    tag = "Cart"
)]
pub async fn view_cart(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::view_cart(&state, &session).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/add/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product ID"), CartActionQuery),
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Added to cart", body = ApiResponse<CartSummary>),
        (status = 303, description = "Browser redirect with a flash message"),
        (status = 400, description = "Invalid quantity or not enough stock"),
        (status = 404, description = "Product not found or inactive"),
    ),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    session: Session,
    client: Client,
    Path(product_id): Path<Uuid>,
    Query(query): Query<CartActionQuery>,
    payload: Payload<AddToCartRequest>,
) -> Response {
    let location = client.back_to(query.next.as_deref(), &pages::product_detail(product_id));
    let payload = match payload.or_default() {
        Ok(payload) => payload,
        Err(err) => return client.failure(&session, err, &location).await,
    };
    match cart_service::add_to_cart(&state, &session, product_id, payload.quantity).await {
        Ok(resp) => client.success(&session, FlashLevel::Success, resp, &location).await,
        Err(err) => client.failure(&session, err, &location).await,
    }
}

#[utoipa::path(
    post,
    path = "/api/cart/update/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product ID"), CartActionQuery),
    request_body = UpdateCartRequest,
    responses(
        (status = 200, description = "Quantity set, or line removed below 1", body = ApiResponse<CartSummary>),
        (status = 303, description = "Browser redirect with a flash message"),
        (status = 400, description = "Not enough stock"),
        (status = 404, description = "Product not found or inactive"),
    ),
    tag = "Cart"
)]
pub async fn update_cart(
    State(state): State<AppState>,
    session: Session,
    client: Client,
    Path(product_id): Path<Uuid>,
    Query(query): Query<CartActionQuery>,
    payload: Payload<UpdateCartRequest>,
) -> Response {
    let location = client.back_to(query.next.as_deref(), pages::CART);
    let payload = match payload.or_default() {
        Ok(payload) => payload,
        Err(err) => return client.failure(&session, err, &location).await,
    };
    match cart_service::update_cart(&state, &session, product_id, payload.quantity).await {
        Ok(resp) => client.success(&session, FlashLevel::Success, resp, &location).await,
        Err(err) => client.failure(&session, err, &location).await,
    }
}

#[utoipa::path(
    post,
    path = "/api/cart/remove/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product ID"), CartActionQuery),
    responses(
        (status = 200, description = "Line removed", body = ApiResponse<CartSummary>),
        (status = 303, description = "Browser redirect with a flash message"),
    ),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    session: Session,
    client: Client,
    Path(product_id): Path<Uuid>,
    Query(query): Query<CartActionQuery>,
) -> Response {
    let location = client.back_to(query.next.as_deref(), pages::CART);
    match cart_service::remove_from_cart(&session, product_id).await {
        Ok(resp) => client.success(&session, FlashLevel::Success, resp, &location).await,
        Err(err) => client.failure(&session, err, &location).await,
    }
}

#[utoipa::path(
    post,
    path = "/api/cart/clear",
    params(CartActionQuery),
    responses(
        (status = 200, description = "Cart emptied", body = ApiResponse<CartSummary>),
        (status = 303, description = "Browser redirect with a flash message"),
    ),
    tag = "Cart"
)]
pub async fn clear_cart(
    session: Session,
    client: Client,
    Query(query): Query<CartActionQuery>,
) -> Response {
    let location = client.back_to(query.next.as_deref(), pages::CART);
    match cart_service::clear_cart(&session).await {
        Ok(resp) => client.success(&session, FlashLevel::Success, resp, &location).await,
        Err(err) => client.failure(&session, err, &location).await,
    }
}
