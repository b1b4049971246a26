use axum::{
    Router,
    extract::State,
    response::Response,
    routing::post,
};

use crate::{
    dto::{checkout::CheckoutRequest, orders::OrderWithItems},
    error::AppError,
    middleware::{auth::MaybeUser, client::Client, payload::Payload},
    pages,
    response::ApiResponse,
    services::checkout_service,
    session::{FlashLevel, Session},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(checkout))
}

/// Where a browser goes after a failed checkout.
fn retry_page(err: &AppError) -> &'static str {
    match err {
        AppError::EmptyCart => pages::HOME,
        e if e.is_stock_problem() => pages::CART,
        _ => pages::CHECKOUT,
    }
}

#[utoipa::path(
    post,
    path = "/api/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Order placed", body = ApiResponse<OrderWithItems>),
        (status = 303, description = "Browser redirect to the confirmation page, or back with a flash message"),
        (status = 400, description = "Empty cart, inactive product or not enough stock"),
        (status = 422, description = "Invalid buyer details"),
    ),
    tag = "Checkout"
)]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    client: Client,
    MaybeUser(user): MaybeUser,
    form: Payload<CheckoutRequest>,
) -> Response {
    let form = form.or_default();
    match checkout_service::checkout(&state, &session, user.as_ref(), form).await {
        Ok(resp) => {
            let location = resp
                .data
                .as_ref()
                .map(|placed| pages::order_confirmation(placed.order.id))
                .unwrap_or_else(|| pages::HOME.to_string());
            client.success(&session, FlashLevel::Success, resp, &location).await
        }
        Err(err) => {
            let location = retry_page(&err);
            client
                .failure_as(&session, err, location, "An error occurred during checkout")
                .await
        }
    }
}
